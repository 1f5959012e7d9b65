//! server-tag - render <script> tags from a remote JSON manifest
//!
//! Fetches (or reads from cache) the manifest at the given URL and prints the
//! script tags, a rendered template, or an HTML file with the tags injected.

use clap::Parser;
use simplelog::{ColorChoice, Config, TermLogger, TerminalMode};

use server_tag::cli::{run, Cli, StartupConfig};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let config = StartupConfig::from_cli(&cli)?;

    // Diagnostics go to stderr so stdout carries only the rendered output
    TermLogger::init(
        config.log_level,
        Config::default(),
        TerminalMode::Stderr,
        ColorChoice::Auto,
    )?;

    let output = run(&config)?;
    if !output.is_empty() {
        println!("{output}");
    }

    Ok(())
}

//! Command-line interface for server-tag
//!
//! Parses arguments with clap, turns them into a [`StartupConfig`], and runs
//! one render: a bare fragment, a minijinja template, or an HTML file with the
//! fragment injected.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, ValueEnum};
use log::LevelFilter;
use minijinja::{context, Environment};
use thiserror::Error;

use crate::cache::{FileCache, ManifestCache, MemoryCache};
use crate::error::ManifestError;
use crate::fetch::{FetchConfig, ReqwestFetcher};
use crate::render::{inject_scripts, ScriptAttribute, ScriptTags, DEFAULT_INJECT_POSITION};
use crate::renderer::{ScriptManifestRenderer, DEFAULT_CACHE_INTERVAL};
use crate::template;

/// Error types for CLI argument handling and execution
#[derive(Debug, Error)]
pub enum CliError {
    /// An `--attr` value is not `NAME` or `NAME=VALUE`
    #[error("Invalid script attribute: '{0}'. Expected NAME or NAME=VALUE")]
    InvalidAttribute(String),

    /// An input file could not be read
    #[error("Failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    /// The HTTP client could not be built
    #[error("Failed to set up HTTP client: {0}")]
    Http(#[from] ManifestError),

    /// The template failed to parse or render
    #[error("Template error: {0}")]
    Template(#[from] minijinja::Error),
}

/// server-tag - render <script> tags from a remote JSON manifest
#[derive(Parser, Debug)]
#[command(name = "server-tag")]
#[command(about = "Render <script> tags from a remotely hosted, cached JSON manifest")]
#[command(version)]
pub struct Cli {
    /// URL of the manifest; also used as the cache key
    #[arg(env = "SERVER_TAG_URL")]
    pub url: String,

    /// Seconds a fetched manifest stays cached
    #[arg(long, env = "SERVER_TAG_CACHE_INTERVAL", value_name = "SECS", default_value_t = DEFAULT_CACHE_INTERVAL)]
    pub cache_interval: u64,

    /// Directory for cached manifests (defaults to the platform cache directory)
    #[arg(long, env = "SERVER_TAG_CACHE_DIR", value_name = "DIR", conflicts_with = "no_cache")]
    pub cache_dir: Option<PathBuf>,

    /// Keep the cache in memory for this run only
    #[arg(long)]
    pub no_cache: bool,

    /// Request timeout in seconds (defaults to the HTTP client's own)
    #[arg(long, env = "SERVER_TAG_TIMEOUT", value_name = "SECS")]
    pub timeout: Option<u64>,

    /// Script tag attribute, replacing the default `async` (repeatable)
    ///
    /// Examples:
    ///   --attr defer
    ///   --attr type=module --attr crossorigin=anonymous
    #[arg(long = "attr", value_name = "NAME[=VALUE]")]
    pub attrs: Vec<String>,

    /// Render a minijinja template with `server_tag` available
    #[arg(long, value_name = "FILE", conflicts_with = "inject")]
    pub template: Option<PathBuf>,

    /// Inject the tags into an HTML file and print the result
    #[arg(long, value_name = "FILE")]
    pub inject: Option<PathBuf>,

    /// Marker the tags are injected in front of
    #[arg(long, value_name = "MARKER", default_value = DEFAULT_INJECT_POSITION)]
    pub position: String,

    /// Diagnostic output level (written to stderr)
    #[arg(long, env = "SERVER_TAG_LOG", value_enum, default_value_t = LogLevel::Warn)]
    pub log_level: LogLevel,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum LogLevel {
    Off,
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<LogLevel> for LevelFilter {
    fn from(value: LogLevel) -> Self {
        match value {
            LogLevel::Off => LevelFilter::Off,
            LogLevel::Error => LevelFilter::Error,
            LogLevel::Warn => LevelFilter::Warn,
            LogLevel::Info => LevelFilter::Info,
            LogLevel::Debug => LevelFilter::Debug,
            LogLevel::Trace => LevelFilter::Trace,
        }
    }
}

/// Which cache backend a run uses
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CacheChoice {
    /// Platform cache directory, or memory if there is none
    Default,
    Dir(PathBuf),
    Memory,
}

/// What a run prints
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutputMode {
    Fragment,
    Template(PathBuf),
    Inject { file: PathBuf, position: String },
}

/// Configuration derived from CLI arguments
#[derive(Debug, Clone)]
pub struct StartupConfig {
    pub remote_url: String,
    pub cache_interval: u64,
    pub cache: CacheChoice,
    pub fetch: FetchConfig,
    pub script_tags: ScriptTags,
    pub output: OutputMode,
    pub log_level: LevelFilter,
}

/// Parses an `--attr` argument into a script attribute
pub fn parse_attribute_arg(s: &str) -> Result<ScriptAttribute, CliError> {
    ScriptAttribute::parse(s).ok_or_else(|| CliError::InvalidAttribute(s.to_string()))
}

impl StartupConfig {
    /// Creates a StartupConfig from parsed CLI arguments.
    ///
    /// # Returns
    /// * `Ok(StartupConfig)` with appropriate settings
    /// * `Err(CliError)` if an `--attr` value is malformed
    pub fn from_cli(cli: &Cli) -> Result<Self, CliError> {
        let script_tags = if cli.attrs.is_empty() {
            ScriptTags::new()
        } else {
            let attributes = cli
                .attrs
                .iter()
                .map(|attr| parse_attribute_arg(attr))
                .collect::<Result<Vec<_>, _>>()?;
            ScriptTags::with_attributes(attributes)
        };

        let cache = match (&cli.cache_dir, cli.no_cache) {
            (_, true) => CacheChoice::Memory,
            (Some(dir), false) => CacheChoice::Dir(dir.clone()),
            (None, false) => CacheChoice::Default,
        };

        let output = match (&cli.template, &cli.inject) {
            (Some(template), _) => OutputMode::Template(template.clone()),
            (None, Some(file)) => OutputMode::Inject {
                file: file.clone(),
                position: cli.position.clone(),
            },
            (None, None) => OutputMode::Fragment,
        };

        Ok(StartupConfig {
            remote_url: cli.url.clone(),
            cache_interval: cli.cache_interval,
            cache,
            fetch: FetchConfig {
                timeout: cli.timeout.map(Duration::from_secs),
                ..FetchConfig::default()
            },
            script_tags,
            output,
            log_level: cli.log_level.into(),
        })
    }
}

fn read_file(path: &Path) -> Result<String, CliError> {
    fs::read_to_string(path).map_err(|source| CliError::Read {
        path: path.to_path_buf(),
        source,
    })
}

fn build_cache(choice: &CacheChoice) -> Arc<dyn ManifestCache> {
    match choice {
        CacheChoice::Memory => Arc::new(MemoryCache::new()),
        CacheChoice::Dir(dir) => Arc::new(FileCache::with_dir(dir.clone())),
        CacheChoice::Default => match FileCache::new() {
            Some(cache) => Arc::new(cache),
            None => {
                log::warn!("No cache directory available, caching in memory for this run");
                Arc::new(MemoryCache::new())
            }
        },
    }
}

/// Performs one render and returns the text to print
///
/// A manifest that cannot be fetched is not an error here; the output simply
/// has no script tags.
pub fn run(config: &StartupConfig) -> Result<String, CliError> {
    let fetcher = Arc::new(ReqwestFetcher::with_config(&config.fetch)?);
    let renderer = ScriptManifestRenderer::new(build_cache(&config.cache), fetcher)
        .with_default_script(config.script_tags.clone());

    match &config.output {
        OutputMode::Fragment => Ok(renderer
            .render(&config.remote_url, config.cache_interval, None)
            .into_string()),
        OutputMode::Template(path) => {
            let source = read_file(path)?;
            let name = path
                .file_name()
                .map(|name| name.to_string_lossy().into_owned())
                .unwrap_or_else(|| "template.html".to_string());

            let mut env = Environment::new();
            template::register(&mut env, Arc::new(renderer));
            let rendered = env.render_named_str(
                &name,
                &source,
                context! {
                    remote_url => &config.remote_url,
                    cache_interval => config.cache_interval,
                },
            )?;
            Ok(rendered)
        }
        OutputMode::Inject { file, position } => {
            let html = read_file(file)?;
            let fragment = renderer.render(&config.remote_url, config.cache_interval, None);
            Ok(inject_scripts(&html, &fragment, position))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const URL: &str = "http://x/manifest.json";

    #[test]
    fn test_parse_attribute_arg_flag() {
        assert_eq!(parse_attribute_arg("defer").unwrap(), ScriptAttribute::flag("defer"));
    }

    #[test]
    fn test_parse_attribute_arg_value() {
        assert_eq!(
            parse_attribute_arg("type=module").unwrap(),
            ScriptAttribute::value("type", "module")
        );
    }

    #[test]
    fn test_parse_attribute_arg_invalid() {
        let result = parse_attribute_arg("on load");
        assert!(result.is_err());
        let err = result.unwrap_err();
        assert!(err.to_string().contains("Invalid script attribute"));
        assert!(err.to_string().contains("on load"));
    }

    #[test]
    fn test_cli_parse_defaults() {
        let cli = Cli::parse_from(["server-tag", URL]);
        assert_eq!(cli.url, URL);
        assert_eq!(cli.cache_interval, 300);
        assert!(cli.cache_dir.is_none());
        assert!(!cli.no_cache);
        assert!(cli.timeout.is_none());
        assert!(cli.attrs.is_empty());
        assert_eq!(cli.position, "</head>");
        assert_eq!(cli.log_level, LogLevel::Warn);
    }

    #[test]
    fn test_cli_parse_requires_url() {
        assert!(Cli::try_parse_from(["server-tag"]).is_err());
    }

    #[test]
    fn test_cli_template_conflicts_with_inject() {
        let result = Cli::try_parse_from([
            "server-tag", URL, "--template", "a.html", "--inject", "b.html",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_cli_cache_dir_conflicts_with_no_cache() {
        let result = Cli::try_parse_from(["server-tag", URL, "--cache-dir", "/tmp/x", "--no-cache"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_startup_config_from_cli_defaults() {
        let cli = Cli::parse_from(["server-tag", URL]);
        let config = StartupConfig::from_cli(&cli).unwrap();
        assert_eq!(config.remote_url, URL);
        assert_eq!(config.cache_interval, 300);
        assert_eq!(config.cache, CacheChoice::Default);
        assert_eq!(config.output, OutputMode::Fragment);
        assert_eq!(config.script_tags, ScriptTags::new());
        assert!(config.fetch.timeout.is_none());
        assert_eq!(config.log_level, LevelFilter::Warn);
    }

    #[test]
    fn test_startup_config_from_cli_full() {
        let cli = Cli::parse_from([
            "server-tag",
            URL,
            "--cache-interval",
            "60",
            "--cache-dir",
            "/tmp/server-tag",
            "--timeout",
            "5",
            "--attr",
            "defer",
            "--attr",
            "type=module",
            "--inject",
            "index.html",
            "--position",
            "</body>",
            "--log-level",
            "debug",
        ]);
        let config = StartupConfig::from_cli(&cli).unwrap();
        assert_eq!(config.cache_interval, 60);
        assert_eq!(config.cache, CacheChoice::Dir(PathBuf::from("/tmp/server-tag")));
        assert_eq!(config.fetch.timeout, Some(Duration::from_secs(5)));
        assert_eq!(
            config.script_tags.attributes(),
            &[ScriptAttribute::flag("defer"), ScriptAttribute::value("type", "module")]
        );
        assert_eq!(
            config.output,
            OutputMode::Inject {
                file: PathBuf::from("index.html"),
                position: "</body>".to_string(),
            }
        );
        assert_eq!(config.log_level, LevelFilter::Debug);
    }

    #[test]
    fn test_startup_config_from_cli_no_cache() {
        let cli = Cli::parse_from(["server-tag", URL, "--no-cache"]);
        let config = StartupConfig::from_cli(&cli).unwrap();
        assert_eq!(config.cache, CacheChoice::Memory);
    }

    #[test]
    fn test_startup_config_from_cli_invalid_attribute() {
        let cli = Cli::parse_from(["server-tag", URL, "--attr", "=oops"]);
        assert!(StartupConfig::from_cli(&cli).is_err());
    }

    #[test]
    fn test_run_reports_missing_template() {
        let cli = Cli::parse_from([
            "server-tag",
            URL,
            "--no-cache",
            "--template",
            "/nonexistent/page.html",
        ]);
        let config = StartupConfig::from_cli(&cli).unwrap();
        let result = run(&config);
        assert!(matches!(result, Err(CliError::Read { .. })));
    }
}

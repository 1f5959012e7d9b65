//! server-tag library
//!
//! Fetches a JSON manifest of script URLs from a remote endpoint, caches it,
//! and renders `<script>` tags for embedding in server-rendered pages.

pub mod cache;
pub mod cli;
pub mod error;
pub mod fetch;
pub mod manifest;
pub mod render;
pub mod renderer;
pub mod template;

pub use cache::{FileCache, ManifestCache, MemoryCache};
pub use error::{CacheError, ManifestError};
pub use fetch::{FetchConfig, HttpFetcher, HttpResponse, ReqwestFetcher};
pub use manifest::Manifest;
pub use render::{inject_scripts, RenderScript, SafeHtml, ScriptAttribute, ScriptTags};
pub use renderer::{ManifestSource, ScriptManifestRenderer, DEFAULT_CACHE_INTERVAL};

//! Fetch-cache-render orchestration
//!
//! [`ScriptManifestRenderer`] ties a cache, an HTTP fetcher and a render
//! strategy together. Every call takes exactly one of three paths:
//!
//! - **cache hit**: the cached manifest is rendered, nothing is fetched or written
//! - **fetch success**: the fetched manifest is cached for the interval and rendered
//! - **fetch failure**: one diagnostic is logged and the empty manifest is rendered
//!
//! Failures never reach the caller. A template that embeds the tag always
//! renders, at worst without any script tags.

use std::sync::Arc;
use std::time::Duration;

use crate::cache::ManifestCache;
use crate::error::ManifestError;
use crate::fetch::HttpFetcher;
use crate::manifest::Manifest;
use crate::render::{RenderScript, SafeHtml, ScriptTags};

/// Cache interval used when the caller does not pass one (5 minutes)
pub const DEFAULT_CACHE_INTERVAL: u64 = 300;

/// Where the manifest used for a render came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ManifestSource {
    /// A live cache entry
    Cached(Manifest),
    /// A successful fetch, now stored in the cache
    Fetched(Manifest),
    /// The empty manifest, substituted after a failed fetch
    Fallback(Manifest),
}

impl ManifestSource {
    pub fn manifest(&self) -> &Manifest {
        match self {
            Self::Cached(manifest) | Self::Fetched(manifest) | Self::Fallback(manifest) => manifest,
        }
    }

    pub fn into_manifest(self) -> Manifest {
        match self {
            Self::Cached(manifest) | Self::Fetched(manifest) | Self::Fallback(manifest) => manifest,
        }
    }

    pub fn is_fallback(&self) -> bool {
        matches!(self, Self::Fallback(_))
    }
}

/// Renders `<script>` tags from a remotely hosted manifest
pub struct ScriptManifestRenderer {
    cache: Arc<dyn ManifestCache>,
    fetcher: Arc<dyn HttpFetcher>,
    default_script: Box<dyn RenderScript>,
}

impl ScriptManifestRenderer {
    /// Creates a renderer that uses [`ScriptTags`] when no strategy is passed
    pub fn new(cache: Arc<dyn ManifestCache>, fetcher: Arc<dyn HttpFetcher>) -> Self {
        Self {
            cache,
            fetcher,
            default_script: Box::new(ScriptTags::new()),
        }
    }

    /// Replaces the strategy used when a call passes no `render_script`
    pub fn with_default_script(mut self, script: impl RenderScript + 'static) -> Self {
        self.default_script = Box::new(script);
        self
    }

    /// Renders the manifest at `remote_url`
    ///
    /// `cache_interval` is the lifetime in seconds of the cache entry written
    /// on a successful fetch. When `render_script` is `None` the default
    /// strategy is used. The result is pre-escaped HTML.
    pub fn render(
        &self,
        remote_url: &str,
        cache_interval: u64,
        render_script: Option<&dyn RenderScript>,
    ) -> SafeHtml {
        let source = self.load_manifest(remote_url, cache_interval);
        let script: &dyn RenderScript = match render_script {
            Some(script) => script,
            None => self.default_script.as_ref(),
        };
        SafeHtml::new(script.render_script(source.manifest()))
    }

    /// Resolves the manifest for `remote_url` without rendering it
    pub fn load_manifest(&self, remote_url: &str, cache_interval: u64) -> ManifestSource {
        if let Some(manifest) = self.cache.get(remote_url) {
            log::debug!("Manifest cache hit for {remote_url}");
            return ManifestSource::Cached(manifest);
        }

        match self.fetch_manifest(remote_url) {
            Ok(manifest) => {
                let ttl = Duration::from_secs(cache_interval);
                if let Err(e) = self.cache.set(remote_url, &manifest, ttl) {
                    log::warn!("Failed to cache manifest for {remote_url}: {e}");
                }
                ManifestSource::Fetched(manifest)
            }
            Err(e) => {
                log::error!("Error fetching remote script manifest from {remote_url}: {e}");
                ManifestSource::Fallback(Manifest::empty())
            }
        }
    }

    fn fetch_manifest(&self, remote_url: &str) -> Result<Manifest, ManifestError> {
        log::debug!("Fetching manifest from {remote_url}");
        let response = self.fetcher.get(remote_url)?;
        if response.is_error() {
            return Err(ManifestError::Status {
                url: remote_url.to_string(),
                status: response.status,
            });
        }
        Manifest::from_json(&response.body)
    }
}

impl std::fmt::Debug for ScriptManifestRenderer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScriptManifestRenderer").finish_non_exhaustive()
    }
}

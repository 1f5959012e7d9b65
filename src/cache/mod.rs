//! Cache backends for fetched manifests
//!
//! The renderer only talks to the [`ManifestCache`] trait, so any key-value
//! store with expiry can sit behind it. Two backends ship with the crate: an
//! in-process [`MemoryCache`] and a [`FileCache`] that persists entries as JSON
//! files. Both treat an expired entry exactly like a missing one.

mod clock;
mod file;
mod memory;

pub use clock::{Clock, ManualClock, SystemClock};
pub use file::FileCache;
pub use memory::MemoryCache;

use std::time::Duration;

use chrono::{DateTime, Utc};

use crate::error::CacheError;
use crate::manifest::Manifest;

/// Key-value store with per-entry expiry, keyed by the exact remote URL
pub trait ManifestCache: Send + Sync {
    /// Returns the stored manifest if present and not expired
    fn get(&self, key: &str) -> Option<Manifest>;

    /// Stores a manifest that stays fresh for `ttl`
    fn set(&self, key: &str, manifest: &Manifest, ttl: Duration) -> Result<(), CacheError>;
}

/// Computes when an entry written at `now` expires, saturating on overflow
pub(crate) fn expires_at(now: DateTime<Utc>, ttl: Duration) -> DateTime<Utc> {
    chrono::Duration::from_std(ttl)
        .ok()
        .and_then(|ttl| now.checked_add_signed(ttl))
        .unwrap_or(DateTime::<Utc>::MAX_UTC)
}

/// An entry is fresh strictly before its expiry instant, so a zero TTL never hits
pub(crate) fn is_fresh(now: DateTime<Utc>, expires_at: DateTime<Utc>) -> bool {
    now < expires_at
}

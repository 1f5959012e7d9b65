//! File-backed manifest cache
//!
//! Stores each manifest as a JSON file with its expiry timestamp, so cached
//! manifests survive process restarts and can be shared between processes
//! pointing at the same directory.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tempfile::NamedTempFile;

use super::{expires_at, is_fresh, Clock, ManifestCache, SystemClock};
use crate::error::CacheError;
use crate::manifest::Manifest;

/// Wrapper struct for cached data stored on disk
#[derive(Debug, Serialize, Deserialize)]
struct CacheEntry<T> {
    /// The exact key the entry was stored under
    key: String,
    /// The cached data
    data: T,
    /// When the data was cached
    cached_at: DateTime<Utc>,
    /// When the cache entry expires
    expires_at: DateTime<Utc>,
}

/// Manages reading and writing cached manifests to disk
///
/// Entries live in an XDG-compliant cache directory (`~/.cache/server-tag/` on
/// Linux) unless a directory is given explicitly. File names are the SHA-256
/// of the key, so any URL can be used as a key.
#[derive(Debug, Clone)]
pub struct FileCache {
    /// Directory where cache files are stored
    cache_dir: PathBuf,
    clock: Arc<dyn Clock>,
}

impl FileCache {
    /// Creates a FileCache using the platform cache directory
    ///
    /// Returns `None` if the cache directory cannot be determined (e.g., no home directory).
    pub fn new() -> Option<Self> {
        let project_dirs = ProjectDirs::from("", "", "server-tag")?;
        Some(Self::with_dir(project_dirs.cache_dir().to_path_buf()))
    }

    /// Creates a FileCache with a custom cache directory
    pub fn with_dir(cache_dir: PathBuf) -> Self {
        Self {
            cache_dir,
            clock: Arc::new(SystemClock),
        }
    }

    /// Replaces the time source used to stamp and expire entries
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn cache_dir(&self) -> &Path {
        &self.cache_dir
    }

    /// Returns the path to a cache file for the given key
    fn cache_path(&self, key: &str) -> PathBuf {
        let digest = Sha256::digest(key.as_bytes());
        self.cache_dir.join(format!("{}.json", hex::encode(digest)))
    }

    /// Reads an entry regardless of freshness
    ///
    /// Returns `None` if the file doesn't exist, can't be parsed, or was
    /// written for a different key.
    fn read_entry(&self, key: &str) -> Option<CacheEntry<Manifest>> {
        let content = fs::read_to_string(self.cache_path(key)).ok()?;
        let entry: CacheEntry<Manifest> = serde_json::from_str(&content).ok()?;
        (entry.key == key).then_some(entry)
    }
}

impl ManifestCache for FileCache {
    fn get(&self, key: &str) -> Option<Manifest> {
        let entry = self.read_entry(key)?;
        is_fresh(self.clock.now(), entry.expires_at).then_some(entry.data)
    }

    fn set(&self, key: &str, manifest: &Manifest, ttl: Duration) -> Result<(), CacheError> {
        fs::create_dir_all(&self.cache_dir)?;

        let now = self.clock.now();
        let entry = CacheEntry {
            key: key.to_string(),
            data: manifest,
            cached_at: now,
            expires_at: expires_at(now, ttl),
        };

        // Readers see either the old file or the new one, never a partial write
        let json = serde_json::to_string_pretty(&entry)?;
        let mut file = NamedTempFile::new_in(&self.cache_dir)?;
        file.write_all(json.as_bytes())?;
        file.persist(self.cache_path(key)).map_err(|e| e.error)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::ManualClock;
    use tempfile::TempDir;

    const URL: &str = "https://cdn.example.com/manifest.json?site=42";

    fn create_test_cache() -> (FileCache, Arc<ManualClock>, TempDir) {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let clock = Arc::new(ManualClock::default());
        let cache = FileCache::with_dir(temp_dir.path().to_path_buf()).with_clock(clock.clone());
        (cache, clock, temp_dir)
    }

    #[test]
    fn test_set_creates_hashed_file_in_cache_directory() {
        let (cache, _clock, temp_dir) = create_test_cache();

        cache
            .set(URL, &Manifest::new(["/s/app.js"]), Duration::from_secs(60))
            .expect("Set should succeed");

        let files: Vec<_> = fs::read_dir(temp_dir.path()).unwrap().collect();
        assert_eq!(files.len(), 1);

        let path = files[0].as_ref().unwrap().path();
        let name = path.file_stem().unwrap().to_string_lossy().to_string();
        assert_eq!(name.len(), 64, "File name should be a hex SHA-256");
        assert!(name.chars().all(|c| c.is_ascii_hexdigit()));

        let content = fs::read_to_string(&path).expect("Should read file");
        assert!(content.contains("\"/s/app.js\""));
        assert!(content.contains(URL));
        assert!(content.contains("\"expires_at\""));
    }

    #[test]
    fn test_get_returns_none_for_missing_key() {
        let (cache, _clock, _temp_dir) = create_test_cache();
        assert!(cache.get(URL).is_none());
    }

    #[test]
    fn test_get_returns_fresh_manifest() {
        let (cache, _clock, _temp_dir) = create_test_cache();
        let manifest = Manifest::new(["a.js", "b.js"]);

        cache.set(URL, &manifest, Duration::from_secs(300)).unwrap();

        assert_eq!(cache.get(URL), Some(manifest));
    }

    #[test]
    fn test_get_returns_none_once_expired() {
        let (cache, clock, _temp_dir) = create_test_cache();
        cache.set(URL, &Manifest::new(["a.js"]), Duration::from_secs(60)).unwrap();

        clock.advance(Duration::from_secs(61));

        assert!(cache.get(URL).is_none());
    }

    #[test]
    fn test_corrupt_file_reads_as_missing() {
        let (cache, _clock, _temp_dir) = create_test_cache();
        cache.set(URL, &Manifest::new(["a.js"]), Duration::from_secs(60)).unwrap();

        fs::write(cache.cache_path(URL), "{ truncated").unwrap();

        assert!(cache.get(URL).is_none());
    }

    #[test]
    fn test_set_creates_directory_if_missing() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let nested_path = temp_dir.path().join("nested").join("cache").join("dir");
        let cache = FileCache::with_dir(nested_path.clone());

        cache
            .set(URL, &Manifest::new(["a.js"]), Duration::from_secs(60))
            .expect("Set should succeed");

        assert!(nested_path.exists(), "Nested directory should be created");
        assert_eq!(cache.get(URL), Some(Manifest::new(["a.js"])));
    }

    #[test]
    fn test_set_fails_when_directory_is_a_file() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let blocker = temp_dir.path().join("blocker");
        fs::write(&blocker, "not a directory").unwrap();
        let cache = FileCache::with_dir(blocker.join("cache"));

        let result = cache.set(URL, &Manifest::new(["a.js"]), Duration::from_secs(60));

        assert!(matches!(result, Err(CacheError::Io(_))));
    }

    #[test]
    fn test_concurrent_writers_never_leave_a_torn_file() {
        let (cache, _clock, temp_dir) = create_test_cache();
        let first = Manifest::new((0..200).map(|i| format!("/first/{i}.js")));
        let second = Manifest::new((0..200).map(|i| format!("/second/{i}.js")));
        cache.set(URL, &first, Duration::from_secs(60)).unwrap();

        std::thread::scope(|scope| {
            for manifest in [&first, &second] {
                let cache = &cache;
                scope.spawn(move || {
                    for _ in 0..20 {
                        cache.set(URL, manifest, Duration::from_secs(60)).unwrap();
                    }
                });
            }
            for _ in 0..50 {
                let read = cache.get(URL).expect("Entry should always be readable");
                assert!(read == first || read == second);
            }
        });

        let files = fs::read_dir(temp_dir.path()).unwrap().count();
        assert_eq!(files, 1, "No temporary files should be left behind");
    }

    #[test]
    fn test_new_creates_xdg_compliant_path() {
        if let Some(cache) = FileCache::new() {
            let path_str = cache.cache_dir().to_string_lossy();
            assert!(
                path_str.contains("server-tag"),
                "Cache path should contain project name"
            );
        }
        // Test passes if new() returns None (e.g., no home directory in CI)
    }

    #[test]
    fn test_overwrite_existing_entry() {
        let (cache, _clock, _temp_dir) = create_test_cache();

        cache.set(URL, &Manifest::new(["first.js"]), Duration::from_secs(60)).unwrap();
        cache.set(URL, &Manifest::new(["second.js"]), Duration::from_secs(60)).unwrap();

        assert_eq!(cache.get(URL), Some(Manifest::new(["second.js"])));
    }
}

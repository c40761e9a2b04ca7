//! Synchronous key-value persistence for the local session snapshot.
//!
//! This is the durability floor: the snapshot write happens on every state
//! change, with no network dependency, so the cache is the authoritative
//! source for resume decisions after a reload.

use std::{fs, io, path::PathBuf};

use dashmap::DashMap;
use thiserror::Error;

/// Fixed key the session snapshot is stored under.
pub const SAVE_KEY: &str = "escaperoom-save";

/// Result alias for cache operations.
pub type CacheResult<T> = Result<T, CacheError>;

/// Failure while reading or writing the local cache.
#[derive(Debug, Error)]
pub enum CacheError {
    /// Filesystem access failed.
    #[error("local cache I/O failure at `{path}`")]
    Io {
        /// Offending file path.
        path: String,
        /// Underlying filesystem error.
        #[source]
        source: io::Error,
    },
}

/// Synchronous key-value persistence scoped to this installation.
pub trait SnapshotCache: Send + Sync {
    /// Store `value` under `key`, replacing any previous value.
    fn write(&self, key: &str, value: &str) -> CacheResult<()>;
    /// Fetch the value under `key`, if present.
    fn read(&self, key: &str) -> CacheResult<Option<String>>;
    /// Remove the value under `key`; absent keys are fine.
    fn delete(&self, key: &str) -> CacheResult<()>;
}

/// [`SnapshotCache`] storing one file per key under a directory.
#[derive(Debug, Clone)]
pub struct FileSnapshotCache {
    dir: PathBuf,
}

impl FileSnapshotCache {
    /// Cache rooted at `dir`; the directory is created on first write.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }
}

impl SnapshotCache for FileSnapshotCache {
    fn write(&self, key: &str, value: &str) -> CacheResult<()> {
        fs::create_dir_all(&self.dir).map_err(|source| CacheError::Io {
            path: self.dir.display().to_string(),
            source,
        })?;
        let path = self.path_for(key);
        fs::write(&path, value).map_err(|source| CacheError::Io {
            path: path.display().to_string(),
            source,
        })
    }

    fn read(&self, key: &str) -> CacheResult<Option<String>> {
        let path = self.path_for(key);
        match fs::read_to_string(&path) {
            Ok(contents) => Ok(Some(contents)),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(source) => Err(CacheError::Io {
                path: path.display().to_string(),
                source,
            }),
        }
    }

    fn delete(&self, key: &str) -> CacheResult<()> {
        let path = self.path_for(key);
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(source) => Err(CacheError::Io {
                path: path.display().to_string(),
                source,
            }),
        }
    }
}

/// [`SnapshotCache`] kept entirely in memory; used by tests and embedders
/// that manage their own persistence.
#[derive(Debug, Default)]
pub struct MemorySnapshotCache {
    entries: DashMap<String, String>,
}

impl MemorySnapshotCache {
    /// Fresh, empty cache.
    pub fn new() -> Self {
        Self::default()
    }
}

impl SnapshotCache for MemorySnapshotCache {
    fn write(&self, key: &str, value: &str) -> CacheResult<()> {
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn read(&self, key: &str) -> CacheResult<Option<String>> {
        Ok(self.entries.get(key).map(|entry| entry.clone()))
    }

    fn delete(&self, key: &str) -> CacheResult<()> {
        self.entries.remove(key);
        Ok(())
    }
}

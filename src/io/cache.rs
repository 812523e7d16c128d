//! Explicit memoization of parsed input tables.
//!
//! An entry is keyed by the file path together with its modification time
//! and length, so editing a file on disk produces a fresh load.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::SystemTime;

use tracing::debug;

use crate::error::{Error, Result};

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct CacheKey {
    path: PathBuf,
    modified: SystemTime,
    len: u64,
}

impl CacheKey {
    fn for_path(path: &Path) -> Result<Self> {
        let meta = fs::metadata(path).map_err(|source| Error::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Self {
            path: path.to_path_buf(),
            modified: meta.modified().unwrap_or(SystemTime::UNIX_EPOCH),
            len: meta.len(),
        })
    }
}

/// Hit and miss counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
}

/// Cache of values loaded from files.
#[derive(Debug)]
pub struct InputCache<T> {
    entries: HashMap<CacheKey, Arc<T>>,
    stats: CacheStats,
}

impl<T> Default for InputCache<T> {
    fn default() -> Self {
        Self {
            entries: HashMap::new(),
            stats: CacheStats::default(),
        }
    }
}

impl<T> InputCache<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the cached value for `path` or loads it with `load`.
    ///
    /// Stale entries for the same path are dropped on a miss. A failed load
    /// caches nothing.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`] if `path` cannot be inspected, or the error of
    /// `load`.
    pub fn get_or_load<F>(&mut self, path: &Path, load: F) -> Result<Arc<T>>
    where
        F: FnOnce(&Path) -> Result<T>,
    {
        let key = CacheKey::for_path(path)?;
        if let Some(value) = self.entries.get(&key) {
            self.stats.hits += 1;
            debug!(path = %path.display(), "input cache hit");
            return Ok(Arc::clone(value));
        }

        self.stats.misses += 1;
        debug!(path = %path.display(), "input cache miss");
        let value = Arc::new(load(path)?);
        self.invalidate(path);
        self.entries.insert(key, Arc::clone(&value));
        Ok(value)
    }

    /// Drops every entry for `path`.
    pub fn invalidate(&mut self, path: &Path) {
        self.entries.retain(|key, _| key.path != path);
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn stats(&self) -> CacheStats {
        self.stats
    }
}

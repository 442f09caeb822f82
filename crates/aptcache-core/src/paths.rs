//! Cache directory layout.

use dirs::cache_dir;
use std::path::{Path, PathBuf};

/// Environment variable overriding the cache directory.
pub const CACHE_DIR_ENV: &str = "APTCACHE_DIR";

/// Returns the default cache directory, or None if no per-user cache
/// directory can be resolved.
pub fn try_cache_dir() -> Option<PathBuf> {
    if let Ok(val) = std::env::var(CACHE_DIR_ENV) {
        if !val.is_empty() {
            return Some(PathBuf::from(val));
        }
    }
    cache_dir().map(|c| c.join("aptcache"))
}

/// Names the files that make up one cache directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheLayout {
    root: PathBuf,
}

impl CacheLayout {
    /// Layout rooted at `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Layout rooted at [`try_cache_dir`].
    pub fn from_env() -> Option<Self> {
        try_cache_dir().map(Self::new)
    }

    /// The cache directory itself.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Plaintext cache key: `<root>/cache_key.txt`
    pub fn key_plaintext(&self) -> PathBuf {
        self.root.join("cache_key.txt")
    }

    /// Binary key digest: `<root>/cache_key.sha256`
    pub fn key_hash(&self) -> PathBuf {
        self.root.join("cache_key.sha256")
    }

    /// Installation manifest: `<root>/manifest.json`
    pub fn manifest(&self) -> PathBuf {
        self.root.join("manifest.json")
    }

    /// Archive of installed files: `<root>/cache.tar`
    pub fn archive(&self) -> PathBuf {
        self.root.join("cache.tar")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn layout_names_files_under_root() {
        let layout = CacheLayout::new("/tmp/aptcache");
        assert_eq!(layout.root(), Path::new("/tmp/aptcache"));
        assert_eq!(layout.key_plaintext(), Path::new("/tmp/aptcache/cache_key.txt"));
        assert_eq!(layout.key_hash(), Path::new("/tmp/aptcache/cache_key.sha256"));
        assert_eq!(layout.manifest(), Path::new("/tmp/aptcache/manifest.json"));
        assert_eq!(layout.archive(), Path::new("/tmp/aptcache/cache.tar"));
    }
}

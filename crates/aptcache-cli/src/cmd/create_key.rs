use std::path::PathBuf;

use anyhow::{Context, Result};
use aptcache_core::{CacheKey, CacheLayout};
use aptcache_schema::{OsArch, PackageSet};

/// Build a cache key and write its plaintext and digest into the cache dir.
///
/// Prints the hex digest on stdout.
pub fn create_key(
    cache_dir: Option<PathBuf>,
    version: &str,
    global_version: &str,
    os_arch: Option<&str>,
    packages: &[String],
) -> Result<()> {
    let layout = match cache_dir {
        Some(dir) => CacheLayout::new(dir),
        None => CacheLayout::from_env()
            .context("Could not determine cache directory. Set APTCACHE_DIR or pass --cache-dir.")?,
    };

    let packages = PackageSet::parse_args(packages)?;
    let os_arch = os_arch.map_or_else(|| OsArch::current().to_string(), str::to_string);
    let key = CacheKey::new(packages, version, global_version, os_arch)?;

    std::fs::create_dir_all(layout.root())
        .with_context(|| format!("Failed to create {}", layout.root().display()))?;
    key.write(&layout.key_plaintext(), &layout.key_hash())
        .context("Failed to write cache key")?;

    tracing::info!("Cache key: {key}");
    println!("{}", key.hash());
    Ok(())
}

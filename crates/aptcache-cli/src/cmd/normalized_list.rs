use anyhow::{Context, Result};
use aptcache_core::{CatalogResolver, Executor, TracingReporter};

/// Resolve `names` and print the canonical `name=version` list on stdout.
pub fn normalized_list(executor: &dyn Executor, names: &[String]) -> Result<()> {
    let resolver = CatalogResolver::from_env(executor, &TracingReporter);
    let resolved = resolver
        .resolve(names)
        .context("Failed to resolve package names")?;

    println!("{resolved}");
    Ok(())
}

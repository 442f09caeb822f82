//! Catalog resolution: turn requested package names into concrete
//! `name=version` pairs by asking the APT catalog.
//!
//! All names go to the catalog tool in a single `show` call. Its output is a
//! series of RFC822-like paragraphs separated by blank lines; `Package:` and
//! `Version:` fields populate records, while `N:`/`E:` lines carry notes and
//! diagnostics. A purely virtual package is resolved through a secondary
//! `showpkg` query that names its first concrete provider.
//!
//! The batch either resolves completely or fails with every diagnostic the
//! catalog produced, in first-seen order.

use std::sync::LazyLock;

use aptcache_schema::{Package, PackageSet};
use regex::Regex;
use thiserror::Error;

use crate::exec::{ExecError, Executor};
use crate::reporter::Reporter;

/// Catalog tool used when none is configured.
pub const DEFAULT_CATALOG_TOOL: &str = "apt-cache";

/// Environment variable overriding the catalog tool.
pub const CATALOG_TOOL_ENV: &str = "APTCACHE_CATALOG_TOOL";

const SHOW_ARGS: [&str; 3] = ["--quiet=0", "--no-all-versions", "show"];
const REVERSE_PROVIDES_MARKER: &str = "Reverse Provides";
const UNABLE_TO_LOCATE: &str = "Unable to locate package";

// e.g. "Can't select versions from package 'libvips' as it is purely virtual"
static PURELY_VIRTUAL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"package '([^']+)'.*purely virtual").expect("purely virtual pattern is valid")
});

/// Errors from resolving package names against the catalog.
#[derive(Error, Debug)]
pub enum ResolveError {
    /// The catalog tool could not be run or replayed.
    #[error(transparent)]
    Exec(#[from] ExecError),

    /// The catalog tool exited non-zero without any APT diagnostics.
    #[error("{0}")]
    Tool(String),

    /// One or more names did not resolve; carries every diagnostic.
    #[error("{0}")]
    Resolution(String),

    /// A purely virtual package has no concrete provider.
    #[error("virtual package '{name}' has no concrete package providers available")]
    NoProviders {
        /// The virtual package name.
        name: String,
    },

    /// The provider line after the reverse-provides marker is unusable.
    #[error(
        "unable to parse space delimited line's package name and version from apt-cache showpkg output below:\n{output}"
    )]
    MalformedProvider {
        /// Full `showpkg` output.
        output: String,
    },
}

/// Resolves raw package names into a canonical [`PackageSet`].
pub struct CatalogResolver<'a> {
    executor: &'a dyn Executor,
    reporter: &'a dyn Reporter,
    tool: String,
}

impl std::fmt::Debug for CatalogResolver<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CatalogResolver")
            .field("tool", &self.tool)
            .finish_non_exhaustive()
    }
}

impl<'a> CatalogResolver<'a> {
    /// Create a resolver that queries [`DEFAULT_CATALOG_TOOL`].
    pub fn new(executor: &'a dyn Executor, reporter: &'a dyn Reporter) -> Self {
        Self {
            executor,
            reporter,
            tool: DEFAULT_CATALOG_TOOL.to_string(),
        }
    }

    /// Create a resolver honouring [`CATALOG_TOOL_ENV`] when set.
    pub fn from_env(executor: &'a dyn Executor, reporter: &'a dyn Reporter) -> Self {
        let resolver = Self::new(executor, reporter);
        match std::env::var(CATALOG_TOOL_ENV) {
            Ok(tool) if !tool.is_empty() => resolver.with_tool(tool),
            _ => resolver,
        }
    }

    /// Use a different catalog tool binary.
    pub fn with_tool(mut self, tool: impl Into<String>) -> Self {
        self.tool = tool.into();
        self
    }

    /// The catalog tool this resolver invokes.
    pub fn tool(&self) -> &str {
        &self.tool
    }

    /// Resolve `names` into concrete packages.
    ///
    /// Output order does not depend on the order of `names`, and repeated
    /// names collapse. An empty request resolves to an empty set without
    /// invoking the catalog.
    ///
    /// # Errors
    ///
    /// - [`ResolveError::Resolution`] if any name fails to resolve; no
    ///   partial result is returned.
    /// - [`ResolveError::Tool`] if the catalog tool fails outright.
    /// - [`ResolveError::NoProviders`] / [`ResolveError::MalformedProvider`]
    ///   if a virtual package cannot be mapped to a provider.
    /// - [`ResolveError::Exec`] if the tool cannot be run at all.
    pub fn resolve<S: AsRef<str>>(&self, names: &[S]) -> Result<PackageSet, ResolveError> {
        if names.is_empty() {
            return Ok(PackageSet::default());
        }

        self.reporter
            .section(&format!("Resolving {} package name(s)", names.len()));

        let mut args: Vec<&str> = SHOW_ARGS.to_vec();
        args.extend(names.iter().map(AsRef::as_ref));
        let execution = self.executor.exec(&self.tool, &args)?;

        if let Some(report) = execution.failure() {
            // apt-cache exits 100 when nothing matched; that is a resolution
            // failure, not a broken tool.
            if execution
                .combined_output
                .lines()
                .any(|line| line.starts_with("E: "))
            {
                return Err(ResolveError::Resolution(report));
            }
            return Err(ResolveError::Tool(report));
        }

        let mut packages = Vec::new();
        let mut diagnostics: Vec<String> = Vec::new();

        for paragraph in paragraphs(&execution.combined_output) {
            let parsed = self.parse_paragraph(&paragraph)?;
            if parsed.diagnostics.is_empty() {
                packages.extend(parsed.packages);
            }
            for diagnostic in parsed.diagnostics {
                push_unique(&mut diagnostics, diagnostic);
            }
        }

        if !diagnostics.is_empty() {
            return Err(ResolveError::Resolution(diagnostics.join("\n")));
        }

        let resolved = PackageSet::new(packages);
        self.reporter.success(&format!(
            "Resolved {} package(s): {resolved}",
            resolved.len()
        ));
        Ok(resolved)
    }

    fn parse_paragraph(&self, paragraph: &[&str]) -> Result<Paragraph, ResolveError> {
        let mut record: Option<Package> = None;
        let mut parsed = Paragraph::default();

        for &line in paragraph {
            let Some((field, value)) = line.split_once(':') else {
                tracing::trace!("Skipping catalog line without a field: {line}");
                continue;
            };
            let value = value.trim();

            match field {
                "Package" if value.is_empty() => {
                    tracing::trace!("Ignoring record without a package name: {line}");
                    record = None;
                }
                "Package" => record = Some(Package::unversioned(value)),
                "Version" => match record.as_mut() {
                    Some(record) => record.version = value.to_string(),
                    None => tracing::trace!("Ignoring version before package: {line}"),
                },
                "N" => {
                    if let Some(name) = virtual_package_name(value) {
                        parsed.packages.push(self.resolve_virtual(name)?);
                    } else if value.starts_with(UNABLE_TO_LOCATE) {
                        push_unique(&mut parsed.diagnostics, line.to_string());
                    } else {
                        self.reporter.warning(line);
                    }
                }
                "E" => push_unique(&mut parsed.diagnostics, line.to_string()),
                _ => {}
            }
        }

        if let Some(record) = record {
            parsed.packages.insert(0, record);
        }
        Ok(parsed)
    }

    /// Map a purely virtual package to the first provider listed under
    /// "Reverse Provides" by `showpkg`.
    fn resolve_virtual(&self, name: &str) -> Result<Package, ResolveError> {
        let execution = self.executor.exec(&self.tool, &["showpkg", name])?;
        if let Some(report) = execution.failure() {
            return Err(ResolveError::Tool(report));
        }

        let provider = execution
            .combined_output
            .lines()
            .skip_while(|line| !line.contains(REVERSE_PROVIDES_MARKER))
            .nth(1)
            .map(str::trim)
            .filter(|line| !line.is_empty() && !is_diagnostic(line));

        let Some(provider) = provider else {
            return Err(ResolveError::NoProviders {
                name: name.to_string(),
            });
        };

        let mut tokens = provider.split_whitespace();
        match (tokens.next(), tokens.next()) {
            (Some(provider_name), Some(version)) => {
                let package = Package::new(provider_name, version);
                self.reporter.info(&format!(
                    "Resolved virtual package '{name}' to {package}"
                ));
                Ok(package)
            }
            _ => Err(ResolveError::MalformedProvider {
                output: execution.combined_output,
            }),
        }
    }
}

#[derive(Debug, Default)]
struct Paragraph {
    packages: Vec<Package>,
    diagnostics: Vec<String>,
}

/// Split catalog output into non-empty paragraphs of lines.
fn paragraphs(output: &str) -> Vec<Vec<&str>> {
    let mut all = Vec::new();
    let mut current = Vec::new();
    for line in output.lines() {
        if line.trim().is_empty() {
            if !current.is_empty() {
                all.push(std::mem::take(&mut current));
            }
        } else {
            current.push(line);
        }
    }
    if !current.is_empty() {
        all.push(current);
    }
    all
}

fn virtual_package_name(note: &str) -> Option<&str> {
    PURELY_VIRTUAL
        .captures(note)
        .and_then(|captures| captures.get(1))
        .map(|m| m.as_str())
}

fn is_diagnostic(line: &str) -> bool {
    line.starts_with("N: ") || line.starts_with("E: ")
}

fn push_unique(list: &mut Vec<String>, item: String) {
    if !list.contains(&item) {
        list.push(item);
    }
}

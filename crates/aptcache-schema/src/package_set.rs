//! The canonical, deduplicated package collection.
//!
//! Every way of building a [`PackageSet`] funnels through [`PackageSet::new`],
//! which sorts by `(name, version)` and drops exact duplicates. Two sets
//! built from the same packages in any order are therefore identical, which
//! is what makes cache keys independent of argument order.

use crate::package::{Package, PackageSpecError};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A package argument that could not be parsed.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("error creating package from arg {arg:?}: {source}")]
pub struct InvalidPackageArg {
    /// The raw argument as given.
    pub arg: String,
    /// Why it was rejected.
    #[source]
    pub source: PackageSpecError,
}

/// Ordered sequence of unique packages, sorted by `(name, version)`.
///
/// Deduplication is by the exact pair: the same name at two different
/// versions yields two entries.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "Vec<Package>", into = "Vec<Package>")]
pub struct PackageSet(Vec<Package>);

impl PackageSet {
    /// Build a canonical set from packages in any order.
    pub fn new(packages: impl IntoIterator<Item = Package>) -> Self {
        let mut packages: Vec<Package> = packages.into_iter().collect();
        packages.sort();
        packages.dedup();
        Self(packages)
    }

    /// Parse `name[=version]` arguments and build a canonical set.
    ///
    /// # Errors
    ///
    /// Returns the first argument that fails [`Package::parse`].
    pub fn parse_args<S: AsRef<str>>(args: &[S]) -> Result<Self, InvalidPackageArg> {
        let packages = args
            .iter()
            .map(|arg| {
                let arg = arg.as_ref();
                Package::parse(arg).map_err(|source| InvalidPackageArg {
                    arg: arg.to_string(),
                    source,
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self::new(packages))
    }

    /// Number of packages in the set.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the set holds no packages.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Package at `index` in canonical order.
    pub fn get(&self, index: usize) -> Option<&Package> {
        self.0.get(index)
    }

    /// Whether the exact `(name, version)` pair is present.
    pub fn contains(&self, package: &Package) -> bool {
        self.0.binary_search(package).is_ok()
    }

    /// Iterate in canonical order.
    pub fn iter(&self) -> std::slice::Iter<'_, Package> {
        self.0.iter()
    }

    /// The packages as a slice in canonical order.
    pub fn as_slice(&self) -> &[Package] {
        &self.0
    }

    /// Each package rendered as an APT argument (`name` or `name=version`).
    pub fn to_string_array(&self) -> Vec<String> {
        self.0.iter().map(ToString::to_string).collect()
    }

    /// Space-separated canonical serialization.
    pub fn serialize(&self) -> String {
        self.to_string_array().join(" ")
    }
}

impl std::fmt::Display for PackageSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.serialize())
    }
}

impl FromIterator<Package> for PackageSet {
    fn from_iter<I: IntoIterator<Item = Package>>(iter: I) -> Self {
        Self::new(iter)
    }
}

impl From<Vec<Package>> for PackageSet {
    fn from(packages: Vec<Package>) -> Self {
        Self::new(packages)
    }
}

impl From<PackageSet> for Vec<Package> {
    fn from(set: PackageSet) -> Self {
        set.0
    }
}

impl<'a> IntoIterator for &'a PackageSet {
    type Item = &'a Package;
    type IntoIter = std::slice::Iter<'a, Package>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(specs: &[&str]) -> PackageSet {
        PackageSet::parse_args(specs).unwrap()
    }

    #[test]
    fn empty_set() {
        let empty = PackageSet::default();
        assert!(empty.is_empty());
        assert_eq!(empty.serialize(), "");
    }

    #[test]
    fn sorts_regardless_of_input_order() {
        let a = set(&["xdot=1.3-1", "rolldice=1.16-1build3"]);
        let b = set(&["rolldice=1.16-1build3", "xdot=1.3-1"]);
        assert_eq!(a, b);
        assert_eq!(a.serialize(), "rolldice=1.16-1build3 xdot=1.3-1");
    }

    #[test]
    fn dedups_exact_pairs_only() {
        let pkgs = set(&["xdot=1.3-1", "xdot=1.3-1", "xdot=1.3-2", "xdot"]);
        assert_eq!(pkgs.len(), 3);
        assert_eq!(pkgs.serialize(), "xdot xdot=1.3-1 xdot=1.3-2");
    }

    #[test]
    fn dedup_is_idempotent() {
        let once = set(&["b", "a", "b", "a=1"]);
        let twice = PackageSet::new(once.iter().cloned().chain(once.iter().cloned()));
        assert_eq!(once, twice);
    }

    #[test]
    fn contains_checks_exact_pair() {
        let pkgs = set(&["xdot=1.3-1", "rolldice=1.16-1build3"]);
        assert!(pkgs.contains(&Package::new("xdot", "1.3-1")));
        assert!(!pkgs.contains(&Package::unversioned("xdot")));
        assert!(!pkgs.contains(&Package::new("nonexistent", "1.0")));
    }

    #[test]
    fn parse_args_reports_offending_argument() {
        let err = PackageSet::parse_args(&["xdot", "rolldice="]).unwrap_err();
        assert_eq!(err.arg, "rolldice=");
        assert_eq!(err.source, PackageSpecError::EmptyVersion);
        assert!(err.to_string().contains("\"rolldice=\""));
    }

    #[test]
    fn deserialization_recanonicalizes() {
        let json = r#"[{"name":"xdot","version":"1.3-1"},{"name":"rolldice","version":"1"},{"name":"xdot","version":"1.3-1"}]"#;
        let pkgs: PackageSet = serde_json::from_str(json).unwrap();
        assert_eq!(pkgs.serialize(), "rolldice=1 xdot=1.3-1");
    }
}

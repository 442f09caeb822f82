//! APT package records and `name[=version]` spec parsing.

use serde::{Deserialize, Serialize};
use std::str::FromStr;
use thiserror::Error;

/// Errors raised while parsing a `name` / `name=version` package spec.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PackageSpecError {
    /// The spec has no name before the optional `=` separator.
    #[error("package name cannot be empty")]
    EmptyName,

    /// The spec has an explicit `=` separator but nothing after it.
    #[error("package version cannot be empty if specified")]
    EmptyVersion,
}

/// An APT package, optionally pinned to a version.
///
/// Equality and ordering are by `(name, version)` using ordinal string
/// comparison; an empty version sorts before any concrete one.
///
/// Deserialization rejects an empty name, so records loaded from a manifest
/// or cache key carry the same guarantee as [`Package::parse`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "PackageRecord")]
pub struct Package {
    /// Package name as known to APT.
    pub name: String,
    /// Requested or resolved version; empty when unpinned.
    pub version: String,
}

#[derive(Deserialize)]
struct PackageRecord {
    name: String,
    #[serde(default)]
    version: String,
}

impl TryFrom<PackageRecord> for Package {
    type Error = PackageSpecError;

    fn try_from(record: PackageRecord) -> Result<Self, Self::Error> {
        if record.name.is_empty() {
            return Err(PackageSpecError::EmptyName);
        }
        Ok(Self::new(record.name, record.version))
    }
}

impl Package {
    /// Create a package record from a name and version (empty for unpinned).
    ///
    /// The name is trusted; use [`Package::parse`] for user input.
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
        }
    }

    /// Create an unpinned package record.
    pub fn unversioned(name: impl Into<String>) -> Self {
        Self::new(name, String::new())
    }

    /// Parse an APT package spec of the form `name` or `name=version`.
    ///
    /// Only the first `=` separates name from version, so versions may
    /// themselves contain `=` or `:` characters.
    ///
    /// # Errors
    ///
    /// Returns [`PackageSpecError::EmptyName`] if the name is empty and
    /// [`PackageSpecError::EmptyVersion`] if a `=` is present with nothing
    /// after it.
    pub fn parse(spec: &str) -> Result<Self, PackageSpecError> {
        let (name, version) = match spec.split_once('=') {
            Some((name, version)) => (name, Some(version)),
            None => (spec, None),
        };

        if name.is_empty() {
            return Err(PackageSpecError::EmptyName);
        }

        match version {
            Some("") => Err(PackageSpecError::EmptyVersion),
            Some(version) => Ok(Self::new(name, version)),
            None => Ok(Self::unversioned(name)),
        }
    }

    /// Whether this record carries a concrete version.
    pub fn has_version(&self) -> bool {
        !self.version.is_empty()
    }
}

impl FromStr for Package {
    type Err = PackageSpecError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl std::fmt::Display for Package {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.has_version() {
            write!(f, "{}={}", self.name, self.version)
        } else {
            write!(f, "{}", self.name)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_bare_name() {
        let pkg = Package::parse("xdot").unwrap();
        assert_eq!(pkg.name, "xdot");
        assert!(pkg.version.is_empty());
        assert_eq!(pkg.to_string(), "xdot");
    }

    #[test]
    fn parse_name_and_version() {
        let pkg = Package::parse("rolldice=1.16-1build1").unwrap();
        assert_eq!(pkg, Package::new("rolldice", "1.16-1build1"));
        assert_eq!(pkg.to_string(), "rolldice=1.16-1build1");
    }

    #[test]
    fn parse_keeps_epoch_and_later_separators() {
        let pkg: Package = "default-jre=2:1.17-74".parse().unwrap();
        assert_eq!(pkg.version, "2:1.17-74");

        let pkg = Package::parse("odd=1=2").unwrap();
        assert_eq!(pkg.name, "odd");
        assert_eq!(pkg.version, "1=2");
    }

    #[test]
    fn parse_rejects_empty_name() {
        assert_eq!(Package::parse(""), Err(PackageSpecError::EmptyName));
        assert_eq!(Package::parse("=1.0"), Err(PackageSpecError::EmptyName));
    }

    #[test]
    fn parse_rejects_empty_explicit_version() {
        assert_eq!(Package::parse("xdot="), Err(PackageSpecError::EmptyVersion));
    }

    #[test]
    fn deserialize_validates_name() {
        let pkg: Package = serde_json::from_str(r#"{"name": "xdot", "version": "1.2-3"}"#).unwrap();
        assert_eq!(pkg, Package::new("xdot", "1.2-3"));

        let pkg: Package = serde_json::from_str(r#"{"name": "xdot"}"#).unwrap();
        assert!(!pkg.has_version());

        let err = serde_json::from_str::<Package>(r#"{"name": "", "version": "1.0"}"#).unwrap_err();
        assert!(err.to_string().contains("package name cannot be empty"));
        assert!(serde_json::from_str::<Package>(r#"{"version": "1.0"}"#).is_err());
    }

    #[test]
    fn ordering_is_name_then_version() {
        let mut pkgs = vec![
            Package::new("xdot", "1.3-1"),
            Package::new("rolldice", "1.16"),
            Package::unversioned("xdot"),
        ];
        pkgs.sort();
        assert_eq!(
            pkgs,
            vec![
                Package::new("rolldice", "1.16"),
                Package::unversioned("xdot"),
                Package::new("xdot", "1.3-1"),
            ]
        );
    }
}

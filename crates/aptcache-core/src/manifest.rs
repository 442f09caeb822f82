//! Installation manifest.
//!
//! Records which files each installed package produced, under the cache key
//! that addresses the installation. The manifest is written once after
//! install and read back verbatim on restore.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use aptcache_schema::{Package, PackageSet};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::key::CacheKey;

/// Errors from persisting or loading a manifest.
#[derive(Error, Debug)]
pub enum ManifestError {
    /// No manifest exists at the path.
    #[error("manifest not found at {0}")]
    NotFound(PathBuf),

    /// The manifest file is not valid manifest JSON.
    #[error("failed to parse manifest {path}: {source}")]
    Parse {
        /// Manifest path.
        path: PathBuf,
        /// Underlying JSON error.
        #[source]
        source: serde_json::Error,
    },

    /// The manifest could not be serialized.
    #[error("failed to serialize manifest: {0}")]
    Serialize(#[source] serde_json::Error),

    /// Reading or writing failed.
    #[error("manifest I/O error at {path}: {source}")]
    Io {
        /// File being accessed.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
}

/// Files produced by one installed package.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestEntry {
    /// The installed package.
    pub package: Package,
    /// Absolute paths, in the order the installer reported them.
    pub filepaths: Vec<String>,
}

/// Record of one cached installation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Manifest {
    /// Key addressing the installation.
    pub cache_key: CacheKey,
    /// When the manifest was created.
    pub last_modified: DateTime<Utc>,
    /// One entry per installed package, in installation order.
    pub entries: Vec<ManifestEntry>,
}

impl Manifest {
    /// Start an empty manifest stamped with the current time.
    pub fn new(cache_key: CacheKey) -> Self {
        Self {
            cache_key,
            last_modified: Utc::now(),
            entries: Vec::new(),
        }
    }

    /// Append the files one package installed. Entries are kept in call order.
    pub fn add_entry(&mut self, package: Package, filepaths: Vec<String>) {
        self.entries.push(ManifestEntry { package, filepaths });
    }

    /// Packages recorded in the manifest, canonicalised.
    pub fn installed_packages(&self) -> PackageSet {
        self.entries.iter().map(|e| e.package.clone()).collect()
    }

    /// Every recorded file path, in installation order.
    pub fn filepaths(&self) -> Vec<&str> {
        self.entries
            .iter()
            .flat_map(|e| e.filepaths.iter().map(String::as_str))
            .collect()
    }

    /// Compact `name-version,name-version` summary in installation order.
    pub fn package_version_list(&self) -> String {
        self.entries
            .iter()
            .map(|e| format!("{}-{}", e.package.name, e.package.version))
            .collect::<Vec<_>>()
            .join(",")
    }

    /// Serialize to indented JSON and replace `path` atomically.
    ///
    /// The JSON is rendered in memory, written to a temporary file beside
    /// `path` and renamed over it, so readers never see a partial manifest.
    ///
    /// # Errors
    ///
    /// Returns [`ManifestError::Serialize`] or [`ManifestError::Io`].
    pub fn write(&self, path: &Path) -> Result<(), ManifestError> {
        let content = serde_json::to_string_pretty(self).map_err(ManifestError::Serialize)?;

        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        let io_err = |source| ManifestError::Io {
            path: path.to_path_buf(),
            source,
        };

        let mut temp = tempfile::NamedTempFile::new_in(dir).map_err(io_err)?;
        temp.write_all(content.as_bytes()).map_err(io_err)?;
        temp.persist(path).map_err(|e| io_err(e.error))?;

        tracing::debug!(
            "Wrote manifest with {} entries to {}",
            self.entries.len(),
            path.display()
        );
        Ok(())
    }

    /// Load a manifest written by [`Self::write`].
    ///
    /// # Errors
    ///
    /// - [`ManifestError::NotFound`] if `path` does not exist.
    /// - [`ManifestError::Parse`] if the content is not a valid manifest.
    /// - [`ManifestError::Io`] for any other read failure.
    pub fn read(path: &Path) -> Result<Self, ManifestError> {
        let content = fs::read_to_string(path).map_err(|source| {
            if source.kind() == std::io::ErrorKind::NotFound {
                ManifestError::NotFound(path.to_path_buf())
            } else {
                ManifestError::Io {
                    path: path.to_path_buf(),
                    source,
                }
            }
        })?;

        serde_json::from_str(&content).map_err(|source| ManifestError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Append `package-version-list=<summary>` to a CI step output file.
    ///
    /// # Errors
    ///
    /// Returns [`ManifestError::Io`] if the file cannot be opened or written.
    pub fn write_outputs(&self, path: &Path) -> Result<(), ManifestError> {
        let io_err = |source| ManifestError::Io {
            path: path.to_path_buf(),
            source,
        };
        let mut file = fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .map_err(io_err)?;
        writeln!(file, "package-version-list={}", self.package_version_list()).map_err(io_err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn manifest() -> Manifest {
        let packages = PackageSet::parse_args(&["xdot=1.2-3", "rolldice=1.16-1build1"]).unwrap();
        let key = CacheKey::new(packages, "v1", "v2", "amd64").unwrap();
        let mut manifest = Manifest::new(key);
        manifest.add_entry(
            Package::new("xdot", "1.2-3"),
            vec![
                "/usr/bin/xdot".to_string(),
                "/usr/share/doc/xdot/copyright".to_string(),
            ],
        );
        manifest.add_entry(
            Package::new("rolldice", "1.16-1build1"),
            vec!["/usr/games/rolldice".to_string()],
        );
        manifest
    }

    #[test]
    fn new_manifest_is_empty_and_stamped() {
        let before = Utc::now();
        let manifest = Manifest::new(manifest().cache_key);
        assert!(manifest.entries.is_empty());
        assert!(manifest.last_modified >= before);
        assert!(manifest.last_modified <= Utc::now());
    }

    #[test]
    fn entries_keep_installation_order() {
        let manifest = manifest();
        assert_eq!(manifest.entries[0].package.name, "xdot");
        assert_eq!(manifest.entries[1].package.name, "rolldice");
        assert_eq!(
            manifest.filepaths(),
            vec![
                "/usr/bin/xdot",
                "/usr/share/doc/xdot/copyright",
                "/usr/games/rolldice"
            ]
        );
        assert_eq!(
            manifest.package_version_list(),
            "xdot-1.2-3,rolldice-1.16-1build1"
        );
        assert_eq!(
            manifest.installed_packages().serialize(),
            "rolldice=1.16-1build1 xdot=1.2-3"
        );
    }

    #[test]
    fn write_then_read_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("manifest.json");
        let manifest = manifest();

        manifest.write(&path).unwrap();
        let back = Manifest::read(&path).unwrap();

        assert_eq!(back, manifest);
        assert_eq!(back.last_modified, manifest.last_modified);
    }

    #[test]
    fn json_layout() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("manifest.json");
        manifest().write(&path).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        assert!(content.contains('\n'), "expected indented JSON");

        let json: serde_json::Value = serde_json::from_str(&content).unwrap();
        assert_eq!(json["cacheKey"]["osArch"], "amd64");
        assert!(json["lastModified"].as_str().unwrap().ends_with('Z'));
        assert_eq!(json["entries"][0]["package"]["name"], "xdot");
        assert_eq!(json["entries"][0]["package"]["version"], "1.2-3");
        assert_eq!(json["entries"][0]["filepaths"][0], "/usr/bin/xdot");
    }

    #[test]
    fn write_replaces_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("manifest.json");
        fs::write(&path, "x".repeat(100_000)).unwrap();

        let manifest = manifest();
        manifest.write(&path).unwrap();
        assert_eq!(Manifest::read(&path).unwrap(), manifest);

        let leftovers = fs::read_dir(dir.path()).unwrap().count();
        assert_eq!(leftovers, 1);
    }

    #[test]
    fn read_missing_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("manifest.json");
        assert!(matches!(
            Manifest::read(&path),
            Err(ManifestError::NotFound(p)) if p == path
        ));
    }

    #[test]
    fn read_malformed_is_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("manifest.json");
        fs::write(&path, "{\"cacheKey\": ").unwrap();
        assert!(matches!(
            Manifest::read(&path),
            Err(ManifestError::Parse { .. })
        ));

        fs::write(
            &path,
            r#"{"cacheKey": {"packages": [], "version": "", "globalVersion": "", "osArch": "amd64"}, "lastModified": "2026-01-01T00:00:00Z", "entries": []}"#,
        )
        .unwrap();
        assert!(matches!(
            Manifest::read(&path),
            Err(ManifestError::Parse { .. })
        ));
    }

    #[test]
    fn write_into_missing_directory_fails() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nope").join("manifest.json");
        assert!(matches!(
            manifest().write(&path),
            Err(ManifestError::Io { .. })
        ));
    }

    #[test]
    fn outputs_are_appended() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("github_output");
        fs::write(&path, "other=1\n").unwrap();

        manifest().write_outputs(&path).unwrap();
        assert_eq!(
            fs::read_to_string(&path).unwrap(),
            "other=1\npackage-version-list=xdot-1.2-3,rolldice-1.16-1build1\n"
        );
    }
}

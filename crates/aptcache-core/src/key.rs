//! Cache keys.
//!
//! A [`CacheKey`] is the resolved package set plus the version dimensions
//! that should invalidate a cache. It is persisted as a plaintext file and a
//! raw SHA-256 digest of that plaintext; reading it back recomputes the
//! digest so a tampered or truncated key is never trusted.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use aptcache_schema::{KeyDigest, PackageSet};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use thiserror::Error;

/// Permissions applied to both key files.
pub const KEY_FILE_MODE: u32 = 0o600;

/// Errors from building, writing or reading a cache key.
#[derive(Error, Debug)]
pub enum KeyError {
    /// Required key fields were empty. Lists every missing field.
    #[error("missing required cache key field(s): {}", .0.join(", "))]
    MissingFields(Vec<&'static str>),

    /// A key file could not be read or written.
    #[error("cache key I/O error at {path}: {source}")]
    Io {
        /// File being accessed.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The stored digest does not match the stored plaintext.
    #[error("{0}")]
    Corruption(String),
}

/// Deterministic identifier for one cached installation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", try_from = "RawCacheKey")]
pub struct CacheKey {
    packages: PackageSet,
    version: String,
    global_version: String,
    os_arch: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawCacheKey {
    packages: PackageSet,
    #[serde(default)]
    version: String,
    #[serde(default)]
    global_version: String,
    #[serde(default)]
    os_arch: String,
}

impl TryFrom<RawCacheKey> for CacheKey {
    type Error = KeyError;

    fn try_from(raw: RawCacheKey) -> Result<Self, Self::Error> {
        Self::new(raw.packages, raw.version, raw.global_version, raw.os_arch)
    }
}

impl CacheKey {
    /// Build a key.
    ///
    /// `version` may be empty; `global_version` and `os_arch` may not.
    ///
    /// # Errors
    ///
    /// Returns [`KeyError::MissingFields`] naming every empty required field.
    pub fn new(
        packages: PackageSet,
        version: impl Into<String>,
        global_version: impl Into<String>,
        os_arch: impl Into<String>,
    ) -> Result<Self, KeyError> {
        let key = Self {
            packages,
            version: version.into(),
            global_version: global_version.into(),
            os_arch: os_arch.into(),
        };

        let mut missing = Vec::new();
        if key.global_version.is_empty() {
            missing.push("globalVersion");
        }
        if key.os_arch.is_empty() {
            missing.push("osArch");
        }
        if !missing.is_empty() {
            return Err(KeyError::MissingFields(missing));
        }

        Ok(key)
    }

    /// The canonical package set.
    pub fn packages(&self) -> &PackageSet {
        &self.packages
    }

    /// User-supplied cache version.
    pub fn version(&self) -> &str {
        &self.version
    }

    /// Global cache version.
    pub fn global_version(&self) -> &str {
        &self.global_version
    }

    /// Debian architecture name.
    pub fn os_arch(&self) -> &str {
        &self.os_arch
    }

    /// Single-line plaintext form; the input to [`Self::hash`].
    pub fn plain_text(&self) -> String {
        format!(
            "Packages: '{}', Version: '{}', GlobalVersion: '{}', OsArch: '{}'",
            self.packages.serialize(),
            self.version,
            self.global_version,
            self.os_arch
        )
    }

    /// SHA-256 digest of [`Self::plain_text`].
    pub fn hash(&self) -> KeyDigest {
        digest(self.plain_text().as_bytes())
    }

    /// Write the plaintext then the digest, both with [`KEY_FILE_MODE`].
    ///
    /// If the digest cannot be written the plaintext file is removed again,
    /// so a half-written pair is never left behind.
    ///
    /// # Errors
    ///
    /// Returns [`KeyError::Io`] naming the file that failed.
    pub fn write(&self, plaintext_path: &Path, hash_path: &Path) -> Result<(), KeyError> {
        write_restricted(plaintext_path, self.plain_text().as_bytes())?;

        if let Err(err) = write_restricted(hash_path, self.hash().as_bytes()) {
            if let Err(cleanup) = fs::remove_file(plaintext_path) {
                tracing::warn!(
                    "Failed to remove {} after failed digest write: {cleanup}",
                    plaintext_path.display()
                );
            }
            return Err(err);
        }

        tracing::debug!(
            "Wrote cache key {} to {} and {}",
            self.hash(),
            plaintext_path.display(),
            hash_path.display()
        );
        Ok(())
    }

    /// Read a key pair back and check the digest against the plaintext.
    ///
    /// # Errors
    ///
    /// - [`KeyError::Io`] if either file cannot be read.
    /// - [`KeyError::Corruption`] if the digest file has the wrong length,
    ///   does not match the plaintext, or the plaintext is not UTF-8.
    pub fn read_and_validate(
        plaintext_path: &Path,
        hash_path: &Path,
    ) -> Result<(String, KeyDigest), KeyError> {
        let plaintext = read(plaintext_path)?;
        let stored = read(hash_path)?;

        let stored = KeyDigest::from_slice(&stored).map_err(|err| {
            KeyError::Corruption(format!("{}: {err}", hash_path.display()))
        })?;

        let actual = digest(&plaintext);
        if actual != stored {
            return Err(KeyError::Corruption(format!(
                "Cache key digest mismatch: {} holds {stored} but {} hashes to {actual}",
                hash_path.display(),
                plaintext_path.display()
            )));
        }

        let plaintext = String::from_utf8(plaintext).map_err(|err| {
            KeyError::Corruption(format!("{}: {err}", plaintext_path.display()))
        })?;

        Ok((plaintext, stored))
    }
}

impl std::fmt::Display for CacheKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.plain_text())
    }
}

fn digest(bytes: &[u8]) -> KeyDigest {
    let bytes: [u8; KeyDigest::LEN] = Sha256::digest(bytes).into();
    KeyDigest::new(bytes)
}

fn read(path: &Path) -> Result<Vec<u8>, KeyError> {
    fs::read(path).map_err(|source| KeyError::Io {
        path: path.to_path_buf(),
        source,
    })
}

fn write_restricted(path: &Path, contents: &[u8]) -> Result<(), KeyError> {
    let io_err = |source| KeyError::Io {
        path: path.to_path_buf(),
        source,
    };

    let mut options = fs::OpenOptions::new();
    options.write(true).create(true).truncate(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(KEY_FILE_MODE);
    }

    let mut file = options.open(path).map_err(io_err)?;

    // mode() only applies on creation; tighten a pre-existing file too.
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        file.set_permissions(fs::Permissions::from_mode(KEY_FILE_MODE))
            .map_err(io_err)?;
    }

    file.write_all(contents).map_err(io_err)?;
    Ok(())
}

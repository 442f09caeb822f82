//! Host architecture naming for the `osArch` cache key dimension.
//!
//! Cached installs are only valid on runners of the same architecture, so
//! the key embeds the Debian name of the running host. The names match what
//! `dpkg --print-architecture` reports, which keeps keys written by shell
//! glue and by this crate interchangeable.
//!
//! # Example
//!
//! ```
//! use aptcache_schema::OsArch;
//!
//! let current = OsArch::current();
//! println!("Running on: {}", current);
//! ```

/// Debian architecture name of a runner.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct OsArch(String);

impl OsArch {
    /// Architecture of the running host.
    pub fn current() -> Self {
        Self::from_rust_arch(std::env::consts::ARCH)
    }

    /// Map a Rust target arch (`std::env::consts::ARCH`) to its Debian name.
    ///
    /// Unknown values pass through unchanged.
    pub fn from_rust_arch(arch: &str) -> Self {
        let name = match arch {
            "x86_64" => "amd64",
            "aarch64" => "arm64",
            "x86" => "i386",
            "arm" => "armhf",
            "powerpc64" => "ppc64el",
            "s390x" => "s390x",
            "riscv64" => "riscv64",
            other => other,
        };
        Self(name.to_string())
    }

    /// The Debian architecture name.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for OsArch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<OsArch> for String {
    fn from(arch: OsArch) -> Self {
        arch.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_common_targets() {
        assert_eq!(OsArch::from_rust_arch("x86_64").as_str(), "amd64");
        assert_eq!(OsArch::from_rust_arch("aarch64").as_str(), "arm64");
        assert_eq!(OsArch::from_rust_arch("x86").as_str(), "i386");
    }

    #[test]
    fn unknown_arch_passes_through() {
        assert_eq!(OsArch::from_rust_arch("mips64").as_str(), "mips64");
    }

    #[test]
    fn current_is_never_empty() {
        assert!(!OsArch::current().as_str().is_empty());
    }
}

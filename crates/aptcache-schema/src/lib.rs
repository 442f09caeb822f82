//! Shared types for aptcache.
//!
//! Everything here is plain data: package records, the canonical package
//! set, the cache key digest and the host architecture name. Behaviour that
//! touches the filesystem or external tools lives in `aptcache-core`.

pub mod arch;
pub mod hash;
pub mod package;
pub mod package_set;

// Re-exports
pub use arch::OsArch;
pub use hash::{DigestLengthError, KeyDigest};
pub use package::{Package, PackageSpecError};
pub use package_set::{InvalidPackageArg, PackageSet};

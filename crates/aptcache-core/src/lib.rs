//! Core behaviour for aptcache: resolving package names against the APT
//! catalog, deriving cache keys, recording manifests and building archives.

pub mod archive;
pub mod exec;
pub mod key;
pub mod manifest;
pub mod paths;
pub mod resolver;

pub mod reporter;

pub use archive::{ArchiveError, Archiver};
pub use exec::{BinExecutor, ExecError, Execution, Executor, ReplayExecutor};
pub use key::{CacheKey, KeyError};
pub use manifest::{Manifest, ManifestEntry, ManifestError};
pub use paths::*;
pub use reporter::{NullReporter, Reporter, TracingReporter};
pub use resolver::{CatalogResolver, ResolveError};

//! apt-query - resolve APT package sets and write cache keys
#![allow(missing_docs)]
#![allow(clippy::missing_errors_doc)]
//!
//! Thin driver over `aptcache-core`. Every subcommand is a function in
//! [`cmd`] taking plain arguments and returning `anyhow::Result`.

pub mod cmd;

use std::path::PathBuf;

use anyhow::{Context, Result};
use aptcache_core::{BinExecutor, Executor, ReplayExecutor};
use clap::{Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(name = "apt-query")]
#[command(author, version, about = "Resolve APT package sets and write cache keys")]
pub struct Cli {
    /// Write a replayable debug log to <binary>.log
    #[arg(long, global = true)]
    pub debug: bool,

    /// Answer catalog queries from a debug log instead of running apt-cache
    #[arg(long, global = true, env = "APTCACHE_REPLAY_FILE")]
    pub replay_file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Resolve package names against the catalog and print name=version pairs
    NormalizedList {
        /// Package names, optionally with =version
        #[arg(required = true)]
        names: Vec<String>,
    },
    /// Write cache key files for a package set
    CreateKey {
        /// Cache directory (defaults to $APTCACHE_DIR or the user cache dir)
        #[arg(long, env = "APTCACHE_DIR")]
        cache_dir: Option<PathBuf>,
        /// User cache version
        #[arg(long, default_value = "")]
        version: String,
        /// Global cache version
        #[arg(long)]
        global_version: String,
        /// Debian architecture (defaults to the host's)
        #[arg(long)]
        os_arch: Option<String>,
        /// Package specs, name or name=version
        #[arg(required = true)]
        packages: Vec<String>,
    },
}

/// Executor for catalog queries: the replay log when given, else real processes.
pub fn executor(replay_file: Option<&std::path::Path>) -> Result<Box<dyn Executor>> {
    match replay_file {
        Some(path) => {
            let replay = ReplayExecutor::from_log(path)
                .with_context(|| format!("Failed to load replay file {}", path.display()))?;
            tracing::debug!("Replaying {} recorded command(s)", replay.commands().len());
            Ok(Box::new(replay))
        }
        None => Ok(Box::new(BinExecutor)),
    }
}

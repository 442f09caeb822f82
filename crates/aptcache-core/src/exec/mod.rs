//! External tool invocation.
//!
//! Everything that shells out goes through [`Executor`]. [`BinExecutor`]
//! runs real processes; [`ReplayExecutor`] answers from recorded
//! executions keyed by exact command line, which is how the catalog
//! resolver is tested without APT on the machine.
//!
//! `BinExecutor` logs each execution at debug level between
//! [`EXECUTION_START`] and [`EXECUTION_END`] markers. A debug log captured
//! on a real runner can therefore be fed straight back into
//! [`ReplayExecutor::from_log`].

mod bin;
mod replay;

pub use bin::BinExecutor;
pub use replay::ReplayExecutor;

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;

/// Marker line that opens a recorded execution in a debug log.
pub const EXECUTION_START: &str = "EXECUTION-OBJ-START";

/// Marker line that closes a recorded execution in a debug log.
pub const EXECUTION_END: &str = "EXECUTION-OBJ-END";

/// Errors from running or replaying a command.
#[derive(Error, Debug)]
pub enum ExecError {
    /// The process could not be started at all.
    #[error("failed to spawn {cmd}: {source}")]
    Spawn {
        /// Command line that was attempted.
        cmd: String,
        /// Underlying OS error.
        #[source]
        source: std::io::Error,
    },

    /// The replay executor has no recording for this command line.
    #[error("Unable to replay command '{cmd}'.\nNo command found in the debug log; available commands:{available}")]
    ReplayMissing {
        /// Command line that was requested.
        cmd: String,
        /// Newline-prefixed list of recorded command lines, or ` NONE`.
        available: String,
    },

    /// The replay log could not be read.
    #[error("failed to read replay log {path}: {source}")]
    ReplayLog {
        /// Path of the log.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// A recorded execution block is not valid JSON.
    #[error("Error encountered deserializing Execution object.\n{0}")]
    ReplayRecord(#[from] serde_json::Error),
}

/// Capability to run an external tool.
pub trait Executor {
    /// Run `name` with `args` to completion and capture the result.
    ///
    /// A non-zero exit is not an error at this layer; inspect
    /// [`Execution::failure`].
    ///
    /// # Errors
    ///
    /// Returns [`ExecError`] if the command cannot be run (or replayed) at all.
    fn exec(&self, name: &str, args: &[&str]) -> Result<Execution, ExecError>;
}

impl<T: Executor + ?Sized> Executor for &T {
    fn exec(&self, name: &str, args: &[&str]) -> Result<Execution, ExecError> {
        (**self).exec(name, args)
    }
}

/// Result of one external tool invocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Execution {
    /// Exact command line, `name` followed by space-joined args.
    pub cmd: String,
    /// Standard output followed by standard error.
    pub combined_output: String,
    /// Process exit code; `-1` when terminated by a signal.
    pub exit_code: i32,
}

impl Execution {
    /// Build the command-line key used to record and replay executions.
    pub fn command_line(name: &str, args: &[&str]) -> String {
        if args.is_empty() {
            name.to_string()
        } else {
            format!("{name} {}", args.join(" "))
        }
    }

    /// Whether the tool exited with status zero.
    pub fn succeeded(&self) -> bool {
        self.exit_code == 0
    }

    /// Human-readable failure report, or `None` on a zero exit.
    pub fn failure(&self) -> Option<String> {
        if self.succeeded() {
            return None;
        }
        Some(format!(
            "Error encountered running {}\nExited with status code {}; see combined std[out,err] below:\n{}",
            self.cmd,
            self.exit_code,
            self.combined_output.trim_end()
        ))
    }

    /// Render this execution as a replayable debug log block.
    pub fn to_log_block(&self) -> String {
        let json = serde_json::to_string_pretty(self).unwrap_or_else(|_| "{}".to_string());
        format!("{EXECUTION_START}\n{json}\n{EXECUTION_END}")
    }
}

use std::collections::HashMap;
use std::path::Path;

use super::{EXECUTION_END, EXECUTION_START, ExecError, Execution, Executor};

/// Answers commands from recorded executions.
///
/// Lookup is a plain map access by exact command line, so replay is
/// deterministic and never touches the system.
#[derive(Debug, Clone, Default)]
pub struct ReplayExecutor {
    executions: HashMap<String, Execution>,
}

impl ReplayExecutor {
    /// Create an executor from explicit recordings.
    ///
    /// A later recording for the same command line replaces an earlier one.
    pub fn new(executions: impl IntoIterator<Item = Execution>) -> Self {
        let executions = executions
            .into_iter()
            .map(|execution| (execution.cmd.clone(), execution))
            .collect();
        Self { executions }
    }

    /// Add or replace a recording.
    pub fn with_execution(mut self, execution: Execution) -> Self {
        self.executions.insert(execution.cmd.clone(), execution);
        self
    }

    /// Load recordings from a debug log written with [`BinExecutor`] logging
    /// enabled.
    ///
    /// Each recording spans the lines strictly between a line containing
    /// [`EXECUTION_START`] and the next line containing [`EXECUTION_END`];
    /// anything else in the log is ignored.
    ///
    /// # Errors
    ///
    /// Returns [`ExecError::ReplayLog`] if the log cannot be read and
    /// [`ExecError::ReplayRecord`] if a recording is not valid JSON.
    ///
    /// [`BinExecutor`]: super::BinExecutor
    pub fn from_log(path: &Path) -> Result<Self, ExecError> {
        let content = std::fs::read_to_string(path).map_err(|source| ExecError::ReplayLog {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse_log(&content)
    }

    /// Parse recordings out of debug log text. See [`Self::from_log`].
    ///
    /// # Errors
    ///
    /// Returns [`ExecError::ReplayRecord`] if a recording is not valid JSON.
    pub fn parse_log(content: &str) -> Result<Self, ExecError> {
        let mut replay = Self::default();
        let mut lines = content.lines();

        while let Some(line) = lines.next() {
            if !line.contains(EXECUTION_START) {
                continue;
            }
            let mut payload = String::new();
            for line in lines.by_ref() {
                if line.contains(EXECUTION_END) {
                    let execution: Execution = serde_json::from_str(&payload)?;
                    replay = replay.with_execution(execution);
                    break;
                }
                payload.push_str(line);
                payload.push('\n');
            }
        }

        Ok(replay)
    }

    /// Recorded command lines, sorted.
    pub fn commands(&self) -> Vec<&str> {
        let mut cmds: Vec<&str> = self.executions.keys().map(String::as_str).collect();
        cmds.sort_unstable();
        cmds
    }
}

impl Executor for ReplayExecutor {
    fn exec(&self, name: &str, args: &[&str]) -> Result<Execution, ExecError> {
        let cmd = Execution::command_line(name, args);
        if let Some(execution) = self.executions.get(&cmd) {
            return Ok(execution.clone());
        }

        let cmds = self.commands();
        let available = if cmds.is_empty() {
            " NONE".to_string()
        } else {
            format!("\n{}", cmds.join("\n"))
        };
        Err(ExecError::ReplayMissing { cmd, available })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn recorded(cmd: &str, out: &str, exit_code: i32) -> Execution {
        Execution {
            cmd: cmd.to_string(),
            combined_output: out.to_string(),
            exit_code,
        }
    }

    #[test]
    fn replays_by_exact_command_line() {
        let replay = ReplayExecutor::new([recorded("apt-cache showpkg libvips", "x\n", 0)]);
        let execution = replay.exec("apt-cache", &["showpkg", "libvips"]).unwrap();
        assert_eq!(execution.combined_output, "x\n");

        assert!(replay.exec("apt-cache", &["showpkg", "libvips42"]).is_err());
    }

    #[test]
    fn missing_command_lists_available() {
        let replay = ReplayExecutor::default()
            .with_execution(recorded("b", "", 0))
            .with_execution(recorded("a", "", 0));
        let err = replay.exec("c", &[]).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Unable to replay command 'c'.\nNo command found in the debug log; available commands:\na\nb"
        );

        let err = ReplayExecutor::default().exec("c", &[]).unwrap_err();
        assert!(err.to_string().ends_with("available commands: NONE"));
    }

    #[test]
    fn parses_blocks_out_of_a_log() {
        let first = recorded("apt-cache show xdot", "Package: xdot\nVersion: 1.2-3\n", 0);
        let second = recorded("apt-cache showpkg python", "Reverse Provides: \n", 0);
        let log = format!(
            "2026-01-01T00:00:00Z  INFO starting\n2026-01-01T00:00:01Z DEBUG aptcache_core::exec: {}\nnoise\n{}\n",
            first.to_log_block(),
            second.to_log_block()
        );

        let replay = ReplayExecutor::parse_log(&log).unwrap();
        assert_eq!(
            replay.commands(),
            vec!["apt-cache show xdot", "apt-cache showpkg python"]
        );
        assert_eq!(replay.exec("apt-cache", &["show", "xdot"]).unwrap(), first);
    }

    #[test]
    fn malformed_block_is_an_error() {
        let log = format!("{EXECUTION_START}\n{{not json\n{EXECUTION_END}\n");
        assert!(matches!(
            ReplayExecutor::parse_log(&log),
            Err(ExecError::ReplayRecord(_))
        ));
    }

    #[test]
    fn from_log_reads_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("apt-query.log");
        std::fs::write(&path, recorded("true", "", 0).to_log_block()).unwrap();

        let replay = ReplayExecutor::from_log(&path).unwrap();
        assert!(replay.exec("true", &[]).unwrap().succeeded());

        assert!(matches!(
            ReplayExecutor::from_log(&dir.path().join("missing.log")),
            Err(ExecError::ReplayLog { .. })
        ));
    }
}

use std::process::Command;

use super::{ExecError, Execution, Executor};

/// Runs commands as real child processes.
///
/// Blocks until the child exits. There is no timeout: a hung tool hangs
/// the caller.
#[derive(Debug, Clone, Copy, Default)]
pub struct BinExecutor;

impl Executor for BinExecutor {
    fn exec(&self, name: &str, args: &[&str]) -> Result<Execution, ExecError> {
        let cmd = Execution::command_line(name, args);
        let output = Command::new(name)
            .args(args)
            .output()
            .map_err(|source| ExecError::Spawn {
                cmd: cmd.clone(),
                source,
            })?;

        let mut combined_output = String::from_utf8_lossy(&output.stdout).into_owned();
        combined_output.push_str(&String::from_utf8_lossy(&output.stderr));

        let execution = Execution {
            cmd,
            combined_output,
            exit_code: output.status.code().unwrap_or(-1),
        };

        tracing::debug!("{}", execution.to_log_block());
        Ok(execution)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn captures_stdout_and_exit_code() {
        let execution = BinExecutor.exec("sh", &["-c", "echo hello"]).unwrap();
        assert_eq!(execution.cmd, "sh -c echo hello");
        assert_eq!(execution.combined_output, "hello\n");
        assert!(execution.succeeded());
    }

    #[test]
    fn combines_stderr_after_stdout() {
        let execution = BinExecutor
            .exec("sh", &["-c", "echo out; echo err >&2; exit 3"])
            .unwrap();
        assert_eq!(execution.combined_output, "out\nerr\n");
        assert_eq!(execution.exit_code, 3);
        assert!(execution.failure().is_some());
    }

    #[test]
    fn missing_binary_is_a_spawn_error() {
        let err = BinExecutor
            .exec("definitely-not-a-real-binary-aptcache", &[])
            .unwrap_err();
        assert!(matches!(err, ExecError::Spawn { .. }));
    }
}

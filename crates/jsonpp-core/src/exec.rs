use std::process::Command;

use tracing::debug;

use crate::error::{ResolveError, ResolveResult};

/// Raw result of one process run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    pub stdout: Vec<u8>,
    pub stderr: Vec<u8>,
    /// `None` when the process was terminated by a signal.
    pub status: Option<i32>,
}

impl CommandOutput {
    pub fn success(&self) -> bool {
        self.status == Some(0)
    }
}

/// Runs an argument vector. Implementations must never go through a shell.
pub trait CommandExecutor {
    /// `argv[0]` is the program. An error here means the process could not
    /// be started; exit status is judged by the caller.
    fn run(&self, argv: &[String]) -> ResolveResult<CommandOutput>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessExecutor;

impl CommandExecutor for ProcessExecutor {
    fn run(&self, argv: &[String]) -> ResolveResult<CommandOutput> {
        let (program, args) = argv
            .split_first()
            .ok_or_else(|| ResolveError::malformed("$exec", "empty argument vector"))?;
        debug!(program = %program, args = ?args, "spawning command");
        let output = Command::new(program)
            .args(args)
            .output()
            .map_err(|e| ResolveError::command(program.as_str(), format!("failed to start: {e}")))?;
        Ok(CommandOutput {
            stdout: output.stdout,
            stderr: output.stderr,
            status: output.status.code(),
        })
    }
}

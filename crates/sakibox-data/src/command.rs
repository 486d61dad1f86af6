//! Running the external listing tools.

use std::process::{Command, ExitStatus};

use sakibox_core::error::{Result, ToolboxError};

/// Captured result of one external command.
#[derive(Debug)]
pub(crate) struct CommandOutput {
    pub command: String,
    pub status: ExitStatus,
    pub stdout: String,
}

impl CommandOutput {
    /// Stdout of a successful run; a non-zero exit becomes
    /// [`ToolboxError::CommandFailed`].
    pub fn into_stdout(self) -> Result<String> {
        if !self.status.success() {
            return Err(ToolboxError::CommandFailed {
                command: self.command,
                status: self.status.to_string(),
            });
        }
        Ok(self.stdout)
    }
}

/// Run `program` with `args` and capture its stdout.
pub(crate) fn run(program: &str, args: &[&str]) -> Result<CommandOutput> {
    let command = if args.is_empty() {
        program.to_string()
    } else {
        format!("{program} {}", args.join(" "))
    };
    let output = Command::new(program)
        .args(args)
        .output()
        .map_err(|source| ToolboxError::CommandSpawn {
            command: command.clone(),
            source,
        })?;
    Ok(CommandOutput {
        command,
        status: output.status,
        stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
    })
}

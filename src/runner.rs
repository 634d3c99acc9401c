//! Subprocess execution for external build tools.
//!
//! Every external tool (the build engine, `grub-mkrescue`, QEMU) is invoked
//! through these two functions. Commands are built as program + argument
//! vector, never as shell strings. A non-zero exit becomes a
//! [`CommandFailed`] error so the binary can exit with the child's status.

use std::process::{Command, Stdio};

use anyhow::{Context, Result};
use thiserror::Error;

/// An external command exited with a non-zero status.
///
/// Carries the status so the top-level boundary can propagate it as the
/// process exit code. The failing tool's own stderr is the diagnostic;
/// no extra wrapping is added along the way.
#[derive(Debug, Error)]
#[error("`{command}` exited with status {status}")]
pub struct CommandFailed {
    pub command: String,
    pub status: i32,
}

/// Run a command with inherited stdio, blocking until it exits.
///
/// The child's output streams straight to the caller's terminal.
pub fn run(cmd: &mut Command) -> Result<()> {
    let rendered = render(cmd);
    let status = cmd
        .status()
        .with_context(|| format!("spawning `{rendered}`"))?;

    if status.success() {
        return Ok(());
    }
    Err(CommandFailed {
        command: rendered,
        status: status.code().unwrap_or(-1),
    }
    .into())
}

/// Run a command, capturing stdout and returning it trimmed of trailing
/// whitespace. Stderr is inherited so diagnostics stay visible.
pub fn run_captured(cmd: &mut Command) -> Result<String> {
    let rendered = render(cmd);
    let output = cmd
        .stderr(Stdio::inherit())
        .output()
        .with_context(|| format!("spawning `{rendered}`"))?;

    if !output.status.success() {
        return Err(CommandFailed {
            command: rendered,
            status: output.status.code().unwrap_or(-1),
        }
        .into());
    }

    let stdout = String::from_utf8(output.stdout)
        .with_context(|| format!("decoding output of `{rendered}`"))?;
    Ok(stdout.trim_end().to_string())
}

/// Human-readable form of a command for error messages.
fn render(cmd: &Command) -> String {
    let mut parts = vec![cmd.get_program().to_string_lossy().into_owned()];
    parts.extend(cmd.get_args().map(|a| a.to_string_lossy().into_owned()));
    parts.join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_run_succeeds_on_zero_exit() {
        run(Command::new("true").arg("ignored")).unwrap();
    }

    #[test]
    fn test_run_reports_child_exit_status() {
        let err = run(&mut Command::new("false")).unwrap_err();
        let failed = err.downcast_ref::<CommandFailed>().unwrap();
        assert_eq!(failed.status, 1);
        assert_eq!(failed.command, "false");
    }

    #[test]
    fn test_run_captured_trims_trailing_whitespace() {
        let out = run_captured(Command::new("echo").arg("sysroot/")).unwrap();
        assert_eq!(out, "sysroot/");
    }

    #[test]
    fn test_run_captured_fails_on_nonzero_exit() {
        let err = run_captured(&mut Command::new("false")).unwrap_err();
        assert!(err.downcast_ref::<CommandFailed>().is_some());
    }

    #[test]
    fn test_run_errors_when_program_missing() {
        let err = run(&mut Command::new("definitely_not_a_real_command_12345")).unwrap_err();
        // Spawn failure, not a child exit: no CommandFailed in the chain.
        assert!(err.downcast_ref::<CommandFailed>().is_none());
    }
}

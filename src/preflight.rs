//! Host-tool checks before a pipeline run.
//!
//! Validates that the external tools a task needs are actually present.
//! This turns a mid-pipeline "command not found" into an upfront error
//! naming the package to install.

use anyhow::{bail, Result};

/// Check if a command exists on the host system.
///
/// Accepts bare names (looked up in PATH) and explicit paths.
pub fn command_exists(cmd: &str) -> bool {
    which::which(cmd).is_ok()
}

/// Check that specific tools are available.
///
/// Each tuple is (command, package that provides it). Fails with the full
/// list of missing tools rather than the first one.
pub fn check_required_tools(tools: &[(&str, &str)]) -> Result<()> {
    let mut missing = Vec::new();

    for (tool, package) in tools {
        if !command_exists(tool) {
            missing.push((*tool, *package));
        }
    }

    if !missing.is_empty() {
        let msg = missing
            .iter()
            .map(|(t, p)| format!("  {} (install: {})", t, p))
            .collect::<Vec<_>>()
            .join("\n");
        bail!("Missing required host tools:\n{}", msg);
    }

    Ok(())
}

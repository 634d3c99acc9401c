//! Pipeline orchestration: maps each CLI command to a fixed stage chain.
//!
//! Every command is a linear chain with no branching and no loops. Stages
//! execute in order; the first failure aborts the run and no later stage
//! executes. Nothing external runs for a command that fails to parse.

use anyhow::{bail, Result};

use crate::config::BuildConfig;
use crate::preflight;
use crate::report::Reporter;
use crate::stages;

pub const USAGE: &str = "\
Usage: myos-build [build|run|clean|check|install]

Commands:
  build    install headers, compile, and package the bootable ISO (default)
  run      build, then boot the ISO in QEMU
  clean    remove the image, the staging tree, and the install root
  check    run the build engine's test target
  install  install kernel and libc headers into the sysroot";

/// One logical build phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Install,
    Compile,
    Package,
    Clean,
    Launch,
    Check,
}

impl Stage {
    pub fn run(self, cfg: &BuildConfig, reporter: &Reporter) -> Result<()> {
        match self {
            Stage::Install => stages::install(cfg, reporter),
            Stage::Compile => stages::compile(cfg, reporter),
            Stage::Package => stages::package(cfg, reporter),
            Stage::Clean => stages::clean(cfg, reporter),
            Stage::Launch => stages::launch(cfg, reporter),
            Stage::Check => stages::check(cfg, reporter),
        }
    }
}

/// A top-level command, parsed from the CLI word.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Task {
    Build,
    Run,
    Clean,
    Check,
    Install,
}

impl Task {
    /// Parse the optional positional argument. No argument means `build`;
    /// matching is case-insensitive; anything unrecognized is rejected
    /// before any stage can run.
    pub fn parse(arg: Option<&str>) -> Result<Self> {
        let Some(word) = arg else {
            return Ok(Task::Build);
        };
        match word.to_ascii_lowercase().as_str() {
            "build" => Ok(Task::Build),
            "run" => Ok(Task::Run),
            "clean" => Ok(Task::Clean),
            "check" => Ok(Task::Check),
            "install" => Ok(Task::Install),
            other => bail!("unrecognized command '{other}'\n\n{USAGE}"),
        }
    }

    /// The fixed stage chain for this command.
    pub fn stages(self) -> &'static [Stage] {
        match self {
            Task::Build => &[Stage::Install, Stage::Compile, Stage::Package],
            Task::Run => &[Stage::Install, Stage::Compile, Stage::Package, Stage::Launch],
            Task::Clean => &[Stage::Clean],
            Task::Check => &[Stage::Check],
            Task::Install => &[Stage::Install],
        }
    }

    /// External tools this command needs, as (command, package) pairs.
    pub fn required_tools<'a>(self, cfg: &'a BuildConfig) -> Vec<(&'a str, &'a str)> {
        let mut tools = vec![(cfg.make.as_str(), "make")];
        if self.stages().contains(&Stage::Package) {
            tools.push((cfg.grub_mkrescue.as_str(), "grub2-tools / grub-pc-bin"));
        }
        if self.stages().contains(&Stage::Launch) {
            tools.push((cfg.qemu.as_str(), "qemu-system-x86"));
        }
        tools
    }
}

/// Run one command's stage chain to completion or first failure.
pub fn run_task(cfg: &BuildConfig, reporter: &Reporter, task: Task) -> Result<()> {
    preflight::check_required_tools(&task.required_tools(cfg))?;
    for stage in task.stages() {
        stage.run(cfg, reporter)?;
    }
    Ok(())
}

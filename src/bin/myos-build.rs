use std::env;
use std::process::ExitCode;

use anyhow::{bail, Context, Result};
use myos_build::config::BuildConfig;
use myos_build::pipeline::{self, Task, USAGE};
use myos_build::report::Reporter;
use myos_build::runner::CommandFailed;

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            // A failing external tool already printed its own diagnostics;
            // propagate its status without rewrapping.
            if let Some(failed) = err.downcast_ref::<CommandFailed>() {
                return ExitCode::from(u8::try_from(failed.status).unwrap_or(1));
            }
            eprintln!("error: {err:#}");
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<()> {
    let args: Vec<String> = env::args().skip(1).collect();
    let task = match args.as_slice() {
        [] => Task::parse(None)?,
        [command] => Task::parse(Some(command))?,
        _ => bail!("expected at most one command\n\n{USAGE}"),
    };

    let root = env::current_dir().context("resolving current directory")?;
    let cfg = BuildConfig::new(root);
    let reporter = Reporter::new();
    pipeline::run_task(&cfg, &reporter, task)
}

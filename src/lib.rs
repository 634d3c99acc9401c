//! Build orchestrator for the myos kernel.
//!
//! Sequences the external toolchain (the `make`-based build engine,
//! `grub-mkrescue`, QEMU) into five composable commands: `build`, `run`,
//! `clean`, `check`, and `install`. The tools themselves are opaque
//! collaborators judged only by exit status; this crate owns the ordering,
//! the failure propagation, and the staging-tree layout.
//!
//! # Architecture
//!
//! ```text
//! myos-build (binary)
//!     parses the command word, maps the exit status once
//!         |
//! pipeline::run_task
//!     preflight, then the command's fixed stage chain, short-circuiting
//!         |
//! stages::{install, compile, package, clean, launch, check}
//!     one logical phase each
//!         |
//! runner::{run, run_captured}
//!     argument-vector subprocess execution
//!         |
//! external tools (make, grub-mkrescue, qemu-system-i386)
//! ```
//!
//! Everything is synchronous and single-threaded; each invocation blocks
//! until the child exits. Two concurrent runs in one working directory
//! race on the staging paths and are not supported.

pub mod config;
pub mod fsutil;
pub mod pipeline;
pub mod preflight;
pub mod report;
pub mod runner;
pub mod stages;

pub use config::BuildConfig;
pub use pipeline::{run_task, Stage, Task};
pub use report::Reporter;

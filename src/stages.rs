//! Stage operations: the logical phases of a pipeline run.
//!
//! Each stage wraps one or more external invocations plus the filesystem
//! work around them. Stages report progress through the injected
//! [`Reporter`] and propagate the first failure to the orchestrator; they
//! never catch or retry.

use std::fs;
use std::process::Command;

use anyhow::{Context, Result};

use crate::config::{self, BuildConfig};
use crate::fsutil;
use crate::report::Reporter;
use crate::runner;

/// Install kernel and libc headers into the engine's configured sysroot.
///
/// The install root is queried from the build engine once per run and both
/// header targets are parameterized with the same resolved value.
pub fn install(cfg: &BuildConfig, reporter: &Reporter) -> Result<()> {
    reporter.info("Installing headers...");
    let install_root = config::resolve_install_root(cfg)?;
    let sysroot_var = format!("SYSROOT={install_root}");
    runner::run(&mut cfg.make_command(&["-C", "kernel", "install", &sysroot_var]))?;
    runner::run(&mut cfg.make_command(&["-C", "libc", "install", &sysroot_var]))?;
    Ok(())
}

/// Build the kernel via the engine's default target.
///
/// The engine's own dependency graph requires installed headers; compile
/// trusts that contract rather than re-checking it.
pub fn compile(cfg: &BuildConfig, reporter: &Reporter) -> Result<()> {
    reporter.info("Building...");
    runner::run(&mut cfg.make_command(&[]))
}

/// Assemble the staging tree and produce the bootable image.
///
/// Layout: `<staging>/boot/<kernel>` and `<staging>/boot/grub/grub.cfg`,
/// then `grub-mkrescue -o <image> <staging>`. A failure leaves the staging
/// tree partially populated; `clean` is the recovery path.
pub fn package(cfg: &BuildConfig, reporter: &Reporter) -> Result<()> {
    reporter.info("Creating ISO image...");

    let grub_dir = cfg.staging_grub_dir();
    fs::create_dir_all(&grub_dir)
        .with_context(|| format!("creating staging directory '{}'", grub_dir.display()))?;

    let kernel_src = cfg.root.join(&cfg.kernel_bin);
    let kernel_dst = cfg.staging_boot_dir().join(&cfg.kernel_bin);
    fs::copy(&kernel_src, &kernel_dst).with_context(|| {
        format!(
            "copying kernel '{}' into staging '{}'",
            kernel_src.display(),
            kernel_dst.display()
        )
    })?;

    let grub_cfg_path = cfg.grub_cfg_path();
    fs::write(&grub_cfg_path, cfg.grub_cfg())
        .with_context(|| format!("writing '{}'", grub_cfg_path.display()))?;

    let mut cmd = Command::new(&cfg.grub_mkrescue);
    cmd.arg("-o")
        .arg(cfg.image_path())
        .arg(cfg.staging_path())
        .current_dir(&cfg.root);
    runner::run(&mut cmd)
}

/// Remove build artifacts, the staging tree, and the install root.
///
/// Idempotent: artifacts that were never produced are skipped, not errors.
pub fn clean(cfg: &BuildConfig, reporter: &Reporter) -> Result<()> {
    reporter.info("Cleaning up files and directories...");
    runner::run(&mut cfg.make_command(&["clean"]))?;
    fsutil::remove_file_if_exists(&cfg.image_path())?;
    fsutil::remove_dir_all_if_exists(&cfg.staging_path())?;

    let install_root = config::resolve_install_root(cfg)?;
    fsutil::remove_dir_all_if_exists(&config::install_root_path(cfg, &install_root))?;
    Ok(())
}

/// Boot the produced image in the emulator, attached to the terminal.
///
/// Blocks until the user exits the emulator.
pub fn launch(cfg: &BuildConfig, reporter: &Reporter) -> Result<()> {
    reporter.info("Running OS...");
    let mut cmd = Command::new(&cfg.qemu);
    cmd.arg("-cdrom").arg(cfg.image_path()).current_dir(&cfg.root);
    runner::run(&mut cmd)
}

/// Run the build engine's test target.
pub fn check(cfg: &BuildConfig, reporter: &Reporter) -> Result<()> {
    reporter.info("Running tests...");
    runner::run(&mut cfg.make_command(&["check"]))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::os::unix::fs::PermissionsExt;
    use std::path::Path;
    use tempfile::TempDir;

    /// Fake build engine: answers the sysroot query, appends every
    /// invocation's arguments to `make.log`, and fails the default target
    /// when a `fail-compile` marker file exists next to it.
    const FAKE_MAKE: &str = r#"#!/bin/sh
here="$(dirname "$0")"
echo "$@" >> "$here/make.log"
for arg in "$@"; do
    if [ "$arg" = "print-sysroot" ]; then
        echo "sysroot/"
        exit 0
    fi
done
if [ "$#" -eq 0 ] && [ -e "$here/fail-compile" ]; then
    exit 7
fi
exit 0
"#;

    fn fake_project() -> (TempDir, BuildConfig) {
        let temp = TempDir::new().unwrap();
        let root = temp.path().to_path_buf();

        let make = root.join("fake-make");
        fs::write(&make, FAKE_MAKE).unwrap();
        fs::set_permissions(&make, fs::Permissions::from_mode(0o755)).unwrap();

        let mut cfg = BuildConfig::new(root);
        cfg.make = make.to_string_lossy().into_owned();
        // Stand-in ISO tool: succeeds without producing an image.
        cfg.grub_mkrescue = "true".to_string();
        (temp, cfg)
    }

    fn make_log(root: &Path) -> Vec<String> {
        fs::read_to_string(root.join("make.log"))
            .unwrap_or_default()
            .lines()
            .map(str::to_string)
            .collect()
    }

    #[test]
    fn test_install_queries_sysroot_once_and_parameterizes_both_targets() {
        let (_temp, cfg) = fake_project();
        let reporter = Reporter::new();

        install(&cfg, &reporter).unwrap();

        let log = make_log(&cfg.root);
        assert_eq!(
            log,
            vec![
                "-s print-sysroot",
                "-C kernel install SYSROOT=sysroot/",
                "-C libc install SYSROOT=sysroot/",
            ]
        );
        let queries = log.iter().filter(|l| l.contains("print-sysroot")).count();
        assert_eq!(queries, 1, "install root must be queried exactly once");
    }

    #[test]
    fn test_package_assembles_staging_tree() {
        let (_temp, cfg) = fake_project();
        fs::write(cfg.root.join("myos.bin"), b"\x7fELF").unwrap();

        package(&cfg, &Reporter::new()).unwrap();

        assert!(cfg.staging_boot_dir().join("myos.bin").is_file());
        let written = fs::read_to_string(cfg.grub_cfg_path()).unwrap();
        assert_eq!(written, cfg.grub_cfg());
        assert!(written.contains("multiboot /boot/myos.bin"));
    }

    #[test]
    fn test_package_overwrites_stale_staging_state() {
        let (_temp, cfg) = fake_project();
        fs::write(cfg.root.join("myos.bin"), b"\x7fELF").unwrap();

        // Leftovers from an earlier, aborted run.
        fs::create_dir_all(cfg.staging_grub_dir()).unwrap();
        fs::write(cfg.grub_cfg_path(), "menuentry \"stale\" {}\n").unwrap();

        package(&cfg, &Reporter::new()).unwrap();

        let written = fs::read_to_string(cfg.grub_cfg_path()).unwrap();
        assert_eq!(written, cfg.grub_cfg());
    }

    #[test]
    fn test_package_fails_without_compiled_kernel() {
        let (_temp, cfg) = fake_project();
        let err = package(&cfg, &Reporter::new()).unwrap_err();
        assert!(err.to_string().contains("copying kernel"));
    }

    #[test]
    fn test_clean_twice_leaves_identical_end_state() {
        let (_temp, cfg) = fake_project();
        let reporter = Reporter::new();

        fs::write(cfg.image_path(), b"image").unwrap();
        fs::create_dir_all(cfg.staging_grub_dir()).unwrap();
        fs::create_dir_all(cfg.root.join("sysroot/usr/include")).unwrap();

        clean(&cfg, &reporter).unwrap();
        assert!(!cfg.image_path().exists());
        assert!(!cfg.staging_path().exists());
        assert!(!cfg.root.join("sysroot").exists());

        // Nothing left to remove; the second run must still succeed.
        clean(&cfg, &reporter).unwrap();
        assert!(!cfg.image_path().exists());
        assert!(!cfg.staging_path().exists());
        assert!(!cfg.root.join("sysroot").exists());
    }

    #[test]
    fn test_compile_failure_carries_engine_exit_status() {
        let (_temp, cfg) = fake_project();
        fs::write(cfg.root.join("fail-compile"), b"").unwrap();

        let err = compile(&cfg, &Reporter::new()).unwrap_err();
        let failed = err.downcast_ref::<runner::CommandFailed>().unwrap();
        assert_eq!(failed.status, 7);
    }
}

//! Fixed build configuration shared by every stage.
//!
//! All names and paths are resolved once when the config is constructed and
//! never change during a run. The one derived value, the install root, is
//! deliberately not stored here: it is queried from the build engine per run
//! (see [`resolve_install_root`]) so the orchestrator and the engine never
//! disagree about where headers land.

use std::path::{Path, PathBuf};
use std::process::Command;

use anyhow::{bail, Result};

use crate::runner;

/// Immutable settings for one pipeline run.
#[derive(Debug, Clone)]
pub struct BuildConfig {
    /// Project root; every command runs here and every path is under it.
    pub root: PathBuf,
    /// Compiled kernel binary produced by the build engine.
    pub kernel_bin: String,
    /// Final bootable image name.
    pub image_name: String,
    /// Staging directory assembled by the package stage.
    pub staging_dir: String,
    /// Title shown in the GRUB boot menu.
    pub os_name: String,
    /// Build engine program.
    pub make: String,
    /// ISO packaging tool.
    pub grub_mkrescue: String,
    /// Emulator used by the launch stage.
    pub qemu: String,
}

impl BuildConfig {
    pub fn new(root: PathBuf) -> Self {
        Self {
            root,
            kernel_bin: "myos.bin".to_string(),
            image_name: "myos.iso".to_string(),
            staging_dir: "isodir".to_string(),
            os_name: "myos".to_string(),
            make: "make".to_string(),
            grub_mkrescue: "grub-mkrescue".to_string(),
            qemu: "qemu-system-i386".to_string(),
        }
    }

    pub fn image_path(&self) -> PathBuf {
        self.root.join(&self.image_name)
    }

    pub fn staging_path(&self) -> PathBuf {
        self.root.join(&self.staging_dir)
    }

    pub fn staging_boot_dir(&self) -> PathBuf {
        self.staging_path().join("boot")
    }

    pub fn staging_grub_dir(&self) -> PathBuf {
        self.staging_boot_dir().join("grub")
    }

    pub fn grub_cfg_path(&self) -> PathBuf {
        self.staging_grub_dir().join("grub.cfg")
    }

    /// GRUB menu entry referencing the kernel binary under `/boot`.
    pub fn grub_cfg(&self) -> String {
        format!(
            "menuentry \"{}\" {{\n    multiboot /boot/{}\n    boot\n}}\n",
            self.os_name, self.kernel_bin
        )
    }

    /// A build-engine command, rooted at the project directory.
    pub fn make_command(&self, args: &[&str]) -> Command {
        let mut cmd = Command::new(&self.make);
        cmd.args(args).current_dir(&self.root);
        cmd
    }
}

/// Ask the build engine where it installs headers.
///
/// Runs the engine's query target (`make -s print-sysroot`) with captured
/// output. The returned path may be relative; callers resolve it against
/// the config root.
pub fn resolve_install_root(cfg: &BuildConfig) -> Result<String> {
    let sysroot = runner::run_captured(&mut cfg.make_command(&["-s", "print-sysroot"]))?;
    if sysroot.is_empty() {
        bail!("build engine printed an empty install root for `{} -s print-sysroot`", cfg.make);
    }
    Ok(sysroot)
}

/// Resolve a possibly-relative install root against the project root.
pub fn install_root_path(cfg: &BuildConfig, install_root: &str) -> PathBuf {
    let path = Path::new(install_root);
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        cfg.root.join(path)
    }
}

//! Checks run before anything is shown to the operator.
//!
//! An installation needs every collaborator in `PATH`, root privileges (or a
//! configured privilege method) and a system booted in UEFI mode. All
//! problems are collected and reported together.

use camino::Utf8Path;
use which::which;

use crate::config::Profile;
use crate::error::CryptstrapError;

/// Tools invoked by the installation plan.
pub const REQUIRED_COMMANDS: &[&str] = &[
    "sgdisk",
    "udevadm",
    "cryptsetup",
    "mkfs.fat",
    "mkfs.btrfs",
    "btrfs",
    "mount",
    "umount",
    "pacstrap",
    "genfstab",
    "arch-chroot",
    "install",
    "sh",
    "efibootmgr",
];

/// Present only when the running kernel was booted through UEFI.
pub const EFI_FIRMWARE_DIR: &str = "/sys/firmware/efi";

/// Outcome of the environment checks.
#[derive(Debug, Default)]
pub struct PreflightReport {
    pub missing_commands: Vec<String>,
    pub is_root: bool,
    pub uefi: bool,
}

impl PreflightReport {
    /// Lists every problem that blocks an installation with `profile`.
    pub fn problems(&self, profile: &Profile) -> Vec<String> {
        let mut problems = Vec::new();
        if !self.missing_commands.is_empty() {
            problems.push(format!(
                "required commands not found in PATH: {}",
                self.missing_commands.join(", ")
            ));
        }
        if !self.is_root && profile.privilege.is_none() {
            problems.push("must run as root or configure a privilege method".to_string());
        }
        if !self.uefi {
            problems.push(format!(
                "system is not booted in UEFI mode ({} is missing)",
                EFI_FIRMWARE_DIR
            ));
        }
        problems
    }

    /// Converts the report into a result.
    pub fn into_result(self, profile: &Profile) -> Result<(), CryptstrapError> {
        let problems = self.problems(profile);
        if problems.is_empty() {
            Ok(())
        } else {
            Err(CryptstrapError::Preflight(problems.join("; ")))
        }
    }
}

/// Inspects the running system.
pub fn inspect(profile: &Profile) -> PreflightReport {
    let mut commands: Vec<&str> = REQUIRED_COMMANDS.to_vec();
    if let Some(method) = profile.privilege {
        commands.push(method.command_name());
    }

    let missing_commands = commands
        .into_iter()
        .filter(|command| which(command).is_err())
        .map(String::from)
        .collect();

    PreflightReport {
        missing_commands,
        is_root: rustix::process::geteuid().is_root(),
        uefi: Utf8Path::new(EFI_FIRMWARE_DIR).is_dir(),
    }
}

/// Runs all checks and fails with `Preflight` listing every problem.
pub fn verify(profile: &Profile) -> Result<(), CryptstrapError> {
    let report = inspect(profile);
    tracing::debug!("preflight report: {:?}", report);
    report.into_result(profile)
}

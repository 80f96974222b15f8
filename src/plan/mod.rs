//! The fixed installation plan.
//!
//! [`build_steps`] turns a validated profile and the chosen disk into the
//! ordered list of [`ProvisioningStep`]s run by the sequencer. Each step
//! invokes external tools through the [`CommandExecutor`]; nothing here
//! touches the disk directly, which keeps dry runs and tests free of side
//! effects.
//!
//! Commands that must run inside the new system go through
//! `arch-chroot <target> <program> <args...>` with explicit arguments.
//! Files of the new system are written by piping their content to
//! `install -D -m <mode> /dev/stdin <path>`.

mod boot;
mod bootstrap;
mod disk;
mod encryption;
mod filesystem;
mod system;

use anyhow::Result;
use camino::{Utf8Path, Utf8PathBuf};
use strum::{Display, EnumIter, IntoStaticStr};

use crate::config::Profile;
use crate::device::DeviceChoice;
use crate::executor::{CommandExecutor, CommandSpec, StdinPayload, run_checked};
use crate::prompt::Terminal;
use crate::sequencer::ProvisioningStep;

/// Partition number of the EFI system partition.
pub const ESP_PARTITION: u32 = 1;
/// Partition number of the LUKS container.
pub const LUKS_PARTITION: u32 = 2;

/// The provisioning steps, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumIter, IntoStaticStr)]
#[strum(serialize_all = "kebab-case")]
pub enum StepKind {
    Partition,
    Encrypt,
    Filesystem,
    Bootstrap,
    Configure,
    SecureBoot,
    BootImage,
    BootEntry,
    Finalize,
}

/// Everything a step action needs, borrowed for the duration of the run.
#[derive(Clone, Copy)]
pub struct StepContext<'a> {
    pub profile: &'a Profile,
    pub device: &'a DeviceChoice,
    pub executor: &'a dyn CommandExecutor,
    pub terminal: &'a dyn Terminal,
}

impl<'a> StepContext<'a> {
    /// Builds a command with the profile's privilege method applied.
    pub(crate) fn command<I, S>(&self, program: &str, args: I) -> CommandSpec
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        CommandSpec::new(program, args).with_privilege(self.profile.privilege)
    }

    /// Runs a command on the host and fails on non-zero exit.
    pub(crate) fn run<I, S>(&self, program: &str, args: I) -> Result<()>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        run_checked(self.executor, &self.command(program, args))
    }

    /// Runs a command inside the target root.
    pub(crate) fn chroot<I, S>(&self, program: &str, args: I) -> Result<()>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut full = vec![self.profile.target.to_string(), program.to_string()];
        full.extend(args.into_iter().map(Into::into));
        self.run("arch-chroot", full)
    }

    /// Writes `contents` to `path` of the new system, creating parents.
    pub(crate) fn write_file(&self, path: &Utf8Path, mode: &str, contents: &str) -> Result<()> {
        let destination: Utf8PathBuf = self.profile.target_path(path);
        let spec = self
            .command(
                "install",
                ["-D", "-m", mode, "/dev/stdin", destination.as_str()],
            )
            .with_stdin(StdinPayload::new(contents));
        run_checked(self.executor, &spec)
    }

    pub(crate) fn esp_partition(&self) -> Utf8PathBuf {
        self.device.partition(ESP_PARTITION)
    }

    pub(crate) fn luks_partition(&self) -> Utf8PathBuf {
        self.device.partition(LUKS_PARTITION)
    }
}

fn step<'a>(kind: StepKind, action: impl FnOnce() -> Result<()> + 'a) -> ProvisioningStep<'a> {
    ProvisioningStep::new(kind.to_string(), action)
}

/// Builds the provisioning steps in their fixed order.
///
/// `finalize` is only part of the plan when `finalize.unmount` is set.
pub fn build_steps(ctx: StepContext<'_>) -> Vec<ProvisioningStep<'_>> {
    let mut steps = vec![
        step(StepKind::Partition, move || disk::partition(&ctx)),
        step(StepKind::Encrypt, move || encryption::encrypt(&ctx)),
        step(StepKind::Filesystem, move || filesystem::create(&ctx)),
        step(StepKind::Bootstrap, move || bootstrap::pacstrap(&ctx)),
        step(StepKind::Configure, move || system::configure(&ctx)),
        step(StepKind::SecureBoot, move || boot::enroll_keys(&ctx)),
        step(StepKind::BootImage, move || boot::build_image(&ctx)),
        step(StepKind::BootEntry, move || boot::create_entry(&ctx)),
    ];
    if ctx.profile.finalize.unmount {
        steps.push(step(StepKind::Finalize, move || filesystem::teardown(&ctx)));
    }
    steps
}

//! Filesystem creation, subvolume layout and mounts.

use anyhow::{Context, Result};

use super::StepContext;
use crate::config::Subvolume;

/// Formats the ESP and the btrfs root, creates the subvolumes and mounts
/// everything below the target.
pub(super) fn create(ctx: &StepContext<'_>) -> Result<()> {
    let profile = ctx.profile;
    let mapper = profile.mapper_path();
    let target = &profile.target;
    let esp = ctx.esp_partition();

    ctx.run("mkfs.fat", ["-F", "32", "-n", "EFI", esp.as_str()])
        .with_context(|| format!("failed to format ESP {}", esp))?;
    ctx.run("mkfs.btrfs", ["-f", "-L", profile.filesystem.label.as_str(), mapper.as_str()])
        .with_context(|| format!("failed to format {}", mapper))?;

    // Subvolumes are created from the top-level volume, then it is unmounted
    // and each subvolume is mounted at its place.
    ctx.run("mount", ["--mkdir", mapper.as_str(), target.as_str()])?;
    for subvolume in &profile.filesystem.subvolumes {
        let path = target.join(&subvolume.name);
        ctx.run("btrfs", ["subvolume", "create", path.as_str()])
            .with_context(|| format!("failed to create subvolume {}", subvolume.name))?;
    }
    ctx.run("umount", [target.as_str()])?;

    for subvolume in mount_order(&profile.filesystem.subvolumes) {
        let options = match profile.filesystem.mount_options.trim() {
            "" => format!("subvol={}", subvolume.name),
            shared => format!("{},subvol={}", shared, subvolume.name),
        };
        let mountpoint = profile.target_path(&subvolume.mountpoint);
        ctx.run("mount", ["--mkdir", "-o", options.as_str(), mapper.as_str(), mountpoint.as_str()])
            .with_context(|| format!("failed to mount subvolume {}", subvolume.name))?;
    }

    let esp_mountpoint = profile.esp_mountpoint();
    ctx.run("mount", ["--mkdir", "-o", "umask=0077", esp.as_str(), esp_mountpoint.as_str()])
        .with_context(|| format!("failed to mount ESP at {}", esp_mountpoint))?;
    Ok(())
}

/// Orders subvolumes so that every mountpoint is mounted after its parents.
pub(crate) fn mount_order(subvolumes: &[Subvolume]) -> Vec<&Subvolume> {
    let mut ordered: Vec<&Subvolume> = subvolumes.iter().collect();
    ordered.sort_by_key(|s| s.mountpoint.components().count());
    ordered
}

/// Unmounts the target tree and closes the LUKS mapping.
pub(super) fn teardown(ctx: &StepContext<'_>) -> Result<()> {
    let profile = ctx.profile;
    ctx.run("umount", ["-R", profile.target.as_str()])
        .with_context(|| format!("failed to unmount {}", profile.target))?;
    ctx.run("cryptsetup", ["close", profile.encryption.mapper_name.as_str()])?;
    Ok(())
}

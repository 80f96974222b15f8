//! GPT partitioning of the target disk.

use anyhow::{Context, Result};

use super::{ESP_PARTITION, LUKS_PARTITION, StepContext};

/// Wipes the partition table and creates the ESP and the LUKS partition.
///
/// Layout: partition 1 is the EFI system partition (`ef00`), partition 2
/// fills the rest of the disk and holds the LUKS container (`8309`). The
/// LUKS partition carries a GPT name so crypttab can refer to it by
/// `PARTLABEL=`.
pub(super) fn partition(ctx: &StepContext<'_>) -> Result<()> {
    let device = ctx.device.path().as_str();
    let profile = ctx.profile;

    ctx.run("sgdisk", ["--zap-all", device])
        .with_context(|| format!("failed to wipe partition table on {}", device))?;

    ctx.run(
        "sgdisk",
        [
            format!("--new={}:0:+{}", ESP_PARTITION, profile.partition.esp_size),
            format!("--typecode={}:ef00", ESP_PARTITION),
            format!("--change-name={}:EFI", ESP_PARTITION),
            format!("--new={}:0:0", LUKS_PARTITION),
            format!("--typecode={}:8309", LUKS_PARTITION),
            format!("--change-name={}:{}", LUKS_PARTITION, profile.partition.luks_label),
            device.to_string(),
        ],
    )
    .with_context(|| format!("failed to create partitions on {}", device))?;

    // New partition nodes appear asynchronously.
    ctx.run("udevadm", ["settle"])?;
    Ok(())
}

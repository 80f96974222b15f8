//! Base system installation.

use anyhow::{Context, Result};

use super::StepContext;

/// Installs the package set with `pacstrap` and generates `/etc/fstab`.
pub(super) fn pacstrap(ctx: &StepContext<'_>) -> Result<()> {
    let profile = ctx.profile;
    let target = profile.target.as_str();

    let mut args = vec!["-K".to_string(), target.to_string()];
    args.extend(profile.bootstrap.packages.iter().cloned());
    ctx.run("pacstrap", args).context("failed to install the base system")?;

    // genfstab only prints; the target path is a positional argument so the
    // shell never parses it.
    ctx.run(
        "sh",
        ["-c", r#"genfstab -U "$1" >> "$1/etc/fstab""#, "sh", target],
    )
    .context("failed to generate fstab")?;
    Ok(())
}

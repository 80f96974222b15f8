//! Secure-boot keys, the signed unified kernel image and its boot entry.

use anyhow::{Context, Result};
use camino::Utf8Path;

use super::{ESP_PARTITION, StepContext};
use crate::config::Profile;

/// Hooks for a systemd-based initramfs that unlocks the root via crypttab.
const MKINITCPIO_HOOKS: &str = "HOOKS=(base systemd autodetect microcode modconf kms keyboard \
                                sd-vconsole block sd-encrypt filesystems fsck)\n";

/// ESP-relative directory of unified kernel images.
const UKI_DIR: &str = "/EFI/Linux";

/// Path of the UKI as seen from the installed system.
pub(crate) fn uki_path(profile: &Profile) -> String {
    format!("/efi{}/{}", UKI_DIR, profile.boot.uki_name)
}

/// Firmware loader path of the UKI, backslash-separated.
pub(crate) fn uki_loader(profile: &Profile) -> String {
    format!("{}/{}", UKI_DIR, profile.boot.uki_name).replace('/', "\\")
}

/// `/etc/crypttab.initramfs` line for the root container.
pub(crate) fn crypttab_entry(profile: &Profile) -> String {
    format!(
        "{} PARTLABEL={} none\n",
        profile.encryption.mapper_name, profile.partition.luks_label
    )
}

/// Kernel command line embedded in the UKI.
pub(crate) fn kernel_cmdline(profile: &Profile) -> String {
    let root_subvolume = profile
        .filesystem
        .root_subvolume()
        .map_or("@", |s| s.name.as_str());
    format!("root={} rootflags=subvol={} rw\n", profile.mapper_path(), root_subvolume)
}

/// mkinitcpio preset that produces only the UKI.
pub(crate) fn mkinitcpio_preset(profile: &Profile) -> String {
    format!(
        "ALL_kver=\"/boot/vmlinuz-{}\"\nPRESETS=('default')\ndefault_uki=\"{}\"\n",
        profile.boot.kernel_preset,
        uki_path(profile)
    )
}

/// Generates secure-boot keys in the new system and enrolls them.
///
/// Enrollment requires the firmware to be in setup mode.
pub(super) fn enroll_keys(ctx: &StepContext<'_>) -> Result<()> {
    ctx.chroot("sbctl", ["create-keys"]).context("failed to create secure-boot keys")?;

    let mut args = vec!["enroll-keys"];
    if ctx.profile.boot.microsoft_keys {
        args.push("--microsoft");
    }
    ctx.chroot("sbctl", args)
        .context("failed to enroll secure-boot keys (is the firmware in setup mode?)")?;
    Ok(())
}

/// Writes the initramfs configuration, builds the UKI and signs it.
pub(super) fn build_image(ctx: &StepContext<'_>) -> Result<()> {
    let profile = ctx.profile;

    ctx.write_file(Utf8Path::new("/etc/crypttab.initramfs"), "0600", &crypttab_entry(profile))?;
    ctx.write_file(Utf8Path::new("/etc/kernel/cmdline"), "0644", &kernel_cmdline(profile))?;
    ctx.write_file(
        Utf8Path::new("/etc/mkinitcpio.conf.d/cryptstrap.conf"),
        "0644",
        MKINITCPIO_HOOKS,
    )?;
    let preset = format!("/etc/mkinitcpio.d/{}.preset", profile.boot.kernel_preset);
    ctx.write_file(Utf8Path::new(&preset), "0644", &mkinitcpio_preset(profile))?;

    ctx.chroot("mkinitcpio", ["-p", profile.boot.kernel_preset.as_str()])
        .context("failed to build the unified kernel image")?;

    let uki = uki_path(profile);
    ctx.chroot("sbctl", ["sign", "-s", uki.as_str()])
        .with_context(|| format!("failed to sign {}", uki))?;
    Ok(())
}

/// Registers the UKI with the firmware boot manager.
pub(super) fn create_entry(ctx: &StepContext<'_>) -> Result<()> {
    let part = ESP_PARTITION.to_string();
    let loader = uki_loader(ctx.profile);
    ctx.run(
        "efibootmgr",
        [
            "--create",
            "--disk",
            ctx.device.path().as_str(),
            "--part",
            part.as_str(),
            "--label",
            ctx.profile.boot.label.as_str(),
            "--loader",
            loader.as_str(),
            "--unicode",
        ],
    )
    .context("failed to create the firmware boot entry")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_uki_paths() {
        let profile = Profile::default();
        assert_eq!(uki_path(&profile), "/efi/EFI/Linux/arch-linux.efi");
        assert_eq!(uki_loader(&profile), r"\EFI\Linux\arch-linux.efi");
    }

    #[test]
    fn test_kernel_cmdline_uses_root_subvolume() {
        let profile = Profile::default();
        assert_eq!(
            kernel_cmdline(&profile),
            "root=/dev/mapper/cryptroot rootflags=subvol=@ rw\n"
        );
    }

    #[test]
    fn test_crypttab_entry_refers_to_partition_label() {
        let profile = Profile::default();
        assert_eq!(crypttab_entry(&profile), "cryptroot PARTLABEL=cryptroot none\n");
    }

    #[test]
    fn test_preset_points_to_uki() {
        let preset = mkinitcpio_preset(&Profile::default());
        assert!(preset.contains("ALL_kver=\"/boot/vmlinuz-linux\""));
        assert!(preset.contains("PRESETS=('default')"));
        assert!(preset.contains("default_uki=\"/efi/EFI/Linux/arch-linux.efi\""));
    }
}

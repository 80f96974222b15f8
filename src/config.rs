//! Installation profile loaded from YAML.
//!
//! The profile is the explicit configuration threaded through device
//! selection, the install plan and every step action. Values that belong to
//! the external tools (ESP size, luksFormat flags, mount options, package
//! list) are passed through to them unmodified.

use std::collections::HashSet;
use std::fs::File;
use std::io::BufReader;

use camino::{Utf8Path, Utf8PathBuf};
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::CryptstrapError;
use crate::privilege::PrivilegeMethod;

/// Device names of SATA/SCSI, NVMe and virtio whole disks.
pub const DEFAULT_DEVICE_PATTERN: &str = r"^(sd[a-z]+|nvme[0-9]+n[0-9]+|vd[a-z]+)$";

fn default_device_pattern() -> String {
    DEFAULT_DEVICE_PATTERN.to_string()
}

fn default_target() -> Utf8PathBuf {
    Utf8PathBuf::from("/mnt")
}

fn default_true() -> bool {
    true
}

/// Top-level installation profile.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct Profile {
    /// Regex matched against `/sys/block` entry names.
    #[serde(default = "default_device_pattern")]
    pub device_pattern: String,
    /// Mount point of the new system's root during installation.
    #[serde(default = "default_target")]
    pub target: Utf8PathBuf,
    /// Wraps every collaborator command when set.
    #[serde(default)]
    pub privilege: Option<PrivilegeMethod>,
    #[serde(default)]
    pub partition: PartitionConfig,
    #[serde(default)]
    pub encryption: EncryptionConfig,
    #[serde(default)]
    pub filesystem: FilesystemConfig,
    #[serde(default)]
    pub bootstrap: BootstrapConfig,
    #[serde(default)]
    pub system: SystemConfig,
    #[serde(default)]
    pub boot: BootConfig,
    #[serde(default)]
    pub finalize: FinalizeConfig,
}

impl Default for Profile {
    fn default() -> Self {
        Self {
            device_pattern: default_device_pattern(),
            target: default_target(),
            privilege: None,
            partition: PartitionConfig::default(),
            encryption: EncryptionConfig::default(),
            filesystem: FilesystemConfig::default(),
            bootstrap: BootstrapConfig::default(),
            system: SystemConfig::default(),
            boot: BootConfig::default(),
            finalize: FinalizeConfig::default(),
        }
    }
}

/// GPT layout parameters handed to `sgdisk`.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields, default)]
pub struct PartitionConfig {
    /// Size of the EFI system partition in sgdisk notation (e.g. `1G`).
    pub esp_size: String,
    /// GPT partition name of the encrypted partition, used by crypttab.
    pub luks_label: String,
}

impl Default for PartitionConfig {
    fn default() -> Self {
        Self {
            esp_size: "1G".to_string(),
            luks_label: "cryptroot".to_string(),
        }
    }
}

/// LUKS container parameters handed to `cryptsetup`.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields, default)]
pub struct EncryptionConfig {
    /// Name of the opened mapping under `/dev/mapper`.
    pub mapper_name: String,
    /// Extra arguments appended to `cryptsetup luksFormat`.
    pub format_args: Vec<String>,
}

impl Default for EncryptionConfig {
    fn default() -> Self {
        Self {
            mapper_name: "cryptroot".to_string(),
            format_args: Vec::new(),
        }
    }
}

/// One btrfs subvolume and where it is mounted in the new system.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct Subvolume {
    pub name: String,
    pub mountpoint: Utf8PathBuf,
}

impl Subvolume {
    pub fn new(name: impl Into<String>, mountpoint: impl Into<Utf8PathBuf>) -> Self {
        Self {
            name: name.into(),
            mountpoint: mountpoint.into(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields, default)]
pub struct FilesystemConfig {
    /// btrfs filesystem label.
    pub label: String,
    /// Mount options shared by every subvolume mount.
    pub mount_options: String,
    pub subvolumes: Vec<Subvolume>,
}

impl Default for FilesystemConfig {
    fn default() -> Self {
        Self {
            label: "archroot".to_string(),
            mount_options: "noatime,compress=zstd".to_string(),
            subvolumes: vec![
                Subvolume::new("@", "/"),
                Subvolume::new("@home", "/home"),
                Subvolume::new("@log", "/var/log"),
                Subvolume::new("@snapshots", "/.snapshots"),
            ],
        }
    }
}

impl FilesystemConfig {
    /// Returns the subvolume mounted at `/`, if any.
    pub fn root_subvolume(&self) -> Option<&Subvolume> {
        self.subvolumes.iter().find(|s| s.mountpoint == "/")
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields, default)]
pub struct BootstrapConfig {
    /// Packages installed by `pacstrap`.
    pub packages: Vec<String>,
}

impl Default for BootstrapConfig {
    fn default() -> Self {
        Self {
            packages: ["base", "linux", "linux-firmware", "btrfs-progs", "cryptsetup", "sbctl"]
                .into_iter()
                .map(String::from)
                .collect(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields, default)]
pub struct SystemConfig {
    pub hostname: String,
    /// Zone name under `/usr/share/zoneinfo`.
    pub timezone: String,
    pub locale: String,
    pub keymap: String,
}

impl Default for SystemConfig {
    fn default() -> Self {
        Self {
            hostname: "archlinux".to_string(),
            timezone: "UTC".to_string(),
            locale: "en_US.UTF-8".to_string(),
            keymap: "us".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields, default)]
pub struct BootConfig {
    /// Label of the firmware boot entry.
    pub label: String,
    /// File name of the unified kernel image under `/efi/EFI/Linux`.
    pub uki_name: String,
    /// mkinitcpio preset, normally the kernel package name.
    pub kernel_preset: String,
    /// Enroll Microsoft's certificates next to the generated keys.
    pub microsoft_keys: bool,
}

impl Default for BootConfig {
    fn default() -> Self {
        Self {
            label: "Arch Linux".to_string(),
            uki_name: "arch-linux.efi".to_string(),
            kernel_preset: "linux".to_string(),
            microsoft_keys: true,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct FinalizeConfig {
    /// Unmount the target and close the LUKS mapping at the end.
    #[serde(default = "default_true")]
    pub unmount: bool,
}

impl Default for FinalizeConfig {
    fn default() -> Self {
        Self { unmount: true }
    }
}

fn is_valid_hostname(hostname: &str) -> bool {
    !hostname.is_empty()
        && hostname.len() <= 63
        && !hostname.starts_with('-')
        && !hostname.ends_with('-')
        && hostname.chars().all(|c| c.is_ascii_alphanumeric() || c == '-')
}

fn require_non_empty(value: &str, field: &str) -> Result<(), CryptstrapError> {
    if value.trim().is_empty() {
        return Err(CryptstrapError::Validation(format!("{} must not be empty", field)));
    }
    Ok(())
}

/// Accepts names that end up as single fields of crypttab, the kernel
/// command line or a file name: `[A-Za-z0-9._-]`, not starting with `-` or `.`.
fn require_identifier(value: &str, field: &str) -> Result<(), CryptstrapError> {
    require_non_empty(value, field)?;
    let valid = !value.starts_with(['-', '.'])
        && value
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'));
    if !valid {
        return Err(CryptstrapError::Validation(format!(
            "{} may only contain letters, digits, '.', '_' and '-' and must not start \
             with '-' or '.': '{}'",
            field, value
        )));
    }
    Ok(())
}

impl Profile {
    /// Compiles the device-name pattern.
    pub fn device_regex(&self) -> Result<Regex, CryptstrapError> {
        Regex::new(&self.device_pattern).map_err(|e| {
            CryptstrapError::Validation(format!(
                "invalid device_pattern '{}': {}",
                self.device_pattern, e
            ))
        })
    }

    /// Path of the opened LUKS mapping.
    pub fn mapper_path(&self) -> Utf8PathBuf {
        Utf8Path::new("/dev/mapper").join(&self.encryption.mapper_name)
    }

    /// Path of the EFI system partition mount inside the target.
    pub fn esp_mountpoint(&self) -> Utf8PathBuf {
        self.target.join("efi")
    }

    /// Maps an absolute path of the new system into the target tree.
    pub fn target_path(&self, path: &Utf8Path) -> Utf8PathBuf {
        let relative = path.strip_prefix("/").unwrap_or(path);
        if relative.as_str().is_empty() {
            self.target.clone()
        } else {
            self.target.join(relative)
        }
    }

    /// Validates the profile.
    pub fn validate(&self) -> Result<(), CryptstrapError> {
        self.device_regex()?;

        if !self.target.is_absolute() {
            return Err(CryptstrapError::Validation(format!(
                "target must be an absolute path: {}",
                self.target
            )));
        }

        require_non_empty(&self.partition.esp_size, "partition.esp_size")?;
        require_identifier(&self.partition.luks_label, "partition.luks_label")?;
        require_identifier(&self.encryption.mapper_name, "encryption.mapper_name")?;

        self.validate_subvolumes()?;

        if self.bootstrap.packages.is_empty() {
            return Err(CryptstrapError::Validation(
                "bootstrap.packages must not be empty".to_string(),
            ));
        }

        if !is_valid_hostname(&self.system.hostname) {
            return Err(CryptstrapError::Validation(format!(
                "system.hostname is not a valid hostname: '{}'",
                self.system.hostname
            )));
        }
        require_non_empty(&self.system.timezone, "system.timezone")?;
        require_non_empty(&self.system.locale, "system.locale")?;
        require_non_empty(&self.system.keymap, "system.keymap")?;

        require_non_empty(&self.boot.label, "boot.label")?;
        require_identifier(&self.boot.kernel_preset, "boot.kernel_preset")?;
        if !self.boot.uki_name.ends_with(".efi") || self.boot.uki_name.contains('/') {
            return Err(CryptstrapError::Validation(format!(
                "boot.uki_name must be a file name ending in .efi: '{}'",
                self.boot.uki_name
            )));
        }

        Ok(())
    }

    fn validate_subvolumes(&self) -> Result<(), CryptstrapError> {
        let subvolumes = &self.filesystem.subvolumes;
        let mut names = HashSet::new();
        let mut mountpoints = HashSet::new();

        for subvolume in subvolumes {
            require_non_empty(&subvolume.name, "filesystem.subvolumes[].name")?;
            if subvolume.name.contains('/') {
                return Err(CryptstrapError::Validation(format!(
                    "subvolume name must not contain '/': {}",
                    subvolume.name
                )));
            }
            if !subvolume.mountpoint.is_absolute() {
                return Err(CryptstrapError::Validation(format!(
                    "subvolume {} mountpoint must be absolute: {}",
                    subvolume.name, subvolume.mountpoint
                )));
            }
            if !names.insert(subvolume.name.as_str()) {
                return Err(CryptstrapError::Validation(format!(
                    "duplicate subvolume name: {}",
                    subvolume.name
                )));
            }
            if !mountpoints.insert(subvolume.mountpoint.as_str()) {
                return Err(CryptstrapError::Validation(format!(
                    "duplicate subvolume mountpoint: {}",
                    subvolume.mountpoint
                )));
            }
        }

        if self.filesystem.root_subvolume().is_none() {
            return Err(CryptstrapError::Validation(
                "exactly one subvolume must be mounted at /".to_string(),
            ));
        }

        Ok(())
    }
}

/// Loads a profile from a YAML file.
pub fn load_profile(path: &Utf8Path) -> Result<Profile, CryptstrapError> {
    let file = File::open(path).map_err(|e| CryptstrapError::io(path.as_str(), e))?;
    let reader = BufReader::new(file);
    let profile: Profile = serde_yaml::from_reader(reader)
        .map_err(|e| CryptstrapError::Config(format!("failed to parse yaml: {}: {}", path, e)))?;
    debug!("loaded profile from {}", path);
    Ok(profile)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_profile_is_valid() {
        Profile::default().validate().unwrap();
    }

    #[test]
    fn test_target_path_maps_absolute_paths() {
        let profile = Profile::default();
        assert_eq!(profile.target_path(Utf8Path::new("/")), Utf8PathBuf::from("/mnt"));
        assert_eq!(
            profile.target_path(Utf8Path::new("/var/log")),
            Utf8PathBuf::from("/mnt/var/log")
        );
        assert_eq!(profile.esp_mountpoint(), Utf8PathBuf::from("/mnt/efi"));
        assert_eq!(profile.mapper_path(), Utf8PathBuf::from("/dev/mapper/cryptroot"));
    }

    #[test]
    fn test_hostname_rules() {
        assert!(is_valid_hostname("arch-box1"));
        assert!(!is_valid_hostname(""));
        assert!(!is_valid_hostname("-arch"));
        assert!(!is_valid_hostname("arch-"));
        assert!(!is_valid_hostname("arch.local"));
        assert!(!is_valid_hostname(&"a".repeat(64)));
    }

    #[test]
    fn test_default_pattern_matches_whole_disks_only() {
        let re = Profile::default().device_regex().unwrap();
        for name in ["sda", "sdab", "nvme0n1", "nvme10n2", "vda"] {
            assert!(re.is_match(name), "{} should match", name);
        }
        for name in ["sda1", "nvme0n1p1", "loop0", "sr0", "dm-0", "zram0"] {
            assert!(!re.is_match(name), "{} should not match", name);
        }
    }
}

//! Target disk discovery and selection.
//!
//! Candidates are the entries of `/sys/block` whose name matches the
//! profile's device pattern. The operator picks one from a menu, or names it
//! with `--device`; either way the result must belong to the eligible set.

use std::fmt;
use std::fs;

use camino::{Utf8Path, Utf8PathBuf};
use regex::Regex;
use tracing::{debug, info};

use crate::error::CryptstrapError;
use crate::prompt::Terminal;

/// Kernel view of block devices.
pub const SYS_BLOCK_DIR: &str = "/sys/block";
/// Directory holding device nodes.
pub const DEV_DIR: &str = "/dev";

/// `/sys/block/<name>/size` counts 512-byte sectors regardless of the
/// device's logical block size.
const SECTOR_SIZE: u64 = 512;

/// An enumerated candidate disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockDevice {
    /// Kernel name, e.g. `nvme0n1`.
    pub name: String,
    /// Device node, e.g. `/dev/nvme0n1`.
    pub path: Utf8PathBuf,
    /// Capacity in bytes, when the kernel reports it.
    pub size_bytes: Option<u64>,
}

impl BlockDevice {
    /// Label shown in the selection menu.
    pub fn menu_label(&self) -> String {
        match self.size_bytes {
            Some(bytes) => format!("{} ({})", self.path, format_size(bytes)),
            None => self.path.to_string(),
        }
    }
}

/// Formats a byte count with binary units, one decimal place.
pub fn format_size(bytes: u64) -> String {
    const UNITS: [&str; 5] = ["B", "KiB", "MiB", "GiB", "TiB"];
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{} B", bytes)
    } else {
        format!("{:.1} {}", value, UNITS[unit])
    }
}

/// The disk chosen for installation.
///
/// Immutable once constructed; every step that touches the disk derives its
/// paths from here.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceChoice {
    path: Utf8PathBuf,
}

impl DeviceChoice {
    pub(crate) fn new(path: Utf8PathBuf) -> Self {
        Self { path }
    }

    /// Device node of the whole disk.
    pub fn path(&self) -> &Utf8Path {
        &self.path
    }

    /// Device node of partition `number`.
    ///
    /// Disks whose name ends in a digit use a `p` separator
    /// (`/dev/nvme0n1` → `/dev/nvme0n1p2`); others do not (`/dev/sda` → `/dev/sda2`).
    pub fn partition(&self, number: u32) -> Utf8PathBuf {
        let base = self.path.as_str();
        if base.ends_with(|c: char| c.is_ascii_digit()) {
            Utf8PathBuf::from(format!("{}p{}", base, number))
        } else {
            Utf8PathBuf::from(format!("{}{}", base, number))
        }
    }
}

impl fmt::Display for DeviceChoice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.path.as_str())
    }
}

fn read_size(sys_block: &Utf8Path, name: &str) -> Option<u64> {
    let size_file = sys_block.join(name).join("size");
    let content = fs::read_to_string(&size_file).ok()?;
    match content.trim().parse::<u64>() {
        Ok(sectors) => {
            let bytes = sectors.checked_mul(SECTOR_SIZE);
            if bytes.is_none() {
                debug!("ignoring out-of-range size in {}: {} sectors", size_file, sectors);
            }
            bytes
        }
        Err(e) => {
            debug!("ignoring unparsable size in {}: {}", size_file, e);
            None
        }
    }
}

/// Lists and selects eligible block devices.
#[derive(Debug, Clone)]
pub struct DeviceSelector {
    pattern: Regex,
    sys_block: Utf8PathBuf,
    dev_dir: Utf8PathBuf,
}

impl DeviceSelector {
    /// Creates a selector over the live system's devices.
    pub fn new(pattern: Regex) -> Self {
        Self::with_roots(pattern, SYS_BLOCK_DIR, DEV_DIR)
    }

    /// Creates a selector reading device names from `sys_block` and building
    /// device paths under `dev_dir`.
    pub fn with_roots(
        pattern: Regex,
        sys_block: impl Into<Utf8PathBuf>,
        dev_dir: impl Into<Utf8PathBuf>,
    ) -> Self {
        Self {
            pattern,
            sys_block: sys_block.into(),
            dev_dir: dev_dir.into(),
        }
    }

    /// Returns the device-name pattern this selector filters with.
    pub fn pattern(&self) -> &str {
        self.pattern.as_str()
    }

    /// Enumerates devices whose name matches the pattern, sorted by name.
    pub fn eligible(&self) -> Result<Vec<BlockDevice>, CryptstrapError> {
        let entries = fs::read_dir(&self.sys_block).map_err(|e| {
            CryptstrapError::io(format!("failed to list block devices: {}", self.sys_block), e)
        })?;

        let mut devices = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| {
                CryptstrapError::io(format!("failed to read entry in {}", self.sys_block), e)
            })?;
            let Ok(name) = entry.file_name().into_string() else {
                continue;
            };
            if !self.pattern.is_match(&name) {
                continue;
            }
            devices.push(BlockDevice {
                path: self.dev_dir.join(&name),
                size_bytes: read_size(&self.sys_block, &name),
                name,
            });
        }

        devices.sort_by(|a, b| a.name.cmp(&b.name));
        debug!("found {} eligible block device(s)", devices.len());
        Ok(devices)
    }

    /// Chooses the installation target.
    ///
    /// With `preselected`, the menu is skipped but the device must still be
    /// eligible. Fails with `NoEligibleDevice` when nothing matches.
    pub fn select(
        &self,
        term: &dyn Terminal,
        preselected: Option<&Utf8Path>,
    ) -> Result<DeviceChoice, CryptstrapError> {
        let devices = self.eligible()?;
        if devices.is_empty() {
            return Err(CryptstrapError::NoEligibleDevice {
                pattern: self.pattern().to_string(),
            });
        }

        let chosen = match preselected {
            Some(wanted) => devices
                .iter()
                .find(|d| d.path.as_path() == wanted || d.name == wanted.as_str())
                .ok_or_else(|| {
                    CryptstrapError::Validation(format!(
                        "{} is not an eligible installation target (eligible: {})",
                        wanted,
                        devices
                            .iter()
                            .map(|d| d.path.as_str())
                            .collect::<Vec<_>>()
                            .join(", ")
                    ))
                })?,
            None => {
                let labels: Vec<String> = devices.iter().map(BlockDevice::menu_label).collect();
                let index = term
                    .select("Select the installation disk", &labels)
                    .map_err(|e| CryptstrapError::Terminal(format!("{:#}", e)))?;
                devices.get(index).ok_or_else(|| {
                    CryptstrapError::Terminal(format!("menu returned out-of-range index {}", index))
                })?
            }
        };

        info!("selected installation disk {}", chosen.path);
        Ok(DeviceChoice::new(chosen.path.clone()))
    }
}

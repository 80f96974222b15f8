//! Shared test infrastructure: a recording executor, a scripted terminal,
//! fake `/sys/block` trees and profile files.

#![allow(dead_code)]

use std::cell::RefCell;
use std::collections::VecDeque;
use std::fs;
use std::sync::Mutex;

use anyhow::Result;
use camino::{Utf8Path, Utf8PathBuf};
use cryptstrap::config::{Profile, load_profile};
use cryptstrap::device::DeviceSelector;
use cryptstrap::executor::{CommandExecutor, CommandSpec, ExecutionResult};
use cryptstrap::prompt::Terminal;
use tempfile::TempDir;
use zeroize::Zeroizing;

// =============================================================================
// MockExecutor
// =============================================================================

/// Records executed commands in order, optionally failing on a chosen call.
pub struct MockExecutor {
    calls: Mutex<Vec<CommandSpec>>,
    /// If set, the first call whose `program args...` line contains this
    /// text returns an error.
    fail_when: Option<String>,
}

impl MockExecutor {
    pub fn new() -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            fail_when: None,
        }
    }

    pub fn failing_when(needle: impl Into<String>) -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            fail_when: Some(needle.into()),
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    pub fn calls(&self) -> Vec<CommandSpec> {
        self.calls.lock().unwrap().clone()
    }

    /// Each call rendered as `program arg arg ...`.
    pub fn command_lines(&self) -> Vec<String> {
        self.calls().iter().map(command_line).collect()
    }
}

pub fn command_line(spec: &CommandSpec) -> String {
    let mut parts = vec![spec.command.clone()];
    parts.extend(spec.args.iter().cloned());
    parts.join(" ")
}

impl CommandExecutor for MockExecutor {
    fn execute(&self, spec: &CommandSpec) -> Result<ExecutionResult> {
        self.calls.lock().unwrap().push(spec.clone());
        if let Some(needle) = &self.fail_when
            && command_line(spec).contains(needle.as_str())
        {
            anyhow::bail!("simulated failure of {}", spec.command);
        }
        Ok(ExecutionResult { status: None })
    }
}

// =============================================================================
// ScriptedTerminal
// =============================================================================

/// Terminal that replays prepared answers and records what was shown.
#[derive(Default)]
pub struct ScriptedTerminal {
    lines: RefCell<VecDeque<String>>,
    secrets: RefCell<VecDeque<String>>,
    selections: RefCell<VecDeque<usize>>,
    pub prompts: RefCell<Vec<String>>,
    pub notices: RefCell<Vec<String>>,
    pub menus: RefCell<Vec<Vec<String>>>,
}

impl ScriptedTerminal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_lines<I, S>(self, lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.lines.borrow_mut().extend(lines.into_iter().map(Into::into));
        self
    }

    pub fn with_secrets<I, S>(self, secrets: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.secrets.borrow_mut().extend(secrets.into_iter().map(Into::into));
        self
    }

    pub fn with_selection(self, index: usize) -> Self {
        self.selections.borrow_mut().push_back(index);
        self
    }

    pub fn secret_reads(&self) -> usize {
        self.prompts.borrow().iter().filter(|p| p.starts_with("secret:")).count()
    }

    pub fn remaining_secrets(&self) -> usize {
        self.secrets.borrow().len()
    }
}

impl Terminal for ScriptedTerminal {
    fn read_line(&self, prompt: &str) -> Result<String> {
        self.prompts.borrow_mut().push(format!("line:{}", prompt));
        self.lines
            .borrow_mut()
            .pop_front()
            .ok_or_else(|| anyhow::anyhow!("no scripted line left for '{}'", prompt))
    }

    fn read_secret(&self, prompt: &str) -> Result<Zeroizing<String>> {
        self.prompts.borrow_mut().push(format!("secret:{}", prompt));
        self.secrets
            .borrow_mut()
            .pop_front()
            .map(Zeroizing::new)
            .ok_or_else(|| anyhow::anyhow!("no scripted secret left for '{}'", prompt))
    }

    fn select(&self, prompt: &str, items: &[String]) -> Result<usize> {
        self.prompts.borrow_mut().push(format!("select:{}", prompt));
        self.menus.borrow_mut().push(items.to_vec());
        self.selections
            .borrow_mut()
            .pop_front()
            .ok_or_else(|| anyhow::anyhow!("no scripted selection left for '{}'", prompt))
    }

    fn notice(&self, message: &str) -> Result<()> {
        self.notices.borrow_mut().push(message.to_string());
        Ok(())
    }
}

// =============================================================================
// Fake block devices
// =============================================================================

/// A temporary `/sys/block` tree. Each device gets a `size` file.
pub struct FakeSysBlock {
    dir: TempDir,
}

impl FakeSysBlock {
    /// Creates entries for `(name, sectors)` pairs.
    pub fn new(devices: &[(&str, u64)]) -> Self {
        let dir = tempfile::tempdir().expect("failed to create temp dir");
        for (name, sectors) in devices {
            let device_dir = dir.path().join(name);
            fs::create_dir_all(&device_dir).unwrap();
            fs::write(device_dir.join("size"), format!("{}\n", sectors)).unwrap();
        }
        Self { dir }
    }

    pub fn path(&self) -> &Utf8Path {
        Utf8Path::from_path(self.dir.path()).expect("temp dir path is not UTF-8")
    }

    /// Selector reading this tree with the given profile's pattern.
    pub fn selector(&self, profile: &Profile) -> DeviceSelector {
        DeviceSelector::with_roots(profile.device_regex().unwrap(), self.path(), "/dev")
    }
}

// =============================================================================
// Profiles
// =============================================================================

/// Strips the leading newline of an indented raw YAML literal.
#[macro_export]
macro_rules! yaml {
    ($s:expr) => {
        $s.trim_start_matches('\n')
    };
}

/// A profile file written to a temp dir; the dir lives as long as this value.
pub struct ProfileFile {
    _dir: TempDir,
    pub path: Utf8PathBuf,
}

pub fn write_profile(yaml: &str) -> ProfileFile {
    let dir = tempfile::tempdir().expect("failed to create temp dir");
    let path = Utf8PathBuf::from_path_buf(dir.path().join("profile.yaml"))
        .expect("temp dir path is not UTF-8");
    fs::write(&path, yaml).expect("failed to write profile");
    ProfileFile { _dir: dir, path }
}

pub fn load_profile_from_yaml(yaml: &str) -> Result<Profile> {
    let file = write_profile(yaml);
    Ok(load_profile(&file.path)?)
}

pub const MINIMAL_PROFILE: &str = "---\nsystem:\n  hostname: testbox\n";

//! Privilege escalation configuration.
//!
//! An installation normally runs as root from the live environment. When the
//! profile names a privilege method instead, every collaborator command is
//! wrapped with it (`sudo cryptsetup ...`).

use serde::{Deserialize, Serialize};

/// Privilege escalation method.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PrivilegeMethod {
    /// Use `sudo` for privilege escalation.
    Sudo,
    /// Use `doas` for privilege escalation.
    Doas,
}

impl PrivilegeMethod {
    /// Returns the command name for this privilege method.
    pub fn command_name(&self) -> &'static str {
        match self {
            Self::Sudo => "sudo",
            Self::Doas => "doas",
        }
    }

    /// Wraps `command` and `args` so that the escalation tool runs them.
    ///
    /// Returns the program to execute and its full argument list.
    pub fn wrap(&self, command: &str, args: &[String]) -> (String, Vec<String>) {
        let mut wrapped = Vec::with_capacity(args.len() + 1);
        wrapped.push(command.to_string());
        wrapped.extend(args.iter().cloned());
        (self.command_name().to_string(), wrapped)
    }
}

impl std::fmt::Display for PrivilegeMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.command_name())
    }
}

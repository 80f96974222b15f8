//! Command execution abstraction for cryptstrap.
//!
//! This module provides:
//! - [`CommandSpec`]: Specification for commands to execute
//! - [`StdinPayload`]: Sensitive bytes delivered on a command's stdin
//! - [`ExecutionResult`]: Result of command execution
//! - [`CommandExecutor`]: Trait for command execution strategies
//! - [`RealCommandExecutor`]: Production implementation using `std::process::Command`

mod pipe;
mod real;

use std::fmt;
use std::process::ExitStatus;

use anyhow::Result;
use zeroize::Zeroizing;

use crate::error::CryptstrapError;
use crate::privilege::PrivilegeMethod;

pub use real::RealCommandExecutor;

/// Formats string arguments into a space-separated, debug-quoted string.
///
/// Used by error messages and dry-run output to consistently format
/// command arguments (e.g., `"--zap-all" "/dev/sda"`).
pub(crate) fn format_command_args(args: &[String]) -> String {
    args.iter()
        .map(|a| format!("{:?}", a))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Bytes written to a command's stdin.
///
/// This is the only channel through which a secret reaches a collaborator:
/// it never appears in the argument vector, the environment or a file. The
/// buffer is zeroized on drop and `Debug` prints only its length.
#[derive(Clone)]
pub struct StdinPayload(Zeroizing<Vec<u8>>);

impl StdinPayload {
    /// Wraps the given bytes.
    pub fn new(bytes: impl Into<Vec<u8>>) -> Self {
        Self(Zeroizing::new(bytes.into()))
    }

    /// Returns the payload bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Returns the payload length in bytes.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns true if the payload is empty.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Debug for StdinPayload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<redacted {} bytes>", self.0.len())
    }
}

/// Specification for a command to be executed
#[derive(Debug, Clone)]
pub struct CommandSpec {
    /// The command to execute (e.g., "cryptsetup")
    pub command: String,
    /// Command arguments
    pub args: Vec<String>,
    /// Data piped to the command's stdin (stdin is null when absent)
    pub stdin: Option<StdinPayload>,
    /// Privilege escalation method to wrap the command
    pub privilege: Option<PrivilegeMethod>,
}

impl CommandSpec {
    /// Creates a new CommandSpec with command and args
    #[must_use]
    pub fn new<I, S>(command: impl Into<String>, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            command: command.into(),
            args: args.into_iter().map(Into::into).collect(),
            stdin: None,
            privilege: None,
        }
    }

    /// Sets the privilege escalation method
    #[must_use]
    pub fn with_privilege(mut self, privilege: Option<PrivilegeMethod>) -> Self {
        self.privilege = privilege;
        self
    }

    /// Pipes the given payload to the command's stdin
    #[must_use]
    pub fn with_stdin(mut self, payload: StdinPayload) -> Self {
        self.stdin = Some(payload);
        self
    }

    /// Returns the program and arguments actually spawned, after applying
    /// the privilege wrapper.
    pub fn resolved_command(&self) -> (String, Vec<String>) {
        match self.privilege {
            Some(method) => method.wrap(&self.command, &self.args),
            None => (self.command.clone(), self.args.clone()),
        }
    }

    /// Returns a display form of the command line (never includes stdin).
    pub fn display(&self) -> String {
        let (program, args) = self.resolved_command();
        if args.is_empty() {
            program
        } else {
            format!("{} {}", program, format_command_args(&args))
        }
    }
}

/// Result of command execution
#[derive(Debug)]
pub struct ExecutionResult {
    /// Exit status of the command (None in dry-run mode)
    pub status: Option<ExitStatus>,
}

impl ExecutionResult {
    /// Returns true if the command executed successfully.
    ///
    /// In dry-run mode (status is None), this always returns true.
    pub fn success(&self) -> bool {
        self.status.is_none_or(|s| s.success())
    }

    /// Returns the exit code if available
    pub fn code(&self) -> Option<i32> {
        self.status.and_then(|s| s.code())
    }
}

/// Trait for command execution.
///
/// Implementations must be `Send + Sync` so an executor can be shared as
/// `Arc<dyn CommandExecutor>` between the install plan and its step actions.
pub trait CommandExecutor: Send + Sync {
    /// Executes a command with the given specification.
    fn execute(&self, spec: &CommandSpec) -> Result<ExecutionResult>;
}

/// Executes `spec` and turns a non-zero exit status into an error.
pub fn run_checked(executor: &dyn CommandExecutor, spec: &CommandSpec) -> Result<()> {
    let result = executor.execute(spec)?;
    if !result.success() {
        let status = match result.code() {
            Some(code) => format!("exit status: {}", code),
            None => "terminated by signal".to_string(),
        };
        return Err(CryptstrapError::Execution {
            command: spec.display(),
            status,
        }
        .into());
    }
    Ok(())
}

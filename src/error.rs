//! Domain-specific error types for cryptstrap.
//!
//! This module defines `CryptstrapError`, a `thiserror`-based enum that
//! provides typed error variants for every failure mode of an installation
//! run. Public API functions return `Result<T, CryptstrapError>` for
//! programmatic error handling, while trait boundaries (`CommandExecutor`,
//! `Terminal`, step actions) continue to use `anyhow::Result`.
//!
//! `CryptstrapError` implements `Into<anyhow::Error>`, so the `?` operator
//! converts it automatically at trait boundaries that return `anyhow::Result`.

use std::io;

/// Formats an IO error kind into a human-readable message.
///
/// Provides consistent, user-friendly messages for common IO error kinds
/// (e.g., "I/O error: not found") instead of the OS-level messages
/// (e.g., "No such file or directory (os error 2)"). For unrecognized
/// error kinds, falls back to including the OS-level error message.
pub(crate) fn io_error_kind_message(err: &io::Error) -> String {
    match err.kind() {
        io::ErrorKind::NotFound => "I/O error: not found".to_string(),
        io::ErrorKind::PermissionDenied => "I/O error: permission denied".to_string(),
        io::ErrorKind::IsADirectory => "I/O error: is a directory".to_string(),
        _ => format!("I/O error: {}", err),
    }
}

/// Domain-specific error type for cryptstrap.
///
/// The first five variants are the error kinds of the interactive front-end
/// and the step sequencer. `EmptyInput` and `Mismatch` are retried locally
/// by the secret prompt; every other variant is fatal and terminates the run.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum CryptstrapError {
    /// The secret prompt received an empty value.
    #[error("passphrase must not be empty")]
    EmptyInput,

    /// The secret and its confirmation differ.
    #[error("passphrases do not match")]
    Mismatch,

    /// No block device matched the device-name pattern.
    #[error("no eligible block device found (pattern: {pattern})")]
    NoEligibleDevice {
        /// The device-name pattern used to filter `/sys/block`.
        pattern: String,
    },

    /// The operator did not confirm the destructive action.
    #[error("confirmation declined: {action}")]
    DeclinedConfirmation {
        /// Description of the action that was declined.
        action: String,
    },

    /// A provisioning step failed; the remaining steps were not attempted.
    ///
    /// Completed steps are not rolled back.
    #[error("provisioning step '{step}' failed")]
    StepFailure {
        /// Name of the failing step.
        step: String,
        /// The underlying error reported by the step action.
        #[source]
        cause: Box<dyn std::error::Error + Send + Sync + 'static>,
    },

    /// A validation constraint was violated.
    #[error("validation error: {0}")]
    Validation(String),

    /// A configuration file could not be loaded or parsed.
    #[error("configuration error: {0}")]
    Config(String),

    /// A command execution failed (non-zero exit, spawn failure, wait failure, etc.).
    #[error("command execution failed: {command}: {status}")]
    Execution {
        /// The command that was executed, without its stdin payload.
        command: String,
        /// Human-readable reason for the failure.
        status: String,
    },

    /// A command could not be resolved in `PATH`.
    #[error("command not found in PATH: {command}")]
    CommandNotFound {
        /// The command name that was looked up.
        command: String,
    },

    /// The runtime environment cannot host an installation.
    #[error("preflight check failed: {0}")]
    Preflight(String),

    /// An interactive terminal operation failed.
    #[error("terminal error: {0}")]
    Terminal(String),

    /// An I/O operation failed with contextual information.
    #[error("{context}: {message}")]
    Io {
        /// What was being done when the error occurred.
        context: String,
        /// Human-readable description derived from [`io_error_kind_message`].
        message: String,
        /// The underlying I/O error, preserved for programmatic inspection.
        #[source]
        source: std::io::Error,
    },
}

impl CryptstrapError {
    /// Creates an `Io` variant with the `message` field automatically derived
    /// from the `source` via [`io_error_kind_message`].
    pub(crate) fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            message: io_error_kind_message(&source),
            source,
        }
    }

    /// Creates a `StepFailure` from the step name and the action's error.
    pub(crate) fn step_failure(step: impl Into<String>, cause: anyhow::Error) -> Self {
        Self::StepFailure {
            step: step.into(),
            cause: cause.into(),
        }
    }

    /// Returns true for the error kinds the secret prompt retries locally.
    pub fn is_retryable_input(&self) -> bool {
        matches!(self, Self::EmptyInput | Self::Mismatch)
    }
}

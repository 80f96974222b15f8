//! Real command executor implementation.
//!
//! This module provides [`RealCommandExecutor`], which executes commands
//! using `std::process::Command` with real-time output streaming.

use std::io::Write;
use std::process::{Child, Command, Stdio};
use std::thread;
use std::thread::JoinHandle;

use anyhow::{Context, Result};
use which::which;

use super::pipe::{OutputStream, forward_output, panic_message};
use super::{CommandExecutor, CommandSpec, ExecutionResult};
use crate::error::CryptstrapError;

/// Cleans up a child process and its associated reader threads.
///
/// Kills the child process, waits for it to terminate, and joins all
/// reader threads. Called from error paths in
/// [`RealCommandExecutor::execute()`].
fn cleanup_child_process<I>(child: &mut Child, handles: I)
where
    I: IntoIterator<Item = JoinHandle<()>>,
{
    let pid = child.id();
    if let Err(e) = child.kill() {
        tracing::debug!(pid = pid, "kill returned error (process may have already exited): {}", e);
    }
    if let Err(e) = child.wait() {
        tracing::warn!(pid = pid, "failed to wait for child process after kill: {}", e);
    }
    for handle in handles {
        if let Err(e) = handle.join() {
            tracing::warn!("reader thread panicked during cleanup: {}", panic_message(&*e));
        }
    }
}

fn execution_error(spec: &CommandSpec, status: String) -> anyhow::Error {
    CryptstrapError::Execution {
        command: spec.display(),
        status,
    }
    .into()
}

/// Command executor that runs actual system commands.
///
/// When `dry_run` is true, commands are logged but not executed,
/// and `execute()` returns `Ok(ExecutionResult { status: None })`.
pub struct RealCommandExecutor {
    pub dry_run: bool,
}

impl CommandExecutor for RealCommandExecutor {
    fn execute(&self, spec: &CommandSpec) -> Result<ExecutionResult> {
        if self.dry_run {
            match &spec.stdin {
                Some(payload) => {
                    tracing::info!("dry run: {} (stdin: {:?})", spec.display(), payload)
                }
                None => tracing::info!("dry run: {}", spec.display()),
            }
            return Ok(ExecutionResult { status: None });
        }

        let (program, args) = spec.resolved_command();
        let cmd = which(&program).map_err(|_| CryptstrapError::CommandNotFound {
            command: program.clone(),
        })?;
        tracing::trace!("command found: {}: {}", program, cmd.to_string_lossy());

        let mut command = Command::new(cmd);
        command.args(&args);

        command.stdin(if spec.stdin.is_some() {
            Stdio::piped()
        } else {
            Stdio::null()
        });
        command.stdout(Stdio::piped());
        command.stderr(Stdio::piped());

        let mut child = command
            .spawn()
            .with_context(|| format!("failed to spawn command `{}`", spec.display()))?;

        tracing::trace!("spawned command: {}: pid={}", program, child.id());

        let stdin_pipe = child.stdin.take();
        let stdout_pipe = child.stdout.take();
        let stderr_pipe = child.stderr.take();

        let stdout_program = spec.command.clone();
        let stdout_handle = match thread::Builder::new()
            .name("stdout-reader".to_string())
            .spawn(move || {
                forward_output(&stdout_program, OutputStream::Stdout, stdout_pipe);
            })
        {
            Ok(handle) => handle,
            Err(e) => {
                cleanup_child_process(&mut child, []);
                return Err(execution_error(
                    spec,
                    format!("failed to spawn stdout reader thread: {}", e),
                ));
            }
        };

        let stderr_program = spec.command.clone();
        let stderr_handle = match thread::Builder::new()
            .name("stderr-reader".to_string())
            .spawn(move || {
                forward_output(&stderr_program, OutputStream::Stderr, stderr_pipe);
            })
        {
            Ok(handle) => handle,
            Err(e) => {
                cleanup_child_process(&mut child, [stdout_handle]);
                return Err(execution_error(
                    spec,
                    format!("failed to spawn stderr reader thread: {}", e),
                ));
            }
        };

        // The pipe is closed when `stdin` drops so the child sees EOF.
        if let (Some(payload), Some(mut stdin)) = (spec.stdin.as_ref(), stdin_pipe) {
            let written = stdin
                .write_all(payload.as_bytes())
                .and_then(|()| stdin.flush());
            drop(stdin);
            if let Err(e) = written {
                cleanup_child_process(&mut child, [stdout_handle, stderr_handle]);
                return Err(execution_error(spec, format!("failed to write stdin: {}", e)));
            }
        }

        let status = match child.wait() {
            Ok(s) => s,
            Err(e) => {
                cleanup_child_process(&mut child, [stdout_handle, stderr_handle]);
                return Err(execution_error(spec, format!("failed to wait for command: {}", e)));
            }
        };

        let mut panicked_streams = Vec::new();
        let handles = [("stdout", stdout_handle), ("stderr", stderr_handle)];
        for (name, handle) in handles {
            if let Err(e) = handle.join() {
                let msg = panic_message(&*e);
                tracing::error!(stream = name, panic = msg, "reader thread panicked");
                panicked_streams.push(format!("{}: {}", name, msg));
            }
        }

        if !panicked_streams.is_empty() {
            return Err(execution_error(
                spec,
                format!(
                    "reader thread(s) panicked during command execution: {}",
                    panicked_streams.join(", ")
                ),
            ));
        }

        tracing::trace!("executed command: {}: success={}", program, status.success());

        Ok(ExecutionResult {
            status: Some(status),
        })
    }
}

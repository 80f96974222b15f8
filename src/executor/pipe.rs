//! Forwarding of collaborator output to the log.
//!
//! Every line a child writes (sgdisk, pacstrap, mkinitcpio, ...) becomes one
//! `tracing` event tagged with the program name: stdout at INFO, stderr at
//! WARN. Progress bars redraw with a bare `\r`, so each redraw counts as a
//! line of its own and blank segments are dropped.

use std::io::{BufRead, BufReader, Read};

use strum::Display;

/// Which pipe of the child a line came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "lowercase")]
pub(super) enum OutputStream {
    Stdout,
    Stderr,
}

/// Extracts a human-readable message from a thread panic payload.
pub(super) fn panic_message(err: &(dyn std::any::Any + Send)) -> &str {
    if let Some(message) = err.downcast_ref::<&str>() {
        *message
    } else if let Some(message) = err.downcast_ref::<String>() {
        message.as_str()
    } else {
        "unknown panic"
    }
}

/// Logs `pipe` line by line until EOF and returns the number of lines logged.
///
/// Read errors end forwarding early but never fail the command; success is
/// decided by the exit status alone.
pub(super) fn forward_output<R: Read>(
    program: &str,
    stream: OutputStream,
    pipe: Option<R>,
) -> usize {
    let Some(pipe) = pipe else {
        tracing::error!(command = program, %stream, "pipe was not captured, output is lost");
        return 0;
    };

    let mut reader = BufReader::new(pipe);
    let mut buf = Vec::new();
    let mut logged = 0;

    loop {
        buf.clear();
        match reader.read_until(b'\n', &mut buf) {
            Ok(0) => break,
            Ok(_) => {
                for segment in buf.split(|b| *b == b'\n' || *b == b'\r') {
                    if emit(program, stream, segment) {
                        logged += 1;
                    }
                }
            }
            Err(e) => {
                tracing::error!(command = program, %stream, error = %e, "failed to read output");
                break;
            }
        }
    }
    logged
}

fn emit(program: &str, stream: OutputStream, segment: &[u8]) -> bool {
    let text = String::from_utf8_lossy(segment);
    let text = text.trim_end();
    if text.is_empty() {
        return false;
    }
    match stream {
        OutputStream::Stdout => tracing::info!(command = program, "{}", text),
        OutputStream::Stderr => tracing::warn!(command = program, "{}", text),
    }
    true
}

//! Masked double-entry passphrase prompt.
//!
//! A passphrase is accepted only after it has been typed twice, non-empty
//! and identical both times. The accepted value lives in a [`SecretInput`]
//! whose memory is zeroized when dropped; its only legitimate exit from the
//! process is a command's stdin, via [`SecretInput::to_stdin_payload`].

use std::fmt;

use zeroize::Zeroizing;

use super::Terminal;
use crate::error::CryptstrapError;
use crate::executor::StdinPayload;

const ENTER_PROMPT: &str = "Enter disk encryption passphrase";
const CONFIRM_PROMPT: &str = "Confirm disk encryption passphrase";

/// A passphrase confirmed by double entry.
///
/// Values of this type only come out of [`read_confirmed_secret`], so holding
/// one means the confirmation already happened.
pub struct SecretInput {
    value: Zeroizing<String>,
}

impl SecretInput {
    /// Returns the passphrase.
    pub fn expose(&self) -> &str {
        &self.value
    }

    /// Copies the passphrase into a payload for a command's stdin.
    ///
    /// No trailing newline is added: with `--key-file -` cryptsetup uses
    /// every byte it reads as key material.
    pub fn to_stdin_payload(&self) -> StdinPayload {
        StdinPayload::new(self.value.as_bytes())
    }
}

impl fmt::Debug for SecretInput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SecretInput(<redacted>)")
    }
}

fn terminal(err: anyhow::Error) -> CryptstrapError {
    CryptstrapError::Terminal(format!("{:#}", err))
}

/// Reads the passphrase twice with echo disabled.
///
/// Fails with `EmptyInput` when the first entry is empty and with `Mismatch`
/// when the entries differ; in both cases a message is shown and the
/// caller starts over. Terminal failures are returned as `Terminal`.
pub fn read_confirmed_secret(term: &dyn Terminal) -> Result<SecretInput, CryptstrapError> {
    let first = term.read_secret(ENTER_PROMPT).map_err(terminal)?;
    if first.is_empty() {
        term.notice("Passphrase must not be empty, please try again.").map_err(terminal)?;
        return Err(CryptstrapError::EmptyInput);
    }

    let second = term.read_secret(CONFIRM_PROMPT).map_err(terminal)?;
    if *first != *second {
        term.notice("Passphrases do not match, please try again.").map_err(terminal)?;
        return Err(CryptstrapError::Mismatch);
    }

    Ok(SecretInput { value: first })
}

/// Prompts until a confirmed passphrase is entered.
///
/// There is no attempt limit. Only `EmptyInput` and `Mismatch` restart the
/// prompt; any other error is returned.
pub fn prompt_secret(term: &dyn Terminal) -> Result<SecretInput, CryptstrapError> {
    let mut attempt = 1_u32;
    loop {
        match read_confirmed_secret(term) {
            Ok(secret) => {
                tracing::debug!("passphrase confirmed after {} attempt(s)", attempt);
                return Ok(secret);
            }
            Err(e) if e.is_retryable_input() => {
                tracing::debug!("passphrase attempt {} rejected: {}", attempt, e);
                attempt += 1;
            }
            Err(e) => return Err(e),
        }
    }
}

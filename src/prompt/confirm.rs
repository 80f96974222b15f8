//! Yes/no gate in front of destructive actions.

use super::Terminal;
use crate::error::CryptstrapError;

/// Responses that count as consent, after trimming and case folding.
pub const AFFIRMATIVE: [&str; 2] = ["y", "yes"];

/// Returns true if `response` is an affirmative answer.
pub fn is_affirmative(response: &str) -> bool {
    let normalized = response.trim().to_lowercase();
    AFFIRMATIVE.contains(&normalized.as_str())
}

/// Shows `description`, asks once, and reports whether the operator agreed.
///
/// Anything other than an affirmative answer, empty input included, is a
/// refusal. There is no reprompt.
pub fn confirm(term: &dyn Terminal, description: &str) -> Result<bool, CryptstrapError> {
    term.notice(description)
        .and_then(|()| term.read_line("Proceed? [y/N]"))
        .map(|response| is_affirmative(&response))
        .map_err(|e| CryptstrapError::Terminal(format!("{:#}", e)))
}

/// Like [`confirm`], but a refusal is returned as `DeclinedConfirmation`.
///
/// Callers propagate that error straight to `main`, which exits without
/// running anything else.
pub fn require_confirmation(term: &dyn Terminal, description: &str) -> Result<(), CryptstrapError> {
    if confirm(term, description)? {
        tracing::info!("destructive action confirmed");
        Ok(())
    } else {
        Err(CryptstrapError::DeclinedConfirmation {
            action: description.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_affirmative_tokens() {
        for response in ["Y", "yes", "YES", "y", " yes\n", "Yes"] {
            assert!(is_affirmative(response), "{:?} should be affirmative", response);
        }
    }

    #[test]
    fn test_non_affirmative_tokens() {
        for response in ["n", "no", "", "maybe", "yess", "ye", "y e s"] {
            assert!(!is_affirmative(response), "{:?} should not be affirmative", response);
        }
    }
}

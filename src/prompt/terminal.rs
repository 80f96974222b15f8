//! Terminal abstraction for interactive prompts.

use anyhow::Result;
use dialoguer::console::Term;
use dialoguer::theme::ColorfulTheme;
use dialoguer::{Input, Password, Select};
use zeroize::Zeroizing;

use crate::error::CryptstrapError;

/// Interactive terminal used by the prompts.
///
/// Implementations must never echo or log what `read_secret` returns.
pub trait Terminal {
    /// Reads one line of visible input. Empty input is allowed.
    fn read_line(&self, prompt: &str) -> Result<String>;

    /// Reads one line with echo disabled. Empty input is allowed.
    fn read_secret(&self, prompt: &str) -> Result<Zeroizing<String>>;

    /// Shows a numbered menu and returns the chosen index.
    ///
    /// Invalid input is reprompted until a valid entry is chosen.
    fn select(&self, prompt: &str, items: &[String]) -> Result<usize>;

    /// Prints a user-facing message.
    fn notice(&self, message: &str) -> Result<()>;
}

fn terminal_error(err: dialoguer::Error) -> CryptstrapError {
    CryptstrapError::Terminal(err.to_string())
}

/// [`Terminal`] backed by `dialoguer` on the controlling terminal.
pub struct DialoguerTerminal {
    theme: ColorfulTheme,
}

impl DialoguerTerminal {
    pub fn new() -> Self {
        Self {
            theme: ColorfulTheme::default(),
        }
    }
}

impl Default for DialoguerTerminal {
    fn default() -> Self {
        Self::new()
    }
}

impl Terminal for DialoguerTerminal {
    fn read_line(&self, prompt: &str) -> Result<String> {
        let line = Input::<String>::with_theme(&self.theme)
            .with_prompt(prompt)
            .allow_empty(true)
            .interact_text()
            .map_err(terminal_error)?;
        Ok(line)
    }

    fn read_secret(&self, prompt: &str) -> Result<Zeroizing<String>> {
        let secret = Password::with_theme(&self.theme)
            .with_prompt(prompt)
            .allow_empty_password(true)
            .interact()
            .map_err(terminal_error)?;
        Ok(Zeroizing::new(secret))
    }

    fn select(&self, prompt: &str, items: &[String]) -> Result<usize> {
        let index = Select::with_theme(&self.theme)
            .with_prompt(prompt)
            .items(items)
            .default(0)
            .interact()
            .map_err(terminal_error)?;
        Ok(index)
    }

    fn notice(&self, message: &str) -> Result<()> {
        Term::stderr()
            .write_line(message)
            .map_err(|e| CryptstrapError::Terminal(e.to_string()))?;
        Ok(())
    }
}

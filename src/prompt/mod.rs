//! Interactive front-end of an installation run.
//!
//! - [`Terminal`]: the I/O seam used by every prompt
//! - [`DialoguerTerminal`]: production implementation backed by `dialoguer`
//! - [`secret`]: masked double-entry passphrase prompt
//! - [`confirm`]: the yes/no gate in front of destructive actions

pub mod confirm;
pub mod secret;
mod terminal;

pub use confirm::{confirm, is_affirmative, require_confirmation};
pub use secret::{SecretInput, prompt_secret, read_confirmed_secret};
pub use terminal::{DialoguerTerminal, Terminal};

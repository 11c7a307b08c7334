//! Operator-facing output and confirmations.
//!
//! - [`UserInterface`] trait, implemented by [`TerminalUI`],
//!   [`NonInteractiveUI`] and [`MockUI`]
//! - [`confirm_action`] for destructive steps
//! - Spinners while waiting on grace windows
//!
//! # Example
//!
//! ```
//! use tether::ui::{create_ui, OutputMode, UserInterface};
//!
//! let mut ui = create_ui(false, OutputMode::Quiet);
//! ui.success("Service started");
//! ```

pub mod mock;
pub mod non_interactive;
pub mod output;
pub mod prompts;
pub mod spinner;
pub mod terminal;
pub mod theme;

pub use mock::{MockSpinner, MockUI};
pub use non_interactive::NonInteractiveUI;
pub use output::OutputMode;
pub use prompts::{confirm_action, prompt_confirm};
pub use spinner::ProgressSpinner;
pub use terminal::{create_ui, TerminalUI};
pub use theme::{should_use_colors, TetherTheme};

use crate::error::Result;

/// Everything commands say to the operator goes through this trait.
pub trait UserInterface {
    fn output_mode(&self) -> OutputMode;

    fn message(&mut self, msg: &str);

    fn success(&mut self, msg: &str);

    fn warning(&mut self, msg: &str);

    fn error(&mut self, msg: &str);

    /// Ask a yes/no question. The default answer is always "no".
    fn confirm(&mut self, confirmation: &Confirmation) -> Result<bool>;

    fn start_spinner(&mut self, message: &str) -> Box<dyn SpinnerHandle>;

    fn show_header(&mut self, title: &str);

    /// A follow-up the operator can run.
    fn show_hint(&mut self, hint: &str);

    /// Machine-readable output, printed regardless of output mode.
    fn emit_json(&mut self, json: &str);

    fn is_interactive(&self) -> bool;
}

/// Handle for a running spinner.
pub trait SpinnerHandle {
    fn set_message(&mut self, msg: &str);

    fn finish_success(&mut self, msg: &str);

    fn finish_error(&mut self, msg: &str);

    /// Finished, but not cleanly.
    fn finish_warning(&mut self, msg: &str);
}

/// A yes/no question about a destructive action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Confirmation {
    /// Stable key, used for `TETHER_PROMPT_<KEY>` overrides.
    pub key: String,
    pub question: String,
}

impl Confirmation {
    pub fn new(key: impl Into<String>, question: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            question: question.into(),
        }
    }

    /// Environment variable that answers this confirmation.
    pub fn env_key(&self) -> String {
        let key: String = self
            .key
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() {
                    c.to_ascii_uppercase()
                } else {
                    '_'
                }
            })
            .collect();
        format!("TETHER_PROMPT_{}", key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn env_key_is_uppercased() {
        let c = Confirmation::new("terminate-foreign", "Terminate?");
        assert_eq!(c.env_key(), "TETHER_PROMPT_TERMINATE_FOREIGN");
    }

    #[test]
    fn env_key_replaces_punctuation() {
        let c = Confirmation::new("install.plan", "Install?");
        assert_eq!(c.env_key(), "TETHER_PROMPT_INSTALL_PLAN");
    }
}

//! UI for pipes, CI and other contexts without a terminal.

use std::collections::HashMap;

use crate::error::Result;

use super::{Confirmation, OutputMode, SpinnerHandle, UserInterface};

/// Plain-text UI that never blocks on input.
///
/// Confirmations are answered only by `TETHER_PROMPT_<KEY>` variables;
/// anything else is "no".
pub struct NonInteractiveUI {
    mode: OutputMode,
    env_overrides: HashMap<String, String>,
}

impl NonInteractiveUI {
    pub fn new(mode: OutputMode) -> Self {
        let env_overrides = std::env::vars()
            .filter(|(k, _)| k.starts_with("TETHER_PROMPT_"))
            .collect();
        Self {
            mode,
            env_overrides,
        }
    }

    /// Use explicit overrides instead of the process environment.
    pub fn with_overrides(mode: OutputMode, overrides: HashMap<String, String>) -> Self {
        Self {
            mode,
            env_overrides: overrides,
        }
    }
}

fn is_affirmative(value: &str) -> bool {
    matches!(
        value.trim().to_lowercase().as_str(),
        "y" | "yes" | "true" | "1"
    )
}

impl UserInterface for NonInteractiveUI {
    fn output_mode(&self) -> OutputMode {
        self.mode
    }

    fn message(&mut self, msg: &str) {
        if self.mode.shows_status() {
            println!("{}", msg);
        }
    }

    fn success(&mut self, msg: &str) {
        if self.mode.shows_status() {
            println!("✓ {}", msg);
        }
    }

    fn warning(&mut self, msg: &str) {
        eprintln!("⚠ {}", msg);
    }

    fn error(&mut self, msg: &str) {
        eprintln!("✗ {}", msg);
    }

    fn confirm(&mut self, confirmation: &Confirmation) -> Result<bool> {
        let env_key = confirmation.env_key();
        if let Some(value) = self.env_overrides.get(&env_key) {
            let answer = is_affirmative(value);
            tracing::debug!("{}={} answers '{}'", env_key, value, confirmation.key);
            return Ok(answer);
        }

        eprintln!(
            "⚠ {} (not confirmed: no terminal; pass --yes or set {}=yes)",
            confirmation.question, env_key
        );
        Ok(false)
    }

    fn start_spinner(&mut self, message: &str) -> Box<dyn SpinnerHandle> {
        if self.mode.shows_spinners() {
            println!("{}", message);
        }
        Box::new(LineSpinner { mode: self.mode })
    }

    fn show_header(&mut self, title: &str) {
        if self.mode.shows_status() {
            println!("{}", title);
        }
    }

    fn show_hint(&mut self, hint: &str) {
        if self.mode.shows_status() {
            println!("→ {}", hint);
        }
    }

    fn emit_json(&mut self, json: &str) {
        println!("{}", json);
    }

    fn is_interactive(&self) -> bool {
        false
    }
}

/// Prints only the final line.
struct LineSpinner {
    mode: OutputMode,
}

impl SpinnerHandle for LineSpinner {
    fn set_message(&mut self, _msg: &str) {}

    fn finish_success(&mut self, msg: &str) {
        if self.mode.shows_status() {
            println!("✓ {}", msg);
        }
    }

    fn finish_error(&mut self, msg: &str) {
        eprintln!("✗ {}", msg);
    }

    fn finish_warning(&mut self, msg: &str) {
        eprintln!("⚠ {}", msg);
    }
}

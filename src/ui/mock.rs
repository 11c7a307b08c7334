//! Recording UI for tests.
//!
//! # Example
//!
//! ```
//! use tether::ui::{Confirmation, MockUI, UserInterface};
//!
//! let mut ui = MockUI::new();
//! ui.set_confirm_response("terminate_foreign", true);
//!
//! let answer = ui
//!     .confirm(&Confirmation::new("terminate_foreign", "Terminate?"))
//!     .unwrap();
//! assert!(answer);
//! assert_eq!(ui.prompts_shown(), &["terminate_foreign".to_string()]);
//! ```

use std::collections::HashMap;

use crate::error::Result;

use super::{Confirmation, OutputMode, SpinnerHandle, UserInterface};

/// Captures everything shown and answers confirmations from a table.
///
/// Unconfigured confirmations answer "no".
#[derive(Debug, Default)]
pub struct MockUI {
    mode: OutputMode,
    interactive: bool,
    messages: Vec<String>,
    successes: Vec<String>,
    warnings: Vec<String>,
    errors: Vec<String>,
    headers: Vec<String>,
    hints: Vec<String>,
    json: Vec<String>,
    spinners: Vec<String>,
    confirm_responses: HashMap<String, bool>,
    prompts_shown: Vec<String>,
}

impl MockUI {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_mode(mode: OutputMode) -> Self {
        Self {
            mode,
            ..Default::default()
        }
    }

    pub fn set_confirm_response(&mut self, key: &str, answer: bool) {
        self.confirm_responses.insert(key.to_string(), answer);
    }

    pub fn set_interactive(&mut self, interactive: bool) {
        self.interactive = interactive;
    }

    pub fn messages(&self) -> &[String] {
        &self.messages
    }

    pub fn successes(&self) -> &[String] {
        &self.successes
    }

    pub fn warnings(&self) -> &[String] {
        &self.warnings
    }

    pub fn errors(&self) -> &[String] {
        &self.errors
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn hints(&self) -> &[String] {
        &self.hints
    }

    /// JSON documents emitted.
    pub fn json(&self) -> &[String] {
        &self.json
    }

    /// Spinner start messages plus their final lines.
    pub fn spinners(&self) -> &[String] {
        &self.spinners
    }

    /// Keys of confirmations asked.
    pub fn prompts_shown(&self) -> &[String] {
        &self.prompts_shown
    }

    pub fn has_message(&self, msg: &str) -> bool {
        self.messages.iter().any(|m| m.contains(msg))
    }

    pub fn has_success(&self, msg: &str) -> bool {
        self.successes.iter().any(|m| m.contains(msg))
    }

    pub fn has_warning(&self, msg: &str) -> bool {
        self.warnings.iter().any(|m| m.contains(msg))
    }

    pub fn has_error(&self, msg: &str) -> bool {
        self.errors.iter().any(|m| m.contains(msg))
    }

    pub fn has_hint(&self, msg: &str) -> bool {
        self.hints.iter().any(|m| m.contains(msg))
    }
}

impl UserInterface for MockUI {
    fn output_mode(&self) -> OutputMode {
        self.mode
    }

    fn message(&mut self, msg: &str) {
        self.messages.push(msg.to_string());
    }

    fn success(&mut self, msg: &str) {
        self.successes.push(msg.to_string());
    }

    fn warning(&mut self, msg: &str) {
        self.warnings.push(msg.to_string());
    }

    fn error(&mut self, msg: &str) {
        self.errors.push(msg.to_string());
    }

    fn confirm(&mut self, confirmation: &Confirmation) -> Result<bool> {
        self.prompts_shown.push(confirmation.key.clone());
        Ok(self
            .confirm_responses
            .get(&confirmation.key)
            .copied()
            .unwrap_or(false))
    }

    fn start_spinner(&mut self, message: &str) -> Box<dyn SpinnerHandle> {
        self.spinners.push(message.to_string());
        Box::new(MockSpinner::default())
    }

    fn show_header(&mut self, title: &str) {
        self.headers.push(title.to_string());
    }

    fn show_hint(&mut self, hint: &str) {
        self.hints.push(hint.to_string());
    }

    fn emit_json(&mut self, json: &str) {
        self.json.push(json.to_string());
    }

    fn is_interactive(&self) -> bool {
        self.interactive
    }
}

/// Spinner that remembers how it finished.
#[derive(Debug, Default)]
pub struct MockSpinner {
    pub message: String,
    pub finished: Option<String>,
}

impl SpinnerHandle for MockSpinner {
    fn set_message(&mut self, msg: &str) {
        self.message = msg.to_string();
    }

    fn finish_success(&mut self, msg: &str) {
        self.finished = Some(format!("success: {}", msg));
    }

    fn finish_error(&mut self, msg: &str) {
        self.finished = Some(format!("error: {}", msg));
    }

    fn finish_warning(&mut self, msg: &str) {
        self.finished = Some(format!("warning: {}", msg));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn captures_output() {
        let mut ui = MockUI::new();
        ui.message("hello");
        ui.success("done");
        ui.warning("careful");
        ui.error("broken");
        ui.show_hint("tether setup");
        ui.emit_json("{}");

        assert!(ui.has_message("hello"));
        assert!(ui.has_success("done"));
        assert!(ui.has_warning("careful"));
        assert!(ui.has_error("broken"));
        assert!(ui.has_hint("setup"));
        assert_eq!(ui.json(), &["{}".to_string()]);
    }

    #[test]
    fn unconfigured_confirm_is_no() {
        let mut ui = MockUI::new();
        let c = Confirmation::new("anything", "?");
        assert!(!ui.confirm(&c).unwrap());
        assert_eq!(ui.prompts_shown().len(), 1);
    }

    #[test]
    fn spinner_records_finish() {
        let mut spinner = MockSpinner::default();
        spinner.finish_warning("pending");
        assert_eq!(spinner.finished.as_deref(), Some("warning: pending"));
    }

    #[test]
    fn mode_and_interactivity() {
        let mut ui = MockUI::with_mode(OutputMode::Verbose);
        assert_eq!(ui.output_mode(), OutputMode::Verbose);
        assert!(!ui.is_interactive());
        ui.set_interactive(true);
        assert!(ui.is_interactive());
    }
}

//! Styling.

use console::Style;

/// Colors used by the terminal UI.
#[derive(Debug, Clone)]
pub struct TetherTheme {
    pub success: Style,
    pub warning: Style,
    pub error: Style,
    pub dim: Style,
    pub highlight: Style,
    pub header: Style,
    pub hint: Style,
    /// Service state names.
    pub state: Style,
}

impl Default for TetherTheme {
    fn default() -> Self {
        Self::new()
    }
}

impl TetherTheme {
    pub fn new() -> Self {
        Self {
            success: Style::new().green(),
            warning: Style::new().yellow(),
            error: Style::new().red().bold(),
            dim: Style::new().dim(),
            highlight: Style::new().bold(),
            header: Style::new().bold().cyan(),
            hint: Style::new().cyan().dim(),
            state: Style::new().bold(),
        }
    }

    /// No styling, for pipes and `--no-color`.
    pub fn plain() -> Self {
        Self {
            success: Style::new(),
            warning: Style::new(),
            error: Style::new(),
            dim: Style::new(),
            highlight: Style::new(),
            header: Style::new(),
            hint: Style::new(),
            state: Style::new(),
        }
    }

    /// Pick based on [`should_use_colors`].
    pub fn detect() -> Self {
        if should_use_colors() {
            Self::new()
        } else {
            Self::plain()
        }
    }

    pub fn format_success(&self, msg: &str) -> String {
        format!("{}", self.success.apply_to(format!("✓ {}", msg)))
    }

    pub fn format_warning(&self, msg: &str) -> String {
        format!("{}", self.warning.apply_to(format!("⚠ {}", msg)))
    }

    pub fn format_error(&self, msg: &str) -> String {
        format!("{}", self.error.apply_to(format!("✗ {}", msg)))
    }

    pub fn format_header(&self, title: &str) -> String {
        format!("{}", self.header.apply_to(title))
    }

    pub fn format_hint(&self, hint: &str) -> String {
        format!("{}", self.hint.apply_to(format!("→ {}", hint)))
    }
}

/// Colors are off under `NO_COLOR` or when stdout is not a terminal.
pub fn should_use_colors() -> bool {
    if std::env::var_os("NO_COLOR").is_some() {
        return false;
    }
    console::Term::stdout().is_term()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_theme_has_icons() {
        let theme = TetherTheme::plain();
        assert_eq!(theme.format_success("Started"), "✓ Started");
        assert_eq!(theme.format_warning("Slow"), "⚠ Slow");
        assert_eq!(theme.format_error("Failed"), "✗ Failed");
        assert_eq!(theme.format_hint("tether setup"), "→ tether setup");
    }

    #[test]
    fn plain_header_is_unstyled() {
        assert_eq!(TetherTheme::plain().format_header("Status"), "Status");
    }
}

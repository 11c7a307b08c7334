//! Confirmations.

use console::Term;
use dialoguer::Confirm;

use crate::error::{Result, TetherError};

use super::{Confirmation, UserInterface};

fn map_dialoguer_err(e: dialoguer::Error) -> TetherError {
    TetherError::Io(e.into())
}

/// Ask on the terminal, defaulting to "no".
pub fn prompt_confirm(confirmation: &Confirmation, term: &Term) -> Result<bool> {
    Confirm::new()
        .with_prompt(&confirmation.question)
        .default(false)
        .interact_on(term)
        .map_err(map_dialoguer_err)
}

/// Answer a confirmation, honoring `--yes`.
pub fn confirm_action(
    ui: &mut dyn UserInterface,
    assume_yes: bool,
    confirmation: &Confirmation,
) -> Result<bool> {
    if assume_yes {
        tracing::debug!("Confirmation '{}' answered by --yes", confirmation.key);
        return Ok(true);
    }
    ui.confirm(confirmation)
}

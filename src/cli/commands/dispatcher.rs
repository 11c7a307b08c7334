//! Command dispatching.
//!
//! - [`Command`] trait for implementing commands
//! - [`CommandResult`] for uniform result reporting
//! - [`CommandDispatcher`] for routing CLI subcommands

use crate::cli::args::{Cli, Commands, StatusArgs};
use crate::cli::exit_codes;
use crate::error::Result;
use crate::ui::UserInterface;

use super::context::CommandContext;

/// A CLI subcommand.
pub trait Command {
    fn execute(&self, ui: &mut dyn UserInterface) -> Result<CommandResult>;
}

/// Result of command execution.
#[derive(Debug, PartialEq, Eq)]
pub struct CommandResult {
    pub success: bool,
    /// Process exit code.
    pub exit_code: i32,
}

impl CommandResult {
    pub fn success() -> Self {
        Self {
            success: true,
            exit_code: exit_codes::SUCCESS,
        }
    }

    pub fn failure(exit_code: i32) -> Self {
        Self {
            success: false,
            exit_code,
        }
    }

    /// Nothing to do because the service is already in the requested state.
    pub fn already_in_state() -> Self {
        Self::failure(exit_codes::ALREADY_IN_STATE)
    }
}

/// Routes subcommands to their implementations.
pub struct CommandDispatcher {
    context: CommandContext,
}

impl CommandDispatcher {
    pub fn new(context: CommandContext) -> Self {
        Self { context }
    }

    pub fn dispatch(&self, cli: &Cli, ui: &mut dyn UserInterface) -> Result<CommandResult> {
        let ctx = self.context.clone();
        match &cli.command {
            Some(Commands::Start(args)) => {
                super::start::StartCommand::new(ctx, args.clone()).execute(ui)
            }
            Some(Commands::Stop(args)) => {
                super::stop::StopCommand::new(ctx, args.clone()).execute(ui)
            }
            Some(Commands::Status(args)) => {
                super::status::StatusCommand::new(ctx, args.clone()).execute(ui)
            }
            Some(Commands::Check(args)) => {
                super::check::CheckCommand::new(ctx, args.clone()).execute(ui)
            }
            Some(Commands::Install(args)) => {
                super::install::InstallCommand::new(ctx, args.clone()).execute(ui)
            }
            Some(Commands::Setup(args)) => {
                super::setup::SetupCommand::new(ctx, args.clone()).execute(ui)
            }
            None => super::status::StatusCommand::new(ctx, StatusArgs::default()).execute(ui),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ui::MockUI;
    use clap::Parser;
    use tempfile::TempDir;

    #[test]
    fn command_result_codes() {
        assert_eq!(CommandResult::success().exit_code, 0);
        assert_eq!(CommandResult::failure(4).exit_code, 4);
        assert!(!CommandResult::already_in_state().success);
        assert_eq!(CommandResult::already_in_state().exit_code, 3);
    }

    #[test]
    fn no_subcommand_shows_status() {
        let temp = TempDir::new().unwrap();
        let cli = Cli::try_parse_from(["tether"]).unwrap();
        let mut ctx = CommandContext::new(temp.path());
        ctx.port = Some(crate::cli::commands::context::free_port());
        let dispatcher = CommandDispatcher::new(ctx);
        let mut ui = MockUI::new();

        let result = dispatcher.dispatch(&cli, &mut ui).unwrap();
        assert!(result.success);
        assert!(ui.has_message("STOPPED"));
    }
}

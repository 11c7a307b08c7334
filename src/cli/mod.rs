//! Command-line interface for tether.
//!
//! - [`args`] - Argument definitions using clap derive macros
//! - [`commands`] - Command implementations
//! - [`exit_codes`] - Stable process exit codes

pub mod args;
pub mod commands;
pub mod exit_codes;

pub use args::{
    CheckArgs, Cli, Commands, InstallArgs, SetupArgs, StartArgs, StatusArgs, StopArgs,
};
pub use commands::{Command, CommandContext, CommandDispatcher, CommandResult};

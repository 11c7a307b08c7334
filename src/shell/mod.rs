//! Shell command execution and host privilege checks.

pub mod command;
pub mod platform;

pub use command::{execute, shell_quote, CommandOptions, CommandResult, CommandRunner, ShellRunner};
pub use platform::{is_ci, is_elevated, sudo_available, Privilege};

//! CLI command implementations.
//!
//! Each command implements the [`Command`] trait and is routed by
//! [`CommandDispatcher`]. Commands share a [`CommandContext`] holding the
//! project root and global overrides.

pub mod check;
pub mod context;
pub mod dispatcher;
pub mod install;
pub mod setup;
pub mod start;
pub mod status;
pub mod stop;

pub use context::CommandContext;
pub use dispatcher::{Command, CommandDispatcher, CommandResult};

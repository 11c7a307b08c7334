//! Error types for tether operations.
//!
//! This module defines [`TetherError`], the primary error type used throughout
//! the application, and a [`Result`] type alias for convenience.
//!
//! # Error Handling Strategy
//!
//! - Use `TetherError` for domain-specific errors that need distinct handling
//! - Use `anyhow::Error` (via `TetherError::Other`) for unexpected errors
//! - All errors should provide actionable messages for operators
//! - Every variant maps to a stable process exit code via [`TetherError::exit_code`]

use std::path::PathBuf;
use thiserror::Error;

use crate::cli::exit_codes;

/// Core error type for tether operations.
#[derive(Debug, Error)]
pub enum TetherError {
    /// Configuration file exists but could not be read as YAML.
    #[error("Failed to parse config at {path}: {message}")]
    ConfigParseError { path: PathBuf, message: String },

    /// Invalid configuration structure or values.
    #[error("Invalid configuration: {message}")]
    ConfigValidationError { message: String },

    /// A system prerequisite is absent.
    #[error("Missing dependency '{name}': {remediation}")]
    DependencyMissing { name: String, remediation: String },

    /// An install step needs root and neither root nor non-interactive sudo is available.
    #[error("Elevated privileges required. Re-run as root or run manually:\n{commands}")]
    PrivilegeRequired { commands: String },

    /// An install plan was executed without operator consent.
    #[error("Install plan has not been confirmed; re-run with --yes or answer the prompt")]
    PlanNotConfirmed,

    /// The operator declined a destructive action.
    #[error("Declined: {action}")]
    ConfirmationDeclined { action: String },

    /// Runtime environment creation or activation failed.
    #[error("Environment error at {path}: {message}")]
    EnvironmentError { path: PathBuf, message: String },

    /// Runtime environment has not been built (or was left incomplete).
    #[error("Environment not ready at {path}. Run 'tether setup' first.")]
    EnvironmentMissing { path: PathBuf },

    /// The configured port is held by a process that is not this service.
    #[error(
        "Port {port} is held by an unrelated process ({owner}). Stop it or change service.port."
    )]
    PortConflict { port: u16, owner: String },

    /// The service process exited inside the post-launch grace window.
    #[error("Service process {pid} exited during startup. Last log lines:\n{log_tail}")]
    ProcessLaunchFailure { pid: u32, log_tail: String },

    /// PID file refers to a dead or unrelated process.
    #[error("Stale PID file {path} (pid {pid:?}): {reason}")]
    StaleState {
        path: PathBuf,
        pid: Option<u32>,
        reason: String,
    },

    /// Another invocation holds the PID file lock.
    #[error("Service is already starting (lock held at {path})")]
    AlreadyStarting { path: PathBuf },

    /// Shell command failed.
    #[error("Command failed with exit code {code:?}: {command}")]
    CommandFailed { command: String, code: Option<i32> },

    /// IO error wrapper.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic wrapped error for anyhow interop.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl TetherError {
    /// Process exit code for this error.
    pub fn exit_code(&self) -> i32 {
        match self {
            TetherError::AlreadyStarting { .. } => exit_codes::ALREADY_IN_STATE,
            TetherError::PortConflict { .. } => exit_codes::PORT_CONFLICT,
            TetherError::EnvironmentMissing { .. } => exit_codes::MISSING_ENVIRONMENT,
            _ => exit_codes::FAILURE,
        }
    }
}

/// Result type alias for tether operations.
pub type Result<T> = std::result::Result<T, TetherError>;

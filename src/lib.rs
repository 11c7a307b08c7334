//! Tether - provision and supervise a single local Python web service.
//!
//! Tether checks host prerequisites, builds an isolated interpreter
//! environment, and keeps exactly one instance of the service running
//! on its configured port.
//!
//! # Modules
//!
//! - [`cli`] - Command-line interface and argument parsing
//! - [`config`] - Configuration loading, merging, and validation
//! - [`environment`] - Virtual environment creation and package install
//! - [`error`] - Error types and result aliases
//! - [`requirements`] - Prerequisite probing and install planning
//! - [`shell`] - Shell command execution
//! - [`supervisor`] - Service start, stop and status
//! - [`ui`] - Prompts, spinners, and terminal output
//!
//! # Example
//!
//! ```
//! use tether::environment::Manifest;
//!
//! let manifest = Manifest::parse("fastapi==0.110.0\n# dev\n--index-url https://pypi.org/simple\n");
//! assert_eq!(manifest.entries.len(), 1);
//! assert_eq!(manifest.entries[0].spec(), "fastapi==0.110.0");
//! ```

pub mod cli;
pub mod config;
pub mod environment;
pub mod error;
pub mod requirements;
pub mod shell;
pub mod supervisor;
pub mod ui;

pub use error::{Result, TetherError};

//! Configuration loading, parsing, and validation for tether.
//!
//! - Schema definitions in [`schema`]
//! - File discovery and loading in [`loader`]
//! - Deep merging in [`merger`]
//! - Validation in [`validator`]
//!
//! # Example
//!
//! ```
//! use tether::config::{load_merged_config, validate};
//! use tempfile::TempDir;
//! use std::fs;
//!
//! let temp = TempDir::new().unwrap();
//! let dir = temp.path().join(".tether");
//! fs::create_dir_all(&dir).unwrap();
//! fs::write(dir.join("config.yml"), "service:\n  port: 8080\n").unwrap();
//!
//! let config = load_merged_config(temp.path()).unwrap();
//! validate(&config).unwrap();
//! assert_eq!(config.service.port, 8080);
//! ```
//!
//! # Configuration File Locations
//!
//! 1. Built-in defaults
//! 2. Project config (`.tether/config.yml`)
//! 3. Local overrides (`.tether/config.local.yml`)

pub mod loader;
pub mod merger;
pub mod schema;
pub mod validator;

pub use loader::{
    find_project_root, load_config, load_config_value, load_merged_config, parse_config,
    ConfigPaths, CONFIG_DIR,
};
pub use merger::{deep_merge, merge_configs};
pub use schema::{EnvironmentConfig, RequirementsConfig, ServiceConfig, TetherConfig, Timings};
pub use validator::{validate, validate_config, ValidationError};

//! Isolated runtime environment for the supervised service.
//!
//! - [`builder`] - virtual environment creation, package install, import checks
//! - [`manifest`] - `requirements.txt` parsing

pub mod builder;
pub mod manifest;

pub use builder::{
    interpreter_path, is_ready, EnvironmentBuilder, PackageResult, VerifyResult, COMPLETE_MARKER,
};
pub use manifest::{Manifest, ManifestEntry};

//! System prerequisite detection and installation.
//!
//! # Modules
//!
//! - [`registry`] - The fixed requirement catalog and package manager commands
//! - [`checker`] - [`DependencyProbe`], read-only host inspection
//! - [`planner`] - [`InstallPlanner`] and plan execution
//! - [`host`] - The [`Host`] seam over the machine being inspected
//! - [`status`] - Per-requirement probe results
//! - [`probe`] - PATH lookup helpers
//! - [`version`] - Version parsing

pub mod checker;
pub mod host;
pub mod planner;
pub mod probe;
pub mod registry;
pub mod status;
pub mod version;

pub use checker::DependencyProbe;
pub use host::{Host, OsRelease, SystemHost};
pub use planner::{execute, InstallPlan, InstallPlanner, PackageSpec, PlannedCommand};
pub use registry::{PackageManager, PackageSource, Requirement, RequirementRegistry, Tier};
pub use status::DependencyCheckResult;
pub use version::Version;

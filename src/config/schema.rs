//! Configuration schema definitions for tether.
//!
//! This module contains the struct definitions that map to
//! `.tether/config.yml`. Every section and key has a default, so an absent
//! file describes the reference deployment.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Root configuration structure for `.tether/config.yml`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TetherConfig {
    /// The supervised service.
    pub service: ServiceConfig,

    /// The isolated runtime environment.
    pub environment: EnvironmentConfig,

    /// System prerequisites.
    pub requirements: RequirementsConfig,

    /// Grace windows and polling.
    pub timings: Timings,
}

/// Settings for the supervised service process.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    /// Display name.
    pub name: String,

    /// Script run by the environment's interpreter, relative to the project root.
    pub entrypoint: PathBuf,

    /// Extra arguments after the entrypoint.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub args: Vec<String>,

    /// TCP port the service listens on.
    pub port: u16,

    /// Host used for the liveness probe.
    pub host: String,

    /// Path of the liveness endpoint.
    pub health_path: String,

    /// Log file receiving the service's stdout and stderr.
    pub log_path: PathBuf,

    /// PID file location.
    pub pid_file: PathBuf,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            name: "vendor-rates-service".to_string(),
            entrypoint: PathBuf::from("main.py"),
            args: Vec::new(),
            port: 63400,
            host: "127.0.0.1".to_string(),
            health_path: "/api/vendorRates/health".to_string(),
            log_path: PathBuf::from("logs/vendor-rates-service.log"),
            pid_file: PathBuf::from(".tether/service.pid"),
        }
    }
}

impl ServiceConfig {
    /// URL polled to decide liveness.
    pub fn health_url(&self) -> String {
        let path = if self.health_path.starts_with('/') {
            self.health_path.clone()
        } else {
            format!("/{}", self.health_path)
        };
        format!("http://{}:{}{}", self.host, self.port, path)
    }
}

/// Settings for the Python virtual environment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EnvironmentConfig {
    /// Environment directory, relative to the project root.
    pub path: PathBuf,

    /// Interpreter used to create the environment.
    pub python: String,

    /// Package manifest, relative to the project root.
    pub manifest: PathBuf,

    /// Modules that must import cleanly after installation.
    pub critical_imports: Vec<String>,
}

impl Default for EnvironmentConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("venv"),
            python: "python3".to_string(),
            manifest: PathBuf::from("requirements.txt"),
            critical_imports: ["fastapi", "uvicorn", "sqlalchemy", "pyodbc"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }
}

/// Settings for system prerequisite checks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RequirementsConfig {
    /// ODBC driver name the service is configured to use.
    pub odbc_driver: String,

    /// Drivers that also work but need the service's driver setting changed.
    pub odbc_alternatives: Vec<String>,

    /// Minimum interpreter version.
    pub min_python: String,
}

impl Default for RequirementsConfig {
    fn default() -> Self {
        Self {
            odbc_driver: "ODBC Driver 17 for SQL Server".to_string(),
            odbc_alternatives: vec!["ODBC Driver 18 for SQL Server".to_string()],
            min_python: "3.8".to_string(),
        }
    }
}

/// Bounded waits used by the supervisor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Timings {
    /// Seconds to wait for a launched process to become live.
    pub launch_grace_secs: u64,

    /// Seconds to wait after SIGTERM before SIGKILL.
    pub stop_grace_secs: u64,

    /// Polling interval for both grace windows.
    pub poll_interval_ms: u64,
}

impl Default for Timings {
    fn default() -> Self {
        Self {
            launch_grace_secs: 10,
            stop_grace_secs: 10,
            poll_interval_ms: 250,
        }
    }
}

impl TetherConfig {
    /// Resolve a configured path against the project root.
    pub fn resolve(project_root: &Path, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            project_root.join(path)
        }
    }
}

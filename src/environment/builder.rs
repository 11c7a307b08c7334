//! Python virtual environment creation and package installation.

use crate::environment::manifest::{Manifest, ManifestEntry};
use crate::error::{Result, TetherError};
use crate::shell::{shell_quote, CommandOptions, CommandRunner};
use std::fs;
use std::path::{Path, PathBuf};

/// File written once the environment's interpreter has been verified.
pub const COMPLETE_MARKER: &str = ".tether-complete";

/// Interpreter inside an environment directory.
pub fn interpreter_path(env_dir: &Path) -> PathBuf {
    env_dir.join("bin").join("python")
}

/// Whether `env_dir` holds a fully built environment.
pub fn is_ready(env_dir: &Path) -> bool {
    interpreter_path(env_dir).is_file() && env_dir.join(COMPLETE_MARKER).is_file()
}

/// Outcome of installing one manifest entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageResult {
    pub entry: ManifestEntry,
    pub success: bool,
    /// Last line of pip's output on failure.
    pub message: Option<String>,
}

/// Outcome of importing one critical module.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifyResult {
    pub module: String,
    pub success: bool,
    pub message: Option<String>,
}

/// Builds the isolated runtime environment.
pub struct EnvironmentBuilder<'a> {
    path: PathBuf,
    python: String,
    runner: &'a dyn CommandRunner,
}

impl<'a> EnvironmentBuilder<'a> {
    /// Builder for the environment at `path`, created with `python`.
    pub fn new(path: &Path, python: &str, runner: &'a dyn CommandRunner) -> Self {
        Self {
            path: path.to_path_buf(),
            python: python.to_string(),
            runner,
        }
    }

    /// Environment directory.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The environment's own interpreter.
    pub fn interpreter(&self) -> PathBuf {
        interpreter_path(&self.path)
    }

    /// Create the environment.
    ///
    /// An existing directory (complete or partial) is only replaced when
    /// `recreate` is set. The completion marker is written last.
    pub fn create_environment(&self, recreate: bool) -> Result<()> {
        if self.path.exists() {
            if !recreate {
                let state = if is_ready(&self.path) {
                    "already exists"
                } else {
                    "exists but is incomplete"
                };
                return Err(TetherError::EnvironmentError {
                    path: self.path.clone(),
                    message: format!("environment {}; confirm recreation to replace it", state),
                });
            }
            tracing::info!("Removing existing environment at {}", self.path.display());
            fs::remove_dir_all(&self.path)?;
        }

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let command = format!(
            "{} -m venv {}",
            shell_quote(&self.python),
            shell_quote(&self.path.to_string_lossy())
        );
        let result = self.runner.run(&command, &CommandOptions::captured())?;
        if !result.success {
            return Err(TetherError::EnvironmentError {
                path: self.path.clone(),
                message: format!(
                    "'{}' failed: {}",
                    command,
                    result.last_line().unwrap_or("no output")
                ),
            });
        }

        let version = self.verify_interpreter()?;
        let marker = format!(
            "created_at: {}\npython: {}\n",
            chrono::Utc::now().to_rfc3339(),
            version
        );
        let marker_path = self.path.join(COMPLETE_MARKER);
        let temp_path = marker_path.with_extension("tmp");
        fs::write(&temp_path, marker)?;
        fs::rename(&temp_path, &marker_path)?;

        tracing::info!("Environment ready at {} ({})", self.path.display(), version);
        Ok(())
    }

    fn verify_interpreter(&self) -> Result<String> {
        let interpreter = self.interpreter();
        if !interpreter.is_file() {
            return Err(TetherError::EnvironmentError {
                path: self.path.clone(),
                message: format!("interpreter {} was not created", interpreter.display()),
            });
        }

        let result = self.runner.run(
            &format!("{} --version", shell_quote(&interpreter.to_string_lossy())),
            &CommandOptions::captured(),
        )?;
        if !result.success {
            return Err(TetherError::EnvironmentError {
                path: self.path.clone(),
                message: format!("interpreter {} does not run", interpreter.display()),
            });
        }
        Ok(format!("{}{}", result.stdout, result.stderr).trim().to_string())
    }

    /// Install every manifest entry with the environment's pip.
    ///
    /// Entries are installed one at a time; a failure is recorded and the
    /// next entry is still attempted.
    pub fn install_packages(
        &self,
        manifest: &Manifest,
        on_package: &mut dyn FnMut(&ManifestEntry),
    ) -> Vec<PackageResult> {
        let interpreter = shell_quote(&self.interpreter().to_string_lossy());

        manifest
            .entries
            .iter()
            .map(|entry| {
                on_package(entry);
                let command = format!(
                    "{} -m pip install --disable-pip-version-check {}",
                    interpreter,
                    shell_quote(&entry.spec())
                );
                match self.runner.run(&command, &CommandOptions::captured()) {
                    Ok(result) if result.success => PackageResult {
                        entry: entry.clone(),
                        success: true,
                        message: None,
                    },
                    Ok(result) => {
                        tracing::warn!("pip install {} failed", entry.spec());
                        PackageResult {
                            entry: entry.clone(),
                            success: false,
                            message: result.last_line().map(str::to_string),
                        }
                    }
                    Err(e) => PackageResult {
                        entry: entry.clone(),
                        success: false,
                        message: Some(e.to_string()),
                    },
                }
            })
            .collect()
    }

    /// Import each module with the environment's interpreter.
    pub fn verify(&self, modules: &[String]) -> Vec<VerifyResult> {
        let interpreter = shell_quote(&self.interpreter().to_string_lossy());

        modules
            .iter()
            .map(|module| {
                let command = format!(
                    "{} -c {}",
                    interpreter,
                    shell_quote(&format!("import {}", module))
                );
                match self.runner.run(&command, &CommandOptions::captured()) {
                    Ok(result) if result.success => VerifyResult {
                        module: module.clone(),
                        success: true,
                        message: None,
                    },
                    Ok(result) => VerifyResult {
                        module: module.clone(),
                        success: false,
                        message: result.last_line().map(str::to_string),
                    },
                    Err(e) => VerifyResult {
                        module: module.clone(),
                        success: false,
                        message: Some(e.to_string()),
                    },
                }
            })
            .collect()
    }
}

//! Configuration validation rules.
//!
//! - The port must be non-zero
//! - The entrypoint and health path must be set
//! - Grace windows must be positive and longer than the poll interval
//! - The minimum interpreter version must parse

use crate::config::schema::TetherConfig;
use crate::error::{Result, TetherError};
use crate::requirements::version::Version;

/// Validation error with context.
#[derive(Debug, Clone)]
pub struct ValidationError {
    /// Rule identifier
    pub rule: String,
    /// Human-readable error message
    pub message: String,
    /// Dotted config key the error refers to
    pub key: String,
}

impl ValidationError {
    fn new(rule: &str, key: &str, message: impl Into<String>) -> Self {
        Self {
            rule: rule.to_string(),
            message: message.into(),
            key: key.to_string(),
        }
    }
}

/// Validate a configuration and return all errors.
///
/// Collects every error rather than stopping at the first one.
pub fn validate_config(config: &TetherConfig) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    let service = &config.service;
    if service.port == 0 {
        errors.push(ValidationError::new(
            "invalid-port",
            "service.port",
            "service.port must be between 1 and 65535",
        ));
    }
    if service.entrypoint.as_os_str().is_empty() {
        errors.push(ValidationError::new(
            "missing-entrypoint",
            "service.entrypoint",
            "service.entrypoint must name the script to run",
        ));
    }
    if service.health_path.trim().is_empty() {
        errors.push(ValidationError::new(
            "missing-health-path",
            "service.health_path",
            "service.health_path must not be empty",
        ));
    }
    if service.pid_file.as_os_str().is_empty() {
        errors.push(ValidationError::new(
            "missing-pid-file",
            "service.pid_file",
            "service.pid_file must not be empty",
        ));
    }

    if config.environment.path.as_os_str().is_empty() {
        errors.push(ValidationError::new(
            "missing-environment-path",
            "environment.path",
            "environment.path must not be empty",
        ));
    }

    if Version::parse(&config.requirements.min_python).is_none() {
        errors.push(ValidationError::new(
            "invalid-version",
            "requirements.min_python",
            format!(
                "requirements.min_python '{}' is not a version like 3.8",
                config.requirements.min_python
            ),
        ));
    }

    let timings = &config.timings;
    if timings.poll_interval_ms == 0 {
        errors.push(ValidationError::new(
            "invalid-interval",
            "timings.poll_interval_ms",
            "timings.poll_interval_ms must be greater than 0",
        ));
    }
    for (key, secs) in [
        ("timings.launch_grace_secs", timings.launch_grace_secs),
        ("timings.stop_grace_secs", timings.stop_grace_secs),
    ] {
        if secs == 0 {
            errors.push(ValidationError::new(
                "invalid-grace",
                key,
                format!("{} must be at least 1 second", key),
            ));
        } else if secs * 1000 < timings.poll_interval_ms {
            errors.push(ValidationError::new(
                "grace-shorter-than-poll",
                key,
                format!("{} is shorter than timings.poll_interval_ms", key),
            ));
        }
    }

    errors
}

/// Validate configuration, returning an error if invalid.
///
/// # Errors
///
/// Returns `ConfigValidationError` if any validation rules fail.
pub fn validate(config: &TetherConfig) -> Result<()> {
    let errors = validate_config(config);

    if errors.is_empty() {
        Ok(())
    } else {
        let messages: Vec<_> = errors.iter().map(|e| e.message.clone()).collect();
        Err(TetherError::ConfigValidationError {
            message: messages.join("; "),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn defaults_are_valid() {
        assert!(validate_config(&TetherConfig::default()).is_empty());
        assert!(validate(&TetherConfig::default()).is_ok());
    }

    #[test]
    fn zero_port_rejected() {
        let mut config = TetherConfig::default();
        config.service.port = 0;
        let errors = validate_config(&config);
        assert!(errors.iter().any(|e| e.rule == "invalid-port"));
    }

    #[test]
    fn empty_entrypoint_rejected() {
        let mut config = TetherConfig::default();
        config.service.entrypoint = PathBuf::new();
        let errors = validate_config(&config);
        assert!(errors.iter().any(|e| e.key == "service.entrypoint"));
    }

    #[test]
    fn bad_min_python_rejected() {
        let mut config = TetherConfig::default();
        config.requirements.min_python = "three".to_string();
        let errors = validate_config(&config);
        assert!(errors.iter().any(|e| e.rule == "invalid-version"));
    }

    #[test]
    fn zero_grace_rejected() {
        let mut config = TetherConfig::default();
        config.timings.stop_grace_secs = 0;
        let errors = validate_config(&config);
        assert!(errors
            .iter()
            .any(|e| e.key == "timings.stop_grace_secs" && e.rule == "invalid-grace"));
    }

    #[test]
    fn poll_longer_than_grace_rejected() {
        let mut config = TetherConfig::default();
        config.timings.poll_interval_ms = 20_000;
        let errors = validate_config(&config);
        assert_eq!(
            errors
                .iter()
                .filter(|e| e.rule == "grace-shorter-than-poll")
                .count(),
            2
        );
    }

    #[test]
    fn collects_all_errors() {
        let mut config = TetherConfig::default();
        config.service.port = 0;
        config.service.health_path = String::new();
        config.timings.poll_interval_ms = 0;
        assert_eq!(validate_config(&config).len(), 3);
    }

    #[test]
    fn validate_joins_messages() {
        let mut config = TetherConfig::default();
        config.service.port = 0;
        config.service.health_path = " ".to_string();
        let err = validate(&config).unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("service.port"));
        assert!(msg.contains("service.health_path"));
    }
}

//! Result of probing a single prerequisite.

use serde::Serialize;

/// Outcome of checking one system prerequisite.
///
/// Recomputed on every probe; never cached or persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DependencyCheckResult {
    /// Requirement name from the catalog.
    pub name: String,
    /// Whether the service cannot run without it.
    pub required: bool,
    /// Whether it was found (possibly via an acceptable alternative).
    pub present: bool,
    /// Detected version, if the tool reports one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    /// What the operator should do when it is missing.
    pub remediation: String,
    /// Set when an alternative satisfied the requirement.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub caveat: Option<String>,
}

impl DependencyCheckResult {
    /// A requirement that was found.
    pub fn present(name: &str, required: bool, version: Option<String>) -> Self {
        Self {
            name: name.to_string(),
            required,
            present: true,
            version,
            remediation: String::new(),
            caveat: None,
        }
    }

    /// A requirement that was not found.
    pub fn missing(name: &str, required: bool, remediation: impl Into<String>) -> Self {
        Self {
            name: name.to_string(),
            required,
            present: false,
            version: None,
            remediation: remediation.into(),
            caveat: None,
        }
    }

    /// Attach a version to the result.
    pub fn with_version(mut self, version: Option<String>) -> Self {
        self.version = version;
        self
    }

    /// Attach a caveat to a present result.
    pub fn with_caveat(mut self, caveat: impl Into<String>) -> Self {
        self.caveat = Some(caveat.into());
        self
    }

    /// Whether the check blocks the service from running.
    pub fn is_blocking(&self) -> bool {
        self.required && !self.present
    }
}

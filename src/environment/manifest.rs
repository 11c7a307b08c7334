//! `requirements.txt`-style package manifests.

use crate::error::{Result, TetherError};
use regex::Regex;
use std::path::Path;
use std::sync::LazyLock;

static RE_REQUIREMENT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([A-Za-z0-9][A-Za-z0-9._-]*(?:\[[^\]]*\])?)\s*(.*)$").unwrap()
});

/// One declared package.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManifestEntry {
    /// Distribution name, including extras (`uvicorn[standard]`).
    pub name: String,
    /// Version specifier and environment marker, verbatim (`>=0.100; python_version >= "3.8"`).
    pub constraint: String,
}

impl ManifestEntry {
    /// The requirement string handed to pip.
    pub fn spec(&self) -> String {
        if self.constraint.is_empty() {
            self.name.clone()
        } else if self.constraint.starts_with(';') {
            format!("{} {}", self.name, self.constraint)
        } else {
            format!("{}{}", self.name, self.constraint)
        }
    }
}

/// Ordered list of declared packages.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Manifest {
    pub entries: Vec<ManifestEntry>,
}

impl Manifest {
    /// Read and parse a manifest file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| TetherError::EnvironmentError {
            path: path.to_path_buf(),
            message: format!("cannot read package manifest: {}", e),
        })?;
        Ok(Self::parse(&content))
    }

    /// Parse manifest text.
    ///
    /// Skips blank lines, comments and pip options (`-r`, `--index-url`).
    /// Joins backslash continuations.
    pub fn parse(content: &str) -> Self {
        let mut entries = Vec::new();
        let mut pending = String::new();

        for raw in content.lines() {
            if let Some(stripped) = raw.trim_end().strip_suffix('\\') {
                pending.push_str(stripped);
                pending.push(' ');
                continue;
            }
            pending.push_str(raw);
            let line = std::mem::take(&mut pending);

            if let Some(entry) = parse_line(&line) {
                entries.push(entry);
            }
        }
        if let Some(entry) = parse_line(&pending) {
            entries.push(entry);
        }

        Self { entries }
    }

    /// Whether nothing is declared.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn parse_line(line: &str) -> Option<ManifestEntry> {
    // Inline comments need preceding whitespace; `#` may appear in URLs.
    let line = match line.find(" #") {
        Some(idx) => &line[..idx],
        None => line,
    };
    let line = line.trim();

    if line.is_empty() || line.starts_with('#') || line.starts_with('-') {
        return None;
    }

    match RE_REQUIREMENT.captures(line) {
        Some(caps) => Some(ManifestEntry {
            name: caps[1].to_string(),
            constraint: caps[2].trim().to_string(),
        }),
        None => Some(ManifestEntry {
            name: line.to_string(),
            constraint: String::new(),
        }),
    }
}

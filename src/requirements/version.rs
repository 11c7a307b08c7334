//! Version extraction from tool output.

use regex::Regex;
use std::fmt;
use std::sync::LazyLock;

static RE_VERSION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d+)\.(\d+)(?:\.(\d+))?").unwrap());

/// A dotted numeric version (`major.minor[.patch]`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Version {
    pub major: u32,
    pub minor: u32,
    pub patch: u32,
}

impl Version {
    /// Parse the first version-looking token in `text`.
    ///
    /// Accepts bare versions (`3.8`) and tool banners (`Python 3.10.12`,
    /// `pip 23.0.1 from /usr/lib/python3/dist-packages/pip (python 3.11)`).
    pub fn parse(text: &str) -> Option<Self> {
        let caps = RE_VERSION.captures(text)?;
        Some(Self {
            major: caps[1].parse().ok()?,
            minor: caps[2].parse().ok()?,
            patch: caps
                .get(3)
                .map(|m| m.as_str().parse())
                .transpose()
                .ok()?
                .unwrap_or(0),
        })
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

/// Extract a version string from command output, as written by the tool.
pub fn extract_version(output: &str) -> Option<String> {
    RE_VERSION
        .find(output)
        .map(|m| m.as_str().to_string())
}

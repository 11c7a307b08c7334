//! Read-only view of the host used by the probe and planner.

use crate::requirements::probe::{parse_system_path, resolve_tool_path};
use crate::shell::{CommandOptions, CommandResult, CommandRunner, ShellRunner};
use std::path::{Path, PathBuf};

/// Host introspection used when checking prerequisites.
///
/// Every method must be free of side effects on the host.
pub trait Host {
    /// Run a query command and capture its output.
    ///
    /// Returns `None` if the command could not be spawned.
    fn query(&self, command: &str) -> Option<CommandResult>;

    /// Resolve a tool on PATH.
    fn find_executable(&self, tool: &str) -> Option<PathBuf>;

    /// Read a text file, `None` if unreadable.
    fn read_file(&self, path: &Path) -> Option<String>;

    /// Whether a path exists.
    fn path_exists(&self, path: &Path) -> bool;
}

/// The real machine.
pub struct SystemHost {
    runner: ShellRunner,
    path: Vec<PathBuf>,
}

impl SystemHost {
    /// Snapshot PATH and build a host view.
    pub fn new() -> Self {
        Self {
            runner: ShellRunner,
            path: parse_system_path(),
        }
    }
}

impl Default for SystemHost {
    fn default() -> Self {
        Self::new()
    }
}

impl Host for SystemHost {
    fn query(&self, command: &str) -> Option<CommandResult> {
        self.runner.run(command, &CommandOptions::captured()).ok()
    }

    fn find_executable(&self, tool: &str) -> Option<PathBuf> {
        resolve_tool_path(tool, &self.path)
    }

    fn read_file(&self, path: &Path) -> Option<String> {
        std::fs::read_to_string(path).ok()
    }

    fn path_exists(&self, path: &Path) -> bool {
        path.exists()
    }
}

/// Parsed `/etc/os-release`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OsRelease {
    /// `ID`, e.g. `ubuntu`, `debian`, `rhel`.
    pub id: String,
    /// `ID_LIKE` entries.
    pub id_like: Vec<String>,
    /// `VERSION_ID`, e.g. `22.04`, `12`, `9.3`.
    pub version_id: String,
}

impl OsRelease {
    /// Path of the os-release file.
    pub const PATH: &'static str = "/etc/os-release";

    /// Read os-release from the host.
    pub fn detect(host: &dyn Host) -> Option<Self> {
        host.read_file(Path::new(Self::PATH))
            .map(|content| Self::parse(&content))
    }

    /// Parse `KEY=value` lines, stripping optional quotes.
    pub fn parse(content: &str) -> Self {
        let mut release = Self::default();
        for line in content.lines() {
            let Some((key, value)) = line.split_once('=') else {
                continue;
            };
            let value = value.trim().trim_matches('"').trim_matches('\'');
            match key.trim() {
                "ID" => release.id = value.to_string(),
                "ID_LIKE" => {
                    release.id_like = value.split_whitespace().map(str::to_string).collect()
                }
                "VERSION_ID" => release.version_id = value.to_string(),
                _ => {}
            }
        }
        release
    }

    /// Whether the distribution is or derives from `family`.
    pub fn is_like(&self, family: &str) -> bool {
        self.id == family || self.id_like.iter().any(|f| f == family)
    }

    /// Major component of `VERSION_ID`.
    pub fn major_version(&self) -> &str {
        self.version_id
            .split('.')
            .next()
            .unwrap_or(&self.version_id)
    }
}

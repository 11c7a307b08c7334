//! PATH lookup helpers.
//!
//! Tools are resolved by walking PATH entries directly rather than shelling
//! out to `which`, whose behaviour varies across systems.

use std::path::{Path, PathBuf};

/// Check whether a file has executable permission bits set.
#[cfg(unix)]
pub fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;
    path.metadata()
        .map(|m| m.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}

#[cfg(not(unix))]
pub fn is_executable(_path: &Path) -> bool {
    true
}

/// Resolve a tool's binary path by iterating over PATH entries.
///
/// Returns the first match that exists and is executable.
pub fn resolve_tool_path(tool: &str, path_entries: &[PathBuf]) -> Option<PathBuf> {
    if tool.contains('/') {
        let candidate = PathBuf::from(tool);
        return (candidate.is_file() && is_executable(&candidate)).then_some(candidate);
    }

    for dir in path_entries {
        let candidate = dir.join(tool);
        if candidate.is_file() && is_executable(&candidate) {
            return Some(candidate);
        }
    }
    None
}

/// Parse the system PATH environment variable into a list of directories.
///
/// `/usr/sbin` and `/sbin` are appended when missing; package tools such as
/// `odbcinst` are sometimes only installed there and non-root PATHs often
/// omit them.
pub fn parse_system_path() -> Vec<PathBuf> {
    let mut entries: Vec<PathBuf> = std::env::var_os("PATH")
        .map(|path| std::env::split_paths(&path).collect())
        .unwrap_or_default();

    for extra in ["/usr/local/bin", "/usr/bin", "/usr/sbin", "/sbin"] {
        let extra = PathBuf::from(extra);
        if !entries.contains(&extra) {
            entries.push(extra);
        }
    }
    entries
}

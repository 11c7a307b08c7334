//! Exact identification of the supervised process.

use crate::supervisor::process::ProcessInfo;
use std::io;
use std::path::{Component, Path, PathBuf};

/// The `(working_dir, script_path)` tuple that identifies this service.
///
/// A process is this service only if its cwd is exactly `working_dir` and one
/// of its arguments (after argv[0]), resolved against that cwd, is exactly
/// `script_path`. Process names are never matched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceIdentity {
    pub working_dir: PathBuf,
    pub script_path: PathBuf,
}

impl ServiceIdentity {
    /// Build an identity, canonicalising both paths.
    ///
    /// The working directory must exist. A missing script is normalised
    /// lexically so status still works before the service is deployed.
    pub fn new(working_dir: &Path, entrypoint: &Path) -> io::Result<Self> {
        let working_dir = working_dir.canonicalize()?;
        let script = working_dir.join(entrypoint);
        let script_path = script.canonicalize().unwrap_or_else(|_| normalize(&script));
        Ok(Self {
            working_dir,
            script_path,
        })
    }

    /// Whether `process` is an instance of this service.
    pub fn matches(&self, process: &ProcessInfo) -> bool {
        let Some(cwd) = process.cwd.as_deref() else {
            return false;
        };
        if cwd != self.working_dir {
            return false;
        }

        process.cmd.iter().skip(1).any(|arg| {
            if arg.is_empty() || arg.starts_with('-') {
                return false;
            }
            let resolved = normalize(&cwd.join(arg));
            resolved == self.script_path
                || resolved
                    .canonicalize()
                    .is_ok_and(|real| real == self.script_path)
        })
    }
}

/// Resolve `.` and `..` without touching the filesystem.
fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            other => out.push(other),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn service_dir() -> (TempDir, ServiceIdentity) {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("main.py"), "").unwrap();
        let identity = ServiceIdentity::new(temp.path(), Path::new("main.py")).unwrap();
        (temp, identity)
    }

    fn process(cwd: &Path, cmd: &[&str]) -> ProcessInfo {
        ProcessInfo {
            pid: 4242,
            cmd: cmd.iter().map(|s| s.to_string()).collect(),
            cwd: Some(cwd.to_path_buf()),
            alive: true,
        }
    }

    #[test]
    fn matches_relative_script_argument() {
        let (_temp, identity) = service_dir();
        let p = process(&identity.working_dir, &["/srv/venv/bin/python", "main.py"]);
        assert!(identity.matches(&p));
    }

    #[test]
    fn matches_dot_slash_and_absolute_forms() {
        let (_temp, identity) = service_dir();
        let dot = process(&identity.working_dir, &["python", "./main.py"]);
        let abs = process(
            &identity.working_dir,
            &["python", identity.script_path.to_str().unwrap()],
        );
        assert!(identity.matches(&dot));
        assert!(identity.matches(&abs));
    }

    #[test]
    fn rejects_other_working_directory() {
        let (_temp, identity) = service_dir();
        let other = TempDir::new().unwrap();
        let p = process(other.path(), &["python", "main.py"]);
        assert!(!identity.matches(&p));
    }

    #[test]
    fn rejects_similar_script_names() {
        let (_temp, identity) = service_dir();
        let p = process(&identity.working_dir, &["python", "main.py.bak"]);
        assert!(!identity.matches(&p));
        let p = process(&identity.working_dir, &["python", "tools/main.py"]);
        assert!(!identity.matches(&p));
    }

    #[test]
    fn ignores_argv0_and_flags() {
        let (_temp, identity) = service_dir();
        let p = process(&identity.working_dir, &["main.py", "--reload"]);
        assert!(!identity.matches(&p));
    }

    #[test]
    fn unknown_cwd_never_matches() {
        let (_temp, identity) = service_dir();
        let p = ProcessInfo {
            cwd: None,
            ..process(&identity.working_dir, &["python", "main.py"])
        };
        assert!(!identity.matches(&p));
    }

    #[test]
    fn missing_script_is_normalized() {
        let temp = TempDir::new().unwrap();
        let identity = ServiceIdentity::new(temp.path(), Path::new("./app/../main.py")).unwrap();
        assert_eq!(identity.script_path, identity.working_dir.join("main.py"));
    }

    #[test]
    fn missing_working_dir_is_error() {
        assert!(ServiceIdentity::new(Path::new("/nonexistent/service"), Path::new("main.py")).is_err());
    }
}

//! Detached process launch.

use crate::error::Result;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Child, Command, Stdio};

/// What to run and where.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaunchSpec {
    pub program: PathBuf,
    pub args: Vec<String>,
    pub cwd: PathBuf,
    /// stdout and stderr are appended here.
    pub log_path: PathBuf,
}

/// A process started by a [`Launcher`].
pub trait LaunchedProcess {
    fn pid(&self) -> u32;

    /// `None` while running, otherwise a description of how it ended.
    fn exited(&mut self) -> Option<String>;
}

/// Starts the service process.
pub trait Launcher {
    fn launch(&self, spec: &LaunchSpec) -> Result<Box<dyn LaunchedProcess>>;
}

/// Spawns a child in its own process group with output sent to the log.
#[derive(Debug, Default, Clone, Copy)]
pub struct ChildLauncher;

struct SpawnedChild(Child);

impl LaunchedProcess for SpawnedChild {
    fn pid(&self) -> u32 {
        self.0.id()
    }

    fn exited(&mut self) -> Option<String> {
        match self.0.try_wait() {
            Ok(Some(status)) => Some(status.to_string()),
            Ok(None) => None,
            Err(e) => Some(format!("wait failed: {}", e)),
        }
    }
}

impl Launcher for ChildLauncher {
    fn launch(&self, spec: &LaunchSpec) -> Result<Box<dyn LaunchedProcess>> {
        if let Some(parent) = spec.log_path.parent() {
            fs::create_dir_all(parent)?;
        }
        let mut log = File::options()
            .create(true)
            .append(true)
            .open(&spec.log_path)?;
        writeln!(
            log,
            "--- tether start {} ---",
            chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
        )?;
        let stderr = log.try_clone()?;

        let mut cmd = Command::new(&spec.program);
        cmd.args(&spec.args)
            .current_dir(&spec.cwd)
            .stdin(Stdio::null())
            .stdout(Stdio::from(log))
            .stderr(Stdio::from(stderr));

        #[cfg(unix)]
        {
            use std::os::unix::process::CommandExt;
            cmd.process_group(0);
        }

        let child = cmd.spawn()?;
        tracing::info!(
            "Launched {} (pid {}) in {}",
            spec.program.display(),
            child.id(),
            spec.cwd.display()
        );
        Ok(Box::new(SpawnedChild(child)))
    }
}

/// The last `count` lines of a log file, or an empty string if unreadable.
pub fn tail_lines(path: &Path, count: usize) -> String {
    let Ok(content) = fs::read_to_string(path) else {
        return String::new();
    };
    let lines: Vec<&str> = content.lines().collect();
    let start = lines.len().saturating_sub(count);
    lines[start..].join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;
    use std::time::{Duration, Instant};
    use tempfile::TempDir;

    fn wait_for_exit(child: &mut Box<dyn LaunchedProcess>) -> String {
        let deadline = Instant::now() + Duration::from_secs(10);
        loop {
            if let Some(status) = child.exited() {
                return status;
            }
            assert!(Instant::now() < deadline, "child did not exit");
            thread::sleep(Duration::from_millis(20));
        }
    }

    #[cfg(unix)]
    #[test]
    fn output_goes_to_log() {
        let temp = TempDir::new().unwrap();
        let spec = LaunchSpec {
            program: PathBuf::from("/bin/sh"),
            args: vec!["-c".into(), "echo out; echo err >&2; pwd".into()],
            cwd: temp.path().to_path_buf(),
            log_path: temp.path().join("logs").join("service.log"),
        };

        let mut child = ChildLauncher.launch(&spec).unwrap();
        assert!(child.pid() > 0);
        wait_for_exit(&mut child);

        let log = fs::read_to_string(&spec.log_path).unwrap();
        assert!(log.starts_with("--- tether start"));
        assert!(log.contains("out"));
        assert!(log.contains("err"));
        let cwd = temp.path().canonicalize().unwrap();
        assert!(log.contains(cwd.to_str().unwrap()));
    }

    #[cfg(unix)]
    #[test]
    fn log_is_appended() {
        let temp = TempDir::new().unwrap();
        let log_path = temp.path().join("service.log");
        fs::write(&log_path, "earlier run\n").unwrap();

        let spec = LaunchSpec {
            program: PathBuf::from("/bin/sh"),
            args: vec!["-c".into(), "echo later".into()],
            cwd: temp.path().to_path_buf(),
            log_path: log_path.clone(),
        };
        let mut child = ChildLauncher.launch(&spec).unwrap();
        wait_for_exit(&mut child);

        let log = fs::read_to_string(&log_path).unwrap();
        assert!(log.starts_with("earlier run\n"));
        assert!(log.trim_end().ends_with("later"));
    }

    #[cfg(unix)]
    #[test]
    fn reports_exit_status() {
        let temp = TempDir::new().unwrap();
        let spec = LaunchSpec {
            program: PathBuf::from("/bin/sh"),
            args: vec!["-c".into(), "exit 3".into()],
            cwd: temp.path().to_path_buf(),
            log_path: temp.path().join("service.log"),
        };
        let mut child = ChildLauncher.launch(&spec).unwrap();
        assert!(wait_for_exit(&mut child).contains('3'));
    }

    #[test]
    fn missing_program_fails() {
        let temp = TempDir::new().unwrap();
        let spec = LaunchSpec {
            program: temp.path().join("venv/bin/python"),
            args: vec![],
            cwd: temp.path().to_path_buf(),
            log_path: temp.path().join("service.log"),
        };
        assert!(ChildLauncher.launch(&spec).is_err());
    }

    #[test]
    fn tail_returns_last_lines() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("log");
        let content: String = (1..=30).map(|i| format!("line {}\n", i)).collect();
        fs::write(&path, content).unwrap();

        let tail = tail_lines(&path, 20);
        assert_eq!(tail.lines().count(), 20);
        assert!(tail.starts_with("line 11"));
        assert!(tail.ends_with("line 30"));
    }

    #[test]
    fn tail_of_missing_file_is_empty() {
        let temp = TempDir::new().unwrap();
        assert_eq!(tail_lines(&temp.path().join("nope"), 20), "");
    }
}

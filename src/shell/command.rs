//! Shell command execution.

use crate::error::{Result, TetherError};
use std::collections::HashMap;
use std::path::PathBuf;
use std::process::{Command, Stdio};
use std::time::{Duration, Instant};

/// Result of executing a shell command.
#[derive(Debug, Clone)]
pub struct CommandResult {
    /// Exit code (None if killed by signal).
    pub exit_code: Option<i32>,

    /// Standard output.
    pub stdout: String,

    /// Standard error.
    pub stderr: String,

    /// Execution duration.
    pub duration: Duration,

    /// Whether command succeeded (exit code 0).
    pub success: bool,
}

impl CommandResult {
    /// Create a success result.
    pub fn success(stdout: String, stderr: String, duration: Duration) -> Self {
        Self {
            exit_code: Some(0),
            stdout,
            stderr,
            duration,
            success: true,
        }
    }

    /// Create a failure result.
    pub fn failure(
        exit_code: Option<i32>,
        stdout: String,
        stderr: String,
        duration: Duration,
    ) -> Self {
        Self {
            exit_code,
            stdout,
            stderr,
            duration,
            success: false,
        }
    }

    /// Last non-empty line of stderr, falling back to stdout.
    ///
    /// pip and apt put the useful part of a failure at the end.
    pub fn last_line(&self) -> Option<&str> {
        self.stderr
            .lines()
            .rev()
            .find(|l| !l.trim().is_empty())
            .or_else(|| self.stdout.lines().rev().find(|l| !l.trim().is_empty()))
            .map(str::trim)
    }
}

/// Options for command execution.
#[derive(Debug, Clone, Default)]
pub struct CommandOptions {
    /// Working directory.
    pub cwd: Option<PathBuf>,

    /// Environment variables (merged with system env).
    pub env: HashMap<String, String>,

    /// Capture stdout (if false, inherits from parent).
    pub capture_stdout: bool,

    /// Capture stderr (if false, inherits from parent).
    pub capture_stderr: bool,
}

impl CommandOptions {
    /// Options that capture both streams.
    pub fn captured() -> Self {
        Self {
            capture_stdout: true,
            capture_stderr: true,
            ..Default::default()
        }
    }
}

/// Something that can run shell commands.
///
/// The installer and environment builder go through this trait so tests can
/// record commands instead of mutating the host.
pub trait CommandRunner {
    /// Run `command` through the shell.
    fn run(&self, command: &str, options: &CommandOptions) -> Result<CommandResult>;

    /// Run a command and return whether it exited 0.
    fn succeeds(&self, command: &str) -> bool {
        self.run(command, &CommandOptions::captured())
            .map(|r| r.success)
            .unwrap_or(false)
    }
}

/// Production runner backed by `/bin/sh -c`.
#[derive(Debug, Default, Clone, Copy)]
pub struct ShellRunner;

impl CommandRunner for ShellRunner {
    fn run(&self, command: &str, options: &CommandOptions) -> Result<CommandResult> {
        execute(command, options)
    }
}

/// Execute a shell command.
///
/// Commands run under a plain non-login `/bin/sh -c` so results do not depend
/// on the operator's interactive shell profile.
pub fn execute(command: &str, options: &CommandOptions) -> Result<CommandResult> {
    let start = Instant::now();

    let mut cmd = Command::new("/bin/sh");
    cmd.arg("-c");
    cmd.arg(command);

    if let Some(cwd) = &options.cwd {
        cmd.current_dir(cwd);
    }

    for (key, value) in &options.env {
        cmd.env(key, value);
    }

    cmd.stdin(Stdio::null());
    if options.capture_stdout {
        cmd.stdout(Stdio::piped());
    } else {
        cmd.stdout(Stdio::inherit());
    }

    if options.capture_stderr {
        cmd.stderr(Stdio::piped());
    } else {
        cmd.stderr(Stdio::inherit());
    }

    tracing::debug!("Executing: {}", command);
    let output = cmd.output().map_err(|_| TetherError::CommandFailed {
        command: command.to_string(),
        code: None,
    })?;

    let duration = start.elapsed();

    let stdout = if options.capture_stdout {
        String::from_utf8_lossy(&output.stdout).to_string()
    } else {
        String::new()
    };

    let stderr = if options.capture_stderr {
        String::from_utf8_lossy(&output.stderr).to_string()
    } else {
        String::new()
    };

    if output.status.success() {
        Ok(CommandResult::success(stdout, stderr, duration))
    } else {
        Ok(CommandResult::failure(
            output.status.code(),
            stdout,
            stderr,
            duration,
        ))
    }
}

/// Quote a single argument for `/bin/sh`.
pub fn shell_quote(arg: &str) -> String {
    if !arg.is_empty()
        && arg
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || "-_./=:@+,".contains(c))
    {
        arg.to_string()
    } else {
        format!("'{}'", arg.replace('\'', "'\\''"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn execute_successful_command() {
        let result = execute("echo hello", &CommandOptions::captured()).unwrap();

        assert!(result.success);
        assert_eq!(result.exit_code, Some(0));
        assert!(result.stdout.contains("hello"));
    }

    #[test]
    fn execute_failing_command() {
        let result = execute("exit 1", &CommandOptions::captured()).unwrap();

        assert!(!result.success);
        assert_eq!(result.exit_code, Some(1));
    }

    #[test]
    fn execute_with_env() {
        let mut options = CommandOptions::captured();
        options
            .env
            .insert("MY_VAR".to_string(), "my_value".to_string());

        let result = execute("echo $MY_VAR", &options).unwrap();

        assert!(result.success);
        assert!(result.stdout.contains("my_value"));
    }

    #[test]
    fn execute_with_cwd() {
        let temp = tempfile::TempDir::new().unwrap();
        let options = CommandOptions {
            cwd: Some(temp.path().to_path_buf()),
            ..CommandOptions::captured()
        };

        let result = execute("pwd", &options).unwrap();

        assert!(result.success);
        assert!(!result.stdout.trim().is_empty());
    }

    #[test]
    fn last_line_prefers_stderr() {
        let result = CommandResult::failure(
            Some(1),
            "Collecting pyodbc\n".to_string(),
            "warning\nERROR: No matching distribution found for pyodbc==99\n\n".to_string(),
            Duration::ZERO,
        );
        assert_eq!(
            result.last_line(),
            Some("ERROR: No matching distribution found for pyodbc==99")
        );
    }

    #[test]
    fn last_line_falls_back_to_stdout() {
        let result =
            CommandResult::failure(Some(1), "only stdout\n".to_string(), String::new(), Duration::ZERO);
        assert_eq!(result.last_line(), Some("only stdout"));
    }

    #[test]
    fn shell_runner_succeeds() {
        assert!(ShellRunner.succeeds("true"));
        assert!(!ShellRunner.succeeds("false"));
    }

    #[test]
    fn shell_quote_leaves_plain_words() {
        assert_eq!(shell_quote("unixodbc-dev"), "unixodbc-dev");
        assert_eq!(shell_quote("/opt/app/venv/bin/python"), "/opt/app/venv/bin/python");
    }

    #[test]
    fn shell_quote_wraps_specials() {
        assert_eq!(shell_quote("fastapi>=0.100"), "'fastapi>=0.100'");
        assert_eq!(shell_quote("it's"), "'it'\\''s'");
        assert_eq!(shell_quote(""), "''");
    }
}

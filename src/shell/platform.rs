//! Host platform checks.

use super::command::CommandRunner;

/// Check if running in a CI environment.
///
/// Used to force non-interactive mode in `main()`. Checks common CI
/// environment variables: `CI`, `GITHUB_ACTIONS`, `GITLAB_CI`, `CIRCLECI`,
/// `TRAVIS`, `JENKINS_URL`.
pub fn is_ci() -> bool {
    std::env::var("CI").is_ok()
        || std::env::var("GITHUB_ACTIONS").is_ok()
        || std::env::var("GITLAB_CI").is_ok()
        || std::env::var("CIRCLECI").is_ok()
        || std::env::var("TRAVIS").is_ok()
        || std::env::var("JENKINS_URL").is_ok()
}

/// Check if running as root.
pub fn is_elevated() -> bool {
    #[cfg(unix)]
    {
        // SAFETY: geteuid() is a simple syscall that returns the effective user ID
        unsafe { libc::geteuid() == 0 }
    }

    #[cfg(not(unix))]
    {
        false
    }
}

/// Check whether `sudo` can be used without a password prompt.
pub fn sudo_available(runner: &dyn CommandRunner) -> bool {
    runner.succeeds("command -v sudo >/dev/null 2>&1 && sudo -n true 2>/dev/null")
}

/// How privileged commands should be run on this host.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Privilege {
    /// Already root; run commands as-is.
    Root,
    /// Prefix commands with `sudo -n`.
    Sudo,
    /// No way to elevate.
    Unavailable,
}

impl Privilege {
    /// Detect the privilege available to this process.
    pub fn detect(runner: &dyn CommandRunner) -> Self {
        if is_elevated() {
            Privilege::Root
        } else if sudo_available(runner) {
            Privilege::Sudo
        } else {
            Privilege::Unavailable
        }
    }

    /// Wrap a command so it runs with elevated rights.
    ///
    /// Returns `None` when elevation is unavailable.
    pub fn wrap(&self, command: &str) -> Option<String> {
        match self {
            Privilege::Root => Some(command.to_string()),
            Privilege::Sudo => Some(format!("sudo -n sh -c {}", super::shell_quote(command))),
            Privilege::Unavailable => None,
        }
    }
}

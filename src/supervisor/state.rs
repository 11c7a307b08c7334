//! Supervisor states and transition outcomes.

use serde::Serialize;
use std::fmt;
use std::path::PathBuf;

/// Who holds the service port.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PortOwnership {
    pub port: u16,
    /// `None` when the owner is not visible to this user.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub owner_pid: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub owner_command: Option<String>,
    /// The owner has this service's identity.
    pub is_self: bool,
}

impl PortOwnership {
    /// Owner description for messages.
    pub fn describe(&self) -> String {
        match (self.owner_pid, &self.owner_command) {
            (Some(pid), Some(cmd)) if !cmd.is_empty() => format!("pid {}: {}", pid, cmd),
            (Some(pid), _) => format!("pid {}", pid),
            (None, _) => "owner not visible to this user".to_string(),
        }
    }
}

/// What the supervisor observed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SupervisorState {
    Stopped,
    /// Another invocation holds the PID file lock.
    Starting,
    Running {
        pid: u32,
    },
    /// PID file present but its process is gone or is something else.
    StalePid {
        pid: Option<u32>,
        reason: String,
    },
    PortConflict(PortOwnership),
    /// The service runs without a PID file tracking it.
    ForeignRunning {
        pid: u32,
    },
}

impl SupervisorState {
    pub fn name(&self) -> &'static str {
        match self {
            SupervisorState::Stopped => "STOPPED",
            SupervisorState::Starting => "STARTING",
            SupervisorState::Running { .. } => "RUNNING",
            SupervisorState::StalePid { .. } => "STALE_PID",
            SupervisorState::PortConflict(_) => "PORT_CONFLICT",
            SupervisorState::ForeignRunning { .. } => "FOREIGN_RUNNING",
        }
    }

    pub fn pid(&self) -> Option<u32> {
        match self {
            SupervisorState::Running { pid } | SupervisorState::ForeignRunning { pid } => Some(*pid),
            SupervisorState::StalePid { pid, .. } => *pid,
            SupervisorState::PortConflict(ownership) => ownership.owner_pid,
            SupervisorState::Stopped | SupervisorState::Starting => None,
        }
    }

    /// Whether a service process is up, tracked or not.
    pub fn is_running(&self) -> bool {
        matches!(
            self,
            SupervisorState::Running { .. } | SupervisorState::ForeignRunning { .. }
        )
    }
}

impl fmt::Display for SupervisorState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Result of `status`.
#[derive(Debug, Clone, Serialize)]
pub struct StatusReport {
    pub state: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pid: Option<u32>,
    pub port: u16,
    /// `None` unless a service process is up.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub healthy: Option<bool>,
    pub health_url: String,
    pub pid_file: PathBuf,
    /// PID file modification time, for a tracked instance.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub started_at: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl StatusReport {
    pub fn new(
        state: &SupervisorState,
        port: u16,
        healthy: Option<bool>,
        health_url: String,
        pid_file: PathBuf,
    ) -> Self {
        let detail = match state {
            SupervisorState::StalePid { reason, .. } => Some(reason.clone()),
            SupervisorState::PortConflict(ownership) => Some(ownership.describe()),
            SupervisorState::ForeignRunning { .. } => {
                Some("running without a PID file".to_string())
            }
            SupervisorState::Starting => Some("another start holds the PID file".to_string()),
            SupervisorState::Stopped | SupervisorState::Running { .. } => None,
        };
        Self {
            state: state.name().to_string(),
            pid: state.pid(),
            port,
            healthy,
            health_url,
            pid_file,
            started_at: None,
            detail,
        }
    }
}

/// Result of `start`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartOutcome {
    /// Launched. `healthy` is false when the grace window ran out first.
    Started { pid: u32, healthy: bool },
    AlreadyRunning { pid: u32 },
}

/// Result of `stop`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopOutcome {
    /// Terminated. `forced` when SIGKILL was needed.
    Stopped { pid: u32, forced: bool },
    NotRunning,
    /// Only a stale PID file was found and removed.
    CleanedStale { pid: Option<u32> },
}

//! Single-service supervision.
//!
//! - [`service`] - the state machine behind `start`, `stop` and `status`
//! - [`pidfile`] - exclusive-create PID file lock
//! - [`identity`] - exact `(working_dir, script_path)` process matching
//! - [`process`] - process table and signals
//! - [`ports`] - listening port ownership
//! - [`health`] - HTTP liveness probe
//! - [`launcher`] - detached launch with log redirection

pub mod health;
pub mod identity;
pub mod launcher;
pub mod pidfile;
pub mod ports;
pub mod process;
pub mod service;
pub mod state;

pub use health::{HttpLiveness, LivenessCheck};
pub use identity::ServiceIdentity;
pub use launcher::{ChildLauncher, LaunchSpec, LaunchedProcess, Launcher};
pub use pidfile::{PidFile, PidFileContents, PidLock};
pub use ports::{ListenerTable, PortProbe, ProcListeners};
pub use process::{ProcessHost, ProcessInfo, Signal, SystemProcesses};
pub use service::{ServiceSupervisor, SupervisorSettings};
pub use state::{PortOwnership, StartOutcome, StatusReport, StopOutcome, SupervisorState};

//! The service state machine: observe, start, stop, status.

use crate::config::TetherConfig;
use crate::environment::{interpreter_path, is_ready};
use crate::error::{Result, TetherError};
use crate::supervisor::health::LivenessCheck;
use crate::supervisor::identity::ServiceIdentity;
use crate::supervisor::launcher::{tail_lines, LaunchSpec, Launcher};
use crate::supervisor::pidfile::{PidFile, PidFileContents};
use crate::supervisor::ports::{ListenerTable, PortProbe};
use crate::supervisor::process::{ProcessHost, Signal};
use crate::supervisor::state::{
    PortOwnership, StartOutcome, StatusReport, StopOutcome, SupervisorState,
};
use std::path::{Path, PathBuf};
use std::thread;
use std::time::{Duration, Instant};

/// Slack added to the launch grace window before an empty PID file counts
/// as abandoned.
const STARTING_MARGIN: Duration = Duration::from_secs(5);

/// How long to wait for a process to disappear after SIGKILL.
const KILL_WAIT: Duration = Duration::from_secs(5);

/// Log lines included in a launch failure.
const LOG_TAIL_LINES: usize = 20;

/// Resolved paths and timings for one service.
#[derive(Debug, Clone)]
pub struct SupervisorSettings {
    pub working_dir: PathBuf,
    pub identity: ServiceIdentity,
    pub environment_dir: PathBuf,
    pub interpreter: PathBuf,
    pub entrypoint: PathBuf,
    pub args: Vec<String>,
    pub port: u16,
    pub pid_file: PathBuf,
    pub log_path: PathBuf,
    pub launch_grace: Duration,
    pub stop_grace: Duration,
    pub poll_interval: Duration,
}

impl SupervisorSettings {
    /// Resolve every relative path in `config` against `root`.
    pub fn from_config(config: &TetherConfig, root: &Path) -> Result<Self> {
        let working_dir = root.canonicalize()?;
        let identity = ServiceIdentity::new(&working_dir, &config.service.entrypoint)?;
        let environment_dir = TetherConfig::resolve(&working_dir, &config.environment.path);

        Ok(Self {
            interpreter: interpreter_path(&environment_dir),
            environment_dir,
            identity,
            entrypoint: config.service.entrypoint.clone(),
            args: config.service.args.clone(),
            port: config.service.port,
            pid_file: TetherConfig::resolve(&working_dir, &config.service.pid_file),
            log_path: TetherConfig::resolve(&working_dir, &config.service.log_path),
            launch_grace: Duration::from_secs(config.timings.launch_grace_secs),
            stop_grace: Duration::from_secs(config.timings.stop_grace_secs),
            poll_interval: Duration::from_millis(config.timings.poll_interval_ms),
            working_dir,
        })
    }

    fn launch_spec(&self) -> LaunchSpec {
        let mut args = vec![self.entrypoint.to_string_lossy().into_owned()];
        args.extend(self.args.iter().cloned());
        LaunchSpec {
            program: self.interpreter.clone(),
            args,
            cwd: self.working_dir.clone(),
            log_path: self.log_path.clone(),
        }
    }
}

/// Supervises one service through its PID file, port and process table.
pub struct ServiceSupervisor<'a> {
    settings: SupervisorSettings,
    pid_file: PidFile,
    processes: &'a dyn ProcessHost,
    listeners: &'a dyn ListenerTable,
    liveness: &'a dyn LivenessCheck,
    launcher: &'a dyn Launcher,
}

impl<'a> ServiceSupervisor<'a> {
    pub fn new(
        settings: SupervisorSettings,
        processes: &'a dyn ProcessHost,
        listeners: &'a dyn ListenerTable,
        liveness: &'a dyn LivenessCheck,
        launcher: &'a dyn Launcher,
    ) -> Self {
        Self {
            pid_file: PidFile::new(settings.pid_file.clone()),
            settings,
            processes,
            listeners,
            liveness,
            launcher,
        }
    }

    pub fn settings(&self) -> &SupervisorSettings {
        &self.settings
    }

    /// Classify the current situation. Never mutates anything.
    pub fn observe(&self) -> Result<SupervisorState> {
        self.observe_file().map(|(_, state)| state)
    }

    /// Classify, keeping the PID file contents the decision was based on.
    fn observe_file(&self) -> Result<(PidFileContents, SupervisorState)> {
        let contents = self.pid_file.read()?;
        let state = match &contents {
            PidFileContents::Missing => self.observe_untracked(),
            PidFileContents::Empty { age } => {
                if *age < self.settings.launch_grace + STARTING_MARGIN {
                    SupervisorState::Starting
                } else {
                    SupervisorState::StalePid {
                        pid: None,
                        reason: format!("PID file has been empty for {}s", age.as_secs()),
                    }
                }
            }
            PidFileContents::Invalid(content) => SupervisorState::StalePid {
                pid: None,
                reason: format!("PID file holds '{}'", content),
            },
            PidFileContents::Pid(pid) => match self.processes.process(*pid) {
                Some(process) if process.alive && self.settings.identity.matches(&process) => {
                    SupervisorState::Running { pid: *pid }
                }
                Some(process) if process.alive => SupervisorState::StalePid {
                    pid: Some(*pid),
                    reason: format!("process {} is not this service", pid),
                },
                _ => SupervisorState::StalePid {
                    pid: Some(*pid),
                    reason: format!("process {} is not running", pid),
                },
            },
        };
        tracing::debug!("Observed {}", state);
        Ok((contents, state))
    }

    /// Classify when no PID file tracks the service.
    ///
    /// A port held by anything other than this service is a conflict even
    /// when an untracked instance runs elsewhere.
    fn observe_untracked(&self) -> SupervisorState {
        let ownership = self.port_ownership();
        if let Some(owner) = ownership.as_ref().filter(|o| !o.is_self) {
            return SupervisorState::PortConflict(owner.clone());
        }

        if let Some(pid) = self.untracked_instance() {
            return SupervisorState::ForeignRunning { pid };
        }

        match ownership {
            Some(PortOwnership {
                owner_pid: Some(pid),
                ..
            }) => SupervisorState::ForeignRunning { pid },
            _ => SupervisorState::Stopped,
        }
    }

    /// Who holds the configured port right now, if anyone.
    pub fn port_ownership(&self) -> Option<PortOwnership> {
        let port = self.settings.port;
        match self.listeners.probe(port) {
            PortProbe::Free => None,
            PortProbe::Held { owner_pid: None } => Some(PortOwnership {
                port,
                owner_pid: None,
                owner_command: None,
                is_self: false,
            }),
            PortProbe::Held {
                owner_pid: Some(pid),
            } => {
                let process = self.processes.process(pid);
                Some(PortOwnership {
                    port,
                    owner_pid: Some(pid),
                    is_self: process
                        .as_ref()
                        .is_some_and(|p| self.settings.identity.matches(p)),
                    owner_command: process.map(|p| p.command_line()),
                })
            }
        }
    }

    /// Lowest PID of a live process with this service's identity.
    pub fn untracked_instance(&self) -> Option<u32> {
        self.processes
            .processes()
            .into_iter()
            .filter(|p| p.alive && self.settings.identity.matches(p))
            .map(|p| p.pid)
            .min()
    }

    /// Start the service if it is not already up.
    ///
    /// `confirm` is asked before terminating an untracked instance.
    ///
    /// # Errors
    ///
    /// `AlreadyStarting` when another start holds the lock, `EnvironmentMissing`
    /// when the environment is not built, `PortConflict` when an unrelated
    /// process owns the port, `ProcessLaunchFailure` when the service exits
    /// inside the grace window.
    pub fn start(&self, confirm: &mut dyn FnMut(&str) -> Result<bool>) -> Result<StartOutcome> {
        let (contents, observed) = self.observe_file()?;
        match observed {
            SupervisorState::Running { pid } => return Ok(StartOutcome::AlreadyRunning { pid }),
            SupervisorState::Starting => return Err(self.already_starting()),
            _ => {}
        }

        if !is_ready(&self.settings.environment_dir) {
            return Err(TetherError::EnvironmentMissing {
                path: self.settings.environment_dir.clone(),
            });
        }

        let state = match observed {
            SupervisorState::StalePid { pid, reason } => {
                self.clear_stale(&contents, pid, &reason)?;
                self.observe_untracked()
            }
            other => other,
        };

        match state {
            SupervisorState::PortConflict(ownership) => {
                return Err(TetherError::PortConflict {
                    port: ownership.port,
                    owner: ownership.describe(),
                })
            }
            SupervisorState::ForeignRunning { pid } => {
                let question = format!(
                    "Process {} is running this service without a PID file. Terminate it and start a tracked instance?",
                    pid
                );
                if !confirm(&question)? {
                    return Err(TetherError::ConfirmationDeclined {
                        action: format!("terminate untracked service process {}", pid),
                    });
                }
                self.terminate(pid)?;
            }
            _ => {}
        }

        self.launch()
    }

    fn launch(&self) -> Result<StartOutcome> {
        let lock = self.pid_file.acquire()?;
        let mut child = self.launcher.launch(&self.settings.launch_spec())?;
        let pid = child.pid();

        if let Err(e) = lock.commit(pid) {
            let _ = self.processes.signal(pid, Signal::Kill);
            return Err(e);
        }
        tracing::info!("Service started with pid {}", pid);

        let deadline = Instant::now() + self.settings.launch_grace;
        loop {
            if let Some(status) = child.exited() {
                tracing::warn!("Service pid {} exited during startup: {}", pid, status);
                self.pid_file.remove()?;
                let mut log_tail = tail_lines(&self.settings.log_path, LOG_TAIL_LINES);
                if log_tail.is_empty() {
                    log_tail = format!("(no output in {})", self.settings.log_path.display());
                }
                return Err(TetherError::ProcessLaunchFailure { pid, log_tail });
            }
            if self.liveness.is_live() {
                return Ok(StartOutcome::Started { pid, healthy: true });
            }
            if Instant::now() >= deadline {
                tracing::warn!(
                    "Service pid {} is running but {} did not answer within {}s",
                    pid,
                    self.liveness.target(),
                    self.settings.launch_grace.as_secs()
                );
                return Ok(StartOutcome::Started {
                    pid,
                    healthy: false,
                });
            }
            thread::sleep(self.settings.poll_interval);
        }
    }

    /// Stop the service if it runs.
    ///
    /// `confirm` is asked before terminating an untracked instance.
    pub fn stop(&self, confirm: &mut dyn FnMut(&str) -> Result<bool>) -> Result<StopOutcome> {
        let (contents, state) = self.observe_file()?;
        match state {
            SupervisorState::Stopped => Ok(StopOutcome::NotRunning),
            // The port owner is left alone, but an untracked instance is
            // still this service.
            SupervisorState::PortConflict(_) => match self.untracked_instance() {
                Some(pid) => self.stop_untracked(pid, confirm),
                None => Ok(StopOutcome::NotRunning),
            },
            SupervisorState::Starting => Err(self.already_starting()),
            SupervisorState::StalePid { pid, reason } => {
                self.clear_stale(&contents, pid, &reason)?;
                Ok(StopOutcome::CleanedStale { pid })
            }
            SupervisorState::Running { pid } => {
                let forced = self.terminate(pid)?;
                self.pid_file.remove()?;
                tracing::info!("Service pid {} stopped", pid);
                Ok(StopOutcome::Stopped { pid, forced })
            }
            SupervisorState::ForeignRunning { pid } => self.stop_untracked(pid, confirm),
        }
    }

    fn stop_untracked(
        &self,
        pid: u32,
        confirm: &mut dyn FnMut(&str) -> Result<bool>,
    ) -> Result<StopOutcome> {
        let question = format!(
            "Process {} is running this service without a PID file. Terminate it?",
            pid
        );
        if !confirm(&question)? {
            return Err(TetherError::ConfirmationDeclined {
                action: format!("terminate untracked service process {}", pid),
            });
        }
        let forced = self.terminate(pid)?;
        Ok(StopOutcome::Stopped { pid, forced })
    }

    /// Observe and, when a service process is up, probe liveness.
    pub fn status(&self) -> Result<StatusReport> {
        let state = self.observe()?;
        let healthy = state.is_running().then(|| self.liveness.is_live());
        let mut report = StatusReport::new(
            &state,
            self.settings.port,
            healthy,
            self.liveness.target(),
            self.settings.pid_file.clone(),
        );
        if let SupervisorState::Running { .. } = state {
            report.started_at = self
                .pid_file
                .modified()
                .map(|time| chrono::DateTime::<chrono::Local>::from(time).to_rfc3339());
        }
        Ok(report)
    }

    /// SIGTERM, wait out the stop grace, then SIGKILL. Returns whether
    /// SIGKILL was needed.
    fn terminate(&self, pid: u32) -> Result<bool> {
        tracing::info!("Sending SIGTERM to pid {}", pid);
        self.processes.signal(pid, Signal::Term)?;
        if self.wait_for_exit(pid, self.settings.stop_grace) {
            return Ok(false);
        }

        tracing::warn!(
            "Pid {} still running after {}s, sending SIGKILL",
            pid,
            self.settings.stop_grace.as_secs()
        );
        self.processes.signal(pid, Signal::Kill)?;
        if self.wait_for_exit(pid, KILL_WAIT) {
            return Ok(true);
        }
        Err(anyhow::anyhow!("process {} survived SIGKILL", pid).into())
    }

    fn wait_for_exit(&self, pid: u32, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        loop {
            if !self.processes.is_alive(pid) {
                return true;
            }
            if Instant::now() >= deadline {
                return false;
            }
            thread::sleep(self.settings.poll_interval);
        }
    }

    /// Remove a stale PID file, unless another start replaced it after
    /// `observed` was read.
    fn clear_stale(
        &self,
        observed: &PidFileContents,
        pid: Option<u32>,
        reason: &str,
    ) -> Result<()> {
        tracing::info!("Removing stale PID file (pid {:?}): {}", pid, reason);
        let removed = self
            .pid_file
            .remove_if_unchanged(observed)
            .map_err(|e| TetherError::StaleState {
                path: self.settings.pid_file.clone(),
                pid,
                reason: format!("{}; could not remove it: {}", reason, e),
            })?;
        if !removed {
            tracing::info!("PID file was taken by another start");
            return Err(self.already_starting());
        }
        Ok(())
    }

    fn already_starting(&self) -> TetherError {
        TetherError::AlreadyStarting {
            path: self.settings.pid_file.clone(),
        }
    }
}

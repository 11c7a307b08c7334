//! Process table access and signalling.

use std::io;
use std::path::PathBuf;
use sysinfo::{Pid, ProcessRefreshKind, ProcessStatus, ProcessesToUpdate, System, UpdateKind};

/// Snapshot of one process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessInfo {
    pub pid: u32,
    /// Command line, argv[0] first.
    pub cmd: Vec<String>,
    /// Current working directory, `None` when not visible to this user.
    pub cwd: Option<PathBuf>,
    /// False for zombies.
    pub alive: bool,
}

impl ProcessInfo {
    /// Command line joined for display.
    pub fn command_line(&self) -> String {
        self.cmd.join(" ")
    }
}

/// Signals the supervisor sends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Signal {
    Term,
    Kill,
}

impl Signal {
    #[cfg(unix)]
    fn as_raw(self) -> libc::c_int {
        match self {
            Signal::Term => libc::SIGTERM,
            Signal::Kill => libc::SIGKILL,
        }
    }
}

/// Access to the OS process table.
pub trait ProcessHost {
    /// Look up one process. Zombies are returned with `alive == false`.
    fn process(&self, pid: u32) -> Option<ProcessInfo>;

    /// All visible processes except this one.
    fn processes(&self) -> Vec<ProcessInfo>;

    /// Signal the process group led by `pid`, or `pid` alone when it leads
    /// no group. A process that is already gone is not an error.
    fn signal(&self, pid: u32, signal: Signal) -> io::Result<()>;

    /// Whether `pid` exists and is not a zombie.
    fn is_alive(&self, pid: u32) -> bool {
        self.process(pid).is_some_and(|p| p.alive)
    }
}

/// Process table backed by `sysinfo` and `libc::kill`.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemProcesses;

impl SystemProcesses {
    fn refresh_kind() -> ProcessRefreshKind {
        ProcessRefreshKind::nothing()
            .with_cmd(UpdateKind::Always)
            .with_cwd(UpdateKind::Always)
    }

    fn info(pid: Pid, process: &sysinfo::Process) -> ProcessInfo {
        ProcessInfo {
            pid: pid.as_u32(),
            cmd: process
                .cmd()
                .iter()
                .map(|arg| arg.to_string_lossy().into_owned())
                .collect(),
            cwd: process.cwd().map(|p| p.to_path_buf()),
            alive: !matches!(process.status(), ProcessStatus::Zombie | ProcessStatus::Dead),
        }
    }
}

impl ProcessHost for SystemProcesses {
    fn process(&self, pid: u32) -> Option<ProcessInfo> {
        let pid = Pid::from_u32(pid);
        let mut system = System::new();
        system.refresh_processes_specifics(
            ProcessesToUpdate::Some(&[pid]),
            true,
            Self::refresh_kind(),
        );
        system.process(pid).map(|p| Self::info(pid, p))
    }

    fn processes(&self) -> Vec<ProcessInfo> {
        let own = std::process::id();
        let mut system = System::new();
        system.refresh_processes_specifics(ProcessesToUpdate::All, true, Self::refresh_kind());
        system
            .processes()
            .iter()
            .filter(|(pid, _)| pid.as_u32() != own)
            .map(|(pid, p)| Self::info(*pid, p))
            .collect()
    }

    #[cfg(unix)]
    fn signal(&self, pid: u32, signal: Signal) -> io::Result<()> {
        let raw_pid = libc::pid_t::try_from(pid)
            .map_err(|_| io::Error::new(io::ErrorKind::InvalidInput, "pid out of range"))?;
        if raw_pid <= 1 {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("refusing to signal pid {}", pid),
            ));
        }

        // SAFETY: kill(2) only reads its integer arguments.
        if unsafe { libc::kill(-raw_pid, signal.as_raw()) } == 0 {
            tracing::debug!("Sent {:?} to process group {}", signal, pid);
            return Ok(());
        }
        let err = io::Error::last_os_error();
        if err.raw_os_error() != Some(libc::ESRCH) {
            return Err(err);
        }

        // SAFETY: as above.
        if unsafe { libc::kill(raw_pid, signal.as_raw()) } == 0 {
            tracing::debug!("Sent {:?} to process {}", signal, pid);
            return Ok(());
        }
        let err = io::Error::last_os_error();
        if err.raw_os_error() == Some(libc::ESRCH) {
            Ok(())
        } else {
            Err(err)
        }
    }

    #[cfg(not(unix))]
    fn signal(&self, _pid: u32, _signal: Signal) -> io::Result<()> {
        Err(io::Error::new(
            io::ErrorKind::Unsupported,
            "signals are only supported on unix",
        ))
    }
}

//! Listening-port ownership.
//!
//! Reads the kernel's TCP tables under `/proc/net` and maps the listening
//! socket's inode back to a PID through `/proc/<pid>/fd`. Without `/proc`, a
//! bind attempt tells whether the port is taken but not by whom.

use std::fs;
use std::io;
use std::net::TcpListener;
use std::path::PathBuf;

/// TCP state code for LISTEN.
const TCP_LISTEN: &str = "0A";

/// Result of looking at a port.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PortProbe {
    Free,
    /// Someone is listening. The owner is `None` when it cannot be seen.
    Held { owner_pid: Option<u32> },
}

impl PortProbe {
    pub fn is_held(&self) -> bool {
        matches!(self, PortProbe::Held { .. })
    }
}

/// Something that can say who listens on a port.
pub trait ListenerTable {
    fn probe(&self, port: u16) -> PortProbe;
}

/// One LISTEN row from `/proc/net/tcp*`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Listener {
    pub port: u16,
    pub inode: u64,
}

/// Parse a `/proc/net/tcp` or `/proc/net/tcp6` table into its LISTEN rows.
pub fn parse_proc_net(content: &str) -> Vec<Listener> {
    content
        .lines()
        .skip(1)
        .filter_map(|line| {
            let fields: Vec<&str> = line.split_whitespace().collect();
            if fields.len() < 10 || fields[3] != TCP_LISTEN {
                return None;
            }
            let (_, port_hex) = fields[1].rsplit_once(':')?;
            let port = u16::from_str_radix(port_hex, 16).ok()?;
            let inode = fields[9].parse().ok()?;
            Some(Listener { port, inode })
        })
        .collect()
}

/// Listener lookup through procfs.
#[derive(Debug, Clone)]
pub struct ProcListeners {
    proc_root: PathBuf,
    bind_host: String,
}

impl ProcListeners {
    pub fn new(bind_host: impl Into<String>) -> Self {
        Self {
            proc_root: PathBuf::from("/proc"),
            bind_host: bind_host.into(),
        }
    }

    /// Use a different procfs mount.
    pub fn with_proc_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.proc_root = root.into();
        self
    }

    /// LISTEN rows from both tables, or `None` when neither can be read.
    fn listeners(&self) -> Option<Vec<Listener>> {
        let mut found = None;
        for table in ["tcp", "tcp6"] {
            match fs::read_to_string(self.proc_root.join("net").join(table)) {
                Ok(content) => found
                    .get_or_insert_with(Vec::new)
                    .extend(parse_proc_net(&content)),
                Err(e) => tracing::debug!("Cannot read /proc/net/{}: {}", table, e),
            }
        }
        found
    }

    /// Find the process holding a socket inode.
    fn owner_of(&self, inode: u64) -> Option<u32> {
        if inode == 0 {
            return None;
        }
        let needle = format!("socket:[{}]", inode);

        let entries = fs::read_dir(&self.proc_root).ok()?;
        for entry in entries.flatten() {
            let Some(pid) = entry
                .file_name()
                .to_str()
                .and_then(|name| name.parse::<u32>().ok())
            else {
                continue;
            };
            let Ok(fds) = fs::read_dir(entry.path().join("fd")) else {
                continue;
            };
            for fd in fds.flatten() {
                if fs::read_link(fd.path()).is_ok_and(|target| target.as_os_str() == needle.as_str())
                {
                    return Some(pid);
                }
            }
        }
        None
    }

    fn bind_probe(&self, port: u16) -> PortProbe {
        match TcpListener::bind((self.bind_host.as_str(), port)) {
            Ok(_) => PortProbe::Free,
            Err(e) if e.kind() == io::ErrorKind::AddrInUse => PortProbe::Held { owner_pid: None },
            Err(e) => {
                tracing::debug!("Bind probe on port {} failed: {}", port, e);
                PortProbe::Free
            }
        }
    }
}

impl ListenerTable for ProcListeners {
    fn probe(&self, port: u16) -> PortProbe {
        let Some(listeners) = self.listeners() else {
            return self.bind_probe(port);
        };

        let Some(listener) = listeners.into_iter().find(|l| l.port == port) else {
            return PortProbe::Free;
        };
        let owner_pid = self.owner_of(listener.inode);
        tracing::debug!(
            "Port {} held by inode {} (pid {:?})",
            port,
            listener.inode,
            owner_pid
        );
        PortProbe::Held { owner_pid }
    }
}

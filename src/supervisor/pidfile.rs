//! PID file handling.
//!
//! The PID file is only ever touched through exclusive create, atomic
//! replace and delete. An empty file means a `start` holds the lock and has
//! not launched yet.

use crate::error::{Result, TetherError};
use std::fs::{self, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

/// What the PID file currently says.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PidFileContents {
    /// No file.
    Missing,
    /// Lock held, PID not written yet.
    Empty { age: Duration },
    /// A committed PID.
    Pid(u32),
    /// Unparseable content.
    Invalid(String),
}

/// The service PID file.
#[derive(Debug, Clone)]
pub struct PidFile {
    path: PathBuf,
}

impl PidFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the current contents without modifying anything.
    pub fn read(&self) -> Result<PidFileContents> {
        read_contents(&self.path)
    }

    /// When the file was last written, if it exists.
    pub fn modified(&self) -> Option<SystemTime> {
        fs::metadata(&self.path).and_then(|m| m.modified()).ok()
    }

    /// Take the start lock by creating the file exclusively.
    ///
    /// # Errors
    ///
    /// Returns `AlreadyStarting` if the file already exists.
    pub fn acquire(&self) -> Result<PidLock> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }

        match OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&self.path)
        {
            Ok(_) => {
                tracing::debug!("Acquired PID file {}", self.path.display());
                Ok(PidLock {
                    path: self.path.clone(),
                    committed: false,
                })
            }
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {
                Err(TetherError::AlreadyStarting {
                    path: self.path.clone(),
                })
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Delete the file only if it still holds what was `observed`.
    ///
    /// The file is first renamed to a name private to this process, so a
    /// lock taken by another `start` after the observation is never deleted.
    /// A changed file is put back and `Ok(false)` returned. A file that is
    /// already gone counts as removed.
    pub fn remove_if_unchanged(&self, observed: &PidFileContents) -> Result<bool> {
        let claimed = self.sibling("stale");
        match fs::rename(&self.path, &claimed) {
            Ok(()) => {}
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(true),
            Err(e) => return Err(e.into()),
        }

        let current = read_contents(&claimed);
        if current.as_ref().is_ok_and(|c| still_matches(observed, c)) {
            fs::remove_file(&claimed)?;
            tracing::debug!("Removed PID file {}", self.path.display());
            return Ok(true);
        }

        tracing::debug!(
            "PID file {} changed since it was read; leaving it",
            self.path.display()
        );
        match fs::hard_link(&claimed, &self.path) {
            Ok(()) => {}
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {}
            Err(e) => {
                let _ = fs::remove_file(&claimed);
                return Err(e.into());
            }
        }
        fs::remove_file(&claimed)?;
        current.map(|_| false)
    }

    /// Delete the file. A missing file is not an error.
    pub fn remove(&self) -> Result<()> {
        match fs::remove_file(&self.path) {
            Ok(()) => {
                tracing::debug!("Removed PID file {}", self.path.display());
                Ok(())
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    /// A hidden path next to the PID file, unique to this process.
    fn sibling(&self, suffix: &str) -> PathBuf {
        sibling_path(&self.path, suffix)
    }
}

fn sibling_path(path: &Path, suffix: &str) -> PathBuf {
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "service.pid".to_string());
    path.with_file_name(format!(".{}.{}.{}", file_name, std::process::id(), suffix))
}

fn read_contents(path: &Path) -> Result<PidFileContents> {
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(PidFileContents::Missing),
        Err(e) => return Err(e.into()),
    };

    let trimmed = content.trim();
    if trimmed.is_empty() {
        let age = fs::metadata(path)
            .and_then(|m| m.modified())
            .ok()
            .and_then(|modified| SystemTime::now().duration_since(modified).ok())
            .unwrap_or_default();
        return Ok(PidFileContents::Empty { age });
    }

    match trimmed.parse::<u32>() {
        Ok(pid) if pid > 0 => Ok(PidFileContents::Pid(pid)),
        _ => Ok(PidFileContents::Invalid(trimmed.to_string())),
    }
}

/// Whether `current` is still the file that was `observed`. An empty file
/// that has become younger is a new lock.
fn still_matches(observed: &PidFileContents, current: &PidFileContents) -> bool {
    match (observed, current) {
        (PidFileContents::Pid(a), PidFileContents::Pid(b)) => a == b,
        (PidFileContents::Invalid(a), PidFileContents::Invalid(b)) => a == b,
        (PidFileContents::Empty { age: before }, PidFileContents::Empty { age: now }) => {
            now >= before
        }
        _ => false,
    }
}

/// Exclusive hold on an empty PID file.
///
/// Dropping an uncommitted lock deletes the file.
#[derive(Debug)]
pub struct PidLock {
    path: PathBuf,
    committed: bool,
}

impl PidLock {
    /// Replace the lock file with one holding `pid`.
    pub fn commit(mut self, pid: u32) -> Result<()> {
        let temp_path = sibling_path(&self.path, "tmp");

        fs::write(&temp_path, format!("{}\n", pid))?;
        if let Err(e) = fs::rename(&temp_path, &self.path) {
            let _ = fs::remove_file(&temp_path);
            return Err(e.into());
        }

        self.committed = true;
        tracing::debug!("Wrote PID {} to {}", pid, self.path.display());
        Ok(())
    }
}

impl Drop for PidLock {
    fn drop(&mut self) {
        if !self.committed {
            let _ = fs::remove_file(&self.path);
        }
    }
}

//! What every command needs: where the service lives and its settings.

use std::path::{Path, PathBuf};

use crate::cli::args::Cli;
use crate::config::{find_project_root, load_config, validate, TetherConfig};
use crate::error::Result;
use crate::supervisor::health::DEFAULT_TIMEOUT;
use crate::supervisor::{
    ChildLauncher, HttpLiveness, ProcListeners, ServiceSupervisor, SupervisorSettings,
    SystemProcesses,
};

/// Service location plus the global flag overrides.
#[derive(Debug, Clone, Default)]
pub struct CommandContext {
    pub project_root: PathBuf,
    pub config_path: Option<PathBuf>,
    pub port: Option<u16>,
}

impl CommandContext {
    pub fn new(project_root: impl Into<PathBuf>) -> Self {
        Self {
            project_root: project_root.into(),
            ..Default::default()
        }
    }

    /// `--project` wins; otherwise walk up from `cwd` looking for the service.
    pub fn from_cli(cli: &Cli, cwd: &Path) -> Self {
        let project_root = match &cli.project {
            Some(project) => project.clone(),
            None => find_project_root(cwd).unwrap_or_else(|| cwd.to_path_buf()),
        };
        Self {
            project_root,
            config_path: cli.config.clone(),
            port: cli.port,
        }
    }

    pub fn project_root(&self) -> &Path {
        &self.project_root
    }

    /// Load, apply overrides, validate.
    pub fn load_config(&self) -> Result<TetherConfig> {
        let mut config = load_config(&self.project_root, self.config_path.as_deref())?;
        if let Some(port) = self.port {
            tracing::debug!("Port overridden to {}", port);
            config.service.port = port;
        }
        validate(&config)?;
        Ok(config)
    }

    /// A config path resolved against the project root.
    pub fn resolve(&self, path: &Path) -> PathBuf {
        TetherConfig::resolve(&self.project_root, path)
    }
}

/// The real process table, procfs listeners, HTTP probe and launcher.
pub struct SystemServices {
    processes: SystemProcesses,
    listeners: ProcListeners,
    liveness: HttpLiveness,
    launcher: ChildLauncher,
}

impl SystemServices {
    pub fn new(config: &TetherConfig) -> Result<Self> {
        Ok(Self {
            processes: SystemProcesses,
            listeners: ProcListeners::new(config.service.host.clone()),
            liveness: HttpLiveness::new(config.service.health_url(), DEFAULT_TIMEOUT)?,
            launcher: ChildLauncher,
        })
    }

    pub fn supervisor(&self, settings: SupervisorSettings) -> ServiceSupervisor<'_> {
        ServiceSupervisor::new(
            settings,
            &self.processes,
            &self.listeners,
            &self.liveness,
            &self.launcher,
        )
    }
}

/// Answer to a takeover question the supervisor asks mid-operation.
///
/// Only a decision made before the operation began counts. An untracked
/// instance that shows up later was never shown to the user, so it is left
/// running even under `--yes`.
pub fn prior_takeover_answer(takeover: Option<bool>, question: &str) -> bool {
    takeover.unwrap_or_else(|| {
        tracing::warn!("Not terminating an instance nobody was asked about: {}", question);
        false
    })
}

#[cfg(test)]
pub(crate) fn free_port() -> u16 {
    std::net::TcpListener::bind("127.0.0.1:0")
        .and_then(|l| l.local_addr())
        .map(|a| a.port())
        .unwrap()
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn late_takeover_question_is_declined() {
        assert!(!prior_takeover_answer(None, "Terminate process 4100?"));
    }

    #[test]
    fn up_front_takeover_answer_is_kept() {
        assert!(prior_takeover_answer(Some(true), "Terminate process 4100?"));
        assert!(!prior_takeover_answer(Some(false), "Terminate process 4100?"));
    }

    #[test]
    fn project_flag_wins() {
        let cli = Cli::try_parse_from(["tether", "-p", "/srv/rates", "status"]).unwrap();
        let ctx = CommandContext::from_cli(&cli, Path::new("/tmp"));
        assert_eq!(ctx.project_root(), Path::new("/srv/rates"));
    }

    #[test]
    fn discovers_root_from_subdirectory() {
        let temp = TempDir::new().unwrap();
        fs::create_dir_all(temp.path().join(".tether")).unwrap();
        let sub = temp.path().join("logs");
        fs::create_dir_all(&sub).unwrap();

        let cli = Cli::try_parse_from(["tether", "status"]).unwrap();
        let ctx = CommandContext::from_cli(&cli, &sub);
        assert_eq!(ctx.project_root(), temp.path());
    }

    #[test]
    fn port_override_applies() {
        let temp = TempDir::new().unwrap();
        let mut ctx = CommandContext::new(temp.path());
        ctx.port = Some(8081);
        assert_eq!(ctx.load_config().unwrap().service.port, 8081);
    }

    #[test]
    fn invalid_config_is_rejected() {
        let temp = TempDir::new().unwrap();
        fs::create_dir_all(temp.path().join(".tether")).unwrap();
        fs::write(
            temp.path().join(".tether/config.yml"),
            "timings:\n  poll_interval_ms: 0\n",
        )
        .unwrap();

        let err = CommandContext::new(temp.path()).load_config().unwrap_err();
        assert!(err.to_string().contains("poll_interval_ms"));
    }

    #[test]
    fn config_flag_must_exist() {
        let temp = TempDir::new().unwrap();
        let mut ctx = CommandContext::new(temp.path());
        ctx.config_path = Some(temp.path().join("missing.yml"));
        assert!(ctx.load_config().is_err());
    }
}

//! CLI argument definitions.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// tether - provision and supervise a single service.
#[derive(Debug, Parser)]
#[command(name = "tether")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to config file (overrides .tether/config.yml)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Service working directory (overrides discovery from the current directory)
    #[arg(short, long, global = true)]
    pub project: Option<PathBuf>,

    /// Service port (overrides service.port)
    #[arg(long, global = true, env = "TETHER_PORT")]
    pub port: Option<u16>,

    /// Show per-package and per-check detail
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Only print warnings, errors and requested data
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Enable debug logging
    #[arg(long, global = true)]
    pub debug: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Start the service (default health wait, PID file, port checks)
    Start(StartArgs),

    /// Stop the service
    Stop(StopArgs),

    /// Show service state (default if no command specified)
    Status(StatusArgs),

    /// Check system prerequisites
    Check(CheckArgs),

    /// Install missing system prerequisites
    Install(InstallArgs),

    /// Build the runtime environment and install the package manifest
    Setup(SetupArgs),
}

/// Arguments for the `start` command.
#[derive(Debug, Clone, Default, clap::Args)]
pub struct StartArgs {
    /// Answer confirmations with yes
    #[arg(short, long)]
    pub yes: bool,
}

/// Arguments for the `stop` command.
#[derive(Debug, Clone, Default, clap::Args)]
pub struct StopArgs {
    /// Answer confirmations with yes
    #[arg(short, long)]
    pub yes: bool,
}

/// Arguments for the `status` command.
#[derive(Debug, Clone, Default, clap::Args)]
pub struct StatusArgs {
    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the `check` command.
#[derive(Debug, Clone, Default, clap::Args)]
pub struct CheckArgs {
    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the `install` command.
#[derive(Debug, Clone, Default, clap::Args)]
pub struct InstallArgs {
    /// Run the plan without asking
    #[arg(short, long)]
    pub yes: bool,

    /// Print the plan and exit
    #[arg(long)]
    pub dry_run: bool,
}

/// Arguments for the `setup` command.
#[derive(Debug, Clone, Default, clap::Args)]
pub struct SetupArgs {
    /// Answer confirmations with yes
    #[arg(short, long)]
    pub yes: bool,

    /// Delete and rebuild an existing environment
    #[arg(long)]
    pub recreate: bool,

    /// Skip the package manifest
    #[arg(long)]
    pub no_install: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from(["tether", "start", "--yes", "--port", "8080", "-p", "/srv"])
            .unwrap();
        assert_eq!(cli.port, Some(8080));
        assert_eq!(cli.project, Some(PathBuf::from("/srv")));
        assert!(matches!(cli.command, Some(Commands::Start(StartArgs { yes: true }))));
    }

    #[test]
    fn no_subcommand_is_allowed() {
        let cli = Cli::try_parse_from(["tether"]).unwrap();
        assert!(cli.command.is_none());
    }

    #[test]
    fn setup_flags() {
        let cli = Cli::try_parse_from(["tether", "setup", "--recreate", "--no-install"]).unwrap();
        let Some(Commands::Setup(args)) = cli.command else {
            panic!("expected setup");
        };
        assert!(args.recreate);
        assert!(args.no_install);
        assert!(!args.yes);
    }

    #[test]
    fn rejects_invalid_port() {
        assert!(Cli::try_parse_from(["tether", "status", "--port", "70000"]).is_err());
    }
}

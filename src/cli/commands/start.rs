//! `tether start`: launch the service unless it already runs.

use crate::cli::args::StartArgs;
use crate::error::Result;
use crate::supervisor::{StartOutcome, SupervisorSettings, SupervisorState};
use crate::ui::{confirm_action, Confirmation, UserInterface};

use super::context::{prior_takeover_answer, CommandContext, SystemServices};
use super::dispatcher::{Command, CommandResult};

pub struct StartCommand {
    context: CommandContext,
    args: StartArgs,
}

impl StartCommand {
    pub fn new(context: CommandContext, args: StartArgs) -> Self {
        Self { context, args }
    }
}

impl Command for StartCommand {
    fn execute(&self, ui: &mut dyn UserInterface) -> Result<CommandResult> {
        let config = self.context.load_config()?;
        let services = SystemServices::new(&config)?;
        let settings = SupervisorSettings::from_config(&config, self.context.project_root())?;
        let grace = settings.launch_grace;
        let supervisor = services.supervisor(settings);

        // Ask before the spinner takes over the terminal.
        let takeover = match supervisor.observe()? {
            SupervisorState::ForeignRunning { pid } => Some(confirm_action(
                ui,
                self.args.yes,
                &Confirmation::new(
                    "terminate_foreign",
                    format!(
                        "Process {} runs {} without a PID file. Terminate it and start a tracked instance?",
                        pid, config.service.name
                    ),
                ),
            )?),
            _ => None,
        };

        let mut spinner = ui.start_spinner(&format!(
            "Starting {} (waiting up to {}s for {})",
            config.service.name,
            grace.as_secs(),
            config.service.health_url()
        ));
        let outcome =
            supervisor.start(&mut |question: &str| Ok(prior_takeover_answer(takeover, question)));

        match outcome {
            Ok(StartOutcome::Started { pid, healthy: true }) => {
                spinner.finish_success(&format!(
                    "{} started (pid {}) and is healthy",
                    config.service.name, pid
                ));
                Ok(CommandResult::success())
            }
            Ok(StartOutcome::Started {
                pid,
                healthy: false,
            }) => {
                spinner.finish_warning(&format!(
                    "{} started (pid {}) but {} is not answering yet",
                    config.service.name,
                    pid,
                    config.service.health_url()
                ));
                ui.show_hint("tether status");
                Ok(CommandResult::success())
            }
            Ok(StartOutcome::AlreadyRunning { pid }) => {
                spinner.finish_warning(&format!(
                    "{} is already running (pid {})",
                    config.service.name, pid
                ));
                Ok(CommandResult::already_in_state())
            }
            Err(e) => {
                spinner.finish_error(&format!("{} did not start", config.service.name));
                Err(e)
            }
        }
    }
}

//! `tether stop`: terminate the tracked service.

use crate::cli::args::StopArgs;
use crate::error::Result;
use crate::supervisor::{StopOutcome, SupervisorSettings, SupervisorState};
use crate::ui::{confirm_action, Confirmation, UserInterface};

use super::context::{prior_takeover_answer, CommandContext, SystemServices};
use super::dispatcher::{Command, CommandResult};

pub struct StopCommand {
    context: CommandContext,
    args: StopArgs,
}

impl StopCommand {
    pub fn new(context: CommandContext, args: StopArgs) -> Self {
        Self { context, args }
    }
}

impl Command for StopCommand {
    fn execute(&self, ui: &mut dyn UserInterface) -> Result<CommandResult> {
        let config = self.context.load_config()?;
        let services = SystemServices::new(&config)?;
        let settings = SupervisorSettings::from_config(&config, self.context.project_root())?;
        let grace = settings.stop_grace;
        let supervisor = services.supervisor(settings);

        let untracked = match supervisor.observe()? {
            SupervisorState::ForeignRunning { pid } => Some(pid),
            SupervisorState::PortConflict(ownership) => {
                ui.warning(&format!(
                    "Port {} is held by an unrelated process ({}); leaving it alone",
                    ownership.port,
                    ownership.describe()
                ));
                supervisor.untracked_instance()
            }
            _ => None,
        };
        let takeover = match untracked {
            Some(pid) => Some(confirm_action(
                ui,
                self.args.yes,
                &Confirmation::new(
                    "terminate_foreign",
                    format!(
                        "Process {} runs {} without a PID file. Terminate it?",
                        pid, config.service.name
                    ),
                ),
            )?),
            None => None,
        };

        let mut spinner = ui.start_spinner(&format!("Stopping {}", config.service.name));
        let outcome =
            supervisor.stop(&mut |question: &str| Ok(prior_takeover_answer(takeover, question)));

        match outcome {
            Ok(StopOutcome::Stopped { pid, forced }) => {
                if forced {
                    spinner.finish_warning(&format!(
                        "{} (pid {}) ignored SIGTERM for {}s and was killed",
                        config.service.name,
                        pid,
                        grace.as_secs()
                    ));
                } else {
                    spinner.finish_success(&format!(
                        "{} stopped (pid {})",
                        config.service.name, pid
                    ));
                }
                Ok(CommandResult::success())
            }
            Ok(StopOutcome::NotRunning) => {
                spinner.finish_warning(&format!("{} is not running", config.service.name));
                Ok(CommandResult::already_in_state())
            }
            Ok(StopOutcome::CleanedStale { pid }) => {
                let which = pid.map(|p| format!(" for pid {}", p)).unwrap_or_default();
                spinner.finish_warning(&format!(
                    "{} is not running; removed stale PID file{}",
                    config.service.name, which
                ));
                Ok(CommandResult::already_in_state())
            }
            Err(e) => {
                spinner.finish_error(&format!("{} was not stopped", config.service.name));
                Err(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::commands::context::free_port;
    use crate::ui::MockUI;
    use std::fs;
    use tempfile::TempDir;

    fn context(temp: &TempDir) -> CommandContext {
        let mut ctx = CommandContext::new(temp.path());
        ctx.port = Some(free_port());
        ctx
    }

    #[test]
    fn stopped_service_is_exit_3() {
        let temp = TempDir::new().unwrap();
        let mut ui = MockUI::new();

        let result = StopCommand::new(context(&temp), StopArgs::default())
            .execute(&mut ui)
            .unwrap();

        assert_eq!(result.exit_code, 3);
        assert!(!temp.path().join(".tether").exists());
    }

    #[test]
    fn stale_pid_file_is_cleaned() {
        let temp = TempDir::new().unwrap();
        fs::create_dir_all(temp.path().join(".tether")).unwrap();
        fs::write(temp.path().join(".tether/service.pid"), "4194320\n").unwrap();
        let mut ui = MockUI::new();

        let result = StopCommand::new(context(&temp), StopArgs::default())
            .execute(&mut ui)
            .unwrap();

        assert_eq!(result.exit_code, 3);
        assert!(!temp.path().join(".tether/service.pid").exists());
    }
}

//! `tether status`: report the service state without changing anything.

use crate::cli::args::StatusArgs;
use crate::error::{Result, TetherError};
use crate::supervisor::{StatusReport, SupervisorSettings};
use crate::ui::UserInterface;

use super::context::{CommandContext, SystemServices};
use super::dispatcher::{Command, CommandResult};

pub struct StatusCommand {
    context: CommandContext,
    args: StatusArgs,
}

impl StatusCommand {
    pub fn new(context: CommandContext, args: StatusArgs) -> Self {
        Self { context, args }
    }
}

impl Command for StatusCommand {
    fn execute(&self, ui: &mut dyn UserInterface) -> Result<CommandResult> {
        let config = self.context.load_config()?;
        let services = SystemServices::new(&config)?;
        let settings = SupervisorSettings::from_config(&config, self.context.project_root())?;
        let report = services.supervisor(settings).status()?;

        if self.args.json {
            let json = serde_json::to_string_pretty(&report)
                .map_err(|e| TetherError::Other(e.into()))?;
            ui.emit_json(&json);
        } else {
            show_report(ui, &config.service.name, &report);
        }
        Ok(CommandResult::success())
    }
}

fn show_report(ui: &mut dyn UserInterface, name: &str, report: &StatusReport) {
    ui.show_header(name);
    ui.message(&format!("  State:  {}", report.state));
    if let Some(pid) = report.pid {
        ui.message(&format!("  PID:    {}", pid));
    }
    ui.message(&format!("  Port:   {}", report.port));
    if let Some(started_at) = &report.started_at {
        ui.message(&format!("  Since:  {}", started_at));
    }
    match report.healthy {
        Some(true) => ui.message(&format!("  Health: ok ({})", report.health_url)),
        Some(false) => ui.message(&format!("  Health: not answering ({})", report.health_url)),
        None => {}
    }
    if let Some(detail) = &report.detail {
        ui.message(&format!("  Detail: {}", detail));
    }

    match report.state.as_str() {
        "STOPPED" => ui.show_hint("tether start"),
        "STALE_PID" => ui.show_hint("tether start (the stale PID file is removed automatically)"),
        "FOREIGN_RUNNING" => ui.show_hint("tether stop, then tether start, to track it"),
        "PORT_CONFLICT" => ui.show_hint("free the port or set service.port / --port"),
        _ => {}
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
    fn empty_directory_is_stopped() {
        let temp = TempDir::new().unwrap();
        let mut ui = MockUI::new();

        let result = StatusCommand::new(context(&temp), StatusArgs::default())
            .execute(&mut ui)
            .unwrap();

        assert!(result.success);
        assert!(ui.has_message("State:  STOPPED"));
        assert!(ui.has_hint("tether start"));
        assert!(!temp.path().join(".tether").exists());
    }

    #[test]
    fn stale_pid_file_is_reported_and_kept() {
        let temp = TempDir::new().unwrap();
        fs::create_dir_all(temp.path().join(".tether")).unwrap();
        // Above the default pid_max.
        fs::write(temp.path().join(".tether/service.pid"), "4194320\n").unwrap();
        let mut ui = MockUI::new();

        StatusCommand::new(context(&temp), StatusArgs::default())
            .execute(&mut ui)
            .unwrap();

        assert!(ui.has_message("STALE_PID"));
        assert!(temp.path().join(".tether/service.pid").exists());
    }

    #[test]
    fn json_output() {
        let temp = TempDir::new().unwrap();
        let mut ui = MockUI::new();

        StatusCommand::new(context(&temp), StatusArgs { json: true })
            .execute(&mut ui)
            .unwrap();

        let value: serde_json::Value = serde_json::from_str(&ui.json()[0]).unwrap();
        assert_eq!(value["state"], "STOPPED");
        assert!(ui.messages().is_empty());
    }
}

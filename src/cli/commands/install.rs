//! `tether install`: plan and run system package installs.

use crate::cli::args::InstallArgs;
use crate::cli::exit_codes;
use crate::error::{Result, TetherError};
use crate::requirements::{
    execute, DependencyCheckResult, DependencyProbe, Host, InstallPlanner, PlannedCommand,
    RequirementRegistry, SystemHost,
};
use crate::shell::{CommandRunner, Privilege, ShellRunner};
use crate::ui::{confirm_action, Confirmation, UserInterface};

use super::context::CommandContext;
use super::dispatcher::{Command, CommandResult};

pub struct InstallCommand {
    context: CommandContext,
    args: InstallArgs,
}

impl InstallCommand {
    pub fn new(context: CommandContext, args: InstallArgs) -> Self {
        Self { context, args }
    }
}

impl Command for InstallCommand {
    fn execute(&self, ui: &mut dyn UserInterface) -> Result<CommandResult> {
        let config = self.context.load_config()?;
        let registry = RequirementRegistry::new(&config.requirements, &config.environment.python);
        let host = SystemHost::new();
        let runner = ShellRunner;
        let privilege = Privilege::detect(&runner);
        tracing::debug!("Privilege: {:?}", privilege);

        install(ui, &registry, &host, &runner, privilege, &self.args)
    }
}

fn install(
    ui: &mut dyn UserInterface,
    registry: &RequirementRegistry,
    host: &dyn Host,
    runner: &dyn CommandRunner,
    privilege: Privilege,
    args: &InstallArgs,
) -> Result<CommandResult> {
    let probe = DependencyProbe::new(registry, host);
    let results = probe.probe_all();
    if results.iter().all(|r| r.present) {
        ui.success("All prerequisites are present");
        return Ok(CommandResult::success());
    }

    let mut plan = InstallPlanner::new(registry, host).build_plan(&results)?;
    if plan.is_empty() {
        ui.success("Nothing to install");
        return Ok(CommandResult::success());
    }

    ui.show_header(&format!(
        "Install plan for {} ({})",
        plan.requirements.join(", "),
        plan.manager.name()
    ));
    for (index, step) in plan.commands().iter().enumerate() {
        let marker = if step.privileged { " [root]" } else { "" };
        ui.message(&format!("  {}. {}{}", index + 1, step.description, marker));
        ui.message(&format!("     {}", step.command));
    }

    if args.dry_run {
        ui.show_hint("tether install --yes");
        return Ok(CommandResult::success());
    }

    let total = plan.commands().len();
    let confirmation = Confirmation::new(
        "install_plan",
        format!("Run these {} install step(s)?", total),
    );
    if !confirm_action(ui, args.yes, &confirmation)? {
        return Err(TetherError::ConfirmationDeclined {
            action: "run install plan".to_string(),
        });
    }
    plan.confirm();

    execute(
        &plan,
        runner,
        privilege,
        &mut |index: usize, step: &PlannedCommand| {
            ui.message(&format!("[{}/{}] {}", index + 1, total, step.description));
        },
    )?;

    let remaining: Vec<DependencyCheckResult> = probe
        .probe_all()
        .into_iter()
        .filter(DependencyCheckResult::is_blocking)
        .collect();
    if remaining.is_empty() {
        ui.success("Prerequisites installed");
        ui.show_hint("tether setup");
        Ok(CommandResult::success())
    } else {
        for result in &remaining {
            ui.error(&format!("{} still missing: {}", result.name, result.remediation));
        }
        Ok(CommandResult::failure(exit_codes::FAILURE))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RequirementsConfig;
    use crate::requirements::host::fake::FakeHost;
    use crate::shell::{CommandOptions, CommandResult as ShellResult};
    use crate::ui::MockUI;
    use std::cell::RefCell;
    use std::time::Duration;

    #[derive(Default)]
    struct RecordingRunner {
        ran: RefCell<Vec<String>>,
    }

    impl CommandRunner for RecordingRunner {
        fn run(&self, command: &str, _options: &CommandOptions) -> Result<ShellResult> {
            self.ran.borrow_mut().push(command.to_string());
            Ok(ShellResult::success(String::new(), String::new(), Duration::ZERO))
        }
    }

    fn registry() -> RequirementRegistry {
        RequirementRegistry::new(&RequirementsConfig::default(), "python3")
    }

    fn bare_ubuntu() -> FakeHost {
        FakeHost::new()
            .with_executable("apt-get")
            .with_file("/etc/os-release", "ID=ubuntu\nVERSION_ID=\"22.04\"\n")
    }

    #[test]
    fn dry_run_prints_plan_only() {
        let mut ui = MockUI::new();
        let runner = RecordingRunner::default();
        let args = InstallArgs {
            dry_run: true,
            ..Default::default()
        };

        let result = install(
            &mut ui,
            &registry(),
            &bare_ubuntu(),
            &runner,
            Privilege::Root,
            &args,
        )
        .unwrap();

        assert!(result.success);
        assert!(ui.has_message("apt-get install -y"));
        assert!(ui.has_message("ACCEPT_EULA=Y"));
        assert!(runner.ran.borrow().is_empty());
        assert!(ui.prompts_shown().is_empty());
    }

    #[test]
    fn declined_plan_runs_nothing() {
        let mut ui = MockUI::new();
        let runner = RecordingRunner::default();

        let err = install(
            &mut ui,
            &registry(),
            &bare_ubuntu(),
            &runner,
            Privilege::Root,
            &InstallArgs::default(),
        )
        .unwrap_err();

        assert!(matches!(err, TetherError::ConfirmationDeclined { .. }));
        assert_eq!(ui.prompts_shown(), &["install_plan".to_string()]);
        assert!(runner.ran.borrow().is_empty());
    }

    #[test]
    fn confirmed_plan_runs_every_step() {
        let mut ui = MockUI::new();
        ui.set_confirm_response("install_plan", true);
        let runner = RecordingRunner::default();

        let result = install(
            &mut ui,
            &registry(),
            &bare_ubuntu(),
            &runner,
            Privilege::Root,
            &InstallArgs::default(),
        )
        .unwrap();

        let ran = runner.ran.borrow();
        assert!(ran.iter().any(|c| c == "apt-get update"));
        assert!(ran.iter().any(|c| c.ends_with("msodbcsql17")));
        assert!(ui.has_message(&format!("[1/{}]", ran.len())));
        // The fake host does not change, so the re-probe still sees gaps.
        assert_eq!(result.exit_code, 1);
        assert!(ui.has_error("still missing"));
    }

    #[test]
    fn unprivileged_plan_fails_before_running() {
        let mut ui = MockUI::new();
        let runner = RecordingRunner::default();
        let args = InstallArgs {
            yes: true,
            ..Default::default()
        };

        let err = install(
            &mut ui,
            &registry(),
            &bare_ubuntu(),
            &runner,
            Privilege::Unavailable,
            &args,
        )
        .unwrap_err();

        assert!(matches!(err, TetherError::PrivilegeRequired { .. }));
        assert!(runner.ran.borrow().is_empty());
    }
}

//! `tether check`: probe every system prerequisite.

use serde::Serialize;

use crate::cli::args::CheckArgs;
use crate::cli::exit_codes;
use crate::environment::is_ready;
use crate::error::{Result, TetherError};
use crate::requirements::{DependencyCheckResult, DependencyProbe, RequirementRegistry, SystemHost};
use crate::ui::UserInterface;

use super::context::CommandContext;
use super::dispatcher::{Command, CommandResult};

pub struct CheckCommand {
    context: CommandContext,
    args: CheckArgs,
}

impl CheckCommand {
    pub fn new(context: CommandContext, args: CheckArgs) -> Self {
        Self { context, args }
    }
}

#[derive(Debug, Serialize)]
struct CheckReport<'a> {
    requirements: &'a [DependencyCheckResult],
    environment_ready: bool,
    ok: bool,
}

impl Command for CheckCommand {
    fn execute(&self, ui: &mut dyn UserInterface) -> Result<CommandResult> {
        let config = self.context.load_config()?;
        let registry = RequirementRegistry::new(&config.requirements, &config.environment.python);
        let host = SystemHost::new();
        let results = DependencyProbe::new(&registry, &host).probe_all();
        let environment_ready = is_ready(&self.context.resolve(&config.environment.path));

        report(ui, &results, environment_ready, self.args.json)
    }
}

/// Print results. Fails when a required prerequisite is missing.
fn report(
    ui: &mut dyn UserInterface,
    results: &[DependencyCheckResult],
    environment_ready: bool,
    json: bool,
) -> Result<CommandResult> {
    let ok = !results.iter().any(DependencyCheckResult::is_blocking);

    if json {
        let report = CheckReport {
            requirements: results,
            environment_ready,
            ok,
        };
        let json =
            serde_json::to_string_pretty(&report).map_err(|e| TetherError::Other(e.into()))?;
        ui.emit_json(&json);
    } else {
        ui.show_header("Prerequisites");
        for result in results {
            let version = result
                .version
                .as_deref()
                .map(|v| format!(" {}", v))
                .unwrap_or_default();
            match (&result.caveat, result.present) {
                (Some(caveat), true) => {
                    ui.warning(&format!("{}{}: {}", result.name, version, caveat))
                }
                (None, true) => ui.success(&format!("{}{}", result.name, version)),
                (_, false) if result.required => ui.error(&format!(
                    "{} missing: {}",
                    result.name, result.remediation
                )),
                (_, false) => ui.warning(&format!(
                    "{} missing (optional): {}",
                    result.name, result.remediation
                )),
            }
        }

        if environment_ready {
            ui.success("runtime environment ready");
        } else {
            ui.warning("runtime environment not built");
        }

        if !ok {
            ui.show_hint("tether install");
        } else if !environment_ready {
            ui.show_hint("tether setup");
        }
    }

    if ok {
        Ok(CommandResult::success())
    } else {
        Ok(CommandResult::failure(exit_codes::FAILURE))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ui::MockUI;

    fn results() -> Vec<DependencyCheckResult> {
        vec![
            DependencyCheckResult::present("python3", true, Some("3.10.12".to_string())),
            DependencyCheckResult::missing("curl", false, "apt-get install -y curl"),
            DependencyCheckResult::present("odbc-driver", true, None)
                .with_caveat("found ODBC Driver 18 for SQL Server; set requirements.odbc_driver"),
        ]
    }

    #[test]
    fn optional_missing_still_passes() {
        let mut ui = MockUI::new();
        let result = report(&mut ui, &results(), true, false).unwrap();

        assert!(result.success);
        assert!(ui.has_success("python3 3.10.12"));
        assert!(ui.has_warning("curl missing (optional)"));
        assert!(ui.has_warning("ODBC Driver 18"));
    }

    #[test]
    fn required_missing_fails() {
        let mut ui = MockUI::new();
        let mut results = results();
        results.push(DependencyCheckResult::missing(
            "unixodbc",
            true,
            "apt-get install -y unixodbc unixodbc-dev",
        ));

        let result = report(&mut ui, &results, true, false).unwrap();

        assert_eq!(result.exit_code, 1);
        assert!(ui.has_error("unixodbc missing"));
        assert!(ui.has_hint("tether install"));
    }

    #[test]
    fn missing_environment_hints_setup() {
        let mut ui = MockUI::new();
        report(&mut ui, &results(), false, false).unwrap();
        assert!(ui.has_hint("tether setup"));
    }

    #[test]
    fn json_report() {
        let mut ui = MockUI::new();
        report(&mut ui, &results(), false, true).unwrap();

        let value: serde_json::Value = serde_json::from_str(&ui.json()[0]).unwrap();
        assert_eq!(value["ok"], true);
        assert_eq!(value["environment_ready"], false);
        assert_eq!(value["requirements"][0]["name"], "python3");
        assert_eq!(value["requirements"][1]["present"], false);
    }
}

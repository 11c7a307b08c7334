//! `tether setup`: build the service environment.

use crate::cli::args::SetupArgs;
use crate::cli::exit_codes;
use crate::config::TetherConfig;
use crate::environment::{is_ready, EnvironmentBuilder, Manifest, ManifestEntry};
use crate::error::{Result, TetherError};
use crate::shell::{CommandRunner, ShellRunner};
use crate::ui::{confirm_action, Confirmation, UserInterface};
use std::path::Path;

use super::context::CommandContext;
use super::dispatcher::{Command, CommandResult};

pub struct SetupCommand {
    context: CommandContext,
    args: SetupArgs,
}

impl SetupCommand {
    pub fn new(context: CommandContext, args: SetupArgs) -> Self {
        Self { context, args }
    }
}

impl Command for SetupCommand {
    fn execute(&self, ui: &mut dyn UserInterface) -> Result<CommandResult> {
        let config = self.context.load_config()?;
        setup(
            ui,
            self.context.project_root(),
            &config,
            &ShellRunner,
            &self.args,
        )
    }
}

fn setup(
    ui: &mut dyn UserInterface,
    root: &Path,
    config: &TetherConfig,
    runner: &dyn CommandRunner,
    args: &SetupArgs,
) -> Result<CommandResult> {
    let env_dir = root.join(&config.environment.path);
    let builder = EnvironmentBuilder::new(&env_dir, &config.environment.python, runner);

    if is_ready(&env_dir) && !args.recreate {
        ui.success(&format!("Environment present at {}", env_dir.display()));
    } else {
        let recreate = if env_dir.exists() {
            let question = if is_ready(&env_dir) {
                format!("Delete and rebuild the environment at {}?", env_dir.display())
            } else {
                format!(
                    "{} is incomplete. Delete and rebuild it?",
                    env_dir.display()
                )
            };
            let confirmation = Confirmation::new("recreate_environment", question);
            if !confirm_action(ui, args.yes, &confirmation)? {
                return Err(TetherError::ConfirmationDeclined {
                    action: "recreate environment".to_string(),
                });
            }
            true
        } else {
            false
        };

        let mut spinner = ui.start_spinner("Creating environment");
        match builder.create_environment(recreate) {
            Ok(()) => spinner.finish_success(&format!(
                "Environment created at {}",
                env_dir.display()
            )),
            Err(e) => {
                spinner.finish_error("Environment creation failed");
                return Err(e);
            }
        }
    }

    let mut failed = 0;

    if args.no_install {
        tracing::debug!("Skipping package manifest");
    } else {
        let manifest_path = root.join(&config.environment.manifest);
        if manifest_path.is_file() {
            let manifest = Manifest::load(&manifest_path)?;
            if manifest.is_empty() {
                ui.message("Package manifest is empty");
            }
            let results = builder.install_packages(&manifest, &mut |entry: &ManifestEntry| {
                ui.message(&format!("Installing {}", entry.spec()));
            });
            for result in results.iter().filter(|r| !r.success) {
                failed += 1;
                ui.error(&format!(
                    "{}: {}",
                    result.entry.spec(),
                    result.message.as_deref().unwrap_or("install failed")
                ));
            }
            let installed = results.len() - failed;
            if installed > 0 {
                ui.success(&format!("Installed {} package(s)", installed));
            }
        } else {
            ui.warning(&format!(
                "No package manifest at {}",
                manifest_path.display()
            ));
        }
    }

    for result in builder.verify(&config.environment.critical_imports) {
        if result.success {
            ui.success(&format!("import {}", result.module));
        } else {
            failed += 1;
            ui.error(&format!(
                "import {} failed: {}",
                result.module,
                result.message.as_deref().unwrap_or("no output")
            ));
        }
    }

    if failed > 0 {
        ui.show_hint("tether setup --recreate");
        return Ok(CommandResult::failure(exit_codes::FAILURE));
    }

    ui.show_hint("tether start");
    Ok(CommandResult::success())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::environment::COMPLETE_MARKER;
    use crate::shell::{CommandOptions, CommandResult as ShellResult};
    use crate::ui::MockUI;
    use std::cell::RefCell;
    use std::fs;
    use std::path::PathBuf;
    use std::time::Duration;
    use tempfile::TempDir;

    /// Creates the interpreter on `-m venv`; fails commands matching `failing`.
    #[derive(Default)]
    struct FakePython {
        ran: RefCell<Vec<String>>,
        failing: Vec<&'static str>,
    }

    impl CommandRunner for FakePython {
        fn run(&self, command: &str, _options: &CommandOptions) -> Result<ShellResult> {
            self.ran.borrow_mut().push(command.to_string());
            if let Some(target) = command.split(" -m venv ").nth(1) {
                let dir = PathBuf::from(target.trim_matches('\''));
                fs::create_dir_all(dir.join("bin")).unwrap();
                fs::write(dir.join("bin").join("python"), "").unwrap();
            }
            if self.failing.iter().any(|f| command.contains(f)) {
                return Ok(ShellResult::failure(
                    Some(1),
                    String::new(),
                    "ModuleNotFoundError: No module named 'pyodbc'\n".to_string(),
                    Duration::ZERO,
                ));
            }
            Ok(ShellResult::success(
                "Python 3.10.12\n".to_string(),
                String::new(),
                Duration::ZERO,
            ))
        }
    }

    fn project() -> (TempDir, TetherConfig) {
        let temp = TempDir::new().unwrap();
        fs::write(
            temp.path().join("requirements.txt"),
            "fastapi==0.110.0\n# comment\npyodbc>=5\n",
        )
        .unwrap();
        let mut config = TetherConfig::default();
        config.environment.critical_imports = vec!["fastapi".to_string(), "pyodbc".to_string()];
        (temp, config)
    }

    #[test]
    fn builds_installs_and_verifies() {
        let (temp, config) = project();
        let runner = FakePython::default();
        let mut ui = MockUI::new();

        let result = setup(&mut ui, temp.path(), &config, &runner, &SetupArgs::default()).unwrap();

        assert!(result.success);
        assert!(is_ready(&temp.path().join("venv")));
        assert!(ui.has_message("Installing fastapi==0.110.0"));
        assert!(ui.has_message("Installing pyodbc>=5"));
        assert!(ui.has_success("import pyodbc"));
        assert!(ui.prompts_shown().is_empty());
    }

    #[test]
    fn ready_environment_is_reused() {
        let (temp, config) = project();
        let env = temp.path().join("venv");
        fs::create_dir_all(env.join("bin")).unwrap();
        fs::write(env.join("bin").join("python"), "").unwrap();
        fs::write(env.join(COMPLETE_MARKER), "").unwrap();
        let runner = FakePython::default();
        let mut ui = MockUI::new();
        let args = SetupArgs {
            no_install: true,
            ..Default::default()
        };

        let result = setup(&mut ui, temp.path(), &config, &runner, &args).unwrap();

        assert!(result.success);
        assert!(ui.has_success("Environment present"));
        assert!(!runner.ran.borrow().iter().any(|c| c.contains("-m venv")));
        assert!(!runner.ran.borrow().iter().any(|c| c.contains("pip install")));
    }

    #[test]
    fn incomplete_environment_needs_confirmation() {
        let (temp, config) = project();
        fs::create_dir_all(temp.path().join("venv").join("bin")).unwrap();
        let runner = FakePython::default();
        let mut ui = MockUI::new();

        let err = setup(&mut ui, temp.path(), &config, &runner, &SetupArgs::default()).unwrap_err();

        assert!(matches!(err, TetherError::ConfirmationDeclined { .. }));
        assert_eq!(ui.prompts_shown(), &["recreate_environment".to_string()]);
        assert!(runner.ran.borrow().is_empty());
    }

    #[test]
    fn confirmed_recreate_rebuilds() {
        let (temp, config) = project();
        let env = temp.path().join("venv");
        fs::create_dir_all(&env).unwrap();
        fs::write(env.join("leftover"), "").unwrap();
        let runner = FakePython::default();
        let mut ui = MockUI::new();
        ui.set_confirm_response("recreate_environment", true);

        let result = setup(&mut ui, temp.path(), &config, &runner, &SetupArgs::default()).unwrap();

        assert!(result.success);
        assert!(!env.join("leftover").exists());
        assert!(is_ready(&env));
    }

    #[test]
    fn failed_import_fails_setup() {
        let (temp, config) = project();
        let runner = FakePython {
            failing: vec!["import pyodbc"],
            ..Default::default()
        };
        let mut ui = MockUI::new();

        let result = setup(&mut ui, temp.path(), &config, &runner, &SetupArgs::default()).unwrap();

        assert_eq!(result.exit_code, exit_codes::FAILURE);
        assert!(ui.has_error("import pyodbc failed"));
        assert!(ui.has_success("import fastapi"));
    }

    #[test]
    fn missing_manifest_is_a_warning() {
        let (temp, config) = project();
        fs::remove_file(temp.path().join("requirements.txt")).unwrap();
        let runner = FakePython::default();
        let mut ui = MockUI::new();

        let result = setup(&mut ui, temp.path(), &config, &runner, &SetupArgs::default()).unwrap();

        assert!(result.success);
        assert!(ui.has_warning("No package manifest"));
    }
}

//! Install planning and execution.
//!
//! [`InstallPlanner::build_plan`] turns missing prerequisites into an ordered,
//! deduplicated [`InstallPlan`]. [`execute`] runs it only once the operator
//! has confirmed and privilege is available.

use crate::error::{Result, TetherError};
use crate::requirements::checker::DependencyProbe;
use crate::requirements::host::{Host, OsRelease};
use crate::requirements::registry::{PackageManager, PackageSource, RequirementRegistry, Tier};
use crate::requirements::status::DependencyCheckResult;
use crate::shell::{shell_quote, CommandOptions, CommandRunner, Privilege};
use std::collections::HashSet;

/// One package to install.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageSpec {
    /// Package name for the detected manager.
    pub name: String,
    /// Requirement that asked for it.
    pub requirement: String,
    /// Who can install it.
    pub tier: Tier,
    /// Environment assignments for the install command.
    pub env: Vec<(String, String)>,
}

/// A single command the plan will run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedCommand {
    /// Human-readable description.
    pub description: String,
    /// Shell command.
    pub command: String,
    /// Whether the command needs root.
    pub privileged: bool,
}

/// Ordered install plan.
#[derive(Debug, Clone)]
pub struct InstallPlan {
    /// Package manager the plan targets.
    pub manager: PackageManager,
    /// Requirements covered, dependencies first.
    pub requirements: Vec<String>,
    /// Sources to register before installing.
    pub sources: Vec<PackageSource>,
    /// Packages, System tier before User tier, without duplicates.
    pub packages: Vec<PackageSpec>,
    /// Whether the package index must be refreshed.
    pub refresh_index: bool,
    /// Whether any step needs root.
    pub requires_privilege: bool,
    commands: Vec<PlannedCommand>,
    confirmed: bool,
}

impl InstallPlan {
    /// Record explicit operator consent.
    pub fn confirm(&mut self) {
        self.confirmed = true;
    }

    /// Whether the operator has consented.
    pub fn is_confirmed(&self) -> bool {
        self.confirmed
    }

    /// Whether there is nothing to do.
    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// Commands in execution order.
    pub fn commands(&self) -> &[PlannedCommand] {
        &self.commands
    }

    /// Commands joined for display.
    pub fn script(&self) -> String {
        self.commands
            .iter()
            .map(|c| c.command.as_str())
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Builds install plans for missing prerequisites.
pub struct InstallPlanner<'a> {
    registry: &'a RequirementRegistry,
    host: &'a dyn Host,
}

impl<'a> InstallPlanner<'a> {
    /// Create a planner for the given catalog and host.
    pub fn new(registry: &'a RequirementRegistry, host: &'a dyn Host) -> Self {
        Self { registry, host }
    }

    /// Build a plan covering every missing result and its dependencies.
    ///
    /// Dependencies that are already present are left alone. Present
    /// results (including those with a caveat) are ignored.
    pub fn build_plan(&self, results: &[DependencyCheckResult]) -> Result<InstallPlan> {
        let probe = DependencyProbe::new(self.registry, self.host);
        let manager = probe
            .package_manager()
            .ok_or_else(|| TetherError::DependencyMissing {
                name: "package manager".to_string(),
                remediation: "No supported package manager (apt-get, dnf, yum) found on PATH; \
                              install the prerequisites manually"
                    .to_string(),
            })?;

        let missing: Vec<&str> = results
            .iter()
            .filter(|r| !r.present)
            .map(|r| r.name.as_str())
            .collect();

        let mut order: Vec<String> = Vec::new();
        for name in &missing {
            let chain = probe
                .resolve_install_deps(name)
                .map_err(|e| TetherError::Other(anyhow::anyhow!(e)))?;
            for req in chain {
                let needed = missing.contains(&req.as_str()) || !probe.probe(&req).present;
                if needed && !order.contains(&req) {
                    order.push(req);
                }
            }
        }

        let mut sources = Vec::new();
        let mut seen = HashSet::new();
        let mut system = Vec::new();
        let mut user = Vec::new();

        for name in &order {
            let Some(req) = self.registry.get(name) else {
                continue;
            };

            if let Some(source) = req.source {
                let registered = self.host.path_exists(&source.list_file(manager));
                if registered {
                    tracing::debug!("{} already registered", source.name());
                } else if !sources.contains(&source) {
                    sources.push(source);
                }
            }

            for package in req.packages_for(manager) {
                if !seen.insert(package.clone()) {
                    continue;
                }
                let spec = PackageSpec {
                    name: package.clone(),
                    requirement: req.name.clone(),
                    tier: req.tier,
                    env: req.env.clone(),
                };
                match req.tier {
                    Tier::System => system.push(spec),
                    Tier::User => user.push(spec),
                }
            }
        }

        let refresh_index = !sources.is_empty();
        let mut packages = system;
        packages.extend(user);

        let commands = self.commands_for(manager, &sources, refresh_index, &packages)?;
        let requires_privilege = commands.iter().any(|c| c.privileged);

        Ok(InstallPlan {
            manager,
            requirements: order,
            sources,
            packages,
            refresh_index,
            requires_privilege,
            commands,
            confirmed: false,
        })
    }

    fn commands_for(
        &self,
        manager: PackageManager,
        sources: &[PackageSource],
        refresh_index: bool,
        packages: &[PackageSpec],
    ) -> Result<Vec<PlannedCommand>> {
        let mut commands = Vec::new();

        if !sources.is_empty() {
            let os = OsRelease::detect(self.host).unwrap_or_default();
            for source in sources {
                for command in source.register_commands(manager, &os)? {
                    commands.push(PlannedCommand {
                        description: format!("Register {}", source.name()),
                        command,
                        privileged: true,
                    });
                }
            }
        }

        if refresh_index {
            commands.push(PlannedCommand {
                description: "Refresh package index".to_string(),
                command: manager.refresh_command().to_string(),
                privileged: true,
            });
        }

        // Consecutive packages sharing tier and env go into one command.
        let mut batch: Vec<&PackageSpec> = Vec::new();
        for spec in packages {
            if let Some(first) = batch.first() {
                if first.tier != spec.tier || first.env != spec.env {
                    commands.push(batch_command(manager, &batch));
                    batch.clear();
                }
            }
            batch.push(spec);
        }
        if !batch.is_empty() {
            commands.push(batch_command(manager, &batch));
        }

        Ok(commands)
    }
}

fn batch_command(manager: PackageManager, batch: &[&PackageSpec]) -> PlannedCommand {
    let names: Vec<String> = batch.iter().map(|s| s.name.clone()).collect();
    let env = &batch[0].env;
    match batch[0].tier {
        Tier::System => PlannedCommand {
            description: format!("Install {}", names.join(", ")),
            command: manager.install_command(&names, env),
            privileged: true,
        },
        Tier::User => {
            let quoted: Vec<String> = names.iter().map(|n| shell_quote(n)).collect();
            PlannedCommand {
                description: format!("Install {} for the current user", names.join(", ")),
                command: format!("python3 -m pip install --user {}", quoted.join(" ")),
                privileged: false,
            }
        }
    }
}

/// Execute a confirmed plan.
///
/// Fails before running anything when the plan is unconfirmed or needs
/// privilege that is unavailable. Stops at the first failing command.
/// `on_step` is called before each command with its index and description.
pub fn execute(
    plan: &InstallPlan,
    runner: &dyn CommandRunner,
    privilege: Privilege,
    on_step: &mut dyn FnMut(usize, &PlannedCommand),
) -> Result<usize> {
    if !plan.is_confirmed() {
        return Err(TetherError::PlanNotConfirmed);
    }

    if plan.requires_privilege && privilege == Privilege::Unavailable {
        return Err(TetherError::PrivilegeRequired {
            commands: plan
                .commands()
                .iter()
                .map(|c| {
                    if c.privileged {
                        format!("  sudo sh -c {}", shell_quote(&c.command))
                    } else {
                        format!("  {}", c.command)
                    }
                })
                .collect::<Vec<_>>()
                .join("\n"),
        });
    }

    for (index, step) in plan.commands().iter().enumerate() {
        on_step(index, step);
        let command = if step.privileged {
            privilege
                .wrap(&step.command)
                .unwrap_or_else(|| step.command.clone())
        } else {
            step.command.clone()
        };

        tracing::info!("Running install step: {}", step.description);
        let result = runner.run(&command, &CommandOptions::captured())?;
        if !result.success {
            tracing::warn!(
                "Install step failed ({:?}): {}",
                result.exit_code,
                result.last_line().unwrap_or("")
            );
            return Err(TetherError::CommandFailed {
                command: step.command.clone(),
                code: result.exit_code,
            });
        }
    }

    Ok(plan.commands().len())
}

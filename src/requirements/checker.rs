//! Prerequisite probing.
//!
//! [`DependencyProbe`] inspects the host for each catalog entry. It only
//! runs query commands and reads files; results are never cached, so two
//! probes with no change on the host in between agree.

use crate::requirements::host::Host;
use crate::requirements::registry::{
    PackageManager, Requirement, RequirementCheck, RequirementRegistry,
};
use crate::requirements::status::DependencyCheckResult;
use crate::requirements::version::{extract_version, Version};
use std::collections::HashSet;
use std::path::Path;

/// System-wide ODBC driver registry.
pub const ODBCINST_INI: &str = "/etc/odbcinst.ini";

/// Checks whether requirements are satisfied on the host.
pub struct DependencyProbe<'a> {
    registry: &'a RequirementRegistry,
    host: &'a dyn Host,
    manager: Option<PackageManager>,
}

impl<'a> DependencyProbe<'a> {
    /// Create a probe over `registry` inspecting `host`.
    pub fn new(registry: &'a RequirementRegistry, host: &'a dyn Host) -> Self {
        Self {
            registry,
            host,
            manager: PackageManager::detect(host),
        }
    }

    /// Package manager found on the host, if any.
    pub fn package_manager(&self) -> Option<PackageManager> {
        self.manager
    }

    /// Probe the whole catalog in catalog order.
    pub fn probe_all(&self) -> Vec<DependencyCheckResult> {
        self.registry.iter().map(|req| self.check(req)).collect()
    }

    /// Probe one requirement by name.
    ///
    /// Unknown names are reported as missing and required.
    pub fn probe(&self, name: &str) -> DependencyCheckResult {
        match self.registry.get(name) {
            Some(req) => self.check(req),
            None => DependencyCheckResult::missing(
                name,
                true,
                format!("'{}' is not a known requirement", name),
            ),
        }
    }

    fn check(&self, req: &Requirement) -> DependencyCheckResult {
        let remediation = req.remediation(self.manager);
        let result = match &req.check {
            RequirementCheck::Version { command, minimum } => {
                self.check_version(req, command, *minimum, remediation)
            }
            RequirementCheck::CommandSucceeds(command) => match self.host.query(command) {
                Some(out) if out.success => DependencyCheckResult::present(
                    &req.name,
                    req.required,
                    extract_version(&format!("{}{}", out.stdout, out.stderr)),
                ),
                _ => DependencyCheckResult::missing(&req.name, req.required, remediation),
            },
            RequirementCheck::OnPath(tool) => match self.host.find_executable(tool) {
                Some(path) => {
                    let version = self
                        .host
                        .query(&format!("{} --version", path.display()))
                        .filter(|out| out.success)
                        .and_then(|out| extract_version(&out.stdout));
                    DependencyCheckResult::present(&req.name, req.required, version)
                }
                None => DependencyCheckResult::missing(&req.name, req.required, remediation),
            },
            RequirementCheck::OdbcDriver {
                configured,
                alternatives,
            } => self.check_odbc_driver(req, configured, alternatives, remediation),
        };

        tracing::debug!(
            "Probed {}: present={} version={:?}",
            result.name,
            result.present,
            result.version
        );
        result
    }

    fn check_version(
        &self,
        req: &Requirement,
        command: &str,
        minimum: Version,
        remediation: String,
    ) -> DependencyCheckResult {
        let Some(out) = self
            .host
            .query(&format!("{} --version", command))
            .filter(|out| out.success)
        else {
            return DependencyCheckResult::missing(&req.name, req.required, remediation);
        };

        // Python 2 prints its banner on stderr.
        let banner = format!("{}{}", out.stdout, out.stderr);
        match Version::parse(&banner) {
            Some(found) if found >= minimum => DependencyCheckResult::present(
                &req.name,
                req.required,
                extract_version(&banner),
            ),
            Some(found) => DependencyCheckResult::missing(
                &req.name,
                req.required,
                format!(
                    "{} {} is older than the required {}.{}; {}",
                    command, found, minimum.major, minimum.minor, remediation
                ),
            )
            .with_version(Some(found.to_string())),
            None => DependencyCheckResult::missing(&req.name, req.required, remediation),
        }
    }

    fn check_odbc_driver(
        &self,
        req: &Requirement,
        configured: &str,
        alternatives: &[String],
        remediation: String,
    ) -> DependencyCheckResult {
        let installed = self.installed_odbc_drivers();

        if installed.contains(configured) {
            return DependencyCheckResult::present(&req.name, req.required, None);
        }

        if let Some(alt) = alternatives.iter().find(|a| installed.contains(a.as_str())) {
            return DependencyCheckResult::present(&req.name, req.required, None).with_caveat(
                format!(
                    "'{}' is not installed but '{}' is; point the service's DB_DRIVER \
                     setting at '{}' instead of reinstalling",
                    configured, alt, alt
                ),
            );
        }

        DependencyCheckResult::missing(&req.name, req.required, remediation)
    }

    /// Driver names registered with unixODBC.
    ///
    /// Prefers `odbcinst -q -d`, falling back to reading the ini file when
    /// the tool is unavailable.
    pub fn installed_odbc_drivers(&self) -> HashSet<String> {
        if self.host.find_executable("odbcinst").is_some() {
            if let Some(out) = self.host.query("odbcinst -q -d").filter(|o| o.success) {
                return parse_ini_sections(&out.stdout);
            }
        }
        self.host
            .read_file(Path::new(ODBCINST_INI))
            .map(|content| parse_ini_sections(&content))
            .unwrap_or_default()
    }

    /// Resolve the install dependency chain for a requirement.
    ///
    /// Returns the ordered list of requirements that need to be installed,
    /// with dependencies before dependents. Max depth 5, detects circular deps.
    pub fn resolve_install_deps(&self, requirement: &str) -> Result<Vec<String>, String> {
        let mut chain = Vec::new();
        let mut visited = HashSet::new();
        self.resolve_deps_recursive(requirement, &mut chain, &mut visited, 0)?;
        Ok(chain)
    }

    fn resolve_deps_recursive(
        &self,
        requirement: &str,
        chain: &mut Vec<String>,
        visited: &mut HashSet<String>,
        depth: usize,
    ) -> Result<(), String> {
        const MAX_DEPTH: usize = 5;

        if depth > MAX_DEPTH {
            return Err(format!(
                "Requirement dependency chain exceeds max depth of {} for '{}'",
                MAX_DEPTH, requirement
            ));
        }

        if visited.contains(requirement) {
            return Err(format!(
                "Circular dependency detected: '{}' appears twice in the chain",
                requirement
            ));
        }

        let Some(req) = self.registry.get(requirement) else {
            return Err(format!("'{}' is not a known requirement", requirement));
        };

        visited.insert(requirement.to_string());

        for dep in &req.depends_on {
            self.resolve_deps_recursive(dep, chain, visited, depth + 1)?;
        }

        if !chain.iter().any(|c| c == requirement) {
            chain.push(requirement.to_string());
        }

        visited.remove(requirement);
        Ok(())
    }
}

/// Collect `[section]` names from ini-style text.
fn parse_ini_sections(content: &str) -> HashSet<String> {
    content
        .lines()
        .map(str::trim)
        .filter_map(|line| line.strip_prefix('[')?.strip_suffix(']'))
        .map(|name| name.trim().to_string())
        .filter(|name| !name.is_empty() && name != "ODBC")
        .collect()
}

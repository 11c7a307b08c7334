//! Requirement catalog and package manager definitions.
//!
//! Defines which prerequisites exist, how to check them, and which packages
//! provide them on each supported package manager.

use crate::config::RequirementsConfig;
use crate::error::{Result, TetherError};
use crate::requirements::host::{Host, OsRelease};
use crate::requirements::version::Version;
use crate::shell::shell_quote;
use std::path::PathBuf;

/// Supported system package managers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PackageManager {
    Apt,
    Dnf,
    Yum,
}

impl PackageManager {
    /// Detect the package manager by PATH lookup, preferring apt then dnf.
    pub fn detect(host: &dyn Host) -> Option<Self> {
        if host.find_executable("apt-get").is_some() {
            return Some(PackageManager::Apt);
        }
        if host.find_executable("dnf").is_some() {
            return Some(PackageManager::Dnf);
        }
        if host.find_executable("yum").is_some() {
            return Some(PackageManager::Yum);
        }
        None
    }

    /// Executable name.
    pub fn name(&self) -> &'static str {
        match self {
            PackageManager::Apt => "apt-get",
            PackageManager::Dnf => "dnf",
            PackageManager::Yum => "yum",
        }
    }

    /// Whether this manager uses Debian packages.
    pub fn is_apt(&self) -> bool {
        matches!(self, PackageManager::Apt)
    }

    /// Non-interactive install of `packages` with `env` assignments prefixed.
    pub fn install_command(&self, packages: &[String], env: &[(String, String)]) -> String {
        let mut parts: Vec<String> = env
            .iter()
            .map(|(k, v)| format!("{}={}", k, shell_quote(v)))
            .collect();
        parts.push(self.name().to_string());
        parts.push("install".to_string());
        parts.push("-y".to_string());
        parts.extend(packages.iter().map(|p| shell_quote(p)));
        parts.join(" ")
    }

    /// Command refreshing the package index.
    pub fn refresh_command(&self) -> &'static str {
        match self {
            PackageManager::Apt => "apt-get update",
            PackageManager::Dnf => "dnf makecache",
            PackageManager::Yum => "yum makecache",
        }
    }
}

/// Third-party package repositories a requirement may need.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PackageSource {
    /// packages.microsoft.com, provides `msodbcsql17`.
    Microsoft,
}

impl PackageSource {
    /// Display name.
    pub fn name(&self) -> &'static str {
        match self {
            PackageSource::Microsoft => "Microsoft packages",
        }
    }

    /// File whose presence means the source is already registered.
    pub fn list_file(&self, manager: PackageManager) -> PathBuf {
        match (self, manager) {
            (PackageSource::Microsoft, PackageManager::Apt) => {
                PathBuf::from("/etc/apt/sources.list.d/mssql-release.list")
            }
            (PackageSource::Microsoft, _) => PathBuf::from("/etc/yum.repos.d/mssql-release.repo"),
        }
    }

    /// Commands registering the source for this distribution.
    pub fn register_commands(
        &self,
        manager: PackageManager,
        os: &OsRelease,
    ) -> Result<Vec<String>> {
        match self {
            PackageSource::Microsoft => microsoft_register_commands(manager, os),
        }
    }
}

fn microsoft_register_commands(manager: PackageManager, os: &OsRelease) -> Result<Vec<String>> {
    let list_file = PackageSource::Microsoft.list_file(manager);
    if manager.is_apt() {
        let distro = if os.id == "ubuntu" || os.id == "debian" {
            os.id.as_str()
        } else if os.is_like("ubuntu") {
            "ubuntu"
        } else if os.is_like("debian") {
            "debian"
        } else {
            ""
        };
        if distro.is_empty() || os.version_id.is_empty() {
            return Err(unsupported_distribution(os));
        }
        let version = if distro == "debian" {
            os.major_version().to_string()
        } else {
            os.version_id.clone()
        };
        Ok(vec![
            "curl -fsSL https://packages.microsoft.com/keys/microsoft.asc \
             -o /etc/apt/trusted.gpg.d/microsoft.asc"
                .to_string(),
            format!(
                "curl -fsSL https://packages.microsoft.com/config/{}/{}/prod.list -o {}",
                distro,
                version,
                list_file.display()
            ),
        ])
    } else {
        if !(os.is_like("rhel") || os.is_like("fedora") || os.is_like("centos")) {
            return Err(unsupported_distribution(os));
        }
        Ok(vec![format!(
            "curl -fsSL https://packages.microsoft.com/config/rhel/{}/prod.repo -o {}",
            os.major_version(),
            list_file.display()
        )])
    }
}

fn unsupported_distribution(os: &OsRelease) -> TetherError {
    TetherError::DependencyMissing {
        name: "odbc-driver".to_string(),
        remediation: format!(
            "No Microsoft package source is known for '{} {}'; install msodbcsql17 manually",
            os.id, os.version_id
        ),
    }
}

/// Who can install a package.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Tier {
    /// Needs root.
    System,
    /// Installed into the invoking user's home.
    User,
}

/// How to check if a requirement is met.
#[derive(Debug, Clone, PartialEq)]
pub enum RequirementCheck {
    /// Run `<command> --version` and compare against a minimum.
    Version { command: String, minimum: Version },

    /// Run a command and check exit code 0.
    CommandSucceeds(String),

    /// Check a tool is on PATH.
    OnPath(String),

    /// Check an ODBC driver is registered, accepting alternatives with a caveat.
    OdbcDriver {
        configured: String,
        alternatives: Vec<String>,
    },
}

/// A requirement definition.
#[derive(Debug, Clone)]
pub struct Requirement {
    /// Requirement name (e.g., "unixodbc", "odbc-driver")
    pub name: String,
    /// Whether the service cannot run without it
    pub required: bool,
    /// How to check for it
    pub check: RequirementCheck,
    /// Install tier
    pub tier: Tier,
    /// Debian packages
    pub apt: Vec<String>,
    /// RPM packages (dnf and yum)
    pub rpm: Vec<String>,
    /// Environment assignments needed by the install command
    pub env: Vec<(String, String)>,
    /// Repository that must be registered first
    pub source: Option<PackageSource>,
    /// Requirements that must be installed before this one
    pub depends_on: Vec<String>,
    /// Instructions when no supported package manager exists
    pub install_hint: String,
}

impl Requirement {
    fn system(name: &str, check: RequirementCheck, apt: &[&str], rpm: &[&str]) -> Self {
        Self {
            name: name.to_string(),
            required: true,
            check,
            tier: Tier::System,
            apt: apt.iter().map(|s| s.to_string()).collect(),
            rpm: rpm.iter().map(|s| s.to_string()).collect(),
            env: Vec::new(),
            source: None,
            depends_on: Vec::new(),
            install_hint: format!("Install {} with your system package manager", name),
        }
    }

    /// Packages providing this requirement on `manager`.
    pub fn packages_for(&self, manager: PackageManager) -> &[String] {
        if manager.is_apt() {
            &self.apt
        } else {
            &self.rpm
        }
    }

    /// Operator-facing instructions for installing this requirement.
    pub fn remediation(&self, manager: Option<PackageManager>) -> String {
        match manager {
            Some(manager) if self.source.is_some() => format!(
                "Run 'tether install' to register {} and install {}",
                self.source.map(|s| s.name()).unwrap_or_default(),
                self.packages_for(manager).join(" ")
            ),
            Some(manager) => match self.tier {
                Tier::System => format!(
                    "Run 'tether install' or: sudo {}",
                    manager.install_command(self.packages_for(manager), &self.env)
                ),
                Tier::User => "Run 'tether install'".to_string(),
            },
            None => self.install_hint.clone(),
        }
    }
}

/// Ordered catalog of known requirements.
#[derive(Debug, Clone)]
pub struct RequirementRegistry {
    requirements: Vec<Requirement>,
}

impl RequirementRegistry {
    /// Build the catalog for the supervised service.
    pub fn new(config: &RequirementsConfig, python: &str) -> Self {
        let minimum = Version::parse(&config.min_python).unwrap_or(Version {
            major: 3,
            minor: 8,
            patch: 0,
        });

        let python3 = Requirement::system(
            "python3",
            RequirementCheck::Version {
                command: python.to_string(),
                minimum,
            },
            &["python3"],
            &["python3"],
        );

        let venv = Requirement::system(
            "python3-venv",
            RequirementCheck::CommandSucceeds(format!("{} -m venv --help", python)),
            &["python3-venv"],
            &["python3"],
        );

        let pip = Requirement::system(
            "pip",
            RequirementCheck::CommandSucceeds(format!("{} -m pip --version", python)),
            &["python3-pip"],
            &["python3-pip"],
        );

        let curl = Requirement {
            required: false,
            ..Requirement::system(
                "curl",
                RequirementCheck::OnPath("curl".to_string()),
                &["curl"],
                &["curl"],
            )
        };

        let unixodbc = Requirement::system(
            "unixodbc",
            RequirementCheck::OnPath("odbcinst".to_string()),
            &["unixodbc", "unixodbc-dev"],
            &["unixODBC", "unixODBC-devel"],
        );

        let driver = Requirement {
            env: vec![("ACCEPT_EULA".to_string(), "Y".to_string())],
            source: Some(PackageSource::Microsoft),
            depends_on: vec!["unixodbc".to_string(), "curl".to_string()],
            install_hint: format!(
                "Install '{}' from https://learn.microsoft.com/sql/connect/odbc/linux-mac/",
                config.odbc_driver
            ),
            ..Requirement::system(
                "odbc-driver",
                RequirementCheck::OdbcDriver {
                    configured: config.odbc_driver.clone(),
                    alternatives: config.odbc_alternatives.clone(),
                },
                &["msodbcsql17"],
                &["msodbcsql17"],
            )
        };

        Self::from_requirements(vec![python3, venv, pip, curl, unixodbc, driver])
    }

    /// Build a registry from explicit definitions, keeping their order.
    pub fn from_requirements(requirements: Vec<Requirement>) -> Self {
        Self { requirements }
    }

    /// Look up a requirement by name.
    pub fn get(&self, name: &str) -> Option<&Requirement> {
        self.requirements.iter().find(|r| r.name == name)
    }

    /// Requirements in catalog order.
    pub fn iter(&self) -> impl Iterator<Item = &Requirement> {
        self.requirements.iter()
    }

    /// Names in catalog order.
    pub fn known_names(&self) -> Vec<&str> {
        self.requirements.iter().map(|r| r.name.as_str()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::requirements::host::fake::FakeHost;

    fn registry() -> RequirementRegistry {
        RequirementRegistry::new(&RequirementsConfig::default(), "python3")
    }

    #[test]
    fn catalog_order_is_stable() {
        assert_eq!(
            registry().known_names(),
            vec!["python3", "python3-venv", "pip", "curl", "unixodbc", "odbc-driver"]
        );
    }

    #[test]
    fn driver_depends_on_unixodbc_and_curl() {
        let registry = registry();
        let driver = registry.get("odbc-driver").unwrap();
        assert_eq!(driver.depends_on, vec!["unixodbc", "curl"]);
        assert_eq!(driver.source, Some(PackageSource::Microsoft));
        assert!(driver
            .env
            .contains(&("ACCEPT_EULA".to_string(), "Y".to_string())));
    }

    #[test]
    fn curl_is_optional() {
        assert!(!registry().get("curl").unwrap().required);
        assert!(registry().get("unixodbc").unwrap().required);
    }

    #[test]
    fn unixodbc_packages_differ_per_manager() {
        let registry = registry();
        let odbc = registry.get("unixodbc").unwrap();
        assert_eq!(odbc.packages_for(PackageManager::Apt), ["unixodbc", "unixodbc-dev"]);
        assert_eq!(odbc.packages_for(PackageManager::Dnf), ["unixODBC", "unixODBC-devel"]);
    }

    #[test]
    fn python_command_flows_into_checks() {
        let registry = RequirementRegistry::new(&RequirementsConfig::default(), "python3.11");
        assert_eq!(
            registry.get("pip").unwrap().check,
            RequirementCheck::CommandSucceeds("python3.11 -m pip --version".to_string())
        );
    }

    #[test]
    fn unknown_name_is_none() {
        assert!(registry().get("postgres").is_none());
    }

    #[test]
    fn install_command_prefixes_env() {
        let cmd = PackageManager::Apt.install_command(
            &["msodbcsql17".to_string()],
            &[("ACCEPT_EULA".to_string(), "Y".to_string())],
        );
        assert_eq!(cmd, "ACCEPT_EULA=Y apt-get install -y msodbcsql17");
    }

    #[test]
    fn detect_prefers_apt() {
        let host = FakeHost::new().with_executable("apt-get").with_executable("yum");
        assert_eq!(PackageManager::detect(&host), Some(PackageManager::Apt));
        let host = FakeHost::new().with_executable("yum");
        assert_eq!(PackageManager::detect(&host), Some(PackageManager::Yum));
        assert_eq!(PackageManager::detect(&FakeHost::new()), None);
    }

    #[test]
    fn microsoft_source_for_ubuntu() {
        let os = OsRelease::parse("ID=ubuntu\nVERSION_ID=\"22.04\"\n");
        let cmds = PackageSource::Microsoft
            .register_commands(PackageManager::Apt, &os)
            .unwrap();
        assert_eq!(cmds.len(), 2);
        assert!(cmds[1].contains("/config/ubuntu/22.04/prod.list"));
        assert!(cmds[1].ends_with("/etc/apt/sources.list.d/mssql-release.list"));
    }

    #[test]
    fn microsoft_source_for_debian_uses_major() {
        let os = OsRelease::parse("ID=debian\nVERSION_ID=\"12\"\n");
        let cmds = PackageSource::Microsoft
            .register_commands(PackageManager::Apt, &os)
            .unwrap();
        assert!(cmds[1].contains("/config/debian/12/prod.list"));
    }

    #[test]
    fn microsoft_source_for_rhel_like() {
        let os = OsRelease::parse("ID=rocky\nID_LIKE=\"rhel centos fedora\"\nVERSION_ID=9.3\n");
        let cmds = PackageSource::Microsoft
            .register_commands(PackageManager::Dnf, &os)
            .unwrap();
        assert_eq!(cmds.len(), 1);
        assert!(cmds[0].contains("/config/rhel/9/prod.repo"));
    }

    #[test]
    fn microsoft_source_rejects_unknown_distro() {
        let os = OsRelease::parse("ID=alpine\nVERSION_ID=3.19\n");
        assert!(PackageSource::Microsoft
            .register_commands(PackageManager::Apt, &os)
            .is_err());
    }

    #[test]
    fn remediation_names_install_command() {
        let registry = registry();
        let text = registry
            .get("unixodbc")
            .unwrap()
            .remediation(Some(PackageManager::Apt));
        assert!(text.contains("apt-get install -y unixodbc unixodbc-dev"));
    }

    #[test]
    fn remediation_for_sourced_package_points_at_install() {
        let registry = registry();
        let text = registry
            .get("odbc-driver")
            .unwrap()
            .remediation(Some(PackageManager::Apt));
        assert!(text.contains("tether install"));
        assert!(text.contains("msodbcsql17"));
    }

    #[test]
    fn remediation_without_manager_uses_hint() {
        let registry = registry();
        let text = registry.get("odbc-driver").unwrap().remediation(None);
        assert!(text.contains("ODBC Driver 17 for SQL Server"));
    }
}

//! Configuration file discovery and loading.
//!
//! Looks for `.tether/config.yml` and `.tether/config.local.yml` under the
//! project root. Missing files are not an error; defaults fill every key.

use crate::config::merger::merge_configs;
use crate::config::schema::TetherConfig;
use crate::error::{Result, TetherError};
use std::fs;
use std::path::{Path, PathBuf};

/// Directory holding tether's config and state inside a project.
pub const CONFIG_DIR: &str = ".tether";

/// Paths to configuration files in merge order (later overrides earlier).
#[derive(Debug, Clone)]
pub struct ConfigPaths {
    /// Project config: .tether/config.yml
    pub project: Option<PathBuf>,

    /// Local overrides: .tether/config.local.yml
    pub project_local: Option<PathBuf>,
}

impl ConfigPaths {
    /// Discover config files for the given project root.
    pub fn discover(project_root: &Path) -> Self {
        Self {
            project: existing(project_root.join(CONFIG_DIR).join("config.yml")),
            project_local: existing(project_root.join(CONFIG_DIR).join("config.local.yml")),
        }
    }

    /// Returns all existing config paths in merge order.
    pub fn all_existing(&self) -> Vec<&PathBuf> {
        self.project.iter().chain(self.project_local.iter()).collect()
    }
}

fn existing(path: PathBuf) -> Option<PathBuf> {
    if path.exists() {
        Some(path)
    } else {
        None
    }
}

/// Find the project root by walking up from `start`.
///
/// Looks for a `.tether` directory, then for the default entrypoint
/// (`main.py`) next to a `requirements.txt`.
pub fn find_project_root(start: &Path) -> Option<PathBuf> {
    let mut current = start.to_path_buf();

    loop {
        if current.join(CONFIG_DIR).is_dir() {
            return Some(current);
        }

        if current.join("main.py").is_file() && current.join("requirements.txt").is_file() {
            return Some(current);
        }

        if !current.pop() {
            return None;
        }
    }
}

/// Load a config file as a raw YAML value (for merging).
pub fn load_config_value(path: &Path) -> Result<serde_yaml::Value> {
    let content = fs::read_to_string(path)?;

    // An empty file parses to Null; treat it as an empty mapping.
    if content.trim().is_empty() {
        return Ok(serde_yaml::Value::Mapping(Default::default()));
    }

    serde_yaml::from_str(&content).map_err(|e| TetherError::ConfigParseError {
        path: path.to_path_buf(),
        message: e.to_string(),
    })
}

/// Parse YAML content into a [`TetherConfig`].
pub fn parse_config(content: &str, source_path: &Path) -> Result<TetherConfig> {
    if content.trim().is_empty() {
        return Ok(TetherConfig::default());
    }
    serde_yaml::from_str(content).map_err(|e| TetherError::ConfigParseError {
        path: source_path.to_path_buf(),
        message: e.to_string(),
    })
}

/// Load and merge all config files for a project.
pub fn load_merged_config(project_root: &Path) -> Result<TetherConfig> {
    let paths = ConfigPaths::discover(project_root);

    let mut configs = Vec::new();
    for path in paths.all_existing() {
        tracing::debug!("Loading config {}", path.display());
        configs.push(load_config_value(path)?);
    }

    let merged = merge_configs(&configs);

    serde_yaml::from_value(merged).map_err(|e| TetherError::ConfigParseError {
        path: project_root.join(CONFIG_DIR).join("config.yml"),
        message: format!("Failed to parse merged config: {}", e),
    })
}

/// Load config with optional path override.
///
/// If `config_override` is provided, loads only that file without merging;
/// it must exist.
pub fn load_config(project_root: &Path, config_override: Option<&Path>) -> Result<TetherConfig> {
    match config_override {
        Some(path) => {
            let content = fs::read_to_string(path).map_err(|e| TetherError::ConfigParseError {
                path: path.to_path_buf(),
                message: e.to_string(),
            })?;
            parse_config(&content, path)
        }
        None => load_merged_config(project_root),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write_config(root: &Path, name: &str, content: &str) {
        let dir = root.join(CONFIG_DIR);
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join(name), content).unwrap();
    }

    #[test]
    fn discover_finds_project_and_local() {
        let temp = TempDir::new().unwrap();
        write_config(temp.path(), "config.yml", "");
        write_config(temp.path(), "config.local.yml", "");

        let paths = ConfigPaths::discover(temp.path());
        assert!(paths.project.is_some());
        assert!(paths.project_local.is_some());

        let all = paths.all_existing();
        assert_eq!(all.len(), 2);
        assert!(all[0].ends_with("config.yml"));
        assert!(all[1].ends_with("config.local.yml"));
    }

    #[test]
    fn missing_config_means_defaults() {
        let temp = TempDir::new().unwrap();
        let config = load_merged_config(temp.path()).unwrap();
        assert_eq!(config, TetherConfig::default());
    }

    #[test]
    fn local_overrides_project() {
        let temp = TempDir::new().unwrap();
        write_config(
            temp.path(),
            "config.yml",
            "service:\n  port: 7000\n  entrypoint: app.py\n",
        );
        write_config(temp.path(), "config.local.yml", "service:\n  port: 7001\n");

        let config = load_merged_config(temp.path()).unwrap();
        assert_eq!(config.service.port, 7001);
        assert_eq!(config.service.entrypoint, PathBuf::from("app.py"));
    }

    #[test]
    fn empty_project_file_is_fine() {
        let temp = TempDir::new().unwrap();
        write_config(temp.path(), "config.yml", "");
        let config = load_merged_config(temp.path()).unwrap();
        assert_eq!(config.service.port, 63400);
    }

    #[test]
    fn invalid_yaml_reports_path() {
        let temp = TempDir::new().unwrap();
        write_config(temp.path(), "config.yml", "service: [unclosed");

        let err = load_merged_config(temp.path()).unwrap_err();
        match err {
            TetherError::ConfigParseError { path, .. } => {
                assert!(path.ends_with("config.yml"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn wrong_type_is_parse_error() {
        let temp = TempDir::new().unwrap();
        write_config(temp.path(), "config.yml", "service:\n  port: not-a-number\n");
        assert!(matches!(
            load_merged_config(temp.path()),
            Err(TetherError::ConfigParseError { .. })
        ));
    }

    #[test]
    fn override_path_skips_discovery() {
        let temp = TempDir::new().unwrap();
        write_config(temp.path(), "config.yml", "service:\n  port: 7000\n");
        let other = temp.path().join("other.yml");
        fs::write(&other, "service:\n  port: 9999\n").unwrap();

        let config = load_config(temp.path(), Some(&other)).unwrap();
        assert_eq!(config.service.port, 9999);
    }

    #[test]
    fn override_path_must_exist() {
        let temp = TempDir::new().unwrap();
        let missing = temp.path().join("nope.yml");
        assert!(load_config(temp.path(), Some(&missing)).is_err());
    }

    #[test]
    fn find_project_root_finds_tether_dir() {
        let temp = TempDir::new().unwrap();
        let subdir = temp.path().join("app").join("logs");
        fs::create_dir_all(&subdir).unwrap();
        fs::create_dir_all(temp.path().join(CONFIG_DIR)).unwrap();

        assert_eq!(find_project_root(&subdir), Some(temp.path().to_path_buf()));
    }

    #[test]
    fn find_project_root_finds_service_layout() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("main.py"), "").unwrap();
        fs::write(temp.path().join("requirements.txt"), "").unwrap();
        let subdir = temp.path().join("logs");
        fs::create_dir_all(&subdir).unwrap();

        assert_eq!(find_project_root(&subdir), Some(temp.path().to_path_buf()));
    }
}

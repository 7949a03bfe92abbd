//! Configuration handling for lend
//!
//! Configuration is stored in `.lend/config.toml` (project) and
//! `~/.config/lend/config.toml` (global).

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::query::DEFAULT_PAGE_SIZE;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid configuration: {0}")]
    Invalid(String),

    #[error("Failed to parse configuration: {0}")]
    Parse(String),
}

/// Catalog listing settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct CatalogConfig {
    /// Tasks per page in listings
    pub page_size: usize,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

/// Who commands run as when no `--as` flag is given
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(default)]
pub struct IdentityConfig {
    /// User ID or e-mail address of a registered user
    pub user: Option<String>,
}

/// Project-level configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(default)]
pub struct ProjectConfig {
    /// Listing settings
    pub catalog: CatalogConfig,

    /// Default acting identity
    pub identity: IdentityConfig,
}

impl ProjectConfig {
    /// Rejects settings that cannot work
    pub fn validate(&self) -> std::result::Result<(), ConfigError> {
        if self.catalog.page_size == 0 {
            return Err(ConfigError::Invalid(
                "catalog.page_size must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// Global user configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct GlobalConfig {
    /// Default output format (text or json)
    pub default_format: OutputFormat,

    /// Fallback identity when the project names none
    pub user: Option<String>,
}

/// Output format for commands
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

/// Combined configuration (global + project)
#[derive(Debug, Clone)]
pub struct Config {
    pub project: ProjectConfig,
    pub global: GlobalConfig,
    pub project_root: Option<PathBuf>,
}

impl Config {
    /// Loads configuration for a specific project
    pub fn for_project(project_root: &Path) -> Result<Self> {
        let global = Self::load_global()?;
        let project = Self::load_project_config(project_root)?;

        Ok(Self {
            project,
            global,
            project_root: Some(project_root.to_path_buf()),
        })
    }

    /// Returns the global config directory
    pub fn global_config_dir() -> Option<PathBuf> {
        ProjectDirs::from("dev", "lend", "lend-cli").map(|dirs| dirs.config_dir().to_path_buf())
    }

    /// Configured identity to act as: project config, then global config
    pub fn effective_user(&self) -> Option<String> {
        self.project
            .identity
            .user
            .clone()
            .or_else(|| self.global.user.clone())
            .filter(|u| !u.trim().is_empty())
    }

    /// Loads global configuration
    pub fn load_global() -> Result<GlobalConfig> {
        let config_dir = match Self::global_config_dir() {
            Some(dir) => dir,
            None => return Ok(GlobalConfig::default()),
        };

        let config_path = config_dir.join("config.toml");
        if !config_path.exists() {
            return Ok(GlobalConfig::default());
        }

        let content = fs::read_to_string(&config_path)
            .with_context(|| format!("Failed to read global config: {}", config_path.display()))?;

        toml::from_str(&content)
            .map_err(|e| ConfigError::Parse(e.to_string()))
            .context("Failed to parse global config")
    }

    /// Loads project configuration from a specific root
    fn load_project_config(project_root: &Path) -> Result<ProjectConfig> {
        let config_path = project_root.join(".lend").join("config.toml");

        if !config_path.exists() {
            return Ok(ProjectConfig::default());
        }

        let content = fs::read_to_string(&config_path)
            .with_context(|| format!("Failed to read project config: {}", config_path.display()))?;

        let config: ProjectConfig = toml::from_str(&content)
            .map_err(|e| ConfigError::Parse(e.to_string()))
            .context("Failed to parse project config")?;
        config
            .validate()
            .with_context(|| format!("Invalid project config: {}", config_path.display()))?;

        Ok(config)
    }

    /// Finds the project root by looking for a `.lend/` directory upwards
    /// from the current directory
    pub fn find_project_root() -> Option<PathBuf> {
        let current = std::env::current_dir().ok()?;
        Self::find_project_root_from(&current)
    }

    /// Finds the project root by looking for a `.lend/` directory upwards
    /// from `start`
    pub fn find_project_root_from(start: &Path) -> Option<PathBuf> {
        let mut current = start.to_path_buf();

        loop {
            if current.join(".lend").is_dir() {
                return Some(current);
            }

            if !current.pop() {
                return None;
            }
        }
    }

    /// Returns true if we're in a lend project
    pub fn is_in_project(&self) -> bool {
        self.project_root.is_some()
    }

    /// Returns the project root, or an error if not in a project
    pub fn require_project_root(&self) -> Result<&Path> {
        self.project_root
            .as_deref()
            .ok_or_else(|| anyhow::anyhow!("Not in a lend project. Run 'lend init' first."))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn default_config() {
        let config = Config {
            project: ProjectConfig::default(),
            global: GlobalConfig::default(),
            project_root: None,
        };

        assert_eq!(config.project.catalog.page_size, 10);
        assert_eq!(config.project.identity.user, None);
        assert_eq!(config.global.default_format, OutputFormat::Text);
    }

    #[test]
    fn parse_project_config() {
        let toml = r#"
[catalog]
page_size = 25

[identity]
user = "admin@example.com"
"#;

        let config: ProjectConfig = toml::from_str(toml).unwrap();
        assert_eq!(config.catalog.page_size, 25);
        assert_eq!(config.identity.user.as_deref(), Some("admin@example.com"));
    }

    #[test]
    fn partial_project_config_uses_defaults() {
        let config: ProjectConfig = toml::from_str("[identity]\nuser = \"u-abc1234\"\n").unwrap();
        assert_eq!(config.catalog.page_size, DEFAULT_PAGE_SIZE);
    }

    #[test]
    fn zero_page_size_is_invalid() {
        let mut config = ProjectConfig::default();
        config.catalog.page_size = 0;
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn invalid_project_config_is_reported() {
        let dir = TempDir::new().unwrap();
        let lend_dir = dir.path().join(".lend");
        fs::create_dir_all(&lend_dir).unwrap();
        fs::write(lend_dir.join("config.toml"), "[catalog]\npage_size = 0\n").unwrap();

        let err = Config::for_project(dir.path()).unwrap_err();
        assert!(format!("{:#}", err).contains("page_size"));
    }

    #[test]
    fn parse_global_config() {
        let toml = r#"
default_format = "json"
user = "ann@example.com"
"#;

        let config: GlobalConfig = toml::from_str(toml).unwrap();
        assert_eq!(config.default_format, OutputFormat::Json);
        assert_eq!(config.user, Some("ann@example.com".to_string()));
    }

    #[test]
    fn find_project_root() {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join(".lend")).unwrap();

        let sub_dir = dir.path().join("sub").join("dir");
        fs::create_dir_all(&sub_dir).unwrap();

        let root = Config::find_project_root_from(&sub_dir);
        assert_eq!(root.as_deref(), Some(dir.path()));
    }

    #[test]
    fn config_not_in_project() {
        let config = Config {
            project: ProjectConfig::default(),
            global: GlobalConfig::default(),
            project_root: None,
        };

        assert!(!config.is_in_project());
        assert!(config.require_project_root().is_err());
    }

    #[test]
    fn project_identity_beats_global() {
        let config = Config {
            project: ProjectConfig {
                identity: IdentityConfig {
                    user: Some("project@example.com".to_string()),
                },
                ..ProjectConfig::default()
            },
            global: GlobalConfig {
                user: Some("global@example.com".to_string()),
                ..GlobalConfig::default()
            },
            project_root: None,
        };

        assert_eq!(config.effective_user().as_deref(), Some("project@example.com"));
    }
}

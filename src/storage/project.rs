//! Project management
//!
//! Handles project initialization and provides access to stores.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use thiserror::Error;

use crate::domain::{Category, Tag, User};

use super::{Config, JsonlStore, JsonlTaskRepository};

#[derive(Debug, Error)]
pub enum ProjectError {
    #[error("Project already exists at {0}")]
    AlreadyExists(PathBuf),

    #[error("Not in a lend project. Run 'lend init' first.")]
    NotInProject,
}

const DEFAULT_CONFIG: &str = r#"# lend configuration

[catalog]
# Tasks per page in listings
page_size = 10

[identity]
# Registered user (ID or e-mail) that commands run as by default.
# Overridden by the LEND_USER environment variable and the --as flag.
# user = "admin@example.com"
"#;

const GITIGNORE: &str = r#"# Write locks and interrupted writes
*.lock
*.tmp
"#;

/// A lend project
#[derive(Debug)]
pub struct Project {
    root: PathBuf,
    config: Config,
}

impl Project {
    /// Opens an existing project at the given path
    pub fn open(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        let lend_dir = root.join(".lend");

        if !lend_dir.is_dir() {
            return Err(ProjectError::NotInProject.into());
        }

        let config = Config::for_project(&root)?;

        Ok(Self { root, config })
    }

    /// Opens the project at the current directory or a parent
    pub fn open_current() -> Result<Self> {
        let root = Config::find_project_root().ok_or(ProjectError::NotInProject)?;

        Self::open(root)
    }

    /// Initializes a new project at the given path
    ///
    /// Existing files are left alone, so running it twice is harmless.
    pub fn init(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        let lend_dir = root.join(".lend");

        fs::create_dir_all(&lend_dir).with_context(|| {
            format!("Failed to create .lend directory: {}", lend_dir.display())
        })?;

        let config_path = lend_dir.join("config.toml");
        if !config_path.exists() {
            fs::write(&config_path, DEFAULT_CONFIG)
                .with_context(|| format!("Failed to write config: {}", config_path.display()))?;
        }

        let gitignore_path = lend_dir.join(".gitignore");
        if !gitignore_path.exists() {
            fs::write(&gitignore_path, GITIGNORE).with_context(|| {
                format!("Failed to write .gitignore: {}", gitignore_path.display())
            })?;
        }

        Self::open(root)
    }

    /// Like [`Project::init`], but refuses to touch an existing project
    pub fn create(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        if root.join(".lend").is_dir() {
            return Err(ProjectError::AlreadyExists(root).into());
        }
        Self::init(root)
    }

    /// Returns the project root path
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Returns the .lend directory path
    pub fn lend_dir(&self) -> PathBuf {
        self.root.join(".lend")
    }

    /// Returns the configuration
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Returns the task repository
    pub fn task_repository(&self) -> JsonlTaskRepository {
        JsonlTaskRepository::new(JsonlStore::for_project(&self.root))
    }

    pub fn category_store(&self) -> JsonlStore<Category> {
        JsonlStore::for_project(&self.root)
    }

    pub fn tag_store(&self) -> JsonlStore<Tag> {
        JsonlStore::for_project(&self.root)
    }

    pub fn user_store(&self) -> JsonlStore<User> {
        JsonlStore::for_project(&self.root)
    }
}

//! # Storage Layer
//!
//! Persistence layer for lend with git-friendly file formats.
//!
//! ## Storage Formats
//!
//! | Data | Format | Location |
//! |------|--------|----------|
//! | Tasks | JSONL (one JSON per line) | `.lend/tasks.jsonl` |
//! | Categories | JSONL | `.lend/categories.jsonl` |
//! | Tags | JSONL | `.lend/tags.jsonl` |
//! | Users | JSONL | `.lend/users.jsonl` |
//! | Config | TOML | `.lend/config.toml` |
//!
//! ## Concurrency Safety
//!
//! - [`JsonlStore`] uses file locking (`fs2`) for concurrent access
//! - All writes are atomic (temp file + rename)
//! - [`TaskRepository::save`] rejects stale snapshots with
//!   [`PersistenceError::Conflict`]
//!
//! ## Project Structure
//!
//! ```text
//! .lend/
//! ├── tasks.jsonl
//! ├── categories.jsonl
//! ├── tags.jsonl
//! ├── users.jsonl
//! ├── config.toml           # Project configuration
//! └── .gitignore            # Ignores lock and temp files
//! ```

mod config;
mod jsonl;
mod project;
mod query;
mod repository;

pub use config::{
    CatalogConfig, Config, ConfigError, GlobalConfig, IdentityConfig, OutputFormat, ProjectConfig,
};
pub use jsonl::{JsonlStore, Record};
pub use project::{Project, ProjectError};
pub use query::{Page, TaskFilters, DEFAULT_PAGE_SIZE};
pub use repository::{
    InMemoryTaskRepository, JsonlTaskRepository, PersistenceError, TaskRepository,
};

//! # Command-Line Interface
//!
//! User-facing CLI commands and output formatting.
//!
//! ## Command Groups
//!
//! | Group | Purpose | Examples |
//! |-------|---------|----------|
//! | Core | Project management and browsing | `init`, `status`, `browse` |
//! | Task | Catalog and requests | `task add`, `task list`, `task reserve` |
//! | Labels | Categories and tags | `category add`, `tag delete` |
//! | User | Accounts and roles | `user register`, `user edit`, `user grant-admin` |
//! | Admin | Reservation workflow | `admin queue`, `admin approve`, `admin lend` |
//!
//! ## Output Formats
//!
//! All commands support `--format` flag:
//! - `text` (default) - Human-readable output
//! - `json` - Machine-parseable JSON
//!
//! ## Identity
//!
//! Commands run as the user named by `--as`, else `LEND_USER`, else
//! `[identity] user` in `.lend/config.toml`. Without any of these they run
//! anonymously, which is enough to browse and to reserve as a guest.
//!
//! ## Entry Point
//!
//! Call [`run()`] to parse arguments and execute the appropriate command.

mod admin;
mod app;
mod label;
mod output;
mod overview;
mod session;
mod task;
mod user;

pub use app::{run, Cli, Commands};
pub use output::{Output, OutputFormat};

//! Category and tag CLI commands

use anyhow::Result;
use clap::Subcommand;

use super::output::Output;
use super::session::Session;
use crate::storage::TaskRepository;

#[derive(Subcommand)]
pub enum CategoryCommands {
    /// Add a category (admin)
    Add {
        /// Category title (3-64 characters)
        title: String,
    },

    /// List categories
    List,

    /// Rename a category (admin)
    Rename {
        /// Category ID, slug, or title
        category: String,

        /// New title
        title: String,
    },

    /// Delete a category that no task uses (admin)
    Delete {
        /// Category ID, slug, or title
        category: String,
    },
}

#[derive(Subcommand)]
pub enum TagCommands {
    /// Add a tag (admin)
    Add {
        /// Tag title (3-64 characters, unique)
        title: String,
    },

    /// List tags
    List,

    /// Rename a tag (admin)
    Rename {
        /// Tag ID or title
        tag: String,

        /// New title
        title: String,
    },

    /// Delete a tag and detach it from every task (admin)
    Delete {
        /// Tag ID or title
        tag: String,
    },
}

pub fn run_category(cmd: CategoryCommands, output: &Output, as_user: Option<&str>) -> Result<()> {
    let session = Session::open(as_user)?;
    let catalog = &session.catalog;

    match cmd {
        CategoryCommands::Add { title } => {
            let category = catalog.add_category(&session.actor, &title)?;
            if output.is_json() {
                output.data(&category);
            } else {
                output.success(&format!(
                    "Created category: {} - {} ({})",
                    category.id, category.title, category.slug
                ));
            }
        }
        CategoryCommands::List => {
            let categories = catalog.list_categories()?;
            if output.is_json() {
                output.data(&categories);
            } else if categories.is_empty() {
                println!("No categories yet. Add one with 'lend category add <title>'.");
            } else {
                println!("{:<12} {:<24} {:>6}  TITLE", "ID", "SLUG", "TASKS");
                println!("{}", "-".repeat(70));
                for category in &categories {
                    let count = catalog.tasks().count_by_category(&category.id)?;
                    println!(
                        "{:<12} {:<24} {:>6}  {}",
                        category.id, category.slug, count, category.title
                    );
                }
            }
        }
        CategoryCommands::Rename { category, title } => {
            let category = catalog.rename_category(&session.actor, &category, &title)?;
            if output.is_json() {
                output.data(&category);
            } else {
                output.success(&format!(
                    "Renamed category: {} - {} ({})",
                    category.id, category.title, category.slug
                ));
            }
        }
        CategoryCommands::Delete { category } => {
            let category = catalog.delete_category(&session.actor, &category)?;
            if output.is_json() {
                output.data(&serde_json::json!({
                    "id": category.id.to_string(),
                    "deleted": true,
                }));
            } else {
                output.success(&format!(
                    "Deleted category: {} - {}",
                    category.id, category.title
                ));
            }
        }
    }

    Ok(())
}

pub fn run_tag(cmd: TagCommands, output: &Output, as_user: Option<&str>) -> Result<()> {
    let session = Session::open(as_user)?;
    let catalog = &session.catalog;

    match cmd {
        TagCommands::Add { title } => {
            let tag = catalog.add_tag(&session.actor, &title)?;
            if output.is_json() {
                output.data(&tag);
            } else {
                output.success(&format!("Created tag: {} - {}", tag.id, tag.title));
            }
        }
        TagCommands::List => {
            let tags = catalog.list_tags()?;
            if output.is_json() {
                output.data(&tags);
            } else if tags.is_empty() {
                println!("No tags yet. Add one with 'lend tag add <title>'.");
            } else {
                println!("{:<12} {:<24} TITLE", "ID", "SLUG");
                println!("{}", "-".repeat(60));
                for tag in &tags {
                    println!("{:<12} {:<24} {}", tag.id, tag.slug, tag.title);
                }
            }
        }
        TagCommands::Rename { tag, title } => {
            let tag = catalog.rename_tag(&session.actor, &tag, &title)?;
            if output.is_json() {
                output.data(&tag);
            } else {
                output.success(&format!("Renamed tag: {} - {}", tag.id, tag.title));
            }
        }
        TagCommands::Delete { tag } => {
            let (tag, detached) = catalog.delete_tag(&session.actor, &tag)?;
            if output.is_json() {
                output.data(&serde_json::json!({
                    "id": tag.id.to_string(),
                    "deleted": true,
                    "detached_from": detached,
                }));
            } else {
                output.success(&format!(
                    "Deleted tag: {} - {} (removed from {} task(s))",
                    tag.id, tag.title, detached
                ));
            }
        }
    }

    Ok(())
}

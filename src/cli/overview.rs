//! Overview commands (status, browse, reservations)

use anyhow::Result;

use super::output::Output;
use super::session::Session;
use super::task::{print_page, print_tasks, task_json};

/// Show catalog status overview
pub fn status(output: &Output, as_user: Option<&str>) -> Result<()> {
    let session = Session::open(as_user)?;
    let summary = session.catalog.summary()?;

    if output.is_json() {
        let by_status: serde_json::Map<String, serde_json::Value> = summary
            .by_status
            .iter()
            .map(|(status, count)| (status.to_string(), (*count).into()))
            .collect();
        output.data(&serde_json::json!({
            "project": session.project.root().display().to_string(),
            "acting_as": session.actor.to_string(),
            "tasks": summary.tasks,
            "lent": summary.lent,
            "awaiting_review": summary.awaiting_review,
            "by_status": by_status,
            "categories": summary.categories,
            "tags": summary.tags,
            "users": summary.users,
        }));
        return Ok(());
    }

    println!("Project: {}", session.project.root().display());
    println!("Acting as: {}", session.actor);
    println!();
    println!(
        "Tasks: {} ({} lent, {} awaiting review)",
        summary.tasks, summary.lent, summary.awaiting_review
    );
    for (status, count) in summary.by_status.iter().filter(|(_, n)| *n > 0) {
        println!("  {:<10} {}", status, count);
    }
    println!();
    println!(
        "Categories: {}  Tags: {}  Users: {}",
        summary.categories, summary.tags, summary.users
    );

    Ok(())
}

/// Show tasks that can be borrowed right now
pub fn browse(
    output: &Output,
    as_user: Option<&str>,
    category: Option<&str>,
    tag: Option<&str>,
    page: usize,
) -> Result<()> {
    let session = Session::open(as_user)?;
    let page = session.catalog.public_tasks(category, tag, page)?;
    print_page(output, &session, &page)
}

/// Show tasks reserved by the acting user
pub fn reservations(output: &Output, as_user: Option<&str>) -> Result<()> {
    let session = Session::open(as_user)?;
    let tasks = session.catalog.my_reservations(&session.actor)?;

    if output.is_json() {
        let items = tasks
            .iter()
            .map(|t| task_json(&session.catalog, t))
            .collect::<Result<Vec<_>>>()?;
        output.data(&items);
    } else if tasks.is_empty() {
        println!("You have no reservations.");
    } else {
        println!("Your reservations ({}):", tasks.len());
        print_tasks(&tasks);
    }

    Ok(())
}

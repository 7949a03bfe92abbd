//! Task CLI commands

use anyhow::Result;
use clap::Subcommand;

use super::admin::report_outcome;
use super::output::Output;
use super::session::Session;
use crate::domain::{AvailabilityStatus, ReservationStatus, Reserver, Task, TaskId};
use crate::service::{CatalogService, NewTask, TaskChanges};
use crate::storage::{Page, TaskFilters, TaskRepository};

#[derive(Subcommand)]
pub enum TaskCommands {
    /// Add a task to the catalog (admin)
    ///
    /// Examples:
    ///   lend task add "Cordless drill" --category tools
    ///   lend task add "Tent" -c outdoor --tag camping --comment "4 person"
    Add {
        /// Task title
        title: String,

        /// Category ID, slug, or title
        #[arg(long, short)]
        category: String,

        /// Tag ID or title (repeatable)
        #[arg(long = "tag", short)]
        tags: Vec<String>,

        /// Description
        #[arg(long)]
        comment: Option<String>,
    },

    /// List tasks
    List {
        /// Only tasks in this category
        #[arg(long, short)]
        category: Option<String>,

        /// Only tasks with this tag
        #[arg(long, short)]
        tag: Option<String>,

        /// Only tasks on the shelf or out on loan (available, lent)
        #[arg(long)]
        availability: Option<AvailabilityStatus>,

        /// Only tasks in these reservation states (repeatable)
        #[arg(long = "status", short)]
        statuses: Vec<ReservationStatus>,

        /// Only tasks you added (administrators see every task)
        #[arg(long)]
        mine: bool,

        /// Page number, starting at 1
        #[arg(long, short, default_value = "1")]
        page: usize,
    },

    /// Show task details
    Show {
        /// Task ID
        id: String,
    },

    /// Change a task (admin)
    Edit {
        /// Task ID
        id: String,

        /// New title
        #[arg(long)]
        title: Option<String>,

        /// Move to another category
        #[arg(long, short)]
        category: Option<String>,

        /// Replace the description
        #[arg(long, conflicts_with = "clear_comment")]
        comment: Option<String>,

        /// Remove the description
        #[arg(long)]
        clear_comment: bool,

        /// Attach a tag (repeatable)
        #[arg(long = "tag", short)]
        tags: Vec<String>,

        /// Detach a tag (repeatable)
        #[arg(long = "untag")]
        untags: Vec<String>,
    },

    /// Remove a task from the catalog (admin)
    Delete {
        /// Task ID
        id: String,
    },

    /// Ask to borrow a task
    ///
    /// Registered users are reserved straight away; guests give an e-mail
    /// address and wait for an administrator to approve.
    Reserve {
        /// Task ID
        id: String,

        /// Note for the administrators
        #[arg(long, short = 'm')]
        comment: String,

        /// Contact address (guests only; required without an account)
        #[arg(long)]
        email: Option<String>,

        /// Name to be addressed by
        #[arg(long)]
        nickname: Option<String>,
    },
}

pub fn run(cmd: TaskCommands, output: &Output, as_user: Option<&str>) -> Result<()> {
    let session = Session::open(as_user)?;

    match cmd {
        TaskCommands::Add {
            title,
            category,
            tags,
            comment,
        } => add_task(
            output,
            &session,
            NewTask {
                title,
                category,
                tags,
                comment,
            },
        ),
        TaskCommands::List {
            category,
            tag,
            availability,
            statuses,
            mine,
            page,
        } => {
            let mut filters = TaskFilters::new().statuses(statuses);
            if let Some(category) = category {
                filters = filters.category(session.catalog.find_category(&category)?.id);
            }
            if let Some(tag) = tag {
                filters = filters.tag(session.catalog.find_tag(&tag)?.id);
            }
            if let Some(availability) = availability {
                filters = filters.availability(availability);
            }
            if mine {
                let user = session
                    .actor
                    .user_id()
                    .cloned()
                    .ok_or_else(|| anyhow::anyhow!("--mine needs a registered user; pass --as"))?;
                filters = filters.authored_by(user, &session.actor);
            }
            list_tasks(output, &session, &filters, page)
        }
        TaskCommands::Show { id } => show_task(output, &session, &id),
        TaskCommands::Edit {
            id,
            title,
            category,
            comment,
            clear_comment,
            tags,
            untags,
        } => {
            let changes = TaskChanges {
                title,
                category,
                comment: if clear_comment { Some(None) } else { comment.map(Some) },
                add_tags: tags,
                remove_tags: untags,
            };
            edit_task(output, &session, &id, changes)
        }
        TaskCommands::Delete { id } => delete_task(output, &session, &id),
        TaskCommands::Reserve {
            id,
            comment,
            email,
            nickname,
        } => reserve_task(output, &session, &id, comment, email, nickname),
    }
}

fn add_task(output: &Output, session: &Session, new: NewTask) -> Result<()> {
    let task = session.catalog.create_task(&session.actor, new)?;

    if output.is_json() {
        output.data(&task_json(&session.catalog, &task)?);
    } else {
        output.success(&format!("Created task: {} - {}", task.id, task.title));
    }

    Ok(())
}

fn list_tasks(output: &Output, session: &Session, filters: &TaskFilters, page: usize) -> Result<()> {
    let page = session.catalog.list_tasks(filters, page)?;
    print_page(output, session, &page)
}

/// Prints one page of tasks as a table with a page footer, or as JSON
pub(super) fn print_page(output: &Output, session: &Session, page: &Page<Task>) -> Result<()> {
    if output.is_json() {
        let items = page
            .items
            .iter()
            .map(|t| task_json(&session.catalog, t))
            .collect::<Result<Vec<_>>>()?;
        output.data(&serde_json::json!({
            "items": items,
            "page": page.page,
            "per_page": page.per_page,
            "total": page.total,
        }));
    } else if page.is_empty() {
        println!("No tasks found.");
    } else {
        print_tasks(&page.items);
        println!();
        println!(
            "Page {} of {} ({} task(s))",
            page.page,
            page.page_count().max(1),
            page.total
        );
    }

    Ok(())
}

fn show_task(output: &Output, session: &Session, id_str: &str) -> Result<()> {
    let id: TaskId = id_str.parse()?;
    let task = session.catalog.get_task(&id)?;

    if output.is_json() {
        output.data(&task_json(&session.catalog, &task)?);
        return Ok(());
    }

    let category = session
        .catalog
        .find_category(&task.category.to_string())
        .map(|c| c.title)
        .unwrap_or_else(|_| task.category.to_string());
    let tags = session.catalog.tag_titles(&task.tags)?;

    println!("ID:           {}", task.id);
    println!("Title:        {}", task.title);
    println!("Category:     {}", category);
    if !tags.is_empty() {
        println!("Tags:         {}", tags.join(", "));
    }
    println!("Status:       {}", task.reservation_status);
    println!("Availability: {}", task.availability());
    if let Some(reserver) = &task.reserver {
        println!("Reserved by:  {}", reserver);
    }
    if let Some(nickname) = &task.reserver_nickname {
        println!("Nickname:     {}", nickname);
    }
    if let Some(note) = &task.reservation_comment {
        println!("Request note: {}", note);
    }
    if let Some(comment) = &task.comment {
        println!();
        println!("{}", comment);
    }
    println!();
    println!(
        "Created: {}  Updated: {}",
        task.created_at.format("%Y-%m-%d %H:%M"),
        task.updated_at.format("%Y-%m-%d %H:%M")
    );

    Ok(())
}

fn edit_task(output: &Output, session: &Session, id_str: &str, changes: TaskChanges) -> Result<()> {
    let id: TaskId = id_str.parse()?;
    if changes.is_empty() {
        anyhow::bail!("Nothing to change; pass --title, --category, --comment, --tag or --untag");
    }

    let task = session.catalog.edit_task(&session.actor, &id, changes)?;

    if output.is_json() {
        output.data(&task_json(&session.catalog, &task)?);
    } else {
        output.success(&format!("Updated task: {} - {}", task.id, task.title));
    }

    Ok(())
}

fn delete_task(output: &Output, session: &Session, id_str: &str) -> Result<()> {
    let id: TaskId = id_str.parse()?;
    let task = session.catalog.delete_task(&session.actor, &id)?;

    if output.is_json() {
        output.data(&serde_json::json!({
            "id": task.id.to_string(),
            "deleted": true,
        }));
    } else {
        output.success(&format!("Deleted task: {} - {}", task.id, task.title));
    }

    Ok(())
}

fn reserve_task(
    output: &Output,
    session: &Session,
    id_str: &str,
    comment: String,
    email: Option<String>,
    nickname: Option<String>,
) -> Result<()> {
    let id: TaskId = id_str.parse()?;

    let reserver = match (session.actor.user_id(), email) {
        (Some(_), Some(_)) => {
            anyhow::bail!("--email is for guests; you are reserving as {}", session.actor)
        }
        (Some(user), None) => Reserver::user(user.clone()),
        (None, Some(email)) => Reserver::guest(email),
        (None, None) => {
            anyhow::bail!("Reserving without an account needs --email (or pass --as to sign in)")
        }
    };

    let outcome = session
        .reservations()
        .reserve_task(&id, reserver, nickname, comment)?;

    report_outcome(output, "Reservation requested for", &outcome);
    Ok(())
}

/// Prints tasks as an aligned table
pub(super) fn print_tasks(tasks: &[Task]) {
    println!("{:<12} {:<10} {:<10} TITLE", "ID", "STATUS", "AVAIL");
    println!("{}", "-".repeat(70));
    for task in tasks {
        println!(
            "{:<12} {:<10} {:<10} {}",
            task.id,
            task.reservation_status.to_string(),
            task.availability().to_string(),
            task.title
        );
    }
}

/// JSON view of a task including the derived availability and tag titles
pub(super) fn task_json<R: TaskRepository>(
    catalog: &CatalogService<R>,
    task: &Task,
) -> Result<serde_json::Value> {
    Ok(serde_json::json!({
        "id": task.id.to_string(),
        "title": task.title,
        "category": task.category.to_string(),
        "tags": catalog.tag_titles(&task.tags)?,
        "author": task.author.to_string(),
        "comment": task.comment,
        "reservation_status": task.reservation_status,
        "availability": task.availability(),
        "reserver": task.reserver,
        "reserver_nickname": task.reserver_nickname,
        "reservation_comment": task.reservation_comment,
        "created_at": task.created_at.to_rfc3339(),
        "updated_at": task.updated_at.to_rfc3339(),
        "version": task.version,
    }))
}

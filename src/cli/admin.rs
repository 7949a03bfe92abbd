//! Administrator commands: the reservation queue and workflow actions

use anyhow::Result;
use clap::Subcommand;

use super::output::Output;
use super::session::Session;
use super::task::{print_tasks, task_json};
use crate::domain::{Action, TaskId};
use crate::service::Outcome;

#[derive(Subcommand)]
pub enum AdminCommands {
    /// List tasks with an open or recent reservation
    Queue,

    /// Accept a pending or reserved request
    Approve {
        /// Task ID
        id: String,
    },

    /// Turn down a request (valid from any state)
    Reject {
        /// Task ID
        id: String,
    },

    /// Hand the task over to its reserver
    Lend {
        /// Task ID
        id: String,
    },

    /// Record that a lent task came back
    Return {
        /// Task ID
        id: String,
    },

    /// Put a rejected or returned task back on the shelf
    Reset {
        /// Task ID
        id: String,
    },
}

pub fn run(cmd: AdminCommands, output: &Output, as_user: Option<&str>) -> Result<()> {
    let session = Session::open(as_user)?;

    let (id, action, verb) = match cmd {
        AdminCommands::Queue => return queue(output, &session),
        AdminCommands::Approve { id } => (id, Action::Approve, "Approved"),
        AdminCommands::Reject { id } => (id, Action::Reject, "Rejected"),
        AdminCommands::Lend { id } => (id, Action::Lend, "Lent"),
        AdminCommands::Return { id } => (id, Action::Return, "Returned"),
        AdminCommands::Reset { id } => (id, Action::Reset, "Reset"),
    };

    let id: TaskId = id.parse()?;
    let outcome = session.reservations().run(&id, action, &session.actor)?;
    report_outcome(output, verb, &outcome);

    Ok(())
}

fn queue(output: &Output, session: &Session) -> Result<()> {
    let tasks = session.catalog.admin_queue(&session.actor)?;

    if output.is_json() {
        let items = tasks
            .iter()
            .map(|t| task_json(&session.catalog, t))
            .collect::<Result<Vec<_>>>()?;
        output.data(&items);
    } else if tasks.is_empty() {
        println!("No reservations in progress.");
    } else {
        println!("Reservation queue ({}):", tasks.len());
        print_tasks(&tasks);
    }

    Ok(())
}

/// Reports an applied or ignored workflow action
///
/// An ignored action is not an error: the command succeeds and says why
/// nothing changed.
pub(super) fn report_outcome(output: &Output, verb: &str, outcome: &Outcome) {
    let task = outcome.task();

    if output.is_json() {
        let reason = match outcome {
            Outcome::Applied(_) => None,
            Outcome::Ignored(_, err) => Some(err.to_string()),
        };
        output.data(&serde_json::json!({
            "id": task.id.to_string(),
            "applied": outcome.is_applied(),
            "reservation_status": task.reservation_status,
            "availability": task.availability(),
            "reason": reason,
        }));
        return;
    }

    match outcome {
        Outcome::Applied(task) => output.success(&format!(
            "{} {} - {} (now {})",
            verb, task.id, task.title, task.reservation_status
        )),
        Outcome::Ignored(task, err) => {
            output.notice(&format!("{}; {} left unchanged", err, task.id));
        }
    }
}

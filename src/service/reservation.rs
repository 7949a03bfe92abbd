//! Reservation workflow
//!
//! Each operation loads the task, runs the aggregate method, and saves the
//! whole record only when the action applied. An action that does not fit
//! the task's current state is reported as [`Outcome::Ignored`]; nothing is
//! written in that case.

use thiserror::Error;

use crate::domain::{
    Action, Actor, AuthorizationError, ApplyError, ReservationStatus, Reserver, Task, TaskId,
    TransitionError, ValidationError,
};
use crate::storage::{PersistenceError, TaskRepository};
use crate::telemetry;

#[derive(Debug, Error)]
pub enum WorkflowError {
    #[error("Task not found: {0}")]
    NotFound(TaskId),

    #[error(transparent)]
    Forbidden(#[from] AuthorizationError),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Persistence(#[from] PersistenceError),
}

/// Result of a workflow operation that reached the task
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// The action applied and the task was saved
    Applied(Task),
    /// The action does not fit the task's state; the task is unchanged
    Ignored(Task, TransitionError),
}

impl Outcome {
    pub fn is_applied(&self) -> bool {
        matches!(self, Outcome::Applied(_))
    }

    /// The task as it stands after the operation
    pub fn task(&self) -> &Task {
        match self {
            Outcome::Applied(task) | Outcome::Ignored(task, _) => task,
        }
    }

    pub fn status(&self) -> ReservationStatus {
        self.task().reservation_status
    }
}

/// Controller-facing reservation operations
pub struct ReservationService<R> {
    repo: R,
}

impl<R: TaskRepository> ReservationService<R> {
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    pub fn approve_task(&self, id: &TaskId, actor: &Actor) -> Result<Outcome, WorkflowError> {
        self.run(id, Action::Approve, actor)
    }

    pub fn reject_task(&self, id: &TaskId, actor: &Actor) -> Result<Outcome, WorkflowError> {
        self.run(id, Action::Reject, actor)
    }

    pub fn lend_task(&self, id: &TaskId, actor: &Actor) -> Result<Outcome, WorkflowError> {
        self.run(id, Action::Lend, actor)
    }

    pub fn return_task(&self, id: &TaskId, actor: &Actor) -> Result<Outcome, WorkflowError> {
        self.run(id, Action::Return, actor)
    }

    /// Puts a rejected or returned task back on the shelf
    pub fn reset_task(&self, id: &TaskId, actor: &Actor) -> Result<Outcome, WorkflowError> {
        self.run(id, Action::Reset, actor)
    }

    /// Runs any administrative action
    pub fn run(&self, id: &TaskId, action: Action, actor: &Actor) -> Result<Outcome, WorkflowError> {
        let span = telemetry::operation_span(action.label(), &actor.to_string(), Some(id.hash()));
        let _guard = span.enter();

        let mut task = self.load(id)?;

        match task.apply(action, actor) {
            Ok(status) => {
                let saved = self.repo.save(&task)?;
                tracing::info!(%status, version = saved.version, "reservation action applied");
                Ok(Outcome::Applied(saved))
            }
            Err(ApplyError::NotApplicable(err)) => {
                tracing::debug!(state = %err.state(), "reservation action ignored");
                Ok(Outcome::Ignored(task, err))
            }
            Err(ApplyError::Forbidden(err)) => {
                tracing::warn!(error = %err, "reservation action refused");
                Err(err.into())
            }
        }
    }

    /// Records a reservation request from a registered user or a guest
    ///
    /// A task that is no longer available comes back as
    /// [`Outcome::Ignored`]; the earlier reserver is kept.
    pub fn reserve_task(
        &self,
        id: &TaskId,
        reserver: Reserver,
        nickname: Option<String>,
        comment: impl Into<String>,
    ) -> Result<Outcome, WorkflowError> {
        let span = telemetry::operation_span("reserve", &reserver.to_string(), Some(id.hash()));
        let _guard = span.enter();

        let mut task = self.load(id)?;
        let action = Action::Request {
            authenticated: reserver.is_registered(),
        };

        match task.request_reservation(reserver, nickname, comment) {
            Ok(status) => {
                let saved = self.repo.save(&task)?;
                tracing::info!(%status, version = saved.version, "reservation requested");
                Ok(Outcome::Applied(saved))
            }
            Err(ValidationError::AlreadyReserved { state }) => {
                tracing::debug!(%state, "reservation request ignored");
                Ok(Outcome::Ignored(
                    task,
                    TransitionError::NotApplicable { state, action },
                ))
            }
            Err(err) => Err(err.into()),
        }
    }

    fn load(&self, id: &TaskId) -> Result<Task, WorkflowError> {
        self.repo
            .find_by_id(id)?
            .ok_or_else(|| WorkflowError::NotFound(id.clone()))
    }
}

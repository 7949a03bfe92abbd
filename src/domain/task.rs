//! Task domain model
//!
//! A task is a lendable item in the catalog. It belongs to one category,
//! carries any number of tags, and tracks who asked to borrow it and where
//! that request is in the reservation workflow.
//!
//! Mutation and persistence are separate steps: methods here only change the
//! in-memory record; callers save the whole record afterwards.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::actor::{Actor, AuthorizationError, Role};
use super::id::{CategoryId, TagId, TaskId, UserId};
use super::status::{AvailabilityStatus, ReservationStatus};
use super::workflow::{self, Action, TransitionError};

pub const TITLE_MIN_LEN: usize = 3;
pub const TITLE_MAX_LEN: usize = 255;
pub const COMMENT_MAX_LEN: usize = 500;
pub const NICKNAME_MAX_LEN: usize = 255;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("task is already {state}; it must be available to reserve")]
    AlreadyReserved { state: ReservationStatus },

    #[error("title must be between {min} and {max} characters")]
    TitleLength { min: usize, max: usize },

    #[error("please enter a comment")]
    BlankComment,

    #[error("comment is too long; it should have {max} characters or less")]
    CommentTooLong { max: usize },

    #[error("nickname is too long; it should have {max} characters or less")]
    NicknameTooLong { max: usize },

    #[error("an e-mail address is required to reserve without an account")]
    MissingEmail,

    #[error("invalid e-mail address: {0}")]
    InvalidEmail(String),
}

/// Checks a task title against the length rules
pub fn validate_title(title: &str) -> Result<(), ValidationError> {
    let len = title.trim().chars().count();
    if !(TITLE_MIN_LEN..=TITLE_MAX_LEN).contains(&len) {
        return Err(ValidationError::TitleLength {
            min: TITLE_MIN_LEN,
            max: TITLE_MAX_LEN,
        });
    }
    Ok(())
}

/// Checks an optional free-text comment against the length rule
pub fn validate_comment(comment: &str) -> Result<(), ValidationError> {
    if comment.trim().is_empty() {
        return Err(ValidationError::BlankComment);
    }
    if comment.chars().count() > COMMENT_MAX_LEN {
        return Err(ValidationError::CommentTooLong {
            max: COMMENT_MAX_LEN,
        });
    }
    Ok(())
}

/// Minimal shape check for an e-mail address
pub fn validate_email(email: &str) -> Result<(), ValidationError> {
    let email = email.trim();
    if email.is_empty() {
        return Err(ValidationError::MissingEmail);
    }
    match email.split_once('@') {
        Some((local, domain)) if !local.is_empty() && domain.contains('.') => Ok(()),
        _ => Err(ValidationError::InvalidEmail(email.to_string())),
    }
}

pub fn validate_nickname(nickname: &str) -> Result<(), ValidationError> {
    if nickname.chars().count() > NICKNAME_MAX_LEN {
        return Err(ValidationError::NicknameTooLong {
            max: NICKNAME_MAX_LEN,
        });
    }
    Ok(())
}

/// Who asked to borrow a task
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Reserver {
    /// A registered user
    User { id: UserId },
    /// Someone without an account, reachable by e-mail
    Guest { email: String },
}

impl Reserver {
    pub fn user(id: UserId) -> Self {
        Reserver::User { id }
    }

    /// A guest reserver; the address is stored trimmed and lowercased
    pub fn guest(email: impl Into<String>) -> Self {
        Reserver::Guest {
            email: email.into().trim().to_lowercase(),
        }
    }

    pub fn is_registered(&self) -> bool {
        matches!(self, Reserver::User { .. })
    }

    pub fn user_id(&self) -> Option<&UserId> {
        match self {
            Reserver::User { id } => Some(id),
            Reserver::Guest { .. } => None,
        }
    }

    pub fn email(&self) -> Option<&str> {
        match self {
            Reserver::Guest { email } => Some(email),
            Reserver::User { .. } => None,
        }
    }
}

impl std::fmt::Display for Reserver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Reserver::User { id } => write!(f, "{}", id),
            Reserver::Guest { email } => write!(f, "{} (guest)", email),
        }
    }
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ApplyError {
    #[error(transparent)]
    Forbidden(#[from] AuthorizationError),

    #[error(transparent)]
    NotApplicable(#[from] TransitionError),
}

/// A lendable item
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    /// Unique identifier
    pub id: TaskId,

    /// Human-readable title
    pub title: String,

    /// Category the task is filed under
    pub category: CategoryId,

    /// Tags attached to the task
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<TagId>,

    /// User who added the task to the catalog
    pub author: UserId,

    /// Optional description
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,

    /// Current reservation workflow state
    #[serde(default)]
    pub reservation_status: ReservationStatus,

    /// Who asked to borrow it
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reserver: Option<Reserver>,

    /// Name the reserver wants to be addressed by
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reserver_nickname: Option<String>,

    /// Note attached to the reservation request
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reservation_comment: Option<String>,

    /// When the task was created
    pub created_at: DateTime<Utc>,

    /// When the task was last updated
    pub updated_at: DateTime<Utc>,

    /// Optimistic concurrency stamp, bumped by every save
    #[serde(default)]
    pub version: u64,
}

impl Task {
    /// Creates a new, available task
    pub fn new(title: impl Into<String>, category: CategoryId, author: UserId) -> Self {
        let title = title.into();
        let now = Utc::now();
        Self {
            id: TaskId::new(&title, now),
            title,
            category,
            tags: Vec::new(),
            author,
            comment: None,
            reservation_status: ReservationStatus::Available,
            reserver: None,
            reserver_nickname: None,
            reservation_comment: None,
            created_at: now,
            updated_at: now,
            version: 0,
        }
    }

    /// Whether the task is physically on loan
    pub fn availability(&self) -> AvailabilityStatus {
        self.reservation_status.availability()
    }

    /// Returns true if the given user holds the reservation
    pub fn is_reserved_by(&self, user: &UserId) -> bool {
        self.reserver
            .as_ref()
            .and_then(Reserver::user_id)
            .is_some_and(|id| id == user)
    }

    pub fn has_tag(&self, tag: &TagId) -> bool {
        self.tags.contains(tag)
    }

    /// Records a reservation request
    ///
    /// Only an available task can be requested; a second request against a
    /// pending or reserved task is refused rather than overwriting the first
    /// reserver.
    pub fn request_reservation(
        &mut self,
        reserver: Reserver,
        nickname: Option<String>,
        comment: impl Into<String>,
    ) -> Result<ReservationStatus, ValidationError> {
        let comment = comment.into();
        validate_comment(&comment)?;
        if let Some(nickname) = &nickname {
            validate_nickname(nickname)?;
        }
        if let Reserver::Guest { email } = &reserver {
            validate_email(email)?;
        }

        let action = Action::Request {
            authenticated: reserver.is_registered(),
        };
        let next = workflow::transition(self.reservation_status, action).map_err(|err| {
            ValidationError::AlreadyReserved { state: err.state() }
        })?;

        self.reservation_status = next;
        self.reserver = Some(reserver);
        self.reserver_nickname = nickname.filter(|n| !n.trim().is_empty());
        self.reservation_comment = Some(comment);
        self.touch();
        Ok(next)
    }

    /// Applies an administrative action on behalf of `actor`
    ///
    /// The role check runs first, so a caller without the admin role is
    /// refused even when the action would have been a no-op.
    pub fn apply(&mut self, action: Action, actor: &Actor) -> Result<ReservationStatus, ApplyError> {
        if action.requires_admin() {
            actor.require(Role::Admin, action.label())?;
        }

        let next = workflow::transition(self.reservation_status, action)?;
        self.reservation_status = next;
        if action == Action::Reset {
            self.clear_reservation();
        }
        self.touch();
        Ok(next)
    }

    /// Sets the title
    pub fn set_title(&mut self, title: impl Into<String>) {
        self.title = title.into();
        self.touch();
    }

    /// Moves the task to another category
    pub fn set_category(&mut self, category: CategoryId) {
        self.category = category;
        self.touch();
    }

    /// Sets or clears the description
    pub fn set_comment(&mut self, comment: Option<String>) {
        self.comment = comment;
        self.touch();
    }

    /// Adds a tag; returns false if it was already present
    pub fn add_tag(&mut self, tag: TagId) -> bool {
        if self.tags.contains(&tag) {
            return false;
        }
        self.tags.push(tag);
        self.touch();
        true
    }

    /// Removes a tag; returns false if it was not present
    pub fn remove_tag(&mut self, tag: &TagId) -> bool {
        let len_before = self.tags.len();
        self.tags.retain(|t| t != tag);
        if self.tags.len() != len_before {
            self.touch();
            true
        } else {
            false
        }
    }

    fn clear_reservation(&mut self) {
        self.reserver = None;
        self.reserver_nickname = None;
        self.reservation_comment = None;
    }

    fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

//! Domain models for the lending catalog
//!
//! Contains the core business logic without any I/O concerns.

mod actor;
mod category;
mod id;
mod status;
mod task;
mod user;
pub mod workflow;

pub use actor::{Actor, AuthorizationError, Role};
pub use category::{is_valid_label, slugify, Category, Tag, LABEL_MAX_LEN, LABEL_MIN_LEN};
pub use id::{CategoryId, IdError, TagId, TaskId, UserId};
pub use status::{AvailabilityStatus, ReservationStatus};
pub use task::{
    validate_comment, validate_email, validate_nickname, validate_title, ApplyError, Reserver, Task,
    ValidationError, COMMENT_MAX_LEN, NICKNAME_MAX_LEN,
};
pub use user::User;
pub use workflow::{transition, Action, TransitionError};

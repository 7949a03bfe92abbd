//! Reservation state machine
//!
//! Pure decision logic: given the current [`ReservationStatus`] and an
//! [`Action`], compute the next status. Invalid pairs are not failures of the
//! caller; they come back as [`TransitionError::NotApplicable`] carrying the
//! unchanged state so the caller can treat them as a no-op.
//!
//! | Action  | Valid from                   | Result    |
//! |---------|------------------------------|-----------|
//! | Request | Available                    | Pending (guest) / Reserved (user) |
//! | Approve | Pending, Reserved            | Approved  |
//! | Reject  | any                          | Rejected  |
//! | Lend    | Approved, Reserved, Returned | Lent      |
//! | Return  | Lent                         | Returned  |
//! | Reset   | Rejected, Returned           | Available |

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use super::status::{AvailabilityStatus, ReservationStatus};

/// Something that can be done to a task's reservation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    /// Ask to borrow the task
    Request { authenticated: bool },
    Approve,
    Reject,
    Lend,
    Return,
    /// Put a rejected or returned task back on the shelf
    Reset,
}

impl Action {
    /// Every administrative action
    pub fn admin_actions() -> &'static [Action] {
        &[
            Action::Approve,
            Action::Reject,
            Action::Lend,
            Action::Return,
            Action::Reset,
        ]
    }

    /// Returns true if only administrators may perform this action
    pub fn requires_admin(&self) -> bool {
        !matches!(self, Action::Request { .. })
    }

    /// Statuses this action can be applied from
    pub fn valid_from(&self) -> &'static [ReservationStatus] {
        use ReservationStatus::*;
        match self {
            Action::Request { .. } => &[Available],
            Action::Approve => &[Pending, Reserved],
            Action::Reject => ReservationStatus::all(),
            Action::Lend => &[Approved, Reserved, Returned],
            Action::Return => &[Lent],
            Action::Reset => &[Rejected, Returned],
        }
    }

    /// Status reached when the action applies
    pub fn target(&self) -> ReservationStatus {
        match self {
            Action::Request {
                authenticated: true,
            } => ReservationStatus::Reserved,
            Action::Request {
                authenticated: false,
            } => ReservationStatus::Pending,
            Action::Approve => ReservationStatus::Approved,
            Action::Reject => ReservationStatus::Rejected,
            Action::Lend => ReservationStatus::Lent,
            Action::Return => ReservationStatus::Returned,
            Action::Reset => ReservationStatus::Available,
        }
    }

    /// Availability change caused by the action, if any
    pub fn availability_effect(&self) -> Option<AvailabilityStatus> {
        match self {
            Action::Lend => Some(AvailabilityStatus::Lent),
            Action::Return => Some(AvailabilityStatus::Available),
            _ => None,
        }
    }

    /// Short verb used in messages
    pub fn label(&self) -> &'static str {
        match self {
            Action::Request { .. } => "reserve",
            Action::Approve => "approve",
            Action::Reject => "reject",
            Action::Lend => "lend",
            Action::Return => "return",
            Action::Reset => "reset",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Copy, Error, PartialEq, Eq)]
pub enum TransitionError {
    #[error("cannot {action} a task that is {state}")]
    NotApplicable {
        state: ReservationStatus,
        action: Action,
    },
}

impl TransitionError {
    /// The state the task stays in
    pub fn state(&self) -> ReservationStatus {
        match self {
            TransitionError::NotApplicable { state, .. } => *state,
        }
    }
}

/// Computes the status reached by applying `action` to `current`
pub fn transition(
    current: ReservationStatus,
    action: Action,
) -> Result<ReservationStatus, TransitionError> {
    if action.valid_from().contains(&current) {
        Ok(action.target())
    } else {
        Err(TransitionError::NotApplicable {
            state: current,
            action,
        })
    }
}

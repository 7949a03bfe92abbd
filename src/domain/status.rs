//! Status vocabulary for lendable tasks

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Where a task is in the reservation workflow
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ReservationStatus {
    /// Nobody has asked for it
    #[default]
    Available,

    /// Requested by a guest, awaiting review
    Pending,

    /// Requested by a registered user, awaiting review
    Reserved,

    /// Request accepted by an administrator
    Approved,

    /// Request turned down by an administrator
    Rejected,

    /// Out on loan
    Lent,

    /// Back from a loan
    Returned,
}

impl ReservationStatus {
    /// Returns all valid status values
    pub fn all() -> &'static [ReservationStatus] {
        &[
            ReservationStatus::Available,
            ReservationStatus::Pending,
            ReservationStatus::Reserved,
            ReservationStatus::Approved,
            ReservationStatus::Rejected,
            ReservationStatus::Lent,
            ReservationStatus::Returned,
        ]
    }

    /// Statuses shown in the administrator's review queue
    pub fn workflow_queue() -> &'static [ReservationStatus] {
        &[
            ReservationStatus::Reserved,
            ReservationStatus::Pending,
            ReservationStatus::Approved,
            ReservationStatus::Lent,
            ReservationStatus::Returned,
        ]
    }

    /// Returns true if an administrator has something to act on
    pub fn is_in_workflow(&self) -> bool {
        Self::workflow_queue().contains(self)
    }

    /// Returns true if someone has an open request on the task
    pub fn is_requested(&self) -> bool {
        matches!(self, ReservationStatus::Pending | ReservationStatus::Reserved)
    }

    /// Availability implied by this reservation status
    pub fn availability(&self) -> AvailabilityStatus {
        match self {
            ReservationStatus::Lent => AvailabilityStatus::Lent,
            _ => AvailabilityStatus::Available,
        }
    }
}

impl fmt::Display for ReservationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReservationStatus::Available => f.pad("available"),
            ReservationStatus::Pending => f.pad("pending"),
            ReservationStatus::Reserved => f.pad("reserved"),
            ReservationStatus::Approved => f.pad("approved"),
            ReservationStatus::Rejected => f.pad("rejected"),
            ReservationStatus::Lent => f.pad("lent"),
            ReservationStatus::Returned => f.pad("returned"),
        }
    }
}

impl FromStr for ReservationStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "available" | "free" => Ok(ReservationStatus::Available),
            "pending" => Ok(ReservationStatus::Pending),
            "reserved" => Ok(ReservationStatus::Reserved),
            "approved" => Ok(ReservationStatus::Approved),
            "rejected" | "declined" => Ok(ReservationStatus::Rejected),
            "lent" | "on_loan" | "on-loan" => Ok(ReservationStatus::Lent),
            "returned" => Ok(ReservationStatus::Returned),
            _ => Err(format!("Unknown reservation status: {}", s)),
        }
    }
}

/// Whether a task is physically on loan
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum AvailabilityStatus {
    #[default]
    Available,
    Lent,
}

impl AvailabilityStatus {
    pub fn all() -> &'static [AvailabilityStatus] {
        &[AvailabilityStatus::Available, AvailabilityStatus::Lent]
    }
}

impl fmt::Display for AvailabilityStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AvailabilityStatus::Available => f.pad("available"),
            AvailabilityStatus::Lent => f.pad("lent"),
        }
    }
}

impl FromStr for AvailabilityStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "available" | "in" => Ok(AvailabilityStatus::Available),
            "lent" | "out" | "on_loan" | "on-loan" => Ok(AvailabilityStatus::Lent),
            _ => Err(format!("Unknown availability status: {}", s)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_available() {
        assert_eq!(ReservationStatus::default(), ReservationStatus::Available);
        assert_eq!(AvailabilityStatus::default(), AvailabilityStatus::Available);
    }

    #[test]
    fn only_lent_is_unavailable() {
        for status in ReservationStatus::all() {
            let expected = if *status == ReservationStatus::Lent {
                AvailabilityStatus::Lent
            } else {
                AvailabilityStatus::Available
            };
            assert_eq!(status.availability(), expected, "{}", status);
        }
    }

    #[test]
    fn display_and_parse_agree() {
        for status in ReservationStatus::all() {
            let parsed: ReservationStatus = status.to_string().parse().unwrap();
            assert_eq!(parsed, *status);
        }
        for status in AvailabilityStatus::all() {
            let parsed: AvailabilityStatus = status.to_string().parse().unwrap();
            assert_eq!(parsed, *status);
        }
    }

    #[test]
    fn parse_accepts_aliases() {
        assert_eq!("ON-LOAN".parse::<ReservationStatus>(), Ok(ReservationStatus::Lent));
        assert_eq!("out".parse::<AvailabilityStatus>(), Ok(AvailabilityStatus::Lent));
        assert!("borrowed".parse::<ReservationStatus>().is_err());
    }

    #[test]
    fn workflow_queue_excludes_idle_states() {
        assert!(!ReservationStatus::Available.is_in_workflow());
        assert!(!ReservationStatus::Rejected.is_in_workflow());
        assert!(ReservationStatus::Pending.is_in_workflow());
        assert!(ReservationStatus::Returned.is_in_workflow());
    }

    #[test]
    fn serde_is_snake_case() {
        let json = serde_json::to_string(&ReservationStatus::Returned).unwrap();
        assert_eq!(json, "\"returned\"");
    }
}

//! lend - A local-first lending catalog
//!
//! Tasks (lendable items) are filed under categories and tags. Visitors and
//! registered users ask to borrow them; administrators move each request
//! through the reservation workflow: approve, lend, take back, or reject.

pub mod cli;
pub mod domain;
pub mod service;
pub mod storage;
pub mod telemetry;

pub use domain::{Action, Actor, ReservationStatus, Task, TaskId};
pub use service::{CatalogService, Outcome, ReservationService};

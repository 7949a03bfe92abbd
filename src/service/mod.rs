//! Application services
//!
//! [`ReservationService`] drives the reservation workflow for one task at a
//! time; [`CatalogService`] manages the records around it.

mod catalog;
mod reservation;

pub use catalog::{CatalogError, CatalogService, CatalogSummary, NewTask, TaskChanges};
pub use reservation::{Outcome, ReservationService, WorkflowError};

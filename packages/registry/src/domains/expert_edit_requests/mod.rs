//! Expert edit requests domain - proposed changes to a live expert
//!
//! pending -> approved -> applied, or pending -> rejected | cancelled.
//! Approval only authorizes the change; `apply` is the step that writes it.

pub mod actions;
pub mod edges;
pub mod models;

pub use models::{EditRequestStatus, ExpertEditRequest};

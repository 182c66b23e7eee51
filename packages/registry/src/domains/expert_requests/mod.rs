//! Expert requests domain - proposals to add a new expert
//!
//! pending -> approved | rejected. Approval needs an approval document and
//! materializes the expert in the same transaction.

pub mod actions;
pub mod edges;
pub mod models;

pub use models::{ExpertRequest, ExpertRequestStatus};

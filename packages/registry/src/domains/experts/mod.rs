//! Experts domain - the live registry records
//!
//! Experts change only through a direct admin update, approval of an
//! expert request, or application of an approved edit request.

pub mod actions;
pub mod diff;
pub mod edges;
pub mod models;

pub use diff::diff;
pub use models::{Expert, ExpertProfile, FieldName, ProposedChanges};

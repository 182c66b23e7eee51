//! Users domain edges

pub mod mutation;
pub mod query;

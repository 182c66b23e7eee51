//! Edit request edges - bearer in, gate, then the action

pub mod mutation;
pub mod query;

//! Documents domain edges

pub mod mutation;

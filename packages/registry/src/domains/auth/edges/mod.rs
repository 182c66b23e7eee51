//! Auth domain edges

pub mod mutation;

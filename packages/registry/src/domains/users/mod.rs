//! Users domain - accounts that log in and act on requests

pub mod actions;
pub mod edges;
pub mod models;

pub use models::User;

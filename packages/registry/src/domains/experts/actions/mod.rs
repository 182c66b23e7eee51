//! Experts domain actions

mod get_expert;
mod update_expert;

pub use get_expert::get_expert;
pub use update_expert::update_expert;

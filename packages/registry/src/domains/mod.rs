// Business domains
pub mod auth;
pub mod documents;
pub mod expert_edit_requests;
pub mod expert_requests;
pub mod experts;
pub mod users;

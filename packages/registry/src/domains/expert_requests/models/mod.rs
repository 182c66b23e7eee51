pub mod expert_request;

pub use expert_request::*;

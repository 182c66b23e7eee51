pub mod edit_request;

pub use edit_request::*;

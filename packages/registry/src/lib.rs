// Expert Registry - Core
//
// Authorization-gated submission, review and approval of expert records.
// Domains live in domains/*/{models,actions,edges}; infrastructure contracts
// and the dependency container live in kernel/.

pub mod common;
pub mod config;
pub mod domains;
pub mod kernel;

pub use config::*;

// Common types and utilities shared across the registry

pub mod auth;
pub mod entity_ids;
pub mod error;
pub mod id;
pub mod pagination;
pub mod validation;

pub use auth::{AuthError, AuthorizationGate, Identity, Role};
pub use entity_ids::*;
pub use error::{RegistryError, RegistryResult};
pub use id::Id;
pub use pagination::{Page, PageLimits, PageRequest};
pub use validation::{ValidationErrors, Validator};

//! Kernel module - infrastructure contracts and dependencies.

pub mod deps;
pub mod document_storage;
pub mod postgres_store;
pub mod test_dependencies;
pub mod traits;

pub use deps::ServerDeps;
pub use document_storage::LocalDocumentService;
pub use postgres_store::PostgresStore;
pub use test_dependencies::{InMemoryStore, SpyDocumentService, TestDependencies};
pub use traits::*;

//! Test harness over the in-memory store and spy document service.
//!
//! Every harness gets its own store, so tests never see each other's data.

use anyhow::Result;
use std::sync::Arc;
use test_context::AsyncTestContext;

use registry_core::common::auth::{Identity, Role};
use registry_core::domains::users::models::User;
use registry_core::kernel::{
    BaseRegistryStore, InMemoryStore, ServerDeps, SpyDocumentService, TestDependencies,
};

use super::YieldingStore;

/// A user with a live token.
pub struct TestUser {
    pub user: User,
    pub identity: Identity,
    /// Full `Authorization` header value
    pub bearer: String,
}

impl TestUser {
    pub fn bearer(&self) -> Option<&str> {
        Some(self.bearer.as_str())
    }
}

/// Test harness that wires actions to in-memory doubles.
///
/// # Example using test-context
///
/// ```ignore
/// use test_context::test_context;
///
/// #[test_context(TestHarness)]
/// #[tokio::test]
/// async fn my_test(ctx: &mut TestHarness) {
///     let admin = ctx.user(Role::Admin).await;
///     // ... test code
/// }
/// ```
pub struct TestHarness {
    pub deps: ServerDeps,
    pub store: Arc<InMemoryStore>,
    pub documents: Arc<SpyDocumentService>,
}

impl AsyncTestContext for TestHarness {
    async fn setup() -> Self {
        Self::new().expect("Failed to create test harness")
    }
}

impl TestHarness {
    pub fn new() -> Result<Self> {
        Self::with_dependencies(TestDependencies::new())
    }

    pub fn with_dependencies(test_deps: TestDependencies) -> Result<Self> {
        // Respect RUST_LOG; try_init because many tests share one process
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();

        let store = test_deps.store.clone();
        let documents = test_deps.documents.clone();
        let deps = test_deps.into_server_deps()?;

        Ok(Self {
            deps,
            store,
            documents,
        })
    }

    /// Dependencies over the same store, yielding after every store call so
    /// joined actions interleave between their reads and writes.
    pub fn interleaved_deps(&self) -> ServerDeps {
        ServerDeps {
            store: Arc::new(YieldingStore::new(self.store.clone())),
            ..self.deps.clone()
        }
    }

    /// Create an account with `role` and log it in.
    pub async fn user(&self, role: Role) -> TestUser {
        let email = format!("{}-{}@example.com", role, uuid::Uuid::new_v4());
        self.user_with_password(&email, "correct horse battery", role)
            .await
    }

    pub async fn user_with_password(&self, email: &str, password: &str, role: Role) -> TestUser {
        let hash = self
            .deps
            .verifier
            .hash_password(password)
            .expect("Failed to hash password");
        let user = User::new(email, "Test User", hash, role);
        assert!(self
            .store
            .insert_user(&user)
            .await
            .expect("Failed to insert user"));

        let issued = self
            .deps
            .verifier
            .issue_token(user.id, &user.name, &user.email, user.role)
            .expect("Failed to issue token");

        TestUser {
            user,
            identity: issued.identity,
            bearer: format!("Bearer {}", issued.token),
        }
    }
}

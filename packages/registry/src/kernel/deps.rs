//! Server dependencies for actions (using traits for testability)
//!
//! This module provides the central dependency container used by every
//! domain action and edge. Storage and document handling sit behind trait
//! objects so tests can swap in the doubles from `test_dependencies`.

use anyhow::{Context, Result};
use chrono::Duration;
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use tracing::info;

use crate::common::auth::AuthorizationGate;
use crate::common::PageLimits;
use crate::config::Config;
use crate::domains::auth::CredentialVerifier;
use crate::kernel::{
    BaseDocumentService, BaseRegistryStore, LocalDocumentService, PostgresStore,
};

/// Server dependencies accessible to actions (using traits for testability)
#[derive(Clone)]
pub struct ServerDeps {
    pub store: Arc<dyn BaseRegistryStore>,
    pub documents: Arc<dyn BaseDocumentService>,
    /// Owns the token signing secret for the life of the process
    pub verifier: Arc<CredentialVerifier>,
    pub page_limits: PageLimits,
    /// Upper bound enforced on uploads before they reach the document service
    pub max_document_bytes: usize,
}

impl ServerDeps {
    pub fn new(
        store: Arc<dyn BaseRegistryStore>,
        documents: Arc<dyn BaseDocumentService>,
        verifier: Arc<CredentialVerifier>,
        page_limits: PageLimits,
        max_document_bytes: usize,
    ) -> Self {
        Self {
            store,
            documents,
            verifier,
            page_limits,
            max_document_bytes,
        }
    }

    /// Build the production dependency set: Postgres, local document storage
    /// and a freshly keyed credential verifier.
    pub async fn from_config(config: &Config) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(config.database_max_connections)
            .connect(&config.database_url)
            .await
            .context("Failed to connect to database")?;

        let verifier = CredentialVerifier::new(
            config.token_issuer.clone(),
            Duration::hours(config.token_ttl_hours),
            config.password_hash_cost,
        )?;

        info!(
            issuer = %config.token_issuer,
            document_root = %config.document_root.display(),
            "Registry dependencies ready"
        );

        Ok(Self::new(
            Arc::new(PostgresStore::new(pool)),
            Arc::new(LocalDocumentService::new(
                config.document_root.clone(),
                config.max_document_bytes,
            )),
            Arc::new(verifier),
            config.page_limits(),
            config.max_document_bytes,
        ))
    }

    pub fn gate(&self) -> AuthorizationGate<'_> {
        AuthorizationGate::new(&self.verifier)
    }
}

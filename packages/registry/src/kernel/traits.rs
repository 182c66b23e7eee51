// Trait definitions for dependency injection
//
// These are INFRASTRUCTURE traits only - no business logic.
// Permission checks, validation and state-machine rules live in the domain
// actions that call these traits.
//
// Naming convention: Base* for trait names (e.g., BaseRegistryStore)

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::common::{ExpertEditRequestId, ExpertId, ExpertRequestId, UserId};
use crate::domains::documents::{DocumentMetadata, DocumentRef, DocumentType};
use crate::domains::expert_edit_requests::models::{
    EditApplication, EditRequestFilter, EditRequestStatus, EditRevision, EditTransition,
    ExpertEditRequest,
};
use crate::domains::expert_requests::models::{
    ExpertRequest, ExpertRequestFilter, ExpertRequestRevision, ExpertRequestStatus,
};
use crate::domains::experts::models::{Expert, MergeOutcome, ProposedChanges};
use crate::domains::users::models::User;

// =============================================================================
// Registry Store Trait (Infrastructure - persistence)
// =============================================================================

/// Persistence for users, experts and both request kinds.
///
/// Conditional mutations return `Ok(None)` when their precondition does not
/// hold (row missing, status not the expected one, caller not the creator)
/// and write nothing in that case. Callers re-read to tell the two apart.
#[async_trait]
pub trait BaseRegistryStore: Send + Sync {
    // Users

    /// Returns false when the email is already taken.
    async fn insert_user(&self, user: &User) -> Result<bool>;

    async fn find_user(&self, id: UserId) -> Result<Option<User>>;

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>>;

    async fn record_login(&self, id: UserId, at: DateTime<Utc>) -> Result<()>;

    // Experts

    async fn find_expert(&self, id: ExpertId) -> Result<Option<Expert>>;

    /// Merge `changes` into the expert as stored at write time.
    ///
    /// The read, the completeness check and the write hold one lock, so two
    /// merges on the same expert never drop each other's fields. `None` when
    /// the expert does not exist.
    async fn merge_expert(
        &self,
        id: ExpertId,
        changes: &ProposedChanges,
        at: DateTime<Utc>,
    ) -> Result<Option<MergeOutcome>>;

    // Expert requests

    async fn insert_expert_request(&self, request: &ExpertRequest) -> Result<()>;

    async fn find_expert_request(&self, id: ExpertRequestId) -> Result<Option<ExpertRequest>>;

    async fn list_expert_requests(
        &self,
        filter: &ExpertRequestFilter,
    ) -> Result<(Vec<ExpertRequest>, i64)>;

    /// pending -> approved, inserting `expert` and linking it, atomically.
    async fn approve_expert_request(
        &self,
        id: ExpertRequestId,
        expert: &Expert,
        reviewer: UserId,
        at: DateTime<Utc>,
    ) -> Result<Option<ExpertRequest>>;

    /// pending -> rejected.
    async fn reject_expert_request(
        &self,
        id: ExpertRequestId,
        reason: &str,
        reviewer: UserId,
        at: DateTime<Utc>,
    ) -> Result<Option<ExpertRequest>>;

    /// `expected` -> pending with new profile data and no review stamp.
    async fn revise_expert_request(
        &self,
        id: ExpertRequestId,
        expected: ExpertRequestStatus,
        revision: &ExpertRequestRevision,
        at: DateTime<Utc>,
    ) -> Result<Option<ExpertRequest>>;

    // Expert edit requests

    async fn insert_edit_request(&self, request: &ExpertEditRequest) -> Result<()>;

    async fn find_edit_request(&self, id: ExpertEditRequestId)
        -> Result<Option<ExpertEditRequest>>;

    async fn list_edit_requests(
        &self,
        filter: &EditRequestFilter,
    ) -> Result<(Vec<ExpertEditRequest>, i64)>;

    /// pending -> approved | rejected | cancelled.
    async fn transition_edit_request(
        &self,
        id: ExpertEditRequestId,
        transition: &EditTransition,
        at: DateTime<Utc>,
    ) -> Result<Option<ExpertEditRequest>>;

    /// `expected` -> pending with a recomputed change set.
    async fn revise_edit_request(
        &self,
        id: ExpertEditRequestId,
        expected: EditRequestStatus,
        revision: &EditRevision,
        at: DateTime<Utc>,
    ) -> Result<Option<ExpertEditRequest>>;

    /// approved -> applied, merging the request's changes into the expert
    /// as stored at write time, atomically.
    ///
    /// Nothing is written when the merged expert fails the completeness
    /// check; the request stays approved.
    async fn apply_edit_request(
        &self,
        id: ExpertEditRequestId,
        applied_by: UserId,
        at: DateTime<Utc>,
    ) -> Result<Option<EditApplication>>;
}

// =============================================================================
// Document Service Trait (Infrastructure - file storage)
// =============================================================================

#[async_trait]
pub trait BaseDocumentService: Send + Sync {
    /// Store `bytes` and return a reference to them.
    async fn create_document(
        &self,
        owner: UserId,
        bytes: Vec<u8>,
        metadata: &DocumentMetadata,
        document_type: DocumentType,
    ) -> Result<DocumentRef>;

    async fn delete_document(&self, document: &DocumentRef) -> Result<()>;
}

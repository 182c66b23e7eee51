// TestDependencies - in-memory implementations for testing
//
// Provides an in-memory store and a spy document service that can be
// injected into ServerDeps for tests.

use anyhow::{bail, Result};
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use super::{BaseDocumentService, BaseRegistryStore, ServerDeps};
use crate::common::{ExpertEditRequestId, ExpertId, ExpertRequestId, PageLimits, UserId};
use crate::domains::auth::CredentialVerifier;
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
// In-memory Registry Store
// =============================================================================

#[derive(Default)]
struct StoreState {
    users: HashMap<UserId, User>,
    experts: HashMap<ExpertId, Expert>,
    expert_requests: HashMap<ExpertRequestId, ExpertRequest>,
    edit_requests: HashMap<ExpertEditRequestId, ExpertEditRequest>,
}

/// `BaseRegistryStore` over hash maps, with the same conditional semantics
/// as the Postgres store. Each mutation runs under one lock, so it is as
/// atomic as the SQL transaction it stands in for.
#[derive(Default)]
pub struct InMemoryStore {
    state: Mutex<StoreState>,
    fail_writes: Mutex<bool>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, StoreState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn check_writable(&self) -> Result<()> {
        if *self.fail_writes.lock().unwrap_or_else(PoisonError::into_inner) {
            bail!("connection refused: in-memory store is failing writes");
        }
        Ok(())
    }

    /// Make every subsequent write fail, as an unreachable database would.
    pub fn fail_writes(&self, fail: bool) {
        *self.fail_writes.lock().unwrap_or_else(PoisonError::into_inner) = fail;
    }

    /// Seed a live expert directly.
    pub fn insert_expert(&self, expert: Expert) {
        self.state().experts.insert(expert.id, expert);
    }

    pub fn expert(&self, id: ExpertId) -> Option<Expert> {
        self.state().experts.get(&id).cloned()
    }

    pub fn expert_count(&self) -> usize {
        self.state().experts.len()
    }

    pub fn expert_request(&self, id: ExpertRequestId) -> Option<ExpertRequest> {
        self.state().expert_requests.get(&id).cloned()
    }

    pub fn edit_request(&self, id: ExpertEditRequestId) -> Option<ExpertEditRequest> {
        self.state().edit_requests.get(&id).cloned()
    }
}

fn page<T: Clone>(
    mut items: Vec<T>,
    key: impl Fn(&T) -> (DateTime<Utc>, uuid::Uuid),
    limit: i64,
    offset: i64,
) -> (Vec<T>, i64) {
    items.sort_by_key(|item| std::cmp::Reverse(key(item)));
    let total = items.len() as i64;
    let items = items
        .into_iter()
        .skip(offset.max(0) as usize)
        .take(limit.max(0) as usize)
        .collect();
    (items, total)
}

#[async_trait]
impl BaseRegistryStore for InMemoryStore {
    async fn insert_user(&self, user: &User) -> Result<bool> {
        self.check_writable()?;
        let mut state = self.state();
        if state.users.values().any(|u| u.email == user.email) {
            return Ok(false);
        }
        state.users.insert(user.id, user.clone());
        Ok(true)
    }

    async fn find_user(&self, id: UserId) -> Result<Option<User>> {
        Ok(self.state().users.get(&id).cloned())
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>> {
        let email = crate::domains::users::models::normalize_email(email);
        Ok(self
            .state()
            .users
            .values()
            .find(|u| u.email == email)
            .cloned())
    }

    async fn record_login(&self, id: UserId, at: DateTime<Utc>) -> Result<()> {
        self.check_writable()?;
        if let Some(user) = self.state().users.get_mut(&id) {
            user.last_login_at = Some(at);
        }
        Ok(())
    }

    async fn find_expert(&self, id: ExpertId) -> Result<Option<Expert>> {
        Ok(self.expert(id))
    }

    async fn merge_expert(
        &self,
        id: ExpertId,
        changes: &ProposedChanges,
        at: DateTime<Utc>,
    ) -> Result<Option<MergeOutcome>> {
        self.check_writable()?;
        let mut state = self.state();

        let Some(current) = state.experts.get_mut(&id) else {
            return Ok(None);
        };
        match changes.merge_checked(current, at) {
            Ok(merge) => {
                *current = merge.after.clone();
                Ok(Some(MergeOutcome::Merged(merge)))
            }
            Err(errors) => Ok(Some(MergeOutcome::Invalid(errors))),
        }
    }

    async fn insert_expert_request(&self, request: &ExpertRequest) -> Result<()> {
        self.check_writable()?;
        self.state()
            .expert_requests
            .insert(request.id, request.clone());
        Ok(())
    }

    async fn find_expert_request(&self, id: ExpertRequestId) -> Result<Option<ExpertRequest>> {
        Ok(self.expert_request(id))
    }

    async fn list_expert_requests(
        &self,
        filter: &ExpertRequestFilter,
    ) -> Result<(Vec<ExpertRequest>, i64)> {
        let matching: Vec<ExpertRequest> = self
            .state()
            .expert_requests
            .values()
            .filter(|r| r.matches(filter))
            .cloned()
            .collect();
        Ok(page(
            matching,
            |r| (r.created_at, r.id.into_uuid()),
            filter.limit,
            filter.offset,
        ))
    }

    async fn approve_expert_request(
        &self,
        id: ExpertRequestId,
        expert: &Expert,
        reviewer: UserId,
        at: DateTime<Utc>,
    ) -> Result<Option<ExpertRequest>> {
        self.check_writable()?;
        let mut state = self.state();

        let Some(request) = state.expert_requests.get_mut(&id) else {
            return Ok(None);
        };
        if request.status != ExpertRequestStatus::Pending {
            return Ok(None);
        }

        request.status = ExpertRequestStatus::Approved;
        request.approval_document = expert.approval_document.clone();
        request.expert_id = Some(expert.id);
        request.reviewed_by = Some(reviewer);
        request.reviewed_at = Some(at);
        request.updated_at = at;
        let approved = request.clone();

        state.experts.insert(expert.id, expert.clone());
        Ok(Some(approved))
    }

    async fn reject_expert_request(
        &self,
        id: ExpertRequestId,
        reason: &str,
        reviewer: UserId,
        at: DateTime<Utc>,
    ) -> Result<Option<ExpertRequest>> {
        self.check_writable()?;
        let mut state = self.state();

        let Some(request) = state.expert_requests.get_mut(&id) else {
            return Ok(None);
        };
        if request.status != ExpertRequestStatus::Pending {
            return Ok(None);
        }

        request.status = ExpertRequestStatus::Rejected;
        request.rejection_reason = Some(reason.to_string());
        request.reviewed_by = Some(reviewer);
        request.reviewed_at = Some(at);
        request.updated_at = at;
        Ok(Some(request.clone()))
    }

    async fn revise_expert_request(
        &self,
        id: ExpertRequestId,
        expected: ExpertRequestStatus,
        revision: &ExpertRequestRevision,
        at: DateTime<Utc>,
    ) -> Result<Option<ExpertRequest>> {
        self.check_writable()?;
        let mut state = self.state();

        let Some(request) = state.expert_requests.get_mut(&id) else {
            return Ok(None);
        };
        if request.status != expected {
            return Ok(None);
        }

        *request = request.revised(revision, at);
        Ok(Some(request.clone()))
    }

    async fn insert_edit_request(&self, request: &ExpertEditRequest) -> Result<()> {
        self.check_writable()?;
        self.state().edit_requests.insert(request.id, request.clone());
        Ok(())
    }

    async fn find_edit_request(
        &self,
        id: ExpertEditRequestId,
    ) -> Result<Option<ExpertEditRequest>> {
        Ok(self.edit_request(id))
    }

    async fn list_edit_requests(
        &self,
        filter: &EditRequestFilter,
    ) -> Result<(Vec<ExpertEditRequest>, i64)> {
        let matching: Vec<ExpertEditRequest> = self
            .state()
            .edit_requests
            .values()
            .filter(|r| r.matches(filter))
            .cloned()
            .collect();
        Ok(page(
            matching,
            |r| (r.created_at, r.id.into_uuid()),
            filter.limit,
            filter.offset,
        ))
    }

    async fn transition_edit_request(
        &self,
        id: ExpertEditRequestId,
        transition: &EditTransition,
        at: DateTime<Utc>,
    ) -> Result<Option<ExpertEditRequest>> {
        self.check_writable()?;
        let mut state = self.state();

        let Some(request) = state.edit_requests.get_mut(&id) else {
            return Ok(None);
        };
        if request.status != EditRequestStatus::Pending {
            return Ok(None);
        }
        if let EditTransition::Cancel { by } = transition {
            if request.created_by != *by {
                return Ok(None);
            }
        }

        *request = request.transitioned(transition, at);
        Ok(Some(request.clone()))
    }

    async fn revise_edit_request(
        &self,
        id: ExpertEditRequestId,
        expected: EditRequestStatus,
        revision: &EditRevision,
        at: DateTime<Utc>,
    ) -> Result<Option<ExpertEditRequest>> {
        self.check_writable()?;
        let mut state = self.state();

        let Some(request) = state.edit_requests.get_mut(&id) else {
            return Ok(None);
        };
        if request.status != expected {
            return Ok(None);
        }

        *request = request.revised(revision, at);
        Ok(Some(request.clone()))
    }

    async fn apply_edit_request(
        &self,
        id: ExpertEditRequestId,
        applied_by: UserId,
        at: DateTime<Utc>,
    ) -> Result<Option<EditApplication>> {
        self.check_writable()?;
        let mut state = self.state();

        let request = match state.edit_requests.get(&id) {
            Some(request) if request.status == EditRequestStatus::Approved => request.clone(),
            _ => return Ok(None),
        };
        let Some(current) = state.experts.get(&request.expert_id) else {
            bail!(
                "Expert {} missing while applying edit {}",
                request.expert_id,
                id
            );
        };

        let merge = match request.changes.merge_checked(current, at) {
            Ok(merge) => merge,
            Err(errors) => return Ok(Some(EditApplication::Invalid(errors))),
        };
        let applied = request.applied(applied_by, at);

        state.experts.insert(merge.after.id, merge.after.clone());
        state.edit_requests.insert(id, applied.clone());
        Ok(Some(EditApplication::Applied {
            request: applied,
            merge,
        }))
    }
}

// =============================================================================
// Spy Document Service
// =============================================================================

/// Records every create and delete; never touches the filesystem.
#[derive(Default)]
pub struct SpyDocumentService {
    created: Mutex<Vec<(DocumentRef, DocumentType, UserId)>>,
    deleted: Mutex<Vec<DocumentRef>>,
    fail_deletes: Mutex<bool>,
}

impl SpyDocumentService {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make `delete_document` fail, to exercise best-effort cleanup.
    pub fn failing_deletes() -> Self {
        let service = Self::default();
        *service.fail_deletes.lock().unwrap_or_else(PoisonError::into_inner) = true;
        service
    }

    pub fn created(&self) -> Vec<(DocumentRef, DocumentType, UserId)> {
        self.created
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn deleted(&self) -> Vec<DocumentRef> {
        self.deleted
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

#[async_trait]
impl BaseDocumentService for SpyDocumentService {
    async fn create_document(
        &self,
        owner: UserId,
        _bytes: Vec<u8>,
        _metadata: &DocumentMetadata,
        document_type: DocumentType,
    ) -> Result<DocumentRef> {
        let document = DocumentRef::new(format!("{}/{}", document_type, uuid::Uuid::now_v7()));
        self.created
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((document.clone(), document_type, owner));
        Ok(document)
    }

    async fn delete_document(&self, document: &DocumentRef) -> Result<()> {
        if *self.fail_deletes.lock().unwrap_or_else(PoisonError::into_inner) {
            bail!("permission denied: {}", document);
        }
        self.deleted
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(document.clone());
        Ok(())
    }
}

// =============================================================================
// TestDependencies - Builder for test dependencies
// =============================================================================

#[derive(Clone)]
pub struct TestDependencies {
    pub store: Arc<InMemoryStore>,
    pub documents: Arc<SpyDocumentService>,
    pub page_limits: PageLimits,
    pub max_document_bytes: usize,
}

impl TestDependencies {
    pub fn new() -> Self {
        Self {
            store: Arc::new(InMemoryStore::new()),
            documents: Arc::new(SpyDocumentService::new()),
            page_limits: PageLimits::default(),
            max_document_bytes: 1024 * 1024,
        }
    }

    /// Set a spy document service
    pub fn mock_documents(mut self, documents: SpyDocumentService) -> Self {
        self.documents = Arc::new(documents);
        self
    }

    /// Set paging bounds
    pub fn page_limits(mut self, default_limit: i64, max_limit: i64) -> Self {
        self.page_limits = PageLimits {
            default_limit,
            max_limit,
        };
        self
    }

    /// Build ServerDeps with a cheap-to-hash credential verifier.
    pub fn into_server_deps(self) -> Result<ServerDeps> {
        let verifier = CredentialVerifier::new("test-registry".to_string(), Duration::hours(1), 1)?;

        Ok(ServerDeps::new(
            self.store,
            self.documents,
            Arc::new(verifier),
            self.page_limits,
            self.max_document_bytes,
        ))
    }
}

impl Default for TestDependencies {
    fn default() -> Self {
        Self::new()
    }
}

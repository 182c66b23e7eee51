//! Store wrapper that hands control back to the scheduler after every call.
//!
//! Two actions joined on one task then interleave at each store boundary
//! (both read before either writes), which is the schedule concurrent
//! requests hit against a real database.

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Arc;

use registry_core::common::{ExpertEditRequestId, ExpertId, ExpertRequestId, UserId};
use registry_core::domains::expert_edit_requests::models::{
    EditApplication, EditRequestFilter, EditRequestStatus, EditRevision, EditTransition,
    ExpertEditRequest,
};
use registry_core::domains::expert_requests::models::{
    ExpertRequest, ExpertRequestFilter, ExpertRequestRevision, ExpertRequestStatus,
};
use registry_core::domains::experts::models::{Expert, MergeOutcome, ProposedChanges};
use registry_core::domains::users::models::User;
use registry_core::kernel::{BaseRegistryStore, InMemoryStore};

pub struct YieldingStore {
    inner: Arc<InMemoryStore>,
}

impl YieldingStore {
    pub fn new(inner: Arc<InMemoryStore>) -> Self {
        Self { inner }
    }
}

async fn yielded<T>(result: T) -> T {
    tokio::task::yield_now().await;
    result
}

#[async_trait]
impl BaseRegistryStore for YieldingStore {
    async fn insert_user(&self, user: &User) -> Result<bool> {
        yielded(self.inner.insert_user(user).await).await
    }

    async fn find_user(&self, id: UserId) -> Result<Option<User>> {
        yielded(self.inner.find_user(id).await).await
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>> {
        yielded(self.inner.find_user_by_email(email).await).await
    }

    async fn record_login(&self, id: UserId, at: DateTime<Utc>) -> Result<()> {
        yielded(self.inner.record_login(id, at).await).await
    }

    async fn find_expert(&self, id: ExpertId) -> Result<Option<Expert>> {
        yielded(self.inner.find_expert(id).await).await
    }

    async fn merge_expert(
        &self,
        id: ExpertId,
        changes: &ProposedChanges,
        at: DateTime<Utc>,
    ) -> Result<Option<MergeOutcome>> {
        yielded(self.inner.merge_expert(id, changes, at).await).await
    }

    async fn insert_expert_request(&self, request: &ExpertRequest) -> Result<()> {
        yielded(self.inner.insert_expert_request(request).await).await
    }

    async fn find_expert_request(&self, id: ExpertRequestId) -> Result<Option<ExpertRequest>> {
        yielded(self.inner.find_expert_request(id).await).await
    }

    async fn list_expert_requests(
        &self,
        filter: &ExpertRequestFilter,
    ) -> Result<(Vec<ExpertRequest>, i64)> {
        yielded(self.inner.list_expert_requests(filter).await).await
    }

    async fn approve_expert_request(
        &self,
        id: ExpertRequestId,
        expert: &Expert,
        reviewer: UserId,
        at: DateTime<Utc>,
    ) -> Result<Option<ExpertRequest>> {
        yielded(
            self.inner
                .approve_expert_request(id, expert, reviewer, at)
                .await,
        )
        .await
    }

    async fn reject_expert_request(
        &self,
        id: ExpertRequestId,
        reason: &str,
        reviewer: UserId,
        at: DateTime<Utc>,
    ) -> Result<Option<ExpertRequest>> {
        yielded(
            self.inner
                .reject_expert_request(id, reason, reviewer, at)
                .await,
        )
        .await
    }

    async fn revise_expert_request(
        &self,
        id: ExpertRequestId,
        expected: ExpertRequestStatus,
        revision: &ExpertRequestRevision,
        at: DateTime<Utc>,
    ) -> Result<Option<ExpertRequest>> {
        yielded(
            self.inner
                .revise_expert_request(id, expected, revision, at)
                .await,
        )
        .await
    }

    async fn insert_edit_request(&self, request: &ExpertEditRequest) -> Result<()> {
        yielded(self.inner.insert_edit_request(request).await).await
    }

    async fn find_edit_request(
        &self,
        id: ExpertEditRequestId,
    ) -> Result<Option<ExpertEditRequest>> {
        yielded(self.inner.find_edit_request(id).await).await
    }

    async fn list_edit_requests(
        &self,
        filter: &EditRequestFilter,
    ) -> Result<(Vec<ExpertEditRequest>, i64)> {
        yielded(self.inner.list_edit_requests(filter).await).await
    }

    async fn transition_edit_request(
        &self,
        id: ExpertEditRequestId,
        transition: &EditTransition,
        at: DateTime<Utc>,
    ) -> Result<Option<ExpertEditRequest>> {
        yielded(self.inner.transition_edit_request(id, transition, at).await).await
    }

    async fn revise_edit_request(
        &self,
        id: ExpertEditRequestId,
        expected: EditRequestStatus,
        revision: &EditRevision,
        at: DateTime<Utc>,
    ) -> Result<Option<ExpertEditRequest>> {
        yielded(
            self.inner
                .revise_edit_request(id, expected, revision, at)
                .await,
        )
        .await
    }

    async fn apply_edit_request(
        &self,
        id: ExpertEditRequestId,
        applied_by: UserId,
        at: DateTime<Utc>,
    ) -> Result<Option<EditApplication>> {
        yielded(self.inner.apply_edit_request(id, applied_by, at).await).await
    }
}

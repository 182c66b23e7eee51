//! `BaseRegistryStore` over Postgres.
//!
//! A thin adapter: every query lives on the model it reads or writes.

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use super::BaseRegistryStore;
use crate::common::{ExpertEditRequestId, ExpertId, ExpertRequestId, UserId};
use crate::domains::expert_edit_requests::models::{
    EditApplication, EditRequestFilter, EditRequestStatus, EditRevision, EditTransition,
    ExpertEditRequest,
};
use crate::domains::expert_requests::models::{
    ExpertRequest, ExpertRequestFilter, ExpertRequestRevision, ExpertRequestStatus,
};
use crate::domains::experts::models::{Expert, MergeOutcome, ProposedChanges};
use crate::domains::users::models::User;

#[derive(Clone)]
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl BaseRegistryStore for PostgresStore {
    async fn insert_user(&self, user: &User) -> Result<bool> {
        user.insert(&self.pool).await
    }

    async fn find_user(&self, id: UserId) -> Result<Option<User>> {
        User::find_by_id(id, &self.pool).await
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>> {
        User::find_by_email(email, &self.pool).await
    }

    async fn record_login(&self, id: UserId, at: DateTime<Utc>) -> Result<()> {
        User::record_login(id, at, &self.pool).await
    }

    async fn find_expert(&self, id: ExpertId) -> Result<Option<Expert>> {
        Expert::find_by_id(id, &self.pool).await
    }

    async fn merge_expert(
        &self,
        id: ExpertId,
        changes: &ProposedChanges,
        at: DateTime<Utc>,
    ) -> Result<Option<MergeOutcome>> {
        Expert::merge(id, changes, at, &self.pool).await
    }

    async fn insert_expert_request(&self, request: &ExpertRequest) -> Result<()> {
        request.insert(&self.pool).await
    }

    async fn find_expert_request(&self, id: ExpertRequestId) -> Result<Option<ExpertRequest>> {
        ExpertRequest::find_by_id(id, &self.pool).await
    }

    async fn list_expert_requests(
        &self,
        filter: &ExpertRequestFilter,
    ) -> Result<(Vec<ExpertRequest>, i64)> {
        ExpertRequest::list(filter, &self.pool).await
    }

    async fn approve_expert_request(
        &self,
        id: ExpertRequestId,
        expert: &Expert,
        reviewer: UserId,
        at: DateTime<Utc>,
    ) -> Result<Option<ExpertRequest>> {
        ExpertRequest::approve(id, expert, reviewer, at, &self.pool).await
    }

    async fn reject_expert_request(
        &self,
        id: ExpertRequestId,
        reason: &str,
        reviewer: UserId,
        at: DateTime<Utc>,
    ) -> Result<Option<ExpertRequest>> {
        ExpertRequest::reject(id, reason, reviewer, at, &self.pool).await
    }

    async fn revise_expert_request(
        &self,
        id: ExpertRequestId,
        expected: ExpertRequestStatus,
        revision: &ExpertRequestRevision,
        at: DateTime<Utc>,
    ) -> Result<Option<ExpertRequest>> {
        ExpertRequest::revise(id, expected, revision, at, &self.pool).await
    }

    async fn insert_edit_request(&self, request: &ExpertEditRequest) -> Result<()> {
        request.insert(&self.pool).await
    }

    async fn find_edit_request(
        &self,
        id: ExpertEditRequestId,
    ) -> Result<Option<ExpertEditRequest>> {
        ExpertEditRequest::find_by_id(id, &self.pool).await
    }

    async fn list_edit_requests(
        &self,
        filter: &EditRequestFilter,
    ) -> Result<(Vec<ExpertEditRequest>, i64)> {
        ExpertEditRequest::list(filter, &self.pool).await
    }

    async fn transition_edit_request(
        &self,
        id: ExpertEditRequestId,
        transition: &EditTransition,
        at: DateTime<Utc>,
    ) -> Result<Option<ExpertEditRequest>> {
        ExpertEditRequest::transition(id, transition, at, &self.pool).await
    }

    async fn revise_edit_request(
        &self,
        id: ExpertEditRequestId,
        expected: EditRequestStatus,
        revision: &EditRevision,
        at: DateTime<Utc>,
    ) -> Result<Option<ExpertEditRequest>> {
        ExpertEditRequest::revise(id, expected, revision, at, &self.pool).await
    }

    async fn apply_edit_request(
        &self,
        id: ExpertEditRequestId,
        applied_by: UserId,
        at: DateTime<Utc>,
    ) -> Result<Option<EditApplication>> {
        ExpertEditRequest::apply(id, applied_by, at, &self.pool).await
    }
}

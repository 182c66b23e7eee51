use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::PgPool;
use std::collections::BTreeSet;

use crate::common::{ExpertEditRequestId, ExpertId, UserId};
use crate::domains::documents::DocumentRef;
use crate::common::validation::ValidationErrors;
use crate::domains::experts::models::{Expert, FieldName, MergedExpert, ProposedChanges};

/// ExpertEditRequest - a proposed change to a live expert record
///
/// `fields_changed` is always computed by the server from `changes` and the
/// expert as it was when the request was proposed or last revised.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExpertEditRequest {
    pub id: ExpertEditRequestId,
    pub expert_id: ExpertId,
    pub changes: ProposedChanges,
    pub fields_changed: BTreeSet<FieldName>,
    pub change_summary: String,
    pub change_reason: String,
    pub status: EditRequestStatus,
    pub rejection_reason: Option<String>,
    pub admin_notes: Option<String>,
    pub created_by: UserId,
    pub reviewed_by: Option<UserId>,
    pub reviewed_at: Option<DateTime<Utc>>,
    pub applied_by: Option<UserId>,
    pub applied_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Edit request status enum
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EditRequestStatus {
    Pending,
    Approved,
    Rejected,
    Cancelled,
    Applied,
}

impl std::fmt::Display for EditRequestStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EditRequestStatus::Pending => write!(f, "pending"),
            EditRequestStatus::Approved => write!(f, "approved"),
            EditRequestStatus::Rejected => write!(f, "rejected"),
            EditRequestStatus::Cancelled => write!(f, "cancelled"),
            EditRequestStatus::Applied => write!(f, "applied"),
        }
    }
}

impl std::str::FromStr for EditRequestStatus {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "pending" => Ok(EditRequestStatus::Pending),
            "approved" => Ok(EditRequestStatus::Approved),
            "rejected" => Ok(EditRequestStatus::Rejected),
            "cancelled" => Ok(EditRequestStatus::Cancelled),
            "applied" => Ok(EditRequestStatus::Applied),
            _ => Err(anyhow::anyhow!("Invalid edit request status: {}", s)),
        }
    }
}

/// A status change guarded by "current status is pending".
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditTransition {
    /// Reviewer decision: to `Approved` or `Rejected`
    Decide {
        status: EditRequestStatus,
        reviewer: UserId,
        rejection_reason: Option<String>,
        admin_notes: Option<String>,
    },
    /// Creator withdrawal; also guarded by `created_by = by`
    Cancel { by: UserId },
}

impl EditTransition {
    pub fn target(&self) -> EditRequestStatus {
        match self {
            EditTransition::Decide { status, .. } => *status,
            EditTransition::Cancel { .. } => EditRequestStatus::Cancelled,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditRequestFilter {
    pub status: Option<EditRequestStatus>,
    pub created_by: Option<UserId>,
    pub expert_id: Option<ExpertId>,
    pub limit: i64,
    pub offset: i64,
}

/// Replacement change set for a pending or rejected edit request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditRevision {
    pub changes: ProposedChanges,
    pub fields_changed: BTreeSet<FieldName>,
    pub change_summary: String,
    pub change_reason: String,
}

/// What applying an approved edit request did.
#[derive(Debug, Clone)]
pub enum EditApplication {
    Applied {
        request: ExpertEditRequest,
        merge: MergedExpert,
    },
    /// The expert as stored would be left incomplete; nothing was written
    Invalid(ValidationErrors),
}

impl ExpertEditRequest {
    pub fn new(
        expert_id: ExpertId,
        changes: ProposedChanges,
        fields_changed: BTreeSet<FieldName>,
        change_summary: String,
        change_reason: String,
        created_by: UserId,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: ExpertEditRequestId::new(),
            expert_id,
            changes,
            fields_changed,
            change_summary,
            change_reason,
            status: EditRequestStatus::Pending,
            rejection_reason: None,
            admin_notes: None,
            created_by,
            reviewed_by: None,
            reviewed_at: None,
            applied_by: None,
            applied_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn new_cv_document(&self) -> Option<&DocumentRef> {
        self.changes.new_cv_document()
    }

    pub fn removes_cv(&self) -> bool {
        self.changes.removes_cv()
    }

    pub fn new_approval_document(&self) -> Option<&DocumentRef> {
        self.changes.new_approval_document()
    }

    pub fn removes_approval_document(&self) -> bool {
        self.changes.removes_approval_document()
    }

    pub fn matches(&self, filter: &EditRequestFilter) -> bool {
        filter.status.map_or(true, |status| self.status == status)
            && filter.created_by.map_or(true, |user| self.created_by == user)
            && filter.expert_id.map_or(true, |expert| self.expert_id == expert)
    }

    /// The stored state after `transition` succeeds at `at`.
    pub fn transitioned(&self, transition: &EditTransition, at: DateTime<Utc>) -> Self {
        let mut next = self.clone();
        next.status = transition.target();
        next.updated_at = at;

        if let EditTransition::Decide {
            reviewer,
            rejection_reason,
            admin_notes,
            ..
        } = transition
        {
            next.reviewed_by = Some(*reviewer);
            next.reviewed_at = Some(at);
            next.rejection_reason = rejection_reason.clone();
            next.admin_notes = admin_notes.clone();
        }
        next
    }

    /// The stored state after a successful revision.
    pub fn revised(&self, revision: &EditRevision, at: DateTime<Utc>) -> Self {
        Self {
            changes: revision.changes.clone(),
            fields_changed: revision.fields_changed.clone(),
            change_summary: revision.change_summary.clone(),
            change_reason: revision.change_reason.clone(),
            status: EditRequestStatus::Pending,
            rejection_reason: None,
            reviewed_by: None,
            reviewed_at: None,
            updated_at: at,
            ..self.clone()
        }
    }

    pub fn applied(&self, by: UserId, at: DateTime<Utc>) -> Self {
        Self {
            status: EditRequestStatus::Applied,
            applied_by: Some(by),
            applied_at: Some(at),
            updated_at: at,
            ..self.clone()
        }
    }
}

// =============================================================================
// Row mapping
// =============================================================================

#[derive(sqlx::FromRow)]
struct EditRequestRow {
    id: ExpertEditRequestId,
    expert_id: ExpertId,
    changes: Json<ProposedChanges>,
    fields_changed: Json<BTreeSet<FieldName>>,
    change_summary: String,
    change_reason: String,
    status: String,
    rejection_reason: Option<String>,
    admin_notes: Option<String>,
    created_by: UserId,
    reviewed_by: Option<UserId>,
    reviewed_at: Option<DateTime<Utc>>,
    applied_by: Option<UserId>,
    applied_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<EditRequestRow> for ExpertEditRequest {
    type Error = anyhow::Error;

    fn try_from(row: EditRequestRow) -> Result<Self> {
        Ok(Self {
            id: row.id,
            expert_id: row.expert_id,
            changes: row.changes.0,
            fields_changed: row.fields_changed.0,
            change_summary: row.change_summary,
            change_reason: row.change_reason,
            status: row.status.parse()?,
            rejection_reason: row.rejection_reason,
            admin_notes: row.admin_notes,
            created_by: row.created_by,
            reviewed_by: row.reviewed_by,
            reviewed_at: row.reviewed_at,
            applied_by: row.applied_by,
            applied_at: row.applied_at,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

fn convert(row: Option<EditRequestRow>) -> Result<Option<ExpertEditRequest>> {
    row.map(ExpertEditRequest::try_from).transpose()
}

// =============================================================================
// SQL Queries - ALL queries must be in models/
// =============================================================================

impl ExpertEditRequest {
    pub async fn find_by_id(id: ExpertEditRequestId, pool: &PgPool) -> Result<Option<Self>> {
        let row = sqlx::query_as::<_, EditRequestRow>(
            "SELECT * FROM expert_edit_requests WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(pool)
        .await?;
        convert(row)
    }

    pub async fn list(filter: &EditRequestFilter, pool: &PgPool) -> Result<(Vec<Self>, i64)> {
        let status = filter.status.map(|s| s.to_string());

        let rows = sqlx::query_as::<_, EditRequestRow>(
            r#"
            SELECT * FROM expert_edit_requests
            WHERE ($1::text IS NULL OR status = $1)
              AND ($2::uuid IS NULL OR created_by = $2)
              AND ($3::uuid IS NULL OR expert_id = $3)
            ORDER BY created_at DESC, id DESC
            LIMIT $4 OFFSET $5
            "#,
        )
        .bind(&status)
        .bind(filter.created_by)
        .bind(filter.expert_id)
        .bind(filter.limit)
        .bind(filter.offset)
        .fetch_all(pool)
        .await?;

        let total: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*) FROM expert_edit_requests
            WHERE ($1::text IS NULL OR status = $1)
              AND ($2::uuid IS NULL OR created_by = $2)
              AND ($3::uuid IS NULL OR expert_id = $3)
            "#,
        )
        .bind(&status)
        .bind(filter.created_by)
        .bind(filter.expert_id)
        .fetch_one(pool)
        .await?;

        let items = rows
            .into_iter()
            .map(ExpertEditRequest::try_from)
            .collect::<Result<Vec<_>>>()?;
        Ok((items, total))
    }

    pub async fn insert(&self, pool: &PgPool) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO expert_edit_requests (
                id, expert_id, changes, fields_changed, change_summary, change_reason,
                status, rejection_reason, admin_notes, created_by,
                reviewed_by, reviewed_at, applied_by, applied_at, created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16)
            "#,
        )
        .bind(self.id)
        .bind(self.expert_id)
        .bind(Json(&self.changes))
        .bind(Json(&self.fields_changed))
        .bind(&self.change_summary)
        .bind(&self.change_reason)
        .bind(self.status.to_string())
        .bind(&self.rejection_reason)
        .bind(&self.admin_notes)
        .bind(self.created_by)
        .bind(self.reviewed_by)
        .bind(self.reviewed_at)
        .bind(self.applied_by)
        .bind(self.applied_at)
        .bind(self.created_at)
        .bind(self.updated_at)
        .execute(pool)
        .await?;
        Ok(())
    }

    /// Conditional status change out of `pending`.
    pub async fn transition(
        id: ExpertEditRequestId,
        transition: &EditTransition,
        at: DateTime<Utc>,
        pool: &PgPool,
    ) -> Result<Option<Self>> {
        let row = match transition {
            EditTransition::Decide {
                status,
                reviewer,
                rejection_reason,
                admin_notes,
            } => {
                sqlx::query_as::<_, EditRequestRow>(
                    r#"
                    UPDATE expert_edit_requests
                    SET status = $2,
                        reviewed_by = $3,
                        reviewed_at = $4,
                        rejection_reason = $5,
                        admin_notes = $6,
                        updated_at = $4
                    WHERE id = $1 AND status = 'pending'
                    RETURNING *
                    "#,
                )
                .bind(id)
                .bind(status.to_string())
                .bind(reviewer)
                .bind(at)
                .bind(rejection_reason)
                .bind(admin_notes)
                .fetch_optional(pool)
                .await?
            }
            EditTransition::Cancel { by } => {
                sqlx::query_as::<_, EditRequestRow>(
                    r#"
                    UPDATE expert_edit_requests
                    SET status = 'cancelled', updated_at = $3
                    WHERE id = $1 AND status = 'pending' AND created_by = $2
                    RETURNING *
                    "#,
                )
                .bind(id)
                .bind(by)
                .bind(at)
                .fetch_optional(pool)
                .await?
            }
        };
        convert(row)
    }

    pub async fn revise(
        id: ExpertEditRequestId,
        expected: EditRequestStatus,
        revision: &EditRevision,
        at: DateTime<Utc>,
        pool: &PgPool,
    ) -> Result<Option<Self>> {
        let row = sqlx::query_as::<_, EditRequestRow>(
            r#"
            UPDATE expert_edit_requests
            SET changes = $3,
                fields_changed = $4,
                change_summary = $5,
                change_reason = $6,
                status = 'pending',
                rejection_reason = NULL,
                reviewed_by = NULL,
                reviewed_at = NULL,
                updated_at = $7
            WHERE id = $1 AND status = $2
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(expected.to_string())
        .bind(Json(&revision.changes))
        .bind(Json(&revision.fields_changed))
        .bind(&revision.change_summary)
        .bind(&revision.change_reason)
        .bind(at)
        .fetch_optional(pool)
        .await?;
        convert(row)
    }

    /// Flip `approved` to `applied` and merge the changes into the expert
    /// as it is under lock, in one transaction.
    ///
    /// Both rows are locked before anything is read for the merge, so
    /// concurrent applies on one expert serialize and each sees the other's
    /// committed fields. `None` when the request is not approved.
    pub async fn apply(
        id: ExpertEditRequestId,
        applied_by: UserId,
        at: DateTime<Utc>,
        pool: &PgPool,
    ) -> Result<Option<EditApplication>> {
        let mut tx = pool.begin().await?;

        let row = sqlx::query_as::<_, EditRequestRow>(
            "SELECT * FROM expert_edit_requests WHERE id = $1 AND status = 'approved' FOR UPDATE",
        )
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(row) = row else {
            tx.rollback().await?;
            return Ok(None);
        };
        let request = ExpertEditRequest::try_from(row)?;

        let Some(current) = Expert::find_for_update(request.expert_id, &mut *tx).await? else {
            tx.rollback().await?;
            anyhow::bail!(
                "Expert {} missing while applying edit {}",
                request.expert_id,
                id
            );
        };

        let merge = match request.changes.merge_checked(&current, at) {
            Ok(merge) => merge,
            Err(errors) => {
                tx.rollback().await?;
                return Ok(Some(EditApplication::Invalid(errors)));
            }
        };

        if merge.after.update(&mut *tx).await?.is_none() {
            tx.rollback().await?;
            anyhow::bail!("Expert {} vanished under lock", request.expert_id);
        }

        let row = sqlx::query_as::<_, EditRequestRow>(
            r#"
            UPDATE expert_edit_requests
            SET status = 'applied',
                applied_by = $2,
                applied_at = $3,
                updated_at = $3
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(applied_by)
        .bind(at)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(Some(EditApplication::Applied {
            request: row.try_into()?,
            merge,
        }))
    }
}

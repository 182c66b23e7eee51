use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};

use crate::common::{ExpertId, ExpertRequestId, UserId};
use crate::domains::documents::{DocumentPatch, DocumentRef};
use crate::domains::experts::models::expert::{bind_profile, ProfileRow};
use crate::domains::experts::models::{Expert, ExpertProfile};

/// ExpertRequest - a proposal to add a new expert to the registry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExpertRequest {
    pub id: ExpertRequestId,
    #[serde(flatten)]
    pub profile: ExpertProfile,
    pub status: ExpertRequestStatus,
    pub rejection_reason: Option<String>,
    pub cv_document: Option<DocumentRef>,
    pub approval_document: Option<DocumentRef>,
    /// Set once, when approval materializes the expert
    pub expert_id: Option<ExpertId>,
    pub created_by: UserId,
    pub reviewed_by: Option<UserId>,
    pub reviewed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Expert request status enum
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExpertRequestStatus {
    Pending,
    Approved,
    Rejected,
}

impl std::fmt::Display for ExpertRequestStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExpertRequestStatus::Pending => write!(f, "pending"),
            ExpertRequestStatus::Approved => write!(f, "approved"),
            ExpertRequestStatus::Rejected => write!(f, "rejected"),
        }
    }
}

impl std::str::FromStr for ExpertRequestStatus {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "pending" => Ok(ExpertRequestStatus::Pending),
            "approved" => Ok(ExpertRequestStatus::Approved),
            "rejected" => Ok(ExpertRequestStatus::Rejected),
            _ => Err(anyhow::anyhow!("Invalid expert request status: {}", s)),
        }
    }
}

/// List filter; `created_by` scopes to one submitter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExpertRequestFilter {
    pub status: Option<ExpertRequestStatus>,
    pub created_by: Option<UserId>,
    pub limit: i64,
    pub offset: i64,
}

/// New profile data for a pending or rejected request.
///
/// Documents left as `None` keep their stored value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExpertRequestRevision {
    pub profile: ExpertProfile,
    /// `None` keeps the stored document
    pub cv_document: Option<DocumentPatch>,
    pub approval_document: Option<DocumentPatch>,
}

impl ExpertRequestRevision {
    /// Whether the CV column is overwritten, and with what.
    fn cv_slot(&self) -> (bool, Option<DocumentRef>) {
        slot(&self.cv_document)
    }

    fn approval_slot(&self) -> (bool, Option<DocumentRef>) {
        slot(&self.approval_document)
    }
}

fn slot(patch: &Option<DocumentPatch>) -> (bool, Option<DocumentRef>) {
    match patch {
        Some(patch) => (true, patch.resulting_ref()),
        None => (false, None),
    }
}

impl ExpertRequest {
    pub fn new(
        profile: ExpertProfile,
        cv_document: Option<DocumentRef>,
        approval_document: Option<DocumentRef>,
        created_by: UserId,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: ExpertRequestId::new(),
            profile,
            status: ExpertRequestStatus::Pending,
            rejection_reason: None,
            cv_document,
            approval_document,
            expert_id: None,
            created_by,
            reviewed_by: None,
            reviewed_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// The expert record approval of this request creates.
    pub fn to_expert(&self, approval_document: DocumentRef, at: DateTime<Utc>) -> Expert {
        Expert {
            id: ExpertId::new(),
            profile: self.profile.clone(),
            cv_document: self.cv_document.clone(),
            approval_document: Some(approval_document),
            original_request_id: Some(self.id),
            created_at: at,
            updated_at: at,
        }
    }

    pub fn matches(&self, filter: &ExpertRequestFilter) -> bool {
        filter.status.map_or(true, |status| self.status == status)
            && filter.created_by.map_or(true, |user| self.created_by == user)
    }

    /// The stored state after a successful revision.
    pub fn revised(&self, revision: &ExpertRequestRevision, at: DateTime<Utc>) -> Self {
        Self {
            profile: revision.profile.clone(),
            cv_document: match &revision.cv_document {
                Some(patch) => patch.resulting_ref(),
                None => self.cv_document.clone(),
            },
            approval_document: match &revision.approval_document {
                Some(patch) => patch.resulting_ref(),
                None => self.approval_document.clone(),
            },
            status: ExpertRequestStatus::Pending,
            rejection_reason: None,
            reviewed_by: None,
            reviewed_at: None,
            updated_at: at,
            ..self.clone()
        }
    }
}

// =============================================================================
// Row mapping
// =============================================================================

#[derive(sqlx::FromRow)]
struct ExpertRequestRow {
    id: ExpertRequestId,
    #[sqlx(flatten)]
    profile: ProfileRow,
    status: String,
    rejection_reason: Option<String>,
    cv_document: Option<DocumentRef>,
    approval_document: Option<DocumentRef>,
    expert_id: Option<ExpertId>,
    created_by: UserId,
    reviewed_by: Option<UserId>,
    reviewed_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<ExpertRequestRow> for ExpertRequest {
    type Error = anyhow::Error;

    fn try_from(row: ExpertRequestRow) -> Result<Self> {
        Ok(Self {
            id: row.id,
            profile: row.profile.try_into()?,
            status: row.status.parse()?,
            rejection_reason: row.rejection_reason,
            cv_document: row.cv_document,
            approval_document: row.approval_document,
            expert_id: row.expert_id,
            created_by: row.created_by,
            reviewed_by: row.reviewed_by,
            reviewed_at: row.reviewed_at,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

fn convert(row: Option<ExpertRequestRow>) -> Result<Option<ExpertRequest>> {
    row.map(ExpertRequest::try_from).transpose()
}

// =============================================================================
// SQL Queries - ALL queries must be in models/
// =============================================================================

impl ExpertRequest {
    pub async fn find_by_id(id: ExpertRequestId, pool: &PgPool) -> Result<Option<Self>> {
        let row = sqlx::query_as::<_, ExpertRequestRow>(
            "SELECT * FROM expert_requests WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(pool)
        .await?;
        convert(row)
    }

    /// Newest first, plus the total count ignoring limit/offset.
    pub async fn list(filter: &ExpertRequestFilter, pool: &PgPool) -> Result<(Vec<Self>, i64)> {
        let status = filter.status.map(|s| s.to_string());

        let rows = sqlx::query_as::<_, ExpertRequestRow>(
            r#"
            SELECT * FROM expert_requests
            WHERE ($1::text IS NULL OR status = $1)
              AND ($2::uuid IS NULL OR created_by = $2)
            ORDER BY created_at DESC, id DESC
            LIMIT $3 OFFSET $4
            "#,
        )
        .bind(&status)
        .bind(filter.created_by)
        .bind(filter.limit)
        .bind(filter.offset)
        .fetch_all(pool)
        .await?;

        let total: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*) FROM expert_requests
            WHERE ($1::text IS NULL OR status = $1)
              AND ($2::uuid IS NULL OR created_by = $2)
            "#,
        )
        .bind(&status)
        .bind(filter.created_by)
        .fetch_one(pool)
        .await?;

        let items = rows
            .into_iter()
            .map(ExpertRequest::try_from)
            .collect::<Result<Vec<_>>>()?;
        Ok((items, total))
    }

    pub async fn insert(&self, pool: &PgPool) -> Result<()> {
        let query = sqlx::query(
            r#"
            INSERT INTO expert_requests (
                id,
                name, designation, affiliation, phone, email,
                is_bahraini, is_available, rating, role, employment_type,
                general_area, specialized_areas, is_trained, is_published, biography,
                experience_entries, education_entries,
                status, rejection_reason, cv_document, approval_document, expert_id,
                created_by, reviewed_by, reviewed_at, created_at, updated_at
            )
            VALUES (
                $1,
                $2, $3, $4, $5, $6, $7, $8, $9, $10, $11,
                $12, $13, $14, $15, $16, $17, $18,
                $19, $20, $21, $22, $23, $24, $25, $26, $27, $28
            )
            "#,
        )
        .bind(self.id);

        bind_profile(query, &self.profile)
            .bind(self.status.to_string())
            .bind(&self.rejection_reason)
            .bind(&self.cv_document)
            .bind(&self.approval_document)
            .bind(self.expert_id)
            .bind(self.created_by)
            .bind(self.reviewed_by)
            .bind(self.reviewed_at)
            .bind(self.created_at)
            .bind(self.updated_at)
            .execute(pool)
            .await?;
        Ok(())
    }

    /// Approve a pending request and create its expert in one transaction.
    ///
    /// The request row is claimed with `FOR UPDATE` before the expert is
    /// inserted. A concurrent approve or reject waits on that lock, then sees
    /// the request is no longer pending and gets `None` without inserting.
    /// Returns `None` (and writes nothing) unless the request is pending.
    pub async fn approve(
        id: ExpertRequestId,
        expert: &Expert,
        reviewer: UserId,
        at: DateTime<Utc>,
        pool: &PgPool,
    ) -> Result<Option<Self>> {
        let mut tx = pool.begin().await?;

        let claimed: Option<ExpertRequestId> = sqlx::query_scalar(
            "SELECT id FROM expert_requests WHERE id = $1 AND status = 'pending' FOR UPDATE",
        )
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?;
        if claimed.is_none() {
            tx.rollback().await?;
            return Ok(None);
        }

        expert.insert(&mut *tx).await?;

        let row = sqlx::query_as::<_, ExpertRequestRow>(
            r#"
            UPDATE expert_requests
            SET status = 'approved',
                approval_document = $2,
                expert_id = $3,
                reviewed_by = $4,
                reviewed_at = $5,
                updated_at = $5
            WHERE id = $1 AND status = 'pending'
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(&expert.approval_document)
        .bind(expert.id)
        .bind(reviewer)
        .bind(at)
        .fetch_optional(&mut *tx)
        .await?;

        match row {
            Some(row) => {
                tx.commit().await?;
                Ok(Some(row.try_into()?))
            }
            None => {
                tx.rollback().await?;
                Ok(None)
            }
        }
    }

    /// Reject a pending request; `None` unless it is pending.
    pub async fn reject(
        id: ExpertRequestId,
        reason: &str,
        reviewer: UserId,
        at: DateTime<Utc>,
        pool: &PgPool,
    ) -> Result<Option<Self>> {
        let row = sqlx::query_as::<_, ExpertRequestRow>(
            r#"
            UPDATE expert_requests
            SET status = 'rejected',
                rejection_reason = $2,
                reviewed_by = $3,
                reviewed_at = $4,
                updated_at = $4
            WHERE id = $1 AND status = 'pending'
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(reason)
        .bind(reviewer)
        .bind(at)
        .fetch_optional(pool)
        .await?;
        convert(row)
    }

    /// Replace the profile of a request currently in `expected`, returning it
    /// to pending with the review stamp cleared.
    pub async fn revise(
        id: ExpertRequestId,
        expected: ExpertRequestStatus,
        revision: &ExpertRequestRevision,
        at: DateTime<Utc>,
        pool: &PgPool,
    ) -> Result<Option<Self>> {
        let query = sqlx::query(
            r#"
            UPDATE expert_requests SET
                name = $3, designation = $4, affiliation = $5, phone = $6, email = $7,
                is_bahraini = $8, is_available = $9, rating = $10, role = $11,
                employment_type = $12, general_area = $13, specialized_areas = $14,
                is_trained = $15, is_published = $16, biography = $17,
                experience_entries = $18, education_entries = $19,
                cv_document = CASE WHEN $20 THEN $21 ELSE cv_document END,
                approval_document = CASE WHEN $22 THEN $23 ELSE approval_document END,
                status = 'pending',
                rejection_reason = NULL,
                reviewed_by = NULL,
                reviewed_at = NULL,
                updated_at = $24
            WHERE id = $1 AND status = $2
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(expected.to_string());

        let (set_cv, cv) = revision.cv_slot();
        let (set_approval, approval) = revision.approval_slot();

        let row = bind_profile(query, &revision.profile)
            .bind(set_cv)
            .bind(cv)
            .bind(set_approval)
            .bind(approval)
            .bind(at)
            .fetch_optional(pool)
            .await?;

        match row {
            Some(row) => Ok(Some(ExpertRequestRow::from_row(&row)?.try_into()?)),
            None => Ok(None),
        }
    }
}

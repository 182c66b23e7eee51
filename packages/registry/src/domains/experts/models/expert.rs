use anyhow::Result;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::postgres::PgArguments;
use sqlx::query::Query;
use sqlx::types::Json;
use sqlx::{FromRow, PgExecutor, PgPool, Postgres};

use super::changes::{MergeOutcome, ProposedChanges};
use crate::common::validation::Validator;
use crate::common::{AreaId, ExpertId, ExpertRequestId};
use crate::domains::documents::DocumentRef;

/// Accepted honorifics for an expert's designation.
pub const DESIGNATIONS: &[&str] = &["Prof.", "Dr.", "Mr.", "Ms.", "Mrs.", "Miss", "Eng."];

pub const MAX_RATING: i32 = 5;

/// What an expert can be engaged for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ExpertRole {
    #[serde(rename = "evaluator")]
    Evaluator,
    #[serde(rename = "validator")]
    Validator,
    #[serde(rename = "evaluator/validator")]
    EvaluatorValidator,
}

impl ExpertRole {
    pub const NAMES: &'static [&'static str] = &["evaluator", "validator", "evaluator/validator"];

    pub fn as_str(self) -> &'static str {
        match self {
            ExpertRole::Evaluator => "evaluator",
            ExpertRole::Validator => "validator",
            ExpertRole::EvaluatorValidator => "evaluator/validator",
        }
    }
}

impl std::fmt::Display for ExpertRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ExpertRole {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "evaluator" => Ok(ExpertRole::Evaluator),
            "validator" => Ok(ExpertRole::Validator),
            "evaluator/validator" => Ok(ExpertRole::EvaluatorValidator),
            _ => Err(anyhow::anyhow!("Invalid expert role: {}", s)),
        }
    }
}

/// Employment type enum
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmploymentType {
    Academic,
    Employer,
}

impl EmploymentType {
    pub const NAMES: &'static [&'static str] = &["academic", "employer"];

    pub fn as_str(self) -> &'static str {
        match self {
            EmploymentType::Academic => "academic",
            EmploymentType::Employer => "employer",
        }
    }
}

impl std::fmt::Display for EmploymentType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for EmploymentType {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "academic" => Ok(EmploymentType::Academic),
            "employer" => Ok(EmploymentType::Employer),
            _ => Err(anyhow::anyhow!("Invalid employment type: {}", s)),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExperienceEntry {
    pub organization: String,
    pub position: String,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub is_current: bool,
    pub country: String,
    pub description: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EducationEntry {
    pub institution: String,
    pub degree: String,
    pub field_of_study: String,
    pub graduation_year: Option<i32>,
    pub country: String,
    pub description: String,
}

/// Per-entry required fields, reported as `experienceEntries[i].field`.
pub fn validate_entries(
    experience: &[ExperienceEntry],
    education: &[EducationEntry],
    v: &mut Validator,
) {
    for (i, entry) in experience.iter().enumerate() {
        v.required(&format!("experienceEntries[{}].organization", i), &entry.organization)
            .required(&format!("experienceEntries[{}].position", i), &entry.position)
            .custom(
                &format!("experienceEntries[{}].startDate", i),
                entry.start_date.is_some(),
                "start date is required",
            );
        if let (Some(start), Some(end)) = (entry.start_date, entry.end_date) {
            v.custom(
                &format!("experienceEntries[{}].endDate", i),
                end >= start,
                "end date is before start date",
            );
        }
    }

    for (i, entry) in education.iter().enumerate() {
        v.required(&format!("educationEntries[{}].institution", i), &entry.institution)
            .required(&format!("educationEntries[{}].degree", i), &entry.degree)
            .custom(
                &format!("educationEntries[{}].graduationYear", i),
                entry.graduation_year.is_some(),
                "graduation year is required",
            );
    }
}

/// Public attributes shared by an expert and a request to create one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExpertProfile {
    pub name: String,
    pub designation: String,
    pub affiliation: String,
    pub phone: String,
    pub email: String,
    pub is_bahraini: bool,
    pub is_available: bool,
    pub rating: i32,
    pub role: ExpertRole,
    pub employment_type: EmploymentType,
    pub general_area: AreaId,
    pub specialized_areas: Vec<AreaId>,
    pub is_trained: bool,
    pub is_published: bool,
    pub biography: String,
    pub experience_entries: Vec<ExperienceEntry>,
    pub education_entries: Vec<EducationEntry>,
}

impl ExpertProfile {
    /// At least one way to reach the expert.
    pub fn has_contact(&self) -> bool {
        !self.phone.trim().is_empty() || !self.email.trim().is_empty()
    }

    pub fn has_entries(&self) -> bool {
        !self.experience_entries.is_empty() || !self.education_entries.is_empty()
    }

    /// Rules spanning several fields that every live expert keeps.
    pub fn check_complete(&self, v: &mut Validator) {
        v.custom("contact", self.has_contact(), "phone or email is required")
            .custom(
                "entries",
                self.has_entries(),
                "at least one experience or education entry is required",
            );
    }
}

/// Expert - the live registry record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Expert {
    pub id: ExpertId,
    #[serde(flatten)]
    pub profile: ExpertProfile,
    pub cv_document: Option<DocumentRef>,
    pub approval_document: Option<DocumentRef>,
    /// The new-expert request this record was materialized from
    pub original_request_id: Option<ExpertRequestId>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// =============================================================================
// Row mapping
// =============================================================================

/// Profile columns as stored; shared by `experts` and `expert_requests`.
#[derive(sqlx::FromRow)]
pub(crate) struct ProfileRow {
    name: String,
    designation: String,
    affiliation: String,
    phone: String,
    email: String,
    is_bahraini: bool,
    is_available: bool,
    rating: i32,
    role: String,
    employment_type: String,
    general_area: i64,
    specialized_areas: Vec<i64>,
    is_trained: bool,
    is_published: bool,
    biography: String,
    experience_entries: Json<Vec<ExperienceEntry>>,
    education_entries: Json<Vec<EducationEntry>>,
}

impl TryFrom<ProfileRow> for ExpertProfile {
    type Error = anyhow::Error;

    fn try_from(row: ProfileRow) -> Result<Self> {
        Ok(Self {
            name: row.name,
            designation: row.designation,
            affiliation: row.affiliation,
            phone: row.phone,
            email: row.email,
            is_bahraini: row.is_bahraini,
            is_available: row.is_available,
            rating: row.rating,
            role: row.role.parse()?,
            employment_type: row.employment_type.parse()?,
            general_area: row.general_area,
            specialized_areas: row.specialized_areas,
            is_trained: row.is_trained,
            is_published: row.is_published,
            biography: row.biography,
            experience_entries: row.experience_entries.0,
            education_entries: row.education_entries.0,
        })
    }
}

/// Bind the 17 profile columns, in `ProfileRow` order.
pub(crate) fn bind_profile<'q>(
    query: Query<'q, Postgres, PgArguments>,
    profile: &'q ExpertProfile,
) -> Query<'q, Postgres, PgArguments> {
    query
        .bind(&profile.name)
        .bind(&profile.designation)
        .bind(&profile.affiliation)
        .bind(&profile.phone)
        .bind(&profile.email)
        .bind(profile.is_bahraini)
        .bind(profile.is_available)
        .bind(profile.rating)
        .bind(profile.role.as_str())
        .bind(profile.employment_type.as_str())
        .bind(profile.general_area)
        .bind(&profile.specialized_areas)
        .bind(profile.is_trained)
        .bind(profile.is_published)
        .bind(&profile.biography)
        .bind(Json(&profile.experience_entries))
        .bind(Json(&profile.education_entries))
}

#[derive(sqlx::FromRow)]
struct ExpertRow {
    id: ExpertId,
    #[sqlx(flatten)]
    profile: ProfileRow,
    cv_document: Option<DocumentRef>,
    approval_document: Option<DocumentRef>,
    original_request_id: Option<ExpertRequestId>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<ExpertRow> for Expert {
    type Error = anyhow::Error;

    fn try_from(row: ExpertRow) -> Result<Self> {
        Ok(Self {
            id: row.id,
            profile: row.profile.try_into()?,
            cv_document: row.cv_document,
            approval_document: row.approval_document,
            original_request_id: row.original_request_id,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

// =============================================================================
// SQL Queries - ALL queries must be in models/
// =============================================================================

impl Expert {
    pub async fn find_by_id(id: ExpertId, pool: &PgPool) -> Result<Option<Self>> {
        let row = sqlx::query_as::<_, ExpertRow>("SELECT * FROM experts WHERE id = $1")
            .bind(id)
            .fetch_optional(pool)
            .await?;
        row.map(Expert::try_from).transpose()
    }

    /// Read and row-lock an expert inside a transaction.
    pub async fn find_for_update<'e>(
        id: ExpertId,
        executor: impl PgExecutor<'e>,
    ) -> Result<Option<Self>> {
        let row =
            sqlx::query_as::<_, ExpertRow>("SELECT * FROM experts WHERE id = $1 FOR UPDATE")
                .bind(id)
                .fetch_optional(executor)
                .await?;
        row.map(Expert::try_from).transpose()
    }

    /// Merge `changes` into the expert as it is under lock and write it back.
    ///
    /// `None` when the expert does not exist. An `Invalid` outcome writes
    /// nothing.
    pub async fn merge(
        id: ExpertId,
        changes: &ProposedChanges,
        at: DateTime<Utc>,
        pool: &PgPool,
    ) -> Result<Option<MergeOutcome>> {
        let mut tx = pool.begin().await?;

        let Some(current) = Expert::find_for_update(id, &mut *tx).await? else {
            tx.rollback().await?;
            return Ok(None);
        };

        let merge = match changes.merge_checked(&current, at) {
            Ok(merge) => merge,
            Err(errors) => {
                tx.rollback().await?;
                return Ok(Some(MergeOutcome::Invalid(errors)));
            }
        };

        if merge.after.update(&mut *tx).await?.is_none() {
            tx.rollback().await?;
            anyhow::bail!("Expert {} vanished under lock", id);
        }

        tx.commit().await?;
        Ok(Some(MergeOutcome::Merged(merge)))
    }

    pub async fn insert<'e>(&self, executor: impl PgExecutor<'e>) -> Result<()> {
        let query = sqlx::query(
            r#"
            INSERT INTO experts (
                id,
                name, designation, affiliation, phone, email,
                is_bahraini, is_available, rating, role, employment_type,
                general_area, specialized_areas, is_trained, is_published, biography,
                experience_entries, education_entries,
                cv_document, approval_document, original_request_id,
                created_at, updated_at
            )
            VALUES (
                $1,
                $2, $3, $4, $5, $6, $7, $8, $9, $10, $11,
                $12, $13, $14, $15, $16, $17, $18,
                $19, $20, $21, $22, $23
            )
            "#,
        )
        .bind(self.id);

        bind_profile(query, &self.profile)
            .bind(&self.cv_document)
            .bind(&self.approval_document)
            .bind(self.original_request_id)
            .bind(self.created_at)
            .bind(self.updated_at)
            .execute(executor)
            .await?;
        Ok(())
    }

    /// Overwrite every mutable column; `None` when the row does not exist.
    pub async fn update<'e>(&self, executor: impl PgExecutor<'e>) -> Result<Option<Self>> {
        let query = sqlx::query(
            r#"
            UPDATE experts SET
                name = $2, designation = $3, affiliation = $4, phone = $5, email = $6,
                is_bahraini = $7, is_available = $8, rating = $9, role = $10,
                employment_type = $11, general_area = $12, specialized_areas = $13,
                is_trained = $14, is_published = $15, biography = $16,
                experience_entries = $17, education_entries = $18,
                cv_document = $19, approval_document = $20,
                updated_at = $21
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(self.id);

        let row = bind_profile(query, &self.profile)
            .bind(&self.cv_document)
            .bind(&self.approval_document)
            .bind(self.updated_at)
            .fetch_optional(executor)
            .await?;

        match row {
            Some(row) => Ok(Some(ExpertRow::from_row(&row)?.try_into()?)),
            None => Ok(None),
        }
    }
}

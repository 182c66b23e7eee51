use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::expert::{
    validate_entries, EducationEntry, EmploymentType, ExperienceEntry, Expert, ExpertRole,
    DESIGNATIONS, MAX_RATING,
};
use crate::common::validation::{ValidationErrors, Validator};
use crate::common::AreaId;
use crate::domains::documents::{DocumentPatch, DocumentRef};

/// Names of the editable expert attributes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FieldName {
    Name,
    Designation,
    Affiliation,
    Phone,
    Email,
    IsBahraini,
    IsAvailable,
    Rating,
    Role,
    EmploymentType,
    GeneralArea,
    SpecializedAreas,
    IsTrained,
    IsPublished,
    Biography,
    ExperienceEntries,
    EducationEntries,
    CvDocument,
    ApprovalDocument,
}

impl FieldName {
    pub fn as_str(self) -> &'static str {
        match self {
            FieldName::Name => "name",
            FieldName::Designation => "designation",
            FieldName::Affiliation => "affiliation",
            FieldName::Phone => "phone",
            FieldName::Email => "email",
            FieldName::IsBahraini => "isBahraini",
            FieldName::IsAvailable => "isAvailable",
            FieldName::Rating => "rating",
            FieldName::Role => "role",
            FieldName::EmploymentType => "employmentType",
            FieldName::GeneralArea => "generalArea",
            FieldName::SpecializedAreas => "specializedAreas",
            FieldName::IsTrained => "isTrained",
            FieldName::IsPublished => "isPublished",
            FieldName::Biography => "biography",
            FieldName::ExperienceEntries => "experienceEntries",
            FieldName::EducationEntries => "educationEntries",
            FieldName::CvDocument => "cvDocument",
            FieldName::ApprovalDocument => "approvalDocument",
        }
    }
}

impl fmt::Display for FieldName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A sparse set of expert edits.
///
/// `None` means "keep the current value"; `Some` carries the requested
/// value, including empty strings, `false` and zero.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProposedChanges {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub designation: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub affiliation: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_bahraini: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_available: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rating: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<ExpertRole>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub employment_type: Option<EmploymentType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub general_area: Option<AreaId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub specialized_areas: Option<Vec<AreaId>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_trained: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_published: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub biography: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub experience_entries: Option<Vec<ExperienceEntry>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub education_entries: Option<Vec<EducationEntry>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cv_document: Option<DocumentPatch>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub approval_document: Option<DocumentPatch>,
}

impl ProposedChanges {
    /// Check every present value; absent fields are never validated.
    pub fn validate(&self) -> Result<(), ValidationErrors> {
        let mut v = Validator::new();

        if let Some(name) = &self.name {
            v.required("name", name);
        }
        if let Some(designation) = &self.designation {
            v.one_of("designation", designation, DESIGNATIONS);
        }
        if let Some(affiliation) = &self.affiliation {
            v.required("affiliation", affiliation);
        }
        if let Some(phone) = &self.phone {
            v.phone("phone", phone);
        }
        if let Some(email) = &self.email {
            v.email("email", email);
        }
        if let Some(rating) = self.rating {
            v.range("rating", rating.into(), 0, MAX_RATING.into());
        }
        if let Some(general_area) = self.general_area {
            v.custom("generalArea", general_area > 0, "general area is required");
        }
        if let Some(areas) = &self.specialized_areas {
            v.custom(
                "specializedAreas",
                areas.iter().all(|id| *id > 0),
                "area ids must be positive",
            );
        }
        if let Some(DocumentPatch::Replace(document)) = &self.cv_document {
            v.custom("cvDocument", !document.is_blank(), "document reference is empty");
        }
        if let Some(DocumentPatch::Replace(document)) = &self.approval_document {
            v.custom(
                "approvalDocument",
                !document.is_blank(),
                "document reference is empty",
            );
        }

        validate_entries(
            self.experience_entries.as_deref().unwrap_or_default(),
            self.education_entries.as_deref().unwrap_or_default(),
            &mut v,
        );

        v.finish()
    }

    /// Write every present value into `expert`. Absent fields are untouched.
    pub fn merge_into(&self, expert: &mut Expert) {
        let profile = &mut expert.profile;

        if let Some(v) = &self.name {
            profile.name = v.clone();
        }
        if let Some(v) = &self.designation {
            profile.designation = v.clone();
        }
        if let Some(v) = &self.affiliation {
            profile.affiliation = v.clone();
        }
        if let Some(v) = &self.phone {
            profile.phone = v.clone();
        }
        if let Some(v) = &self.email {
            profile.email = v.clone();
        }
        if let Some(v) = self.is_bahraini {
            profile.is_bahraini = v;
        }
        if let Some(v) = self.is_available {
            profile.is_available = v;
        }
        if let Some(v) = self.rating {
            profile.rating = v;
        }
        if let Some(v) = self.role {
            profile.role = v;
        }
        if let Some(v) = self.employment_type {
            profile.employment_type = v;
        }
        if let Some(v) = self.general_area {
            profile.general_area = v;
        }
        if let Some(v) = &self.specialized_areas {
            profile.specialized_areas = v.clone();
        }
        if let Some(v) = self.is_trained {
            profile.is_trained = v;
        }
        if let Some(v) = self.is_published {
            profile.is_published = v;
        }
        if let Some(v) = &self.biography {
            profile.biography = v.clone();
        }
        if let Some(v) = &self.experience_entries {
            profile.experience_entries = v.clone();
        }
        if let Some(v) = &self.education_entries {
            profile.education_entries = v.clone();
        }
        if let Some(patch) = &self.cv_document {
            expert.cv_document = patch.resulting_ref();
        }
        if let Some(patch) = &self.approval_document {
            expert.approval_document = patch.resulting_ref();
        }
    }

    /// The copy of `expert` these changes would produce.
    pub fn merged(&self, expert: &Expert) -> Expert {
        let mut merged = expert.clone();
        self.merge_into(&mut merged);
        merged
    }

    /// Merge into `current` and re-check the cross-field rules on the result.
    ///
    /// Stores call this on the row they hold locked, so the rules are
    /// checked against exactly what gets written.
    pub fn merge_checked(
        &self,
        current: &Expert,
        at: DateTime<Utc>,
    ) -> Result<MergedExpert, ValidationErrors> {
        let mut after = self.merged(current);
        after.updated_at = at;

        let mut v = Validator::new();
        after.profile.check_complete(&mut v);
        v.finish()?;

        Ok(MergedExpert {
            before: current.clone(),
            after,
        })
    }

    pub fn new_cv_document(&self) -> Option<&DocumentRef> {
        match &self.cv_document {
            Some(DocumentPatch::Replace(document)) => Some(document),
            _ => None,
        }
    }

    pub fn removes_cv(&self) -> bool {
        matches!(self.cv_document, Some(DocumentPatch::Remove))
    }

    pub fn new_approval_document(&self) -> Option<&DocumentRef> {
        match &self.approval_document {
            Some(DocumentPatch::Replace(document)) => Some(document),
            _ => None,
        }
    }

    pub fn removes_approval_document(&self) -> bool {
        matches!(self.approval_document, Some(DocumentPatch::Remove))
    }
}

/// An expert before and after a committed merge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergedExpert {
    pub before: Expert,
    pub after: Expert,
}

impl MergedExpert {
    /// Documents the old record referenced and the new one no longer does.
    pub fn superseded_documents(&self) -> Vec<DocumentRef> {
        let cv = superseded(&self.before.cv_document, &self.after.cv_document);
        let approval = superseded(&self.before.approval_document, &self.after.approval_document);
        cv.into_iter().chain(approval).collect()
    }
}

fn superseded(before: &Option<DocumentRef>, after: &Option<DocumentRef>) -> Option<DocumentRef> {
    match before {
        Some(old) if after.as_ref() != Some(old) => Some(old.clone()),
        _ => None,
    }
}

/// Result of merging changes into a locked expert row.
#[derive(Debug, Clone)]
pub enum MergeOutcome {
    Merged(MergedExpert),
    /// The merged record would break a cross-field rule; nothing was written
    Invalid(ValidationErrors),
}

//! Submission payload and its field rules

use serde::Deserialize;

use crate::common::validation::{ValidationErrors, Validator};
use crate::common::AreaId;
use crate::domains::documents::{DocumentPatch, DocumentRef};
use crate::domains::experts::models::{
    validate_entries, EducationEntry, EmploymentType, ExperienceEntry, ExpertProfile, ExpertRole,
    DESIGNATIONS, MAX_RATING,
};

/// Everything a caller sends to propose (or revise) a new expert.
///
/// `role` and `employment_type` arrive as free text and are checked here so
/// that a bad value shows up alongside every other violation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ExpertSubmission {
    pub name: String,
    pub designation: String,
    pub affiliation: String,
    pub phone: String,
    pub email: String,
    pub is_bahraini: bool,
    pub is_available: bool,
    pub rating: i32,
    pub role: String,
    pub employment_type: String,
    pub general_area: AreaId,
    pub specialized_areas: Vec<AreaId>,
    pub is_trained: bool,
    pub is_published: bool,
    pub biography: String,
    pub experience_entries: Vec<ExperienceEntry>,
    pub education_entries: Vec<EducationEntry>,
    pub cv_document: Option<DocumentRef>,
    pub approval_document: Option<DocumentRef>,
    /// On revision, drop the stored CV instead of keeping it
    pub remove_cv: bool,
    pub remove_approval_document: bool,
}

/// A submission that passed validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidSubmission {
    pub profile: ExpertProfile,
    pub cv_document: Option<DocumentRef>,
    pub approval_document: Option<DocumentRef>,
    pub remove_cv: bool,
    pub remove_approval_document: bool,
}

impl ValidSubmission {
    /// How a revision treats the CV slot; `None` keeps what is stored.
    pub fn cv_patch(&self) -> Option<DocumentPatch> {
        slot_patch(&self.cv_document, self.remove_cv)
    }

    pub fn approval_patch(&self) -> Option<DocumentPatch> {
        slot_patch(&self.approval_document, self.remove_approval_document)
    }
}

fn slot_patch(document: &Option<DocumentRef>, remove: bool) -> Option<DocumentPatch> {
    match document {
        Some(document) => Some(DocumentPatch::Replace(document.clone())),
        None if remove => Some(DocumentPatch::Remove),
        None => None,
    }
}

impl ExpertSubmission {
    /// Validate every field at once and build the profile.
    pub fn validate(self) -> Result<ValidSubmission, ValidationErrors> {
        let role = self.role.parse::<ExpertRole>().ok();
        let employment_type = self.employment_type.parse::<EmploymentType>().ok();

        let mut v = Validator::new();
        v.required("name", &self.name)
            .one_of("designation", &self.designation, DESIGNATIONS)
            .required("affiliation", &self.affiliation)
            .custom(
                "contact",
                !self.phone.trim().is_empty() || !self.email.trim().is_empty(),
                "phone or email is required",
            )
            .phone("phone", &self.phone)
            .email("email", &self.email)
            .one_of("role", &self.role, ExpertRole::NAMES)
            .one_of("employmentType", &self.employment_type, EmploymentType::NAMES)
            .custom("generalArea", self.general_area > 0, "general area is required")
            .custom(
                "specializedAreas",
                self.specialized_areas.iter().all(|id| *id > 0),
                "area ids must be positive",
            )
            .range("rating", self.rating.into(), 0, MAX_RATING.into())
            .custom(
                "entries",
                !self.experience_entries.is_empty() || !self.education_entries.is_empty(),
                "at least one experience or education entry is required",
            );
        validate_entries(&self.experience_entries, &self.education_entries, &mut v);

        let cv_document = DocumentRef::non_blank(self.cv_document.as_ref()).cloned();
        let approval_document = DocumentRef::non_blank(self.approval_document.as_ref()).cloned();
        v.custom(
            "cvDocument",
            !(self.remove_cv && cv_document.is_some()),
            "cannot both replace and remove the CV",
        )
        .custom(
            "approvalDocument",
            !(self.remove_approval_document && approval_document.is_some()),
            "cannot both replace and remove the approval document",
        );
        v.finish()?;

        let (Some(role), Some(employment_type)) = (role, employment_type) else {
            return Err(ValidationErrors::single("role", "invalid role"));
        };

        Ok(ValidSubmission {
            profile: ExpertProfile {
                name: self.name.trim().to_string(),
                designation: self.designation,
                affiliation: self.affiliation.trim().to_string(),
                phone: self.phone.trim().to_string(),
                email: self.email.trim().to_string(),
                is_bahraini: self.is_bahraini,
                is_available: self.is_available,
                rating: self.rating,
                role,
                employment_type,
                general_area: self.general_area,
                specialized_areas: self.specialized_areas,
                is_trained: self.is_trained,
                is_published: self.is_published,
                biography: self.biography,
                experience_entries: self.experience_entries,
                education_entries: self.education_entries,
            },
            cv_document,
            approval_document,
            remove_cv: self.remove_cv,
            remove_approval_document: self.remove_approval_document,
        })
    }
}

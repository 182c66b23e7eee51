//! Test fixtures for creating test data.

use chrono::{NaiveDate, Utc};

use registry_core::common::ExpertId;
use registry_core::domains::documents::DocumentRef;
use registry_core::domains::expert_requests::actions::ExpertSubmission;
use registry_core::domains::experts::models::{
    EducationEntry, EmploymentType, ExperienceEntry, Expert, ExpertProfile, ExpertRole,
};

use super::TestHarness;

/// A submission that passes every rule, with no documents attached.
pub fn valid_submission() -> ExpertSubmission {
    ExpertSubmission {
        name: "Jane Doe".to_string(),
        designation: "Dr.".to_string(),
        affiliation: "University of Bahrain".to_string(),
        phone: "+97317000000".to_string(),
        email: "jane.doe@example.com".to_string(),
        is_bahraini: true,
        is_available: true,
        rating: 4,
        role: "evaluator".to_string(),
        employment_type: "academic".to_string(),
        general_area: 7,
        specialized_areas: vec![12, 14],
        is_trained: true,
        is_published: false,
        biography: "Works on water desalination.".to_string(),
        experience_entries: vec![ExperienceEntry {
            organization: "University of Bahrain".to_string(),
            position: "Associate Professor".to_string(),
            start_date: NaiveDate::from_ymd_opt(2015, 9, 1),
            end_date: None,
            is_current: true,
            country: "Bahrain".to_string(),
            description: String::new(),
        }],
        education_entries: vec![EducationEntry {
            institution: "Imperial College London".to_string(),
            degree: "PhD".to_string(),
            field_of_study: "Chemical Engineering".to_string(),
            graduation_year: Some(2012),
            country: "United Kingdom".to_string(),
            description: String::new(),
        }],
        cv_document: None,
        approval_document: None,
        remove_cv: false,
        remove_approval_document: false,
    }
}

pub fn expert_profile() -> ExpertProfile {
    ExpertProfile {
        name: "Jane Doe".to_string(),
        designation: "Dr.".to_string(),
        affiliation: "University of Bahrain".to_string(),
        phone: "+97317000000".to_string(),
        email: "jane.doe@example.com".to_string(),
        is_bahraini: true,
        is_available: true,
        rating: 4,
        role: ExpertRole::Evaluator,
        employment_type: EmploymentType::Academic,
        general_area: 7,
        specialized_areas: vec![12, 14],
        is_trained: true,
        is_published: false,
        biography: "Works on water desalination.".to_string(),
        experience_entries: vec![],
        education_entries: vec![EducationEntry {
            institution: "Imperial College London".to_string(),
            degree: "PhD".to_string(),
            field_of_study: "Chemical Engineering".to_string(),
            graduation_year: Some(2012),
            country: "United Kingdom".to_string(),
            description: String::new(),
        }],
    }
}

/// Put a live expert with CV and approval documents into the store.
pub fn seed_expert(harness: &TestHarness) -> Expert {
    let now = Utc::now();
    let expert = Expert {
        id: ExpertId::new(),
        profile: expert_profile(),
        cv_document: Some(DocumentRef::new("cv/original.pdf")),
        approval_document: Some(DocumentRef::new("approval/original.pdf")),
        original_request_id: None,
        created_at: now,
        updated_at: now,
    };
    harness.store.insert_expert(expert.clone());
    expert
}

pub fn approval_doc() -> DocumentRef {
    DocumentRef::new("approval/board-minutes-2026-03.pdf")
}

pub mod changes;
pub mod expert;

pub use changes::{FieldName, MergeOutcome, MergedExpert, ProposedChanges};
pub use expert::{
    validate_entries, EducationEntry, EmploymentType, ExperienceEntry, Expert, ExpertProfile,
    ExpertRole, DESIGNATIONS, MAX_RATING,
};

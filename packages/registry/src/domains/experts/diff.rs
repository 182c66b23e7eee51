//! Field diff between a live expert and a sparse set of proposed changes.

use std::collections::BTreeSet;

use super::models::{Expert, FieldName, ProposedChanges};

/// Field names whose proposed value differs from `baseline`.
///
/// A field is in the result exactly when it is present in `proposed` and
/// its value is not equal to the baseline value. Pure and deterministic.
pub fn diff(baseline: &Expert, proposed: &ProposedChanges) -> BTreeSet<FieldName> {
    let current = &baseline.profile;
    let mut changed = BTreeSet::new();

    let mut check = |field: FieldName, differs: bool| {
        if differs {
            changed.insert(field);
        }
    };

    check(FieldName::Name, differs(proposed.name.as_deref(), current.name.as_str()));
    check(
        FieldName::Designation,
        differs(proposed.designation.as_deref(), current.designation.as_str()),
    );
    check(
        FieldName::Affiliation,
        differs(proposed.affiliation.as_deref(), current.affiliation.as_str()),
    );
    check(FieldName::Phone, differs(proposed.phone.as_deref(), current.phone.as_str()));
    check(FieldName::Email, differs(proposed.email.as_deref(), current.email.as_str()));
    check(
        FieldName::IsBahraini,
        differs(proposed.is_bahraini.as_ref(), &current.is_bahraini),
    );
    check(
        FieldName::IsAvailable,
        differs(proposed.is_available.as_ref(), &current.is_available),
    );
    check(FieldName::Rating, differs(proposed.rating.as_ref(), &current.rating));
    check(FieldName::Role, differs(proposed.role.as_ref(), &current.role));
    check(
        FieldName::EmploymentType,
        differs(proposed.employment_type.as_ref(), &current.employment_type),
    );
    check(
        FieldName::GeneralArea,
        differs(proposed.general_area.as_ref(), &current.general_area),
    );
    check(
        FieldName::SpecializedAreas,
        differs(
            proposed.specialized_areas.as_deref(),
            current.specialized_areas.as_slice(),
        ),
    );
    check(
        FieldName::IsTrained,
        differs(proposed.is_trained.as_ref(), &current.is_trained),
    );
    check(
        FieldName::IsPublished,
        differs(proposed.is_published.as_ref(), &current.is_published),
    );
    check(
        FieldName::Biography,
        differs(proposed.biography.as_deref(), current.biography.as_str()),
    );
    check(
        FieldName::ExperienceEntries,
        differs(
            proposed.experience_entries.as_deref(),
            current.experience_entries.as_slice(),
        ),
    );
    check(
        FieldName::EducationEntries,
        differs(
            proposed.education_entries.as_deref(),
            current.education_entries.as_slice(),
        ),
    );
    check(
        FieldName::CvDocument,
        proposed
            .cv_document
            .as_ref()
            .is_some_and(|patch| patch.differs_from(baseline.cv_document.as_ref())),
    );
    check(
        FieldName::ApprovalDocument,
        proposed
            .approval_document
            .as_ref()
            .is_some_and(|patch| patch.differs_from(baseline.approval_document.as_ref())),
    );

    changed
}

fn differs<T: PartialEq + ?Sized>(proposed: Option<&T>, current: &T) -> bool {
    proposed.is_some_and(|value| value != current)
}

//! Shared checks for proposing and revising an edit

use serde::Deserialize;
use std::collections::BTreeSet;

use crate::common::validation::{ValidationErrors, Validator};
use crate::domains::expert_edit_requests::models::EditRevision;
use crate::domains::experts::diff;
use crate::domains::experts::models::{Expert, FieldName, ProposedChanges};

/// What a caller sends to propose or revise an edit.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct EditProposal {
    pub changes: ProposedChanges,
    pub change_reason: String,
    /// Generated from the changed fields when blank
    pub change_summary: Option<String>,
}

impl EditProposal {
    /// Validate against the expert as it stands and compute the change set.
    ///
    /// A proposal that changes nothing is invalid.
    pub(super) fn prepare(self, expert: &Expert) -> Result<EditRevision, ValidationErrors> {
        let mut v = Validator::new();
        v.required("changeReason", &self.change_reason);
        if let Err(errors) = self.changes.validate() {
            v.merge(errors);
        }

        let fields_changed = diff(expert, &self.changes);
        v.custom(
            "changes",
            !fields_changed.is_empty(),
            "no field differs from the current expert",
        );
        self.changes.merged(expert).profile.check_complete(&mut v);
        v.finish()?;

        let change_summary = match self.change_summary {
            Some(summary) if !summary.trim().is_empty() => summary.trim().to_string(),
            _ => summarize(&fields_changed),
        };

        Ok(EditRevision {
            changes: self.changes,
            fields_changed,
            change_summary,
            change_reason: self.change_reason.trim().to_string(),
        })
    }
}

/// "Updated name, phone" style summary of a change set.
pub fn summarize(fields: &BTreeSet<FieldName>) -> String {
    let names: Vec<&str> = fields.iter().map(|field| field.as_str()).collect();
    format!("Updated {}", names.join(", "))
}

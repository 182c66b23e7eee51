//! Direct admin update of a live expert

use chrono::Utc;
use tracing::{info, warn};

use crate::common::auth::{Identity, Role};
use crate::common::{ExpertId, RegistryError, RegistryResult};
use crate::domains::documents::actions::discard_documents;
use crate::domains::experts::diff;
use crate::domains::experts::models::{Expert, MergeOutcome, ProposedChanges};
use crate::kernel::ServerDeps;

/// Merge the present fields of `changes` into the expert, bypassing the
/// edit request workflow. Admin-or-higher only.
///
/// The merged record must still carry contact details and at least one
/// experience or education entry.
pub async fn update_expert(
    identity: &Identity,
    expert_id: ExpertId,
    changes: ProposedChanges,
    deps: &ServerDeps,
) -> RegistryResult<Expert> {
    identity.require(Role::Admin).inspect_err(|_| {
        warn!(caller = %identity.subject, expert_id = %expert_id, "Expert update denied");
    })?;

    changes.validate()?;

    let current = deps
        .store
        .find_expert(expert_id)
        .await?
        .ok_or_else(|| RegistryError::not_found("expert"))?;
    let fields = diff(&current, &changes);

    let merge = match deps
        .store
        .merge_expert(expert_id, &changes, Utc::now())
        .await?
    {
        Some(MergeOutcome::Merged(merge)) => merge,
        Some(MergeOutcome::Invalid(errors)) => {
            warn!(expert_id = %expert_id, errors = %errors, "Update would leave expert incomplete");
            return Err(errors.into());
        }
        None => return Err(RegistryError::not_found("expert")),
    };

    discard_documents(&merge.superseded_documents(), deps).await;

    info!(
        expert_id = %expert_id,
        updated_by = %identity.subject,
        fields = ?fields,
        "Expert updated"
    );
    Ok(merge.after)
}

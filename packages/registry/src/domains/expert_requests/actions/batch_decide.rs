use tracing::info;

use super::decide::{decide, Decision};
use crate::common::auth::{Identity, Role};
use crate::common::{ExpertId, ExpertRequestId, RegistryError, RegistryResult};
use crate::common::validation::ValidationErrors;
use crate::domains::documents::DocumentRef;
use crate::kernel::ServerDeps;

/// Result for one id of a batch approval.
#[derive(Debug)]
pub enum Outcome {
    Approved {
        request_id: ExpertRequestId,
        expert_id: ExpertId,
    },
    Failed {
        request_id: ExpertRequestId,
        failure: RegistryError,
    },
}

impl Outcome {
    pub fn request_id(&self) -> ExpertRequestId {
        match self {
            Outcome::Approved { request_id, .. } | Outcome::Failed { request_id, .. } => {
                *request_id
            }
        }
    }
}

/// Per-id outcomes, in the order the ids were given.
#[derive(Debug, Default)]
pub struct BatchOutcome {
    pub outcomes: Vec<Outcome>,
}

impl BatchOutcome {
    pub fn approved_ids(&self) -> Vec<ExpertRequestId> {
        self.outcomes
            .iter()
            .filter_map(|outcome| match outcome {
                Outcome::Approved { request_id, .. } => Some(*request_id),
                Outcome::Failed { .. } => None,
            })
            .collect()
    }

    pub fn errors(&self) -> Vec<(ExpertRequestId, &RegistryError)> {
        self.outcomes
            .iter()
            .filter_map(|outcome| match outcome {
                Outcome::Failed {
                    request_id,
                    failure,
                } => Some((*request_id, failure)),
                Outcome::Approved { .. } => None,
            })
            .collect()
    }

    /// At least one request was approved.
    pub fn is_success(&self) -> bool {
        self.outcomes
            .iter()
            .any(|outcome| matches!(outcome, Outcome::Approved { .. }))
    }
}

/// Approve many pending requests against one shared approval document.
///
/// Each id is decided independently; a failure is recorded and the rest
/// carry on. Earlier approvals are never rolled back.
pub async fn batch_decide(
    identity: &Identity,
    request_ids: &[ExpertRequestId],
    approval_document: DocumentRef,
    deps: &ServerDeps,
) -> RegistryResult<BatchOutcome> {
    identity.require(Role::Admin)?;

    let mut errors = ValidationErrors::new();
    if request_ids.is_empty() {
        errors.add("requestIds", "at least one request id is required");
    }
    if approval_document.is_blank() {
        errors.add("approvalDocument", "approval document required");
    }
    errors.into_result()?;

    let mut batch = BatchOutcome::default();
    for &request_id in request_ids {
        let decision = Decision::Approve {
            approval_document: Some(approval_document.clone()),
        };
        let outcome = match decide(identity, request_id, decision, deps).await {
            Ok(request) => match request.expert_id {
                Some(expert_id) => Outcome::Approved {
                    request_id,
                    expert_id,
                },
                None => Outcome::Failed {
                    request_id,
                    failure: RegistryError::Internal(anyhow::anyhow!(
                        "approved request {} has no expert",
                        request_id
                    )),
                },
            },
            Err(failure) => Outcome::Failed {
                request_id,
                failure,
            },
        };
        batch.outcomes.push(outcome);
    }

    info!(
        reviewer = %identity.subject,
        approved = batch.approved_ids().len(),
        failed = batch.errors().len(),
        "Batch approval finished"
    );
    Ok(batch)
}

use tracing::info;

use super::ExpertSubmission;
use crate::common::auth::Identity;
use crate::common::RegistryResult;
use crate::domains::expert_requests::models::ExpertRequest;
use crate::kernel::ServerDeps;

/// Create a pending request to add an expert. Any authenticated caller.
pub async fn submit(
    identity: &Identity,
    submission: ExpertSubmission,
    deps: &ServerDeps,
) -> RegistryResult<ExpertRequest> {
    let valid = submission.validate()?;

    let request = ExpertRequest::new(
        valid.profile,
        valid.cv_document,
        valid.approval_document,
        identity.subject,
    );
    deps.store.insert_expert_request(&request).await?;

    info!(
        request_id = %request.id,
        created_by = %identity.subject,
        "Expert request submitted"
    );
    Ok(request)
}

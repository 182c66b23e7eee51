//! Expert edit request actions - the edit state machine
//!
//! Conditional store mutations report `None` when their precondition did
//! not hold; `missed_transition` re-reads to pick NotFound or Conflict.

mod apply;
mod cancel;
mod decide;
mod proposal;
mod propose;
mod queries;
mod revise;

pub use apply::{apply, AppliedEdit};
pub use cancel::cancel;
pub use decide::{decide, EditDecision};
pub use proposal::{summarize, EditProposal};
pub use propose::propose;
pub use queries::{get_edit_request, list_edit_requests, EditRequestQuery};
pub use revise::revise;

use crate::common::{ExpertEditRequestId, RegistryError, RegistryResult};
use crate::kernel::ServerDeps;

async fn missed_transition(
    request_id: ExpertEditRequestId,
    deps: &ServerDeps,
) -> RegistryResult<RegistryError> {
    Ok(match deps.store.find_edit_request(request_id).await? {
        None => RegistryError::not_found("edit request"),
        Some(current) => RegistryError::conflict(format!("edit request is {}", current.status)),
    })
}

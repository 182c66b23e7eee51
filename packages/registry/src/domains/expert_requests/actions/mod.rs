//! Expert request actions - the new-expert state machine
//!
//! Every action takes the caller's verified `Identity` explicitly. Status
//! changes go through the store's conditional mutations; when one reports
//! no row, the request is re-read to tell a missing id from a lost race.

mod batch_decide;
mod decide;
mod queries;
mod revise;
mod submit;
mod validation;

pub use batch_decide::{batch_decide, BatchOutcome, Outcome};
pub use decide::{decide, Decision};
pub use queries::{get_expert_request, list_expert_requests, ExpertRequestQuery};
pub use revise::revise;
pub use submit::submit;
pub use validation::{ExpertSubmission, ValidSubmission};

use crate::common::{ExpertRequestId, RegistryError, RegistryResult};
use crate::kernel::ServerDeps;

/// Classify a conditional mutation that matched no row.
async fn missed_transition(
    request_id: ExpertRequestId,
    deps: &ServerDeps,
) -> RegistryResult<RegistryError> {
    Ok(match deps.store.find_expert_request(request_id).await? {
        None => RegistryError::not_found("expert request"),
        Some(current) => {
            RegistryError::conflict(format!("expert request is {}", current.status))
        }
    })
}

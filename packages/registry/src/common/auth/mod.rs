/// Authorization primitives for the expert registry
///
/// The gate resolves a bearer credential into an `Identity`; actions then
/// re-check what they need on that identity:
///
/// ```rust,ignore
/// use crate::common::auth::Role;
///
/// // In an edge:
/// let identity = deps.gate().require_role(bearer, Role::Admin)?;
///
/// // In an action:
/// identity.require(Role::Admin)?;
/// ```
///
/// `Role::satisfies` is the only role comparison; nothing compares role
/// names or ranks directly.
mod capability;
mod errors;
mod gate;
mod identity;
mod role;

pub use capability::Capability;
pub use errors::AuthError;
pub use gate::AuthorizationGate;
pub use identity::Identity;
pub use role::Role;

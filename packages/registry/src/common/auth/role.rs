use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::Capability;

/// Platform roles.
///
/// Serialized with the names used in tokens and the `users` table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    #[serde(rename = "user")]
    Regular,
    #[serde(rename = "admin")]
    Admin,
    #[serde(rename = "super_user")]
    ElevatedAdmin,
}

const REGULAR: &[Capability] = &[Capability::SubmitRequests];

const ADMIN: &[Capability] = &[
    Capability::SubmitRequests,
    Capability::ReviewRequests,
    Capability::ApplyEdits,
    Capability::ManageExperts,
    Capability::ManageUsers,
];

const ELEVATED_ADMIN: &[Capability] = &[
    Capability::SubmitRequests,
    Capability::ReviewRequests,
    Capability::ApplyEdits,
    Capability::ManageExperts,
    Capability::ManageUsers,
    Capability::ManageAdmins,
];

impl Role {
    pub fn capabilities(self) -> &'static [Capability] {
        match self {
            Role::Regular => REGULAR,
            Role::Admin => ADMIN,
            Role::ElevatedAdmin => ELEVATED_ADMIN,
        }
    }

    pub fn has(self, capability: Capability) -> bool {
        self.capabilities().contains(&capability)
    }

    /// True when this role holds every capability of `required`.
    ///
    /// This is the only role comparison in the crate; call sites never
    /// compare roles for equality.
    pub fn satisfies(self, required: Role) -> bool {
        required
            .capabilities()
            .iter()
            .all(|capability| self.has(*capability))
    }

    /// Whether a holder of this role may create or manage accounts with `target`.
    pub fn can_manage(self, target: Role) -> bool {
        match target {
            Role::Regular => self.has(Capability::ManageUsers),
            Role::Admin => self.has(Capability::ManageAdmins),
            Role::ElevatedAdmin => false,
        }
    }

    pub fn is_privileged(self) -> bool {
        self.satisfies(Role::Admin)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Role::Regular => "user",
            Role::Admin => "admin",
            Role::ElevatedAdmin => "super_user",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> anyhow::Result<Self> {
        match s {
            "user" => Ok(Role::Regular),
            "admin" => Ok(Role::Admin),
            "super_user" => Ok(Role::ElevatedAdmin),
            _ => Err(anyhow::anyhow!("Invalid role: {}", s)),
        }
    }
}

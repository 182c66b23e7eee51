/// Things an identity can be allowed to do.
///
/// Roles are defined as sets of these rather than as ranks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Capability {
    /// Submit new-expert and edit requests, act on one's own requests
    SubmitRequests,

    /// Approve or reject pending requests
    ReviewRequests,

    /// Merge approved edit requests into live expert records
    ApplyEdits,

    /// Update expert records directly
    ManageExperts,

    /// Create and manage regular user accounts
    ManageUsers,

    /// Create and manage admin accounts
    ManageAdmins,
}

//! Typed ID definitions for every persisted entity.

pub use super::id::Id;

// ============================================================================
// Entity marker types
// ============================================================================

/// Marker type for platform users (the people who log in).
pub struct User;

/// Marker type for live expert records.
pub struct Expert;

/// Marker type for proposals to add a new expert.
pub struct ExpertRequest;

/// Marker type for proposals to edit an existing expert.
pub struct ExpertEditRequest;

/// Marker type for stored documents (CVs, approval letters, ...).
pub struct Document;

// ============================================================================
// Type aliases - the primary API
// ============================================================================

pub type UserId = Id<User>;

pub type ExpertId = Id<Expert>;

pub type ExpertRequestId = Id<ExpertRequest>;

pub type ExpertEditRequestId = Id<ExpertEditRequest>;

pub type DocumentId = Id<Document>;

/// Identifier of an area in the external expertise taxonomy.
pub type AreaId = i64;

//! Typed ID aliases for the entities this subsystem touches.
//!
//! One marker type per table keeps IDs from different tables incompatible at
//! compile time. New entities get their marker here, next to the others.

pub use super::id::Id;

// ============================================================================
// Entity marker types
// ============================================================================

/// Marker type for Student entities.
pub struct Student;

/// Marker type for Program entities (reference data).
pub struct Program;

/// Marker type for Cohort entities (reference data).
pub struct Cohort;

/// Marker type for Area entities (organizational sign-off units).
pub struct Area;

/// Marker type for Petition entities (career-change requests).
pub struct Petition;

/// Marker type for Signature entities (per-area decisions on a petition).
pub struct Signature;

/// Marker type for Document entities (student files on record).
pub struct Document;

/// Marker type for Notification entities.
pub struct Notification;

/// Marker type for staff users (advisors, area signers).
pub struct StaffUser;

// ============================================================================
// Type aliases - the primary API
// ============================================================================

/// Typed ID for Student entities.
pub type StudentId = Id<Student>;

/// Typed ID for Program entities.
pub type ProgramId = Id<Program>;

/// Typed ID for Cohort entities.
pub type CohortId = Id<Cohort>;

/// Typed ID for Area entities.
pub type AreaId = Id<Area>;

/// Typed ID for Petition entities.
pub type PetitionId = Id<Petition>;

/// Typed ID for Signature entities.
pub type SignatureId = Id<Signature>;

/// Typed ID for Document entities.
pub type DocumentId = Id<Document>;

/// Typed ID for Notification entities.
pub type NotificationId = Id<Notification>;

/// Typed ID for staff users (advisors and area signers).
pub type UserId = Id<StaffUser>;

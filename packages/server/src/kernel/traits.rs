// Trait definitions for dependency injection
//
// These are INFRASTRUCTURE traits only - no business logic. Workflow logic
// (eligibility, resolution, the intake guards) lives in domain functions that
// use these traits.
//
// Naming convention: Base* for trait names (e.g., BaseRecordStore)

use anyhow::Result;
use async_trait::async_trait;

use crate::common::{
    CohortId, DocumentId, PetitionId, ProgramId, SignatureId, StudentId, UserId,
};
use crate::domains::notifications::models::NotificationKind;
use crate::domains::petitions::models::{
    NewPetition, Petition, PetitionStatus, Signature, SignatureStatus,
};
use crate::domains::students::models::{Area, Cohort, Document, Program, Student};

// =============================================================================
// Relational Store Trait (Infrastructure - conditional/transactional writes)
// =============================================================================

/// A petition together with its per-area signature fan-out.
#[derive(Debug, Clone)]
pub struct PetitionBundle {
    pub petition: Petition,
    pub signatures: Vec<Signature>,
}

/// Outcome of the atomic petition + signatures insert.
///
/// `DuplicateOf` is returned when the pending-duplicate constraint fires at
/// insert time, closing the check-then-insert race window: of two concurrent
/// creations for the same (student, target program, target cohort), exactly
/// one observes `Created`.
#[derive(Debug, Clone)]
pub enum PetitionInsert {
    Created(PetitionBundle),
    DuplicateOf(PetitionId),
}

#[async_trait]
pub trait BaseRecordStore: Send + Sync {
    // --- reference reads -----------------------------------------------

    async fn find_student(&self, id: StudentId) -> Result<Option<Student>>;

    async fn find_program(&self, id: ProgramId) -> Result<Option<Program>>;

    async fn find_cohort(&self, id: CohortId) -> Result<Option<Cohort>>;

    /// Areas configured as required signers; defines the signature fan-out.
    async fn required_areas(&self) -> Result<Vec<Area>>;

    async fn documents_for_student(&self, student_id: StudentId) -> Result<Vec<Document>>;

    // --- petition reads --------------------------------------------------

    async fn find_petition(&self, id: PetitionId) -> Result<Option<Petition>>;

    async fn find_signature(&self, id: SignatureId) -> Result<Option<Signature>>;

    async fn signatures_for_petition(&self, petition_id: PetitionId) -> Result<Vec<Signature>>;

    /// Non-terminal petitions for a student (eligibility blocking procedures).
    async fn pending_petitions_for_student(&self, student_id: StudentId)
        -> Result<Vec<Petition>>;

    /// Pending petition matching the exact (student, target program, target
    /// cohort) duplicate key, if any.
    async fn find_pending_duplicate(
        &self,
        student_id: StudentId,
        new_program_id: ProgramId,
        new_cohort_id: CohortId,
    ) -> Result<Option<Petition>>;

    // --- guarded writes ----------------------------------------------------

    /// Atomically insert a pending petition plus one pending signature per
    /// area in `areas`. Either everything exists afterwards or nothing does.
    async fn create_petition_with_signatures(
        &self,
        new: NewPetition,
        areas: &[Area],
    ) -> Result<PetitionInsert>;

    /// Compare-and-swap a decision onto a signature that is still pending.
    /// `None` means the row was not pending at write time.
    async fn sign_if_pending(
        &self,
        id: SignatureId,
        decision: SignatureStatus,
        signer_id: UserId,
        comments: Option<String>,
    ) -> Result<Option<Signature>>;

    /// Conditionally transition a pending petition to a terminal status.
    /// `None` means the petition was already terminal; the caller that gets
    /// `Some` is the single winner allowed to run resolution side effects.
    async fn resolve_if_pending(
        &self,
        id: PetitionId,
        terminal: PetitionStatus,
        resolved_by: UserId,
    ) -> Result<Option<Petition>>;

    // --- executor writes ----------------------------------------------------

    async fn update_student_placement(
        &self,
        id: StudentId,
        program_id: ProgramId,
        cohort_id: CohortId,
        group_name: &str,
    ) -> Result<Student>;

    /// Point a document row at its relocated object key.
    async fn set_document_storage_key(&self, id: DocumentId, storage_key: &str) -> Result<()>;
}

// =============================================================================
// Object Store Trait (Infrastructure - student document bucket)
// =============================================================================

#[async_trait]
pub trait BaseObjectStore: Send + Sync {
    /// All object keys under a prefix.
    async fn list(&self, prefix: &str) -> Result<Vec<String>>;

    /// Copy one object to a new key, leaving the source in place.
    async fn copy(&self, src_key: &str, dst_key: &str) -> Result<()>;

    /// Delete one object. Deleting an absent key is not an error.
    async fn delete(&self, key: &str) -> Result<()>;

    /// Ensure an empty "folder" exists at the prefix (placeholder object).
    async fn put_placeholder(&self, prefix: &str) -> Result<()>;
}

// =============================================================================
// Notification Sink Trait (Infrastructure - fire-and-forget)
// =============================================================================

#[async_trait]
pub trait BaseNotificationSink: Send + Sync {
    /// Raise a structured notification to a recipient. Delivery mechanics
    /// (inbox row, push, email) are the implementation's concern.
    async fn notify(
        &self,
        recipient_id: UserId,
        kind: NotificationKind,
        title: &str,
        message: &str,
        metadata: serde_json::Value,
    ) -> Result<()>;
}

// =============================================================================
// Credential Verifier Trait (Infrastructure - step-up gate)
// =============================================================================

#[async_trait]
pub trait BaseCredentialVerifier: Send + Sync {
    /// Re-verify a signer's credential before recording a decision.
    ///
    /// This is deliberately distinct from session identity: signing requires
    /// the signer to present their credential again.
    async fn verify(&self, signer_id: UserId, presented_credential: &str) -> Result<bool>;
}

//! Duplicate guard: at most one pending petition per (student, target
//! program, target cohort).
//!
//! The predicate is intentionally narrow - an exact three-key match against
//! pending petitions only - so legitimately different requests for the same
//! student are never blocked. Broader "similar petition" heuristics are not
//! part of the contract.

use crate::common::{CohortId, ProgramId, StudentId};
use crate::domains::petitions::errors::PetitionError;
use crate::domains::petitions::models::Petition;
use crate::kernel::ServerDeps;

/// The pending petition that would be duplicated, if any.
pub async fn find_duplicate(
    student_id: StudentId,
    new_program_id: ProgramId,
    new_cohort_id: CohortId,
    deps: &ServerDeps,
) -> Result<Option<Petition>, PetitionError> {
    deps.store
        .find_pending_duplicate(student_id, new_program_id, new_cohort_id)
        .await
        .map_err(Into::into)
}

//! Eligibility check: may this student have a petition opened at all?
//!
//! Advisory-enforced: evaluated once at intake time, not re-checked while the
//! petition is in flight.

use std::collections::HashSet;

use crate::common::StudentId;
use crate::domains::petitions::errors::PetitionError;
use crate::domains::students::models::DocumentType;
use crate::kernel::ServerDeps;

/// What stands between a student and a new petition.
#[derive(Debug, Clone, Default)]
pub struct EligibilityReport {
    /// Required document types with no file on record.
    pub missing_documents: Vec<DocumentType>,
    /// Human-readable descriptions of other blocking procedures.
    pub blocking_procedures: Vec<String>,
}

impl EligibilityReport {
    pub fn blocked(&self) -> bool {
        !self.missing_documents.is_empty() || !self.blocking_procedures.is_empty()
    }
}

/// Compare the fixed required-document set against what is on file, and flag
/// any other non-terminal petition as a blocking procedure.
pub async fn check_eligibility(
    student_id: StudentId,
    deps: &ServerDeps,
) -> Result<EligibilityReport, PetitionError> {
    let on_file: HashSet<DocumentType> = deps
        .store
        .documents_for_student(student_id)
        .await?
        .into_iter()
        .map(|d| d.doc_type)
        .collect();

    let missing_documents: Vec<DocumentType> = DocumentType::REQUIRED
        .iter()
        .copied()
        .filter(|required| !on_file.contains(required))
        .collect();

    let blocking_procedures: Vec<String> = deps
        .store
        .pending_petitions_for_student(student_id)
        .await?
        .iter()
        .map(|p| format!("pending career-change petition {}", p.id))
        .collect();

    Ok(EligibilityReport {
        missing_documents,
        blocking_procedures,
    })
}

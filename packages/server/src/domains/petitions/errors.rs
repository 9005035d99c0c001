use thiserror::Error;

use crate::common::{PetitionId, UserId};
use crate::domains::students::models::DocumentType;

/// Errors surfaced by the petition workflow.
///
/// Everything here is a structured result for the caller; nothing is retried
/// internally. Per-object storage migration failures are deliberately NOT in
/// this taxonomy - they are logged and summarized in the resolution report
/// because the approval is already durable when migration starts.
#[derive(Error, Debug)]
pub enum PetitionError {
    /// Malformed request: empty reason, no-op target, nonexistent reference.
    #[error("Validation failed: {0}")]
    Validation(String),

    /// The student has unresolved obligations blocking a new petition.
    #[error("Student is not eligible: missing documents [{}], blocking procedures [{}]",
        format_documents(.missing_documents), .blocking_procedures.join(", "))]
    EligibilityBlocked {
        missing_documents: Vec<DocumentType>,
        blocking_procedures: Vec<String>,
    },

    /// A pending petition for the same student and target already exists.
    #[error("A pending petition for this student and target already exists: {existing}")]
    DuplicatePetition { existing: PetitionId },

    /// The signature or petition was not in the expected state when acted
    /// upon. Non-retryable: a blind retry risks double-processing.
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Step-up credential re-verification failed for the signer.
    #[error("Credential re-verification failed for signer {0}")]
    Credential(UserId),

    /// The signer's area scope does not cover the signature's area.
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Underlying store failure.
    #[error(transparent)]
    Store(#[from] anyhow::Error),
}

fn format_documents(docs: &[DocumentType]) -> String {
    docs.iter()
        .map(|d| d.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn eligibility_error_lists_the_gaps() {
        let err = PetitionError::EligibilityBlocked {
            missing_documents: vec![DocumentType::PriorTranscript],
            blocking_procedures: vec!["pending petition".to_string()],
        };
        let rendered = err.to_string();
        assert!(rendered.contains("prior_transcript"));
        assert!(rendered.contains("pending petition"));
    }

    #[test]
    fn duplicate_error_names_the_existing_petition() {
        let existing = PetitionId::new();
        let err = PetitionError::DuplicatePetition { existing };
        assert!(err.to_string().contains(&existing.to_string()));
    }
}

//! Petition workflow entry points
//!
//! Called directly by the surrounding application. Actions do the work
//! synchronously and return values; they are self-contained and validate
//! everything they touch.
//!
//! Flow:
//! - `create_petition`: guards (references, duplicate, eligibility), then the
//!   atomic petition + signature fan-out insert.
//! - `sign_petition`: step-up credential gate, compare-and-swap decision,
//!   aggregate recompute, and - for the single caller that wins the terminal
//!   transition - the resolution side effects.

use tracing::info;
use typed_builder::TypedBuilder;

use crate::common::{CohortId, ProgramId, SignatureId, Signer, StudentId, UserId};
use crate::domains::petitions::effects::{
    check_eligibility, duplicates, resolution, EligibilityReport, ResolutionReport,
};
use crate::domains::petitions::errors::PetitionError;
use crate::domains::petitions::models::{
    NewPetition, Petition, PetitionStatus, Signature, SignatureStatus,
};
use crate::kernel::{PetitionBundle, PetitionInsert, ServerDeps};

// ============================================================================
// Entry Point: Create Petition
// ============================================================================

/// Intake request for a career-change petition.
#[derive(Debug, Clone, TypedBuilder)]
pub struct CreatePetitionRequest {
    pub student_id: StudentId,
    pub advisor_id: UserId,
    pub current_program_id: ProgramId,
    pub new_program_id: ProgramId,
    pub current_cohort_id: CohortId,
    pub new_cohort_id: CohortId,
    #[builder(setter(into))]
    pub current_group: String,
    #[builder(setter(into))]
    pub new_group: String,
    #[builder(setter(into))]
    pub reason: String,
}

/// Create a petition and its per-area signature fan-out.
///
/// Preconditions are checked fail-fast, first failure wins: non-empty reason,
/// no-op target, reference existence, duplicate guard, eligibility. The
/// insert itself is atomic and re-enforces the duplicate invariant, so two
/// concurrent calls for the same target cannot both succeed.
pub async fn create_petition(
    request: CreatePetitionRequest,
    deps: &ServerDeps,
) -> Result<PetitionBundle, PetitionError> {
    if request.reason.trim().is_empty() {
        return Err(PetitionError::Validation(
            "a petition requires a non-empty reason".to_string(),
        ));
    }

    if request.current_program_id == request.new_program_id
        && request.current_cohort_id == request.new_cohort_id
    {
        return Err(PetitionError::Validation(
            "target program/cohort must differ from the current ones".to_string(),
        ));
    }

    let student = deps
        .store
        .find_student(request.student_id)
        .await?
        .ok_or_else(|| {
            PetitionError::Validation(format!("student not found: {}", request.student_id))
        })?;

    if deps
        .store
        .find_program(request.new_program_id)
        .await?
        .is_none()
    {
        return Err(PetitionError::Validation(format!(
            "target program not found: {}",
            request.new_program_id
        )));
    }

    if deps
        .store
        .find_cohort(request.new_cohort_id)
        .await?
        .is_none()
    {
        return Err(PetitionError::Validation(format!(
            "target cohort not found: {}",
            request.new_cohort_id
        )));
    }

    if let Some(existing) = duplicates::find_duplicate(
        request.student_id,
        request.new_program_id,
        request.new_cohort_id,
        deps,
    )
    .await?
    {
        return Err(PetitionError::DuplicatePetition {
            existing: existing.id,
        });
    }

    let report: EligibilityReport = check_eligibility(request.student_id, deps).await?;
    if report.blocked() {
        // A petition that raced in between the two guards surfaces as the
        // duplicate it is, not as a generic blocking procedure.
        if let Some(existing) = duplicates::find_duplicate(
            request.student_id,
            request.new_program_id,
            request.new_cohort_id,
            deps,
        )
        .await?
        {
            return Err(PetitionError::DuplicatePetition {
                existing: existing.id,
            });
        }
        return Err(PetitionError::EligibilityBlocked {
            missing_documents: report.missing_documents,
            blocking_procedures: report.blocking_procedures,
        });
    }

    let areas = deps.store.required_areas().await?;

    let new = NewPetition {
        student_id: request.student_id,
        advisor_id: request.advisor_id,
        current_program_id: request.current_program_id,
        new_program_id: request.new_program_id,
        current_cohort_id: request.current_cohort_id,
        new_cohort_id: request.new_cohort_id,
        current_group: request.current_group,
        new_group: request.new_group,
        reason: request.reason,
    };

    match deps.store.create_petition_with_signatures(new, &areas).await? {
        PetitionInsert::Created(bundle) => {
            info!(
                petition_id = %bundle.petition.id,
                student_id = %student.id,
                signatures = bundle.signatures.len(),
                "Petition created"
            );
            Ok(bundle)
        }
        // A concurrent creation won the insert race.
        PetitionInsert::DuplicateOf(existing) => {
            Err(PetitionError::DuplicatePetition { existing })
        }
    }
}

// ============================================================================
// Entry Point: Sign Petition
// ============================================================================

/// A signer's verdict on their area's signature.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Approve,
    Reject,
}

impl Decision {
    fn as_signature_status(self) -> SignatureStatus {
        match self {
            Decision::Approve => SignatureStatus::Approved,
            Decision::Reject => SignatureStatus::Rejected,
        }
    }
}

/// A signature decision submission.
#[derive(Debug, Clone, TypedBuilder)]
pub struct SignatureDecisionRequest {
    pub signature_id: SignatureId,
    pub signer: Signer,
    /// Step-up credential, re-verified before anything is written.
    #[builder(setter(into))]
    pub credential: String,
    pub decision: Decision,
    #[builder(default, setter(strip_option, into))]
    pub comments: Option<String>,
}

/// What a signature decision did.
#[derive(Debug, Clone)]
pub struct SignatureOutcome {
    pub signature: Signature,
    /// Petition state after the decision (refreshed if another caller
    /// resolved it concurrently).
    pub petition: Petition,
    /// Present only when this call won an approval's terminal transition and
    /// ran the migration executor.
    pub resolution: Option<ResolutionReport>,
}

/// Record one area's decision and resolve the petition if it went terminal.
pub async fn sign_petition(
    request: SignatureDecisionRequest,
    deps: &ServerDeps,
) -> Result<SignatureOutcome, PetitionError> {
    let existing = deps
        .store
        .find_signature(request.signature_id)
        .await?
        .ok_or_else(|| {
            PetitionError::Validation(format!("signature not found: {}", request.signature_id))
        })?;

    if !request.signer.may_sign_for(existing.area_id) {
        return Err(PetitionError::Forbidden(format!(
            "signer {} may not act for area {}",
            request.signer.user_id, existing.area_id
        )));
    }

    let verified = deps
        .credential_verifier
        .verify(request.signer.user_id, &request.credential)
        .await?;
    if !verified {
        return Err(PetitionError::Credential(request.signer.user_id));
    }

    // CAS write: the row must still be pending at write time. Losing here is
    // a non-retryable conflict (idempotency/replay guard).
    let signature = deps
        .store
        .sign_if_pending(
            request.signature_id,
            request.decision.as_signature_status(),
            request.signer.user_id,
            request.comments,
        )
        .await?
        .ok_or_else(|| {
            PetitionError::Conflict(format!(
                "signature {} has already been decided",
                request.signature_id
            ))
        })?;

    info!(
        signature_id = %signature.id,
        petition_id = %signature.petition_id,
        decision = ?request.decision,
        "Signature recorded"
    );

    let petition = deps
        .store
        .find_petition(signature.petition_id)
        .await?
        .ok_or_else(|| anyhow::anyhow!("petition not found: {}", signature.petition_id))?;

    let signatures = deps
        .store
        .signatures_for_petition(petition.id)
        .await?;

    let aggregate = resolution::aggregate_status(&signatures);
    if !aggregate.is_terminal() {
        return Ok(SignatureOutcome {
            signature,
            petition,
            resolution: None,
        });
    }

    // Conditional terminal transition: of all callers observing the terminal
    // aggregate, exactly one gets the resolved row back and runs the
    // executor. The rest see an already-terminal petition (no-op).
    let resolved = deps
        .store
        .resolve_if_pending(petition.id, aggregate, request.signer.user_id)
        .await?;

    let Some(resolved) = resolved else {
        let refreshed = deps
            .store
            .find_petition(petition.id)
            .await?
            .unwrap_or(petition);
        return Ok(SignatureOutcome {
            signature,
            petition: refreshed,
            resolution: None,
        });
    };

    info!(
        petition_id = %resolved.id,
        status = ?resolved.status,
        "Petition resolved"
    );

    let resolution_report = match resolved.status {
        PetitionStatus::Approved => Some(resolution::execute_approval(&resolved, deps).await?),
        PetitionStatus::Rejected => {
            // Sibling signatures stay pending for audit; the petition itself
            // is terminal immediately.
            resolution::execute_rejection(&resolved, &signatures, deps).await?;
            None
        }
        PetitionStatus::Pending => None,
    };

    Ok(SignatureOutcome {
        signature,
        petition: resolved,
        resolution: resolution_report,
    })
}

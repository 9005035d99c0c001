//! Resolution: aggregate state recomputation and the terminal side effects.
//!
//! The aggregate function is pure and recomputes from the full signature set,
//! never incrementally. The executor runs exactly once, synchronously, in the
//! caller that won the petition's conditional terminal transition. Object
//! migration is best-effort per object: a failure is logged and recorded in
//! the report, never rolled back - the approval is already durable.

use std::future::Future;
use std::time::Duration;

use anyhow::Result;
use serde_json::json;
use tracing::{info, warn};

use crate::domains::notifications::models::NotificationKind;
use crate::domains::petitions::errors::PetitionError;
use crate::domains::petitions::models::{Petition, PetitionStatus, Signature, SignatureStatus};
use crate::domains::students::models::Student;
use crate::kernel::ServerDeps;

// =============================================================================
// Aggregate state
// =============================================================================

/// Recompute a petition's aggregate status from its full signature set.
///
/// Rejected wins over everything; approved requires every signature approved.
/// An empty set stays pending (the fan-out has not happened, so there is no
/// decision to aggregate).
pub fn aggregate_status(signatures: &[Signature]) -> PetitionStatus {
    if signatures
        .iter()
        .any(|s| s.status == SignatureStatus::Rejected)
    {
        return PetitionStatus::Rejected;
    }
    if !signatures.is_empty()
        && signatures
            .iter()
            .all(|s| s.status == SignatureStatus::Approved)
    {
        return PetitionStatus::Approved;
    }
    PetitionStatus::Pending
}

// =============================================================================
// Storage paths
// =============================================================================

/// Slug one path segment: lower-cased, whitespace collapsed to underscores.
fn slug(segment: &str) -> String {
    segment
        .to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("_")
}

/// Deterministic storage prefix for a student's documents:
/// `program/cohort/group/student`, each segment slugged.
pub fn storage_prefix(program: &str, cohort: &str, group: &str, student: &str) -> String {
    [program, cohort, group, student]
        .iter()
        .map(|segment| slug(segment))
        .collect::<Vec<_>>()
        .join("/")
}

// =============================================================================
// Executor
// =============================================================================

/// What the approval executor did. Partial failures are reported here, not
/// raised: the migration must be reconciled out of band.
#[derive(Debug, Clone, Default)]
pub struct ResolutionReport {
    /// Object keys copied and deleted successfully.
    pub migrated: Vec<String>,
    /// Source keys whose copy or delete failed.
    pub failed: Vec<String>,
}

impl ResolutionReport {
    pub fn fully_migrated(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Run the approval side effects for a petition that just went terminal.
///
/// Safe to re-run after a partial failure: the source prefix is re-listed and
/// an already-empty source means there is nothing left to move.
pub async fn execute_approval(
    petition: &Petition,
    deps: &ServerDeps,
) -> Result<ResolutionReport, PetitionError> {
    let student = deps
        .store
        .find_student(petition.student_id)
        .await?
        .ok_or_else(|| anyhow::anyhow!("student not found: {}", petition.student_id))?;

    let (src_prefix, dst_prefix) = petition_prefixes(petition, &student, deps).await?;

    info!(
        petition_id = %petition.id,
        student_id = %student.id,
        src = %src_prefix,
        dst = %dst_prefix,
        "Executing approval side effects"
    );

    let report = migrate_objects(&src_prefix, &dst_prefix, deps).await?;

    relocate_document_rows(&student, &src_prefix, &dst_prefix, &report, deps).await?;

    // The student moves even when some objects failed to migrate: the
    // approval is durable and the leftovers are reconciled out of band.
    deps.store
        .update_student_placement(
            student.id,
            petition.new_program_id,
            petition.new_cohort_id,
            &petition.new_group,
        )
        .await?;

    if !report.fully_migrated() {
        warn!(
            petition_id = %petition.id,
            failed = report.failed.len(),
            "Document migration completed with failures"
        );
    }

    deps.notifier
        .notify(
            petition.advisor_id,
            NotificationKind::PetitionApproved,
            "Career-change petition approved",
            &format!(
                "The petition for {} was approved by all required areas.",
                student.full_name
            ),
            json!({
                "petition_id": petition.id,
                "student_id": student.id,
                "new_program_id": petition.new_program_id,
                "new_cohort_id": petition.new_cohort_id,
                "new_group": petition.new_group,
                "migration_failures": report.failed,
            }),
        )
        .await?;

    Ok(report)
}

/// Run the rejection side effects: a notification carrying the rejecting
/// signers' comments. No data migration occurs.
pub async fn execute_rejection(
    petition: &Petition,
    signatures: &[Signature],
    deps: &ServerDeps,
) -> Result<(), PetitionError> {
    let comments: Vec<String> = signatures
        .iter()
        .filter(|s| s.status == SignatureStatus::Rejected)
        .filter_map(|s| s.comments.clone())
        .collect();

    let message = if comments.is_empty() {
        "The career-change petition was rejected.".to_string()
    } else {
        format!(
            "The career-change petition was rejected: {}",
            comments.join("; ")
        )
    };

    deps.notifier
        .notify(
            petition.advisor_id,
            NotificationKind::PetitionRejected,
            "Career-change petition rejected",
            &message,
            json!({
                "petition_id": petition.id,
                "student_id": petition.student_id,
                "comments": comments,
            }),
        )
        .await?;

    Ok(())
}

/// Source and destination prefixes for a petition's document migration.
async fn petition_prefixes(
    petition: &Petition,
    student: &Student,
    deps: &ServerDeps,
) -> Result<(String, String), PetitionError> {
    let current_program = deps
        .store
        .find_program(petition.current_program_id)
        .await?
        .ok_or_else(|| anyhow::anyhow!("program not found: {}", petition.current_program_id))?;
    let new_program = deps
        .store
        .find_program(petition.new_program_id)
        .await?
        .ok_or_else(|| anyhow::anyhow!("program not found: {}", petition.new_program_id))?;
    let current_cohort = deps
        .store
        .find_cohort(petition.current_cohort_id)
        .await?
        .ok_or_else(|| anyhow::anyhow!("cohort not found: {}", petition.current_cohort_id))?;
    let new_cohort = deps
        .store
        .find_cohort(petition.new_cohort_id)
        .await?
        .ok_or_else(|| anyhow::anyhow!("cohort not found: {}", petition.new_cohort_id))?;

    let src = storage_prefix(
        &current_program.name,
        &current_cohort.name,
        &petition.current_group,
        &student.enrollment_code,
    );
    let dst = storage_prefix(
        &new_program.name,
        &new_cohort.name,
        &petition.new_group,
        &student.enrollment_code,
    );
    Ok((src, dst))
}

/// Copy-then-delete every object under `src_prefix` to the corresponding key
/// under `dst_prefix`. Per-object failures are recorded and skipped; folder
/// placeholders are not copied but recreated at the destination.
async fn migrate_objects(
    src_prefix: &str,
    dst_prefix: &str,
    deps: &ServerDeps,
) -> Result<ResolutionReport, PetitionError> {
    let timeout = deps.object_op_timeout;
    let store = deps.object_store.clone();

    // List on the slash boundary: a sibling whose prefix merely
    // string-extends this one (STU-0042 vs STU-00421) must not be swept in.
    let src_root = format!("{src_prefix}/");
    let keys = with_timeout_retry(timeout, "list", || {
        let store = store.clone();
        let prefix = src_root.clone();
        async move { store.list(&prefix).await }
    })
    .await
    .map_err(PetitionError::Store)?;

    let mut report = ResolutionReport::default();

    for src_key in keys {
        let suffix = src_key.strip_prefix(&src_root).unwrap_or(&src_key);

        // Folder placeholders are recreated below, not copied.
        if suffix == ".keep" {
            let _ = with_timeout_retry(timeout, "delete", || {
                let store = store.clone();
                let key = src_key.clone();
                async move { store.delete(&key).await }
            })
            .await;
            continue;
        }

        let dst_key = format!("{dst_prefix}/{suffix}");

        let copied = with_timeout_retry(timeout, "copy", || {
            let store = store.clone();
            let src = src_key.clone();
            let dst = dst_key.clone();
            async move { store.copy(&src, &dst).await }
        })
        .await;

        if let Err(err) = copied {
            warn!(key = %src_key, error = %err, "Failed to copy object, continuing");
            report.failed.push(src_key);
            continue;
        }

        let deleted = with_timeout_retry(timeout, "delete", || {
            let store = store.clone();
            let key = src_key.clone();
            async move { store.delete(&key).await }
        })
        .await;

        if let Err(err) = deleted {
            // The copy landed; the stale source is an out-of-band cleanup,
            // not a migration failure.
            warn!(key = %src_key, error = %err, "Failed to delete migrated source object");
        }

        report.migrated.push(src_key);
    }

    with_timeout_retry(timeout, "put_placeholder", || {
        let store = store.clone();
        let prefix = dst_prefix.to_string();
        async move { store.put_placeholder(&prefix).await }
    })
    .await
    .map_err(PetitionError::Store)?;

    Ok(report)
}

/// Rewrite `documents.storage_key` for rows whose object actually moved.
async fn relocate_document_rows(
    student: &Student,
    src_prefix: &str,
    dst_prefix: &str,
    report: &ResolutionReport,
    deps: &ServerDeps,
) -> Result<(), PetitionError> {
    // Same slash-boundary rule as the object listing.
    let src_root = format!("{src_prefix}/");
    let documents = deps.store.documents_for_student(student.id).await?;
    for document in documents {
        if report.failed.contains(&document.storage_key) {
            continue;
        }
        if let Some(suffix) = document.storage_key.strip_prefix(&src_root) {
            let new_key = format!("{dst_prefix}/{suffix}");
            deps.store
                .set_document_storage_key(document.id, &new_key)
                .await?;
        }
    }
    Ok(())
}

/// One bounded attempt plus one retry for transient failures.
async fn with_timeout_retry<T, F, Fut>(timeout: Duration, label: &str, op: F) -> Result<T>
where
    F: Fn() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let first_err = match tokio::time::timeout(timeout, op()).await {
        Ok(Ok(value)) => return Ok(value),
        Ok(Err(err)) => err,
        Err(_) => anyhow::anyhow!("object store {label} timed out"),
    };

    warn!(op = label, error = %first_err, "Object store call failed, retrying once");

    match tokio::time::timeout(timeout, op()).await {
        Ok(result) => result,
        Err(_) => Err(anyhow::anyhow!("object store {label} timed out on retry")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::{AreaId, PetitionId, SignatureId, UserId};

    fn signature(status: SignatureStatus) -> Signature {
        Signature {
            id: SignatureId::new(),
            petition_id: PetitionId::new(),
            area_id: AreaId::new(),
            signer_id: Some(UserId::new()),
            status,
            signed_at: None,
            comments: None,
        }
    }

    #[test]
    fn all_approved_resolves_to_approved() {
        let sigs = vec![
            signature(SignatureStatus::Approved),
            signature(SignatureStatus::Approved),
        ];
        assert_eq!(aggregate_status(&sigs), PetitionStatus::Approved);
    }

    #[test]
    fn any_rejection_wins() {
        let sigs = vec![
            signature(SignatureStatus::Approved),
            signature(SignatureStatus::Rejected),
            signature(SignatureStatus::Pending),
        ];
        assert_eq!(aggregate_status(&sigs), PetitionStatus::Rejected);
    }

    #[test]
    fn outstanding_signatures_stay_pending() {
        let sigs = vec![
            signature(SignatureStatus::Approved),
            signature(SignatureStatus::Pending),
        ];
        assert_eq!(aggregate_status(&sigs), PetitionStatus::Pending);
    }

    #[test]
    fn empty_fanout_is_pending() {
        assert_eq!(aggregate_status(&[]), PetitionStatus::Pending);
    }

    #[test]
    fn prefix_is_slugged_and_joined() {
        let prefix = storage_prefix("Data Engineering", "Cohort 2026 A", "Group 1", "STU-0042");
        assert_eq!(prefix, "data_engineering/cohort_2026_a/group_1/stu-0042");
    }

    #[test]
    fn prefix_is_deterministic() {
        let a = storage_prefix("Math", "2026", "B", "X-1");
        let b = storage_prefix("Math", "2026", "B", "X-1");
        assert_eq!(a, b);
    }
}

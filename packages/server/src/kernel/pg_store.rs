//! Postgres implementations of the infrastructure traits.
//!
//! `PgStore` delegates to the SQL kept in the domain `models/` modules; the
//! only logic here is the transactional fan-out insert and the mapping of the
//! pending-duplicate unique violation to a typed outcome.

use anyhow::Result;
use async_trait::async_trait;
use sqlx::PgPool;
use tracing::warn;

use crate::common::{
    CohortId, DocumentId, PetitionId, ProgramId, SignatureId, StudentId, UserId,
};
use crate::domains::notifications::models::{NewNotification, Notification, NotificationKind};
use crate::domains::petitions::models::{
    NewPetition, Petition, PetitionStatus, Signature, SignatureStatus,
};
use crate::domains::students::models::{Area, Cohort, Document, Program, Student};
use crate::kernel::traits::{
    BaseNotificationSink, BaseRecordStore, PetitionBundle, PetitionInsert,
};

/// Apply pending schema migrations.
pub async fn run_migrations(pool: &PgPool) -> Result<()> {
    sqlx::migrate!("./migrations").run(pool).await?;
    Ok(())
}

/// Postgres-backed record store.
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl BaseRecordStore for PgStore {
    async fn find_student(&self, id: StudentId) -> Result<Option<Student>> {
        Student::find_by_id(id, &self.pool).await
    }

    async fn find_program(&self, id: ProgramId) -> Result<Option<Program>> {
        Program::find_by_id(id, &self.pool).await
    }

    async fn find_cohort(&self, id: CohortId) -> Result<Option<Cohort>> {
        Cohort::find_by_id(id, &self.pool).await
    }

    async fn required_areas(&self) -> Result<Vec<Area>> {
        Area::find_required(&self.pool).await
    }

    async fn documents_for_student(&self, student_id: StudentId) -> Result<Vec<Document>> {
        Document::find_by_student(student_id, &self.pool).await
    }

    async fn find_petition(&self, id: PetitionId) -> Result<Option<Petition>> {
        Petition::find_by_id(id, &self.pool).await
    }

    async fn find_signature(&self, id: SignatureId) -> Result<Option<Signature>> {
        Signature::find_by_id(id, &self.pool).await
    }

    async fn signatures_for_petition(&self, petition_id: PetitionId) -> Result<Vec<Signature>> {
        Signature::find_by_petition(petition_id, &self.pool).await
    }

    async fn pending_petitions_for_student(
        &self,
        student_id: StudentId,
    ) -> Result<Vec<Petition>> {
        Petition::find_pending_by_student(student_id, &self.pool).await
    }

    async fn find_pending_duplicate(
        &self,
        student_id: StudentId,
        new_program_id: ProgramId,
        new_cohort_id: CohortId,
    ) -> Result<Option<Petition>> {
        Petition::find_pending_duplicate(student_id, new_program_id, new_cohort_id, &self.pool)
            .await
    }

    async fn create_petition_with_signatures(
        &self,
        new: NewPetition,
        areas: &[Area],
    ) -> Result<PetitionInsert> {
        let student_id = new.student_id;
        let new_program_id = new.new_program_id;
        let new_cohort_id = new.new_cohort_id;

        let mut tx = self.pool.begin().await?;

        let petition = match Petition::insert(&new, &mut *tx).await {
            Ok(petition) => petition,
            Err(err) => {
                // The partial unique index on pending (student, target
                // program, target cohort) fires when a concurrent creation
                // won the race. Report the surviving petition instead.
                let unique_violation = err
                    .downcast_ref::<sqlx::Error>()
                    .and_then(|e| e.as_database_error())
                    .map(|db| db.is_unique_violation())
                    .unwrap_or(false);
                if unique_violation {
                    tx.rollback().await?;
                    let existing = Petition::find_pending_duplicate(
                        student_id,
                        new_program_id,
                        new_cohort_id,
                        &self.pool,
                    )
                    .await?;
                    if let Some(existing) = existing {
                        return Ok(PetitionInsert::DuplicateOf(existing.id));
                    }
                }
                return Err(err);
            }
        };

        let mut signatures = Vec::with_capacity(areas.len());
        for area in areas {
            signatures.push(Signature::insert_pending(petition.id, area.id, &mut *tx).await?);
        }

        tx.commit().await?;

        Ok(PetitionInsert::Created(PetitionBundle {
            petition,
            signatures,
        }))
    }

    async fn sign_if_pending(
        &self,
        id: SignatureId,
        decision: SignatureStatus,
        signer_id: UserId,
        comments: Option<String>,
    ) -> Result<Option<Signature>> {
        Signature::sign_if_pending(id, decision, signer_id, comments.as_deref(), &self.pool).await
    }

    async fn resolve_if_pending(
        &self,
        id: PetitionId,
        terminal: PetitionStatus,
        resolved_by: UserId,
    ) -> Result<Option<Petition>> {
        Petition::resolve_if_pending(id, terminal, resolved_by, &self.pool).await
    }

    async fn update_student_placement(
        &self,
        id: StudentId,
        program_id: ProgramId,
        cohort_id: CohortId,
        group_name: &str,
    ) -> Result<Student> {
        Student::update_placement(id, program_id, cohort_id, group_name, &self.pool).await
    }

    async fn set_document_storage_key(&self, id: DocumentId, storage_key: &str) -> Result<()> {
        Document::set_storage_key(id, storage_key, &self.pool).await
    }
}

/// Notification sink that persists inbox rows.
///
/// Push delivery happens downstream in the surrounding application; from the
/// workflow's perspective a committed row is a raised notification.
pub struct PgNotificationSink {
    pool: PgPool,
}

impl PgNotificationSink {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl BaseNotificationSink for PgNotificationSink {
    async fn notify(
        &self,
        recipient_id: UserId,
        kind: NotificationKind,
        title: &str,
        message: &str,
        metadata: serde_json::Value,
    ) -> Result<()> {
        let new = NewNotification {
            recipient_id,
            kind,
            title: title.to_string(),
            message: message.to_string(),
            metadata,
        };
        if let Err(err) = Notification::insert(&new, &self.pool).await {
            // Fire-and-forget contract: a lost notification must not fail the
            // workflow that raised it.
            warn!(recipient_id = %recipient_id, error = %err, "Failed to persist notification");
        }
        Ok(())
    }
}

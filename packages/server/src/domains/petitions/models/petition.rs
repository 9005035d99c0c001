use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{PgExecutor, PgPool};

use crate::common::{CohortId, PetitionId, ProgramId, StudentId, UserId};

/// Petition lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "petition_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum PetitionStatus {
    Pending,
    Approved,
    Rejected,
}

impl PetitionStatus {
    /// Terminal states admit no further transitions.
    pub fn is_terminal(&self) -> bool {
        matches!(self, PetitionStatus::Approved | PetitionStatus::Rejected)
    }
}

/// Career-change petition row.
///
/// Created once by intake with status `pending`; the only later mutation is
/// the resolver's single `pending -> approved/rejected` transition, which also
/// stamps `resolved_at` and `resolved_by`.
#[derive(sqlx::FromRow, Debug, Clone, Serialize, Deserialize)]
pub struct Petition {
    pub id: PetitionId,
    pub student_id: StudentId,
    pub advisor_id: UserId,
    pub current_program_id: ProgramId,
    pub new_program_id: ProgramId,
    pub current_cohort_id: CohortId,
    pub new_cohort_id: CohortId,
    pub current_group: String,
    pub new_group: String,
    pub reason: String,
    pub status: PetitionStatus,
    pub created_at: DateTime<Utc>,
    pub resolved_at: Option<DateTime<Utc>>,
    pub resolved_by: Option<UserId>,
}

/// Values for a petition about to be inserted by intake.
#[derive(Debug, Clone)]
pub struct NewPetition {
    pub student_id: StudentId,
    pub advisor_id: UserId,
    pub current_program_id: ProgramId,
    pub new_program_id: ProgramId,
    pub current_cohort_id: CohortId,
    pub new_cohort_id: CohortId,
    pub current_group: String,
    pub new_group: String,
    pub reason: String,
}

impl Petition {
    /// Insert a new pending petition.
    ///
    /// Takes a generic executor so the caller can run it inside the same
    /// transaction as the signature fan-out. The partial unique index on
    /// `(student_id, new_program_id, new_cohort_id) WHERE status = 'pending'`
    /// makes a concurrent duplicate insert fail instead of double-creating.
    /// The id is generated here (v7) so primary keys sort chronologically.
    pub async fn insert<'e, E: PgExecutor<'e>>(new: &NewPetition, executor: E) -> Result<Self> {
        sqlx::query_as::<_, Self>(
            "INSERT INTO petitions (
                id,
                student_id,
                advisor_id,
                current_program_id,
                new_program_id,
                current_cohort_id,
                new_cohort_id,
                current_group,
                new_group,
                reason,
                status
             )
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, 'pending')
             RETURNING *",
        )
        .bind(PetitionId::new())
        .bind(new.student_id)
        .bind(new.advisor_id)
        .bind(new.current_program_id)
        .bind(new.new_program_id)
        .bind(new.current_cohort_id)
        .bind(new.new_cohort_id)
        .bind(&new.current_group)
        .bind(&new.new_group)
        .bind(&new.reason)
        .fetch_one(executor)
        .await
        .map_err(Into::into)
    }

    /// Find petition by ID
    pub async fn find_by_id(id: PetitionId, pool: &PgPool) -> Result<Option<Self>> {
        sqlx::query_as::<_, Self>("SELECT * FROM petitions WHERE id = $1")
            .bind(id)
            .fetch_optional(pool)
            .await
            .map_err(Into::into)
    }

    /// The still-pending petition matching the exact duplicate key, if any.
    pub async fn find_pending_duplicate(
        student_id: StudentId,
        new_program_id: ProgramId,
        new_cohort_id: CohortId,
        pool: &PgPool,
    ) -> Result<Option<Self>> {
        sqlx::query_as::<_, Self>(
            "SELECT * FROM petitions
             WHERE student_id = $1
               AND new_program_id = $2
               AND new_cohort_id = $3
               AND status = 'pending'",
        )
        .bind(student_id)
        .bind(new_program_id)
        .bind(new_cohort_id)
        .fetch_optional(pool)
        .await
        .map_err(Into::into)
    }

    /// All non-terminal petitions for a student (blocking procedures).
    pub async fn find_pending_by_student(
        student_id: StudentId,
        pool: &PgPool,
    ) -> Result<Vec<Self>> {
        sqlx::query_as::<_, Self>(
            "SELECT * FROM petitions
             WHERE student_id = $1 AND status = 'pending'
             ORDER BY created_at",
        )
        .bind(student_id)
        .fetch_all(pool)
        .await
        .map_err(Into::into)
    }

    /// Conditionally transition a pending petition to a terminal status.
    ///
    /// Returns `None` when the petition is no longer pending, so two signers
    /// whose decisions both complete the terminal condition cannot both win:
    /// the `WHERE status = 'pending'` guard admits exactly one writer.
    pub async fn resolve_if_pending(
        id: PetitionId,
        terminal: PetitionStatus,
        resolved_by: UserId,
        pool: &PgPool,
    ) -> Result<Option<Self>> {
        sqlx::query_as::<_, Self>(
            "UPDATE petitions
             SET status = $2, resolved_at = now(), resolved_by = $3
             WHERE id = $1 AND status = 'pending'
             RETURNING *",
        )
        .bind(id)
        .bind(terminal)
        .bind(resolved_by)
        .fetch_optional(pool)
        .await
        .map_err(Into::into)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn terminal_statuses() {
        assert!(!PetitionStatus::Pending.is_terminal());
        assert!(PetitionStatus::Approved.is_terminal());
        assert!(PetitionStatus::Rejected.is_terminal());
    }
}

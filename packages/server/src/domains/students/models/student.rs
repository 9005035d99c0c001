use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;

use crate::common::{CohortId, ProgramId, StudentId, UserId};

/// Enrollment status of a student.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "student_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum StudentStatus {
    Pending,
    Active,
    Suspended,
    Graduated,
}

/// Student row - SQL persistence layer.
///
/// Placement fields (`program_id`, `cohort_id`, `group_name`) are only mutated
/// by the petition resolution executor; everything else is owned by the
/// surrounding CRM.
#[derive(sqlx::FromRow, Debug, Clone, Serialize, Deserialize)]
pub struct Student {
    pub id: StudentId,
    pub full_name: String,
    pub enrollment_code: String,
    pub program_id: ProgramId,
    pub cohort_id: CohortId,
    pub group_name: String,
    pub status: StudentStatus,
    pub advisor_id: UserId,
    pub created_at: DateTime<Utc>,
}

impl Student {
    /// Find student by ID
    pub async fn find_by_id(id: StudentId, pool: &PgPool) -> Result<Option<Self>> {
        sqlx::query_as::<_, Self>("SELECT * FROM students WHERE id = $1")
            .bind(id)
            .fetch_optional(pool)
            .await
            .map_err(Into::into)
    }

    /// Move the student to a new program/cohort/group.
    ///
    /// Called by the resolution executor after an approved petition; the
    /// petition itself is already terminal by the time this runs.
    pub async fn update_placement(
        id: StudentId,
        program_id: ProgramId,
        cohort_id: CohortId,
        group_name: &str,
        pool: &PgPool,
    ) -> Result<Self> {
        sqlx::query_as::<_, Self>(
            "UPDATE students
             SET program_id = $2, cohort_id = $3, group_name = $4
             WHERE id = $1
             RETURNING *",
        )
        .bind(id)
        .bind(program_id)
        .bind(cohort_id)
        .bind(group_name)
        .fetch_one(pool)
        .await
        .map_err(Into::into)
    }
}

use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{PgExecutor, PgPool};

use crate::common::{AreaId, PetitionId, SignatureId, UserId};

/// Per-area decision status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "signature_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum SignatureStatus {
    Pending,
    Approved,
    Rejected,
}

/// One required area's decision on a petition.
///
/// Rows are created `pending` atomically with their petition, one per required
/// area. A row transitions `pending -> approved/rejected` exactly once; a row
/// that is not pending is immutable (audit trail).
#[derive(sqlx::FromRow, Debug, Clone, Serialize, Deserialize)]
pub struct Signature {
    pub id: SignatureId,
    pub petition_id: PetitionId,
    pub area_id: AreaId,
    pub signer_id: Option<UserId>,
    pub status: SignatureStatus,
    pub signed_at: Option<DateTime<Utc>>,
    pub comments: Option<String>,
}

impl Signature {
    /// Insert a pending signature slot for one area.
    ///
    /// Runs on a generic executor so intake can fan out inside the petition
    /// insert transaction.
    pub async fn insert_pending<'e, E: PgExecutor<'e>>(
        petition_id: PetitionId,
        area_id: AreaId,
        executor: E,
    ) -> Result<Self> {
        sqlx::query_as::<_, Self>(
            "INSERT INTO petition_signatures (id, petition_id, area_id, status)
             VALUES ($1, $2, $3, 'pending')
             RETURNING *",
        )
        .bind(SignatureId::new())
        .bind(petition_id)
        .bind(area_id)
        .fetch_one(executor)
        .await
        .map_err(Into::into)
    }

    /// Find signature by ID
    pub async fn find_by_id(id: SignatureId, pool: &PgPool) -> Result<Option<Self>> {
        sqlx::query_as::<_, Self>("SELECT * FROM petition_signatures WHERE id = $1")
            .bind(id)
            .fetch_optional(pool)
            .await
            .map_err(Into::into)
    }

    /// All signatures belonging to a petition, in fan-out order.
    pub async fn find_by_petition(petition_id: PetitionId, pool: &PgPool) -> Result<Vec<Self>> {
        sqlx::query_as::<_, Self>(
            "SELECT * FROM petition_signatures WHERE petition_id = $1 ORDER BY id",
        )
        .bind(petition_id)
        .fetch_all(pool)
        .await
        .map_err(Into::into)
    }

    /// Compare-and-swap a decision onto a pending signature.
    ///
    /// Returns `None` when the row was no longer pending at write time, which
    /// the caller surfaces as a conflict rather than retrying blindly.
    pub async fn sign_if_pending(
        id: SignatureId,
        decision: SignatureStatus,
        signer_id: UserId,
        comments: Option<&str>,
        pool: &PgPool,
    ) -> Result<Option<Self>> {
        sqlx::query_as::<_, Self>(
            "UPDATE petition_signatures
             SET status = $2, signer_id = $3, signed_at = now(), comments = $4
             WHERE id = $1 AND status = 'pending'
             RETURNING *",
        )
        .bind(id)
        .bind(decision)
        .bind(signer_id)
        .bind(comments)
        .fetch_optional(pool)
        .await
        .map_err(Into::into)
    }
}

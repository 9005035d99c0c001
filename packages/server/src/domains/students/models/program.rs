use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;

use crate::common::ProgramId;

/// Academic program - immutable reference data.
#[derive(sqlx::FromRow, Debug, Clone, Serialize, Deserialize)]
pub struct Program {
    pub id: ProgramId,
    pub name: String,
    pub duration_months: i32,
    pub created_at: DateTime<Utc>,
}

impl Program {
    /// Find program by ID
    pub async fn find_by_id(id: ProgramId, pool: &PgPool) -> Result<Option<Self>> {
        sqlx::query_as::<_, Self>("SELECT * FROM programs WHERE id = $1")
            .bind(id)
            .fetch_optional(pool)
            .await
            .map_err(Into::into)
    }
}

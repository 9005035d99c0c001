use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;

use crate::common::AreaId;

/// Organizational area whose sign-off may be required on petitions.
///
/// The set of areas with `requires_signature = true` defines the signature
/// fan-out at petition creation time.
#[derive(sqlx::FromRow, Debug, Clone, Serialize, Deserialize)]
pub struct Area {
    pub id: AreaId,
    pub name: String,
    pub requires_signature: bool,
    pub created_at: DateTime<Utc>,
}

impl Area {
    /// All areas configured as required signers, in a stable order.
    pub async fn find_required(pool: &PgPool) -> Result<Vec<Self>> {
        sqlx::query_as::<_, Self>(
            "SELECT * FROM areas WHERE requires_signature = true ORDER BY name",
        )
        .fetch_all(pool)
        .await
        .map_err(Into::into)
    }
}

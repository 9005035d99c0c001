use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use std::fmt;

use crate::common::{DocumentId, StudentId};

/// Fixed enumeration of document types a student can have on file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "document_type", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum DocumentType {
    BirthCertificate,
    PriorTranscript,
    PaymentProof,
}

impl DocumentType {
    /// Document types every student must have on file before a career-change
    /// petition may be opened.
    pub const REQUIRED: [DocumentType; 3] = [
        DocumentType::BirthCertificate,
        DocumentType::PriorTranscript,
        DocumentType::PaymentProof,
    ];

    /// Stable wire name, matching the Postgres enum labels.
    pub fn as_str(&self) -> &'static str {
        match self {
            DocumentType::BirthCertificate => "birth_certificate",
            DocumentType::PriorTranscript => "prior_transcript",
            DocumentType::PaymentProof => "payment_proof",
        }
    }
}

impl fmt::Display for DocumentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Document row - one uploaded file on record for a student.
///
/// `storage_key` is the object key in the document bucket. The upload flow
/// (out of scope here) writes these rows; the resolution executor rewrites
/// `storage_key` when a student's files move to a new prefix.
#[derive(sqlx::FromRow, Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    pub id: DocumentId,
    pub student_id: StudentId,
    pub doc_type: DocumentType,
    pub storage_key: String,
    pub uploaded_at: DateTime<Utc>,
}

impl Document {
    /// All documents on file for a student.
    pub async fn find_by_student(student_id: StudentId, pool: &PgPool) -> Result<Vec<Self>> {
        sqlx::query_as::<_, Self>(
            "SELECT * FROM documents WHERE student_id = $1 ORDER BY uploaded_at",
        )
        .bind(student_id)
        .fetch_all(pool)
        .await
        .map_err(Into::into)
    }

    /// Point a document at its relocated object key.
    pub async fn set_storage_key(id: DocumentId, storage_key: &str, pool: &PgPool) -> Result<()> {
        sqlx::query("UPDATE documents SET storage_key = $2 WHERE id = $1")
            .bind(id)
            .bind(storage_key)
            .execute(pool)
            .await?;
        Ok(())
    }
}

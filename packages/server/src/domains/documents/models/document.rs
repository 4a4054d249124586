use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

use crate::domains::documents::extraction;

/// Uploaded knowledge base file. `content` caches extracted text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Document {
    pub id: Uuid,
    pub workflow_id: Option<Uuid>,
    pub name: String,
    pub file_path: String,
    pub file_type: Option<String>,
    pub file_size: Option<i64>,
    pub content: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Fields of a document record about to be inserted.
#[derive(Debug, Clone, PartialEq)]
pub struct NewDocument {
    pub workflow_id: Option<Uuid>,
    pub name: String,
    pub file_path: String,
    pub file_type: Option<String>,
    pub file_size: Option<i64>,
    pub content: Option<String>,
}

impl Document {
    pub fn is_text(&self) -> bool {
        extraction::is_text(self.file_type.as_deref(), &self.name)
    }

    pub fn is_pdf(&self) -> bool {
        extraction::is_pdf(self.file_type.as_deref(), &self.name)
    }

    /// Cached content, if any non-empty text was stored.
    pub fn cached_content(&self) -> Option<&str> {
        self.content.as_deref().filter(|c| !c.is_empty())
    }
}

// =============================================================================
// Document Queries
// =============================================================================

impl Document {
    pub async fn list(workflow_id: Option<Uuid>, pool: &PgPool) -> Result<Vec<Self>> {
        sqlx::query_as::<_, Self>(
            r#"
            SELECT * FROM documents
            WHERE $1::uuid IS NULL OR workflow_id = $1
            ORDER BY created_at DESC
            "#,
        )
        .bind(workflow_id)
        .fetch_all(pool)
        .await
        .map_err(Into::into)
    }

    pub async fn find_by_id(id: Uuid, pool: &PgPool) -> Result<Option<Self>> {
        sqlx::query_as::<_, Self>("SELECT * FROM documents WHERE id = $1")
            .bind(id)
            .fetch_optional(pool)
            .await
            .map_err(Into::into)
    }

    /// Documents with the given ids, in the order the ids were given.
    /// Unknown ids are skipped.
    pub async fn find_by_ids(ids: &[Uuid], pool: &PgPool) -> Result<Vec<Self>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let mut documents = sqlx::query_as::<_, Self>("SELECT * FROM documents WHERE id = ANY($1)")
            .bind(ids)
            .fetch_all(pool)
            .await?;
        documents.sort_by_key(|d| ids.iter().position(|id| *id == d.id));
        Ok(documents)
    }

    pub async fn create(input: &NewDocument, pool: &PgPool) -> Result<Self> {
        sqlx::query_as::<_, Self>(
            r#"
            INSERT INTO documents (workflow_id, name, file_path, file_type, file_size, content)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING *
            "#,
        )
        .bind(input.workflow_id)
        .bind(&input.name)
        .bind(&input.file_path)
        .bind(&input.file_type)
        .bind(input.file_size)
        .bind(&input.content)
        .fetch_one(pool)
        .await
        .map_err(Into::into)
    }

    pub async fn update_content(id: Uuid, content: &str, pool: &PgPool) -> Result<()> {
        sqlx::query("UPDATE documents SET content = $2 WHERE id = $1")
            .bind(id)
            .bind(content)
            .execute(pool)
            .await?;
        Ok(())
    }

    /// Delete the record, returning it if it existed.
    pub async fn delete(id: Uuid, pool: &PgPool) -> Result<Option<Self>> {
        sqlx::query_as::<_, Self>("DELETE FROM documents WHERE id = $1 RETURNING *")
            .bind(id)
            .fetch_optional(pool)
            .await
            .map_err(Into::into)
    }
}

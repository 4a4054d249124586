use anyhow::{Context, Result};
use bytes::Bytes;
use chrono::Utc;
use tracing::{info, warn};
use uuid::Uuid;

use super::extraction::{decode_text, is_text};
use super::{Document, NewDocument};
use crate::kernel::{BaseDocumentStore, BaseFileStorage};

/// A file received from the client.
#[derive(Debug, Clone)]
pub struct Upload {
    pub name: String,
    pub content_type: Option<String>,
    pub bytes: Bytes,
    pub workflow_id: Option<Uuid>,
}

/// Storage key for a new upload: `uploads/<millis>-<name>`.
pub fn upload_path(name: &str) -> String {
    // Keep only the final path segment of whatever the browser sent.
    let base = name.rsplit(['/', '\\']).next().unwrap_or(name);
    format!("uploads/{}-{}", Utc::now().timestamp_millis(), base)
}

/// Store the file, then its record. Text files get their content cached on
/// the record right away. If the record cannot be saved the stored file is
/// removed again.
pub async fn upload_document(
    upload: Upload,
    documents: &dyn BaseDocumentStore,
    storage: &dyn BaseFileStorage,
) -> Result<Document> {
    let file_path = upload_path(&upload.name);
    let content = is_text(upload.content_type.as_deref(), &upload.name)
        .then(|| decode_text(&upload.bytes));
    let file_size = upload.bytes.len() as i64;

    storage
        .put(&file_path, upload.bytes)
        .await
        .context("Failed to store uploaded file")?;

    let input = NewDocument {
        workflow_id: upload.workflow_id,
        name: upload.name,
        file_path,
        file_type: upload.content_type,
        file_size: Some(file_size),
        content,
    };

    match documents.create(&input).await {
        Ok(document) => {
            info!(document_id = %document.id, name = %document.name, size = file_size, "document uploaded");
            Ok(document)
        }
        Err(e) => {
            if let Err(cleanup) = storage.remove(&input.file_path).await {
                warn!(path = %input.file_path, error = %cleanup, "failed to remove orphaned upload");
            }
            Err(e.context("Failed to save document record"))
        }
    }
}

/// Delete the record, then its stored file. The file removal is best effort.
pub async fn delete_document(
    id: Uuid,
    documents: &dyn BaseDocumentStore,
    storage: &dyn BaseFileStorage,
) -> Result<Option<Document>> {
    let Some(document) = documents.delete(id).await? else {
        return Ok(None);
    };

    if let Err(e) = storage.remove(&document.file_path).await {
        warn!(document_id = %id, path = %document.file_path, error = %e, "failed to remove stored file");
    }
    Ok(Some(document))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kernel::{MemoryDocumentStore, MemoryFileStorage};

    fn upload(name: &str, content_type: &str, body: &'static [u8]) -> Upload {
        Upload {
            name: name.to_string(),
            content_type: Some(content_type.to_string()),
            bytes: Bytes::from_static(body),
            workflow_id: None,
        }
    }

    #[test]
    fn test_upload_path_shape() {
        let path = upload_path("C:\\Users\\me\\notes.txt");
        let (prefix, rest) = path.split_once('-').unwrap();
        assert!(prefix.starts_with("uploads/"));
        assert!(prefix["uploads/".len()..].parse::<i64>().is_ok());
        assert_eq!(rest, "notes.txt");
    }

    #[tokio::test]
    async fn test_text_upload_caches_content() {
        let store = MemoryDocumentStore::new();
        let storage = MemoryFileStorage::new();

        let doc = upload_document(upload("notes.txt", "text/plain", b"hello"), &store, &storage)
            .await
            .unwrap();

        assert_eq!(doc.content.as_deref(), Some("hello"));
        assert_eq!(doc.file_size, Some(5));
        assert!(storage.contains(&doc.file_path));
    }

    #[tokio::test]
    async fn test_pdf_upload_leaves_content_empty() {
        let store = MemoryDocumentStore::new();
        let storage = MemoryFileStorage::new();

        let doc = upload_document(upload("a.pdf", "application/pdf", b"%PDF"), &store, &storage)
            .await
            .unwrap();

        assert_eq!(doc.content, None);
        assert_eq!(doc.file_type.as_deref(), Some("application/pdf"));
    }

    #[tokio::test]
    async fn test_delete_removes_file() {
        let store = MemoryDocumentStore::new();
        let storage = MemoryFileStorage::new();
        let doc = upload_document(upload("a.txt", "text/plain", b"x"), &store, &storage)
            .await
            .unwrap();

        let deleted = delete_document(doc.id, &store, &storage).await.unwrap();
        assert_eq!(deleted.map(|d| d.id), Some(doc.id));
        assert!(storage.paths().is_empty());
        assert!(delete_document(doc.id, &store, &storage).await.unwrap().is_none());
    }
}

//! Knowledge base context assembled from stored documents.
//!
//! Each readable document contributes one `--- Document: <name> ---` section.
//! Text extracted from files is cached on the record so later requests can
//! use it directly.

use anyhow::Result;
use tracing::{debug, warn};
use uuid::Uuid;

use super::extraction::{decode_text, readable_text, text_objects};
use super::Document;
use crate::kernel::{BaseDocumentStore, BaseFileStorage};

/// Placeholder used when a PDF yields too little text.
pub const PDF_PLACEHOLDER: &str = "[PDF file uploaded - content extraction limited]";

/// How PDF bytes are turned into text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PdfStrategy {
    /// Printable ASCII scrape, first 8000 chars, kept only above 100 chars.
    Readable,
    /// `Tj` strings from text objects when they exceed 100 chars, otherwise
    /// the printable scrape cut to 5000 chars. Kept above 50 chars, otherwise
    /// replaced by [`PDF_PLACEHOLDER`].
    TextObjects,
}

/// Text to include for one document, and whether to cache it.
struct Extracted {
    text: String,
    cache: bool,
}

impl PdfStrategy {
    fn extract(self, bytes: &[u8]) -> Option<Extracted> {
        match self {
            PdfStrategy::Readable => {
                let text = readable_text(bytes, 8000);
                (text.chars().count() > 100).then_some(Extracted { text, cache: true })
            }
            PdfStrategy::TextObjects => {
                let shown = text_objects(bytes);
                let text = if shown.chars().count() > 100 {
                    shown
                } else {
                    readable_text(bytes, 5000)
                };
                Some(if text.chars().count() > 50 {
                    Extracted { text, cache: true }
                } else {
                    Extracted {
                        text: PDF_PLACEHOLDER.to_string(),
                        cache: false,
                    }
                })
            }
        }
    }
}

/// Builds document context for one request.
pub struct DocumentContext<'a> {
    documents: &'a dyn BaseDocumentStore,
    storage: &'a dyn BaseFileStorage,
    pdf: PdfStrategy,
}

impl<'a> DocumentContext<'a> {
    pub fn new(
        documents: &'a dyn BaseDocumentStore,
        storage: &'a dyn BaseFileStorage,
        pdf: PdfStrategy,
    ) -> Self {
        Self {
            documents,
            storage,
            pdf,
        }
    }

    /// Concatenated sections for the given ids, in id order.
    ///
    /// Only the record lookup can fail. Documents whose file cannot be read
    /// or that are neither text nor PDF are left out.
    pub async fn build(&self, ids: &[Uuid]) -> Result<String> {
        if ids.is_empty() {
            return Ok(String::new());
        }

        let documents = self.documents.find_by_ids(ids).await?;
        let mut context = String::new();

        for doc in &documents {
            if let Some(text) = self.document_text(doc).await {
                context.push_str(&section(&doc.name, &text));
            }
        }

        debug!(
            documents = documents.len(),
            context_len = context.len(),
            "built document context"
        );
        Ok(context)
    }

    async fn document_text(&self, doc: &Document) -> Option<String> {
        if let Some(content) = doc.cached_content() {
            return Some(content.to_string());
        }

        let extracted = if doc.is_text() {
            let bytes = self.download(doc).await?;
            Extracted {
                text: decode_text(&bytes),
                cache: true,
            }
        } else if doc.is_pdf() {
            let bytes = self.download(doc).await?;
            self.pdf.extract(&bytes)?
        } else {
            return None;
        };

        if extracted.cache {
            if let Err(e) = self.documents.update_content(doc.id, &extracted.text).await {
                warn!(document_id = %doc.id, error = %e, "failed to cache document content");
            }
        }
        Some(extracted.text)
    }

    async fn download(&self, doc: &Document) -> Option<bytes::Bytes> {
        match self.storage.get(&doc.file_path).await {
            Ok(bytes) => Some(bytes),
            Err(e) => {
                warn!(document_id = %doc.id, path = %doc.file_path, error = %e, "failed to read document");
                None
            }
        }
    }
}

/// One context section.
pub fn section(name: &str, text: &str) -> String {
    format!("\n\n--- Document: {} ---\n{}", name, text)
}

/// Parse request ids, dropping any that are not UUIDs.
pub fn parse_ids(ids: &[String]) -> Vec<Uuid> {
    ids.iter()
        .filter_map(|id| match Uuid::parse_str(id) {
            Ok(id) => Some(id),
            Err(_) => {
                warn!(document_id = %id, "ignoring malformed document id");
                None
            }
        })
        .collect()
}

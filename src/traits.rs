//! Collaborator traits consumed by the indexing orchestrator.
//!
//! The core owns no I/O: document metadata, text extraction (OCR),
//! embeddings, audit logging, and caching all live behind these narrow
//! interfaces. Implementations are provided by the surrounding
//! application; `store::memory` ships in-memory versions for tests and
//! embedded use.
//!
//! All traits are `Send + Sync` so the orchestrator can be shared across
//! request handlers without coordination.

use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;

use crate::models::{AuditEvent, DocumentMeta, ExtractedText};

/// Read access to document and trámite metadata.
#[async_trait]
pub trait DocumentRepository: Send + Sync {
    /// Fetch a document's metadata; `None` if it does not exist.
    async fn find_documento_by_id(&self, id: &str) -> Result<Option<DocumentMeta>>;

    /// Resolve the trámite owning a document. `None` for orphan documents,
    /// which are indexed without trámite scoping.
    async fn find_tramite_id_by_documento_id(&self, id: &str) -> Result<Option<String>>;
}

/// Extracts usable text from a document (stored metadata, OCR cache, or a
/// remote OCR service).
#[async_trait]
pub trait TextExtractor: Send + Sync {
    async fn extract_text(&self, doc: &DocumentMeta) -> Result<ExtractedText>;
}

/// Vectorizes chunk text. The model identifier is part of the index
/// signature, so swapping models re-triggers indexing.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Model identifier (e.g. `"text-embedding-3-small"`).
    fn model_name(&self) -> &str;

    async fn generate_embedding(&self, text: &str) -> Result<Vec<f32>>;
}

/// Fire-and-forget structured audit log. A failing sink must never fail
/// indexing; the orchestrator logs and moves on.
#[async_trait]
pub trait AuditSink: Send + Sync {
    async fn log_event(&self, entry: &AuditEvent) -> Result<()>;
}

/// Narrow key-value capability for extracted-text caching. The core assumes
/// nothing about the backing store (Redis, in-process map, ...).
#[async_trait]
pub trait KeyValueCache: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>>;

    async fn set_with_ttl(&self, key: &str, value: &str, ttl: Duration) -> Result<()>;

    /// List keys with the given prefix, sorted.
    async fn scan(&self, prefix: &str) -> Result<Vec<String>>;
}

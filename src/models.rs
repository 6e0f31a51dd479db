//! Core data models for the indexing pipeline and the preaviso wizard.
//!
//! These types flow between the chunker, the indexing orchestrator, the
//! collaborator traits, and the wizard state computation. Everything the
//! API layer receives back (`IndexingResult`, `PreavisoState`,
//! `KnowledgeSnapshot`) is JSON-serializable.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Maximum chunk text length persisted, in characters. Longer chunk text is
/// truncated at this boundary before the bulk upsert.
pub const MAX_CHUNK_TEXT_CHARS: usize = 20_000;

/// Metadata for a stored notarial document, as returned by the repository.
#[derive(Debug, Clone)]
pub struct DocumentMeta {
    pub id: String,
    pub nombre: Option<String>,
    /// Domain document type: `"escritura"`, `"plano"`, `"credito"`, ...
    pub document_type: Option<String>,
    pub content_type: Option<String>,
    /// Object-storage key of the source blob, if any.
    pub storage_key: Option<String>,
}

/// Outcome of text extraction for a document.
///
/// `needs_ocr` is a normal terminal condition, not an error: the document
/// has no usable text yet and indexing should stop without side effects.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractedText {
    pub text: String,
    /// Where the text came from: `"metadata"`, `"ocr_cache"`, `"textract"`.
    pub source: String,
    pub needs_ocr: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

/// A chunk produced by the chunker, before identity and persistence fields
/// are attached by the orchestrator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChunkDraft {
    /// 1-based page the text came from.
    pub page_number: u32,
    /// 0-based, contiguous within each page.
    pub chunk_index: u32,
    pub text: String,
}

/// A persisted chunk row: one addressable slice of a document's extracted
/// text, scoped to its owning document and (optionally) trámite.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Chunk {
    pub id: String,
    pub documento_id: String,
    /// Owning trámite for access control; `None` for orphan documents.
    pub tramite_id: Option<String>,
    pub page_number: u32,
    pub chunk_index: u32,
    pub text: String,
    #[serde(default)]
    pub metadata: serde_json::Value,
    /// SHA-256 of the full extracted text this chunk was cut from.
    pub document_hash: String,
    pub chunking_version: String,
    pub embedding_model: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub embedding: Option<Vec<f32>>,
}

/// Terminal status of one indexing call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IndexingStatus {
    Indexed,
    Skipped,
    NeedsOcr,
    Error,
}

impl IndexingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            IndexingStatus::Indexed => "indexed",
            IndexingStatus::Skipped => "skipped",
            IndexingStatus::NeedsOcr => "needs_ocr",
            IndexingStatus::Error => "error",
        }
    }
}

/// Result of one `index_document` call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexingResult {
    pub status: IndexingStatus,
    pub chunks_created: usize,
    pub embeddings_created: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl IndexingResult {
    pub fn indexed(chunks_created: usize, embeddings_created: usize) -> Self {
        Self {
            status: IndexingStatus::Indexed,
            chunks_created,
            embeddings_created,
            reason: None,
        }
    }

    pub fn skipped() -> Self {
        Self {
            status: IndexingStatus::Skipped,
            chunks_created: 0,
            embeddings_created: 0,
            reason: None,
        }
    }

    pub fn needs_ocr(reason: Option<String>) -> Self {
        Self {
            status: IndexingStatus::NeedsOcr,
            chunks_created: 0,
            embeddings_created: 0,
            reason,
        }
    }

    pub fn error(reason: impl Into<String>) -> Self {
        Self {
            status: IndexingStatus::Error,
            chunks_created: 0,
            embeddings_created: 0,
            reason: Some(reason.into()),
        }
    }
}

/// Structured audit entry emitted at each terminal indexing outcome.
#[derive(Debug, Clone, Serialize)]
pub struct AuditEvent {
    /// Event name, e.g. `"documento.indexed"`.
    pub event: String,
    pub documento_id: String,
    pub tramite_id: Option<String>,
    pub trace_id: String,
    pub user_id: Option<String>,
    pub status: IndexingStatus,
    pub chunks_created: usize,
    pub embeddings_created: usize,
    pub reason: Option<String>,
    pub at: DateTime<Utc>,
}

/// Overall status of a computed wizard state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StateStatus {
    Complete,
    Incomplete,
    Blocked,
}

/// The computed wizard position for a preaviso context.
///
/// Derived fresh on every call; never persisted by the core.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PreavisoState {
    /// Named stage, e.g. `"collecting_buyer_data"`.
    pub current_state: String,
    pub state_status: StateStatus,
    /// Missing required field paths, most urgent first.
    pub required_missing: Vec<String>,
    /// Domain-rule violations that block finalization regardless of
    /// field completeness.
    pub blocking_reasons: Vec<String>,
}

/// Audit record of exactly which knowledge chunks went into a prompt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KnowledgeSnapshot {
    pub knowledge_chunk_ids: Vec<String>,
    /// Selected chunk keys, in prompt order.
    pub knowledge_chunk_keys: Vec<String>,
    /// SHA-256 hex digest of the selection (64 chars).
    pub knowledge_hash: String,
}

//! Document indexing orchestration.
//!
//! Coordinates the full indexing flow: metadata fetch → text extraction →
//! signature check → chunking → embedding → bulk persistence → audit.
//!
//! The pipeline owns two contracts:
//!
//! - **Idempotence**: re-indexing a document whose index signature is
//!   unchanged returns `skipped` without a single embedding call.
//! - **Failure containment**: indexing runs as a best-effort side path of
//!   document upload, so collaborator failures are absorbed into an
//!   `IndexingResult` with `status = error` instead of propagating. Only
//!   `NotFound` (a caller mistake, 404-equivalent) is returned as an error.
//!
//! Embeddings are generated *before* the stale generation is deleted, so a
//! failed embedding pass leaves the previous generation untouched and the
//! store never holds a mix of two generations. Writes for one document are
//! serialized through a per-`documento_id` async lock.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::Context;
use chrono::Utc;
use tracing::{info, warn};
use uuid::Uuid;

use crate::chunk::{chunk_text, ChunkingVersion};
use crate::config::IndexingConfig;
use crate::error::CoreError;
use crate::models::{
    AuditEvent, Chunk, ChunkDraft, DocumentMeta, ExtractedText, IndexingResult,
    MAX_CHUNK_TEXT_CHARS,
};
use crate::signature::{document_hash, IndexSignature};
use crate::store::ChunkStore;
use crate::traits::{
    AuditSink, DocumentRepository, EmbeddingProvider, KeyValueCache, TextExtractor,
};

/// One indexing request, as received from the document-association API.
#[derive(Debug, Clone)]
pub struct IndexRequest {
    pub documento_id: String,
    pub force_reindex: bool,
    pub trace_id: String,
    pub user_id: Option<String>,
}

/// The indexing orchestrator. Cheap to share behind an `Arc`; all state
/// beyond the lock map lives in the injected collaborators.
pub struct IndexingPipeline {
    repository: Arc<dyn DocumentRepository>,
    extractor: Arc<dyn TextExtractor>,
    embedder: Arc<dyn EmbeddingProvider>,
    store: Arc<dyn ChunkStore>,
    audit: Arc<dyn AuditSink>,
    extract_cache: Option<Arc<dyn KeyValueCache>>,
    config: IndexingConfig,
    doc_locks: Mutex<HashMap<String, Arc<tokio::sync::Mutex<()>>>>,
}

impl IndexingPipeline {
    pub fn new(
        repository: Arc<dyn DocumentRepository>,
        extractor: Arc<dyn TextExtractor>,
        embedder: Arc<dyn EmbeddingProvider>,
        store: Arc<dyn ChunkStore>,
        audit: Arc<dyn AuditSink>,
        config: IndexingConfig,
    ) -> Self {
        Self {
            repository,
            extractor,
            embedder,
            store,
            audit,
            extract_cache: None,
            config,
            doc_locks: Mutex::new(HashMap::new()),
        }
    }

    /// Attach an extracted-text cache consulted before calling the
    /// extractor. Successful extractions are written back with the
    /// configured TTL; `needs_ocr` outcomes are never cached.
    pub fn with_extract_cache(mut self, cache: Arc<dyn KeyValueCache>) -> Self {
        self.extract_cache = Some(cache);
        self
    }

    /// Index one document.
    ///
    /// Returns `Err(CoreError::NotFound)` only when the document does not
    /// exist. Every other failure is folded into the returned
    /// [`IndexingResult`] (`status = error`).
    pub async fn index_document(&self, req: &IndexRequest) -> Result<IndexingResult, CoreError> {
        match self.run(req).await {
            Ok((result, tramite_id)) => {
                info!(
                    documento_id = %req.documento_id,
                    trace_id = %req.trace_id,
                    status = result.status.as_str(),
                    chunks = result.chunks_created,
                    "indexing finished"
                );
                self.emit_audit(req, tramite_id, &result).await;
                Ok(result)
            }
            Err(err @ CoreError::NotFound(_)) => Err(err),
            Err(err) => {
                warn!(
                    documento_id = %req.documento_id,
                    trace_id = %req.trace_id,
                    error = %err,
                    "indexing failed; contained"
                );
                let result = IndexingResult::error(err.to_string());
                self.emit_audit(req, None, &result).await;
                Ok(result)
            }
        }
    }

    async fn run(&self, req: &IndexRequest) -> Result<(IndexingResult, Option<String>), CoreError> {
        let doc = self
            .repository
            .find_documento_by_id(&req.documento_id)
            .await
            .context("repository lookup failed")?
            .ok_or_else(|| CoreError::NotFound(format!("documento {}", req.documento_id)))?;

        let tramite_id = self
            .repository
            .find_tramite_id_by_documento_id(&doc.id)
            .await
            .context("tramite lookup failed")?;

        let extracted = self.extract_with_cache(&doc).await?;
        if extracted.needs_ocr || extracted.text.trim().is_empty() {
            let reason = extracted
                .reason
                .or_else(|| Some("no usable text extracted".to_string()));
            return Ok((IndexingResult::needs_ocr(reason), tramite_id));
        }

        let version = ChunkingVersion::parse(&self.config.chunking_version)?;
        let hash = document_hash(&extracted.text);
        let signature = IndexSignature::new(
            doc.id.clone(),
            hash.clone(),
            version.tag(),
            self.embedder.model_name(),
        );

        // Skip path: no embedding calls, no writes.
        if !req.force_reindex
            && self
                .store
                .has_index_signature(&signature)
                .await
                .context("signature check failed")?
        {
            return Ok((IndexingResult::skipped(), tramite_id));
        }

        let lock = self.lock_for(&doc.id);
        let _guard = lock.lock().await;

        // A concurrent call may have written this signature while we waited.
        if !req.force_reindex
            && self
                .store
                .has_index_signature(&signature)
                .await
                .context("signature re-check failed")?
        {
            return Ok((IndexingResult::skipped(), tramite_id));
        }

        let drafts = chunk_text(&extracted.text, &version, &doc)?;
        if drafts.is_empty() {
            return Ok((
                IndexingResult::needs_ocr(Some("extracted text produced no chunks".to_string())),
                tramite_id,
            ));
        }

        let rows = self
            .embed_drafts(&doc, tramite_id.as_deref(), &extracted, &signature, drafts)
            .await?;
        let embeddings_created = rows.iter().filter(|r| r.embedding.is_some()).count();

        // Delete and insert are adjacent so the store only ever transitions
        // from one complete generation to the next.
        self.store
            .delete_index_signature(&doc.id)
            .await
            .context("stale generation delete failed")?;
        self.store
            .upsert_chunks(&rows)
            .await
            .context("chunk upsert failed")?;

        Ok((
            IndexingResult::indexed(rows.len(), embeddings_created),
            tramite_id,
        ))
    }

    /// Build one generation of chunk rows, embedding every draft.
    async fn embed_drafts(
        &self,
        doc: &DocumentMeta,
        tramite_id: Option<&str>,
        extracted: &ExtractedText,
        signature: &IndexSignature,
        drafts: Vec<ChunkDraft>,
    ) -> Result<Vec<Chunk>, CoreError> {
        let mut rows = Vec::with_capacity(drafts.len());
        for draft in drafts {
            let text = truncate_chars(&draft.text, MAX_CHUNK_TEXT_CHARS);
            let vector = self
                .embedder
                .generate_embedding(&text)
                .await
                .with_context(|| {
                    format!(
                        "embedding failed for chunk {}/{} of documento {}",
                        draft.page_number, draft.chunk_index, doc.id
                    )
                })?;
            rows.push(Chunk {
                id: Uuid::new_v4().to_string(),
                documento_id: doc.id.clone(),
                tramite_id: tramite_id.map(|s| s.to_string()),
                page_number: draft.page_number,
                chunk_index: draft.chunk_index,
                text,
                metadata: serde_json::json!({
                    "document_type": doc.document_type,
                    "extraction_source": extracted.source,
                }),
                document_hash: signature.document_hash.clone(),
                chunking_version: signature.chunking_version.clone(),
                embedding_model: signature.embedding_model.clone(),
                embedding: Some(vector),
            });
        }
        Ok(rows)
    }

    async fn extract_with_cache(&self, doc: &DocumentMeta) -> Result<ExtractedText, CoreError> {
        let cache_key = format!("extract:{}", doc.id);

        if let Some(cache) = &self.extract_cache {
            match cache.get(&cache_key).await {
                Ok(Some(raw)) => {
                    if let Ok(cached) = serde_json::from_str::<ExtractedText>(&raw) {
                        return Ok(cached);
                    }
                    warn!(documento_id = %doc.id, "discarding unreadable extract cache entry");
                }
                Ok(None) => {}
                // Cache trouble is not a reason to fail extraction.
                Err(err) => warn!(documento_id = %doc.id, error = %err, "extract cache get failed"),
            }
        }

        let extracted = self
            .extractor
            .extract_text(doc)
            .await
            .context("text extraction failed")?;

        if let Some(cache) = &self.extract_cache {
            if !extracted.needs_ocr && !extracted.text.trim().is_empty() {
                if let Ok(raw) = serde_json::to_string(&extracted) {
                    let ttl = Duration::from_secs(self.config.extract_cache_ttl_secs);
                    if let Err(err) = cache.set_with_ttl(&cache_key, &raw, ttl).await {
                        warn!(documento_id = %doc.id, error = %err, "extract cache set failed");
                    }
                }
            }
        }

        Ok(extracted)
    }

    async fn emit_audit(
        &self,
        req: &IndexRequest,
        tramite_id: Option<String>,
        result: &IndexingResult,
    ) {
        let entry = AuditEvent {
            event: format!("documento.{}", result.status.as_str()),
            documento_id: req.documento_id.clone(),
            tramite_id,
            trace_id: req.trace_id.clone(),
            user_id: req.user_id.clone(),
            status: result.status,
            chunks_created: result.chunks_created,
            embeddings_created: result.embeddings_created,
            reason: result.reason.clone(),
            at: Utc::now(),
        };
        if let Err(err) = self.audit.log_event(&entry).await {
            warn!(
                documento_id = %req.documento_id,
                trace_id = %req.trace_id,
                error = %err,
                "audit sink failed; ignored"
            );
        }
    }

    fn lock_for(&self, documento_id: &str) -> Arc<tokio::sync::Mutex<()>> {
        let mut map = self.doc_locks.lock().unwrap();
        map.entry(documento_id.to_string())
            .or_insert_with(|| Arc::new(tokio::sync::Mutex::new(())))
            .clone()
    }
}

/// Truncate to at most `max_chars` characters, on a char boundary.
fn truncate_chars(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((byte_idx, _)) => text[..byte_idx].to_string(),
        None => text.to_string(),
    }
}

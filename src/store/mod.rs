//! Chunk storage abstraction.
//!
//! The [`ChunkStore`] trait defines the persistence operations the indexing
//! orchestrator needs, enabling pluggable backends (managed Postgres behind
//! the application's repository layer, in-memory for tests).
//!
//! Implementations must be `Send + Sync` to work with async runtimes.
//!
//! # Operations
//!
//! | Method | Purpose |
//! |--------|---------|
//! | [`has_index_signature`](ChunkStore::has_index_signature) | Exact-match check for an existing chunk generation |
//! | [`delete_index_signature`](ChunkStore::delete_index_signature) | Drop every stored generation for a document |
//! | [`upsert_chunks`](ChunkStore::upsert_chunks) | Bulk-insert one new generation |

pub mod memory;

use anyhow::Result;
use async_trait::async_trait;

use crate::models::Chunk;
use crate::signature::IndexSignature;

/// Abstract chunk persistence for the indexing pipeline.
///
/// The invariant the orchestrator relies on: after any successful indexing
/// call, the stored chunks for a document all belong to exactly one
/// signature — never a mix of two generations. `delete_index_signature`
/// therefore removes *all* generations for the document, and
/// `upsert_chunks` writes the new generation in one conceptual
/// all-or-nothing call.
#[async_trait]
pub trait ChunkStore: Send + Sync {
    /// Whether a chunk generation already exists for this exact signature.
    async fn has_index_signature(&self, signature: &IndexSignature) -> Result<bool>;

    /// Delete every stored chunk for the document, across all signatures.
    /// Returns the number of rows removed.
    async fn delete_index_signature(&self, documento_id: &str) -> Result<u64>;

    /// Bulk-insert one generation of chunks. All rows share one signature.
    async fn upsert_chunks(&self, rows: &[Chunk]) -> Result<()>;
}

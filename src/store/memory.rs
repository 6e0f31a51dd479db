//! In-memory implementations of [`ChunkStore`] and
//! [`KeyValueCache`](crate::traits::KeyValueCache) for tests and embedded use.
//!
//! Uses `Vec`/`HashMap` behind `std::sync::RwLock`. Replacement semantics
//! are `retain`-based, mirroring what a transactional delete+insert does in
//! a relational backend.

use std::collections::HashMap;
use std::sync::RwLock;
use std::time::{Duration, Instant};

use anyhow::Result;
use async_trait::async_trait;

use crate::models::Chunk;
use crate::signature::IndexSignature;
use crate::traits::KeyValueCache;

use super::ChunkStore;

/// In-memory chunk store.
#[derive(Default)]
pub struct InMemoryChunkStore {
    chunks: RwLock<Vec<Chunk>>,
}

impl InMemoryChunkStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the stored chunks for a document, ordered by
    /// `(page_number, chunk_index)`. Test helper.
    pub fn chunks_for(&self, documento_id: &str) -> Vec<Chunk> {
        let guard = self.chunks.read().unwrap();
        let mut rows: Vec<Chunk> = guard
            .iter()
            .filter(|c| c.documento_id == documento_id)
            .cloned()
            .collect();
        rows.sort_by_key(|c| (c.page_number, c.chunk_index));
        rows
    }

    /// Distinct document hashes currently stored for a document. A store
    /// honoring the single-generation invariant never yields more than one.
    pub fn generations_for(&self, documento_id: &str) -> Vec<String> {
        let guard = self.chunks.read().unwrap();
        let mut hashes: Vec<String> = guard
            .iter()
            .filter(|c| c.documento_id == documento_id)
            .map(|c| c.document_hash.clone())
            .collect();
        hashes.sort();
        hashes.dedup();
        hashes
    }
}

#[async_trait]
impl ChunkStore for InMemoryChunkStore {
    async fn has_index_signature(&self, signature: &IndexSignature) -> Result<bool> {
        let guard = self.chunks.read().unwrap();
        Ok(guard.iter().any(|c| {
            c.documento_id == signature.documento_id
                && c.document_hash == signature.document_hash
                && c.chunking_version == signature.chunking_version
                && c.embedding_model == signature.embedding_model
        }))
    }

    async fn delete_index_signature(&self, documento_id: &str) -> Result<u64> {
        let mut guard = self.chunks.write().unwrap();
        let before = guard.len();
        guard.retain(|c| c.documento_id != documento_id);
        Ok((before - guard.len()) as u64)
    }

    async fn upsert_chunks(&self, rows: &[Chunk]) -> Result<()> {
        let mut guard = self.chunks.write().unwrap();
        guard.extend_from_slice(rows);
        Ok(())
    }
}

/// In-memory TTL cache.
#[derive(Default)]
pub struct InMemoryCache {
    entries: RwLock<HashMap<String, (String, Instant)>>,
}

impl InMemoryCache {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl KeyValueCache for InMemoryCache {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        let now = Instant::now();
        let guard = self.entries.read().unwrap();
        Ok(guard
            .get(key)
            .filter(|(_, deadline)| *deadline > now)
            .map(|(value, _)| value.clone()))
    }

    async fn set_with_ttl(&self, key: &str, value: &str, ttl: Duration) -> Result<()> {
        let mut guard = self.entries.write().unwrap();
        guard.insert(key.to_string(), (value.to_string(), Instant::now() + ttl));
        Ok(())
    }

    async fn scan(&self, prefix: &str) -> Result<Vec<String>> {
        let now = Instant::now();
        let guard = self.entries.read().unwrap();
        let mut keys: Vec<String> = guard
            .iter()
            .filter(|(k, (_, deadline))| k.starts_with(prefix) && *deadline > now)
            .map(|(k, _)| k.clone())
            .collect();
        keys.sort();
        Ok(keys)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(documento_id: &str, document_hash: &str, chunk_index: u32) -> Chunk {
        Chunk {
            id: format!("{}-{}", documento_id, chunk_index),
            documento_id: documento_id.to_string(),
            tramite_id: None,
            page_number: 1,
            chunk_index,
            text: "texto".to_string(),
            metadata: serde_json::json!({}),
            document_hash: document_hash.to_string(),
            chunking_version: "v1".to_string(),
            embedding_model: "m1".to_string(),
            embedding: None,
        }
    }

    #[tokio::test]
    async fn signature_check_is_exact_match() {
        let store = InMemoryChunkStore::new();
        store.upsert_chunks(&[row("d1", "h1", 0)]).await.unwrap();

        let hit = IndexSignature::new("d1", "h1", "v1", "m1");
        let miss = IndexSignature::new("d1", "h1", "v1", "m2");
        assert!(store.has_index_signature(&hit).await.unwrap());
        assert!(!store.has_index_signature(&miss).await.unwrap());
    }

    #[tokio::test]
    async fn delete_drops_every_generation() {
        let store = InMemoryChunkStore::new();
        store
            .upsert_chunks(&[row("d1", "h1", 0), row("d1", "h2", 1), row("d2", "h1", 0)])
            .await
            .unwrap();

        let removed = store.delete_index_signature("d1").await.unwrap();
        assert_eq!(removed, 2);
        assert!(store.chunks_for("d1").is_empty());
        assert_eq!(store.chunks_for("d2").len(), 1);
    }

    #[tokio::test]
    async fn cache_expires_entries() {
        let cache = InMemoryCache::new();
        cache
            .set_with_ttl("extract:d1", "texto", Duration::from_secs(60))
            .await
            .unwrap();
        cache
            .set_with_ttl("extract:d2", "texto", Duration::from_millis(0))
            .await
            .unwrap();

        assert_eq!(
            cache.get("extract:d1").await.unwrap(),
            Some("texto".to_string())
        );
        assert_eq!(cache.get("extract:d2").await.unwrap(), None);
        assert_eq!(cache.scan("extract:").await.unwrap(), vec!["extract:d1"]);
    }
}

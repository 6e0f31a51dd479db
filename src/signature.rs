//! Content-addressed index signature.
//!
//! The signature identifies one generation of chunks for a document:
//! `(documento_id, document_hash, chunking_version, embedding_model)`.
//! Re-indexing with an unchanged signature is a no-op; any change in any
//! field is a different signature and replaces the previous generation.
//!
//! `document_hash` is computed over the *extracted text used for chunking*,
//! never the raw file bytes, so a better OCR pass re-triggers indexing even
//! when the source blob is unchanged.

use serde::Serialize;
use sha2::{Digest, Sha256};

/// SHA-256 hex digest of extracted text.
pub fn document_hash(text: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(text.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Identity of one chunk generation. Equality is exact-match on all four
/// fields; there is no fuzzy or partial matching.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct IndexSignature {
    pub documento_id: String,
    pub document_hash: String,
    pub chunking_version: String,
    pub embedding_model: String,
}

impl IndexSignature {
    pub fn new(
        documento_id: impl Into<String>,
        document_hash: impl Into<String>,
        chunking_version: impl Into<String>,
        embedding_model: impl Into<String>,
    ) -> Self {
        Self {
            documento_id: documento_id.into(),
            document_hash: document_hash.into(),
            chunking_version: chunking_version.into(),
            embedding_model: embedding_model.into(),
        }
    }

    /// Stable digest of the signature. Fields are length-prefixed before
    /// hashing so concatenation ambiguity cannot collide two signatures.
    pub fn fingerprint(&self) -> String {
        let mut hasher = Sha256::new();
        for field in [
            &self.documento_id,
            &self.document_hash,
            &self.chunking_version,
            &self.embedding_model,
        ] {
            hasher.update((field.len() as u64).to_le_bytes());
            hasher.update(field.as_bytes());
        }
        hex::encode(hasher.finalize())
    }
}

//! Error taxonomy for the core.
//!
//! Pure components (chunker, state computation, prompt/knowledge builders)
//! fail loudly with a typed [`CoreError`]. The indexing orchestrator is
//! defensive instead: collaborator failures are absorbed into an
//! `IndexingResult` with `status = error` and never reach the caller as a
//! raw error (see `indexer`).

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
    /// A referenced document or trámite does not exist. 404-equivalent.
    #[error("not found: {0}")]
    NotFound(String),

    /// Malformed input to a pure component. Never retried.
    #[error("validation failed: {0}")]
    Validation(String),

    /// A domain rule was violated on the finalize path. Carries a
    /// machine-readable code for the API layer (unprocessable, not 500).
    #[error("domain rule violated [{code}]: {message}")]
    DomainRule { code: &'static str, message: String },

    /// Any failure from an OCR/embedding/storage collaborator.
    #[error(transparent)]
    Collaborator(#[from] anyhow::Error),
}

impl CoreError {
    /// Machine-readable code for domain-rule violations, if this is one.
    pub fn domain_code(&self) -> Option<&'static str> {
        match self {
            CoreError::DomainRule { code, .. } => Some(code),
            _ => None,
        }
    }
}

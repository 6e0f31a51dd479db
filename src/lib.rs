//! # notaria-core
//!
//! Deterministic document indexing and preaviso wizard core for a notarial
//! document platform.
//!
//! Two subsystems share this crate. The **indexing pipeline** ingests the
//! extracted text of notarial documents (escrituras, planos, credit
//! instruments), splits it into stable content chunks, and deduplicates
//! re-indexing work through a content-addressed index signature. The
//! **preaviso wizard** computes the missing-field / blocking-reason state
//! of a partially-filled legal data graph and assembles the deterministic
//! prompts that drive the extraction conversation.
//!
//! ## Architecture
//!
//! ```text
//! ┌────────────┐   ┌───────────────────┐   ┌────────────┐
//! │ Repository │──▶│ IndexingPipeline   │──▶│ ChunkStore │
//! │ Extractor  │   │ hash → skip/chunk │   │ (1 gen per │
//! │ Embedder   │   │ → embed → upsert  │   │  signature)│
//! └────────────┘   └───────────────────┘   └────────────┘
//!
//! ┌────────────┐   ┌───────────────────┐   ┌────────────┐
//! │ JSON       │──▶│ compute_preaviso_ │──▶│ prompt +   │
//! │ context    │   │ state             │   │ knowledge  │
//! └────────────┘   └───────────────────┘   └────────────┘
//! ```
//!
//! All I/O lives behind the collaborator traits in [`traits`] and
//! [`store`]; the chunker, state computation, prompt builder, and knowledge
//! selector are pure and safe to call concurrently.
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML pipeline configuration |
//! | [`models`] | Core data types |
//! | [`error`] | Error taxonomy |
//! | [`chunk`] | Versioned text chunking |
//! | [`signature`] | Content-addressed index signature |
//! | [`traits`] | Collaborator interfaces |
//! | [`store`] | Chunk persistence abstraction |
//! | [`indexer`] | Indexing orchestration |
//! | [`context`] | Preaviso legal-data schema |
//! | [`state`] | Wizard state computation |
//! | [`prompt`] | User-prompt assembly |
//! | [`knowledge`] | Official-knowledge selection |

pub mod chunk;
pub mod config;
pub mod context;
pub mod error;
pub mod indexer;
pub mod knowledge;
pub mod models;
pub mod prompt;
pub mod signature;
pub mod state;
pub mod store;
pub mod traits;

//! Official-knowledge selection for prompt grounding.
//!
//! Picks a deterministic subset of reference snippets for a trámite type,
//! scope, and missing-field list, and records the selection in a
//! [`KnowledgeSnapshot`] so any generated prompt can be reproduced later
//! for audit. Selection depends only on the declared inputs — no clock, no
//! randomness, no external mutable state.
//!
//! When no backing knowledge store is configured, a built-in default corpus
//! covers the preaviso procedure; the fallback path still yields a valid
//! section-marked context and a full-length hash.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::models::KnowledgeSnapshot;

/// Marker opening the knowledge section of a prompt.
pub const KNOWLEDGE_SECTION_MARKER: &str = "=== CONOCIMIENTO OFICIAL ===";

/// Inputs to one knowledge selection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KnowledgeRequest {
    /// Trámite type, e.g. `"preaviso"`.
    pub tramite: String,
    /// Sub-scope within the trámite, e.g. `"compraventa"`; `"general"`
    /// snippets always qualify.
    pub scope: String,
    /// Prompt template version; folded into the hash so template changes
    /// are distinguishable in the audit trail.
    pub prompt_version: String,
    /// Missing field paths from the state computation; snippets whose
    /// topic prefixes one of them rank first.
    pub missing_fields: Vec<String>,
}

/// One reference snippet, as provided by a knowledge store or the built-in
/// corpus.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KnowledgeChunk {
    pub id: String,
    /// Stable hierarchical key, e.g. `"preaviso/creditos/institucion"`.
    pub key: String,
    pub tramite: String,
    pub scope: String,
    /// Field-path prefix this snippet helps with; empty = always relevant.
    pub topic: String,
    pub body: String,
}

/// Build the knowledge prompt section from the built-in default corpus.
pub fn build_knowledge_context(req: &KnowledgeRequest) -> (String, KnowledgeSnapshot) {
    build_knowledge_context_with(&default_corpus(), req)
}

/// Build the knowledge prompt section from an explicit corpus (injected by
/// an external knowledge store). Falls back to every `general` snippet when
/// filtering selects nothing, so the context is never empty for a corpus
/// that carries at least one entry.
pub fn build_knowledge_context_with(
    corpus: &[KnowledgeChunk],
    req: &KnowledgeRequest,
) -> (String, KnowledgeSnapshot) {
    let mut ranked: Vec<(usize, &KnowledgeChunk)> = corpus
        .iter()
        .filter(|c| c.tramite == req.tramite)
        .filter(|c| c.scope == "general" || c.scope == req.scope)
        .map(|c| (rank(c, &req.missing_fields), c))
        .collect();

    if ranked.is_empty() {
        ranked = corpus.iter().map(|c| (usize::MAX, c)).collect();
    }
    ranked.sort_by(|a, b| a.0.cmp(&b.0).then_with(|| a.1.key.cmp(&b.1.key)));

    let keys: Vec<String> = ranked.iter().map(|(_, c)| c.key.clone()).collect();
    let ids: Vec<String> = ranked.iter().map(|(_, c)| c.id.clone()).collect();

    let mut hasher = Sha256::new();
    hasher.update((req.prompt_version.len() as u64).to_le_bytes());
    hasher.update(req.prompt_version.as_bytes());
    for key in &keys {
        hasher.update((key.len() as u64).to_le_bytes());
        hasher.update(key.as_bytes());
    }
    let knowledge_hash = hex::encode(hasher.finalize());

    let mut prompt_context = String::from(KNOWLEDGE_SECTION_MARKER);
    prompt_context.push('\n');
    for (_, chunk) in &ranked {
        prompt_context.push('\n');
        prompt_context.push('[');
        prompt_context.push_str(&chunk.key);
        prompt_context.push_str("]\n");
        prompt_context.push_str(&chunk.body);
        prompt_context.push('\n');
    }

    (
        prompt_context,
        KnowledgeSnapshot {
            knowledge_chunk_ids: ids,
            knowledge_chunk_keys: keys,
            knowledge_hash,
        },
    )
}

/// Snippets rank by the position of the first missing field their topic
/// prefixes, so the snippet for the priority field leads; non-matching
/// snippets sort last. Ties break by key.
fn rank(chunk: &KnowledgeChunk, missing_fields: &[String]) -> usize {
    if chunk.topic.is_empty() {
        return usize::MAX;
    }
    missing_fields
        .iter()
        .position(|m| m.starts_with(&chunk.topic))
        .unwrap_or(usize::MAX)
}

/// Built-in reference corpus for the preaviso procedure.
pub fn default_corpus() -> Vec<KnowledgeChunk> {
    const ENTRIES: &[(&str, &str, &str, &str, &str)] = &[
        (
            "kb-001",
            "preaviso/general/definicion",
            "general",
            "",
            "El preaviso es el aviso preventivo que el notario presenta ante el \
             Registro Público de la Propiedad para reservar prioridad sobre un \
             inmueble durante la tramitación de una escritura.",
        ),
        (
            "kb-002",
            "preaviso/inmueble/identificacion",
            "general",
            "inmueble",
            "El inmueble se identifica por folio real o, en el sistema \
             tradicional, por sección y partida. Sin estos datos el registro no \
             puede anotar el preaviso.",
        ),
        (
            "kb-003",
            "preaviso/partes/compradores",
            "general",
            "compradores",
            "Cada comprador persona física requiere nombre completo y estado \
             civil. Si está casado, el régimen conyugal puede exigir que el \
             cónyuge comparezca, por lo que su nombre es obligatorio.",
        ),
        (
            "kb-004",
            "preaviso/partes/vendedores",
            "general",
            "vendedores",
            "Los vendedores deben coincidir con los titulares registrales del \
             folio. Personas morales acreditan existencia con su razón social y \
             poder del representante.",
        ),
        (
            "kb-005",
            "preaviso/creditos/institucion",
            "compraventa",
            "creditos",
            "Cuando la operación se financia con crédito, el preaviso debe \
             señalar la institución acreedora y el número de crédito para la \
             futura inscripción de la garantía.",
        ),
        (
            "kb-006",
            "preaviso/gravamenes/cancelacion",
            "compraventa",
            "gravamenes",
            "Los gravámenes vigentes se relacionan con la institución a cuyo \
             favor están inscritos; su cancelación o subsistencia se resuelve \
             antes de firmar la escritura definitiva.",
        ),
        (
            "kb-007",
            "preaviso/actos/tipos",
            "general",
            "actos",
            "El o los actos jurídicos del instrumento (compraventa, hipoteca, \
             cancelación) determinan las secciones registrales donde se anota \
             el preaviso.",
        ),
    ];

    ENTRIES
        .iter()
        .map(|(id, key, scope, topic, body)| KnowledgeChunk {
            id: (*id).to_string(),
            key: (*key).to_string(),
            tramite: "preaviso".to_string(),
            scope: (*scope).to_string(),
            topic: (*topic).to_string(),
            body: (*body).to_string(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(missing: &[&str]) -> KnowledgeRequest {
        KnowledgeRequest {
            tramite: "preaviso".to_string(),
            scope: "compraventa".to_string(),
            prompt_version: "v3".to_string(),
            missing_fields: missing.iter().map(|s| s.to_string()).collect(),
        }
    }

    #[test]
    fn reproducible_hash_and_key_order() {
        let req = request(&["creditos[0].institucion"]);
        let (ctx_a, snap_a) = build_knowledge_context(&req);
        let (ctx_b, snap_b) = build_knowledge_context(&req);
        assert_eq!(ctx_a, ctx_b);
        assert_eq!(snap_a, snap_b);
        assert!(snap_a.knowledge_hash.len() >= 32);
    }

    #[test]
    fn fallback_corpus_yields_marked_context() {
        let (ctx, snap) = build_knowledge_context(&request(&[]));
        assert!(ctx.starts_with(KNOWLEDGE_SECTION_MARKER));
        assert!(!snap.knowledge_chunk_keys.is_empty());
        assert_eq!(
            snap.knowledge_chunk_ids.len(),
            snap.knowledge_chunk_keys.len()
        );
    }

    #[test]
    fn missing_field_topic_ranks_first() {
        let (_, snap) = build_knowledge_context(&request(&["gravamenes[0].institucion"]));
        assert_eq!(
            snap.knowledge_chunk_keys[0],
            "preaviso/gravamenes/cancelacion"
        );
    }

    #[test]
    fn prompt_version_changes_the_hash() {
        let base = request(&[]);
        let mut bumped = base.clone();
        bumped.prompt_version = "v4".to_string();
        let (_, a) = build_knowledge_context(&base);
        let (_, b) = build_knowledge_context(&bumped);
        assert_ne!(a.knowledge_hash, b.knowledge_hash);
        assert_eq!(a.knowledge_chunk_keys, b.knowledge_chunk_keys);
    }

    #[test]
    fn unknown_tramite_falls_back_to_full_corpus() {
        let mut req = request(&[]);
        req.tramite = "testamento".to_string();
        let (ctx, snap) = build_knowledge_context(&req);
        assert!(ctx.contains(KNOWLEDGE_SECTION_MARKER));
        assert_eq!(snap.knowledge_chunk_keys.len(), default_corpus().len());
    }

    #[test]
    fn scope_filters_out_of_scope_snippets() {
        let mut req = request(&[]);
        req.scope = "hipoteca".to_string();
        let (_, snap) = build_knowledge_context(&req);
        assert!(!snap
            .knowledge_chunk_keys
            .contains(&"preaviso/creditos/institucion".to_string()));
    }
}

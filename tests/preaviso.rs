//! End-to-end tests for the preaviso wizard: state computation feeding the
//! prompt builder and the knowledge selector.

use serde_json::json;

use notaria_core::config::PreavisoConfig;
use notaria_core::context::PreavisoContext;
use notaria_core::knowledge::{
    build_knowledge_context, KnowledgeRequest, KNOWLEDGE_SECTION_MARKER,
};
use notaria_core::models::StateStatus;
use notaria_core::prompt::{generate_user_prompt, ConversationTurn};
use notaria_core::state::compute_preaviso_state;

fn scenario_context() -> PreavisoContext {
    PreavisoContext::from_value(json!({
        "inmueble": { "folio_real": "1782486" },
        "compradores": [ { "persona_fisica": {
            "nombre": "Juan Perez",
            "estado_civil": "casado",
            "conyuge": { "nombre": "Ana Lopez" }
        } } ],
        "vendedores": [ { "persona_fisica": { "nombre": "Maria Ruiz" } } ],
        "creditos": [ { "institucion": "BBVA" } ]
    }))
    .unwrap()
}

#[test]
fn scenario_prompt_contains_known_data_and_priority_line() {
    let missing = vec!["gravamenes[0].institucion".to_string()];
    let prompt = generate_user_prompt(&scenario_context(), &[], &missing, false, true, &[]);

    assert!(prompt.contains("Folio real: 1782486"));
    assert!(prompt.contains("Comprador: Juan Perez"));
    assert!(prompt.contains("Institución de crédito: BBVA"));
    assert!(prompt.contains("Dato prioritario a resolver: gravamenes[0].institucion"));
}

#[test]
fn state_priority_is_stable_and_feeds_the_prompt() {
    let context = scenario_context();
    let state_a = compute_preaviso_state(&context);
    let state_b = compute_preaviso_state(&context);
    assert_eq!(state_a, state_b);
    assert_eq!(state_a.state_status, StateStatus::Incomplete);

    // The scenario context still lacks seccion/partida first.
    assert_eq!(state_a.required_missing[0], "inmueble.seccion");

    let prompt = generate_user_prompt(
        &context,
        &[],
        &state_a.required_missing,
        false,
        true,
        &[],
    );
    assert!(prompt.contains("Dato prioritario a resolver: inmueble.seccion"));
}

#[test]
fn state_computation_does_not_mutate_the_context() {
    let context = scenario_context();
    let before = context.clone();
    let _ = compute_preaviso_state(&context);
    assert_eq!(context, before);
}

#[test]
fn history_flows_into_the_prompt_when_requested() {
    let history = vec![
        ConversationTurn {
            role: "assistant".to_string(),
            content: "¿Cuál es la sección del inmueble?".to_string(),
        },
        ConversationTurn {
            role: "user".to_string(),
            content: "No la tengo a la mano.".to_string(),
        },
    ];
    let with = generate_user_prompt(&scenario_context(), &history, &[], true, false, &[]);
    let without = generate_user_prompt(&scenario_context(), &history, &[], false, false, &[]);
    assert!(with.contains("No la tengo a la mano."));
    assert!(!without.contains("No la tengo a la mano."));
}

#[test]
fn knowledge_selection_is_reproducible_for_the_wizard_turn() {
    let state = compute_preaviso_state(&scenario_context());
    let req = KnowledgeRequest {
        tramite: "preaviso".to_string(),
        scope: "compraventa".to_string(),
        prompt_version: PreavisoConfig::default().prompt_version,
        missing_fields: state.required_missing.clone(),
    };

    let (ctx_a, snap_a) = build_knowledge_context(&req);
    let (ctx_b, snap_b) = build_knowledge_context(&req);

    assert_eq!(snap_a.knowledge_hash, snap_b.knowledge_hash);
    assert_eq!(snap_a.knowledge_chunk_keys, snap_b.knowledge_chunk_keys);
    assert!(snap_a.knowledge_hash.len() >= 32);
    assert_eq!(ctx_a, ctx_b);
    assert!(ctx_a.contains(KNOWLEDGE_SECTION_MARKER));
    // The first missing field is property data, so the property snippet
    // must lead the selection.
    assert_eq!(
        snap_a.knowledge_chunk_keys[0],
        "preaviso/inmueble/identificacion"
    );
}

//! Deterministic user-prompt assembly for the preaviso assistant.
//!
//! Composes the next conversation turn from the known data, the recent
//! history, and the missing-field list computed by `state`. The single
//! most urgent missing field is called out explicitly so the LLM focuses
//! one question per turn. Pure string work; the LLM call itself lives
//! outside the core.

use serde::{Deserialize, Serialize};

use crate::context::{filled, Parte, PreavisoContext};

/// One prior turn of the wizard conversation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationTurn {
    /// `"user"` or `"assistant"`.
    pub role: String,
    pub content: String,
}

/// How many trailing history turns the prompt includes.
const MAX_HISTORY_TURNS: usize = 6;

/// Build the user prompt for the next assistant turn.
///
/// Deterministic for identical arguments. Absent nested objects (spouse,
/// credits) simply omit their summary lines; nothing here panics on a
/// sparse context.
pub fn generate_user_prompt(
    ctx: &PreavisoContext,
    history: &[ConversationTurn],
    missing_fields: &[String],
    include_history: bool,
    include_known_summary: bool,
    extra_notes: &[String],
) -> String {
    let mut out = String::new();
    out.push_str("Contexto del trámite de preaviso:\n");

    if include_known_summary {
        push_known_summary(&mut out, ctx);
    }

    if include_history && !history.is_empty() {
        out.push_str("\nConversación reciente:\n");
        let start = history.len().saturating_sub(MAX_HISTORY_TURNS);
        for turn in &history[start..] {
            out.push_str("- ");
            out.push_str(&turn.role);
            out.push_str(": ");
            out.push_str(&turn.content);
            out.push('\n');
        }
    }

    if !extra_notes.is_empty() {
        out.push_str("\nNotas adicionales:\n");
        for note in extra_notes {
            out.push_str("- ");
            out.push_str(note);
            out.push('\n');
        }
    }

    out.push('\n');
    match missing_fields.first() {
        Some(priority) => {
            out.push_str("Dato prioritario a resolver: ");
            out.push_str(priority);
            out.push('\n');
            if missing_fields.len() > 1 {
                out.push_str("Otros datos pendientes: ");
                out.push_str(&missing_fields[1..].join(", "));
                out.push('\n');
            }
        }
        None => out.push_str("Todos los datos requeridos están completos.\n"),
    }

    out
}

fn push_known_summary(out: &mut String, ctx: &PreavisoContext) {
    if let Some(inmueble) = &ctx.inmueble {
        push_line(out, "Folio real", &inmueble.folio_real);
        push_line(out, "Sección", &inmueble.seccion);
        push_line(out, "Partida", &inmueble.partida);
    }
    for parte in &ctx.compradores {
        push_party(out, "Comprador", parte);
    }
    for parte in &ctx.vendedores {
        push_party(out, "Vendedor", parte);
    }
    for credito in &ctx.creditos {
        push_line(out, "Institución de crédito", &credito.institucion);
        push_line(out, "Número de crédito", &credito.numero_credito);
    }
    for gravamen in &ctx.gravamenes {
        push_line(out, "Gravamen a favor de", &gravamen.institucion);
    }
}

fn push_party(out: &mut String, label: &str, parte: &Parte) {
    if let Some(fisica) = &parte.persona_fisica {
        push_line(out, label, &fisica.nombre);
        if let Some(conyuge) = &fisica.conyuge {
            if filled(&conyuge.nombre) {
                out.push_str("Cónyuge de ");
                out.push_str(&label.to_lowercase());
                out.push_str(": ");
                out.push_str(conyuge.nombre.as_deref().unwrap_or_default().trim());
                out.push('\n');
            }
        }
    } else if let Some(moral) = &parte.persona_moral {
        push_line(out, label, &moral.razon_social);
    }
}

fn push_line(out: &mut String, label: &str, value: &Option<String>) {
    if filled(value) {
        out.push_str(label);
        out.push_str(": ");
        out.push_str(value.as_deref().unwrap_or_default().trim());
        out.push('\n');
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::PreavisoContext;
    use serde_json::json;

    fn sample_context() -> PreavisoContext {
        PreavisoContext::from_value(json!({
            "inmueble": { "folio_real": "1782486" },
            "compradores": [ { "persona_fisica": {
                "nombre": "Juan Perez", "estado_civil": "casado",
                "conyuge": { "nombre": "Ana Lopez" }
            } } ],
            "vendedores": [ { "persona_fisica": { "nombre": "Maria Ruiz" } } ],
            "creditos": [ { "institucion": "BBVA" } ]
        }))
        .unwrap()
    }

    #[test]
    fn surfaces_known_data_and_priority_field() {
        let prompt = generate_user_prompt(
            &sample_context(),
            &[],
            &["gravamenes[0].institucion".to_string()],
            false,
            true,
            &[],
        );
        assert!(prompt.contains("Folio real: 1782486"));
        assert!(prompt.contains("Comprador: Juan Perez"));
        assert!(prompt.contains("Cónyuge de comprador: Ana Lopez"));
        assert!(prompt.contains("Vendedor: Maria Ruiz"));
        assert!(prompt.contains("Institución de crédito: BBVA"));
        assert!(prompt.contains("Dato prioritario a resolver: gravamenes[0].institucion"));
    }

    #[test]
    fn empty_context_does_not_panic() {
        let prompt = generate_user_prompt(
            &PreavisoContext::default(),
            &[],
            &[],
            true,
            true,
            &[],
        );
        assert!(prompt.contains("Todos los datos requeridos están completos."));
        assert!(!prompt.contains("Folio real"));
    }

    #[test]
    fn history_is_capped_to_recent_turns() {
        let history: Vec<ConversationTurn> = (0..10)
            .map(|i| ConversationTurn {
                role: "user".to_string(),
                content: format!("turno {}", i),
            })
            .collect();
        let prompt = generate_user_prompt(
            &PreavisoContext::default(),
            &history,
            &[],
            true,
            false,
            &[],
        );
        assert!(!prompt.contains("turno 3"));
        assert!(prompt.contains("turno 4"));
        assert!(prompt.contains("turno 9"));
    }

    #[test]
    fn deterministic_assembly() {
        let missing = vec!["inmueble.seccion".to_string(), "inmueble.partida".to_string()];
        let notes = vec!["El cliente enviará el plano mañana.".to_string()];
        let a = generate_user_prompt(&sample_context(), &[], &missing, false, true, &notes);
        let b = generate_user_prompt(&sample_context(), &[], &missing, false, true, &notes);
        assert_eq!(a, b);
        assert!(a.contains("Otros datos pendientes: inmueble.partida"));
        assert!(a.contains("Notas adicionales"));
    }
}

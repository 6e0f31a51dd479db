//! Preaviso wizard state computation.
//!
//! A pure function of the legal-data context: walks the required-field
//! schema in a fixed, documented order and reports every missing path, the
//! wizard stage that owns the first one, and any domain-rule violations
//! that block finalization outright.
//!
//! # Evaluation order
//!
//! 1. Property: `inmueble.folio_real`, `inmueble.seccion`, `inmueble.partida`
//! 2. Buyers: per party, name and civil status; spouse name when married
//! 3. Sellers: same sub-schema
//! 4. Credits (when the credit stage applies): institution and number per
//!    credit; lien institution per declared `gravamen`
//! 5. Notarial acts: at least one act with a type
//!
//! The first missing path in this order is the priority the prompt builder
//! surfaces, so the order is part of the public contract and is pinned by
//! tests.

use crate::context::{filled, Parte, PreavisoContext};
use crate::error::CoreError;
use crate::models::{PreavisoState, StateStatus};

pub const STAGE_PROPERTY: &str = "collecting_property_data";
pub const STAGE_BUYERS: &str = "collecting_buyer_data";
pub const STAGE_SELLERS: &str = "collecting_seller_data";
pub const STAGE_CREDITS: &str = "collecting_credit_data";
pub const STAGE_ACTS: &str = "collecting_acts_data";
pub const STAGE_READY: &str = "ready_to_finalize";

/// Compute the wizard state for a context. Never mutates its input.
pub fn compute_preaviso_state(ctx: &PreavisoContext) -> PreavisoState {
    let missing = required_missing(ctx);
    let blocking: Vec<String> = blocking_rules(ctx)
        .into_iter()
        .map(|(_, message)| message)
        .collect();

    let current_state = missing
        .first()
        .map(|(stage, _)| *stage)
        .unwrap_or(STAGE_READY)
        .to_string();

    let state_status = if !blocking.is_empty() {
        StateStatus::Blocked
    } else if missing.is_empty() {
        StateStatus::Complete
    } else {
        StateStatus::Incomplete
    };

    PreavisoState {
        current_state,
        state_status,
        required_missing: missing.into_iter().map(|(_, path)| path).collect(),
        blocking_reasons: blocking,
    }
}

/// Finalize-path gate: domain-rule violations surface as `DomainRule` with
/// a machine-readable code; incomplete data surfaces as `Validation`.
pub fn validate_for_finalize(ctx: &PreavisoContext) -> Result<(), CoreError> {
    if let Some((code, message)) = blocking_rules(ctx).into_iter().next() {
        return Err(CoreError::DomainRule { code, message });
    }
    let missing = required_missing(ctx);
    if let Some((_, path)) = missing.first() {
        return Err(CoreError::Validation(format!(
            "faltan {} dato(s) requerido(s); primero: {}",
            missing.len(),
            path
        )));
    }
    Ok(())
}

fn required_missing(ctx: &PreavisoContext) -> Vec<(&'static str, String)> {
    let mut missing = Vec::new();

    // 1. Property.
    let inmueble = ctx.inmueble.as_ref();
    for (field, value) in [
        ("folio_real", inmueble.and_then(|i| i.folio_real.clone())),
        ("seccion", inmueble.and_then(|i| i.seccion.clone())),
        ("partida", inmueble.and_then(|i| i.partida.clone())),
    ] {
        if !filled(&value) {
            missing.push((STAGE_PROPERTY, format!("inmueble.{}", field)));
        }
    }

    // 2. Buyers, 3. Sellers.
    party_missing(&ctx.compradores, "compradores", STAGE_BUYERS, &mut missing);
    party_missing(&ctx.vendedores, "vendedores", STAGE_SELLERS, &mut missing);

    // 4. Credits and liens.
    if ctx.credit_stage_required() {
        if ctx.creditos.is_empty() {
            missing.push((STAGE_CREDITS, "creditos[0].institucion".to_string()));
        }
        for (i, credito) in ctx.creditos.iter().enumerate() {
            if !filled(&credito.institucion) {
                missing.push((STAGE_CREDITS, format!("creditos[{}].institucion", i)));
            }
            if !filled(&credito.numero_credito) {
                missing.push((STAGE_CREDITS, format!("creditos[{}].numero_credito", i)));
            }
        }
    }
    for (i, gravamen) in ctx.gravamenes.iter().enumerate() {
        if !filled(&gravamen.institucion) {
            missing.push((STAGE_CREDITS, format!("gravamenes[{}].institucion", i)));
        }
    }

    // 5. Notarial acts.
    if ctx.actos.is_empty() {
        missing.push((STAGE_ACTS, "actos[0].tipo_acto".to_string()));
    } else {
        for (i, acto) in ctx.actos.iter().enumerate() {
            if !filled(&acto.tipo_acto) {
                missing.push((STAGE_ACTS, format!("actos[{}].tipo_acto", i)));
            }
        }
    }

    missing
}

fn party_missing(
    partes: &[Parte],
    prefix: &str,
    stage: &'static str,
    missing: &mut Vec<(&'static str, String)>,
) {
    if partes.is_empty() {
        missing.push((stage, format!("{}[0].persona_fisica.nombre", prefix)));
        return;
    }
    for (i, parte) in partes.iter().enumerate() {
        if let Some(moral) = &parte.persona_moral {
            if !filled(&moral.razon_social) {
                missing.push((stage, format!("{}[{}].persona_moral.razon_social", prefix, i)));
            }
            continue;
        }
        let fisica = parte.persona_fisica.as_ref();
        if !filled(&fisica.and_then(|p| p.nombre.clone())) {
            missing.push((stage, format!("{}[{}].persona_fisica.nombre", prefix, i)));
        }
        let estado_civil = fisica.and_then(|p| p.estado_civil.clone());
        if !filled(&estado_civil) {
            missing.push((
                stage,
                format!("{}[{}].persona_fisica.estado_civil", prefix, i),
            ));
        }
        if estado_civil.as_deref().map(str::trim) == Some("casado") {
            let conyuge_nombre = fisica
                .and_then(|p| p.conyuge.as_ref())
                .and_then(|c| c.nombre.clone());
            if !filled(&conyuge_nombre) {
                missing.push((
                    stage,
                    format!("{}[{}].persona_fisica.conyuge.nombre", prefix, i),
                ));
            }
        }
    }
}

/// Domain rules independent of field completeness. Ordered; the first hit
/// is the one `validate_for_finalize` reports.
fn blocking_rules(ctx: &PreavisoContext) -> Vec<(&'static str, String)> {
    let mut reasons = Vec::new();

    if ctx.tiene_credito == Some(false) && !ctx.creditos.is_empty() {
        reasons.push((
            "credit_flag_contradiction",
            "tiene_credito es falso pero el contexto declara creditos".to_string(),
        ));
    }

    for (list, prefix) in [(&ctx.compradores, "compradores"), (&ctx.vendedores, "vendedores")] {
        for (i, parte) in list.iter().enumerate() {
            if let Some(fisica) = &parte.persona_fisica {
                let casado = fisica.estado_civil.as_deref().map(str::trim) == Some("casado");
                if fisica.conyuge.is_some() && filled(&fisica.estado_civil) && !casado {
                    reasons.push((
                        "spouse_without_marriage",
                        format!(
                            "{}[{}] declara conyuge con estado civil '{}'",
                            prefix,
                            i,
                            fisica.estado_civil.as_deref().unwrap_or_default().trim()
                        ),
                    ));
                }
            }
        }
    }

    reasons
}

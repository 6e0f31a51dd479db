//! Explicit optional-field schema for the preaviso legal data graph.
//!
//! The wizard receives a partially-filled JSON context: buyer/spouse/credit
//! sub-objects may or may not exist at any point of the conversation. Every
//! field is therefore optional at the type level, and "present but blank"
//! is treated the same as absent (see [`filled`]). The required-field walk
//! in `state` is what decides which absences matter.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PreavisoContext {
    pub inmueble: Option<Inmueble>,
    pub compradores: Vec<Parte>,
    pub vendedores: Vec<Parte>,
    /// Declared credit flag. `None` = not asked yet; the credit stage is
    /// also required when `creditos` is non-empty.
    pub tiene_credito: Option<bool>,
    pub creditos: Vec<Credito>,
    pub gravamenes: Vec<Gravamen>,
    pub actos: Vec<Acto>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Inmueble {
    pub folio_real: Option<String>,
    pub seccion: Option<String>,
    pub partida: Option<String>,
    pub direccion: Option<String>,
}

/// One party to the operation: a natural person or a legal entity.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Parte {
    pub persona_fisica: Option<PersonaFisica>,
    pub persona_moral: Option<PersonaMoral>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PersonaFisica {
    pub nombre: Option<String>,
    /// `"casado"`, `"soltero"`, ... Spouse data is required only when
    /// `casado`.
    pub estado_civil: Option<String>,
    pub conyuge: Option<Conyuge>,
    pub curp: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Conyuge {
    pub nombre: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PersonaMoral {
    pub razon_social: Option<String>,
    pub rfc: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Credito {
    pub institucion: Option<String>,
    pub numero_credito: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Gravamen {
    pub institucion: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Acto {
    pub tipo_acto: Option<String>,
}

impl PreavisoContext {
    /// Parse a raw JSON context as received from the wizard-state API.
    /// Unknown keys are ignored; a non-object payload fails loudly.
    pub fn from_value(value: serde_json::Value) -> Result<Self, CoreError> {
        if !value.is_object() {
            return Err(CoreError::Validation(
                "preaviso context must be a JSON object".to_string(),
            ));
        }
        serde_json::from_value(value)
            .map_err(|e| CoreError::Validation(format!("malformed preaviso context: {}", e)))
    }

    /// Whether the credit data stage applies to this context.
    pub fn credit_stage_required(&self) -> bool {
        self.tiene_credito == Some(true) || !self.creditos.is_empty()
    }
}

/// True when an optional string field carries a non-blank value.
pub fn filled(field: &Option<String>) -> bool {
    field.as_deref().is_some_and(|s| !s.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_partial_context_with_unknown_keys() {
        let ctx = PreavisoContext::from_value(json!({
            "inmueble": { "folio_real": "1782486", "extra": 1 },
            "compradores": [ { "persona_fisica": { "nombre": "Juan Perez" } } ],
            "desconocido": true
        }))
        .unwrap();
        assert_eq!(
            ctx.inmueble.as_ref().unwrap().folio_real.as_deref(),
            Some("1782486")
        );
        assert_eq!(ctx.compradores.len(), 1);
        assert!(ctx.vendedores.is_empty());
    }

    #[test]
    fn rejects_non_object_payload() {
        let err = PreavisoContext::from_value(json!([1, 2, 3])).unwrap_err();
        assert!(matches!(err, CoreError::Validation(_)));
    }

    #[test]
    fn blank_strings_count_as_absent() {
        assert!(!filled(&Some("   ".to_string())));
        assert!(!filled(&None));
        assert!(filled(&Some("1782486".to_string())));
    }
}

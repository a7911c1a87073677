//! Field redaction with a sealed side-channel for the original handler.

use serde_json::{Map, Value};

const REDACTED_PLACEHOLDER: &str = "[REDACTED]";

/// The original values of every redacted field, keyed by field name.
/// Only the original handler is handed this; plugins only ever see the
/// redacted `args` that replace the real values in the shared context.
#[derive(Debug, Clone, Default)]
pub struct RedactionSeal {
    original: Map<String, Value>,
}

impl RedactionSeal {
    /// Re-apply the sealed original values onto a (possibly redacted)
    /// args map, producing the view the original handler receives.
    pub fn unseal(&self, mut args: Map<String, Value>) -> Map<String, Value> {
        for (key, value) in &self.original {
            args.insert(key.clone(), value.clone());
        }
        args
    }

    /// Whether any field was actually redacted.
    pub fn is_empty(&self) -> bool {
        self.original.is_empty()
    }
}

/// Replace each key in `fields` (case-sensitive, exact match) with the
/// literal string `"[REDACTED]"`, returning the redacted copy plus a seal
/// carrying the real values for later `unseal`ing.
pub fn redact(args: &Map<String, Value>, fields: &[String]) -> (Map<String, Value>, RedactionSeal) {
    let mut redacted = args.clone();
    let mut original = Map::new();
    for field in fields {
        if let Some(value) = args.get(field) {
            original.insert(field.clone(), value.clone());
            redacted.insert(field.clone(), Value::String(REDACTED_PLACEHOLDER.to_string()));
        }
    }
    (redacted, RedactionSeal { original })
}

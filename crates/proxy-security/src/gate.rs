//! `SecurityGate`: the single entry point the wrapper calls before the before phase.

use proxy_core::ProxyError;
use serde_json::Value;

use crate::redaction::{redact, RedactionSeal};
use crate::schema::validate_args;

/// Configuration derived from `WrapOptions.security`.
#[derive(Debug, Clone, Default)]
pub struct SecurityConfig {
    /// Whether to run schema-shape validation at all.
    pub validate_inputs: bool,
    /// Field names to redact from the view plugins see (case-sensitive).
    pub redact_fields: Vec<String>,
    /// Wall-clock cap (ms) for the whole before+handler+after sequence.
    pub max_execution_time_ms: Option<u64>,
}

/// The outcome of running a call's arguments through the gate.
pub struct GateOutcome {
    /// The view plugins and the before/after phases operate on.
    pub redacted_args: serde_json::Map<String, Value>,
    /// Carries the real values back for the original handler.
    pub seal: RedactionSeal,
}

/// Validate and redact incoming arguments. Returns `Err` immediately — no
/// plugin hook ever sees arguments that fail schema validation.
pub fn run_gate(
    tool_name: &str,
    args: serde_json::Map<String, Value>,
    schema: &Value,
    config: &SecurityConfig,
) -> Result<GateOutcome, ProxyError> {
    if config.validate_inputs {
        validate_args(tool_name, &args, schema)?;
    }
    let (redacted_args, seal) = redact(&args, &config.redact_fields);
    Ok(GateOutcome { redacted_args, seal })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn validation_failure_short_circuits_before_redaction() {
        let schema = json!({"type": "object", "required": ["password"]});
        let config = SecurityConfig {
            validate_inputs: true,
            redact_fields: vec!["password".to_string()],
            max_execution_time_ms: None,
        };
        let args = json!({}).as_object().unwrap().clone();
        let err = run_gate("login", args, &schema, &config).unwrap_err();
        assert!(matches!(err, ProxyError::Validation { .. }));
    }

    #[test]
    fn redacts_after_passing_validation() {
        let schema = json!({"type": "object", "required": ["user", "password"]});
        let config = SecurityConfig {
            validate_inputs: true,
            redact_fields: vec!["password".to_string()],
            max_execution_time_ms: None,
        };
        let args = json!({"user": "u", "password": "p"}).as_object().unwrap().clone();
        let outcome = run_gate("login", args, &schema, &config).unwrap();
        assert_eq!(outcome.redacted_args.get("password"), Some(&json!("[REDACTED]")));
        assert!(!outcome.seal.is_empty());
    }
}

//! Basic schema-shape validation: required fields present, declared types
//! roughly match. This deliberately stops short of full JSON
//! Schema (no `$ref`, `oneOf`, formats, …) — the underlying MCP server
//! already validated arguments against the tool's full schema before the
//! call reached the wrapper; this is a second, cheap gate that lets a
//! plugin author catch obviously-wrong input before it reaches a hook.

use proxy_core::ProxyError;
use serde_json::Value;

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn matches_declared_type(value: &Value, declared: &str) -> bool {
    match declared {
        "integer" => value.as_i64().is_some() || value.as_u64().is_some(),
        "number" => matches!(value, Value::Number(_)),
        "string" => matches!(value, Value::String(_)),
        "boolean" => matches!(value, Value::Bool(_)),
        "array" => matches!(value, Value::Array(_)),
        "object" => matches!(value, Value::Object(_)),
        "null" => matches!(value, Value::Null),
        _ => true, // unknown/unsupported declared type: don't block on it
    }
}

/// Validate `args` against a tool's declared schema.
///
/// `schema` is expected in the shape `{"type": "object", "required": [...],
/// "properties": {"field": {"type": "string", ...}, ...}}`; any other shape
/// (or a schema that omits `properties`/`required`) is treated as
/// unconstrained and always passes.
pub fn validate_args(tool_name: &str, args: &serde_json::Map<String, Value>, schema: &Value) -> Result<(), ProxyError> {
    let Some(schema_obj) = schema.as_object() else {
        return Ok(());
    };

    if let Some(required) = schema_obj.get("required").and_then(Value::as_array) {
        for field in required {
            let Some(field_name) = field.as_str() else { continue };
            if !args.contains_key(field_name) {
                return Err(ProxyError::Validation {
                    tool_name: tool_name.to_string(),
                    message: format!("missing required field `{field_name}`"),
                });
            }
        }
    }

    if let Some(properties) = schema_obj.get("properties").and_then(Value::as_object) {
        for (field_name, field_schema) in properties {
            let Some(value) = args.get(field_name) else { continue };
            let Some(declared) = field_schema.get("type").and_then(Value::as_str) else { continue };
            if !matches_declared_type(value, declared) {
                return Err(ProxyError::Validation {
                    tool_name: tool_name.to_string(),
                    message: format!(
                        "field `{field_name}` has type `{}`, expected `{declared}`",
                        type_name(value)
                    ),
                });
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn obj(value: Value) -> serde_json::Map<String, Value> {
        value.as_object().unwrap().clone()
    }

    #[test]
    fn rejects_missing_required_field() {
        let schema = json!({"type": "object", "required": ["user"], "properties": {"user": {"type": "string"}}});
        let args = obj(json!({}));
        let err = validate_args("login", &args, &schema).unwrap_err();
        assert!(matches!(err, ProxyError::Validation { .. }));
    }

    #[test]
    fn rejects_wrong_type() {
        let schema = json!({"type": "object", "properties": {"age": {"type": "integer"}}});
        let args = obj(json!({"age": "thirty"}));
        assert!(validate_args("signup", &args, &schema).is_err());
    }

    #[test]
    fn accepts_well_formed_args() {
        let schema = json!({"type": "object", "required": ["user"], "properties": {"user": {"type": "string"}, "age": {"type": "integer"}}});
        let args = obj(json!({"user": "ana", "age": 30}));
        assert!(validate_args("signup", &args, &schema).is_ok());
    }

    #[test]
    fn unconstrained_schema_always_passes() {
        let args = obj(json!({"anything": true}));
        assert!(validate_args("noop", &args, &Value::Null).is_ok());
    }
}

//! Field readers for untyped input
//!
//! Descriptors and hyperparameters can arrive as `serde_json::Value` (directly,
//! or through a TOML study file). These readers enforce the kind of each field
//! and report [`SimError::Type`] for the wrong kind. Range checks are left to
//! the typed constructors, which report [`SimError::Value`].

use serde_json::{Map, Value};

use crate::error::{Result, SimError};

/// Describe the JSON kind of a value for error messages.
pub fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(n) if n.is_f64() => "float",
        Value::Number(_) => "integer",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Interpret `value` as an object.
pub fn as_object<'a>(value: &'a Value, what: &str) -> Result<&'a Map<String, Value>> {
    value
        .as_object()
        .ok_or_else(|| SimError::Type(format!("{what} must be an object, got {}", kind_of(value))))
}

/// Interpret `value` as an array.
pub fn as_array<'a>(value: &'a Value, what: &str) -> Result<&'a Vec<Value>> {
    value
        .as_array()
        .ok_or_else(|| SimError::Type(format!("{what} must be an array, got {}", kind_of(value))))
}

fn required<'a>(map: &'a Map<String, Value>, field: &str) -> Result<&'a Value> {
    map.get(field)
        .ok_or_else(|| SimError::Type(format!("missing field `{field}`")))
}

/// Read a required string field.
pub fn str_field(map: &Map<String, Value>, field: &str) -> Result<String> {
    match required(map, field)? {
        Value::String(s) => Ok(s.clone()),
        other => Err(SimError::Type(format!(
            "`{field}` must be a string, got {}",
            kind_of(other)
        ))),
    }
}

/// Interpret `value` as an integer. Floats are rejected even when integral.
pub fn as_int(value: &Value, field: &str) -> Result<i64> {
    match value {
        Value::Number(n) if !n.is_f64() => n.as_i64().ok_or_else(|| {
            SimError::Value(format!("`{field}` is out of the representable range"))
        }),
        other => Err(SimError::Type(format!(
            "`{field}` must be an integer, got {}",
            kind_of(other)
        ))),
    }
}

/// Read a required integer field.
pub fn int_field(map: &Map<String, Value>, field: &str) -> Result<i64> {
    as_int(required(map, field)?, field)
}

/// Interpret `value` as a float. Integer literals are rejected.
pub fn as_float(value: &Value, field: &str) -> Result<f64> {
    match value {
        Value::Number(n) if n.is_f64() => n
            .as_f64()
            .ok_or_else(|| SimError::Type(format!("`{field}` must be a float"))),
        other => Err(SimError::Type(format!(
            "`{field}` must be a float, got {}",
            kind_of(other)
        ))),
    }
}

/// Read an optional float field; absent or `null` yields `None`.
pub fn opt_float_field(map: &Map<String, Value>, field: &str) -> Result<Option<f64>> {
    match map.get(field) {
        None | Some(Value::Null) => Ok(None),
        Some(value) => as_float(value, field).map(Some),
    }
}

/// Read an optional integer field; absent or `null` yields `None`.
pub fn opt_int_field(map: &Map<String, Value>, field: &str) -> Result<Option<i64>> {
    match map.get(field) {
        None | Some(Value::Null) => Ok(None),
        Some(value) => as_int(value, field).map(Some),
    }
}

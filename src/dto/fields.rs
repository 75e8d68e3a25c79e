//! Field access over decoded JSON bodies.
//!
//! Absent and `null` both count as missing. Present values of the wrong type
//! are malformed rather than missing.

use serde_json::{Map, Value};

use crate::error::{OrderError, OrderResult};

pub type Fields = Map<String, Value>;

pub fn as_object<'a>(raw: &'a Value, what: &str) -> OrderResult<&'a Fields> {
    raw.as_object().ok_or_else(|| {
        OrderError::MalformedPayload(format!(
            "{what} body must be a JSON object, got {}",
            kind_of(raw)
        ))
    })
}

pub fn present<'a>(fields: &'a Fields, name: &str) -> Option<&'a Value> {
    fields.get(name).filter(|value| !value.is_null())
}

pub fn required_int(fields: &Fields, name: &str) -> OrderResult<i32> {
    match present(fields, name) {
        Some(value) => to_int(value, name),
        None => Err(OrderError::MissingField(name.to_string())),
    }
}

pub fn optional_int(fields: &Fields, name: &str) -> OrderResult<Option<i32>> {
    present(fields, name).map(|value| to_int(value, name)).transpose()
}

fn to_int(value: &Value, name: &str) -> OrderResult<i32> {
    value
        .as_i64()
        .and_then(|n| i32::try_from(n).ok())
        .ok_or_else(|| {
            OrderError::MalformedPayload(format!(
                "{name} must be a 32-bit integer, got {}",
                kind_of(value)
            ))
        })
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

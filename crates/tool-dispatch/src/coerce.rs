//! Lenient parameter coercion.
//!
//! Agents sometimes send `"3"` for an integer, `"true"` for a boolean or a
//! JSON-encoded string for an array. Values are converted only when the
//! declared schema type asks for it and the conversion is lossless; anything
//! else is passed through for the typed deserializer to reject.

use serde_json::{Map, Number, Value};

/// Coerce the top-level properties of `params` against an object schema.
pub fn coerce_params(schema: &Value, params: Value) -> Value {
    let Value::Object(object) = params else {
        return params;
    };
    let Some(properties) = schema.get("properties").and_then(Value::as_object) else {
        return Value::Object(object);
    };

    let coerced: Map<String, Value> = object
        .into_iter()
        .map(|(name, value)| match properties.get(&name) {
            Some(property) => {
                let value = coerce_value(property, value);
                (name, value)
            }
            None => (name, value),
        })
        .collect();
    Value::Object(coerced)
}

fn coerce_value(schema: &Value, value: Value) -> Value {
    if value.is_null() {
        return value;
    }
    if declares(schema, "integer") {
        return coerce_integer(value);
    }
    if declares(schema, "number") {
        return coerce_number(value);
    }
    if declares(schema, "boolean") {
        return coerce_boolean(value);
    }
    if declares(schema, "array") {
        let items = schema.get("items").cloned().unwrap_or(Value::Null);
        return coerce_array(&items, value);
    }
    if declares(schema, "object") {
        return coerce_params(schema, value);
    }
    value
}

fn declares(schema: &Value, kind: &str) -> bool {
    match schema.get("type") {
        Some(Value::String(declared)) => declared == kind,
        Some(Value::Array(declared)) => declared.iter().any(|d| d.as_str() == Some(kind)),
        _ => false,
    }
}

fn coerce_integer(value: Value) -> Value {
    match &value {
        Value::String(raw) => {
            let raw = raw.trim();
            if let Ok(parsed) = raw.parse::<i64>() {
                return Value::Number(parsed.into());
            }
            match raw.parse::<f64>() {
                Ok(parsed) if parsed.fract() == 0.0 && parsed.abs() < i64::MAX as f64 => {
                    Value::Number((parsed as i64).into())
                }
                _ => value,
            }
        }
        Value::Number(number) => match number.as_f64() {
            Some(parsed) if !number.is_i64() && !number.is_u64() && parsed.fract() == 0.0 => {
                Value::Number((parsed as i64).into())
            }
            _ => value,
        },
        _ => value,
    }
}

fn coerce_number(value: Value) -> Value {
    match &value {
        Value::String(raw) => raw
            .trim()
            .parse::<f64>()
            .ok()
            .and_then(Number::from_f64)
            .map(Value::Number)
            .unwrap_or(value),
        _ => value,
    }
}

fn coerce_boolean(value: Value) -> Value {
    match &value {
        Value::String(raw) => match raw.trim().to_ascii_lowercase().as_str() {
            "true" => Value::Bool(true),
            "false" => Value::Bool(false),
            _ => value,
        },
        _ => value,
    }
}

fn coerce_array(items: &Value, value: Value) -> Value {
    let value = match value {
        Value::String(raw) => match serde_json::from_str::<Value>(raw.trim()) {
            Ok(parsed @ Value::Array(_)) => parsed,
            _ => Value::String(raw),
        },
        other => other,
    };
    match value {
        Value::Array(elements) => Value::Array(
            elements
                .into_iter()
                .map(|element| coerce_value(items, element))
                .collect(),
        ),
        other => other,
    }
}

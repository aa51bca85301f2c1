//! Parameter extraction with explicit defaulting.
//!
//! Several numeric fields fall back to a default instead of failing the
//! request.  Each fallback is spelled out here rather than left to a
//! catch-all.

use serde_json::{Map, Value};

use crate::session::{DEFAULT_SESSION, SessionId};

/// Shape of an optional field in a params object.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Field<'a> {
    Missing,
    Null,
    Number(f64),
    /// Present with a non-numeric, non-null value.
    Other(&'a Value),
}

impl<'a> Field<'a> {
    pub fn of(obj: &'a Map<String, Value>, key: &str) -> Self {
        match obj.get(key) {
            None => Self::Missing,
            Some(Value::Null) => Self::Null,
            Some(v @ Value::Number(n)) => n.as_f64().map_or(Self::Other(v), Self::Number),
            Some(other) => Self::Other(other),
        }
    }
}

/// `session-id` from a params object.  Absent, non-numeric, or out-of-range
/// values select [`DEFAULT_SESSION`]; fractions are truncated.
pub fn session_id(obj: &Map<String, Value>) -> SessionId {
    match Field::of(obj, "session-id") {
        Field::Number(n) => truncate_i32(n).unwrap_or(DEFAULT_SESSION),
        _ => DEFAULT_SESSION,
    }
}

/// `session-id` when params may be absent or of any shape.
pub fn session_id_of(params: Option<&Value>) -> SessionId {
    params
        .and_then(Value::as_object)
        .map_or(DEFAULT_SESSION, session_id)
}

/// `latency` from a sensor descriptor.  Anything but a JSON number is `0.0`.
pub fn latency(obj: &Map<String, Value>) -> f64 {
    match Field::of(obj, "latency") {
        Field::Number(n) if n.is_finite() => n,
        _ => 0.0,
    }
}

/// Text of a scalar field: strings as-is, numbers and booleans in their JSON
/// form.  Arrays, objects, and null yield `None`.
pub fn scalar_text(node: Option<&Value>) -> Option<String> {
    match node? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    }
}

/// Truncate toward zero into `i32`; `None` when out of range.
pub fn truncate_i32(n: f64) -> Option<i32> {
    let t = n.trunc();
    if t.is_finite() && t >= f64::from(i32::MIN) && t <= f64::from(i32::MAX) {
        Some(t as i32)
    } else {
        None
    }
}

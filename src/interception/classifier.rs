// src/interception/classifier.rs
//! Value classification
//!
//! Decides whether a value is wrapped (objects, callables), serialized
//! structurally (objects) or passed through untouched (everything else).

use crate::host::Value;

/// Coarse value category
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    /// Booleans, numbers, BigInts, strings, symbols
    Primitive,

    /// Functions
    Callable,

    /// Non-callable objects, arrays included
    Object,

    /// `undefined` and `null`
    Nullish,
}

/// Classify `value`; total and side-effect free
pub fn classify(value: &Value) -> ValueKind {
    match value {
        Value::Undefined | Value::Null => ValueKind::Nullish,
        Value::Function(_) => ValueKind::Callable,
        Value::Object(_) => ValueKind::Object,
        Value::Bool(_)
        | Value::Number(_)
        | Value::BigInt(_)
        | Value::Str(_)
        | Value::Symbol(_) => ValueKind::Primitive,
    }
}

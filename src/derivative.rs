// Copyright 2022 VMware, Inc.
// SPDX-License-Identifier: MIT
//! Derivative equality over serialized objects.
//!
//! `expected` is what the controller renders; `actual` is what the API server
//! returns after defaulting. Fields left unset in `expected` (null, empty
//! strings, empty maps and lists) are ignored, every field that is set must
//! match. A list matches when every expected element matches the actual element
//! at the same index; trailing actual elements, such as an env var or sidecar
//! injected by a webhook, are ignored.
use serde::Serialize;
use serde_json::Value;

pub fn is_derivative(expected: &Value, actual: &Value) -> bool {
    match (expected, actual) {
        (Value::Null, _) => true,
        (Value::String(e), _) if e.is_empty() => true,
        (Value::Object(e), _) if e.is_empty() => true,
        (Value::Array(e), _) if e.is_empty() => true,
        (Value::Object(e), Value::Object(a)) => e
            .iter()
            .all(|(field, ev)| is_derivative(ev, a.get(field).unwrap_or(&Value::Null))),
        (Value::Array(e), Value::Array(a)) => {
            e.len() <= a.len() && e.iter().zip(a).all(|(ev, av)| is_derivative(ev, av))
        }
        (e, a) => e == a,
    }
}

/// Serializes both sides and compares them with [`is_derivative`].
pub fn is_derivative_of<T: Serialize>(
    expected: &T,
    actual: &T,
) -> Result<bool, serde_json::Error> {
    Ok(is_derivative(
        &serde_json::to_value(expected)?,
        &serde_json::to_value(actual)?,
    ))
}

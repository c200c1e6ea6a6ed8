//! Fibpipe Kernel: Canonical Hashing
//!
//! Deterministic canonical serialization + SHA-256 of a trace.
//! Produces byte-identical output across platforms.
//!
//! Rules:
//!   - Top-level field order: kernel_version, origin, stages, entries
//!   - Origin field order: a, b, index
//!   - Entry field order: index, value, output
//!   - Integers other than index and version are decimal strings
//!   - UTF-8 JSON, no whitespace

use serde_json::{Map, Value};
use sha2::{Digest, Sha256};

use crate::trace::Trace;

/// Canonical serialization of a trace to UTF-8 JSON bytes.
pub fn canonical_serialize(trace: &Trace) -> Vec<u8> {
    build_canonical_value(trace).to_string().into_bytes()
}

/// SHA-256 of the canonical serialization. Lowercase hex.
pub fn canonical_hash(trace: &Trace) -> String {
    let digest = Sha256::digest(canonical_serialize(trace));
    digest.iter().map(|b| format!("{:02x}", b)).collect()
}

/// Built field by field so the order does not depend on `json!` internals.
fn build_canonical_value(trace: &Trace) -> Value {
    let entries: Vec<Value> = trace
        .entries
        .iter()
        .map(|e| {
            let mut entry = Map::new();
            entry.insert("index".to_string(), Value::Number(e.index.into()));
            entry.insert("value".to_string(), Value::String(e.value.to_string()));
            entry.insert(
                "output".to_string(),
                e.output
                    .as_ref()
                    .map_or(Value::Null, |o| Value::String(o.to_string())),
            );
            Value::Object(entry)
        })
        .collect();

    let mut origin = Map::new();
    origin.insert("a".to_string(), Value::String(trace.origin.a.clone()));
    origin.insert("b".to_string(), Value::String(trace.origin.b.clone()));
    origin.insert("index".to_string(), Value::Number(trace.origin.index.into()));

    let mut root = Map::new();
    root.insert(
        "kernel_version".to_string(),
        Value::Number(trace.kernel_version.into()),
    );
    root.insert("origin".to_string(), Value::Object(origin));
    root.insert(
        "stages".to_string(),
        Value::Array(trace.stages.iter().cloned().map(Value::String).collect()),
    );
    root.insert("entries".to_string(), Value::Array(entries));
    Value::Object(root)
}

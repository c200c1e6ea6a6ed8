//! Fibpipe Kernel: Run Traces
//!
//! A trace records every value a driver pulled and, when a pipeline was
//! attached, what the pipeline made of it. Traces are plain data; all
//! integers leave the process as decimal strings so no precision is lost.

use num_bigint::{BigInt, BigUint};
use serde_json::Value;

use crate::source::SourceState;
use crate::KERNEL_VERSION;

/// One pulled value and its pipeline output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TraceEntry {
    pub index: u64,
    pub value: BigUint,
    pub output: Option<BigInt>,
}

impl TraceEntry {
    pub fn to_value(&self) -> Value {
        serde_json::json!({
            "index": self.index,
            "value": self.value.to_string(),
            "output": self.output.as_ref().map(|o| o.to_string()),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Trace {
    pub kernel_version: u32,
    /// Source state before the first entry was pulled.
    pub origin: SourceState,
    pub stages: Vec<String>,
    pub entries: Vec<TraceEntry>,
}

impl Trace {
    pub fn new(origin: SourceState, stages: Vec<String>) -> Self {
        Self {
            kernel_version: KERNEL_VERSION,
            origin,
            stages,
            entries: Vec::new(),
        }
    }

    pub fn push(&mut self, entry: TraceEntry) {
        self.entries.push(entry);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn values(&self) -> impl Iterator<Item = &BigUint> {
        self.entries.iter().map(|e| &e.value)
    }

    pub fn outputs(&self) -> impl Iterator<Item = Option<&BigInt>> {
        self.entries.iter().map(|e| e.output.as_ref())
    }

    pub fn to_value(&self) -> Value {
        serde_json::json!({
            "kernel_version": self.kernel_version,
            "origin": self.origin,
            "stages": self.stages,
            "entries": self.entries.iter().map(TraceEntry::to_value).collect::<Vec<_>>(),
        })
    }
}

//! Drift detection: determinism verification and trace comparison.

use thiserror::Error;
use tracing::warn;

use fibpipe_kernel::error::KernelError;
use fibpipe_kernel::trace::Trace;

use crate::replay;

#[derive(Debug, Error)]
pub enum DeterminismError {
    #[error("DETERMINISM FAILURE: two replays produced different hashes (run 1: {first}, run 2: {second})")]
    Diverged { first: String, second: String },

    #[error(transparent)]
    Kernel(#[from] KernelError),
}

/// Replay the same run twice and require identical hashes.
/// Returns the agreed hash.
pub fn verify_determinism<S: AsRef<str>>(
    count: u64,
    stages: &[S],
) -> Result<String, DeterminismError> {
    let first = replay::rebuild_hash(count, stages)?;
    let second = replay::rebuild_hash(count, stages)?;

    if first != second {
        warn!(%first, %second, "replays diverged");
        return Err(DeterminismError::Diverged { first, second });
    }
    Ok(first)
}

/// Position-by-position comparison of two traces.
pub fn compare_traces(trace_a: &Trace, trace_b: &Trace) -> DriftReport {
    let mut matching = 0;
    let mut differing = 0;
    let mut first_divergence = None;

    for (a, b) in trace_a.entries.iter().zip(&trace_b.entries) {
        if a == b {
            matching += 1;
        } else {
            differing += 1;
            first_divergence.get_or_insert(a.index);
        }
    }

    DriftReport {
        len_a: trace_a.len() as i64,
        len_b: trace_b.len() as i64,
        len_delta: trace_b.len() as i64 - trace_a.len() as i64,
        matching,
        differing,
        first_divergence,
        stages_match: trace_a.stages == trace_b.stages,
        origins_match: trace_a.origin == trace_b.origin,
    }
}

/// Structured drift report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DriftReport {
    pub len_a: i64,
    pub len_b: i64,
    pub len_delta: i64,
    /// Positions, within the shorter trace, whose entries are equal.
    pub matching: u64,
    pub differing: u64,
    /// `index` of the first differing entry of trace A.
    pub first_divergence: Option<u64>,
    pub stages_match: bool,
    pub origins_match: bool,
}

impl DriftReport {
    /// Same origin, same length, same stages, every entry equal.
    pub fn is_identical(&self) -> bool {
        self.len_delta == 0 && self.differing == 0 && self.stages_match && self.origins_match
    }
}

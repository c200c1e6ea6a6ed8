//! Replay orchestrator: rebuild a trace from its run parameters.
//!
//! Delegates everything to the kernel. No cached values.

use fibpipe_kernel::driver::Driver;
use fibpipe_kernel::error::KernelError;
use fibpipe_kernel::hashing::canonical_hash;
use fibpipe_kernel::sink::MemorySink;
use fibpipe_kernel::source::Fibonacci;
use fibpipe_kernel::stages::build_pipeline;
use fibpipe_kernel::trace::Trace;

/// Rebuild the trace of a fresh standard source pulled `count` times
/// through `stages`.
///
/// 1. Create a fresh driver
/// 2. Pull `count` values through the stages
/// 3. Return (trace, canonical_hash)
pub fn rebuild_trace<S: AsRef<str>>(
    count: u64,
    stages: &[S],
) -> Result<(Trace, String), KernelError> {
    let mut driver = Driver::new();
    if !stages.is_empty() {
        driver = driver.with_pipeline(build_pipeline(stages)?);
    }
    let trace = driver.run(count, &mut MemorySink::new())?;
    let hash = canonical_hash(&trace);
    Ok((trace, hash))
}

/// Rebuild and return only the canonical hash.
pub fn rebuild_hash<S: AsRef<str>>(count: u64, stages: &[S]) -> Result<String, KernelError> {
    let (_, hash) = rebuild_trace(count, stages)?;
    Ok(hash)
}

/// Reproduce a recorded trace from its own origin and stage list.
///
/// Follows the recorded entry indices: values consumed without being
/// recorded (a failed pipeline) are pulled again and skipped, so the
/// rebuilt trace lines up entry for entry.
pub fn replay(trace: &Trace) -> Result<(Trace, String), KernelError> {
    let mut driver = Driver::with_source(Fibonacci::from_state(&trace.origin)?);
    if !trace.stages.is_empty() {
        driver = driver.with_pipeline(build_pipeline(&trace.stages)?);
    }

    let mut rebuilt = driver.empty_trace();
    for entry in &trace.entries {
        driver.advance_to(entry.index)?;
        rebuilt.push(driver.step()?);
    }
    let hash = canonical_hash(&rebuilt);
    Ok((rebuilt, hash))
}

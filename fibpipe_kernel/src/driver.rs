//! Fibpipe Kernel: Driver
//!
//! Pulls from a source, threads each value through an optional pipeline
//! and hands the result to a sink before pulling the next one. Nothing is
//! computed ahead of the caller's request.

use num_bigint::BigInt;
use tracing::{debug, trace};

use crate::config::RunConfig;
use crate::error::KernelError;
use crate::sink::Sink;
use crate::source::{Fibonacci, LazySource};
use crate::stages::IntegerPipeline;
use crate::trace::{Trace, TraceEntry};

pub struct Driver {
    source: Fibonacci,
    pipeline: Option<IntegerPipeline>,
    stage_names: Vec<String>,
}

impl Driver {
    /// Standard source, no pipeline.
    pub fn new() -> Self {
        Self::with_source(Fibonacci::new())
    }

    pub fn with_source(source: Fibonacci) -> Self {
        Self {
            source,
            pipeline: None,
            stage_names: Vec::new(),
        }
    }

    pub fn with_pipeline(mut self, pipeline: IntegerPipeline) -> Self {
        self.stage_names = pipeline.names().map(str::to_string).collect();
        self.pipeline = Some(pipeline);
        self
    }

    pub fn from_config(config: &RunConfig) -> Result<Self, KernelError> {
        let driver = Self::with_source(config.source()?);
        Ok(match config.pipeline()? {
            Some(pipeline) => driver.with_pipeline(pipeline),
            None => driver,
        })
    }

    /// Number of values pulled so far.
    pub fn index(&self) -> u64 {
        self.source.index()
    }

    pub fn stage_names(&self) -> &[String] {
        &self.stage_names
    }

    /// An empty trace starting at the current source state.
    pub fn empty_trace(&self) -> Trace {
        Trace::new(self.source.state(), self.stage_names.clone())
    }

    /// Pull and discard values, untransformed, until the next pull is `index`.
    pub fn advance_to(&mut self, index: u64) -> Result<(), KernelError> {
        let current = self.source.index();
        if index < current {
            return Err(KernelError::Rewind {
                requested: index,
                current,
            });
        }
        for _ in current..index {
            self.source.pull();
        }
        Ok(())
    }

    /// Pull one value and transform it.
    ///
    /// On a stage failure the value has still been pulled; the next step
    /// continues with the following value.
    pub fn step(&mut self) -> Result<TraceEntry, KernelError> {
        let index = self.source.index();
        let value = self.source.pull();
        trace!(index, %value, "pulled");

        let output = match &self.pipeline {
            Some(pipeline) => Some(
                pipeline
                    .apply(BigInt::from(value.clone()))
                    .map_err(|source| KernelError::Stage { index, source })?,
            ),
            None => None,
        };

        Ok(TraceEntry {
            index,
            value,
            output,
        })
    }

    /// Pull `count` values, emitting each to `sink`. Stops at the first error.
    pub fn run<S: Sink + ?Sized>(
        &mut self,
        count: u64,
        sink: &mut S,
    ) -> Result<Trace, KernelError> {
        debug!(count, start = self.index(), stages = ?self.stage_names, "driving source");
        let mut trace = self.empty_trace();
        for _ in 0..count {
            let entry = self.step()?;
            sink.emit(&entry)?;
            trace.push(entry);
        }
        Ok(trace)
    }
}

impl Default for Driver {
    fn default() -> Self {
        Self::new()
    }
}

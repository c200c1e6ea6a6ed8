//! Session manager: a driver plus everything it has pulled so far.
//!
//! A source is single-owner. `SharedSession` serializes pulls behind a
//! Mutex, so several threads can draw from one source without
//! duplicating or skipping values.

use std::sync::Mutex;

use tracing::debug;

use fibpipe_kernel::config::RunConfig;
use fibpipe_kernel::driver::Driver;
use fibpipe_kernel::error::KernelError;
use fibpipe_kernel::hashing::canonical_hash;
use fibpipe_kernel::trace::{Trace, TraceEntry};

/// A driver and the trace of every value it produced.
pub struct Session {
    driver: Driver,
    trace: Trace,
}

impl Session {
    pub fn new(driver: Driver) -> Self {
        let trace = driver.empty_trace();
        Self { driver, trace }
    }

    pub fn from_config(config: &RunConfig) -> Result<Self, KernelError> {
        Ok(Self::new(Driver::from_config(config)?))
    }

    /// Pull one value and record it.
    ///
    /// A value whose pipeline fails is consumed but not recorded; the gap
    /// shows in the entry indices and replay skips over it.
    pub fn pull(&mut self) -> Result<TraceEntry, KernelError> {
        let entry = self.driver.step()?;
        self.trace.push(entry.clone());
        Ok(entry)
    }

    /// Pull up to `count` values, stopping at the first error.
    pub fn pull_many(&mut self, count: u64) -> Result<Vec<TraceEntry>, KernelError> {
        debug!(count, start = self.driver.index(), "session pull");
        (0..count).map(|_| self.pull()).collect()
    }

    pub fn trace(&self) -> &Trace {
        &self.trace
    }

    pub fn current_hash(&self) -> String {
        canonical_hash(&self.trace)
    }

    /// Number of values pulled from the source, recorded or not.
    pub fn index(&self) -> u64 {
        self.driver.index()
    }
}

/// Thread-safe session handle using Mutex.
pub struct SharedSession {
    inner: Mutex<Session>,
}

impl SharedSession {
    pub fn new(session: Session) -> Self {
        Self {
            inner: Mutex::new(session),
        }
    }

    /// Pull under lock.
    pub fn pull(&self) -> Result<TraceEntry, KernelError> {
        let mut session = self.inner.lock().expect("Session lock poisoned");
        session.pull()
    }

    /// Pull a contiguous batch under one lock.
    pub fn pull_many(&self, count: u64) -> Result<Vec<TraceEntry>, KernelError> {
        let mut session = self.inner.lock().expect("Session lock poisoned");
        session.pull_many(count)
    }

    pub fn current_hash(&self) -> String {
        let session = self.inner.lock().expect("Session lock poisoned");
        session.current_hash()
    }

    pub fn index(&self) -> u64 {
        let session = self.inner.lock().expect("Session lock poisoned");
        session.index()
    }

    pub fn into_inner(self) -> Session {
        self.inner.into_inner().expect("Session lock poisoned")
    }
}

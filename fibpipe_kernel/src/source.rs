//! Fibpipe Kernel: Lazy Sequence Sources
//!
//! Pull-based generators over the recurrence `(a, b) -> (b, a + b)`.
//! State advances exactly once per pull and never on its own.
//!
//! A handle is owned by one caller. To pull from one source on several
//! threads, wrap it in a lock (`fibpipe_runtime::session::SharedSession`).

use std::iter::FusedIterator;
use std::mem;

use num_bigint::BigUint;
use num_traits::{One, Zero};
use serde::{Deserialize, Serialize};

use crate::arithmetic::{exact_sum, parse_natural};
use crate::error::KernelError;

/// A source that yields one value per request and never runs dry.
pub trait LazySource {
    type Item;

    /// Emit the next value and advance.
    fn pull(&mut self) -> Self::Item;
}

/// Exact Fibonacci source. Every value is exact at any depth.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fibonacci {
    a: BigUint,
    b: BigUint,
    index: u64,
}

impl Fibonacci {
    /// Standard seed `(0, 1)`.
    pub fn new() -> Self {
        Self::seeded(BigUint::zero(), BigUint::one())
    }

    /// Same recurrence from a different seed, e.g. `(2, 1)` for Lucas numbers.
    pub fn seeded(a: BigUint, b: BigUint) -> Self {
        Self { a, b, index: 0 }
    }

    /// The value the next pull will return.
    pub fn peek(&self) -> &BigUint {
        &self.a
    }

    /// Number of values pulled so far.
    pub fn index(&self) -> u64 {
        self.index
    }

    pub fn state(&self) -> SourceState {
        SourceState {
            a: self.a.to_string(),
            b: self.b.to_string(),
            index: self.index,
        }
    }

    /// Resume a source captured with [`Fibonacci::state`].
    pub fn from_state(state: &SourceState) -> Result<Self, KernelError> {
        Ok(Self {
            a: parse_natural(&state.a)?,
            b: parse_natural(&state.b)?,
            index: state.index,
        })
    }
}

impl Default for Fibonacci {
    fn default() -> Self {
        Self::new()
    }
}

impl LazySource for Fibonacci {
    type Item = BigUint;

    fn pull(&mut self) -> BigUint {
        let following = exact_sum(&self.a, &self.b);
        let emitted = mem::replace(&mut self.a, mem::replace(&mut self.b, following));
        self.index += 1;
        emitted
    }
}

impl Iterator for Fibonacci {
    type Item = BigUint;

    fn next(&mut self) -> Option<BigUint> {
        Some(self.pull())
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (usize::MAX, None)
    }
}

impl FusedIterator for Fibonacci {}

/// Portable snapshot of a source. Values are decimal strings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceState {
    pub a: String,
    pub b: String,
    pub index: u64,
}

/// `u64` source for callers that accept a bounded depth.
///
/// Yields F(0) through F(93) (`MAX_U64_PULLS` values), then reports
/// `Overflow` on every further pull without advancing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NativeFibonacci {
    a: Option<u64>,
    b: Option<u64>,
    index: u64,
}

impl NativeFibonacci {
    pub fn new() -> Self {
        Self {
            a: Some(0),
            b: Some(1),
            index: 0,
        }
    }

    pub fn index(&self) -> u64 {
        self.index
    }

    pub fn try_pull(&mut self) -> Result<u64, KernelError> {
        let Some(emitted) = self.a else {
            return Err(KernelError::Overflow {
                index: self.index,
                target: "u64",
            });
        };
        let following = self.b.and_then(|b| b.checked_add(emitted));
        self.a = self.b;
        self.b = following;
        self.index += 1;
        Ok(emitted)
    }
}

impl Default for NativeFibonacci {
    fn default() -> Self {
        Self::new()
    }
}

impl LazySource for NativeFibonacci {
    type Item = Result<u64, KernelError>;

    fn pull(&mut self) -> Self::Item {
        self.try_pull()
    }
}

#![forbid(unsafe_code)]

//! Fibpipe Kernel
//!
//! A lazy, exact Fibonacci source and ordered transformation pipelines,
//! plus the pieces that drive them: a stage catalog, traces with canonical
//! hashes, sinks and run configuration.

/// Kernel v1. Embedded in every canonical trace, so a change in emitted
/// values or trace layout requires a new version.
pub const KERNEL_VERSION: u32 = 1;

pub mod arithmetic;
pub mod error;
pub mod source;
pub mod pipeline;
pub mod stages;
pub mod trace;
pub mod hashing;
pub mod sink;
pub mod config;
pub mod driver;

pub use error::KernelError;

#![forbid(unsafe_code)]

//! Fibpipe Runtime
//!
//! Wraps the kernel with sessions that may be shared across threads,
//! trace replay, and determinism and drift checks.
//!
//! No sequence or composition logic lives here; all of it is delegated
//! to `fibpipe_kernel`.

pub mod session;
pub mod replay;
pub mod drift;

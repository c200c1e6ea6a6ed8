//! Kernel error taxonomy.

use std::io;

use thiserror::Error;

use crate::pipeline::StageError;
use crate::stages::StageFault;

#[derive(Debug, Error)]
pub enum KernelError {
    /// A value no longer fits the native width the caller asked for.
    #[error("value at index {index} does not fit in {target}")]
    Overflow { index: u64, target: &'static str },

    #[error("unknown stage {0:?}")]
    UnknownStage(String),

    #[error("invalid stage {spec:?}: {reason}")]
    InvalidStageArgument { spec: String, reason: String },

    #[error("invalid integer {0:?}")]
    InvalidInteger(String),

    /// A pipeline stage failed while transforming the value pulled at `index`.
    #[error("pipeline failed on value at index {index}: {source}")]
    Stage {
        index: u64,
        #[source]
        source: StageError<StageFault>,
    },

    /// A lazy source only moves forward.
    #[error("cannot move source back to index {requested} from {current}")]
    Rewind { requested: u64, current: u64 },

    #[error("sink write failed: {0}")]
    Sink(#[from] io::Error),

    #[error("invalid configuration: {0}")]
    Config(String),
}

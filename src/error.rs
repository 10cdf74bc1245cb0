//! Error type shared by the whole crate.

use thiserror::Error;

/// Result alias used by every fallible operation in the crate.
pub type Result<T> = std::result::Result<T, NnError>;

/// Errors raised by the tensor engine, the datasets and the models.
#[derive(Debug, Error)]
pub enum NnError {
    #[error("shape mismatch in {op}: {left:?} vs {right:?}")]
    ShapeMismatch {
        op: &'static str,
        left: (usize, usize),
        right: (usize, usize),
    },

    #[error("tensor of shape {rows}x{cols} needs {expected} values, got {got}")]
    DataLength {
        rows: usize,
        cols: usize,
        expected: usize,
        got: usize,
    },

    #[error("expected a 1x1 tensor, got {rows}x{cols}")]
    NotScalar { rows: usize, cols: usize },

    #[error("node {0} does not belong to this graph")]
    UnknownNode(usize),

    #[error("softmax labels must be non-negative and each row must sum to 1")]
    InvalidLabels,

    #[error("a sequence needs at least one step")]
    EmptySequence,

    #[error("dataset has no validation split")]
    NoValidationData,

    #[error("model has already converged")]
    AlreadyConverged,

    #[error("configuration error: {0}")]
    Config(String),

    #[error("dataset error: {0}")]
    Dataset(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),
}

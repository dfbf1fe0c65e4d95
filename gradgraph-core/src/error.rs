use thiserror::Error;

/// Custom error type for the gradgraph engine.
///
/// Every variant describes a programmer error in graph construction or traversal.
/// Nothing here is retried: graph building and the backward pass are deterministic,
/// so a failing call fails identically on the same inputs.
#[derive(Error, Debug, PartialEq, Clone)]
pub enum AutogradError {
    #[error("Shape mismatch: expected {expected:?}, got {actual:?} during operation {operation}")]
    ShapeMismatch {
        expected: Vec<usize>,
        actual: Vec<usize>,
        operation: String,
    },

    #[error("Unimplemented operation: {operation} is not supported for tensors of rank {rank}")]
    UnimplementedOperation { operation: String, rank: usize },

    #[error("Inconsistent parameter count: expected {expected}, got {actual}")]
    InconsistentParameterCount { expected: usize, actual: usize },

    #[error("Node {node} does not require grad and cannot hold a gradient")]
    RequiresGradNotMet { node: usize },

    #[error("Node {node} is not a leaf; only leaf data can be replaced")]
    NotALeaf { node: usize },

    #[error("Invalid node id {node}: graph holds {len} nodes")]
    InvalidNode { node: usize, len: usize },

    #[error("Operands of '{operation}' belong to different graphs")]
    GraphMismatch { operation: String },

    #[error("Division by zero error")]
    DivisionByZero,

    #[error("Tensor creation error: data length {data_len} does not match shape {shape:?}")]
    TensorCreationError { data_len: usize, shape: Vec<usize> },

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Internal error: {0}")]
    InternalError(String),
}

impl From<ndarray::ShapeError> for AutogradError {
    fn from(err: ndarray::ShapeError) -> Self {
        AutogradError::InternalError(format!("array layout: {}", err))
    }
}

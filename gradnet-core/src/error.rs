use crate::shape::Shape;
use thiserror::Error;

/// Custom error type for the GradNet framework.
#[derive(Error, Debug, PartialEq, Clone)] // PartialEq for easier testing
pub enum GradNetError {
    #[error("Shape mismatch: expected {expected}, got {actual} during operation {operation}")]
    ShapeMismatch {
        expected: Shape,
        actual: Shape,
        operation: String,
    },

    #[error("Incompatible shapes for operation {operation}: {left} and {right}")]
    IncompatibleShapes {
        left: Shape,
        right: Shape,
        operation: String,
    },

    #[error("Cannot alias storage: existing shape {existing} does not match requested {requested}")]
    AliasShapeMismatch { existing: Shape, requested: Shape },

    #[error("Cannot reshape {from} into {to}: element counts differ")]
    InvalidReshape { from: Shape, to: Shape },

    #[error("Index {index} out of bounds for {len} elements")]
    IndexOutOfBounds { index: usize, len: usize },

    #[error("Matrix creation error: data length {data_len} does not match {rows}x{cols}")]
    MatrixCreationError {
        data_len: usize,
        rows: usize,
        cols: usize,
    },

    #[error("Cannot concatenate an empty list of matrices")]
    EmptyMatrixList,

    #[error("Cannot build a composite module from an empty child list")]
    EmptyModuleList,

    #[error("Internal error: {0}")]
    InternalError(String),
}

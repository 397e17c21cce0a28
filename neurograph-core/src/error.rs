use thiserror::Error;

/// Custom error type for the NeuroGraph framework.
#[derive(Error, Debug, PartialEq, Clone)] // PartialEq for easier testing
pub enum NeuroGraphError {
    #[error("Size mismatch: expected {expected}, got {actual} during operation {operation}")]
    SizeMismatch {
        expected: usize,
        actual: usize,
        operation: String,
    },

    #[error("Index out of bounds: index {index} for length {len}")]
    IndexOutOfBounds { index: usize, len: usize },

    #[error("View error: {message}")]
    ViewError { message: String },

    #[error("Cannot resize a view; only whole-buffer vectors may be resized")]
    ResizeOnView,

    #[error("Entity '{name}' is not a member of the net (operation {operation})")]
    NotMember { name: String, operation: String },

    #[error("Entity '{name}' is already registered")]
    Duplicate { name: String },

    #[error("No entity named '{name}' in the net")]
    UnknownName { name: String },

    #[error("Property '{key}' error: {message}")]
    PropertyError { key: String, message: String },

    #[error("Unknown type tag '{type_name}' during operation {operation}")]
    UnknownType {
        type_name: String,
        operation: String,
    },

    #[error("Pattern has no entry for cluster '{name}'")]
    MissingPatternEntry { name: String },

    #[error("Parse error: {message}")]
    ParseError { message: String },

    #[error("Unsupported operation: {0}")]
    UnsupportedOperation(String),

    #[error("Internal error: {0}")]
    InternalError(String),
    // Add more specific errors as needed
}

//! Error types for strict variant access

use thiserror::Error;

use super::VariantType;

/// Error type for strict value access
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValueError {
    /// The variant holds a different kind than requested
    #[error("Type mismatch: expected {expected}, got {actual}")]
    TypeMismatch {
        expected: VariantType,
        actual: VariantType,
    },

    /// Key not present in a map variant
    #[error("Key not found: {0}")]
    KeyNotFound(String),

    /// Index past the end of a list variant
    #[error("Index {index} out of bounds for list of length {length}")]
    IndexOutOfBounds { index: usize, length: usize },
}

/// Result type for strict value access
pub type ValueResult<T> = Result<T, ValueError>;

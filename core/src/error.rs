//! Error types for welite-core

use compact_str::CompactString;
use thiserror::Error;

/// Core error type for schema declaration, SQL generation, and binding.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Invalid schema declaration: duplicate columns, bad autoincrement,
    /// mismatched references, cyclic table dependencies.
    #[error("schema error: {0}")]
    Schema(CompactString),

    /// A value's storage class disagrees with the persistent type of the
    /// slot it is bound or formatted through, or NULL reached a
    /// non-nullable slot.
    #[error("type mismatch: {0}")]
    TypeMismatch(CompactString),

    /// A value could not be formatted as an inline SQL literal.
    #[error("encoding error: {0}")]
    Encoding(CompactString),

    /// A bind index fell outside the prepared statement's argument list.
    #[error("bind index {index} out of bounds for {count} argument(s)")]
    OutOfBoundsBind { index: usize, count: usize },

    /// The engine rejected a primitive bind.
    #[error("bind failed: {0}")]
    Bind(CompactString),

    /// A construct the generator cannot express.
    #[error("unsupported: {0}")]
    Unsupported(CompactString),
}

impl CoreError {
    pub fn schema(msg: impl AsRef<str>) -> Self {
        CoreError::Schema(CompactString::new(msg.as_ref()))
    }

    pub fn type_mismatch(msg: impl AsRef<str>) -> Self {
        CoreError::TypeMismatch(CompactString::new(msg.as_ref()))
    }

    pub fn encoding(msg: impl AsRef<str>) -> Self {
        CoreError::Encoding(CompactString::new(msg.as_ref()))
    }

    pub fn unsupported(msg: impl AsRef<str>) -> Self {
        CoreError::Unsupported(CompactString::new(msg.as_ref()))
    }
}

/// Result type for core operations
pub type Result<T> = core::result::Result<T, CoreError>;

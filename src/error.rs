//! Error types for layerpack.

use thiserror::Error;

/// Result type alias for packing operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur during packing operations.
///
/// A solid that simply does not fit is *not* an error; placement attempts
/// report that through their return value.
#[derive(Debug, Error)]
pub enum Error {
    /// Invalid dimensions provided at construction time.
    #[error("Invalid dimensions: {0}")]
    InvalidDimensions(String),

    /// Internal invariant violation. Indicates an algorithm defect,
    /// not bad input.
    #[error("Internal error: {0}")]
    Internal(String),
}

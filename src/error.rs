//! Error type shared by every codec and the dispatcher.

use thiserror::Error;

/// Errors produced while encoding, decoding or dispatching a pixel buffer.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    /// The algorithm selector is not one of the recognized names.
    #[error("Unsupported algorithm.")]
    UnsupportedAlgorithm(String),

    /// The buffer is inconsistent with its declared dimensions, or is empty
    /// where a codec needs at least one pixel.
    #[error("Malformed input: {0}")]
    MalformedInput(String),

    /// Arithmetic decoding could not map the encoded value back to a symbol.
    #[error("No symbol found for value {value} at pixel {index}")]
    SymbolNotFound { index: usize, value: f64 },

    /// A codec option is out of range.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Result type for codec operations
pub type Result<T> = std::result::Result<T, Error>;

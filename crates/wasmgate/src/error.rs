//! Error types for the bridge crate.

use thiserror::Error;

/// Bridge error type
#[derive(Error, Debug)]
pub enum BridgeError {
    /// Module compilation failed (malformed image)
    #[error("module load failed: {0}")]
    Load(String),

    /// Module instantiation failed (missing imports, trap during start)
    #[error("instantiation failed: {0}")]
    Instantiate(String),

    /// Payload could not be serialized to the wire format
    #[error("payload encoding failed: {0}")]
    Encoding(#[source] serde_json::Error),

    /// Guest allocator absent, trapped, or exhausted
    #[error("allocation failed: {0}")]
    Allocation(String),

    /// Read or write outside the current memory size
    #[error("memory access out of bounds: {0}")]
    Bounds(String),

    /// Requested export not present on the instance
    #[error("export '{0}' not found")]
    MissingExport(String),

    /// Export present but with an incompatible signature
    #[error("export '{name}' has an incompatible signature: {reason}")]
    ExportSignature {
        /// Name of the offending export
        name: String,
        /// What the type check reported
        reason: String,
    },

    /// The invoked export trapped
    #[error("guest call failed: {0}")]
    Call(String),

    /// No zero terminator found between the result pointer and the end
    /// of the guest's memory
    #[error("unterminated result buffer at offset {0}")]
    UnterminatedResult(usize),

    /// Response bytes were not valid UTF-8 JSON
    #[error("response decoding failed: {0}")]
    Decoding(String),

    /// Releasing the input buffer failed
    #[error("release of input buffer failed: {0}")]
    Release(String),
}

/// Result type alias for bridge operations
pub type Result<T> = std::result::Result<T, BridgeError>;

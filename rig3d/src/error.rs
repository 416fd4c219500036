use std::io;
use thiserror::Error;

/// Error types for rig construction, animation playback and file handling
#[derive(Error, Debug)]
pub enum RigError {
    /// I/O Error during reading or writing
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Invalid magic number in the file header
    #[error("Invalid magic number: expected '{expected}', got '{actual}'")]
    InvalidMagic { expected: String, actual: String },

    /// Unsupported file version
    #[error("Unsupported file version: {0}")]
    UnsupportedVersion(i32),

    /// Animation duration must be strictly positive
    #[error("Invalid animation duration: {0}")]
    InvalidDuration(f32),

    /// A bone or submesh id that does not exist
    #[error("Invalid handle: {0}")]
    InvalidHandle(String),

    /// Two models built over different rigs cannot mirror each other
    #[error("Configuration mismatch: expected {expected} bones, got {actual}")]
    ConfigMismatch { expected: usize, actual: usize },

    /// Tangent spaces were requested on a channel that has none
    #[error("Tangent spaces are not enabled for texture channel {0}")]
    InvalidTangentChannel(usize),

    /// An index that falls outside the addressed container
    #[error("{what} index {index} out of range (count {count})")]
    OutOfRange {
        what: &'static str,
        index: usize,
        count: usize,
    },

    /// Error during parsing
    #[error("Parse error: {0}")]
    ParseError(String),
}

/// Result type using RigError
pub type Result<T> = std::result::Result<T, RigError>;

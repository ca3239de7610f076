use std::path::PathBuf;

use crate::runtime::RuntimeError;

/// A module specifier that could not be mapped to a file.
///
/// Stored on the node that owns the specifier; the walker logs it and skips
/// the node instead of failing the build.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Could not resolve file path {specifier} from {}: {reason}", from.display())]
pub struct ResolutionError {
    pub specifier: String,
    pub from: PathBuf,
    pub reason: String,
}

/// Error types for Storymap operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Invalid configuration provided.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Module resolution failed.
    #[error(transparent)]
    Resolution(#[from] ResolutionError),

    /// A source file that had to be loaded is not part of the program.
    #[error("Source file not found in program: {}", path.display())]
    MissingSource { path: PathBuf },

    /// File system error raised by a runtime.
    #[error(transparent)]
    Runtime(#[from] RuntimeError),

    /// Output could not be serialized.
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Serialization(err.to_string())
    }
}

/// Result type alias for Storymap operations.
pub type Result<T> = std::result::Result<T, Error>;

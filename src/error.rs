//! Error handling and custom error types
//!
//! Provides unified error handling across the application using thiserror.
//! Upload and generation failures have their own enums so the session can
//! keep them as plain, serializable values.

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Upload rejected: {0}")]
    Upload(#[from] UploadError),

    #[error("Generation error: {0}")]
    Generation(#[from] GenerationError),

    #[error("Invalid data URI: {0}")]
    DataUri(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, Error>;

/// Slot-scoped rejection of an offered file.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum UploadError {
    #[error("Invalid file type. Please use JPG, JPEG, or PNG.")]
    UnsupportedMediaType { media_type: String },

    #[error("File is too large. Max size is {}MB.", .limit / 1024 / 1024)]
    SizeExceedsLimit { size: u64, limit: u64 },

    #[error("Could not read the file: {cause}")]
    Read { cause: String },
}

/// Failure of a single generation call.
///
/// The kinds are kept apart for diagnostics only; the session shows the same
/// message for all of them.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum GenerationError {
    #[error("API key is not configured")]
    MissingCredential,

    #[error("No image was generated in the API response")]
    NoImageReturned,

    #[error("The AI model failed to generate an image: {cause}")]
    GenerationFailed { cause: String },
}

impl GenerationError {
    pub fn failed(cause: impl Into<String>) -> Self {
        Self::GenerationFailed {
            cause: cause.into(),
        }
    }

    /// Short kebab-case name used in logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::MissingCredential => "missing-credential",
            Self::NoImageReturned => "no-image-returned",
            Self::GenerationFailed { .. } => "generation-failed",
        }
    }
}

impl From<Error> for GenerationError {
    fn from(err: Error) -> Self {
        match err {
            Error::Generation(inner) => inner,
            other => GenerationError::failed(other.to_string()),
        }
    }
}

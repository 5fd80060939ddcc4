use super::CandidateFile;
use crate::error::UploadError;
use crate::models::EncodedImage;
use crate::Result;

/// Reads an accepted file and wraps its bytes as base64.
#[derive(Debug, Clone, Copy, Default)]
pub struct ImageEncoder;

impl ImageEncoder {
    pub fn new() -> Self {
        Self
    }

    /// Single read, no retry. A read failure comes back as
    /// [`UploadError::Read`].
    pub async fn encode(&self, file: &CandidateFile) -> Result<EncodedImage> {
        let bytes = file.read().await.map_err(|e| {
            tracing::warn!("Failed to read '{}': {}", file.name(), e);
            UploadError::Read {
                cause: e.to_string(),
            }
        })?;

        tracing::debug!(
            "Encoded '{}' ({} bytes, {})",
            file.name(),
            bytes.len(),
            file.media_type()
        );

        Ok(EncodedImage::from_bytes(&bytes, file.media_type()))
    }
}

//! Upload validation and encoding
//!
//! Gates offered files on their declared media type and size, turns
//! accepted files into base64 [`EncodedImage`](crate::models::EncodedImage)s,
//! and keeps one image per subject slot.

pub mod encoder;
pub mod slot;

pub use encoder::ImageEncoder;
pub use slot::{SlotId, SlotNotice, UploadSlot};

use crate::error::UploadError;
use crate::Result;
use std::path::{Path, PathBuf};

pub const MAX_FILE_SIZE: u64 = 10 * 1024 * 1024;
pub const ALLOWED_MEDIA_TYPES: &[&str] = &["image/jpeg", "image/png", "image/jpg"];

/// Declared type for files whose extension maps to no known image format.
pub const UNKNOWN_MEDIA_TYPE: &str = "application/octet-stream";

/// Media-type allow-list and size limit applied to every offered file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UploadPolicy {
    pub allowed_media_types: &'static [&'static str],
    pub max_file_size: u64,
}

impl Default for UploadPolicy {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl UploadPolicy {
    pub const DEFAULT: UploadPolicy = UploadPolicy {
        allowed_media_types: ALLOWED_MEDIA_TYPES,
        max_file_size: MAX_FILE_SIZE,
    };

    /// Checks the declared media type, then the size.
    ///
    /// Types are compared case-sensitively and never sniffed from content.
    /// A size equal to the limit passes.
    pub fn validate(&self, media_type: &str, size: u64) -> std::result::Result<(), UploadError> {
        if !self.allowed_media_types.contains(&media_type) {
            return Err(UploadError::UnsupportedMediaType {
                media_type: media_type.to_string(),
            });
        }

        if size > self.max_file_size {
            return Err(UploadError::SizeExceedsLimit {
                size,
                limit: self.max_file_size,
            });
        }

        Ok(())
    }

    /// Comma-separated allow-list, the form a file picker's `accept` takes.
    pub fn accept_attribute(&self) -> String {
        self.allowed_media_types.join(",")
    }
}

#[derive(Debug, Clone)]
enum FileSource {
    Path(PathBuf),
    Memory(Vec<u8>),
}

/// A file offered to an upload slot, before validation.
#[derive(Debug, Clone)]
pub struct CandidateFile {
    name: String,
    media_type: String,
    size: u64,
    source: FileSource,
}

impl CandidateFile {
    /// Describes a file on disk, declaring its media type from the extension.
    pub async fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let metadata = tokio::fs::metadata(path).await?;

        Ok(Self {
            name: path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default(),
            media_type: declared_media_type(path),
            size: metadata.len(),
            source: FileSource::Path(path.to_path_buf()),
        })
    }

    pub fn from_bytes(
        name: impl Into<String>,
        media_type: impl Into<String>,
        bytes: Vec<u8>,
    ) -> Self {
        Self {
            name: name.into(),
            media_type: media_type.into(),
            size: bytes.len() as u64,
            source: FileSource::Memory(bytes),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn media_type(&self) -> &str {
        &self.media_type
    }

    pub fn size(&self) -> u64 {
        self.size
    }

    pub(crate) async fn read(&self) -> std::io::Result<Vec<u8>> {
        match &self.source {
            FileSource::Path(path) => tokio::fs::read(path).await,
            FileSource::Memory(bytes) => Ok(bytes.clone()),
        }
    }
}

/// Media type a browser would declare for this file name.
pub fn declared_media_type(path: &Path) -> String {
    image::ImageFormat::from_path(path)
        .map(|format| format.to_mime_type().to_string())
        .unwrap_or_else(|_| UNKNOWN_MEDIA_TYPE.to_string())
}

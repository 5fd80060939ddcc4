//! Read-only exports of the generated image for download and sharing.

use crate::models::GenerationResult;
use crate::Result;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::path::{Path, PathBuf};

pub const SHARE_TITLE: &str = "HugFusion Image";
pub const SHARE_TEXT: &str = "Check out this hug I created with HugFusion!";
pub const SHARE_MANIFEST: &str = "share.json";

/// The generated image as a timestamped file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadArtifact {
    pub file_name: String,
    pub media_type: String,
    pub bytes: Vec<u8>,
}

impl DownloadArtifact {
    pub fn from_result(result: &GenerationResult, at: DateTime<Utc>) -> Result<Self> {
        Ok(Self {
            file_name: format!("hugfusion_{}.{}", at.timestamp_millis(), result.extension()),
            media_type: result.media_type.clone(),
            bytes: result.decode()?,
        })
    }

    /// Writes the image into `dir`, creating it if needed.
    pub async fn save_to(&self, dir: &Path) -> Result<PathBuf> {
        tokio::fs::create_dir_all(dir).await?;
        let path = dir.join(&self.file_name);
        tokio::fs::write(&path, &self.bytes).await?;
        tracing::info!("Saved image to {}", path.display());
        Ok(path)
    }
}

/// The generated image plus the title and text offered to a share target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SharePayload {
    pub title: String,
    pub text: String,
    pub file_name: String,
    pub media_type: String,
    pub bytes: Vec<u8>,
}

#[derive(Debug, Serialize)]
struct ShareManifest<'a> {
    title: &'a str,
    text: &'a str,
    file: &'a str,
    media_type: &'a str,
}

impl SharePayload {
    pub fn from_result(result: &GenerationResult) -> Result<Self> {
        Ok(Self {
            title: SHARE_TITLE.to_string(),
            text: SHARE_TEXT.to_string(),
            file_name: format!("hugfusion.{}", result.extension()),
            media_type: result.media_type.clone(),
            bytes: result.decode()?,
        })
    }

    /// Writes the image and a `share.json` manifest into `dir`.
    pub async fn save_to(&self, dir: &Path) -> Result<PathBuf> {
        tokio::fs::create_dir_all(dir).await?;

        let image_path = dir.join(&self.file_name);
        tokio::fs::write(&image_path, &self.bytes).await?;

        let manifest = serde_json::to_string_pretty(&ShareManifest {
            title: &self.title,
            text: &self.text,
            file: &self.file_name,
            media_type: &self.media_type,
        })?;
        tokio::fs::write(dir.join(SHARE_MANIFEST), manifest).await?;

        tracing::info!("Prepared share bundle in {}", dir.display());
        Ok(image_path)
    }
}

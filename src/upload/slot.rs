use super::{CandidateFile, ImageEncoder, UploadPolicy};
use crate::error::{Error, UploadError};
use crate::models::EncodedImage;
use serde::{Deserialize, Serialize};

/// One of the two subject positions in a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SlotId {
    Person1,
    Person2,
}

impl SlotId {
    pub fn label(self) -> &'static str {
        match self {
            SlotId::Person1 => "Person 1",
            SlotId::Person2 => "Person 2",
        }
    }
}

/// What a slot reports to its owner after a change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SlotNotice {
    Image(EncodedImage),
    Cleared,
}

impl SlotNotice {
    pub fn into_image(self) -> Option<EncodedImage> {
        match self {
            SlotNotice::Image(image) => Some(image),
            SlotNotice::Cleared => None,
        }
    }
}

/// Holds at most one validated, encoded image for a subject.
#[derive(Debug, Clone)]
pub struct UploadSlot {
    id: SlotId,
    policy: UploadPolicy,
    encoder: ImageEncoder,
    current: Option<EncodedImage>,
    drag_active: bool,
    last_error: Option<UploadError>,
}

impl UploadSlot {
    pub fn new(id: SlotId) -> Self {
        Self::with_policy(id, UploadPolicy::DEFAULT)
    }

    pub fn with_policy(id: SlotId, policy: UploadPolicy) -> Self {
        Self {
            id,
            policy,
            encoder: ImageEncoder::new(),
            current: None,
            drag_active: false,
            last_error: None,
        }
    }

    pub fn label(&self) -> &'static str {
        self.id.label()
    }

    pub fn current(&self) -> Option<&EncodedImage> {
        self.current.as_ref()
    }

    pub fn drag_active(&self) -> bool {
        self.drag_active
    }

    pub fn last_error(&self) -> Option<&UploadError> {
        self.last_error.as_ref()
    }

    /// Validates and encodes `file`, replacing whatever the slot held.
    pub async fn submit(&mut self, file: &CandidateFile) -> SlotNotice {
        self.last_error = None;

        if let Err(rejection) = self.policy.validate(file.media_type(), file.size()) {
            tracing::info!("[{}] Rejected '{}': {}", self.label(), file.name(), rejection);
            return self.reject(rejection);
        }

        match self.encoder.encode(file).await {
            Ok(image) => {
                tracing::info!("[{}] Accepted '{}'", self.label(), file.name());
                self.current = Some(image.clone());
                SlotNotice::Image(image)
            }
            Err(Error::Upload(rejection)) => self.reject(rejection),
            Err(other) => self.reject(UploadError::Read {
                cause: other.to_string(),
            }),
        }
    }

    /// First file wins; the rest of a multi-file selection is ignored.
    pub async fn browse(&mut self, files: &[CandidateFile]) -> Option<SlotNotice> {
        let first = files.first()?;
        Some(self.submit(first).await)
    }

    pub fn clear(&mut self) -> SlotNotice {
        self.current = None;
        self.last_error = None;
        SlotNotice::Cleared
    }

    pub fn drag_enter(&mut self) {
        self.drag_active = true;
    }

    pub fn drag_leave(&mut self) {
        self.drag_active = false;
    }

    /// Ends the drag and submits the first dropped file, if any.
    pub async fn drop_files(&mut self, files: &[CandidateFile]) -> Option<SlotNotice> {
        self.drag_active = false;
        self.browse(files).await
    }

    fn reject(&mut self, rejection: UploadError) -> SlotNotice {
        self.current = None;
        self.last_error = Some(rejection);
        SlotNotice::Cleared
    }
}

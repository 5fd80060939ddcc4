//! AI service integration for hug image generation
//!
//! Sends the two subject photos and a style instruction to a multimodal
//! image model and returns the single generated image.

pub mod gemini;
pub mod mock;

pub use gemini::GeminiHugClient;
pub use mock::MockHugClient;

use crate::models::{EncodedImage, GenerationResult, HugStyle};
use crate::Result;
use async_trait::async_trait;

/// Environment variables checked for the API key, in order.
pub const API_KEY_VARS: &[&str] = &["API_KEY", "GEMINI_API_KEY"];

#[async_trait]
pub trait HugGenerationService: Send + Sync {
    /// One request, one outcome. Failures come back as
    /// [`crate::Error::Generation`].
    async fn generate(
        &self,
        person1: &EncodedImage,
        person2: &EncodedImage,
        style: HugStyle,
    ) -> Result<GenerationResult>;
}

/// Where the API key comes from. Resolved on every call.
#[derive(Debug, Clone)]
pub enum CredentialSource {
    Env(Vec<String>),
    Static(Option<String>),
}

impl CredentialSource {
    pub fn process_env() -> Self {
        Self::Env(API_KEY_VARS.iter().map(|v| v.to_string()).collect())
    }

    /// Returns the first non-blank key, if any.
    pub fn resolve(&self) -> Option<String> {
        match self {
            Self::Env(vars) => vars
                .iter()
                .filter_map(|var| std::env::var(var).ok())
                .map(|value| value.trim().to_string())
                .find(|value| !value.is_empty()),
            Self::Static(value) => value
                .as_deref()
                .map(str::trim)
                .filter(|value| !value.is_empty())
                .map(str::to_string),
        }
    }
}

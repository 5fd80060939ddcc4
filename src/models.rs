//! Data models and structures
//!
//! Defines the images passed between upload slots, the session and the
//! generation service, the style presets, and the runtime configuration.

use crate::{Error, Result};
use base64::Engine as _;
use serde::{Deserialize, Serialize};
use std::time::Duration;

pub const DEFAULT_MODEL: &str = "gemini-2.5-flash-image";
pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 120;

/// Media type assumed for generated images when the service omits one.
pub const DEFAULT_RESULT_MEDIA_TYPE: &str = "image/png";

/// Base64 image payload tagged with its declared media type.
///
/// Fields are private so a value cannot change after it is built.
/// Deserializing checks the payload the same way [`EncodedImage::from_data_uri`] does.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawEncodedImage")]
pub struct EncodedImage {
    payload: String,
    media_type: String,
}

#[derive(Deserialize)]
struct RawEncodedImage {
    payload: String,
    media_type: String,
}

impl TryFrom<RawEncodedImage> for EncodedImage {
    type Error = Error;

    fn try_from(raw: RawEncodedImage) -> Result<Self> {
        if raw.media_type.is_empty() {
            return Err(Error::DataUri("empty media type".to_string()));
        }
        decode_payload(&raw.payload)?;
        Ok(Self {
            payload: raw.payload,
            media_type: raw.media_type,
        })
    }
}

impl EncodedImage {
    pub fn from_bytes(bytes: &[u8], media_type: impl Into<String>) -> Self {
        Self {
            payload: base64::engine::general_purpose::STANDARD.encode(bytes),
            media_type: media_type.into(),
        }
    }

    pub fn payload(&self) -> &str {
        &self.payload
    }

    pub fn media_type(&self) -> &str {
        &self.media_type
    }

    /// Renders the image as a `data:<media>;base64,<payload>` URI.
    pub fn to_data_uri(&self) -> String {
        format!("data:{};base64,{}", self.media_type, self.payload)
    }

    /// Splits a base64 data URI back into media type and payload.
    pub fn from_data_uri(uri: &str) -> Result<Self> {
        let rest = uri
            .strip_prefix("data:")
            .ok_or_else(|| Error::DataUri("missing `data:` scheme".to_string()))?;
        let (header, payload) = rest
            .split_once(',')
            .ok_or_else(|| Error::DataUri("missing `,` separator".to_string()))?;
        let media_type = header
            .strip_suffix(";base64")
            .ok_or_else(|| Error::DataUri("only base64 data URIs are supported".to_string()))?;
        if media_type.is_empty() {
            return Err(Error::DataUri("empty media type".to_string()));
        }

        base64::engine::general_purpose::STANDARD
            .decode(payload)
            .map_err(|e| Error::DataUri(format!("invalid base64 payload: {}", e)))?;

        Ok(Self {
            payload: payload.to_string(),
            media_type: media_type.to_string(),
        })
    }

    pub fn decode(&self) -> Result<Vec<u8>> {
        decode_payload(&self.payload)
    }
}

/// The single image returned by a successful generation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerationResult {
    pub payload: String,
    pub media_type: String,
}

impl GenerationResult {
    pub fn new(payload: impl Into<String>, media_type: Option<&str>) -> Self {
        Self {
            payload: payload.into(),
            media_type: media_type
                .filter(|m| !m.is_empty())
                .unwrap_or(DEFAULT_RESULT_MEDIA_TYPE)
                .to_string(),
        }
    }

    pub fn decode(&self) -> Result<Vec<u8>> {
        decode_payload(&self.payload)
    }

    pub fn to_data_uri(&self) -> String {
        format!("data:{};base64,{}", self.media_type, self.payload)
    }

    /// File extension matching the media type, `png` when unknown.
    pub fn extension(&self) -> &'static str {
        image::ImageFormat::from_mime_type(&self.media_type)
            .and_then(|format| format.extensions_str().first().copied())
            .unwrap_or("png")
    }
}

fn decode_payload(payload: &str) -> Result<Vec<u8>> {
    base64::engine::general_purpose::STANDARD
        .decode(payload)
        .map_err(|e| Error::DataUri(format!("invalid base64 payload: {}", e)))
}

/// Preset controlling the instruction text sent with the two photos.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum HugStyle {
    #[default]
    Realistic,
    Cartoon,
}

impl HugStyle {
    pub const ALL: [HugStyle; 2] = [HugStyle::Realistic, HugStyle::Cartoon];

    pub fn label(self) -> &'static str {
        match self {
            HugStyle::Realistic => "Realistic Hug",
            HugStyle::Cartoon => "Cartoon Hug",
        }
    }

    /// Instruction text looked up in [`crate::prompts::STYLE_PROMPTS`].
    pub fn prompt(self) -> &'static str {
        crate::prompts::instruction_for(self)
    }
}

// Configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub model: String,
    pub base_url: String,
    pub request_timeout: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
            request_timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
        }
    }
}

impl Config {
    /// Loads `.env` and reads the optional overrides.
    ///
    /// The API key is not part of it; the generation client reads it from
    /// the environment on each call.
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from any key lookup. Blank values use the default.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let get = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        let request_timeout = match get("REQUEST_TIMEOUT_SECS") {
            Some(raw) => match raw.parse::<u64>() {
                Ok(secs) if secs > 0 => Duration::from_secs(secs),
                _ => {
                    return Err(Error::Config(format!(
                        "REQUEST_TIMEOUT_SECS must be a positive integer, got '{}'",
                        raw
                    )));
                }
            },
            None => Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
        };

        Ok(Self {
            model: get("HUGFUSION_MODEL").unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            base_url: get("GEMINI_BASE_URL").unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            request_timeout,
        })
    }
}

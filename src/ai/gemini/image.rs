use super::client::GeminiHttpClient;
use super::types::{Content, GenerateContentResponse, InlineData, Part};
use crate::ai::{CredentialSource, HugGenerationService};
use crate::error::GenerationError;
use crate::models::{Config, EncodedImage, GenerationResult, HugStyle};
use crate::Result;
use async_trait::async_trait;
use base64::Engine as _;
use serde::Serialize;
use std::time::Duration;

#[derive(Debug, Serialize)]
struct HugRequest {
    contents: Vec<Content>,
    #[serde(rename = "generationConfig")]
    generation_config: ImageGenerationConfig,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ImageGenerationConfig {
    response_modalities: Vec<String>,
}

/// Generates the hug image with a Gemini image model.
pub struct GeminiHugClient {
    http: GeminiHttpClient,
    credentials: CredentialSource,
}

impl GeminiHugClient {
    pub fn new(model: String, credentials: CredentialSource) -> Self {
        Self::new_with_client(
            model,
            credentials,
            Duration::from_secs(crate::models::DEFAULT_REQUEST_TIMEOUT_SECS),
            reqwest::Client::new(),
        )
    }

    pub fn new_with_client(
        model: String,
        credentials: CredentialSource,
        timeout: Duration,
        client: reqwest::Client,
    ) -> Self {
        Self {
            http: GeminiHttpClient::new_with_client(model, timeout, client),
            credentials,
        }
    }

    /// Client for `config`, reading the key from the process environment.
    pub fn from_config(config: &Config) -> Self {
        Self::new_with_client(
            config.model.clone(),
            CredentialSource::process_env(),
            config.request_timeout,
            reqwest::Client::new(),
        )
        .with_base_url(config.base_url.clone())
    }

    pub fn with_base_url(mut self, base_url: String) -> Self {
        self.http = self.http.with_base_url(base_url);
        self
    }

    pub fn model(&self) -> &str {
        self.http.model()
    }
}

fn inline_part(image: &EncodedImage) -> Part {
    Part::InlineData {
        inline_data: InlineData {
            mime_type: image.media_type().to_string(),
            data: image.payload().to_string(),
        },
    }
}

fn build_request(person1: &EncodedImage, person2: &EncodedImage, style: HugStyle) -> HugRequest {
    HugRequest {
        contents: vec![Content {
            role: None,
            parts: vec![
                Part::Text {
                    text: style.prompt().to_string(),
                },
                inline_part(person1),
                inline_part(person2),
            ],
        }],
        generation_config: ImageGenerationConfig {
            response_modalities: vec!["IMAGE".to_string()],
        },
    }
}

/// First inline part of the first candidate, as a result.
fn extract_image(response: GenerateContentResponse) -> Result<GenerationResult> {
    let candidate = response.candidates.first();

    let image_data = candidate
        .and_then(|c| c.content.as_ref())
        .and_then(|content| {
            content.parts.iter().find_map(|p| match p {
                Part::InlineData { inline_data } => Some(inline_data),
                _ => None,
            })
        });

    let Some(image_data) = image_data else {
        let block_reason = response
            .prompt_feedback
            .as_ref()
            .and_then(|f| f.block_reason.as_deref());
        let finish_reason = candidate.and_then(|c| c.finish_reason.as_deref());
        tracing::warn!(
            "Gemini response carried no image (block reason: {:?}, finish reason: {:?})",
            block_reason,
            finish_reason
        );
        return Err(GenerationError::NoImageReturned.into());
    };

    base64::engine::general_purpose::STANDARD
        .decode(&image_data.data)
        .map_err(|e| {
            GenerationError::failed(format!("Failed to decode Gemini base64 image: {}", e))
        })?;

    tracing::debug!(
        "Gemini returned image with mime_type: {}",
        image_data.mime_type
    );

    Ok(GenerationResult::new(
        image_data.data.clone(),
        Some(image_data.mime_type.as_str()),
    ))
}

#[async_trait]
impl HugGenerationService for GeminiHugClient {
    async fn generate(
        &self,
        person1: &EncodedImage,
        person2: &EncodedImage,
        style: HugStyle,
    ) -> Result<GenerationResult> {
        let api_key = self.credentials.resolve().ok_or_else(|| {
            tracing::error!("No API key configured; set API_KEY or GEMINI_API_KEY");
            GenerationError::MissingCredential
        })?;

        let request = build_request(person1, person2, style);
        tracing::info!(
            "Requesting {:?} hug from Gemini (model: {})",
            style,
            self.model()
        );

        let response: GenerateContentResponse = self
            .http
            .generate_content(&api_key, &request)
            .await
            .map_err(GenerationError::from)?;

        extract_image(response)
    }
}

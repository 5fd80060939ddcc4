use crate::error::GenerationError;
use crate::models::DEFAULT_BASE_URL;
use crate::Result;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::time::Duration;

/// Lightweight Gemini REST client.
///
/// Holds no credential; the caller passes the key on each request.
pub struct GeminiHttpClient {
    pub(crate) client: Client,
    model: String,
    pub(crate) base_url: String,
    timeout: Duration,
}

impl GeminiHttpClient {
    /// Construct a Gemini client.
    ///
    /// `model` should be the bare model ID (for example `gemini-2.5-flash-image`),
    /// not a `models/...`-prefixed path segment.
    pub fn new(model: String, timeout: Duration) -> Self {
        Self::new_with_client(model, timeout, Client::new())
    }

    pub fn new_with_client(model: String, timeout: Duration, client: Client) -> Self {
        let model = model.strip_prefix("models/").unwrap_or(&model).to_string();

        Self {
            client,
            model,
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout,
        }
    }

    pub fn with_base_url(mut self, base_url: String) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    /// Returns the configured model ID without the `models/` prefix.
    pub fn model(&self) -> &str {
        &self.model
    }

    async fn post_to_url<Req: Serialize, Resp: DeserializeOwned>(
        &self,
        url: String,
        api_key: &str,
        request: &Req,
    ) -> Result<Resp> {
        let response = self
            .client
            .post(&url)
            .timeout(self.timeout)
            .header("x-goog-api-key", api_key)
            .header("Content-Type", "application/json")
            .json(request)
            .send()
            .await
            .map_err(|e| {
                tracing::error!("Failed to send request to Gemini: {}", e);
                e
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await?;
            tracing::error!("Gemini API error (status {}): {}", status, error_text);
            return Err(GenerationError::failed(format!(
                "Gemini API error (status {}): {}",
                status, error_text
            ))
            .into());
        }

        let body = response.text().await?;
        serde_json::from_str(&body).map_err(|e| {
            tracing::error!("Failed to parse Gemini response: {}", e);
            tracing::debug!("Unparseable Gemini body: {}", body);
            GenerationError::failed(format!("Failed to parse Gemini response: {}", e)).into()
        })
    }

    /// Calls Gemini's `generateContent` endpoint.
    pub async fn generate_content<Req: Serialize, Resp: DeserializeOwned>(
        &self,
        api_key: &str,
        request: &Req,
    ) -> Result<Resp> {
        let url = format!(
            "{}/v1beta/models/{}:generateContent",
            self.base_url, self.model
        );
        self.post_to_url(url, api_key, request).await
    }
}

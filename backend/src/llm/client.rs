//! Gemini API client
//!
//! Direct HTTP client for the Gemini `generateContent` endpoint.

use super::error::GenerationError;
use super::gemini_types::{
    GeminiApiRequest, GeminiApiResponse, GenerationConfig, RequestContent, RequestPart,
};
use super::TextGenerator;
use async_trait::async_trait;
use std::time::Duration;
use tokio::time::timeout;

/// Default Gemini API base URL
pub const GEMINI_API_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Header carrying the API key
const API_KEY_HEADER: &str = "x-goog-api-key";

/// Default Gemini model
pub const DEFAULT_GEMINI_MODEL: &str = "gemini-2.5-flash";

/// HTTP client for the Gemini API
#[derive(Debug, Clone)]
pub struct GeminiClient {
    /// Shared client (connection pooling)
    client: reqwest::Client,
    api_key: String,
    model: String,
    base_url: String,
    timeout: Duration,
    json_mode: bool,
}

impl GeminiClient {
    /// Create a client for the given key and model
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key: api_key.into(),
            model: model.into(),
            base_url: GEMINI_API_BASE_URL.to_string(),
            timeout: Duration::from_secs(30),
            json_mode: true,
        }
    }

    /// Override the API base URL (used by tests against a mock server)
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Set the per-request timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Request `application/json` responses (on by default)
    pub fn with_json_mode(mut self, json_mode: bool) -> Self {
        self.json_mode = json_mode;
        self
    }

    /// Model this client calls
    pub fn model(&self) -> &str {
        &self.model
    }

    async fn call(
        &self,
        prompt: &str,
        max_tokens: u32,
        temperature: f32,
    ) -> Result<String, GenerationError> {
        if self.api_key.is_empty() {
            return Err(GenerationError::MissingApiKey);
        }

        let url = format!("{}/models/{}:generateContent", self.base_url, self.model);

        let request_body = GeminiApiRequest {
            contents: vec![RequestContent {
                parts: vec![RequestPart {
                    text: prompt.to_string(),
                }],
            }],
            generation_config: GenerationConfig {
                max_output_tokens: max_tokens,
                temperature,
                response_mime_type: self
                    .json_mode
                    .then(|| "application/json".to_string()),
            },
        };

        tracing::debug!(
            model = %self.model,
            json_mode = self.json_mode,
            prompt_len = prompt.len(),
            max_tokens,
            "Calling Gemini API"
        );

        let response = self
            .client
            .post(&url)
            .header(API_KEY_HEADER, &self.api_key)
            .json(&request_body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let code = status.as_u16();
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unable to read error body".to_string());

            tracing::error!(
                status_code = code,
                error_body = %body,
                "Gemini API returned error status"
            );

            if code == 429 {
                return Err(GenerationError::RateLimited(body));
            }
            return Err(GenerationError::Status { code, body });
        }

        let response_body = response.text().await?;
        let parsed: GeminiApiResponse = serde_json::from_str(&response_body)
            .map_err(|e| GenerationError::Malformed(format!("{} - body: {}", e, response_body)))?;

        if let Some(reason) = parsed
            .prompt_feedback
            .as_ref()
            .and_then(|feedback| feedback.block_reason.as_ref())
        {
            return Err(GenerationError::Blocked(reason.clone()));
        }

        let candidate = parsed.candidates.first().ok_or_else(|| {
            GenerationError::EmptyResponse("response contains no candidates".to_string())
        })?;
        let part = candidate.content.parts.first().ok_or_else(|| {
            GenerationError::EmptyResponse("candidate contains no parts".to_string())
        })?;
        if part.text.trim().is_empty() {
            return Err(GenerationError::EmptyResponse(
                "response text is empty".to_string(),
            ));
        }

        tracing::debug!(
            response_len = part.text.len(),
            "Received response from Gemini API"
        );
        Ok(part.text.clone())
    }
}

#[async_trait]
impl TextGenerator for GeminiClient {
    async fn complete(
        &self,
        prompt: &str,
        max_tokens: u32,
        temperature: f32,
    ) -> Result<String, GenerationError> {
        timeout(self.timeout, self.call(prompt, max_tokens, temperature))
            .await
            .map_err(|_| GenerationError::Timeout(self.timeout.as_secs()))?
    }
}

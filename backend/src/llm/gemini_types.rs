//! Gemini API wire types
//!
//! Mirrors the subset of the `generateContent` request and response
//! format that the client uses.

use serde::{Deserialize, Serialize};

/// Top-level Gemini API response
#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct GeminiApiResponse {
    /// Candidate responses from the model
    #[serde(default)]
    pub candidates: Vec<Candidate>,
    /// Feedback about the prompt (e.g., if it was blocked)
    #[serde(default, alias = "prompt_feedback")]
    pub prompt_feedback: Option<PromptFeedback>,
}

/// A single candidate response
#[derive(Deserialize, Debug)]
pub struct Candidate {
    /// Content of this candidate
    pub content: Content,
}

/// Content of a candidate
#[derive(Deserialize, Debug)]
pub struct Content {
    /// Content parts (typically one text part)
    #[serde(default)]
    pub parts: Vec<Part>,
}

/// A text part
#[derive(Deserialize, Debug)]
pub struct Part {
    /// Text content of this part
    #[serde(default)]
    pub text: String,
}

/// Feedback about the prompt
#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct PromptFeedback {
    /// Reason the prompt was blocked
    #[serde(default, alias = "block_reason")]
    pub block_reason: Option<String>,
}

/// Request body for `generateContent`
#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct GeminiApiRequest {
    /// Content items to send
    pub contents: Vec<RequestContent>,
    /// Sampling configuration
    pub generation_config: GenerationConfig,
}

/// Content structure for requests
#[derive(Serialize, Debug)]
pub struct RequestContent {
    /// Content parts
    pub parts: Vec<RequestPart>,
}

/// A text part for requests
#[derive(Serialize, Debug)]
pub struct RequestPart {
    /// The text content
    pub text: String,
}

/// Generation configuration for requests
#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct GenerationConfig {
    /// Upper bound on generated tokens
    pub max_output_tokens: u32,
    /// Sampling temperature
    pub temperature: f32,
    /// MIME type to force for the response (e.g., "application/json")
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_mime_type: Option<String>,
}

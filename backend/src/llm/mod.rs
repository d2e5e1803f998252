//! Generative text service
//!
//! The announcement specialist drafts copy through a [`TextGenerator`].
//! Production uses [`GeminiClient`]; [`DisabledGenerator`] stands in when
//! generation is turned off so callers always take the template path.

pub mod client;
pub mod error;
pub mod gemini_types;

pub use client::GeminiClient;
pub use error::GenerationError;

use async_trait::async_trait;

/// A text completion backend
#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Complete `prompt`, returning the model's text
    async fn complete(
        &self,
        prompt: &str,
        max_tokens: u32,
        temperature: f32,
    ) -> Result<String, GenerationError>;
}

/// Generator that always fails with [`GenerationError::Disabled`]
#[derive(Debug, Default, Clone, Copy)]
pub struct DisabledGenerator;

#[async_trait]
impl TextGenerator for DisabledGenerator {
    async fn complete(
        &self,
        _prompt: &str,
        _max_tokens: u32,
        _temperature: f32,
    ) -> Result<String, GenerationError> {
        Err(GenerationError::Disabled)
    }
}

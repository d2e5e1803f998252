//! Orchestrator configuration
//!
//! Runtime-tunable settings for workflows. Changes apply to workflows
//! prepared after the update; running workflows keep the settings they
//! started with.

use crate::error::AppError;
use crate::llm::client::{DEFAULT_GEMINI_MODEL, GEMINI_API_BASE_URL};
use serde::{Deserialize, Serialize};

/// Orchestrator configuration
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OrchestratorConfig {
    /// Upper bound on each specialist run, in seconds
    pub specialist_timeout_secs: u64,
    /// Text generation request timeout in seconds
    pub generation_timeout_secs: u64,
    /// Whether the announcement specialist may call the text generator
    pub generation_enabled: bool,
    /// Gemini model name
    pub gemini_model: String,
    /// Gemini API base URL
    pub gemini_api_base_url: String,
    /// Maximum workflow context length in characters
    pub max_context_length: usize,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            specialist_timeout_secs: 30,
            generation_timeout_secs: 30,
            generation_enabled: true,
            gemini_model: DEFAULT_GEMINI_MODEL.to_string(),
            gemini_api_base_url: GEMINI_API_BASE_URL.to_string(),
            max_context_length: 500,
        }
    }
}

/// Request body for updating orchestrator configuration
#[derive(Debug, Default, Deserialize)]
pub struct ConfigUpdateRequest {
    /// Specialist timeout in seconds (optional)
    pub specialist_timeout_secs: Option<u64>,
    /// Generation timeout in seconds (optional)
    pub generation_timeout_secs: Option<u64>,
    /// Enable or disable text generation (optional)
    pub generation_enabled: Option<bool>,
    /// Gemini model name (optional)
    pub gemini_model: Option<String>,
    /// Maximum context length (optional)
    pub max_context_length: Option<usize>,
}

/// Validate and apply configuration updates
///
/// All fields are validated before any is applied, so a rejected request
/// leaves the configuration unchanged.
///
/// # Arguments
/// * `config` - The current config to update
/// * `request` - The update request with optional fields
///
/// # Returns
/// * `Ok(OrchestratorConfig)` - The updated configuration
/// * `Err(AppError::InvalidRequest)` - If validation fails
pub fn validate_and_apply_config_update(
    mut config: OrchestratorConfig,
    request: ConfigUpdateRequest,
) -> Result<OrchestratorConfig, AppError> {
    if request.specialist_timeout_secs == Some(0) {
        return Err(AppError::InvalidRequest(
            "specialist_timeout_secs must be > 0".to_string(),
        ));
    }
    if request.generation_timeout_secs == Some(0) {
        return Err(AppError::InvalidRequest(
            "generation_timeout_secs must be > 0".to_string(),
        ));
    }
    if request.max_context_length == Some(0) {
        return Err(AppError::InvalidRequest(
            "max_context_length must be > 0".to_string(),
        ));
    }
    if let Some(model) = &request.gemini_model {
        if model.trim().is_empty() {
            return Err(AppError::InvalidRequest(
                "gemini_model cannot be empty".to_string(),
            ));
        }
    }

    if let Some(secs) = request.specialist_timeout_secs {
        config.specialist_timeout_secs = secs;
    }
    if let Some(secs) = request.generation_timeout_secs {
        config.generation_timeout_secs = secs;
    }
    if let Some(enabled) = request.generation_enabled {
        config.generation_enabled = enabled;
    }
    if let Some(model) = request.gemini_model {
        config.gemini_model = model.trim().to_string();
    }
    if let Some(max) = request.max_context_length {
        config.max_context_length = max;
    }

    Ok(config)
}

//! Application configuration
//!
//! Centralized configuration management with environment variable support
//! and sensible defaults.

use crate::llm::client::{DEFAULT_GEMINI_MODEL, GEMINI_API_BASE_URL};
use crate::orchestrator::config::OrchestratorConfig;
use std::env;
use std::str::FromStr;

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Server configuration
    pub server: ServerConfig,
    /// Item store configuration
    pub storage: StorageConfig,
    /// Text generation configuration
    pub generation: GenerationSettings,
    /// Upper bound on each specialist run, in seconds
    pub specialist_timeout_secs: u64,
}

/// Server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Port to bind the server to
    pub port: u16,
    /// Host address to bind to
    pub host: String,
}

/// Item store configuration
#[derive(Debug, Clone)]
pub struct StorageConfig {
    /// SQLite database path; the in-memory store is used when unset
    pub database_url: Option<String>,
    /// Seed demo listings into an empty store at startup
    pub seed_demo_items: bool,
}

/// Text generation configuration
#[derive(Clone)]
pub struct GenerationSettings {
    /// Gemini API key
    pub api_key: Option<String>,
    /// Gemini model name
    pub model: String,
    /// Gemini API base URL
    pub base_url: String,
    /// Request timeout in seconds
    pub timeout_secs: u64,
    /// Master switch for generation
    pub enabled: bool,
}

impl std::fmt::Debug for GenerationSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GenerationSettings")
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("model", &self.model)
            .field("base_url", &self.base_url)
            .field("timeout_secs", &self.timeout_secs)
            .field("enabled", &self.enabled)
            .finish()
    }
}

fn parse_var<T: FromStr>(name: &str, default: T) -> T {
    env::var(name)
        .ok()
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}

fn non_empty_var(name: &str) -> Option<String> {
    env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

impl Config {
    /// Load configuration from environment variables with defaults
    pub fn from_env() -> Self {
        Self {
            server: ServerConfig {
                port: parse_var("PORT", 8080),
                host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            },
            storage: StorageConfig {
                database_url: non_empty_var("DATABASE_URL"),
                seed_demo_items: parse_var("SEED_DEMO_ITEMS", true),
            },
            generation: GenerationSettings {
                api_key: non_empty_var("GEMINI_API_KEY"),
                model: non_empty_var("GEMINI_MODEL")
                    .unwrap_or_else(|| DEFAULT_GEMINI_MODEL.to_string()),
                base_url: non_empty_var("GEMINI_API_BASE_URL")
                    .unwrap_or_else(|| GEMINI_API_BASE_URL.to_string()),
                timeout_secs: parse_var("GENERATION_TIMEOUT_SECS", 30),
                enabled: parse_var("GENERATION_ENABLED", true),
            },
            specialist_timeout_secs: parse_var("SPECIALIST_TIMEOUT_SECS", 30),
        }
    }

    /// Get the server address as a string
    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }

    /// Initial orchestrator configuration derived from the environment
    pub fn orchestrator_config(&self) -> OrchestratorConfig {
        OrchestratorConfig {
            specialist_timeout_secs: self.specialist_timeout_secs.max(1),
            generation_timeout_secs: self.generation.timeout_secs.max(1),
            generation_enabled: self.generation.enabled,
            gemini_model: self.generation.model.clone(),
            gemini_api_base_url: self.generation.base_url.clone(),
            ..OrchestratorConfig::default()
        }
    }
}

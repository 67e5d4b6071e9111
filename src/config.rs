//! Application configuration
//!
//! Centralized configuration management with environment variable support
//! and sensible defaults.

use std::env;

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Server configuration
    pub server: ServerConfig,
    /// Dataset hub configuration
    pub hub: HubConfig,
    /// LLM cleaner configuration
    pub cleaner: CleanerConfig,
    /// Training configuration
    pub training: TrainingConfig,
}

/// Server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Port to bind the server to
    pub port: u16,
    /// Host address to bind to
    pub host: String,
}

/// Dataset hub configuration
#[derive(Debug, Clone)]
pub struct HubConfig {
    /// Access token for the hub (optional; public reads work without one)
    pub token: Option<String>,
    /// Dataset repository id, e.g. "acme/zeroml-data"
    pub repo_id: String,
    /// Base URL of the hub API
    pub base_url: String,
    /// Request timeout in seconds
    pub timeout_secs: u64,
}

/// LLM cleaner configuration
#[derive(Debug, Clone)]
pub struct CleanerConfig {
    /// API key for the chat-completions endpoint
    pub api_key: Option<String>,
    /// Model used to generate cleaning plans
    pub model: String,
    /// Base URL of the chat-completions API
    pub base_url: String,
    /// Request timeout in seconds
    pub timeout_secs: u64,
}

/// Training configuration
#[derive(Debug, Clone)]
pub struct TrainingConfig {
    /// Fraction of rows held out for evaluation
    pub test_fraction: f32,
    /// Below this row count the train/test split is skipped
    pub min_rows_for_split: usize,
}

impl Config {
    /// Load configuration from environment variables with defaults
    pub fn from_env() -> Self {
        Self {
            server: ServerConfig {
                port: env::var("PORT")
                    .ok()
                    .and_then(|p| p.parse().ok())
                    .unwrap_or(7860),
                host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            },
            hub: HubConfig {
                token: env::var("HF_TOKEN").ok().filter(|t| !t.is_empty()),
                repo_id: env::var("HF_DATA_REPO").unwrap_or_else(|_| "zeroml/datasets".to_string()),
                base_url: env::var("HF_BASE_URL")
                    .unwrap_or_else(|_| "https://huggingface.co".to_string()),
                timeout_secs: env::var("HUB_TIMEOUT_SECS")
                    .ok()
                    .and_then(|t| t.parse().ok())
                    .unwrap_or(60),
            },
            cleaner: CleanerConfig {
                api_key: env::var("OPENAI_API_KEY").ok().filter(|k| !k.is_empty()),
                model: env::var("CLEANER_MODEL").unwrap_or_else(|_| "gpt-4o-mini".to_string()),
                base_url: env::var("OPENAI_BASE_URL")
                    .unwrap_or_else(|_| "https://api.openai.com/v1".to_string()),
                timeout_secs: env::var("LLM_TIMEOUT_SECS")
                    .ok()
                    .and_then(|t| t.parse().ok())
                    .unwrap_or(60),
            },
            training: TrainingConfig {
                test_fraction: 0.2,
                min_rows_for_split: 5,
            },
        }
    }

    /// Get the server address as a string
    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

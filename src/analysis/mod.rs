pub mod gemini;
pub mod triage;
pub mod types;

pub use gemini::GeminiClient;
pub use triage::TriageAnalyzer;

use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

use crate::config::Config;
use types::{GeneratedContent, ModelInfo};

#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("AI API request failed: {0}")]
    ApiRequest(#[from] reqwest::Error),

    #[error("AI API error (HTTP {status}): {message}")]
    Status { status: u16, message: String },

    #[error("No text in model response: {0}")]
    EmptyResponse(String),

    #[error("AI API key not configured")]
    MissingApiKey,
}

/// Seam between the triage logic and a hosted text-generation API.
/// Implementations must be Send + Sync to be shared across request handlers.
#[async_trait]
pub trait ContentGenerator: Send + Sync {
    /// Provider name used in logs (e.g., "gemini")
    fn name(&self) -> &str;

    /// Run one prompt against `model` and return the raw response.
    async fn generate(&self, model: &str, prompt: &str) -> Result<GeneratedContent, AnalysisError>;

    /// Models visible to the configured key.
    async fn list_models(&self) -> Result<Vec<ModelInfo>, AnalysisError>;
}

/// Build the analyzer the configuration describes, backed by Gemini.
pub fn analyzer_from_config(config: &Config) -> Result<TriageAnalyzer, AnalysisError> {
    let client = GeminiClient::from_config(config)?;
    Ok(TriageAnalyzer::new(
        Arc::new(client),
        config.primary_model(),
        config.fallback_model(),
    ))
}

use async_trait::async_trait;
use std::time::Duration;
use tracing::{debug, instrument};

use super::types::{GenerateRequest, GeneratedContent, ModelInfo, ModelList};
use super::{AnalysisError, ContentGenerator};
use crate::config::Config;

/// Google Gemini REST client (v1beta).
///
/// Holds one pooled HTTP client and the API key for every model call.
pub struct GeminiClient {
    http: reqwest::Client,
    api_base: String,
    api_key: String,
}

impl GeminiClient {
    pub fn new(
        api_base: impl Into<String>,
        api_key: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, AnalysisError> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            api_base: api_base.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
        })
    }

    /// Returns AnalysisError::MissingApiKey when the config carries no key.
    pub fn from_config(config: &Config) -> Result<Self, AnalysisError> {
        let api_key = config
            .ai
            .api_key
            .clone()
            .ok_or(AnalysisError::MissingApiKey)?;
        Self::new(config.gemini_api_base(), api_key, config.timeout())
    }

    /// Turn a non-2xx response into AnalysisError::Status, keeping the body.
    async fn check(response: reqwest::Response) -> Result<reqwest::Response, AnalysisError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let message = response.text().await.unwrap_or_default();
        Err(AnalysisError::Status {
            status: status.as_u16(),
            message,
        })
    }
}

#[async_trait]
impl ContentGenerator for GeminiClient {
    fn name(&self) -> &str {
        "gemini"
    }

    #[instrument(skip(self, prompt), fields(prompt_len = prompt.len()))]
    async fn generate(&self, model: &str, prompt: &str) -> Result<GeneratedContent, AnalysisError> {
        let model = model.strip_prefix("models/").unwrap_or(model);
        let url = format!("{}/v1beta/models/{}:generateContent", self.api_base, model);

        debug!("calling generateContent");
        let response = self
            .http
            .post(url)
            .header("x-goog-api-key", &self.api_key)
            .json(&GenerateRequest::from_prompt(prompt))
            .send()
            .await?;
        let content = Self::check(response)
            .await?
            .json::<GeneratedContent>()
            .await?;
        debug!(candidates = content.candidates.len(), "received model response");
        Ok(content)
    }

    #[instrument(skip(self))]
    async fn list_models(&self) -> Result<Vec<ModelInfo>, AnalysisError> {
        let url = format!("{}/v1beta/models", self.api_base);
        let response = self
            .http
            .get(url)
            .header("x-goog-api-key", &self.api_key)
            .query(&[("pageSize", "1000")])
            .send()
            .await?;
        let list = Self::check(response).await?.json::<ModelList>().await?;
        debug!(models = list.models.len(), "listed models");
        Ok(list.models)
    }
}

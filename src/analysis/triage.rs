use serde_json::json;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

use super::types::GeneratedContent;
use super::{AnalysisError, ContentGenerator};

/// Sends issue text to a model and hands back the model's JSON verbatim.
///
/// Tries the primary model once, then the fallback model once. Never fails:
/// every failure is reported as a JSON object with an "error" key.
pub struct TriageAnalyzer {
    generator: Arc<dyn ContentGenerator>,
    primary_model: String,
    fallback_model: String,
}

impl TriageAnalyzer {
    pub fn new(
        generator: Arc<dyn ContentGenerator>,
        primary_model: impl Into<String>,
        fallback_model: impl Into<String>,
    ) -> Self {
        Self {
            generator,
            primary_model: primary_model.into(),
            fallback_model: fallback_model.into(),
        }
    }

    pub fn primary_model(&self) -> &str {
        &self.primary_model
    }

    pub fn fallback_model(&self) -> &str {
        &self.fallback_model
    }

    /// Triage `issue_text` and return the model's answer as JSON text.
    #[instrument(skip_all, fields(provider = self.generator.name(), text_len = issue_text.len()))]
    pub async fn analyze(&self, issue_text: &str) -> String {
        let prompt = build_prompt(issue_text);

        let response = match self.generate(&self.primary_model, &prompt).await {
            Ok(response) => response,
            Err(primary_err) => {
                warn!(model = %self.primary_model, error = %primary_err, "primary model failed");
                info!(model = %self.fallback_model, "retrying with fallback model");
                match self.generate(&self.fallback_model, &prompt).await {
                    Ok(response) => response,
                    Err(fallback_err) => {
                        warn!(model = %self.fallback_model, error = %fallback_err, "fallback model failed");
                        return self.failure_report(&fallback_err).await;
                    }
                }
            }
        };

        match response.text() {
            Ok(text) => clean_response(&text),
            Err(e) => {
                warn!(error = %e, "model response has no usable text");
                json!({ "error": format!("AI Parsing failed: {e}") }).to_string()
            }
        }
    }

    async fn generate(&self, model: &str, prompt: &str) -> Result<GeneratedContent, AnalysisError> {
        debug!(model, "invoking model");
        self.generator.generate(model, prompt).await
    }

    /// Error payload once both models have failed, with whatever models the
    /// API says can generate content.
    async fn failure_report(&self, err: &AnalysisError) -> String {
        let available: Vec<String> = match self.generator.list_models().await {
            Ok(models) => models
                .into_iter()
                .filter(|m| m.supports_generate_content())
                .map(|m| m.name)
                .collect(),
            Err(list_err) => {
                debug!(error = %list_err, "model listing failed");
                Vec::new()
            }
        };

        json!({
            "error": format!(
                "Model {} failed. Fallback {} also failed. Available models: [{}]. Error: {}",
                self.primary_model,
                self.fallback_model,
                available.join(", "),
                err
            ),
            "primary_model": self.primary_model,
            "fallback_model": self.fallback_model,
            "available_models": available,
        })
        .to_string()
    }
}

/// Instruction prompt asking for a single JSON object.
pub fn build_prompt(issue_text: &str) -> String {
    format!(
        r#"You are an expert Engineering Manager. Analyze the following GitHub issue and return ONLY a JSON object.

Format requirements:
{{
    "summary": "One sentence summary",
    "type": "bug" | "feature_request" | "documentation" | "question" | "other",
    "priority_score": 1-5 (int),
    "suggested_labels": ["label1", "label2"],
    "potential_impact": "Short sentence on user impact"
}}

Issue Data:
{issue_text}
"#
    )
}

/// Drop Markdown code fences and surrounding whitespace.
pub fn clean_response(text: &str) -> String {
    text.replace("```json", "").replace("```", "").trim().to_string()
}

use crate::engine::{AnalysisEngine, EngineRequest};
use crate::error::{AuditError, Result};
use crate::llm::types::*;
use log::debug;
use reqwest::Client;
use std::env;

const GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
const DEFAULT_MODEL: &str = "gemini-2.5-pro";

#[derive(Debug, Clone)]
pub struct GeminiConfig {
    pub api_key: String,
    pub model: String,
    pub base_url: String,
}

impl GeminiConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            model: DEFAULT_MODEL.to_string(),
            base_url: GEMINI_BASE_URL.to_string(),
        }
    }

    /// Reads `GOOGLE_API_KEY`, and optionally `GEMINI_MODEL` and `GEMINI_BASE_URL`.
    pub fn from_env() -> Result<Self> {
        let api_key = env::var("GOOGLE_API_KEY")
            .ok()
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| AuditError::Configuration("GOOGLE_API_KEY is not set".to_string()))?;

        let mut config = Self::new(api_key);
        if let Ok(model) = env::var("GEMINI_MODEL") {
            config = config.with_model(model);
        }
        if let Ok(base_url) = env::var("GEMINI_BASE_URL") {
            config = config.with_base_url(base_url);
        }
        Ok(config)
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }
}

#[derive(Clone)]
pub struct GeminiClient {
    client: Client,
    config: GeminiConfig,
}

impl GeminiClient {
    pub fn new(config: GeminiConfig) -> Self {
        Self {
            client: Client::new(),
            config,
        }
    }

    pub fn from_env() -> Result<Self> {
        Ok(Self::new(GeminiConfig::from_env()?))
    }

    pub async fn generate_content(
        &self,
        system_prompt: &str,
        prompt: &str,
        response_schema: Option<serde_json::Value>,
    ) -> Result<String> {
        let url = format!(
            "{}/models/{}:generateContent?key={}",
            self.config.base_url, self.config.model, self.config.api_key
        );

        let payload = GenerateContentRequest {
            contents: vec![Content::user(prompt)],
            system_instruction: Some(Content::system(system_prompt)),
            generation_config: GenerationConfig {
                response_mime_type: "application/json".to_string(),
                response_schema,
            },
        };

        debug!(
            "Calling Gemini model {} ({} prompt bytes)",
            self.config.model,
            prompt.len()
        );

        let res = self.client.post(&url).json(&payload).send().await?;
        let status = res.status();

        if !status.is_success() {
            let err_text = res.text().await?;
            return Err(AuditError::Engine(format!(
                "Gemini API Error (status {}): {}",
                status, err_text
            )));
        }

        let body: GenerateContentResponse = res.json().await?;

        let candidate = body
            .candidates
            .ok_or_else(|| {
                AuditError::Engine(match body.prompt_feedback {
                    Some(feedback) => format!("No candidates returned: {}", feedback),
                    None => "No candidates returned".to_string(),
                })
            })?
            .into_iter()
            .next()
            .ok_or_else(|| AuditError::Engine("Empty candidates list".to_string()))?;

        candidate
            .content
            .and_then(|content| content.text())
            .ok_or_else(|| {
                AuditError::Engine(format!(
                    "Model returned no text content (finish reason: {})",
                    candidate.finish_reason.as_deref().unwrap_or("unknown")
                ))
            })
    }
}

impl AnalysisEngine for GeminiClient {
    async fn invoke(&self, request: &EngineRequest) -> Result<String> {
        self.generate_content(
            &request.instructions,
            &request.prompt,
            Some(to_response_schema(&request.schema)),
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_builders() {
        let config = GeminiConfig::new("key")
            .with_model("gemini-2.5-flash")
            .with_base_url("http://localhost:8080/v1beta/");
        assert_eq!(config.model, "gemini-2.5-flash");
        assert_eq!(config.base_url, "http://localhost:8080/v1beta");
        assert_eq!(GeminiConfig::new("key").model, DEFAULT_MODEL);
    }
}

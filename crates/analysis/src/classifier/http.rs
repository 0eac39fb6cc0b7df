use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, error};

use super::{ClassificationRequest, ClassificationResponse, SegmentClassifier};
use crate::error::AnalysisError;

/// Connection settings for an OpenAI-compatible chat-completions service.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassifierConfig {
    /// Base URL, e.g. "https://api.openai.com/v1".
    pub endpoint: String,
    pub model: String,
    /// Bearer credential. Empty = not configured.
    pub api_key: String,
    pub temperature: f32,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://api.openai.com/v1".to_string(),
            model: "gpt-4o-mini".to_string(),
            api_key: String::new(),
            temperature: 0.0,
        }
    }
}

#[derive(Serialize, Deserialize, Debug)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Serialize, Debug)]
struct ResponseFormat {
    #[serde(rename = "type")]
    kind: &'static str,
}

#[derive(Serialize, Debug)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    temperature: f32,
    response_format: ResponseFormat,
}

#[derive(Deserialize, Debug)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Deserialize, Debug)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

/// Classifies segments through a chat-completions endpoint in JSON mode.
///
/// The request instructions go out as the system message and the segment text
/// as the user message; the reply content must be the classification JSON.
pub struct HttpClassifier {
    config: ClassifierConfig,
    client: reqwest::Client,
}

impl HttpClassifier {
    pub fn new(config: ClassifierConfig) -> Self {
        Self {
            config,
            client: reqwest::Client::new(),
        }
    }

    /// Builds a client whose requests give up after `timeout`.
    pub fn with_timeout(config: ClassifierConfig, timeout: Duration) -> Result<Self, AnalysisError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AnalysisError::Configuration(format!("HTTP client: {e}")))?;
        Ok(Self { config, client })
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.config.endpoint.trim_end_matches('/'))
    }
}

#[async_trait]
impl SegmentClassifier for HttpClassifier {
    async fn classify(&self, request: ClassificationRequest) -> Result<ClassificationResponse, AnalysisError> {
        self.ensure_configured()?;

        let body = ChatRequest {
            model: self.config.model.clone(),
            messages: vec![
                ChatMessage {
                    role: "system".to_string(),
                    content: request.instructions,
                },
                ChatMessage {
                    role: "user".to_string(),
                    content: request.transcript_segment,
                },
            ],
            temperature: self.config.temperature,
            response_format: ResponseFormat { kind: "json_object" },
        };

        let endpoint = self.endpoint();
        debug!(%endpoint, model = %self.config.model, "Sending classification request");

        let response = self
            .client
            .post(&endpoint)
            .bearer_auth(&self.config.api_key)
            .json(&body)
            .send()
            .await
            .inspect_err(|e| error!("Failed to send classification request: {}", e))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            error!(%status, "Classification service error: {}", error_text);
            return Err(AnalysisError::Network(format!("{status}: {error_text}")));
        }

        let chat: ChatResponse = response.json().await?;

        let content = chat
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .ok_or_else(|| AnalysisError::Decode("response has no choices".to_string()))?;

        let parsed: ClassificationResponse = serde_json::from_str(strip_code_fence(&content))?;
        debug!(
            total = parsed.total_filler_count,
            words = parsed.filler_words.len(),
            "Classification response parsed"
        );
        Ok(parsed)
    }

    fn name(&self) -> &str {
        "http"
    }

    fn ensure_configured(&self) -> Result<(), AnalysisError> {
        if self.config.api_key.trim().is_empty() {
            return Err(AnalysisError::Configuration("no API key for classification service".to_string()));
        }
        if self.config.endpoint.trim().is_empty() {
            return Err(AnalysisError::Configuration("no classification endpoint".to_string()));
        }
        Ok(())
    }
}

/// Models sometimes wrap JSON mode output in a ```json fence anyway.
fn strip_code_fence(content: &str) -> &str {
    let trimmed = content.trim();
    trimmed
        .strip_prefix("```json")
        .or_else(|| trimmed.strip_prefix("```"))
        .and_then(|rest| rest.strip_suffix("```"))
        .map(str::trim)
        .unwrap_or(trimmed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_code_fence() {
        assert_eq!(strip_code_fence("{\"a\":1}"), "{\"a\":1}");
        assert_eq!(strip_code_fence("```json\n{\"a\":1}\n```"), "{\"a\":1}");
        assert_eq!(strip_code_fence("```\n{}\n```"), "{}");
        assert_eq!(strip_code_fence("  {}  "), "{}");
    }

    #[test]
    fn test_missing_key_is_configuration_error() {
        let classifier = HttpClassifier::new(ClassifierConfig::default());
        assert!(matches!(
            classifier.ensure_configured(),
            Err(AnalysisError::Configuration(_))
        ));
    }

    #[test]
    fn test_endpoint_trailing_slash() {
        let classifier = HttpClassifier::new(ClassifierConfig {
            endpoint: "http://localhost:8080/v1/".into(),
            ..ClassifierConfig::default()
        });
        assert_eq!(classifier.endpoint(), "http://localhost:8080/v1/chat/completions");
    }
}

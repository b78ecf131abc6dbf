use crate::traits::{LlmClient, LlmResponse};
use async_trait::async_trait;
use bitaudit_common::{AuditError, Result};
use bitaudit_http::{HttpClient, HttpError};
use serde::{Deserialize, Serialize};

const SONAR_API_BASE: &str = "https://api.perplexity.ai/";

/// Perplexity Sonar client, used as the web-grounded capability.
///
/// The wire format is OpenAI-compatible chat completions; only the
/// endpoint and model family differ.
pub struct SonarClient {
    client: HttpClient,
    api_key: String,
    model: String,
    default_temperature: Option<f32>,
}

#[derive(Serialize)]
struct ChatCompletionsRequest {
    model: String,
    messages: Vec<ChatMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
}

#[derive(Serialize, Deserialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Deserialize)]
struct ChatCompletionsResponse {
    #[serde(default)]
    model: Option<String>,
    #[serde(default)]
    choices: Vec<ChatChoice>,
    #[serde(default)]
    usage: Option<ChatUsage>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Deserialize)]
struct ChatUsage {
    #[serde(default)]
    total_tokens: Option<u32>,
}

impl SonarClient {
    /// Create a new client for the given API key and model.
    pub fn new(api_key: String, model: String) -> Result<Self> {
        Self::with_base_url(api_key, model, SONAR_API_BASE)
    }

    /// Create a client against a compatible endpoint (tests, gateways).
    pub fn with_base_url(api_key: String, model: String, base_url: &str) -> Result<Self> {
        let client = HttpClient::new(base_url)
            .map_err(|e| AuditError::Llm(format!("HttpClient init failed: {e}")))?;

        Ok(Self {
            client,
            api_key,
            model,
            default_temperature: None,
        })
    }

    pub fn with_default_temperature(mut self, temperature: Option<f32>) -> Self {
        self.default_temperature = temperature;
        self
    }
}

#[async_trait]
impl LlmClient for SonarClient {
    async fn generate(
        &self,
        prompt: &str,
        system_prompt: Option<&str>,
        max_tokens: Option<u32>,
        temperature: Option<f32>,
    ) -> Result<LlmResponse> {
        let mut messages = Vec::with_capacity(2);
        if let Some(sys) = system_prompt {
            messages.push(ChatMessage {
                role: "system".to_string(),
                content: sys.to_string(),
            });
        }
        messages.push(ChatMessage {
            role: "user".to_string(),
            content: prompt.to_string(),
        });

        let req = ChatCompletionsRequest {
            model: self.model.clone(),
            messages,
            temperature: temperature.or(self.default_temperature),
            max_tokens,
        };

        let resp: ChatCompletionsResponse = self
            .client
            .post_json("chat/completions", Some(&self.api_key), &req)
            .await
            .map_err(http_to_audit)?;

        let text = resp
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .unwrap_or_default();

        Ok(LlmResponse {
            text,
            model: resp.model.or_else(|| Some(self.model.clone())),
            tokens_used: resp.usage.and_then(|u| u.total_tokens),
        })
    }

    async fn health_check(&self) -> Result<bool> {
        match self.generate("Respond with just 'OK'", None, Some(5), Some(0.1)).await {
            Ok(_) => Ok(true),
            Err(e) => {
                tracing::warn!("Sonar health check failed: {}", e);
                Ok(false)
            }
        }
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}

fn http_to_audit(e: HttpError) -> AuditError {
    AuditError::Llm(format!("{e}"))
}

use crate::traits::{LlmClient, LlmResponse};
use async_trait::async_trait;
use bitaudit_common::{AuditError, Result};
use bitaudit_http::{HttpClient, HttpError};
use serde::{Deserialize, Serialize};

const OPENAI_API_BASE: &str = "https://api.openai.com/v1/";

/// OpenAI Responses API client.
///
/// The base URL is overridable so OpenAI-compatible gateways can be pointed
/// at without code changes.
pub struct OpenAiClient {
    client: HttpClient,
    api_key: String,
    model: String,
    default_max_tokens: Option<u32>,
    default_temperature: Option<f32>,
}

#[derive(Serialize)]
struct ResponsesApiRequest {
    model: String,
    input: String,
    instructions: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_output_tokens: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct ResponsesApiResponse {
    model: String,
    #[serde(default)]
    output: Vec<ResponseMessage>,
    #[serde(default)]
    usage: Option<ResponseUsage>,
}

/// One element in the `output` array.
#[derive(Debug, Deserialize)]
struct ResponseMessage {
    #[serde(default)]
    content: Vec<ResponseContent>,
}

/// One part of the message `content`.
#[derive(Debug, Deserialize)]
struct ResponseContent {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    text: String,
}

#[derive(Debug, Deserialize)]
struct ResponseUsage {
    #[serde(default)]
    total_tokens: Option<u32>,
}

impl OpenAiClient {
    /// Create a new client for the given API key and model.
    pub fn new(api_key: String, model: String) -> Result<Self> {
        Self::with_base_url(api_key, model, OPENAI_API_BASE)
    }

    /// Create a client against an OpenAI-compatible endpoint.
    pub fn with_base_url(api_key: String, model: String, base_url: &str) -> Result<Self> {
        let client = HttpClient::new(base_url)
            .map_err(|e| AuditError::Llm(format!("HttpClient init failed: {e}")))?;

        Ok(Self {
            client,
            api_key,
            model,
            default_max_tokens: None,
            default_temperature: None,
        })
    }

    /// Defaults applied when a call does not pass its own knobs.
    pub fn with_defaults(mut self, max_tokens: Option<u32>, temperature: Option<f32>) -> Self {
        self.default_max_tokens = max_tokens;
        self.default_temperature = temperature;
        self
    }
}

#[async_trait]
impl LlmClient for OpenAiClient {
    async fn generate(
        &self,
        prompt: &str,
        system_prompt: Option<&str>,
        max_tokens: Option<u32>,
        temperature: Option<f32>,
    ) -> Result<LlmResponse> {
        let instructions = match system_prompt {
            Some(s) => s.to_string(),
            None => "You are an objective, unbiased researcher.".to_string(),
        };

        let req = ResponsesApiRequest {
            model: self.model.clone(),
            input: prompt.to_string(),
            instructions,
            temperature: temperature.or(self.default_temperature),
            max_output_tokens: max_tokens.or(self.default_max_tokens),
        };

        let resp: ResponsesApiResponse = self
            .client
            .post_json("responses", Some(&self.api_key), &req)
            .await
            .map_err(http_to_audit)?;

        let text = resp
            .output
            .iter()
            .flat_map(|msg| &msg.content)
            .find(|c| c.kind == "output_text")
            .map(|c| c.text.clone())
            .unwrap_or_default();

        Ok(LlmResponse {
            text,
            model: Some(resp.model),
            tokens_used: resp.usage.and_then(|u| u.total_tokens),
        })
    }

    async fn health_check(&self) -> Result<bool> {
        let test_prompt = "Respond with just 'OK'";

        match self.generate(test_prompt, None, Some(5), Some(0.1)).await {
            Ok(_) => Ok(true),
            Err(e) => {
                tracing::warn!("OpenAi health check failed: {}", e);
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

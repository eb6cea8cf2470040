//! OpenRouter-backed gateway implementation.
//!
//! Posts chat completions with a schema-constrained response format and
//! falls back to plain text when the provider rejects it. Timeouts and
//! retries live here; the pipeline treats every failure uniformly.

use crate::llm::{GatewayError, LlmGateway};
use async_trait::async_trait;
use serde_json::{json, Value};
use std::time::Duration;

const DEFAULT_BASE_URL: &str = "https://openrouter.ai/api/v1/chat/completions";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
const MAX_TOKENS: u32 = 200;

const STRUCTURED_SYSTEM_PROMPT: &str = "You are an expert poker player. Analyze the situation and make the best decision.\n\n\
IMPORTANT: You must respond with valid JSON in this exact format:\n\
{\n\
  \"action\": \"FOLD\" | \"CHECK\" | \"CALL\" | \"RAISE\",\n\
  \"amount\": integer (raise total if RAISE, otherwise 0),\n\
  \"reasoning\": \"brief explanation\",\n\
  \"confidence\": number between 0.0 and 1.0\n\
}";

const TEXT_SYSTEM_PROMPT: &str =
    "You are an expert poker player. Always respond in the exact format requested.";

pub struct OpenRouterGateway {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
}

impl OpenRouterGateway {
    pub fn new(api_key: impl Into<String>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .unwrap_or_default();
        Self {
            client,
            api_key: api_key.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    async fn post(&self, payload: Value) -> Result<String, GatewayError> {
        let response = self
            .client
            .post(&self.base_url)
            .bearer_auth(&self.api_key)
            .json(&payload)
            .send()
            .await
            .map_err(|e| GatewayError::Failed(e.to_string()))?;

        let status = response.status();
        let body: Value = response
            .json()
            .await
            .map_err(|e| GatewayError::Failed(e.to_string()))?;

        if !status.is_success() {
            let message = body["error"]["message"]
                .as_str()
                .unwrap_or("unknown error")
                .to_string();
            // Providers that cannot honor response_format report it here
            if message.contains("response_format") || message.contains("structured") {
                return Err(GatewayError::Unsupported);
            }
            return Err(GatewayError::Failed(format!("{}: {}", status, message)));
        }

        body["choices"][0]["message"]["content"]
            .as_str()
            .map(|s| s.to_string())
            .ok_or_else(|| GatewayError::Failed("missing completion content".to_string()))
    }
}

#[async_trait]
impl LlmGateway for OpenRouterGateway {
    async fn complete_structured(
        &self,
        model: &str,
        prompt: &str,
        schema: &Value,
    ) -> Result<Value, GatewayError> {
        let payload = json!({
            "model": model,
            "messages": [
                {"role": "system", "content": STRUCTURED_SYSTEM_PROMPT},
                {"role": "user", "content": prompt},
            ],
            "response_format": {
                "type": "json_schema",
                "json_schema": schema,
            },
            "max_tokens": MAX_TOKENS,
            "temperature": 0.1,
        });

        let content = self.post(payload).await?;
        serde_json::from_str(&content)
            .map_err(|e| GatewayError::Failed(format!("completion was not JSON: {}", e)))
    }

    async fn complete_text(&self, model: &str, prompt: &str) -> Result<String, GatewayError> {
        let payload = json!({
            "model": model,
            "messages": [
                {"role": "system", "content": TEXT_SYSTEM_PROMPT},
                {"role": "user", "content": prompt},
            ],
            "max_tokens": MAX_TOKENS,
            "temperature": 0.7,
        });

        self.post(payload).await
    }
}

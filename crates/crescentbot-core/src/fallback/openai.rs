//! OpenAI-compatible chat completion client.
//!
//! Speaks the `/chat/completions` wire format, which covers OpenAI itself
//! and every compatible server (Groq, Ollama, llama.cpp, vLLM). Providers
//! differ only by base URL and API key.

use async_trait::async_trait;
use serde_json::{json, Value};

use super::{ChatRole, FallbackError, FallbackRequest, GenerativeProvider};

/// Default public endpoint.
const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

/// Chat-completion client for any OpenAI-compatible endpoint.
pub struct OpenAiChat {
    base_url: String,
    api_key: String,
    client: reqwest::Client,
}

impl OpenAiChat {
    /// Create a client for an explicit endpoint. An empty API key sends no
    /// auth header (local servers).
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            client: reqwest::Client::new(),
        }
    }

    /// Create a client from `OPENAI_BASE_URL` and `OPENAI_API_KEY`.
    pub fn from_env() -> Self {
        let base_url =
            std::env::var("OPENAI_BASE_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.to_string());
        let api_key = std::env::var("OPENAI_API_KEY").unwrap_or_default();
        Self::new(base_url, api_key)
    }

    fn apply_auth(&self, req: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        if self.api_key.is_empty() {
            req
        } else {
            req.header("Authorization", format!("Bearer {}", self.api_key))
        }
    }

    fn role_str(role: ChatRole) -> &'static str {
        match role {
            ChatRole::System => "system",
            ChatRole::User => "user",
            ChatRole::Assistant => "assistant",
        }
    }
}

#[async_trait]
impl GenerativeProvider for OpenAiChat {
    async fn generate(&self, request: &FallbackRequest) -> Result<String, FallbackError> {
        let mut messages: Vec<Value> = Vec::with_capacity(request.messages.len() + 1);
        messages.push(json!({ "role": "system", "content": request.system }));
        for turn in &request.messages {
            messages.push(json!({
                "role": Self::role_str(turn.role),
                "content": turn.content,
            }));
        }

        let mut body = json!({
            "model": request.model,
            "temperature": request.temperature,
            "messages": messages,
        });
        if let Some(max_tokens) = request.max_tokens {
            body["max_tokens"] = json!(max_tokens);
        }

        let url = format!("{}/chat/completions", self.base_url);
        let req = self
            .client
            .post(&url)
            .header("Content-Type", "application/json")
            .json(&body);

        let resp = self
            .apply_auth(req)
            .send()
            .await
            .map_err(|e| FallbackError::Transport(format!("{url}: {e}")))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(FallbackError::Api {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: Value = resp
            .json()
            .await
            .map_err(|e| FallbackError::Malformed(e.to_string()))?;

        parsed["choices"]
            .get(0)
            .and_then(|choice| choice["message"]["content"].as_str())
            .map(|content| content.trim().to_string())
            .ok_or_else(|| FallbackError::Malformed("no choices in response".to_string()))
    }
}

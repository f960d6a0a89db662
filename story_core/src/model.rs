use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error surface of the generative text endpoint. Rate limits are a
/// distinct kind so the retry policy can single them out.
#[derive(Debug, Error)]
pub enum ModelError {
    #[error("text model rate limited")]
    RateLimited,

    #[error("text model request failed: {0}")]
    Upstream(String),
}

/// Seam for the generative text endpoint. The orchestrator only ever
/// talks to this trait; tests substitute scripted models.
#[async_trait]
pub trait TextModel: Send + Sync {
    /// Send a single prompt and return the raw candidate text.
    async fn generate(&self, prompt: &str) -> Result<String, ModelError>;
}

/// Structure for the chat-completions request
#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<Message<'a>>,
    max_tokens: u16,
    temperature: f32,
}

#[derive(Serialize)]
struct Message<'a> {
    role: &'a str,
    content: &'a str,
}

/// Structure for the chat-completions response
#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Deserialize)]
struct ResponseMessage {
    content: String,
}

/// HTTP client for an OpenAI-compatible chat-completions endpoint.
pub struct GenAiClient {
    endpoint: String,
    api_key: String,
    model: String,
    client: Client,
}

impl GenAiClient {
    pub fn new(endpoint: &str, api_key: &str, model: &str) -> Self {
        Self {
            endpoint: endpoint.to_string(),
            api_key: api_key.to_string(),
            model: model.to_string(),
            client: Client::new(),
        }
    }
}

#[async_trait]
impl TextModel for GenAiClient {
    async fn generate(&self, prompt: &str) -> Result<String, ModelError> {
        let req_body = ChatRequest {
            model: &self.model,
            messages: vec![
                Message {
                    role: "system",
                    content: "You are a bedtime narrator writing for spoken audio.",
                },
                Message {
                    role: "user",
                    content: prompt,
                },
            ],
            // Raised ceiling so long-tier stories are not cut off mid-JSON.
            max_tokens: 4096,
            temperature: 0.45,
        };

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&req_body)
            .send()
            .await
            .map_err(|e| ModelError::Upstream(e.to_string()))?;

        if response.status() == StatusCode::TOO_MANY_REQUESTS {
            return Err(ModelError::RateLimited);
        }
        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            // Some providers signal overload in the body instead of the
            // status line.
            if body.contains("RESOURCE_EXHAUSTED") {
                return Err(ModelError::RateLimited);
            }
            return Err(ModelError::Upstream(format!("status {status}: {body}")));
        }

        let parsed = response
            .json::<ChatResponse>()
            .await
            .map_err(|e| ModelError::Upstream(e.to_string()))?;

        let reply = parsed
            .choices
            .first()
            .map(|choice| choice.message.content.clone())
            .unwrap_or_default();
        Ok(reply)
    }
}

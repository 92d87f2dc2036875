use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};
use url::Url;

use crate::error::ChatError;

/// Chat-completion collaborator. The pipeline only needs free text back;
/// prompt construction lives in [`crate::prompts`].
#[async_trait]
pub trait ChatClient: Send + Sync {
    async fn chat(
        &self,
        system_prompt: &str,
        user_prompt: &str,
        temperature: f32,
    ) -> Result<String, ChatError>;
}

/// Non-streaming chat over the Ollama HTTP API.
pub struct OllamaChat {
    endpoint: Url,
    model: String,
    client: Client,
}

impl OllamaChat {
    pub fn new(endpoint: &str, model: impl Into<String>) -> Result<Self, ChatError> {
        Ok(Self {
            endpoint: Url::parse(endpoint)?,
            model: model.into(),
            client: Client::new(),
        })
    }

    /// Whether the chat model produces any output at all; used by
    /// readiness checks, where failure is a status rather than an error.
    pub async fn probe(&self) -> bool {
        self.chat("", "ok", 0.0)
            .await
            .map(|content| !content.is_empty())
            .unwrap_or(false)
    }
}

#[async_trait]
impl ChatClient for OllamaChat {
    async fn chat(
        &self,
        system_prompt: &str,
        user_prompt: &str,
        temperature: f32,
    ) -> Result<String, ChatError> {
        let response = self
            .client
            .post(self.endpoint.join("api/chat")?)
            .json(&json!({
                "model": self.model,
                "stream": false,
                "messages": [
                    { "role": "system", "content": system_prompt },
                    { "role": "user", "content": user_prompt },
                ],
                "options": { "temperature": temperature },
            }))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(ChatError::Backend {
                status: status.as_u16(),
                detail: response.text().await.unwrap_or_else(|_| status.to_string()),
            });
        }

        let payload: Value = response.json().await?;
        Ok(extract_content(&payload))
    }
}

fn extract_content(payload: &Value) -> String {
    payload
        .pointer("/message/content")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .trim()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::extract_content;
    use serde_json::json;

    #[test]
    fn content_is_extracted_and_trimmed() {
        let payload = json!({ "message": { "role": "assistant", "content": "  hello\n" } });
        assert_eq!(extract_content(&payload), "hello");
    }

    #[test]
    fn missing_content_becomes_empty() {
        assert_eq!(extract_content(&json!({})), "");
        assert_eq!(extract_content(&json!({ "message": {} })), "");
    }
}

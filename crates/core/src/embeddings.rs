use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use serde_json::Value;
use url::Url;

use crate::error::EmbedError;

/// Sentinel embedded by [`OllamaEmbedder::probe`] to learn the model's
/// vector dimension.
const PROBE_TEXT: &str = "ok";

/// Gateway to the embedding provider. Both the indexer and the retriever
/// depend on this seam; failures are opaque provider errors and are never
/// retried here.
#[async_trait]
pub trait Embedder: Send + Sync {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbedError>;

    /// Embeds many texts in order. Batching only bounds log noise and
    /// future concurrency; each text is embedded independently, so the
    /// grouping has no effect on the resulting vectors.
    async fn embed_batch(
        &self,
        texts: &[String],
        batch_size: usize,
    ) -> Result<Vec<Vec<f32>>, EmbedError> {
        let mut embeddings = Vec::with_capacity(texts.len());
        for (batch_no, batch) in texts.chunks(batch_size.max(1)).enumerate() {
            tracing::debug!(batch = batch_no, size = batch.len(), "embedding batch");
            for text in batch {
                embeddings.push(self.embed(text).await?);
            }
        }
        Ok(embeddings)
    }
}

/// Embeddings over the Ollama HTTP API.
pub struct OllamaEmbedder {
    endpoint: Url,
    model: String,
    client: Client,
}

#[derive(Debug, Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    prompt: &'a str,
}

impl OllamaEmbedder {
    pub fn new(endpoint: &str, model: impl Into<String>) -> Result<Self, EmbedError> {
        Ok(Self {
            endpoint: Url::parse(endpoint)?,
            model: model.into(),
            client: Client::new(),
        })
    }

    /// Embeds a sentinel and returns the vector dimension. Used as a
    /// readiness check before indexing or serving.
    pub async fn probe(&self) -> Result<usize, EmbedError> {
        let vector = self.embed(PROBE_TEXT).await?;
        Ok(vector.len())
    }
}

#[async_trait]
impl Embedder for OllamaEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbedError> {
        let response = self
            .client
            .post(self.endpoint.join("api/embeddings")?)
            .json(&EmbeddingRequest {
                model: &self.model,
                prompt: text,
            })
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(EmbedError::Backend {
                status: status.as_u16(),
                detail: response.text().await.unwrap_or_else(|_| status.to_string()),
            });
        }

        let payload: Value = response.json().await?;
        parse_embedding(&payload)
    }
}

fn parse_embedding(payload: &Value) -> Result<Vec<f32>, EmbedError> {
    let values = payload
        .pointer("/embedding")
        .and_then(Value::as_array)
        .ok_or_else(|| EmbedError::MalformedResponse("missing embedding array".to_string()))?;

    if values.is_empty() {
        return Err(EmbedError::MalformedResponse(
            "empty embedding array".to_string(),
        ));
    }

    values
        .iter()
        .map(|value| {
            value.as_f64().map(|v| v as f32).ok_or_else(|| {
                EmbedError::MalformedResponse("non-numeric embedding value".to_string())
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::parse_embedding;
    use crate::error::EmbedError;
    use serde_json::json;

    #[test]
    fn embedding_payload_is_parsed() {
        let payload = json!({ "embedding": [0.25, -1.5, 3.0] });
        let vector = parse_embedding(&payload).expect("payload should parse");
        assert_eq!(vector, vec![0.25, -1.5, 3.0]);
    }

    #[test]
    fn missing_embedding_is_malformed() {
        let payload = json!({ "model": "nomic-embed-text" });
        let result = parse_embedding(&payload);
        assert!(matches!(result, Err(EmbedError::MalformedResponse(_))));
    }

    #[test]
    fn empty_embedding_is_malformed() {
        let payload = json!({ "embedding": [] });
        let result = parse_embedding(&payload);
        assert!(matches!(result, Err(EmbedError::MalformedResponse(_))));
    }

    #[test]
    fn non_numeric_values_are_malformed() {
        let payload = json!({ "embedding": [0.1, "oops"] });
        let result = parse_embedding(&payload);
        assert!(matches!(result, Err(EmbedError::MalformedResponse(_))));
    }
}

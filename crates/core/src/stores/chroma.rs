use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};
use std::collections::HashMap;
use url::Url;

use super::{CollectionCount, DeleteOutcome, VectorStore};
use crate::error::StoreError;
use crate::models::{FragmentBatch, Neighbor, SourceCount};

const BACKEND: &str = "chroma";

/// Fragment collection backed by a Chroma server's REST API.
///
/// The collection is created lazily (get-or-create) and persists on the
/// server side across process restarts; this client keeps no state beyond
/// the endpoint and collection name.
pub struct ChromaStore {
    endpoint: Url,
    collection: String,
    client: Client,
}

impl ChromaStore {
    pub fn new(endpoint: &str, collection: impl Into<String>) -> Result<Self, StoreError> {
        Ok(Self {
            endpoint: Url::parse(endpoint)?,
            collection: collection.into(),
            client: Client::new(),
        })
    }

    /// Resolves the collection id, creating the collection on first use.
    async fn collection_id(&self) -> Result<String, StoreError> {
        let response = self
            .client
            .post(self.endpoint.join("api/v1/collections")?)
            .json(&json!({ "name": self.collection, "get_or_create": true }))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(backend_error(format!("get_or_create returned {status}")));
        }

        let payload: Value = response.json().await?;
        payload
            .pointer("/id")
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| backend_error("collection response missing id".to_string()))
    }

    fn collection_url(&self, id: &str, operation: &str) -> Result<Url, StoreError> {
        Ok(self
            .endpoint
            .join(&format!("api/v1/collections/{id}/{operation}"))?)
    }
}

#[async_trait]
impl VectorStore for ChromaStore {
    async fn upsert(&self, batch: &FragmentBatch) -> Result<(), StoreError> {
        if batch.is_empty() {
            return Ok(());
        }

        let id = self.collection_id().await?;
        let response = self
            .client
            .post(self.collection_url(&id, "upsert")?)
            .json(&json!({
                "ids": batch.ids,
                "embeddings": batch.embeddings,
                "documents": batch.contents,
                "metadatas": batch.metadata,
            }))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(backend_error(format!("upsert returned {status}")));
        }

        Ok(())
    }

    async fn delete_source(&self, source: &str) -> Result<DeleteOutcome, StoreError> {
        let id = self.collection_id().await?;
        let response = self
            .client
            .post(self.collection_url(&id, "delete")?)
            .json(&json!({ "where": { "source": source } }))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(backend_error(format!("delete returned {status}")));
        }

        // Chroma answers with the list of deleted ids.
        let payload: Value = response.json().await?;
        let deleted = payload.as_array().map(Vec::len).unwrap_or(0);
        if deleted == 0 {
            Ok(DeleteOutcome::NoPriorFragments)
        } else {
            Ok(DeleteOutcome::Deleted)
        }
    }

    async fn query(&self, vector: &[f32], k: usize) -> Result<Vec<Neighbor>, StoreError> {
        let id = self.collection_id().await?;
        let response = self
            .client
            .post(self.collection_url(&id, "query")?)
            .json(&json!({
                "query_embeddings": [vector],
                "n_results": k,
                "include": ["documents", "metadatas", "distances"],
            }))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(backend_error(format!("query returned {status}")));
        }

        let payload: Value = response.json().await?;
        Ok(parse_query_response(&payload))
    }

    async fn count(&self) -> Result<CollectionCount, StoreError> {
        let id = self.collection_id().await?;
        let response = self
            .client
            .get(self.collection_url(&id, "count")?)
            .send()
            .await?;

        if response.status().is_success() {
            if let Ok(payload) = response.json::<Value>().await {
                if let Some(count) = payload.as_u64() {
                    return Ok(CollectionCount::Reported(count as usize));
                }
            }
        }

        tracing::debug!(collection = %self.collection, "count unavailable, enumerating ids");
        let response = self
            .client
            .post(self.collection_url(&id, "get")?)
            .json(&json!({ "include": [] }))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(backend_error(format!("get returned {status}")));
        }

        let payload: Value = response.json().await?;
        let ids = payload
            .pointer("/ids")
            .and_then(Value::as_array)
            .map(Vec::len)
            .unwrap_or(0);
        Ok(CollectionCount::Enumerated(ids))
    }

    async fn source_counts(&self) -> Result<Vec<SourceCount>, StoreError> {
        let id = self.collection_id().await?;
        let response = self
            .client
            .post(self.collection_url(&id, "get")?)
            .json(&json!({ "include": ["metadatas"] }))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(backend_error(format!("get returned {status}")));
        }

        let payload: Value = response.json().await?;
        Ok(aggregate_source_counts(&payload))
    }
}

fn backend_error(details: String) -> StoreError {
    StoreError::BackendResponse {
        backend: BACKEND.to_string(),
        details,
    }
}

/// Chroma nests query results one level per query embedding; this client
/// always sends exactly one, so only the first batch matters.
fn parse_query_response(payload: &Value) -> Vec<Neighbor> {
    let ids = first_batch(payload, "ids");
    let documents = first_batch(payload, "documents");
    let metadatas = first_batch(payload, "metadatas");
    let distances = first_batch(payload, "distances");

    let len = ids.len().max(documents.len());
    let mut neighbors = Vec::with_capacity(len);

    for position in 0..len {
        let meta = metadatas.get(position);
        neighbors.push(Neighbor {
            id: ids
                .get(position)
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string(),
            content: documents
                .get(position)
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string(),
            source: meta
                .and_then(|m| m.pointer("/source"))
                .and_then(Value::as_str)
                .unwrap_or("unk")
                .to_string(),
            index: meta.and_then(|m| m.pointer("/chunk")).and_then(Value::as_u64),
            distance: distances
                .get(position)
                .and_then(Value::as_f64)
                .map(|d| d as f32),
        });
    }

    neighbors
}

fn first_batch<'a>(payload: &'a Value, key: &str) -> &'a [Value] {
    payload
        .pointer(&format!("/{key}/0"))
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or(&[])
}

fn aggregate_source_counts(payload: &Value) -> Vec<SourceCount> {
    let mut counts: HashMap<String, usize> = HashMap::new();

    if let Some(metadatas) = payload.pointer("/metadatas").and_then(Value::as_array) {
        for meta in metadatas {
            let source = meta
                .pointer("/source")
                .and_then(Value::as_str)
                .unwrap_or("unk")
                .to_string();
            *counts.entry(source).or_insert(0) += 1;
        }
    }

    let mut sources: Vec<SourceCount> = counts
        .into_iter()
        .map(|(source, chunks)| SourceCount { source, chunks })
        .collect();
    sources.sort_by(|a, b| b.chunks.cmp(&a.chunks).then_with(|| a.source.cmp(&b.source)));
    sources
}

#[cfg(test)]
mod tests {
    use super::{aggregate_source_counts, parse_query_response};
    use serde_json::json;

    #[test]
    fn query_response_is_parsed_in_order() {
        let payload = json!({
            "ids": [["id-a", "id-b"]],
            "documents": [["first text", "second text"]],
            "metadatas": [[
                { "source": "a.pdf", "chunk": 0 },
                { "source": "b.pdf", "chunk": 4 },
            ]],
            "distances": [[0.12, 0.57]],
        });

        let neighbors = parse_query_response(&payload);
        assert_eq!(neighbors.len(), 2);
        assert_eq!(neighbors[0].id, "id-a");
        assert_eq!(neighbors[0].source, "a.pdf");
        assert_eq!(neighbors[0].index, Some(0));
        assert_eq!(neighbors[0].distance, Some(0.12));
        assert_eq!(neighbors[1].content, "second text");
        assert_eq!(neighbors[1].index, Some(4));
    }

    #[test]
    fn missing_metadata_and_distance_become_defaults() {
        let payload = json!({
            "ids": [["id-a"]],
            "documents": [["text"]],
            "metadatas": [[null]],
            "distances": [[null]],
        });

        let neighbors = parse_query_response(&payload);
        assert_eq!(neighbors.len(), 1);
        assert_eq!(neighbors[0].source, "unk");
        assert_eq!(neighbors[0].index, None);
        assert_eq!(neighbors[0].distance, None);
    }

    #[test]
    fn empty_payload_parses_to_no_neighbors() {
        let neighbors = parse_query_response(&json!({}));
        assert!(neighbors.is_empty());
    }

    #[test]
    fn source_counts_are_aggregated_largest_first() {
        let payload = json!({
            "ids": ["1", "2", "3"],
            "metadatas": [
                { "source": "a.pdf", "chunk": 0 },
                { "source": "b.pdf", "chunk": 0 },
                { "source": "b.pdf", "chunk": 1 },
            ],
        });

        let counts = aggregate_source_counts(&payload);
        assert_eq!(counts.len(), 2);
        assert_eq!(counts[0].source, "b.pdf");
        assert_eq!(counts[0].chunks, 2);
        assert_eq!(counts[1].source, "a.pdf");
        assert_eq!(counts[1].chunks, 1);
    }
}

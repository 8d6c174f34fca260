//! `POST /embed` collaborator (§6), used only by ingest to populate
//! `NormalizedDocument::embedding`. Retrieval itself is lexical (§4.9) and
//! never calls this.

use std::time::Duration;

use async_trait::async_trait;
use docqa_core::{EmbeddingBatch, EmbeddingClient, Error, Result};
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::error::LlmError;

#[derive(Debug, Serialize)]
struct EmbedRequest<'a> {
    texts: &'a [String],
    normalize: bool,
}

#[derive(Debug, Deserialize)]
struct EmbedResponse {
    embeddings: Vec<Vec<f32>>,
    model_info: ModelInfo,
}

#[derive(Debug, Deserialize)]
struct ModelInfo {
    name: String,
}

pub struct HttpEmbeddingClient {
    client: Client,
    endpoint: String,
    dimension: usize,
    timeout: Duration,
}

impl HttpEmbeddingClient {
    pub fn new(endpoint: impl Into<String>, dimension: usize, timeout: Duration) -> Self {
        Self { client: Client::new(), endpoint: endpoint.into(), dimension, timeout }
    }
}

#[async_trait]
impl EmbeddingClient for HttpEmbeddingClient {
    async fn embed(&self, texts: &[String]) -> Result<EmbeddingBatch> {
        if texts.is_empty() {
            return Ok(EmbeddingBatch { embeddings: Vec::new(), model: String::new() });
        }

        let url = format!("{}/embed", self.endpoint.trim_end_matches('/'));
        let request = EmbedRequest { texts, normalize: true };

        let response = tokio::time::timeout(self.timeout, self.client.post(&url).json(&request).send())
            .await
            .map_err(|_| Error::from(LlmError::Timeout(self.timeout)))?
            .map_err(LlmError::from)?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::from(LlmError::Api { status, body }));
        }

        let parsed: EmbedResponse = response
            .json()
            .await
            .map_err(|e| Error::from(LlmError::InvalidResponse(e.to_string())))?;

        if parsed.embeddings.len() != texts.len() {
            tracing::warn!(
                expected = texts.len(),
                got = parsed.embeddings.len(),
                "embedding count mismatch"
            );
        }

        Ok(EmbeddingBatch { embeddings: parsed.embeddings, model: parsed.model_info.name })
    }

    fn dimension(&self) -> usize {
        self.dimension
    }
}

/// Stand-in for deployments with no embedding service configured. Ingest
/// still completes; `NormalizedDocument::embedding` stays `None` and
/// retrieval, which never reads it, is unaffected.
pub struct NullEmbeddingClient {
    dimension: usize,
}

impl NullEmbeddingClient {
    pub fn new(dimension: usize) -> Self {
        Self { dimension }
    }
}

#[async_trait]
impl EmbeddingClient for NullEmbeddingClient {
    async fn embed(&self, texts: &[String]) -> Result<EmbeddingBatch> {
        Ok(EmbeddingBatch { embeddings: vec![Vec::new(); texts.len()], model: "none".to_string() })
    }

    fn dimension(&self) -> usize {
        self.dimension
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn null_client_returns_empty_vectors_without_error() {
        let client = NullEmbeddingClient::new(1024);
        let batch = client.embed(&["a".to_string(), "b".to_string()]).await.unwrap();
        assert_eq!(batch.embeddings.len(), 2);
        assert_eq!(client.dimension(), 1024);
    }

    #[tokio::test]
    async fn empty_batch_short_circuits_without_a_request() {
        let client = HttpEmbeddingClient::new("http://127.0.0.1:1", 1024, Duration::from_millis(50));
        let batch = client.embed(&[]).await.unwrap();
        assert!(batch.embeddings.is_empty());
    }
}

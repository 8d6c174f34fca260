//! `POST /generate` collaborator (§6), used by the Classifier's semantic
//! fallback, the Summarizer, and the Answer Composer's document handler.

use std::time::Duration;

use async_trait::async_trait;
use docqa_core::{Error, GenerateOptions, LanguageModel, Result};
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::error::LlmError;

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    options: GenerateOptions,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    response: String,
}

pub struct HttpLanguageModel {
    client: Client,
    endpoint: String,
    model: String,
    timeout: Duration,
}

impl HttpLanguageModel {
    pub fn new(endpoint: impl Into<String>, model: impl Into<String>, timeout: Duration) -> Self {
        Self { client: Client::new(), endpoint: endpoint.into(), model: model.into(), timeout }
    }
}

#[async_trait]
impl LanguageModel for HttpLanguageModel {
    async fn generate(&self, prompt: &str, options: GenerateOptions) -> Result<String> {
        let url = format!("{}/generate", self.endpoint.trim_end_matches('/'));
        let request = GenerateRequest { model: &self.model, prompt, options };

        let response = tokio::time::timeout(self.timeout, self.client.post(&url).json(&request).send())
            .await
            .map_err(|_| Error::from(LlmError::Timeout(self.timeout)))?
            .map_err(LlmError::from)?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::from(LlmError::Api { status, body }));
        }

        let parsed: GenerateResponse = response
            .json()
            .await
            .map_err(|e| Error::from(LlmError::InvalidResponse(e.to_string())))?;

        Ok(parsed.response)
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}

/// Deterministic stand-in for tests and offline deployments: echoes back a
/// canned reply rather than calling out to a network service.
pub struct StubLanguageModel {
    reply: String,
    model_name: String,
}

impl StubLanguageModel {
    pub fn new(reply: impl Into<String>) -> Self {
        Self { reply: reply.into(), model_name: "stub".to_string() }
    }
}

#[async_trait]
impl LanguageModel for StubLanguageModel {
    async fn generate(&self, _prompt: &str, _options: GenerateOptions) -> Result<String> {
        Ok(self.reply.clone())
    }

    fn model_name(&self) -> &str {
        &self.model_name
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn stub_model_echoes_configured_reply() {
        let llm = StubLanguageModel::new("merhaba");
        let reply = llm.generate("anything", GenerateOptions::default()).await.unwrap();
        assert_eq!(reply, "merhaba");
        assert_eq!(llm.model_name(), "stub");
    }

    #[tokio::test]
    async fn unreachable_endpoint_times_out_quickly() {
        let llm = HttpLanguageModel::new("http://127.0.0.1:1", "test-model", Duration::from_millis(50));
        let result = llm.generate("prompt", GenerateOptions::default()).await;
        assert!(result.is_err());
    }
}

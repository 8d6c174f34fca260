//! External-collaborator traits (§4.16, §6). Implementations live in
//! `docqa-llm`; everything downstream of ingest/answer-composition depends
//! only on these signatures.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;

#[derive(Debug, Clone)]
pub struct EmbeddingBatch {
    pub embeddings: Vec<Vec<f32>>,
    pub model: String,
}

/// `POST /embed` collaborator (ingest only).
#[async_trait]
pub trait EmbeddingClient: Send + Sync {
    async fn embed(&self, texts: &[String]) -> Result<EmbeddingBatch>;

    fn dimension(&self) -> usize;
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerateOptions {
    pub temperature: f32,
    pub num_predict: u32,
}

impl Default for GenerateOptions {
    fn default() -> Self {
        Self { temperature: 0.1, num_predict: 512 }
    }
}

/// `POST /generate` collaborator.
#[async_trait]
pub trait LanguageModel: Send + Sync {
    async fn generate(&self, prompt: &str, options: GenerateOptions) -> Result<String>;

    fn model_name(&self) -> &str;
}

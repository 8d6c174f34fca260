//! HTTP collaborators for the embedding and generation services described in
//! §6, plus deterministic offline stand-ins used in tests and degraded-mode
//! deployments.

pub mod embedding;
pub mod error;
pub mod generate;

pub use embedding::{HttpEmbeddingClient, NullEmbeddingClient};
pub use error::LlmError;
pub use generate::{HttpLanguageModel, StubLanguageModel};

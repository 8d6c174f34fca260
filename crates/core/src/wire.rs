//! Process-boundary DTOs (§6).

use serde::{Deserialize, Serialize};

use crate::aggregate::AggregateResult;
use crate::intent::IntentKind;
use crate::normalized::{ProcessingLogEntry, ProcessingStatus};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestResult {
    pub document_id: String,
    pub needs_human_review: bool,
    pub processing_log: Vec<ProcessingLogEntry>,
}

impl IngestResult {
    pub fn rejected(document_id: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            document_id: document_id.into(),
            needs_human_review: true,
            processing_log: vec![ProcessingLogEntry {
                stage: "ingest".to_string(),
                status: ProcessingStatus::Rejected,
                message: reason.into(),
                at: chrono::Utc::now(),
            }],
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatRequest {
    pub session_id: String,
    pub query: String,
    #[serde(default)]
    pub conversation_history: Option<Vec<crate::conversation::ConversationTurn>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatReference {
    pub filename: String,
    pub excerpt: String,
    pub relevance_score: f32,
    pub page: Option<u32>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChatMeta {
    pub intent: Option<IntentKind>,
    pub query_type: Option<String>,
    pub references: Vec<ChatReference>,
    pub numeric_values: Vec<String>,
    pub aggregates: Option<AggregateResult>,
    pub confidence: f32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelMeta {
    pub model: String,
    pub latency_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatResponse {
    pub answer: String,
    pub meta: ChatMeta,
    pub model_meta: ModelMeta,
}

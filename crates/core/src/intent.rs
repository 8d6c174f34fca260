//! Intent classification types (§4.13).

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IntentKind {
    Casual,
    MetaCount,
    MetaList,
    Summarize,
    InvoiceCount,
    InvoiceList,
    Aggregate,
    Document,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Intent {
    pub kind: IntentKind,
    pub confidence: f32,
    /// e.g. the target filename for a `summarize` intent.
    pub payload: Option<String>,
}

impl Intent {
    pub fn rule_matched(kind: IntentKind, payload: Option<String>) -> Self {
        Self { kind, confidence: 0.95, payload }
    }

    pub fn default_document() -> Self {
        Self { kind: IntentKind::Document, confidence: 0.8, payload: None }
    }
}

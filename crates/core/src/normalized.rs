//! The canonical, versioned, immutable `NormalizedDocument` record.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::document::FileType;

/// Current schema version. Bump and add a migration path if the shape changes.
pub const SCHEMA_VERSION: u32 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocType {
    Invoice,
    Quote,
    Receipt,
    Waybill,
    Contract,
    Other,
}

impl DocType {
    pub fn as_str(&self) -> &'static str {
        match self {
            DocType::Invoice => "invoice",
            DocType::Quote => "quote",
            DocType::Receipt => "receipt",
            DocType::Waybill => "waybill",
            DocType::Contract => "contract",
            DocType::Other => "other",
        }
    }
}

/// A parsed row of a detected line-items table.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LineItem {
    pub description: Option<String>,
    pub quantity: Option<Decimal>,
    pub unit_price: Option<Decimal>,
    pub line_total: Option<Decimal>,
}

/// Metadata for a detected table region (§4.3).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TableMeta {
    pub kind: TableKind,
    pub section_ids: Vec<String>,
    pub header: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TableKind {
    LineItems,
    Data,
    Summary,
}

/// Short natural-language summary + key points (§4.6).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentSummary {
    pub text: String,
    pub key_points: Vec<String>,
    pub language: String,
    pub confidence: f32,
}

/// The three confidence scores tracked per document.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Confidence {
    pub classification: f32,
    pub heuristic: f32,
    pub semantic: f32,
}

impl Confidence {
    /// §8 universal invariant: any component below this forces human review.
    pub const REVIEW_THRESHOLD: f32 = 0.6;

    pub fn min(&self) -> f32 {
        self.classification.min(self.heuristic).min(self.semantic)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProcessingStatus {
    Ok,
    Degraded,
    Rejected,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessingLogEntry {
    pub stage: String,
    pub status: ProcessingStatus,
    pub message: String,
    pub at: DateTime<Utc>,
}

impl ProcessingLogEntry {
    pub fn ok(stage: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            stage: stage.into(),
            status: ProcessingStatus::Ok,
            message: message.into(),
            at: Utc::now(),
        }
    }

    pub fn degraded(stage: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            stage: stage.into(),
            status: ProcessingStatus::Degraded,
            message: message.into(),
            at: Utc::now(),
        }
    }
}

/// The canonical, immutable record produced by ingest.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NormalizedDocument {
    pub schema_v: u32,
    pub id: String,
    pub filename: String,
    pub file_type: FileType,
    #[serde(rename = "type")]
    pub doc_type: DocType,

    pub invoice_no: Option<String>,
    pub date: Option<DateTime<Utc>>,
    pub supplier: Option<String>,
    pub buyer: Option<String>,
    pub currency: Option<String>,
    pub total: Option<Decimal>,
    pub tax: Option<Decimal>,
    pub items: Vec<LineItem>,

    pub tables: Vec<TableMeta>,
    pub summary: Option<DocumentSummary>,
    pub confidence: Confidence,
    pub needs_human_review: bool,
    pub source_sample: String,
    pub embedding: Option<Vec<f32>>,
    pub embedding_model: Option<String>,
    pub processing_log: Vec<ProcessingLogEntry>,
    pub archived: bool,
    pub archived_at: Option<DateTime<Utc>>,

    /// Section ids owned by this document, in ordinal order. Not part of the
    /// upstream schema, but needed so the store/index can walk a document's
    /// sections without a side table.
    pub section_ids: Vec<String>,
    pub metadata: HashMap<String, String>,
}

impl NormalizedDocument {
    /// §3 invariants. Returns the first violation found.
    pub fn validate(&self) -> Result<(), String> {
        if self.schema_v == 0 {
            return Err("schema_v is mandatory".to_string());
        }
        if self.currency.as_ref().is_some_and(|c| c.len() != 3) {
            return Err(format!("currency {:?} is not a 3-letter ISO code", self.currency));
        }
        if let Some(d) = self.date {
            if d != crate::util::utc_midnight(d) {
                return Err("date must be ISO-8601 UTC midnight".to_string());
            }
        }
        Ok(())
    }

    /// §3: needs_human_review whenever any confidence < 0.6 or
    /// (type=invoice ∧ total=null).
    pub fn compute_needs_human_review(&self) -> bool {
        self.confidence.min() < Confidence::REVIEW_THRESHOLD
            || (self.doc_type == DocType::Invoice && self.total.is_none())
    }
}

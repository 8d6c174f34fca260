//! Deterministic extraction result types (§3), produced by the Numeric Extractor.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractedAmount {
    pub raw_span: String,
    pub value: Decimal,
    pub currency: Option<String>,
    pub confidence: f32,
    pub section_id: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum InvoiceIdPattern {
    /// `INV-2024-001`
    DashedAlnum,
    /// `2025/001`
    SlashedNumeric,
    /// `13TVEI4D-0002`
    Mixed,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractedId {
    pub raw_span: String,
    pub canonical: String,
    pub pattern: InvoiceIdPattern,
    pub section_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractedDate {
    pub raw_span: String,
    pub at: DateTime<Utc>,
    pub section_id: String,
}

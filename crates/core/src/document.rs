//! Upstream raw document and section types (pre-canonicalization).

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// File type tag carried by upstream parsers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileType {
    Pdf,
    Docx,
    Xlsx,
    Pptx,
    Txt,
}

/// A raw section as handed off by an upstream file reader.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawSection {
    pub id: String,
    pub content: String,
    #[serde(default)]
    pub page: Option<u32>,
    #[serde(default)]
    pub sheet: Option<String>,
}

/// Upstream input document, before normalization.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawDocument {
    pub id: String,
    pub filename: String,
    pub file_type: FileType,
    pub sections: Vec<RawSection>,
    #[serde(default)]
    pub metadata: HashMap<String, String>,
}

/// An indexable unit of text, owned exclusively by the Document Store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Section {
    pub id: String,
    pub document_id: String,
    pub ordinal: usize,
    pub raw_content: String,
    pub normalized_content: String,
    pub token_set: Vec<String>,
    pub trigram_set: Vec<String>,
    #[serde(default)]
    pub page: Option<u32>,
    #[serde(default)]
    pub sheet: Option<String>,
}

impl Section {
    /// §3 invariant: non-empty content after trim.
    pub fn validate(&self) -> Result<(), String> {
        if self.raw_content.trim().is_empty() {
            return Err(format!("section {} has empty content", self.id));
        }
        Ok(())
    }
}

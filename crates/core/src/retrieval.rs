//! Retrieval result types shared by the Retriever, Re-ranker, and cache.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchType {
    Exact,
    Partial,
    Ngram,
    Filename,
    Semantic,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievalResult {
    pub section_id: String,
    pub document_id: String,
    pub filename: String,
    pub excerpt: String,
    pub relevance_score: f32,
    pub match_type: MatchType,
    pub page: Option<u32>,
}

/// Max excerpt length (§3 `RetrievalResult.excerpt`).
pub const MAX_EXCERPT_CHARS: usize = 300;

pub fn truncate_excerpt(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let mut out: String = text.chars().take(max_chars).collect();
    out.push('…');
    out
}

//! Numeric Extractor (C2) and Table Extractor (C3): deterministic, regex-
//! and rule-based extraction of amounts, dates, invoice IDs, and tables from
//! free text. No LLM involvement — these results are what ground the
//! Canonicalizer's fields and what the Retriever's context windows quote.

pub mod amount;
pub mod date;
pub mod id;
pub mod number;
pub mod table;

pub use amount::extract_amounts;
pub use date::extract_dates;
pub use id::extract_ids;
pub use number::{format_number, parse_number};
pub use table::{extract_tables, DetectedTable};

use docqa_core::{ExtractedAmount, ExtractedDate, ExtractedId, RawSection};

/// All deterministic extraction results for a single raw section.
#[derive(Debug, Clone, Default)]
pub struct SectionExtraction {
    pub amounts: Vec<ExtractedAmount>,
    pub dates: Vec<ExtractedDate>,
    pub ids: Vec<ExtractedId>,
}

/// Runs the Numeric Extractor over one section's raw content.
pub fn extract_section(section: &RawSection) -> SectionExtraction {
    SectionExtraction {
        amounts: amount::extract_amounts(&section.content, &section.id),
        dates: date::extract_dates(&section.content, &section.id),
        ids: id::extract_ids(&section.content, &section.id),
    }
}

/// Runs the Numeric Extractor over every section of a document.
pub fn extract_document(sections: &[RawSection]) -> Vec<SectionExtraction> {
    sections.iter().map(extract_section).collect()
}

//! Invoice-ID detection (§4.2): alphanumeric spans with internal dashes or
//! slashes, length >= 4, containing at least one digit and at least one
//! letter or a run of 3+ digits.

use once_cell::sync::Lazy;
use regex::Regex;

use docqa_core::{ExtractedId, InvoiceIdPattern};

static CANDIDATE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b[A-Za-z0-9]+(?:[-/][A-Za-z0-9]+)+\b").unwrap());

static DIGIT_RUN_3: Lazy<Regex> = Lazy::new(|| Regex::new(r"\d{3,}").unwrap());

fn is_plausible_id(raw: &str) -> bool {
    if raw.len() < 4 {
        return false;
    }
    let has_digit = raw.chars().any(|c| c.is_ascii_digit());
    if !has_digit {
        return false;
    }
    let has_letter = raw.chars().any(|c| c.is_ascii_alphabetic());
    has_letter || DIGIT_RUN_3.is_match(raw)
}

fn classify(raw: &str) -> InvoiceIdPattern {
    let all_segments_numeric = raw.split(['-', '/']).all(|seg| seg.chars().all(|c| c.is_ascii_digit()));
    if raw.contains('/') && all_segments_numeric {
        return InvoiceIdPattern::SlashedNumeric;
    }
    let mut segments = raw.split('-');
    if let Some(first) = segments.next() {
        let first_is_alpha = !first.is_empty() && first.chars().all(|c| c.is_ascii_alphabetic());
        let rest_numeric = segments.clone().all(|seg| seg.chars().all(|c| c.is_ascii_digit()));
        if first_is_alpha && rest_numeric && segments.count() > 0 {
            return InvoiceIdPattern::DashedAlnum;
        }
    }
    InvoiceIdPattern::Mixed
}

fn canonicalize(raw: &str) -> String {
    raw.trim_matches(|c: char| !c.is_ascii_alphanumeric()).to_uppercase()
}

/// Extracts invoice/document identifiers from one section's raw text.
pub fn extract_ids(text: &str, section_id: &str) -> Vec<ExtractedId> {
    let mut results = Vec::new();
    for m in CANDIDATE.find_iter(text) {
        let raw = m.as_str();
        if !is_plausible_id(raw) {
            continue;
        }
        results.push(ExtractedId {
            raw_span: raw.to_string(),
            canonical: canonicalize(raw),
            pattern: classify(raw),
            section_id: section_id.to_string(),
        });
    }
    results
}

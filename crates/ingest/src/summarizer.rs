//! Summarizer (§4.6): LLM-backed short summary with an extractive fallback.

use std::time::Duration;

use docqa_core::{DocumentSummary, GenerateOptions, LanguageModel, NormalizedDocument};

const SUMMARY_TIMEOUT: Duration = Duration::from_secs(10);
const EXTRACTIVE_CONFIDENCE: f32 = 0.3;

fn build_prompt(doc: &NormalizedDocument) -> String {
    format!(
        "Using only the fields below, write at most two Turkish sentences summarizing this document, \
         followed by up to 5 short key-point bullets starting with '-'. Never invent values not listed here.\n\n\
         filename: {}\ntype: {}\ninvoice_no: {:?}\ndate: {:?}\nsupplier: {:?}\ntotal: {:?} {}\nsource_sample: {}",
        doc.filename,
        doc.doc_type.as_str(),
        doc.invoice_no,
        doc.date.map(|d| d.format("%Y-%m-%d").to_string()),
        doc.supplier,
        doc.total,
        doc.currency.clone().unwrap_or_default(),
        doc.source_sample,
    )
}

fn parse_summary_reply(reply: &str) -> (String, Vec<String>) {
    let mut text_lines = Vec::new();
    let mut key_points = Vec::new();
    for line in reply.lines() {
        let trimmed = line.trim();
        if let Some(point) = trimmed.strip_prefix('-') {
            key_points.push(point.trim().to_string());
        } else if !trimmed.is_empty() {
            text_lines.push(trimmed.to_string());
        }
    }
    (text_lines.join(" "), key_points.into_iter().take(5).collect())
}

fn extractive_fallback(doc: &NormalizedDocument) -> DocumentSummary {
    let text: String = doc.source_sample.chars().take(200).collect();
    DocumentSummary {
        text,
        key_points: Vec::new(),
        language: "tr".to_string(),
        confidence: EXTRACTIVE_CONFIDENCE,
    }
}

/// Produces a short natural-language summary for a canonicalized document,
/// falling back to an extractive excerpt on LLM timeout or failure.
pub async fn summarize(doc: &NormalizedDocument, llm: &dyn LanguageModel) -> DocumentSummary {
    let prompt = build_prompt(doc);
    let call = llm.generate(&prompt, GenerateOptions::default());

    match tokio::time::timeout(SUMMARY_TIMEOUT, call).await {
        Ok(Ok(reply)) => {
            let (text, key_points) = parse_summary_reply(&reply);
            if text.trim().is_empty() {
                extractive_fallback(doc)
            } else {
                DocumentSummary { text, key_points, language: "tr".to_string(), confidence: 0.85 }
            }
        }
        _ => extractive_fallback(doc),
    }
}

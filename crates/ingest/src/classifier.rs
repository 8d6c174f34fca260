//! Classifier (§4.4): heuristic scoring first, LLM semantic fallback second.

use std::time::Duration;

use docqa_core::{DocType, ExtractedId, LanguageModel, RawDocument};

const SEMANTIC_TIMEOUT: Duration = Duration::from_secs(5);
const HEURISTIC_ACCEPT_THRESHOLD: f32 = 0.7;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClassifyMethod {
    HeuristicOnly,
    Hybrid,
}

#[derive(Debug, Clone)]
pub struct ClassificationResult {
    pub doc_type: DocType,
    pub confidence: f32,
    pub method: ClassifyMethod,
}

struct TypeSignals {
    doc_type: DocType,
    filename_words: &'static [&'static str],
    metadata_keys: &'static [&'static str],
    body_keywords: &'static [&'static str],
}

const SIGNALS: &[TypeSignals] = &[
    TypeSignals {
        doc_type: DocType::Invoice,
        filename_words: &["fatura", "invoice"],
        metadata_keys: &["invoice_no", "fatura_no"],
        body_keywords: &["fatura", "invoice", "kdv", "toplam tutar"],
    },
    TypeSignals {
        doc_type: DocType::Quote,
        filename_words: &["teklif", "quote", "quotation"],
        metadata_keys: &["quote_no", "teklif_no"],
        body_keywords: &["teklif", "quotation", "geçerlilik", "quote"],
    },
    TypeSignals {
        doc_type: DocType::Receipt,
        filename_words: &["fis", "fiş", "receipt"],
        metadata_keys: &["receipt_no", "fis_no"],
        body_keywords: &["fiş", "receipt", "nakit", "kredi karti"],
    },
    TypeSignals {
        doc_type: DocType::Waybill,
        filename_words: &["irsaliye", "waybill"],
        metadata_keys: &["waybill_no", "irsaliye_no"],
        body_keywords: &["irsaliye", "waybill", "sevk", "teslim"],
    },
    TypeSignals {
        doc_type: DocType::Contract,
        filename_words: &["sozlesme", "sözleşme", "contract"],
        metadata_keys: &["contract_no", "sozlesme_no"],
        body_keywords: &["sözleşme", "contract", "taraflar", "madde"],
    },
];

fn keyword_frequency_score(body_lower: &str, keywords: &[&str]) -> f32 {
    let hits: usize = keywords.iter().map(|k| body_lower.matches(k).count()).sum();
    (hits as f32 * 0.04).min(0.2)
}

/// Scores every candidate type against the fixed heuristic signal set and
/// returns the argmax with its score.
fn heuristic_best(doc: &RawDocument) -> (DocType, f32) {
    let filename_lower = doc.filename.to_lowercase();
    let body_lower: String = doc
        .sections
        .iter()
        .map(|s| s.content.to_lowercase())
        .collect::<Vec<_>>()
        .join(" ");

    let mut best = (DocType::Other, 0.0f32);
    for sig in SIGNALS {
        let mut score = 0.0f32;
        if sig.filename_words.iter().any(|w| filename_lower.contains(w)) {
            score += 0.5;
        }
        if sig.metadata_keys.iter().any(|k| doc.metadata.keys().any(|mk| mk.eq_ignore_ascii_case(k))) {
            score += 0.3;
        }
        score += keyword_frequency_score(&body_lower, sig.body_keywords);

        if score > best.1 {
            best = (sig.doc_type, score);
        }
    }
    best
}

fn synthesize_context(doc: &RawDocument, ids: &[ExtractedId]) -> String {
    let mut preview = String::new();
    for section in doc.sections.iter().take(3) {
        preview.push_str(section.content.chars().take(200).collect::<String>().as_str());
        preview.push(' ');
    }
    let id_list = ids.iter().map(|i| i.canonical.as_str()).collect::<Vec<_>>().join(", ");
    format!(
        "filename: {}\ndetected_ids: {}\ncontent: {}",
        doc.filename, id_list, preview
    )
}

fn parse_semantic_reply(reply: &str) -> Option<(DocType, f32)> {
    let mut doc_type = None;
    let mut confidence = None;
    for line in reply.lines() {
        let lower = line.to_lowercase();
        if doc_type.is_none() {
            doc_type = match () {
                _ if lower.contains("invoice") => Some(DocType::Invoice),
                _ if lower.contains("quote") => Some(DocType::Quote),
                _ if lower.contains("receipt") => Some(DocType::Receipt),
                _ if lower.contains("waybill") => Some(DocType::Waybill),
                _ if lower.contains("contract") => Some(DocType::Contract),
                _ if lower.contains("other") => Some(DocType::Other),
                _ => None,
            };
        }
        if confidence.is_none() {
            if let Some(tok) = lower.split_whitespace().find(|t| t.parse::<f32>().is_ok()) {
                confidence = tok.parse::<f32>().ok();
            }
        }
    }
    Some((doc_type?, confidence.unwrap_or(0.5).clamp(0.0, 1.0)))
}

/// Classifies a raw document. Falls back to the LLM only when the heuristic
/// score does not clear `HEURISTIC_ACCEPT_THRESHOLD`.
pub async fn classify(
    doc: &RawDocument,
    detected_ids: &[ExtractedId],
    llm: &dyn LanguageModel,
) -> ClassificationResult {
    let (heuristic_type, heuristic_score) = heuristic_best(doc);

    if heuristic_score >= HEURISTIC_ACCEPT_THRESHOLD {
        return ClassificationResult {
            doc_type: heuristic_type,
            confidence: heuristic_score,
            method: ClassifyMethod::HeuristicOnly,
        };
    }

    let prompt = format!(
        "Classify the document type as one of invoice, quote, receipt, waybill, contract, other. \
         Reply with the label on one line and a confidence between 0 and 1 on the next.\n\n{}",
        synthesize_context(doc, detected_ids)
    );

    let call = llm.generate(&prompt, docqa_core::GenerateOptions::default());
    match tokio::time::timeout(SEMANTIC_TIMEOUT, call).await {
        Ok(Ok(reply)) => match parse_semantic_reply(&reply) {
            Some((semantic_type, semantic_confidence)) => ClassificationResult {
                doc_type: semantic_type,
                confidence: 0.4 * heuristic_score + 0.6 * semantic_confidence,
                method: ClassifyMethod::Hybrid,
            },
            None => ClassificationResult {
                doc_type: heuristic_type,
                confidence: (heuristic_score - 0.1).max(0.0),
                method: ClassifyMethod::HeuristicOnly,
            },
        },
        _ => ClassificationResult {
            doc_type: heuristic_type,
            confidence: (heuristic_score - 0.1).max(0.0),
            method: ClassifyMethod::HeuristicOnly,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use docqa_core::{FileType, RawSection, Result};
    use std::collections::HashMap;

    struct StubLlm;

    #[async_trait]
    impl LanguageModel for StubLlm {
        async fn generate(&self, _prompt: &str, _options: docqa_core::GenerateOptions) -> Result<String> {
            Ok("contract\n0.8".to_string())
        }
        fn model_name(&self) -> &str {
            "stub"
        }
    }

    fn doc(filename: &str, content: &str, metadata: HashMap<String, String>) -> RawDocument {
        RawDocument {
            id: "d1".to_string(),
            filename: filename.to_string(),
            file_type: FileType::Pdf,
            sections: vec![RawSection {
                id: "s1".to_string(),
                content: content.to_string(),
                page: None,
                sheet: None,
            }],
            metadata,
        }
    }

    #[tokio::test]
    async fn strong_heuristic_signal_skips_llm() {
        let d = doc("fatura_2024.pdf", "Fatura No: INV-1 KDV toplam tutar", HashMap::new());
        let result = classify(&d, &[], &StubLlm).await;
        assert_eq!(result.doc_type, DocType::Invoice);
        assert_eq!(result.method, ClassifyMethod::HeuristicOnly);
        assert!(result.confidence >= HEURISTIC_ACCEPT_THRESHOLD);
    }

    #[tokio::test]
    async fn weak_heuristic_signal_falls_back_to_llm() {
        let d = doc("belge.pdf", "genel bir metin", HashMap::new());
        let result = classify(&d, &[], &StubLlm).await;
        assert_eq!(result.doc_type, DocType::Contract);
        assert_eq!(result.method, ClassifyMethod::Hybrid);
    }
}

//! Canonicalizer (§4.5): folds raw document + classification + extractor
//! output into a validated `NormalizedDocument`.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use docqa_extract::SectionExtraction;
use rust_decimal::Decimal;

use docqa_core::{
    Confidence, DocType, Error, LineItem, NormalizedDocument, ProcessingLogEntry, RawDocument,
    Result, TableKind, TableMeta, SCHEMA_VERSION,
};

use crate::classifier::{ClassificationResult, ClassifyMethod};

/// Upstream field names mapped onto the canonical schema.
const KEY_MAP: &[(&str, &str)] = &[
    ("FATURA_NO", "invoice_no"),
    ("FATURANO", "invoice_no"),
    ("INVOICE_NO", "invoice_no"),
    ("TARIH", "date"),
    ("TARİH", "date"),
    ("DATE", "date"),
    ("TOPLAM_TUTAR", "total"),
    ("TOPLAM", "total"),
    ("TOTAL", "total"),
    ("TEDARIKCI", "supplier"),
    ("TEDARİKÇİ", "supplier"),
    ("SUPPLIER", "supplier"),
    ("ALICI", "buyer"),
    ("BUYER", "buyer"),
    ("KDV", "tax"),
    ("VAT", "tax"),
    ("TAX", "tax"),
];

/// Garbled-OCR spans, observed in the wild, mapped to their correct form.
const OCR_CORRECTIONS: &[(&str, &str)] = &[("KVÐ", "KDV")];

fn apply_ocr_corrections(input: &str) -> String {
    let mut out = input.to_string();
    for (broken, fixed) in OCR_CORRECTIONS {
        out = out.replace(broken, fixed);
    }
    out
}

fn canonical_metadata_key(key: &str) -> Option<&'static str> {
    let corrected = apply_ocr_corrections(key);
    let upper = corrected.to_uppercase();
    KEY_MAP.iter().find(|(raw, _)| *raw == upper).map(|(_, canonical)| *canonical)
}

fn normalize_currency(raw: &str) -> Option<String> {
    let upper = raw.trim().to_uppercase();
    let upper = upper.trim_end_matches('.');
    match upper {
        "TL" | "TRY" | "₺" => Some("TRY".to_string()),
        "USD" | "$" => Some("USD".to_string()),
        "EUR" | "EURO" | "€" => Some("EUR".to_string()),
        "GBP" | "£" => Some("GBP".to_string()),
        other if other.len() == 3 && other.chars().all(|c| c.is_ascii_alphabetic()) => {
            Some(other.to_string())
        }
        _ => None,
    }
}

/// Inputs the canonicalizer folds together. Each field comes from an earlier
/// ingest stage; the canonicalizer never talks to an external collaborator
/// itself.
pub struct CanonicalizerInput<'a> {
    pub raw: &'a RawDocument,
    pub classification: &'a ClassificationResult,
    pub section_extractions: &'a [SectionExtraction],
    pub detected_tables: &'a [docqa_extract::DetectedTable],
}

fn first_non_empty_section(raw: &RawDocument) -> Option<&str> {
    raw.sections.iter().map(|s| s.content.as_str()).find(|c| !c.trim().is_empty())
}

fn best_metadata_field(raw: &RawDocument, canonical_name: &str) -> Option<String> {
    raw.metadata
        .iter()
        .find(|(k, _)| canonical_metadata_key(k) == Some(canonical_name))
        .map(|(_, v)| v.clone())
}

fn best_amount(extractions: &[SectionExtraction], min_confidence: f32) -> Option<(Decimal, Option<String>)> {
    extractions
        .iter()
        .flat_map(|e| e.amounts.iter())
        .filter(|a| a.confidence >= min_confidence)
        .max_by(|a, b| a.confidence.partial_cmp(&b.confidence).unwrap())
        .map(|a| (a.value, a.currency.clone()))
}

fn best_date(extractions: &[SectionExtraction]) -> Option<DateTime<Utc>> {
    extractions.iter().flat_map(|e| e.dates.iter()).map(|d| d.at).next()
}

fn best_invoice_no(extractions: &[SectionExtraction]) -> Option<String> {
    extractions.iter().flat_map(|e| e.ids.iter()).map(|i| i.canonical.clone()).next()
}

fn merge_line_items_from_tables(tables: &[docqa_extract::DetectedTable]) -> Vec<LineItem> {
    tables
        .iter()
        .filter(|t| t.meta.kind == TableKind::LineItems)
        .flat_map(|t| t.items.clone())
        .collect()
}

fn synthesize_source_sample(
    raw: &RawDocument,
    doc_type: DocType,
    invoice_no: &Option<String>,
    total: &Option<Decimal>,
) -> String {
    let mut parts = vec![raw.filename.clone(), doc_type.as_str().to_string()];
    if let Some(no) = invoice_no {
        parts.push(no.clone());
    }
    if let Some(t) = total {
        parts.push(t.to_string());
    }
    let excerpt: String = first_non_empty_section(raw)
        .unwrap_or_default()
        .chars()
        .take(200)
        .collect();
    parts.push(excerpt);
    parts.join(" ")
}

/// Folds raw parse + classification + extraction into a validated
/// `NormalizedDocument`. Returns `Error::SchemaInvalid` on a §3 invariant
/// violation, rejecting the ingest.
pub fn canonicalize(input: CanonicalizerInput<'_>) -> Result<NormalizedDocument> {
    let raw = input.raw;

    let invoice_no = best_metadata_field(raw, "invoice_no").or_else(|| best_invoice_no(input.section_extractions));
    let date = best_date(input.section_extractions);
    let supplier = best_metadata_field(raw, "supplier");
    let buyer = best_metadata_field(raw, "buyer");

    let (total, currency_from_amount) = match best_amount(input.section_extractions, 0.8) {
        Some((value, currency)) => (Some(value), currency),
        None => (None, None),
    };
    let tax = best_metadata_field(raw, "tax").and_then(|v| docqa_extract::parse_number(&v));

    let currency = currency_from_amount
        .or_else(|| best_metadata_field(raw, "currency"))
        .and_then(|c| normalize_currency(&c));

    let items = merge_line_items_from_tables(input.detected_tables);
    let tables: Vec<TableMeta> = input.detected_tables.iter().map(|t| t.meta.clone()).collect();

    let source_sample = synthesize_source_sample(raw, input.classification.doc_type, &invoice_no, &total);

    let heuristic_confidence = match (&invoice_no, &total) {
        (Some(_), Some(_)) => 0.9,
        (Some(_), None) | (None, Some(_)) => 0.7,
        (None, None) => 0.4,
    };
    let semantic_confidence = match input.classification.method {
        ClassifyMethod::Hybrid => input.classification.confidence,
        ClassifyMethod::HeuristicOnly => input.classification.confidence * 0.9,
    };

    let confidence = Confidence {
        classification: input.classification.confidence,
        heuristic: heuristic_confidence,
        semantic: semantic_confidence,
    };

    let mut doc = NormalizedDocument {
        schema_v: SCHEMA_VERSION,
        id: raw.id.clone(),
        filename: raw.filename.clone(),
        file_type: raw.file_type,
        doc_type: input.classification.doc_type,
        invoice_no,
        date,
        supplier,
        buyer,
        currency,
        total,
        tax,
        items,
        tables,
        summary: None,
        confidence,
        needs_human_review: false,
        source_sample,
        embedding: None,
        embedding_model: None,
        processing_log: vec![ProcessingLogEntry::ok("canonicalize", "folded raw document into normalized schema")],
        archived: false,
        archived_at: None,
        section_ids: raw.sections.iter().map(|s| s.id.clone()).collect(),
        metadata: raw.metadata.clone() as HashMap<String, String>,
    };

    doc.needs_human_review = doc.compute_needs_human_review();
    doc.validate().map_err(Error::SchemaInvalid)?;
    Ok(doc)
}

#[cfg(test)]
mod tests {
    use super::*;
    use docqa_core::{FileType, RawSection};
    use docqa_extract::extract_section;
    use rust_decimal_macros::dec;

    fn sample_raw() -> RawDocument {
        RawDocument {
            id: "d1".to_string(),
            filename: "fatura_2024.pdf".to_string(),
            file_type: FileType::Pdf,
            sections: vec![RawSection {
                id: "s1".to_string(),
                content: "Fatura No: INV-2024-001 Tarih: 15.03.2024 Toplam: 1.234,56 TL".to_string(),
                page: None,
                sheet: None,
            }],
            metadata: HashMap::new(),
        }
    }

    #[test]
    fn folds_extracted_fields_into_normalized_document() {
        let raw = sample_raw();
        let extractions = vec![extract_section(&raw.sections[0])];
        let classification = ClassificationResult {
            doc_type: DocType::Invoice,
            confidence: 0.9,
            method: ClassifyMethod::HeuristicOnly,
        };
        let doc = canonicalize(CanonicalizerInput {
            raw: &raw,
            classification: &classification,
            section_extractions: &extractions,
            detected_tables: &[],
        })
        .unwrap();

        assert_eq!(doc.invoice_no.as_deref(), Some("INV-2024-001"));
        assert_eq!(doc.total, Some(dec!(1234.56)));
        assert_eq!(doc.currency.as_deref(), Some("TRY"));
        assert!(!doc.needs_human_review);
    }

    #[test]
    fn missing_total_on_invoice_forces_human_review() {
        let raw = RawDocument {
            sections: vec![RawSection {
                id: "s1".to_string(),
                content: "no numbers here".to_string(),
                page: None,
                sheet: None,
            }],
            ..sample_raw()
        };
        let extractions = vec![extract_section(&raw.sections[0])];
        let classification = ClassificationResult {
            doc_type: DocType::Invoice,
            confidence: 0.9,
            method: ClassifyMethod::HeuristicOnly,
        };
        let doc = canonicalize(CanonicalizerInput {
            raw: &raw,
            classification: &classification,
            section_extractions: &extractions,
            detected_tables: &[],
        })
        .unwrap();
        assert!(doc.needs_human_review);
    }
}

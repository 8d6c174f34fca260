//! Intent Router (§4.13): deterministic rules, tried in order. The last rule
//! — aggregator parse succeeds — defers to `docqa_aggregate::parse_plan`
//! rather than duplicating its keyword tables.

use once_cell::sync::Lazy;
use regex::Regex;

use docqa_core::{Intent, IntentKind};

const CASUAL_WORDS: &[&str] = &[
    "merhaba", "selam", "günaydın", "gunaydin", "naber", "nasılsın", "nasilsin", "iyi günler",
    "iyi gunler", "teşekkür", "tesekkur", "sağol", "sagol", "eyvallah", "yardım", "yardim",
    "hello", "hi", "thanks", "thank you", "help",
];

static FILENAME_PAYLOAD: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)[\w\-]+\.(pdf|docx?|xlsx?|pptx?|txt)").unwrap());

static META_COUNT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)kaç belge|how many docs?|belge sayısı|belge sayisi").unwrap());
static META_LIST: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)hangi belgeler|list documents|belgeleri listele").unwrap());
static SUMMARIZE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)özetle|ozetle|summarize").unwrap());
static INVOICE_COUNT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)kaç fatura|invoice count").unwrap());
static INVOICE_LIST: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)hangi faturalar|list invoices").unwrap());

fn is_casual(lower: &str) -> bool {
    CASUAL_WORDS.iter().any(|w| lower.contains(w))
}

fn filename_payload(query: &str) -> Option<String> {
    FILENAME_PAYLOAD.find(query).map(|m| m.as_str().to_string())
}

/// Classifies one user turn per §4.13's ordered rule list.
pub fn route_intent(query: &str) -> Intent {
    let lower = query.to_lowercase();

    if is_casual(&lower) {
        return Intent::rule_matched(IntentKind::Casual, None);
    }
    if META_COUNT.is_match(&lower) {
        return Intent::rule_matched(IntentKind::MetaCount, None);
    }
    if META_LIST.is_match(&lower) {
        return Intent::rule_matched(IntentKind::MetaList, None);
    }
    if SUMMARIZE.is_match(&lower) {
        return Intent::rule_matched(IntentKind::Summarize, filename_payload(query));
    }
    if INVOICE_COUNT.is_match(&lower) {
        return Intent::rule_matched(IntentKind::InvoiceCount, None);
    }
    if INVOICE_LIST.is_match(&lower) {
        return Intent::rule_matched(IntentKind::InvoiceList, None);
    }
    if docqa_aggregate::parse_plan(query).is_some() {
        return Intent::rule_matched(IntentKind::Aggregate, None);
    }
    Intent::default_document()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn greeting_is_casual() {
        let intent = route_intent("Merhaba, nasılsın?");
        assert_eq!(intent.kind, IntentKind::Casual);
        assert_eq!(intent.confidence, 0.95);
    }

    #[test]
    fn meta_count_matches() {
        assert_eq!(route_intent("kaç belge var").kind, IntentKind::MetaCount);
    }

    #[test]
    fn summarize_captures_filename_payload() {
        let intent = route_intent("Fatura-2024-001.pdf dosyasını özetle");
        assert_eq!(intent.kind, IntentKind::Summarize);
        assert_eq!(intent.payload.as_deref(), Some("Fatura-2024-001.pdf"));
    }

    #[test]
    fn aggregate_defers_to_plan_parser() {
        assert_eq!(route_intent("bu ayki faturaların toplam tutarı").kind, IntentKind::Aggregate);
    }

    #[test]
    fn unrecognized_falls_back_to_document_default() {
        let intent = route_intent("sözleşmede kira bedeli ne kadar");
        assert_eq!(intent.kind, IntentKind::Document);
        assert_eq!(intent.confidence, 0.8);
    }
}

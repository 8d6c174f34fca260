//! Amount detection (§4.2): currency symbol + number, number + currency
//! code, then bare number, tried in that priority order.

use once_cell::sync::Lazy;
use regex::Regex;
use std::ops::Range;

use docqa_core::ExtractedAmount;

use crate::number::parse_number;

static SYMBOL_NUMBER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?P<sym>[₺$€£])\s*(?P<num>\(?-?\d[\d.,]*\)?)").unwrap());

// `TL\.` and `EURO` must precede their shorter prefixes in the alternation so
// the longer literal wins at a given start position.
// No trailing `\b`: a literal `.` (as in `TL.`) is itself a non-word
// character, so a word-boundary assertion right after it would never hold
// at end-of-string. The curated currency-code alternation is specific
// enough that dropping the boundary check does not cause false positives.
static NUMBER_CODE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)(?P<num>\(?-?\d[\d.,]*\)?)\s*(?P<code>TL\.|TRY|TL|USD|EURO|EUR|GBP)").unwrap()
});

static BARE_NUMBER: Lazy<Regex> = Lazy::new(|| Regex::new(r"\(?-?\d[\d.,]*\)?").unwrap());

fn overlaps(range: &Range<usize>, consumed: &[Range<usize>]) -> bool {
    consumed.iter().any(|c| range.start < c.end && c.start < range.end)
}

fn currency_for_symbol(sym: &str) -> Option<&'static str> {
    match sym {
        "₺" => Some("TRY"),
        "$" => Some("USD"),
        "€" => Some("EUR"),
        "£" => Some("GBP"),
        _ => None,
    }
}

fn currency_for_code(code: &str) -> Option<&'static str> {
    match code.to_uppercase().trim_end_matches('.') {
        "TL" | "TRY" => Some("TRY"),
        "USD" => Some("USD"),
        "EUR" | "EURO" => Some("EUR"),
        "GBP" => Some("GBP"),
        _ => None,
    }
}

/// Extracts amounts from one section's raw text. Never panics on unmatched
/// input — returns an empty list.
pub fn extract_amounts(text: &str, section_id: &str) -> Vec<ExtractedAmount> {
    let mut results = Vec::new();
    let mut consumed: Vec<Range<usize>> = Vec::new();

    for caps in SYMBOL_NUMBER.captures_iter(text) {
        let whole = caps.get(0).unwrap();
        let num = caps.name("num").unwrap().as_str();
        let sym = caps.name("sym").unwrap().as_str();
        if let Some(value) = parse_number(num) {
            results.push(ExtractedAmount {
                raw_span: whole.as_str().to_string(),
                value,
                currency: currency_for_symbol(sym).map(str::to_string),
                confidence: 0.95,
                section_id: section_id.to_string(),
            });
            consumed.push(whole.range());
        }
    }

    for caps in NUMBER_CODE.captures_iter(text) {
        let whole = caps.get(0).unwrap();
        if overlaps(&whole.range(), &consumed) {
            continue;
        }
        let num = caps.name("num").unwrap().as_str();
        let code = caps.name("code").unwrap().as_str();
        if let Some(value) = parse_number(num) {
            results.push(ExtractedAmount {
                raw_span: whole.as_str().to_string(),
                value,
                currency: currency_for_code(code).map(str::to_string),
                confidence: 0.9,
                section_id: section_id.to_string(),
            });
            consumed.push(whole.range());
        }
    }

    for m in BARE_NUMBER.find_iter(text) {
        if overlaps(&m.range(), &consumed) {
            continue;
        }
        if let Some(value) = parse_number(m.as_str()) {
            results.push(ExtractedAmount {
                raw_span: m.as_str().to_string(),
                value,
                currency: None,
                confidence: 0.6,
                section_id: section_id.to_string(),
            });
            consumed.push(m.range());
        }
    }

    results.sort_by_key(|a| text.find(&a.raw_span).unwrap_or(usize::MAX));
    results
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn symbol_prefixed_amount() {
        let amounts = extract_amounts("Tutar: ₺1.234,56 ödenecek", "s1");
        assert_eq!(amounts.len(), 1);
        assert_eq!(amounts[0].value, dec!(1234.56));
        assert_eq!(amounts[0].currency.as_deref(), Some("TRY"));
    }

    #[test]
    fn code_suffixed_amount() {
        let amounts = extract_amounts("Total: 2.458,30 EUR", "s1");
        assert_eq!(amounts.len(), 1);
        assert_eq!(amounts[0].value, dec!(2458.30));
        assert_eq!(amounts[0].currency.as_deref(), Some("EUR"));
    }

    #[test]
    fn tl_variants_map_to_try() {
        for raw in ["1.234,56 TL", "1.234,56 TL.", "1.234,56 TRY"] {
            let amounts = extract_amounts(raw, "s1");
            assert_eq!(amounts[0].currency.as_deref(), Some("TRY"));
        }
    }

    #[test]
    fn bare_number_has_no_currency() {
        let amounts = extract_amounts("Miktar: 42 adet", "s1");
        assert!(amounts.iter().any(|a| a.currency.is_none()));
    }

    #[test]
    fn no_match_returns_empty() {
        assert!(extract_amounts("no numbers here", "s1").is_empty());
    }
}

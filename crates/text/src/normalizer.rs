//! Text Normalizer (§4.1): Turkish-aware lowercasing, tokenization, and
//! trigram extraction shared by the ingest and query paths.

use std::collections::BTreeSet;
use unicode_normalization::UnicodeNormalization;
use unicode_segmentation::UnicodeSegmentation;

/// Tokens shorter than this are dropped from the indexable token set, but
/// kept in `tokens_all` for query rewriting. Measured in grapheme clusters,
/// not `char`s, so a precomposed accented letter counts as one.
const MIN_INDEXABLE_TOKEN_LEN: usize = 3;

/// Output of normalizing one piece of text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Normalized {
    /// Lowercased, diacritic-folded, word-segmented text, tokens rejoined
    /// with single spaces.
    pub text: String,
    /// Every Unicode word-segmented token, including short ones.
    pub tokens_all: Vec<String>,
    /// `tokens_all` with tokens shorter than 3 graphemes dropped — used for
    /// Jaccard scoring and posting-list lookups.
    pub tokens_indexable: BTreeSet<String>,
    /// Sliding 3-token windows over `tokens_all`, joined with a space.
    pub trigrams: BTreeSet<String>,
}

/// Turkish diacritic fold, applied before lowercasing so `İ` folds to `i`
/// rather than the Unicode-default `i̇` (dotted small i with combining dot).
fn fold_turkish(input: &str) -> String {
    input
        .chars()
        .map(|c| match c {
            'ı' | 'İ' => 'i',
            'I' => 'i',
            'ğ' | 'Ğ' => 'g',
            'ü' | 'Ü' => 'u',
            'ş' | 'Ş' => 's',
            'ö' | 'Ö' => 'o',
            'ç' | 'Ç' => 'c',
            other => other,
        })
        .collect()
}

/// Normalizes a UTF-8 string per §4.1. Ill-formed input is handled upstream
/// by Rust's `String` type (invalid byte sequences cannot exist in a valid
/// `&str`); callers reading raw bytes should use `String::from_utf8_lossy`
/// first, which already substitutes U+FFFD.
pub fn normalize(input: &str) -> Normalized {
    let folded = fold_turkish(input);
    let lowered = folded.to_lowercase();
    let nfc: String = lowered.nfc().collect();

    let tokens_all: Vec<String> = nfc.unicode_words().map(|w| w.to_string()).collect();
    let text = tokens_all.join(" ");

    let tokens_indexable: BTreeSet<String> = tokens_all
        .iter()
        .filter(|t| t.graphemes(true).count() >= MIN_INDEXABLE_TOKEN_LEN)
        .cloned()
        .collect();

    let trigrams = trigram_windows(&tokens_all);

    Normalized { text, tokens_all, tokens_indexable, trigrams }
}

/// Sliding 3-token windows, each window joined by a single space.
fn trigram_windows(tokens: &[String]) -> BTreeSet<String> {
    if tokens.len() < 3 {
        return BTreeSet::new();
    }
    tokens.windows(3).map(|w| w.join(" ")).collect()
}

/// `normalize(normalize(s)) == normalize(s)` (§8 round-trip property).
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn idempotent() {
        let once = normalize("Invoice-13TVEI4D-0002.docx Ödeme Şartları İSTANBUL");
        let twice = normalize(&once.text);
        assert_eq!(once.text, twice.text);
    }

    #[test]
    fn turkish_fold() {
        let n = normalize("İSTANBUL Şirket Üçgen Çağrı Öğretmen Iğdır");
        assert_eq!(n.text, "istanbul sirket ucgen cagri ogretmen igdir");
    }

    #[test]
    fn drops_short_tokens_for_indexing_only() {
        let n = normalize("a bb ccc dddd");
        assert_eq!(n.tokens_all, vec!["a", "bb", "ccc", "dddd"]);
        assert!(!n.tokens_indexable.contains("a"));
        assert!(!n.tokens_indexable.contains("bb"));
        assert!(n.tokens_indexable.contains("ccc"));
        assert!(n.tokens_indexable.contains("dddd"));
    }

    #[test]
    fn trigram_windows_slide() {
        let n = normalize("bir iki uc dort");
        assert!(n.trigrams.contains("bir iki uc"));
        assert!(n.trigrams.contains("iki uc dort"));
        assert_eq!(n.trigrams.len(), 2);
    }

    #[test]
    fn invalid_utf8_bytes_are_replaced() {
        let lossy = String::from_utf8_lossy(&[0x66, 0x61, 0xff, 0x74]).into_owned();
        let n = normalize(&lossy);
        assert!(n.text.contains('\u{FFFD}') || !n.text.is_empty());
    }
}

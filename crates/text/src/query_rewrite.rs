//! Query-side rewrites (§4.1), applied only to the query path — never at
//! index time.

use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashMap;

static FILENAME_EXT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\.(pdf|docx?|xlsx?|pptx?|txt)$").unwrap());

static ABBREVIATIONS: Lazy<HashMap<&'static str, &'static str>> = Lazy::new(|| {
    HashMap::from([("bdl", "bedel"), ("fat", "fatura"), ("dok", "doküman")])
});

static TYPO_CORRECTIONS: Lazy<HashMap<&'static str, &'static str>> = Lazy::new(|| {
    HashMap::from([
        ("potobox", "photobox"),
        ("fotobox", "photobox"),
        ("photobok", "photobox"),
    ])
});

/// Strips a trailing filename extension, expands the abbreviation map, and
/// corrects known typos. Applied before `normalize` on the query path only.
pub fn rewrite_query(input: &str) -> String {
    let stripped = FILENAME_EXT.replace(input, "");

    stripped
        .split_whitespace()
        .map(|word| {
            let lower = word.to_lowercase();
            if let Some(expanded) = ABBREVIATIONS.get(lower.as_str()) {
                return (*expanded).to_string();
            }
            if let Some(corrected) = TYPO_CORRECTIONS.get(lower.as_str()) {
                return (*corrected).to_string();
            }
            word.to_string()
        })
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_known_extensions() {
        assert_eq!(rewrite_query("rapor.pdf"), "rapor");
        assert_eq!(rewrite_query("rapor.DOCX"), "rapor");
    }

    #[test]
    fn expands_abbreviations() {
        assert_eq!(rewrite_query("bdl nedir"), "bedel nedir");
    }

    #[test]
    fn corrects_known_typos() {
        assert_eq!(rewrite_query("potobox nedir"), "photobox nedir");
    }
}

//! Filename tokenization — underscores/dashes split into tokens before
//! normalization (§4.8), and extension stripping shared with §4.9's
//! filename equality check.

use once_cell::sync::Lazy;
use regex::Regex;

static FILENAME_EXT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\.(pdf|docx?|xlsx?|pptx?|txt)$").unwrap());

/// Strips a known extension and splits underscores/dashes into spaces so
/// `normalize` tokenizes a filename the same way it tokenizes body text.
pub fn filename_to_text(filename: &str) -> String {
    let stem = FILENAME_EXT.replace(filename, "");
    stem.replace(['_', '-'], " ")
}

pub fn strip_extension(filename: &str) -> String {
    FILENAME_EXT.replace(filename, "").into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_separators() {
        assert_eq!(filename_to_text("photobox360_setup.pdf"), "photobox360 setup");
        assert_eq!(filename_to_text("Invoice-13TVEI4D-0002.docx"), "Invoice 13TVEI4D 0002");
    }
}

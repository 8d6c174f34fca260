//! Date detection (§4.2): `dd.mm.yyyy`, `dd/mm/yyyy`, `yyyy-mm-dd`,
//! `dd.mm.yy`. Impossible dates are rejected; two-digit years are resolved
//! against the current year.

use chrono::{Datelike, NaiveDate, TimeZone, Utc};
use once_cell::sync::Lazy;
use regex::Regex;

use docqa_core::ExtractedDate;

static DMY_LONG: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b(\d{1,2})[./](\d{1,2})[./](\d{4})\b").unwrap());
static YMD: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b(\d{4})-(\d{1,2})-(\d{1,2})\b").unwrap());
static DMY_SHORT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b(\d{1,2})\.(\d{1,2})\.(\d{2})\b").unwrap());

fn resolve_two_digit_year(yy: i32, current_year: i32) -> i32 {
    let century_yy = current_year % 100;
    if yy <= century_yy {
        2000 + yy
    } else {
        1900 + yy
    }
}

fn make_utc_midnight(year: i32, month: u32, day: u32) -> Option<chrono::DateTime<Utc>> {
    let date = NaiveDate::from_ymd_opt(year, month, day)?;
    let naive = date.and_hms_opt(0, 0, 0)?;
    Some(Utc.from_utc_datetime(&naive))
}

/// Extracts dates from one section's raw text, normalized to UTC midnight.
/// Impossible calendar dates (e.g. `31.02.2024`) are silently skipped.
pub fn extract_dates(text: &str, section_id: &str) -> Vec<ExtractedDate> {
    let current_year = Utc::now().year();
    let mut results = Vec::new();
    let mut consumed: Vec<std::ops::Range<usize>> = Vec::new();

    for caps in YMD.captures_iter(text) {
        let whole = caps.get(0).unwrap();
        let year: i32 = caps[1].parse().unwrap();
        let month: u32 = caps[2].parse().unwrap();
        let day: u32 = caps[3].parse().unwrap();
        if let Some(at) = make_utc_midnight(year, month, day) {
            results.push(ExtractedDate {
                raw_span: whole.as_str().to_string(),
                at,
                section_id: section_id.to_string(),
            });
            consumed.push(whole.range());
        }
    }

    for caps in DMY_LONG.captures_iter(text) {
        let whole = caps.get(0).unwrap();
        if consumed.iter().any(|c| whole.start() < c.end && c.start < whole.end()) {
            continue;
        }
        let day: u32 = caps[1].parse().unwrap();
        let month: u32 = caps[2].parse().unwrap();
        let year: i32 = caps[3].parse().unwrap();
        if let Some(at) = make_utc_midnight(year, month, day) {
            results.push(ExtractedDate {
                raw_span: whole.as_str().to_string(),
                at,
                section_id: section_id.to_string(),
            });
            consumed.push(whole.range());
        }
    }

    for caps in DMY_SHORT.captures_iter(text) {
        let whole = caps.get(0).unwrap();
        if consumed.iter().any(|c| whole.start() < c.end && c.start < whole.end()) {
            continue;
        }
        let day: u32 = caps[1].parse().unwrap();
        let month: u32 = caps[2].parse().unwrap();
        let yy: i32 = caps[3].parse().unwrap();
        let year = resolve_two_digit_year(yy, current_year);
        if let Some(at) = make_utc_midnight(year, month, day) {
            results.push(ExtractedDate {
                raw_span: whole.as_str().to_string(),
                at,
                section_id: section_id.to_string(),
            });
            consumed.push(whole.range());
        }
    }

    results
}

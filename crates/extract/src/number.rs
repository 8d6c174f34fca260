//! Locale-sensitive number parsing (§4.2).
//!
//! The separator *role* (thousands vs. decimal) is decided from the raw
//! span itself, never from a fixed locale setting — see the design notes'
//! "never use the platform's default locale" guidance.

use rust_decimal::Decimal;
use std::str::FromStr;

/// Parses a raw numeric span (already stripped of currency symbols/codes)
/// into a fixed-precision `Decimal`. Returns `None` if nothing numeric
/// remains; never panics on malformed input.
pub fn parse_number(raw: &str) -> Option<Decimal> {
    let trimmed = raw.trim();
    let wrapped_negative = trimmed.starts_with('(') && trimmed.ends_with(')');
    let inner = if wrapped_negative {
        &trimmed[1..trimmed.len().saturating_sub(1)]
    } else {
        trimmed
    };
    let leading_negative = inner.trim_start().starts_with('-');
    let negative = wrapped_negative || leading_negative;

    let digits_and_seps: String = inner
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.' || *c == ',')
        .collect();
    if digits_and_seps.is_empty() {
        return None;
    }

    let canonical = to_canonical_decimal_string(&digits_and_seps);
    let value = Decimal::from_str(&canonical).ok()?;
    Some(if negative { -value } else { value })
}

/// Rewrites a span containing only digits, `.`, and `,` into a string with
/// `.` as the sole decimal point (or no point, for pure-integer spans).
fn to_canonical_decimal_string(span: &str) -> String {
    let last_dot = span.rfind('.');
    let last_comma = span.rfind(',');

    match (last_dot, last_comma) {
        (Some(dot_pos), Some(comma_pos)) => {
            if comma_pos > dot_pos {
                // Turkish: `.` thousands, `,` decimal.
                strip_all(span, '.').replacen(',', ".", 1)
            } else {
                // US: `,` thousands, `.` decimal.
                strip_all(span, ',')
            }
        }
        (Some(dot_pos), None) => {
            let trailing_len = span.len() - dot_pos - 1;
            if trailing_len == 3 {
                strip_all(span, '.')
            } else {
                span.to_string()
            }
        }
        (None, Some(comma_pos)) => {
            let trailing_len = span.len() - comma_pos - 1;
            if trailing_len == 3 {
                strip_all(span, ',')
            } else {
                span.replacen(',', ".", 1)
            }
        }
        (None, None) => span.to_string(),
    }
}

fn strip_all(s: &str, c: char) -> String {
    s.chars().filter(|x| *x != c).collect()
}

/// Formats a `Decimal` with Turkish grouping: `.` every three digits, `,` as
/// the decimal point, always two fraction digits. Inverse of `parse_number`.
pub fn format_number(value: Decimal) -> String {
    let rounded = value.round_dp(2);
    let negative = rounded.is_sign_negative();
    let digits = rounded.abs().to_string();
    let (int_part, frac_part) = digits.split_once('.').unwrap_or((digits.as_str(), "00"));
    let grouped = group_thousands(int_part);
    let sign = if negative { "-" } else { "" };
    format!("{sign}{grouped},{frac_part}")
}

fn group_thousands(digits: &str) -> String {
    let len = digits.len();
    let mut out = String::with_capacity(len + len / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (len - i) % 3 == 0 {
            out.push('.');
        }
        out.push(c);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn turkish_thousands_and_decimal() {
        assert_eq!(parse_number("1.234,56"), Some(dec!(1234.56)));
        assert_eq!(parse_number("2.000,00"), Some(dec!(2000.00)));
    }

    #[test]
    fn us_thousands_and_decimal() {
        assert_eq!(parse_number("1,234.56"), Some(dec!(1234.56)));
    }

    #[test]
    fn single_separator_two_trailing_digits_is_decimal() {
        assert_eq!(parse_number("500,44"), Some(dec!(500.44)));
        assert_eq!(parse_number("500.44"), Some(dec!(500.44)));
    }

    #[test]
    fn single_separator_three_trailing_digits_is_thousands() {
        assert_eq!(parse_number("2.000"), Some(dec!(2000)));
        assert_eq!(parse_number("2,000"), Some(dec!(2000)));
    }

    #[test]
    fn negative_forms() {
        assert_eq!(parse_number("-500,44"), Some(dec!(-500.44)));
        assert_eq!(parse_number("(500,44)"), Some(dec!(-500.44)));
    }

    #[test]
    fn garbage_returns_none() {
        assert_eq!(parse_number("abc"), None);
    }

    #[test]
    fn formats_with_turkish_grouping() {
        assert_eq!(format_number(dec!(3735)), "3.735,00");
        assert_eq!(format_number(dec!(2458.30)), "2.458,30");
        assert_eq!(format_number(dec!(500.44)), "500,44");
        assert_eq!(format_number(dec!(-1234.56)), "-1.234,56");
    }

    #[test]
    fn format_then_parse_round_trips() {
        for value in [dec!(1234.56), dec!(2000.00), dec!(500.44), dec!(3735)] {
            assert_eq!(parse_number(&format_number(value)), Some(value.round_dp(2)));
        }
    }
}

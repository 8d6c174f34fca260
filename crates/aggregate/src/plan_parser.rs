//! Natural-language aggregation plan parser (§4.11): a small fixed set of
//! templates, no LLM involved. Returns `None` when nothing recognizable is
//! found; the caller falls back to the generic document path.

use chrono::{Datelike, Duration, TimeZone, Utc};

use docqa_core::{AggregateField, AggregateFilters, AggregateOp, AggregatePlan, DocType, GroupBy};

const OP_KEYWORDS: &[(&[&str], AggregateOp)] = &[
    (&["toplam", "sum", "total"], AggregateOp::Sum),
    (&["ortalama", "average", "mean"], AggregateOp::Avg),
    (&["medyan", "median"], AggregateOp::Median),
    (&["en düşük", "en dusuk", "minimum", "min"], AggregateOp::Min),
    (&["en yüksek", "en yuksek", "maximum", "max"], AggregateOp::Max),
    (&["kaç", "kac", "how many", "sayısı", "sayisi", "count"], AggregateOp::Count),
];

const FIELD_KEYWORDS: &[(&[&str], AggregateField)] = &[
    (&["kdv", "vergi", "tax"], AggregateField::Tax),
    (&["kalem tutarı", "kalem tutari", "line total", "line_total"], AggregateField::LineTotal),
    (&["miktar", "adet", "qty", "quantity"], AggregateField::Qty),
    (&["tutar", "toplam", "total", "amount"], AggregateField::Total),
];

const TYPE_KEYWORDS: &[(&[&str], DocType)] = &[
    (&["fatura", "invoice"], DocType::Invoice),
    (&["teklif", "quote"], DocType::Quote),
    (&["fiş", "fis", "receipt"], DocType::Receipt),
    (&["irsaliye", "waybill"], DocType::Waybill),
    (&["sözleşme", "sozlesme", "contract"], DocType::Contract),
];

const GROUP_BY_KEYWORDS: &[(&[&str], GroupBy)] = &[
    (&["tedarikçiye göre", "tedarikciye gore", "by supplier"], GroupBy::Supplier),
    (&["aya göre", "aya gore", "monthly", "ay bazında"], GroupBy::Month),
    (&["yıla göre", "yila gore", "yearly"], GroupBy::Year),
    (&["türüne göre", "turune gore", "by type"], GroupBy::Type),
];

fn find_op(lower: &str) -> Option<AggregateOp> {
    OP_KEYWORDS.iter().find(|(words, _)| words.iter().any(|w| lower.contains(w))).map(|(_, op)| *op)
}

fn find_field(lower: &str) -> AggregateField {
    FIELD_KEYWORDS
        .iter()
        .find(|(words, _)| words.iter().any(|w| lower.contains(w)))
        .map(|(_, field)| *field)
        .unwrap_or(AggregateField::Total)
}

fn find_doc_type(lower: &str) -> Option<DocType> {
    TYPE_KEYWORDS.iter().find(|(words, _)| words.iter().any(|w| lower.contains(w))).map(|(_, t)| *t)
}

fn find_group_by(lower: &str) -> Option<GroupBy> {
    GROUP_BY_KEYWORDS.iter().find(|(words, _)| words.iter().any(|w| lower.contains(w))).map(|(_, g)| *g)
}

fn find_currency(lower: &str) -> Option<String> {
    for code in ["try", "usd", "eur", "gbp"] {
        if lower.contains(code) {
            return Some(code.to_uppercase());
        }
    }
    None
}

fn month_bounds(year: i32, month: u32) -> (chrono::DateTime<Utc>, chrono::DateTime<Utc>) {
    let start = Utc.with_ymd_and_hms(year, month, 1, 0, 0, 0).single().unwrap();
    let (next_year, next_month) = if month == 12 { (year + 1, 1) } else { (year, month + 1) };
    let end = Utc.with_ymd_and_hms(next_year, next_month, 1, 0, 0, 0).single().unwrap() - Duration::seconds(1);
    (start, end)
}

fn find_date_range(lower: &str) -> (Option<chrono::DateTime<Utc>>, Option<chrono::DateTime<Utc>>) {
    let now = Utc::now();
    if lower.contains("bu ay") {
        let (start, end) = month_bounds(now.year(), now.month());
        return (Some(start), Some(end));
    }
    if lower.contains("geçen ay") || lower.contains("gecen ay") {
        let (year, month) = if now.month() == 1 { (now.year() - 1, 12) } else { (now.year(), now.month() - 1) };
        let (start, end) = month_bounds(year, month);
        return (Some(start), Some(end));
    }
    if let Some(year) = find_standalone_year(lower) {
        let start = Utc.with_ymd_and_hms(year, 1, 1, 0, 0, 0).single().unwrap();
        let end = Utc.with_ymd_and_hms(year + 1, 1, 1, 0, 0, 0).single().unwrap() - Duration::seconds(1);
        return (Some(start), Some(end));
    }
    (None, None)
}

fn find_standalone_year(lower: &str) -> Option<i32> {
    lower
        .split_whitespace()
        .find(|tok| tok.len() == 4 && tok.chars().all(|c| c.is_ascii_digit()))
        .and_then(|tok| tok.parse::<i32>().ok())
        .filter(|&y| (1990..=2100).contains(&y))
}

/// Parses a free-text query into an `AggregatePlan`. Returns `None` when no
/// operation keyword is recognized.
pub fn parse_plan(query: &str) -> Option<AggregatePlan> {
    let lower = query.to_lowercase();
    let op = find_op(&lower)?;
    let field = find_field(&lower);
    let (date_from, date_to) = find_date_range(&lower);

    Some(AggregatePlan {
        op,
        field,
        filters: AggregateFilters {
            doc_type: find_doc_type(&lower),
            date_from,
            date_to,
            supplier: None,
            currency: find_currency(&lower),
        },
        group_by: find_group_by(&lower),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_sum_with_type_filter() {
        let plan = parse_plan("bu ayki faturalarin toplam tutari nedir").unwrap();
        assert_eq!(plan.op, AggregateOp::Sum);
        assert_eq!(plan.field, AggregateField::Total);
        assert_eq!(plan.filters.doc_type, Some(DocType::Invoice));
        assert!(plan.filters.date_from.is_some());
    }

    #[test]
    fn parses_count_query() {
        let plan = parse_plan("kaç fatura var").unwrap();
        assert_eq!(plan.op, AggregateOp::Count);
    }

    #[test]
    fn parses_year_filter() {
        let plan = parse_plan("2024 toplam tutar").unwrap();
        assert_eq!(plan.filters.date_from.unwrap().format("%Y-%m-%d").to_string(), "2024-01-01");
    }

    #[test]
    fn unrecognized_query_returns_none() {
        assert!(parse_plan("merhaba nasilsin").is_none());
    }
}

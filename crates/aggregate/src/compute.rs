//! Aggregator (§4.11): fixed-precision decimal sum/avg/median/min/max/count
//! with duplicate-invoice and IQR outlier detection.

use std::collections::BTreeMap;

use chrono::Datelike;
use docqa_core::{
    AggregateField, AggregateFilters, AggregateOp, AggregatePlan, AggregateResult, DocType,
    Error, GroupBy, NormalizedDocument, Result,
};
use docqa_extract::format_number;
use rust_decimal::Decimal;

fn op_label(op: AggregateOp) -> &'static str {
    match op {
        AggregateOp::Sum => "Toplam",
        AggregateOp::Avg => "Ortalama",
        AggregateOp::Median => "Medyan",
        AggregateOp::Min => "Minimum",
        AggregateOp::Max => "Maksimum",
        AggregateOp::Count => "Sayı",
    }
}

fn matches_filters(doc: &NormalizedDocument, filters: &AggregateFilters) -> bool {
    if let Some(want) = filters.doc_type {
        if doc.doc_type != want {
            return false;
        }
    }
    if let Some(from) = filters.date_from {
        if doc.date.map(|d| d < from).unwrap_or(true) {
            return false;
        }
    }
    if let Some(to) = filters.date_to {
        if doc.date.map(|d| d > to).unwrap_or(true) {
            return false;
        }
    }
    if let Some(supplier) = &filters.supplier {
        let supplier_lower = supplier.to_lowercase();
        if !doc.supplier.as_ref().is_some_and(|s| s.to_lowercase().contains(&supplier_lower)) {
            return false;
        }
    }
    if let Some(currency) = &filters.currency {
        if doc.currency.as_deref() != Some(currency.as_str()) {
            return false;
        }
    }
    true
}

/// Per-document field values the aggregation operates over. `LineTotal` and
/// `Qty` fan a single matching document out into one entry per line item.
fn gather_values(docs: &[&NormalizedDocument], field: AggregateField) -> Vec<Decimal> {
    match field {
        AggregateField::Total => docs.iter().filter_map(|d| d.total).collect(),
        AggregateField::Tax => docs.iter().filter_map(|d| d.tax).collect(),
        AggregateField::LineTotal => {
            docs.iter().flat_map(|d| d.items.iter().filter_map(|i| i.line_total)).collect()
        }
        AggregateField::Qty => {
            docs.iter().flat_map(|d| d.items.iter().filter_map(|i| i.quantity)).collect()
        }
    }
}

fn median(sorted: &[Decimal]) -> Decimal {
    let n = sorted.len();
    if n % 2 == 1 {
        sorted[n / 2]
    } else {
        (sorted[n / 2 - 1] + sorted[n / 2]) / Decimal::from(2)
    }
}

fn quartile(sorted: &[Decimal], fraction: Decimal) -> Decimal {
    let n = sorted.len();
    if n == 1 {
        return sorted[0];
    }
    let pos = fraction * Decimal::from(n - 1);
    let lower_idx = pos.floor().to_string().parse::<usize>().unwrap_or(0).min(n - 1);
    let upper_idx = (lower_idx + 1).min(n - 1);
    let frac_part = pos - pos.floor();
    sorted[lower_idx] + frac_part * (sorted[upper_idx] - sorted[lower_idx])
}

fn detect_outliers(values: &[Decimal]) -> Vec<Decimal> {
    if values.len() < 4 {
        return Vec::new();
    }
    let mut sorted = values.to_vec();
    sorted.sort();
    let q1 = quartile(&sorted, Decimal::new(25, 2));
    let q3 = quartile(&sorted, Decimal::new(75, 2));
    let iqr = q3 - q1;
    let lower_bound = q1 - Decimal::new(15, 1) * iqr;
    let upper_bound = q3 + Decimal::new(15, 1) * iqr;
    values.iter().filter(|v| **v < lower_bound || **v > upper_bound).cloned().collect()
}

fn detect_duplicate_invoice_numbers(docs: &[&NormalizedDocument]) -> Vec<String> {
    let mut counts: BTreeMap<String, usize> = BTreeMap::new();
    for doc in docs {
        if doc.doc_type == DocType::Invoice {
            if let Some(no) = &doc.invoice_no {
                *counts.entry(no.clone()).or_insert(0) += 1;
            }
        }
    }
    counts.into_iter().filter(|(_, count)| *count > 1).map(|(no, _)| no).collect()
}

fn group_key(doc: &NormalizedDocument, group_by: GroupBy) -> String {
    match group_by {
        GroupBy::Type => doc.doc_type.as_str().to_string(),
        GroupBy::Supplier => doc.supplier.clone().unwrap_or_else(|| "unknown".to_string()),
        GroupBy::Month => doc.date.map(|d| format!("{:04}-{:02}", d.year(), d.month())).unwrap_or_else(|| "unknown".to_string()),
        GroupBy::Year => doc.date.map(|d| d.year().to_string()).unwrap_or_else(|| "unknown".to_string()),
    }
}

fn apply_op(op: AggregateOp, values: &[Decimal]) -> Option<Decimal> {
    if values.is_empty() && op != AggregateOp::Count {
        return None;
    }
    match op {
        AggregateOp::Sum => Some(values.iter().sum()),
        AggregateOp::Avg => Some(values.iter().sum::<Decimal>() / Decimal::from(values.len())),
        AggregateOp::Median => {
            let mut sorted = values.to_vec();
            sorted.sort();
            Some(median(&sorted))
        }
        AggregateOp::Min => values.iter().min().copied(),
        AggregateOp::Max => values.iter().max().copied(),
        AggregateOp::Count => None,
    }
}

fn format_result(op: AggregateOp, value: Option<Decimal>, currency: &Option<String>, count: usize) -> String {
    let label = op_label(op);
    match op {
        AggregateOp::Count => format!("{label}: {count} ({count} belge)"),
        _ => match value {
            Some(v) => {
                let formatted_value = format_number(v);
                let with_currency = match currency {
                    Some(c) => format!("{formatted_value} {c}"),
                    None => formatted_value,
                };
                format!("{label}: {with_currency} ({count} belge)")
            }
            None => "veri yok".to_string(),
        },
    }
}

/// Executes an `AggregatePlan` against the full document corpus.
pub fn aggregate(documents: &[NormalizedDocument], plan: &AggregatePlan) -> Result<AggregateResult> {
    let matching: Vec<&NormalizedDocument> = documents.iter().filter(|d| matches_filters(d, &plan.filters)).collect();

    let currencies: std::collections::BTreeSet<String> =
        matching.iter().filter_map(|d| d.currency.clone()).collect();
    if currencies.len() > 1 {
        let mut breakdown = BTreeMap::new();
        for currency in &currencies {
            let subtotal: Decimal = matching
                .iter()
                .filter(|d| d.currency.as_deref() == Some(currency.as_str()))
                .filter_map(|d| d.total)
                .sum();
            breakdown.insert(currency.clone(), subtotal);
        }
        return Err(Error::MixedCurrency { breakdown });
    }
    let currency = currencies.into_iter().next();

    let values = gather_values(&matching, plan.field);
    let value = apply_op(plan.op, &values);
    let count = matching.len();

    let duplicates = if matches!(plan.op, AggregateOp::Count | AggregateOp::Sum) {
        detect_duplicate_invoice_numbers(&matching)
    } else {
        Vec::new()
    };
    let outliers = detect_outliers(&values);

    let group_by_result = plan.group_by.map(|group_by| {
        let mut groups: BTreeMap<String, Vec<Decimal>> = BTreeMap::new();
        for doc in &matching {
            let key = group_key(doc, group_by);
            groups.entry(key).or_default().extend(gather_values(&[doc], plan.field));
        }
        groups
            .into_iter()
            .map(|(key, vals)| (key, apply_op(plan.op, &vals).unwrap_or_default()))
            .collect()
    });

    let formatted = format_result(plan.op, value, &currency, count);

    Ok(AggregateResult {
        operation: plan.op,
        field: plan.field,
        filters: plan.filters.clone(),
        count,
        value,
        currency,
        formatted,
        group_by: group_by_result,
        duplicates,
        outliers,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use docqa_core::{Confidence, FileType, LineItem, SCHEMA_VERSION};
    use rust_decimal_macros::dec;
    use std::collections::HashMap;

    fn invoice(id: &str, total: Option<Decimal>, currency: Option<&str>, invoice_no: Option<&str>) -> NormalizedDocument {
        NormalizedDocument {
            schema_v: SCHEMA_VERSION,
            id: id.to_string(),
            filename: format!("{id}.pdf"),
            file_type: FileType::Pdf,
            doc_type: DocType::Invoice,
            invoice_no: invoice_no.map(String::from),
            date: None,
            supplier: None,
            buyer: None,
            currency: currency.map(String::from),
            total,
            tax: None,
            items: vec![LineItem { description: None, quantity: Some(dec!(2)), unit_price: None, line_total: total }],
            tables: Vec::new(),
            summary: None,
            confidence: Confidence { classification: 1.0, heuristic: 1.0, semantic: 1.0 },
            needs_human_review: false,
            source_sample: String::new(),
            embedding: None,
            embedding_model: None,
            processing_log: Vec::new(),
            archived: false,
            archived_at: None,
            section_ids: Vec::new(),
            metadata: HashMap::new(),
        }
    }

    fn plan(op: AggregateOp) -> AggregatePlan {
        AggregatePlan {
            op,
            field: AggregateField::Total,
            filters: AggregateFilters::default(),
            group_by: None,
        }
    }

    #[test]
    fn sums_matching_totals() {
        let docs = vec![
            invoice("d1", Some(dec!(100.00)), Some("TRY"), Some("INV1")),
            invoice("d2", Some(dec!(200.00)), Some("TRY"), Some("INV2")),
        ];
        let result = aggregate(&docs, &plan(AggregateOp::Sum)).unwrap();
        assert_eq!(result.value, Some(dec!(300.00)));
        assert_eq!(result.currency.as_deref(), Some("TRY"));
    }

    #[test]
    fn formatted_uses_turkish_grouping_and_document_count() {
        let docs = vec![
            invoice("d1", Some(dec!(1234.56)), Some("TRY"), Some("INV1")),
            invoice("d2", Some(dec!(2000.00)), Some("TRY"), Some("INV2")),
            invoice("d3", Some(dec!(500.44)), Some("TRY"), Some("INV3")),
        ];
        let result = aggregate(&docs, &plan(AggregateOp::Sum)).unwrap();
        assert_eq!(result.formatted, "Toplam: 3.735,00 TRY (3 belge)");
    }

    #[test]
    fn mixed_currency_is_rejected() {
        let docs = vec![
            invoice("d1", Some(dec!(100.00)), Some("TRY"), Some("INV1")),
            invoice("d2", Some(dec!(50.00)), Some("USD"), Some("INV2")),
        ];
        let err = aggregate(&docs, &plan(AggregateOp::Sum)).unwrap_err();
        assert!(matches!(err, Error::MixedCurrency { .. }));
    }

    #[test]
    fn detects_duplicate_invoice_numbers() {
        let docs = vec![
            invoice("d1", Some(dec!(100.00)), Some("TRY"), Some("INV1")),
            invoice("d2", Some(dec!(200.00)), Some("TRY"), Some("INV1")),
        ];
        let result = aggregate(&docs, &plan(AggregateOp::Sum)).unwrap();
        assert_eq!(result.duplicates, vec!["INV1".to_string()]);
    }

    #[test]
    fn median_of_even_count_averages_middle_two() {
        let docs = vec![
            invoice("d1", Some(dec!(10)), Some("TRY"), Some("INV1")),
            invoice("d2", Some(dec!(20)), Some("TRY"), Some("INV2")),
            invoice("d3", Some(dec!(30)), Some("TRY"), Some("INV3")),
            invoice("d4", Some(dec!(40)), Some("TRY"), Some("INV4")),
        ];
        let result = aggregate(&docs, &plan(AggregateOp::Median)).unwrap();
        assert_eq!(result.value, Some(dec!(25)));
    }

    #[test]
    fn count_ignores_null_totals() {
        let docs = vec![invoice("d1", None, None, Some("INV1")), invoice("d2", Some(dec!(1)), Some("TRY"), Some("INV2"))];
        let result = aggregate(&docs, &plan(AggregateOp::Count)).unwrap();
        assert_eq!(result.count, 2);
    }
}

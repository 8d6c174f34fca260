//! Table Extractor (§4.3): detects contiguous table regions in DOCX/XLSX-like
//! upstream sections and emits `LineItem`s for `line_items`-classified tables.
//! PDF input is explicitly out of scope and always yields an empty result.

use docqa_core::{FileType, LineItem, RawSection, TableKind, TableMeta};

use crate::number::parse_number;

const LINE_ITEM_HEADER_WORDS: &[(&[&str], LineItemField)] = &[
    (&["description", "açıklama", "aciklama", "urun", "ürün"], LineItemField::Description),
    (&["qty", "miktar", "adet", "quantity"], LineItemField::Quantity),
    (&["unit_price", "unit price", "birim fiyat", "birim_fiyat"], LineItemField::UnitPrice),
    (&["total", "tutar", "line_total", "line total"], LineItemField::LineTotal),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LineItemField {
    Description,
    Quantity,
    UnitPrice,
    LineTotal,
}

/// A detected table region and its emitted content.
pub struct DetectedTable {
    pub meta: TableMeta,
    pub items: Vec<LineItem>,
}

fn split_row(line: &str) -> Vec<String> {
    let sep = if line.contains('\t') {
        '\t'
    } else if line.contains('|') {
        '|'
    } else {
        ','
    };
    line.split(sep).map(|c| c.trim().to_string()).collect()
}

fn looks_like_row(line: &str) -> bool {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return false;
    }
    trimmed.contains('\t') || trimmed.contains('|') || trimmed.matches(',').count() >= 1
}

fn is_mostly_non_numeric_and_distinct(cells: &[String]) -> bool {
    if cells.is_empty() {
        return false;
    }
    let non_numeric = cells.iter().filter(|c| parse_number(c).is_none()).count();
    let distinct: std::collections::BTreeSet<&str> = cells.iter().map(|c| c.as_str()).collect();
    non_numeric * 2 >= cells.len() && distinct.len() == cells.len()
}

fn map_header(header: &[String]) -> Vec<Option<LineItemField>> {
    header
        .iter()
        .map(|cell| {
            let lower = cell.to_lowercase();
            LINE_ITEM_HEADER_WORDS
                .iter()
                .find(|(words, _)| words.iter().any(|w| lower.contains(w)))
                .map(|(_, field)| *field)
        })
        .collect()
}

fn classify_kind(header: &[String]) -> TableKind {
    let mapped = map_header(header);
    if mapped.iter().any(Option::is_some) {
        TableKind::LineItems
    } else {
        // Single-row summary tables tend to be short (<= 4 columns); wider
        // regions with no recognizable headers are treated as plain data.
        if header.len() <= 4 {
            TableKind::Summary
        } else {
            TableKind::Data
        }
    }
}

fn row_to_line_item(fields: &[Option<LineItemField>], row: &[String]) -> LineItem {
    let mut item = LineItem::default();
    for (field, cell) in fields.iter().zip(row.iter()) {
        match field {
            Some(LineItemField::Description) => item.description = Some(cell.clone()),
            Some(LineItemField::Quantity) => item.quantity = parse_number(cell),
            Some(LineItemField::UnitPrice) => item.unit_price = parse_number(cell),
            Some(LineItemField::LineTotal) => item.line_total = parse_number(cell),
            None => {}
        }
    }
    item
}

/// Detects table regions across a document's raw sections. Returns an empty
/// list for PDF input, per spec.
pub fn extract_tables(file_type: FileType, sections: &[RawSection]) -> Vec<DetectedTable> {
    if file_type == FileType::Pdf {
        return Vec::new();
    }

    let mut tables = Vec::new();
    let mut run: Vec<&RawSection> = Vec::new();

    let flush = |run: &mut Vec<&RawSection>, tables: &mut Vec<DetectedTable>| {
        if run.len() < 2 {
            run.clear();
            return;
        }
        let rows: Vec<Vec<String>> = run.iter().map(|s| split_row(&s.content)).collect();
        let header = &rows[0];
        if !is_mostly_non_numeric_and_distinct(header) {
            run.clear();
            return;
        }
        let kind = classify_kind(header);
        let section_ids = run.iter().map(|s| s.id.clone()).collect();
        let mut items = Vec::new();
        if kind == TableKind::LineItems {
            let fields = map_header(header);
            for row in rows.iter().skip(1) {
                items.push(row_to_line_item(&fields, row));
            }
        }
        tables.push(DetectedTable {
            meta: TableMeta { kind, section_ids, header: header.clone() },
            items,
        });
        run.clear();
    };

    for section in sections {
        if looks_like_row(&section.content) {
            run.push(section);
        } else {
            flush(&mut run, &mut tables);
        }
    }
    flush(&mut run, &mut tables);

    tables
}

//! Aggregator result and plan types (§4.11).

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AggregateOp {
    Sum,
    Avg,
    Median,
    Min,
    Max,
    Count,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AggregateField {
    Total,
    Tax,
    LineTotal,
    Qty,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GroupBy {
    Type,
    Supplier,
    Month,
    Year,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AggregateFilters {
    pub doc_type: Option<crate::normalized::DocType>,
    pub date_from: Option<chrono::DateTime<chrono::Utc>>,
    pub date_to: Option<chrono::DateTime<chrono::Utc>>,
    pub supplier: Option<String>,
    pub currency: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AggregatePlan {
    pub op: AggregateOp,
    pub field: AggregateField,
    pub filters: AggregateFilters,
    pub group_by: Option<GroupBy>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AggregateResult {
    pub operation: AggregateOp,
    pub field: AggregateField,
    pub filters: AggregateFilters,
    pub count: usize,
    pub value: Option<Decimal>,
    pub currency: Option<String>,
    pub formatted: String,
    pub group_by: Option<BTreeMap<String, Decimal>>,
    pub duplicates: Vec<String>,
    pub outliers: Vec<Decimal>,
}

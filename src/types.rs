use crate::util::{clean, format_currency, format_int, format_number};
use serde::Serialize;
use std::fmt;
use std::sync::Arc;
use tabled::Tabled;

// Column names as they appear in the inventory export header.
pub const FIELD_ABC: &str = "ABC";
pub const FIELD_AMOUNT: &str = "Importe Vendido";
pub const FIELD_SUBCATEGORY: &str = "Subcategoría";
pub const FIELD_STOCK: &str = "Stock";
pub const FIELD_VOLUME: &str = "Volumen Vendido";
pub const FIELD_MATERIAL: &str = "Material";
pub const FIELD_DESCRIPTION: &str = "Descripción";

/// Bucket label for rows without a classification code.
pub const UNCLASSIFIED: &str = "unclassified";

/// A single scalar cell after type inference.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Value {
    Number(f64),
    Text(String),
    Bool(bool),
    Null,
}

impl Value {
    /// Whether the cell counts as "present" for grouping purposes.
    ///
    /// Null, empty text, zero and `false` are all treated as absent.
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Number(n) => *n != 0.0 && !n.is_nan(),
            Value::Text(s) => !s.is_empty(),
            Value::Bool(b) => *b,
            Value::Null => false,
        }
    }

    /// Render the value as a grouping key. `None` for null cells.
    pub fn label(&self) -> Option<String> {
        match self {
            Value::Null => None,
            other => Some(other.to_string()),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            // Integral numbers print without a trailing ".0" so `1` groups as "1".
            Value::Number(n) if n.fract() == 0.0 && n.abs() < 1e15 => {
                write!(f, "{}", *n as i64)
            }
            Value::Number(n) => write!(f, "{}", n),
            Value::Text(s) => f.write_str(s),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Null => Ok(()),
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

/// One inventory item: header names paired positionally with cell values.
///
/// Rows parsed from the same file share one header slice. A row that is
/// shorter than the header simply lacks the trailing fields.
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    headers: Arc<[String]>,
    values: Vec<Value>,
}

impl Row {
    pub fn new(headers: Arc<[String]>, values: Vec<Value>) -> Self {
        Self { headers, values }
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        let idx = self.headers.iter().position(|h| h == field)?;
        self.values.get(idx)
    }

    /// Grouping label for `field`, only when the cell is present and truthy.
    pub fn label(&self, field: &str) -> Option<String> {
        self.get(field).filter(|v| v.is_truthy()).and_then(Value::label)
    }

    /// Display text for `field`, `None` when absent or null.
    pub fn text(&self, field: &str) -> Option<String> {
        self.get(field).and_then(Value::label)
    }

    /// Normalized numeric value for `field`. `None` means missing or not a number.
    pub fn number(&self, field: &str) -> Option<f64> {
        self.get(field).and_then(clean)
    }
}

impl<K: Into<String>> FromIterator<(K, Value)> for Row {
    fn from_iter<I: IntoIterator<Item = (K, Value)>>(iter: I) -> Self {
        let (headers, values): (Vec<String>, Vec<Value>) =
            iter.into_iter().map(|(k, v)| (k.into(), v)).unzip();
        Row::new(headers.into(), values)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryDistributionEntry {
    pub category: String,
    pub product_count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryShare {
    pub category: String,
    pub product_count: usize,
    pub percent: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CategorySalesEntry {
    pub category: String,
    pub product_count: usize,
    pub total_sales: f64,
    pub average_sales: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RotationEntry {
    pub subcategory: String,
    pub rotation_index: f64,
    pub product_count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TopProductEntry {
    pub code: Option<String>,
    pub name: Option<String>,
    pub category: Option<String>,
    pub subcategory: Option<String>,
    pub amount: f64,
    pub volume: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardSummary {
    pub total_rows: usize,
    pub rows_with_amount: usize,
    pub classified_rows: usize,
    pub total_sales: f64,
    pub rotation_subcategories: usize,
}

/// Everything the presentation layer reads after one load.
///
/// A failed load still produces a `Dashboard`, with `loaded == false`, the
/// error message, and every result set empty.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Dashboard {
    pub loaded: bool,
    pub error: Option<String>,
    pub distribution: Vec<CategoryDistributionEntry>,
    pub shares: Vec<CategoryShare>,
    pub sales: Vec<CategorySalesEntry>,
    pub rotation: Vec<RotationEntry>,
    pub top_products: Vec<TopProductEntry>,
    pub top_breakdown: Vec<CategoryDistributionEntry>,
    pub summary: DashboardSummary,
}

impl Dashboard {
    pub fn failed(err: impl fmt::Display) -> Self {
        Self {
            loaded: false,
            error: Some(err.to_string()),
            ..Self::default()
        }
    }
}

// Console rows. Numbers are pre-formatted the way the dashboard shows them.

#[derive(Debug, Tabled, Clone)]
pub struct ShareRow {
    #[tabled(rename = "Category")]
    pub category: String,
    #[tabled(rename = "Products")]
    pub products: String,
    #[tabled(rename = "Share")]
    pub share: String,
}

impl From<&CategoryShare> for ShareRow {
    fn from(e: &CategoryShare) -> Self {
        Self {
            category: e.category.clone(),
            products: format_int(e.product_count),
            share: format!("{:.0}%", e.percent),
        }
    }
}

#[derive(Debug, Tabled, Clone)]
pub struct SalesRow {
    #[tabled(rename = "Category")]
    pub category: String,
    #[tabled(rename = "Products")]
    pub products: String,
    #[tabled(rename = "TotalSales")]
    pub total_sales: String,
    #[tabled(rename = "AvgSales")]
    pub average_sales: String,
}

impl From<&CategorySalesEntry> for SalesRow {
    fn from(e: &CategorySalesEntry) -> Self {
        Self {
            category: e.category.clone(),
            products: format_int(e.product_count),
            total_sales: format_currency(e.total_sales),
            average_sales: format_currency(e.average_sales),
        }
    }
}

#[derive(Debug, Tabled, Clone)]
pub struct RotationRow {
    #[tabled(rename = "Subcategory")]
    pub subcategory: String,
    #[tabled(rename = "RotationIndex")]
    pub rotation_index: String,
    #[tabled(rename = "Products")]
    pub products: String,
}

impl From<&RotationEntry> for RotationRow {
    fn from(e: &RotationEntry) -> Self {
        Self {
            subcategory: e.subcategory.clone(),
            rotation_index: format_number(e.rotation_index, 2),
            products: format_int(e.product_count),
        }
    }
}

#[derive(Debug, Tabled, Clone)]
pub struct TopProductRow {
    #[tabled(rename = "Rank")]
    pub rank: usize,
    #[tabled(rename = "Material")]
    pub code: String,
    #[tabled(rename = "Description")]
    pub name: String,
    #[tabled(rename = "ABC")]
    pub category: String,
    #[tabled(rename = "Subcategory")]
    pub subcategory: String,
    #[tabled(rename = "Amount")]
    pub amount: String,
    #[tabled(rename = "Volume")]
    pub volume: String,
}

impl TopProductRow {
    pub fn ranked(rank: usize, e: &TopProductEntry) -> Self {
        Self {
            rank,
            code: e.code.clone().unwrap_or_default(),
            name: e.name.clone().unwrap_or_default(),
            category: e.category.clone().unwrap_or_else(|| UNCLASSIFIED.to_string()),
            subcategory: e.subcategory.clone().unwrap_or_default(),
            amount: format_currency(e.amount),
            volume: e.volume.map(|v| format_number(v, 0)).unwrap_or_default(),
        }
    }
}

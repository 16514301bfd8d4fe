use crate::loader;
use crate::types::{
    CategoryDistributionEntry, CategorySalesEntry, CategoryShare, Dashboard, DashboardSummary,
    RotationEntry, Row, TopProductEntry, FIELD_ABC, FIELD_AMOUNT, FIELD_DESCRIPTION,
    FIELD_MATERIAL, FIELD_STOCK, FIELD_SUBCATEGORY, FIELD_VOLUME, UNCLASSIFIED,
};
use crate::util::ratio_or_zero;
use std::cmp::Ordering;
use std::collections::HashMap;
use std::path::Path;
use tracing::{debug, error, info};

/// Subcategories need strictly more products than this to be ranked by rotation.
pub const MIN_ROTATION_PRODUCTS: usize = 5;
/// Length of the top-products ranking.
pub const TOP_PRODUCTS: usize = 20;
/// Bars shown in each of the fastest/slowest rotation charts.
pub const ROTATION_CHART_LEN: usize = 10;

/// Classification keys that are string artifacts of upstream exports rather
/// than real codes. Dropped from the distribution and sales lists only.
const ARTIFACT_KEYS: [&str; 2] = ["null", "undefined"];

/// Accumulators keyed by group label, remembering first-seen key order so
/// output is deterministic for identical input.
struct Groups<A> {
    index: HashMap<String, usize>,
    entries: Vec<(String, A)>,
}

impl<A: Default> Groups<A> {
    fn new() -> Self {
        Self {
            index: HashMap::new(),
            entries: Vec::new(),
        }
    }

    fn entry(&mut self, key: String) -> &mut A {
        let idx = match self.index.get(&key) {
            Some(&idx) => idx,
            None => {
                self.entries.push((key.clone(), A::default()));
                self.index.insert(key, self.entries.len() - 1);
                self.entries.len() - 1
            }
        };
        &mut self.entries[idx].1
    }

    fn into_entries(self) -> Vec<(String, A)> {
        self.entries
    }
}

fn classification(row: &Row) -> String {
    row.label(FIELD_ABC).unwrap_or_else(|| UNCLASSIFIED.to_string())
}

fn is_artifact_key(key: &str) -> bool {
    ARTIFACT_KEYS.contains(&key)
}

fn descending(a: f64, b: f64) -> Ordering {
    b.partial_cmp(&a).unwrap_or(Ordering::Equal)
}

/// Product counts per ABC bucket plus the per-bucket sales summary.
///
/// Rows with an unusable amount still count toward their bucket; they just
/// add nothing to its sales total. The sales list is sorted by average sale,
/// highest first.
pub fn category_summary(
    rows: &[Row],
) -> (Vec<CategoryDistributionEntry>, Vec<CategorySalesEntry>) {
    #[derive(Default)]
    struct Acc {
        count: usize,
        total_sales: f64,
    }

    let mut groups: Groups<Acc> = Groups::new();
    for row in rows {
        let acc = groups.entry(classification(row));
        acc.count += 1;
        if let Some(amount) = row.number(FIELD_AMOUNT) {
            acc.total_sales += amount;
        }
    }

    let kept: Vec<(String, Acc)> = groups
        .into_entries()
        .into_iter()
        .filter(|(key, _)| !is_artifact_key(key))
        .collect();

    let distribution = kept
        .iter()
        .map(|(key, acc)| CategoryDistributionEntry {
            category: key.clone(),
            product_count: acc.count,
        })
        .collect();

    let mut sales: Vec<CategorySalesEntry> = kept
        .into_iter()
        .map(|(key, acc)| CategorySalesEntry {
            category: key,
            product_count: acc.count,
            total_sales: acc.total_sales,
            average_sales: ratio_or_zero(acc.total_sales, acc.count as f64),
        })
        .collect();
    sales.sort_by(|a, b| descending(a.average_sales, b.average_sales));

    (distribution, sales)
}

/// Percentage of products held by each bucket, as labelled on the pie chart.
pub fn category_shares(distribution: &[CategoryDistributionEntry]) -> Vec<CategoryShare> {
    let total: usize = distribution.iter().map(|e| e.product_count).sum();
    distribution
        .iter()
        .map(|e| CategoryShare {
            category: e.category.clone(),
            product_count: e.product_count,
            percent: ratio_or_zero(e.product_count as f64, total as f64) * 100.0,
        })
        .collect()
}

/// Inventory rotation (volume sold over stock held) per subcategory.
///
/// Rows without a subcategory are skipped. Missing or unparseable volume and
/// stock count as zero. Only subcategories with more than
/// [`MIN_ROTATION_PRODUCTS`] products and a positive index are returned,
/// fastest first.
pub fn rotation_index(rows: &[Row]) -> Vec<RotationEntry> {
    #[derive(Default)]
    struct Acc {
        count: usize,
        total_volume: f64,
        total_stock: f64,
    }

    let mut groups: Groups<Acc> = Groups::new();
    for row in rows {
        let Some(subcategory) = row.label(FIELD_SUBCATEGORY) else {
            continue;
        };
        let acc = groups.entry(subcategory);
        acc.count += 1;
        acc.total_volume += row.number(FIELD_VOLUME).unwrap_or(0.0);
        acc.total_stock += row.number(FIELD_STOCK).unwrap_or(0.0);
    }

    let mut out: Vec<RotationEntry> = groups
        .into_entries()
        .into_iter()
        .map(|(subcategory, acc)| RotationEntry {
            subcategory,
            rotation_index: ratio_or_zero(acc.total_volume, acc.total_stock),
            product_count: acc.count,
        })
        .filter(|e| e.product_count > MIN_ROTATION_PRODUCTS && e.rotation_index > 0.0)
        .collect();
    out.sort_by(|a, b| descending(a.rotation_index, b.rotation_index));
    debug!(subcategories = out.len(), "rotation index computed");
    out
}

/// Fastest `n` and slowest `n` subcategories from a sorted rotation list.
///
/// The slowest list starts with the very slowest.
pub fn rotation_extremes(
    rotation: &[RotationEntry],
    n: usize,
) -> (Vec<RotationEntry>, Vec<RotationEntry>) {
    let fastest = rotation.iter().take(n).cloned().collect();
    let slowest = rotation[rotation.len().saturating_sub(n)..]
        .iter()
        .rev()
        .cloned()
        .collect();
    (fastest, slowest)
}

/// The `limit` highest-value products by sold amount.
///
/// Rows whose amount does not normalize to a number are not eligible. Ties
/// keep input order.
pub fn top_products(rows: &[Row], limit: usize) -> Vec<TopProductEntry> {
    let mut candidates: Vec<TopProductEntry> = rows
        .iter()
        .filter_map(|row| {
            let amount = row.number(FIELD_AMOUNT)?;
            Some(TopProductEntry {
                code: row.text(FIELD_MATERIAL),
                name: row.text(FIELD_DESCRIPTION),
                category: row.label(FIELD_ABC),
                subcategory: row.text(FIELD_SUBCATEGORY),
                amount,
                volume: row.number(FIELD_VOLUME),
            })
        })
        .collect();
    candidates.sort_by(|a, b| descending(a.amount, b.amount));
    candidates.truncate(limit);
    candidates
}

/// Count of ABC buckets inside an already-truncated top-products list.
pub fn top_category_breakdown(top: &[TopProductEntry]) -> Vec<CategoryDistributionEntry> {
    let mut groups: Groups<usize> = Groups::new();
    for product in top {
        let key = product
            .category
            .clone()
            .unwrap_or_else(|| UNCLASSIFIED.to_string());
        *groups.entry(key) += 1;
    }
    groups
        .into_entries()
        .into_iter()
        .map(|(category, product_count)| CategoryDistributionEntry {
            category,
            product_count,
        })
        .collect()
}

/// Run every aggregation over a row sequence.
///
/// Pure: the same rows always yield the same dashboard.
pub fn build_dashboard(rows: &[Row]) -> Dashboard {
    let (distribution, sales) = category_summary(rows);
    let shares = category_shares(&distribution);
    let rotation = rotation_index(rows);
    let top = top_products(rows, TOP_PRODUCTS);
    let top_breakdown = top_category_breakdown(&top);

    let amounts: Vec<f64> = rows.iter().filter_map(|r| r.number(FIELD_AMOUNT)).collect();
    let summary = DashboardSummary {
        total_rows: rows.len(),
        rows_with_amount: amounts.len(),
        classified_rows: rows.iter().filter(|r| r.label(FIELD_ABC).is_some()).count(),
        total_sales: amounts.iter().sum(),
        rotation_subcategories: rotation.len(),
    };
    debug!(
        rows = summary.total_rows,
        categories = distribution.len(),
        rotation = rotation.len(),
        top = top.len(),
        "dashboard aggregated"
    );

    Dashboard {
        loaded: true,
        error: None,
        distribution,
        shares,
        sales,
        rotation,
        top_products: top,
        top_breakdown,
        summary,
    }
}

/// Parse raw delimited text and aggregate it. Failures yield an empty,
/// failed dashboard rather than an error.
pub fn dashboard_from_text(text: &str) -> Dashboard {
    match loader::parse_rows(text) {
        Ok(dataset) => build_dashboard(&dataset.rows),
        Err(e) => {
            error!(error = %e, "failed to parse dataset");
            Dashboard::failed(e)
        }
    }
}

/// Load a dataset from disk and aggregate it. Failures yield an empty,
/// failed dashboard rather than an error.
pub fn load_dashboard(path: impl AsRef<Path>) -> Dashboard {
    match loader::load_path(path) {
        Ok(dataset) => {
            let dashboard = build_dashboard(&dataset.rows);
            info!(
                rows = dashboard.summary.total_rows,
                with_amount = dashboard.summary.rows_with_amount,
                "dashboard ready"
            );
            dashboard
        }
        Err(e) => {
            error!(error = %e, "failed to load dataset");
            Dashboard::failed(e)
        }
    }
}

use inventory_dashboard::reports::{MIN_ROTATION_PRODUCTS, TOP_PRODUCTS};
use inventory_dashboard::{dashboard_from_text, load_dashboard, loader, output};
use std::fmt::Write as _;
use std::path::PathBuf;
use tempfile::TempDir;

const HEADER: &str =
    "Material;Descripción;ABC;Subcategoría;Importe Vendido;Volumen Vendido;Stock";

/// 40 products over three subcategories, semicolon separated, comma decimals.
fn inventory_export() -> String {
    let mut text = String::from(HEADER);
    text.push('\n');
    for i in 0..40 {
        let abc = match i % 4 {
            0 => "A",
            1 => "B",
            2 => "C",
            _ => "",
        };
        let sub = match i % 3 {
            0 => "Herramientas",
            1 => "Pinturas",
            _ => "Eléctrico",
        };
        let amount = if i == 7 {
            "sin dato".to_string()
        } else {
            format!("$ {},50", 100 + i * 10)
        };
        let stock = if i % 5 == 0 { "2,5".to_string() } else { "4".to_string() };
        writeln!(
            text,
            "{:06};Producto {};{};{};{};{};{}",
            i, i, abc, sub, amount, i % 7, stock
        )
        .unwrap();
        if i == 20 {
            text.push('\n');
        }
    }
    text
}

fn write_export(dir: &TempDir) -> PathBuf {
    let path = dir.path().join("data-3.csv");
    std::fs::write(&path, inventory_export()).expect("write export");
    path
}

#[test]
fn loads_semicolon_export_from_disk() {
    let tmp = TempDir::new().expect("tempdir");
    let path = write_export(&tmp);
    let ds = loader::load_path(&path).expect("load");
    assert_eq!(ds.delimiter, b';');
    assert_eq!(ds.rows.len(), 40);
}

#[test]
fn distribution_accounts_for_every_row() {
    let d = dashboard_from_text(&inventory_export());
    assert!(d.loaded);
    let total: usize = d.distribution.iter().map(|e| e.product_count).sum();
    assert_eq!(total, 40);
    let unclassified = d
        .distribution
        .iter()
        .find(|e| e.category == "unclassified")
        .expect("unclassified bucket");
    assert_eq!(unclassified.product_count, 10);
}

#[test]
fn sales_averages_match_totals() {
    let d = dashboard_from_text(&inventory_export());
    for e in &d.sales {
        let expected = if e.product_count == 0 {
            0.0
        } else {
            e.total_sales / e.product_count as f64
        };
        assert!((e.average_sales - expected).abs() < 1e-9);
    }
    assert!(d
        .sales
        .windows(2)
        .all(|w| w[0].average_sales >= w[1].average_sales));
}

#[test]
fn rotation_respects_thresholds() {
    let d = dashboard_from_text(&inventory_export());
    assert_eq!(d.rotation.len(), 3);
    for e in &d.rotation {
        assert!(e.product_count > MIN_ROTATION_PRODUCTS);
        assert!(e.rotation_index > 0.0);
    }
    assert!(d
        .rotation
        .windows(2)
        .all(|w| w[0].rotation_index >= w[1].rotation_index));
}

#[test]
fn top_products_are_the_twenty_largest() {
    let d = dashboard_from_text(&inventory_export());
    assert_eq!(d.top_products.len(), TOP_PRODUCTS);
    assert!(d
        .top_products
        .windows(2)
        .all(|w| w[0].amount >= w[1].amount));
    assert_eq!(d.top_products[0].code.as_deref(), Some("000039"));
    assert!((d.top_products[0].amount - 490.5).abs() < 1e-9);
    let breakdown_total: usize = d.top_breakdown.iter().map(|e| e.product_count).sum();
    assert_eq!(breakdown_total, TOP_PRODUCTS);
    assert_eq!(d.summary.rows_with_amount, 39);
}

#[test]
fn missing_file_surfaces_failure_with_empty_results() {
    let tmp = TempDir::new().expect("tempdir");
    let d = load_dashboard(tmp.path().join("missing.csv"));
    assert!(!d.loaded);
    assert!(d.error.as_deref().unwrap_or_default().contains("missing.csv"));
    assert!(d.distribution.is_empty());
    assert!(d.sales.is_empty());
    assert!(d.rotation.is_empty());
    assert!(d.top_products.is_empty());
    assert!(d.top_breakdown.is_empty());
}

#[test]
fn reloading_the_same_file_is_idempotent() {
    let tmp = TempDir::new().expect("tempdir");
    let path = write_export(&tmp);
    let first = load_dashboard(&path);
    let second = load_dashboard(&path);
    assert_eq!(first, second);
    let a = serde_json::to_string(&first).unwrap();
    let b = serde_json::to_string(&second).unwrap();
    assert_eq!(a, b);
}

#[test]
fn small_example_end_to_end() {
    let text = "ABC,Importe Vendido\nA,\"100,00\"\nA,\"50,00\"\nB,\"200,00\"\n";
    let d = dashboard_from_text(text);
    let dist: Vec<_> = d
        .distribution
        .iter()
        .map(|e| (e.category.as_str(), e.product_count))
        .collect();
    assert_eq!(dist, vec![("A", 2), ("B", 1)]);
    let sales: Vec<_> = d
        .sales
        .iter()
        .map(|e| (e.category.as_str(), e.product_count, e.total_sales, e.average_sales))
        .collect();
    assert_eq!(sales, vec![("B", 1, 200.0, 200.0), ("A", 2, 150.0, 75.0)]);
}

#[test]
fn dashboard_json_round_trips_to_disk() {
    let tmp = TempDir::new().expect("tempdir");
    let d = dashboard_from_text(&inventory_export());
    let path = tmp.path().join("dashboard.json");
    output::write_json(&path, &d).expect("write json");
    let value: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(value["loaded"], true);
    assert_eq!(value["topProducts"].as_array().map(Vec::len), Some(TOP_PRODUCTS));
    assert_eq!(value["summary"]["totalRows"], 40);
}

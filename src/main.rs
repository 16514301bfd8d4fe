// Entry point and interactive console flow.
//
// - Option [1] loads the inventory export and aggregates it.
// - Option [2] prints the dashboard tables and writes the report files.
// - After generating reports the user can go back to the menu (and reload)
//   or exit. `--batch` runs load + reports once without the menu.
use anyhow::bail;
use clap::Parser;
use inventory_dashboard::config::Cli;
use inventory_dashboard::types::{RotationRow, SalesRow, ShareRow, TopProductRow};
use inventory_dashboard::{load_dashboard, logging, output, reports, util, Dashboard};
use once_cell::sync::Lazy;
use std::io::{self, Write};
use std::path::Path;
use std::sync::Mutex;
use tracing::warn;

// The latest load result. A failed load replaces any earlier data so reports
// are never produced from a stale dataset.
static APP_STATE: Lazy<Mutex<AppState>> = Lazy::new(|| Mutex::new(AppState { dashboard: None }));

struct AppState {
    dashboard: Option<Dashboard>,
}

/// `None` once stdin is closed.
fn read_choice() -> Option<String> {
    print!("Enter choice: ");
    let _ = io::stdout().flush();
    let mut buf = String::new();
    match io::stdin().read_line(&mut buf) {
        Ok(0) | Err(_) => None,
        Ok(_) => Some(buf.trim().to_string()),
    }
}

/// Returns `true` if the user chose `Y`, `false` for `N`.
fn prompt_back_to_menu() -> bool {
    loop {
        print!("Back to Report Selection (Y/N): ");
        let _ = io::stdout().flush();
        let mut buf = String::new();
        if io::stdin().read_line(&mut buf).unwrap_or(0) == 0 {
            return false;
        }
        match buf.trim().to_uppercase().as_str() {
            "Y" => return true,
            "N" => return false,
            _ => println!("Invalid choice. Please enter Y or N."),
        }
    }
}

/// Handle option [1]: load and aggregate the dataset. Returns whether it loaded.
fn handle_load(path: &Path) -> bool {
    let dashboard = load_dashboard(path);
    let loaded = dashboard.loaded;
    if loaded {
        let s = &dashboard.summary;
        println!(
            "Processing dataset... ({} rows loaded, {} with a valid sold amount)",
            util::format_int(s.total_rows),
            util::format_int(s.rows_with_amount)
        );
        println!(
            "Total sold: {} across {} classified products.\n",
            util::format_currency(s.total_sales),
            util::format_int(s.classified_rows)
        );
    } else {
        eprintln!(
            "Failed to load file: {}\n",
            dashboard.error.as_deref().unwrap_or("unknown error")
        );
    }
    let mut state = APP_STATE.lock().unwrap_or_else(|e| e.into_inner());
    state.dashboard = Some(dashboard);
    loaded
}

fn export<T: serde::Serialize>(out_dir: &Path, file: &str, rows: &[T]) {
    let path = out_dir.join(file);
    if let Err(e) = output::write_csv(&path, rows) {
        warn!(path = %path.display(), error = %e, "report write failed");
        eprintln!("Write error: {}", e);
    }
}

/// Handle option [2]: print every dashboard table and write the report files.
fn handle_generate_reports(cli: &Cli) {
    let dashboard = {
        let state = APP_STATE.lock().unwrap_or_else(|e| e.into_inner());
        state.dashboard.clone()
    };
    let Some(d) = dashboard.filter(|d| d.loaded) else {
        println!("Error: No data loaded. Please load the CSV file first (option 1).\n");
        return;
    };
    if let Err(e) = std::fs::create_dir_all(&cli.out_dir) {
        eprintln!("Cannot create {}: {}", cli.out_dir.display(), e);
        return;
    }
    let out = cli.out_dir.as_path();
    let n = cli.preview_rows;

    println!("Generating reports...");
    println!("Outputs saved to {}\n", out.display());

    export(out, "abc_distribution.csv", &d.distribution);
    println!("Report 1: ABC Analysis\n");
    println!("Product Distribution by Category\n");
    let shares: Vec<ShareRow> = d.shares.iter().map(ShareRow::from).collect();
    output::preview_table_rows(&shares, n);

    export(out, "abc_sales.csv", &d.sales);
    println!("Average Sale by ABC Category\n");
    let sales: Vec<SalesRow> = d.sales.iter().map(SalesRow::from).collect();
    output::preview_table_rows(&sales, n);
    println!("(Full tables exported to abc_distribution.csv and abc_sales.csv)\n");

    export(out, "rotation.csv", &d.rotation);
    println!("Report 2: Inventory Rotation");
    println!(
        "(Subcategories with more than {} products)\n",
        reports::MIN_ROTATION_PRODUCTS
    );
    let (fastest, slowest) = reports::rotation_extremes(&d.rotation, reports::ROTATION_CHART_LEN);
    println!("Highest Rotation\n");
    let fastest: Vec<RotationRow> = fastest.iter().map(RotationRow::from).collect();
    output::preview_table_rows(&fastest, n);
    println!("Lowest Rotation\n");
    let slowest: Vec<RotationRow> = slowest.iter().map(RotationRow::from).collect();
    output::preview_table_rows(&slowest, n);
    println!("(Full table exported to rotation.csv)\n");

    export(out, "top_products.csv", &d.top_products);
    export(out, "top_categories.csv", &d.top_breakdown);
    println!("Report 3: Top {} Products by Sold Amount\n", reports::TOP_PRODUCTS);
    let top: Vec<TopProductRow> = d
        .top_products
        .iter()
        .enumerate()
        .map(|(i, p)| TopProductRow::ranked(i + 1, p))
        .collect();
    output::preview_table_rows(&top, n);
    println!("ABC Categories within the Top {}\n", reports::TOP_PRODUCTS);
    let breakdown: Vec<ShareRow> = reports::category_shares(&d.top_breakdown)
        .iter()
        .map(ShareRow::from)
        .collect();
    output::preview_table_rows(&breakdown, n);
    println!("(Full tables exported to top_products.csv and top_categories.csv)\n");

    if let Err(e) = output::write_json(out.join("dashboard.json"), &d) {
        eprintln!("Write error: {}", e);
    }
    println!("Summary Stats (dashboard.json):");
    println!(
        "{{\"total_rows\": {}, \"total_sales\": {}}}\n",
        util::format_int(d.summary.total_rows),
        util::format_number(d.summary.total_sales, 2)
    );
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    logging::setup_logging(&cli.log_level);

    if cli.batch {
        if !handle_load(&cli.data) {
            bail!("could not load {}", cli.data.display());
        }
        handle_generate_reports(&cli);
        return Ok(());
    }

    loop {
        println!("Inventory Dashboard ({}):", cli.data.display());
        println!("[1] Load the file");
        println!("[2] Generate Reports\n");
        let Some(choice) = read_choice() else {
            break;
        };
        match choice.as_str() {
            "1" => {
                handle_load(&cli.data);
            }
            "2" => {
                println!();
                handle_generate_reports(&cli);
                if !prompt_back_to_menu() {
                    println!("Exiting the program.");
                    break;
                }
            }
            _ => {
                println!("Invalid choice. Please enter 1 or 2.\n");
            }
        }
    }
    Ok(())
}

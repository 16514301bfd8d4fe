use clap::Parser;
use std::path::PathBuf;

/// Inventory analytics: ABC distribution, rotation index and top products.
#[derive(Parser, Debug, Clone)]
#[command(name = "inventory_dashboard", version)]
pub struct Cli {
    /// Delimited inventory export to analyse.
    #[arg(long, env = "DASHBOARD_DATA", default_value = "data/data-3.csv")]
    pub data: PathBuf,

    /// Directory that receives the CSV and JSON report files.
    #[arg(long, default_value = ".")]
    pub out_dir: PathBuf,

    /// Log filter (`error`, `warn`, `info`, `debug`, or an EnvFilter directive).
    #[arg(long, env = "DASHBOARD_LOG", default_value = "info")]
    pub log_level: String,

    /// Rows shown per table in console previews.
    #[arg(long, default_value_t = 5)]
    pub preview_rows: usize,

    /// Load and report once, then exit without the interactive menu.
    #[arg(long)]
    pub batch: bool,
}

//! Inventory analytics over a delimited stock export.
//!
//! Raw text is parsed into typed [`types::Row`]s by [`loader`], numeric cells
//! are normalized by [`util::clean`], and [`reports`] derives the ABC
//! distribution, the rotation index per subcategory and the top products by
//! sold amount. The binary renders those results as console tables and
//! report files.
pub mod config;
pub mod error;
pub mod loader;
pub mod logging;
pub mod output;
pub mod reports;
pub mod types;
pub mod util;

pub use error::{DashboardError, Result};
pub use reports::{build_dashboard, dashboard_from_text, load_dashboard};
pub use types::{Dashboard, Row, Value};

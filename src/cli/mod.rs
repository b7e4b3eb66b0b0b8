pub mod catalog;
pub mod dashboard;
pub mod generate;
pub mod init;
pub mod status;

use clap::{Args, Parser, Subcommand, ValueEnum};

use crate::models::Category;
use crate::reports::ProductSort;
use crate::selection::{PeriodChoice, View};

#[derive(Parser)]
#[command(name = "pinebar", about = "Sales and profitability dashboard for Pine Bar.")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Render a dashboard view (the default command).
    Dashboard(DashboardArgs),
    /// Generate a synthetic POS export and write it as CSV.
    Generate {
        /// Period: 2023, 2024, 2025 or all
        #[arg(long)]
        period: PeriodChoice,
        /// Output file (a directory when --period all)
        #[arg(long)]
        output: Option<String>,
        /// Rescale the table so its revenue totals this amount
        #[arg(long = "target-revenue")]
        target_revenue: Option<f64>,
    },
    /// List catalog items and their cost bands.
    Catalog {
        /// Only show one category
        #[arg(long)]
        category: Option<Category>,
    },
    /// Write settings and create the data directory.
    Init {
        /// Path for CSV exports (default: ~/Documents/pinebar)
        #[arg(long = "data-dir")]
        data_dir: Option<String>,
    },
    /// Show the active settings and which exports are present.
    Status,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum SourceKind {
    #[default]
    Synthetic,
    Csv,
}

#[derive(Args, Debug, Default)]
pub struct DashboardArgs {
    /// Period: 2023, 2024, 2025 or all (default from settings)
    #[arg(long)]
    pub period: Option<PeriodChoice>,
    /// Category to include; repeatable. "All" selects everything.
    #[arg(long = "category")]
    pub categories: Vec<String>,
    /// View to render
    #[arg(long, value_enum, default_value_t = View::Overview)]
    pub view: View,
    /// Product ranking: most-sales, least-sales, most-profit, least-profit,
    /// highest-margin, lowest-margin, most-orders, least-orders
    #[arg(long, default_value = "most-sales")]
    pub sort: ProductSort,
    /// Where tables come from: generated in memory or read from CSV exports
    #[arg(long, value_enum, default_value_t = SourceKind::Synthetic)]
    pub source: SourceKind,
    /// Directory holding the CSV exports (default from settings)
    #[arg(long = "data-dir")]
    pub data_dir: Option<String>,
    /// Rescale loaded tables so revenue totals this amount
    #[arg(long = "target-revenue")]
    pub target_revenue: Option<f64>,
    /// Number of products in rankings (default from settings)
    #[arg(long)]
    pub top: Option<usize>,
}

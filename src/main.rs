mod catalog;
mod chart;
mod cli;
mod error;
mod filter;
mod fmt;
mod generator;
mod loader;
mod models;
mod reports;
mod selection;
mod settings;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use cli::{Cli, Commands};

fn init_tracing() {
    let filter = EnvFilter::try_from_env("PINEBAR_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact()
        .init();
}

fn main() {
    init_tracing();
    let cli = Cli::parse();

    let result = match cli.command {
        None => cli::dashboard::run(Default::default()),
        Some(Commands::Dashboard(args)) => cli::dashboard::run(args),
        Some(Commands::Generate {
            period,
            output,
            target_revenue,
        }) => cli::generate::run(period, output, target_revenue),
        Some(Commands::Catalog { category }) => cli::catalog::run(category),
        Some(Commands::Init { data_dir }) => cli::init::run(data_dir),
        Some(Commands::Status) => cli::status::run(),
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

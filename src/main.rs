//! sales-dashboard: a terminal dashboard for enterprise sales analytics.
//!
//! Runs a fixed set of read-only queries against the warehouse reporting
//! views and renders them as metrics, bar charts, line charts and tables.

mod app;
mod cli;
mod dashboard;
mod data;
mod error;
mod logging;
mod report;
mod ui;

use anyhow::{Context, Result};
use cli::{AppConfig, Cli, Commands};

fn main() -> Result<()> {
    // Parse CLI arguments
    let cli = Cli::parse_args();

    match cli.command {
        Commands::Show {
            connection,
            interval,
        } => {
            let config = AppConfig::from_args(connection, interval)?;
            logging::init_tracing(&config.log_file, "info")?;
            tracing::info!(interval, "starting dashboard");

            // Run the TUI application
            app::run(config)?;
        }
        Commands::Report { connection, format } => {
            let config = AppConfig::from_args(connection, 0)?;
            logging::init_tracing(&config.log_file, "info")?;

            let warehouse =
                app::open_warehouse(&config).context("Failed to connect to the warehouse")?;
            let dashboard = dashboard::Dashboard::load(warehouse.as_ref())
                .context("Dashboard render pass failed")?;

            let stdout = std::io::stdout();
            let mut out = stdout.lock();
            report::write_report(&dashboard, format, &mut out)?;
        }
    }

    Ok(())
}

//! wealth-tui: World Bank wealth and health indicators in the terminal
//!
//! `refresh` downloads the indicators and rewrites the merged CSV dataset;
//! `dashboard` is a keyboard-driven TUI over that dataset with correlation,
//! forecasting and PDF report export.

mod analysis;
mod app;
mod cli;
mod comparison;
mod data;
mod error;
mod report;
mod ui;
mod views;

use std::fs::{self, OpenOptions};
use std::path::Path;
use std::sync::Mutex;

use anyhow::{Context, Result};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use cli::{AppConfig, Cli, Commands, RefreshConfig};
use data::{
    merge::{merge, Merger},
    Storage, WorldBankClient,
};

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| "wealth_tui=info".into())
}

/// Log to stderr for one-shot commands
fn init_stderr_logging() {
    tracing_subscriber::registry()
        .with(env_filter())
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

/// Log to a file while the dashboard owns the terminal
fn init_file_logging(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("Failed to open log file {}", path.display()))?;

    tracing_subscriber::registry()
        .with(env_filter())
        .with(
            tracing_subscriber::fmt::layer()
                .with_ansi(false)
                .with_writer(Mutex::new(file)),
        )
        .init();
    Ok(())
}

/// Fetch, merge and persist. Nothing is written unless every step succeeds.
/// With `append` the fetched columns are merged into the stored dataset.
fn refresh(config: RefreshConfig) -> Result<()> {
    info!(
        indicators = ?config.indicators,
        start = config.start_year,
        end = config.end_year,
        api = %config.api_url,
        append = config.append,
        "Refreshing dataset"
    );

    let client = WorldBankClient::new(&config.api_url, config.timeout)?;
    let series = client
        .fetch_all(
            &config.indicators,
            &config.countries,
            config.start_year,
            config.end_year,
        )
        .context("Failed to fetch indicators")?;

    let storage = Storage::new(config.data_dir);
    let dataset = if config.append && storage.exists() {
        let existing = storage.read().context("Failed to read the existing dataset")?;
        info!(rows = existing.len(), "Appending to existing dataset");
        let mut merger = Merger::with_dataset(existing);
        for s in &series {
            merger.push(s);
        }
        merger.finish()
    } else {
        merge(&series)
    }
    .context("Failed to merge indicators")?;
    let path = storage.write(&dataset).context("Failed to write dataset")?;

    println!("Wrote {} rows to {}", dataset.len(), path.display());
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse_args();

    match cli.command {
        Commands::Refresh {
            countries,
            indicators,
            start_year,
            end_year,
            data_dir,
            api_url,
            timeout,
            append,
        } => {
            init_stderr_logging();
            let config = RefreshConfig::from_refresh_command(
                countries, indicators, start_year, end_year, data_dir, api_url, timeout, append,
            );
            refresh(config)?;
        }
        Commands::Dashboard {
            data_dir,
            report_path,
            year,
            country,
            min_gdp,
            max_gdp,
            top_n,
        } => {
            let config = AppConfig::from_dashboard_command(
                data_dir,
                report_path,
                year,
                country,
                min_gdp,
                max_gdp,
                top_n,
            );
            init_file_logging(&config.log_path())?;
            app::run(config)?;
        }
    }

    Ok(())
}

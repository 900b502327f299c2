//! Command-line interface argument parsing for wealth-tui.
//!
//! Two subcommands:
//! - `wealth-tui refresh --countries "USA;DEU" --start-year 2000`
//! - `wealth-tui dashboard --year 2020 --country ITA`

use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, Subcommand};

use crate::data::fetcher::DEFAULT_API_URL;
use crate::data::{CountrySelection, Indicator};

/// Environment variable overriding the data directory
pub const DIR_ENV: &str = "WEALTH_TUI_DIR";
/// Environment variable overriding the World Bank API base URL
pub const API_URL_ENV: &str = "WEALTH_TUI_API_URL";

/// A terminal dashboard for World Bank wealth and health indicators.
///
/// `refresh` downloads and merges the indicators into a CSV dataset;
/// `dashboard` explores it interactively and exports PDF reports.
#[derive(Parser, Debug)]
#[command(name = "wealth-tui")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Download indicators from the World Bank API and rewrite the dataset
    Refresh {
        /// Country codes separated by ';' or ',' ("all" for every country)
        #[arg(long, default_value = "all")]
        countries: String,

        /// Indicator codes separated by ','. Defaults to all four indicators
        #[arg(long)]
        indicators: Option<String>,

        /// First year to fetch (inclusive)
        #[arg(long, default_value_t = 2010)]
        start_year: i32,

        /// Last year to fetch (inclusive)
        #[arg(long, default_value_t = 2020)]
        end_year: i32,

        /// Directory holding final_dataset.csv
        #[arg(long)]
        data_dir: Option<String>,

        /// Base URL of the World Bank API
        #[arg(long)]
        api_url: Option<String>,

        /// HTTP timeout in seconds
        #[arg(long, default_value_t = 30)]
        timeout: u64,

        /// Merge into the existing dataset instead of replacing it
        #[arg(long)]
        append: bool,
    },

    /// Launch the TUI dashboard over the stored dataset
    Dashboard {
        /// Directory holding final_dataset.csv
        #[arg(long)]
        data_dir: Option<String>,

        /// Where the exported PDF report is written
        #[arg(long)]
        report_path: Option<String>,

        /// Initially selected year
        #[arg(short, long)]
        year: Option<i32>,

        /// Initially selected country (ISO3 code)
        #[arg(short, long)]
        country: Option<String>,

        /// Leave out countries with a lower GDP per capita (current US$)
        #[arg(long)]
        min_gdp: Option<f64>,

        /// Leave out countries with a higher GDP per capita (current US$)
        #[arg(long)]
        max_gdp: Option<f64>,

        /// Keep only the N richest countries of each year
        #[arg(long)]
        top_n: Option<usize>,
    },
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Cli::parse()
    }
}

/// Resolve the data directory: explicit flag, then env var, then the
/// platform data dir, then `./output`.
fn resolve_data_dir(flag: Option<String>, env: Option<String>) -> PathBuf {
    flag.or(env)
        .map(PathBuf::from)
        .unwrap_or_else(|| {
            dirs::data_local_dir()
                .map(|d| d.join("wealth-tui"))
                .unwrap_or_else(|| PathBuf::from("output"))
        })
}

fn resolve_api_url(flag: Option<String>, env: Option<String>) -> String {
    flag.or(env)
        .map(|u| u.trim_end_matches('/').to_string())
        .unwrap_or_else(|| DEFAULT_API_URL.to_string())
}

/// Settings for a `refresh` run
#[derive(Debug, Clone)]
pub struct RefreshConfig {
    pub countries: CountrySelection,
    pub indicators: Vec<String>,
    pub start_year: i32,
    pub end_year: i32,
    pub data_dir: PathBuf,
    pub api_url: String,
    pub timeout: Duration,
    /// Keep rows of the existing dataset that the refresh does not touch
    pub append: bool,
}

impl RefreshConfig {
    /// Create RefreshConfig from the `refresh` arguments
    pub fn from_refresh_command(
        countries: String,
        indicators: Option<String>,
        start_year: i32,
        end_year: i32,
        data_dir: Option<String>,
        api_url: Option<String>,
        timeout: u64,
        append: bool,
    ) -> Self {
        // Codes are validated by the fetcher so an unsupported one fails the refresh
        let indicators = indicators
            .map(|list| {
                list.split(',')
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty())
                    .collect()
            })
            .unwrap_or_else(|| Indicator::ALL.iter().map(|i| i.code().to_string()).collect());

        RefreshConfig {
            countries: CountrySelection::parse(&countries),
            indicators,
            start_year,
            end_year,
            data_dir: resolve_data_dir(data_dir, std::env::var(DIR_ENV).ok()),
            api_url: resolve_api_url(api_url, std::env::var(API_URL_ENV).ok()),
            timeout: Duration::from_secs(timeout),
            append,
        }
    }
}

/// Configuration for the dashboard
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub data_dir: PathBuf,
    pub report_path: PathBuf,
    pub year: Option<i32>,
    pub country: Option<String>,
    pub gdp_min: Option<f64>,
    pub gdp_max: Option<f64>,
    pub top_n: Option<usize>,
}

impl AppConfig {
    /// Create AppConfig from the `dashboard` arguments
    pub fn from_dashboard_command(
        data_dir: Option<String>,
        report_path: Option<String>,
        year: Option<i32>,
        country: Option<String>,
        gdp_min: Option<f64>,
        gdp_max: Option<f64>,
        top_n: Option<usize>,
    ) -> Self {
        let data_dir = resolve_data_dir(data_dir, std::env::var(DIR_ENV).ok());
        let report_path = report_path
            .map(PathBuf::from)
            .unwrap_or_else(|| data_dir.join("report.pdf"));

        AppConfig {
            data_dir,
            report_path,
            year,
            country: country.map(|c| c.trim().to_uppercase()),
            gdp_min,
            gdp_max,
            top_n,
        }
    }

    /// Log file used while the dashboard owns the terminal
    pub fn log_path(&self) -> PathBuf {
        self.data_dir.join("wealth-tui.log")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_data_dir_precedence() {
        assert_eq!(
            resolve_data_dir(Some("a".into()), Some("b".into())),
            PathBuf::from("a")
        );
        assert_eq!(resolve_data_dir(None, Some("b".into())), PathBuf::from("b"));
        let fallback = resolve_data_dir(None, None);
        assert!(fallback.ends_with("wealth-tui") || fallback == PathBuf::from("output"));
    }

    #[test]
    fn test_api_url_precedence() {
        assert_eq!(resolve_api_url(None, None), DEFAULT_API_URL);
        assert_eq!(
            resolve_api_url(Some("http://localhost:1234/".into()), Some("http://env".into())),
            "http://localhost:1234"
        );
        assert_eq!(resolve_api_url(None, Some("http://env".into())), "http://env");
    }

    #[test]
    fn test_default_refresh_config() {
        let config = RefreshConfig::from_refresh_command(
            "all".into(),
            None,
            2010,
            2020,
            Some("/tmp/x".into()),
            None,
            30,
            false,
        );
        assert_eq!(config.countries, CountrySelection::All);
        assert_eq!(config.indicators.len(), 4);
        assert_eq!(config.indicators[0], "NY.GDP.PCAP.CD");
        assert_eq!(config.timeout, Duration::from_secs(30));
        assert_eq!(config.data_dir, PathBuf::from("/tmp/x"));
        assert!(!config.append);
    }

    #[test]
    fn test_custom_indicators() {
        let config = RefreshConfig::from_refresh_command(
            "USA;DEU".into(),
            Some("SP.DYN.LE00.IN, SH.DYN.MORT,".into()),
            2000,
            2005,
            Some("out".into()),
            None,
            5,
            true,
        );
        assert_eq!(config.indicators, vec!["SP.DYN.LE00.IN", "SH.DYN.MORT"]);
        assert!(config.append);
        assert_eq!(
            config.countries,
            CountrySelection::Codes(vec!["USA".into(), "DEU".into()])
        );
    }

    #[test]
    fn test_dashboard_config_defaults_report_path() {
        let config = AppConfig::from_dashboard_command(
            Some("data".into()),
            None,
            Some(2019),
            Some(" ita ".into()),
            None,
            Some(5_000.0),
            Some(10),
        );
        assert_eq!(config.report_path, PathBuf::from("data").join("report.pdf"));
        assert_eq!(config.log_path(), PathBuf::from("data").join("wealth-tui.log"));
        assert_eq!(config.country.as_deref(), Some("ITA"));
        assert_eq!(config.year, Some(2019));
        assert_eq!(config.gdp_min, None);
        assert_eq!(config.gdp_max, Some(5_000.0));
        assert_eq!(config.top_n, Some(10));
    }

    #[test]
    fn test_cli_parses_subcommands() {
        let cli = Cli::try_parse_from(["wealth-tui", "refresh", "--start-year", "2015"]).unwrap();
        match cli.command {
            Commands::Refresh { start_year, end_year, countries, .. } => {
                assert_eq!(start_year, 2015);
                assert_eq!(end_year, 2020);
                assert_eq!(countries, "all");
            }
            other => panic!("unexpected command {other:?}"),
        }

        let cli = Cli::try_parse_from(["wealth-tui", "dashboard", "--year", "2018"]).unwrap();
        assert!(matches!(cli.command, Commands::Dashboard { year: Some(2018), .. }));

        let cli = Cli::try_parse_from([
            "wealth-tui",
            "dashboard",
            "--min-gdp",
            "1145",
            "--top-n",
            "20",
        ])
        .unwrap();
        match cli.command {
            Commands::Dashboard { min_gdp, max_gdp, top_n, .. } => {
                assert_eq!(min_gdp, Some(1145.0));
                assert_eq!(max_gdp, None);
                assert_eq!(top_n, Some(20));
            }
            other => panic!("unexpected command {other:?}"),
        }

        let cli = Cli::try_parse_from(["wealth-tui", "refresh", "--append"]).unwrap();
        assert!(matches!(cli.command, Commands::Refresh { append: true, .. }));
    }
}

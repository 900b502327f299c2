//! Domain error type shared by the data, analysis and report layers.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Data provider error: {0}")]
    Provider(String),

    #[error("No data returned for indicator {indicator} in {start}-{end}")]
    EmptyResult {
        indicator: String,
        start: i32,
        end: i32,
    },

    #[error("Unsupported indicator code: {0} (expected one of NY.GDP.PCAP.CD, SP.DYN.LE00.IN, SH.XPD.CHEX.PC.CD, SH.DYN.MORT)")]
    UnsupportedIndicator(String),

    #[error("Insufficient data: need at least {required} points, got {actual}")]
    InsufficientData { required: usize, actual: usize },

    #[error("Missing values: {0}")]
    MissingValues(String),

    #[error("Undefined result: {0}")]
    Undefined(String),

    #[error("Numerical error: {0}")]
    Numerical(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Render error: {0}")]
    Render(String),

    #[error("Dataset schema error: {0}")]
    Schema(String),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

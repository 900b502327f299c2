//! Data layer: indicator catalogue, World Bank fetcher, merger and CSV storage.
//!
//! Flow: fetch one `IndicatorSeries` per indicator, merge them on
//! (country, year), then persist the `Dataset` for the dashboard to read.

mod continent;
pub mod fetcher;
pub mod merge;
mod models;
mod storage;

pub use continent::Continent;
pub use fetcher::{CountrySelection, WorldBankClient};
pub use models::{Country, Dataset, Indicator, MergedRecord};
pub use storage::Storage;

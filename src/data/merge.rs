//! Merge per-indicator series into one wide (country, year) table.

use std::collections::BTreeMap;

use tracing::debug;

use super::models::{Dataset, IndicatorSeries, MergedRecord};
use crate::error::Result;

/// Accumulates series keyed by (country_code, year).
///
/// Keys are kept in a `BTreeMap`, so the finished dataset does not depend on
/// the order series were pushed in.
#[derive(Debug, Default)]
pub struct Merger {
    rows: BTreeMap<(String, i32), MergedRecord>,
}

impl Merger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from an existing dataset so further indicators extend it
    pub fn with_dataset(dataset: Dataset) -> Self {
        let rows = dataset
            .into_records()
            .into_iter()
            .map(|r| ((r.country_code.clone(), r.year), r))
            .collect();
        Merger { rows }
    }

    /// Left-join one indicator column onto the key set
    pub fn push(&mut self, series: &IndicatorSeries) -> &mut Self {
        let indicator = series.indicator;
        for obs in &series.observations {
            let row = self
                .rows
                .entry((obs.country_code.clone(), obs.year))
                .or_insert_with(|| {
                    MergedRecord::new(obs.country_code.clone(), obs.country.clone(), obs.year)
                });

            // Deterministic name choice regardless of push order
            if !obs.country.is_empty() && (row.country.is_empty() || obs.country < row.country) {
                row.country = obs.country.clone();
            }

            if obs.value.is_some() {
                row.set_value(indicator, obs.value);
            }
        }
        self
    }

    /// Drop rows with no indicator values and build the dataset
    pub fn finish(self) -> Result<Dataset> {
        let total = self.rows.len();
        let records: Vec<MergedRecord> = self
            .rows
            .into_values()
            .filter(|r| !r.is_empty())
            .collect();
        debug!(kept = records.len(), dropped = total - records.len(), "Merged dataset");
        Dataset::from_records(records)
    }
}

/// Merge a set of series in one pass
pub fn merge(series: &[IndicatorSeries]) -> Result<Dataset> {
    let mut merger = Merger::new();
    for s in series {
        merger.push(s);
    }
    merger.finish()
}

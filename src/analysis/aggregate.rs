//! Group-by helpers over the merged dataset.

use std::collections::BTreeMap;
use std::fmt;

use crate::data::{Continent, Dataset, Indicator, MergedRecord};
use crate::error::{Error, Result};

/// Population a yearly series is computed over
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Scope {
    Global,
    Continent(Continent),
    Country { code: String, name: String },
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scope::Global => f.write_str("Global"),
            Scope::Continent(c) => write!(f, "{c}"),
            Scope::Country { name, .. } => f.write_str(name),
        }
    }
}

/// Mean of the non-null values per year, ordered by year.
///
/// Years where every value is null are skipped rather than reported as zero.
pub fn yearly_series(dataset: &Dataset, indicator: Indicator, scope: &Scope) -> Vec<(i32, f64)> {
    if let Scope::Country { code, .. } = scope {
        return dataset.country_series(code, indicator);
    }

    let continent = match scope {
        Scope::Continent(c) => Some(*c),
        _ => None,
    };

    let mut sums: BTreeMap<i32, (f64, usize)> = BTreeMap::new();
    for record in dataset.filtered(None, continent) {
        // Aggregates such as "World" would double count in a global mean
        if record.region.is_none() {
            continue;
        }
        if let Some(v) = record.value(indicator) {
            let entry = sums.entry(record.year).or_insert((0.0, 0));
            entry.0 += v;
            entry.1 += 1;
        }
    }

    sums.into_iter()
        .map(|(year, (sum, n))| (year, sum / n as f64))
        .collect()
}

/// Mean of an indicator per continent over the given rows
pub fn continent_means<'a, I>(rows: I, indicator: Indicator) -> Vec<(Continent, f64)>
where
    I: IntoIterator<Item = &'a MergedRecord>,
{
    let mut sums: BTreeMap<Continent, (f64, usize)> = BTreeMap::new();
    for record in rows {
        if let (Some(region), Some(v)) = (record.region, record.value(indicator)) {
            let entry = sums.entry(region).or_insert((0.0, 0));
            entry.0 += v;
            entry.1 += 1;
        }
    }
    sums.into_iter()
        .map(|(c, (sum, n))| (c, sum / n as f64))
        .collect()
}

/// Mean of every indicator over the rows matching the filters
pub fn indicator_means(
    dataset: &Dataset,
    year: Option<i32>,
    continent: Option<Continent>,
) -> Vec<(Indicator, Option<f64>)> {
    Indicator::ALL
        .into_iter()
        .map(|indicator| {
            let values: Vec<f64> = dataset
                .filtered(year, continent)
                .filter(|r| r.region.is_some())
                .filter_map(|r| r.value(indicator))
                .collect();
            let mean = if values.is_empty() {
                None
            } else {
                Some(values.iter().sum::<f64>() / values.len() as f64)
            };
            (indicator, mean)
        })
        .collect()
}

/// Most recent non-null value for a country
pub fn latest_value(dataset: &Dataset, country_code: &str, indicator: Indicator) -> Option<(i32, f64)> {
    dataset.country_series(country_code, indicator).last().copied()
}

/// Weight of each indicator in the national progress score. Child mortality
/// counts inversely.
pub const PROGRESS_WEIGHTS: [(Indicator, f64); 4] = [
    (Indicator::GdpPerCapita, 0.4),
    (Indicator::LifeExpectancy, 0.3),
    (Indicator::HealthExpPerCapita, 0.2),
    (Indicator::ChildMortality, 0.1),
];

/// A country's 0-100 standing against every country in one year
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProgressScore {
    pub year: i32,
    pub score: f64,
}

/// Weighted progress score of a country.
///
/// Each indicator is min-max scaled to 0-100 across the countries reporting
/// it in `year` (the country's latest complete year when `None`). An
/// indicator with no spread scales to 50.
pub fn progress_score(dataset: &Dataset, country_code: &str, year: Option<i32>) -> Result<ProgressScore> {
    let complete = |r: &&MergedRecord| Indicator::ALL.iter().all(|&i| r.value(i).is_some());
    let own = dataset
        .records()
        .iter()
        .filter(|r| r.country_code == country_code && year.map_or(true, |y| r.year == y))
        .filter(complete)
        .last()
        .ok_or_else(|| {
            Error::MissingValues(match year {
                Some(y) => format!("{country_code} is missing indicators for {y}"),
                None => format!("{country_code} has no year with all four indicators"),
            })
        })?;

    let peers: Vec<&MergedRecord> = dataset
        .filtered(Some(own.year), None)
        .filter(|r| r.region.is_some() || r.country_code == country_code)
        .collect();

    let mut score = 0.0;
    for (indicator, weight) in PROGRESS_WEIGHTS {
        let (lo, hi) = peers
            .iter()
            .filter_map(|r| r.value(indicator))
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| (lo.min(v), hi.max(v)));
        let value = own.value(indicator).unwrap_or(lo);
        let scaled = if hi > lo { (value - lo) / (hi - lo) * 100.0 } else { 50.0 };
        let scaled = if indicator == Indicator::ChildMortality { 100.0 - scaled } else { scaled };
        score += weight * scaled;
    }

    Ok(ProgressScore { year: own.year, score })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(code: &str, year: i32, gdp: Option<f64>) -> MergedRecord {
        let mut r = MergedRecord::new(code.into(), code.into(), year);
        r.set_value(Indicator::GdpPerCapita, gdp);
        r.set_value(Indicator::LifeExpectancy, Some(70.0));
        r
    }

    fn dataset() -> Dataset {
        Dataset::from_records(vec![
            row("ITA", 2019, Some(30.0)),
            row("ITA", 2020, Some(40.0)),
            row("DEU", 2020, Some(60.0)),
            row("USA", 2020, Some(80.0)),
            row("USA", 2021, None),
            row("WLD", 2020, Some(1000.0)),
        ])
        .unwrap()
    }

    #[test]
    fn test_global_series_skips_aggregates_and_null_years() {
        let series = yearly_series(&dataset(), Indicator::GdpPerCapita, &Scope::Global);
        assert_eq!(series, vec![(2019, 30.0), (2020, 60.0)]);
    }

    #[test]
    fn test_continent_series() {
        let scope = Scope::Continent(Continent::Europe);
        let series = yearly_series(&dataset(), Indicator::GdpPerCapita, &scope);
        assert_eq!(series, vec![(2019, 30.0), (2020, 50.0)]);
    }

    #[test]
    fn test_country_series() {
        let scope = Scope::Country {
            code: "ITA".into(),
            name: "Italy".into(),
        };
        let series = yearly_series(&dataset(), Indicator::GdpPerCapita, &scope);
        assert_eq!(series, vec![(2019, 30.0), (2020, 40.0)]);
        assert_eq!(scope.to_string(), "Italy");
    }

    #[test]
    fn test_continent_means() {
        let ds = dataset();
        let means = continent_means(ds.filtered(Some(2020), None), Indicator::GdpPerCapita);
        assert_eq!(
            means,
            vec![(Continent::Europe, 50.0), (Continent::NorthAmerica, 80.0)]
        );
    }

    #[test]
    fn test_indicator_means_and_latest() {
        let means = indicator_means(&dataset(), Some(2021), None);
        assert_eq!(means[0], (Indicator::GdpPerCapita, None));
        assert_eq!(means[1], (Indicator::LifeExpectancy, Some(70.0)));
        assert_eq!(latest_value(&dataset(), "USA", Indicator::GdpPerCapita), Some((2020, 80.0)));
    }

    fn full_row(code: &str, year: i32, values: [f64; 4]) -> MergedRecord {
        let mut r = MergedRecord::new(code.into(), code.into(), year);
        for (indicator, v) in Indicator::ALL.into_iter().zip(values) {
            r.set_value(indicator, Some(v));
        }
        r
    }

    fn scored_dataset() -> Dataset {
        Dataset::from_records(vec![
            // GDP, life, health, mortality
            full_row("NOR", 2020, [80_000.0, 83.0, 8_000.0, 2.0]),
            full_row("NGA", 2020, [2_000.0, 55.0, 80.0, 110.0]),
            full_row("BRA", 2020, [41_000.0, 69.0, 4_040.0, 56.0]),
            full_row("BRA", 2019, [9_000.0, 75.0, 800.0, 14.0]),
            full_row("WLD", 2020, [1_000_000.0, 10.0, 0.0, 500.0]),
        ])
        .unwrap()
    }

    #[test]
    fn test_progress_score_extremes() {
        let ds = scored_dataset();
        let best = progress_score(&ds, "NOR", None).unwrap();
        assert_eq!(best.year, 2020);
        assert!((best.score - 100.0).abs() < 1e-9);
        let worst = progress_score(&ds, "NGA", Some(2020)).unwrap();
        assert!(worst.score.abs() < 1e-9);
    }

    #[test]
    fn test_progress_score_midpoint_ignores_aggregates() {
        // Brazil sits halfway on every indicator; World would skew the scale
        let score = progress_score(&scored_dataset(), "BRA", None).unwrap();
        assert_eq!(score.year, 2020);
        assert!((score.score - 50.0).abs() < 1e-9);
    }

    #[test]
    fn test_progress_score_single_country_has_no_spread() {
        let score = progress_score(&scored_dataset(), "BRA", Some(2019)).unwrap();
        assert!((score.score - 50.0).abs() < 1e-9);
    }

    #[test]
    fn test_progress_score_needs_all_indicators() {
        // dataset() has no health expenditure or mortality values
        let err = progress_score(&dataset(), "ITA", None).unwrap_err();
        assert!(matches!(err, Error::MissingValues(msg) if msg.contains("ITA")));
        assert!(matches!(
            progress_score(&scored_dataset(), "NOR", Some(2015)),
            Err(Error::MissingValues(_))
        ));
    }
}

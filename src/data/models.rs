//! Data models for indicators, fetched series and the merged dataset.

use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::continent::Continent;
use crate::error::{Error, Result};

/// The fixed set of development indicators the dashboard tracks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Indicator {
    GdpPerCapita,
    LifeExpectancy,
    HealthExpPerCapita,
    ChildMortality,
}

impl Indicator {
    pub const ALL: [Indicator; 4] = [
        Indicator::GdpPerCapita,
        Indicator::LifeExpectancy,
        Indicator::HealthExpPerCapita,
        Indicator::ChildMortality,
    ];

    /// World Bank indicator code
    pub fn code(self) -> &'static str {
        match self {
            Indicator::GdpPerCapita => "NY.GDP.PCAP.CD",
            Indicator::LifeExpectancy => "SP.DYN.LE00.IN",
            Indicator::HealthExpPerCapita => "SH.XPD.CHEX.PC.CD",
            Indicator::ChildMortality => "SH.DYN.MORT",
        }
    }

    /// Column header in the dataset file
    pub fn column(self) -> &'static str {
        match self {
            Indicator::GdpPerCapita => "GDP_per_capita",
            Indicator::LifeExpectancy => "Life_Expectancy",
            Indicator::HealthExpPerCapita => "Health_Exp_per_Capita",
            Indicator::ChildMortality => "Child_Mortality",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Indicator::GdpPerCapita => "GDP per Capita",
            Indicator::LifeExpectancy => "Life Expectancy",
            Indicator::HealthExpPerCapita => "Health Expenditure per Capita",
            Indicator::ChildMortality => "Child Mortality",
        }
    }

    pub fn unit(self) -> &'static str {
        match self {
            Indicator::GdpPerCapita | Indicator::HealthExpPerCapita => "current US$",
            Indicator::LifeExpectancy => "years",
            Indicator::ChildMortality => "per 1,000 live births",
        }
    }

    /// Parse a provider code (or a dataset column name) into an indicator.
    ///
    /// Anything outside the supported set is rejected before a request is made.
    pub fn from_code(code: &str) -> Result<Self> {
        let code = code.trim();
        Indicator::ALL
            .into_iter()
            .find(|i| i.code().eq_ignore_ascii_case(code) || i.column().eq_ignore_ascii_case(code))
            .ok_or_else(|| Error::UnsupportedIndicator(code.to_string()))
    }

    /// Format a value with the indicator's natural precision
    pub fn format_value(self, value: f64) -> String {
        match self {
            Indicator::GdpPerCapita | Indicator::HealthExpPerCapita => {
                format!("${}", group_thousands(value))
            }
            Indicator::LifeExpectancy => format!("{value:.1} yrs"),
            Indicator::ChildMortality => format!("{value:.1} / 1k"),
        }
    }
}

impl fmt::Display for Indicator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Indicator {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Indicator::from_code(s)
    }
}

/// Round to whole units and insert thousands separators
fn group_thousands(value: f64) -> String {
    let rounded = value.round();
    let digits = format!("{:.0}", rounded.abs());
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    if rounded < 0.0 {
        format!("-{out}")
    } else {
        out
    }
}

/// A single (country, year) observation as returned by the provider
#[derive(Debug, Clone, PartialEq)]
pub struct Observation {
    pub country_code: String,
    pub country: String,
    pub year: i32,
    /// The provider reports gaps as explicit nulls
    pub value: Option<f64>,
}

/// All observations fetched for one indicator
#[derive(Debug, Clone, PartialEq)]
pub struct IndicatorSeries {
    pub indicator: Indicator,
    pub observations: Vec<Observation>,
}

impl IndicatorSeries {
    pub fn new(indicator: Indicator, observations: Vec<Observation>) -> Self {
        IndicatorSeries {
            indicator,
            observations,
        }
    }

    /// Number of observations carrying a value
    pub fn value_count(&self) -> usize {
        self.observations.iter().filter(|o| o.value.is_some()).count()
    }
}

/// One row of the merged dataset, keyed by (country_code, year)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MergedRecord {
    #[serde(rename = "Country")]
    pub country: String,
    #[serde(rename = "Country_Code")]
    pub country_code: String,
    #[serde(rename = "Year")]
    pub year: i32,
    #[serde(rename = "GDP_per_capita")]
    pub gdp_per_capita: Option<f64>,
    #[serde(rename = "Life_Expectancy")]
    pub life_expectancy: Option<f64>,
    #[serde(rename = "Health_Exp_per_Capita")]
    pub health_exp_per_capita: Option<f64>,
    #[serde(rename = "Child_Mortality")]
    pub child_mortality: Option<f64>,
    #[serde(rename = "Region")]
    pub region: Option<Continent>,
}

impl MergedRecord {
    /// Create an empty row for a key; all indicator columns start as null
    pub fn new(country_code: String, country: String, year: i32) -> Self {
        let region = Continent::from_iso3(&country_code);
        MergedRecord {
            country,
            country_code,
            year,
            gdp_per_capita: None,
            life_expectancy: None,
            health_exp_per_capita: None,
            child_mortality: None,
            region,
        }
    }

    pub fn key(&self) -> (&str, i32) {
        (self.country_code.as_str(), self.year)
    }

    /// Typed column access
    pub fn value(&self, indicator: Indicator) -> Option<f64> {
        match indicator {
            Indicator::GdpPerCapita => self.gdp_per_capita,
            Indicator::LifeExpectancy => self.life_expectancy,
            Indicator::HealthExpPerCapita => self.health_exp_per_capita,
            Indicator::ChildMortality => self.child_mortality,
        }
    }

    pub fn set_value(&mut self, indicator: Indicator, value: Option<f64>) {
        let slot = match indicator {
            Indicator::GdpPerCapita => &mut self.gdp_per_capita,
            Indicator::LifeExpectancy => &mut self.life_expectancy,
            Indicator::HealthExpPerCapita => &mut self.health_exp_per_capita,
            Indicator::ChildMortality => &mut self.child_mortality,
        };
        *slot = value;
    }

    pub fn is_empty(&self) -> bool {
        Indicator::ALL.iter().all(|&i| self.value(i).is_none())
    }
}

/// The merged table, sorted by (country_code, year) with unique keys
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dataset {
    records: Vec<MergedRecord>,
}

impl Dataset {
    /// Build a dataset, rejecting duplicate (country, year) keys
    pub fn from_records(mut records: Vec<MergedRecord>) -> Result<Self> {
        records.sort_by(|a, b| a.key().cmp(&b.key()));
        if let Some(pair) = records.windows(2).find(|w| w[0].key() == w[1].key()) {
            return Err(Error::Schema(format!(
                "duplicate row for {} in {}",
                pair[0].country_code, pair[0].year
            )));
        }
        Ok(Dataset { records })
    }

    pub fn records(&self) -> &[MergedRecord] {
        &self.records
    }

    pub fn into_records(self) -> Vec<MergedRecord> {
        self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Sorted distinct years
    pub fn years(&self) -> Vec<i32> {
        let years: BTreeSet<i32> = self.records.iter().map(|r| r.year).collect();
        years.into_iter().collect()
    }

    /// Distinct countries as (code, name), sorted by name
    pub fn countries(&self) -> Vec<Country> {
        let mut by_code: BTreeMap<&str, &MergedRecord> = BTreeMap::new();
        for record in &self.records {
            by_code.entry(record.country_code.as_str()).or_insert(record);
        }
        let mut countries: Vec<Country> = by_code
            .into_values()
            .map(|r| Country {
                code: r.country_code.clone(),
                name: r.country.clone(),
                region: r.region,
            })
            .collect();
        countries.sort_by(|a, b| a.name.cmp(&b.name).then_with(|| a.code.cmp(&b.code)));
        countries
    }

    /// Continents present in the dataset, in display order
    pub fn continents(&self) -> Vec<Continent> {
        let present: HashSet<Continent> = self.records.iter().filter_map(|r| r.region).collect();
        Continent::ALL
            .into_iter()
            .filter(|c| present.contains(c))
            .collect()
    }

    /// Rows matching an optional year and continent
    pub fn filtered(
        &self,
        year: Option<i32>,
        continent: Option<Continent>,
    ) -> impl Iterator<Item = &MergedRecord> + '_ {
        self.records.iter().filter(move |r| {
            year.map_or(true, |y| r.year == y) && continent.map_or(true, |c| r.region == Some(c))
        })
    }

    /// Non-null (year, value) points for one country, ordered by year
    pub fn country_series(&self, country_code: &str, indicator: Indicator) -> Vec<(i32, f64)> {
        self.records
            .iter()
            .filter(|r| r.country_code == country_code)
            .filter_map(|r| r.value(indicator).map(|v| (r.year, v)))
            .collect()
    }
}

/// A country as listed in the dashboard sidebar
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Country {
    pub code: String,
    pub name: String,
    pub region: Option<Continent>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(code: &str, year: i32, gdp: Option<f64>) -> MergedRecord {
        let mut r = MergedRecord::new(code.to_string(), format!("Country {code}"), year);
        r.set_value(Indicator::GdpPerCapita, gdp);
        r
    }

    #[test]
    fn test_indicator_from_code() {
        assert_eq!(Indicator::from_code("NY.GDP.PCAP.CD").unwrap(), Indicator::GdpPerCapita);
        assert_eq!(Indicator::from_code("sh.dyn.mort").unwrap(), Indicator::ChildMortality);
        assert_eq!(Indicator::from_code("Life_Expectancy").unwrap(), Indicator::LifeExpectancy);
    }

    #[test]
    fn test_unsupported_indicator_fails() {
        let err = Indicator::from_code("SP.POP.TOTL").unwrap_err();
        assert!(matches!(err, Error::UnsupportedIndicator(code) if code == "SP.POP.TOTL"));
    }

    #[test]
    fn test_typed_accessors_round_trip() {
        let mut r = MergedRecord::new("ITA".into(), "Italy".into(), 2020);
        assert!(r.is_empty());
        for (n, indicator) in Indicator::ALL.into_iter().enumerate() {
            r.set_value(indicator, Some(n as f64));
        }
        for (n, indicator) in Indicator::ALL.into_iter().enumerate() {
            assert_eq!(r.value(indicator), Some(n as f64));
        }
        assert_eq!(r.region, Some(Continent::Europe));
    }

    #[test]
    fn test_dataset_rejects_duplicate_keys() {
        let rows = vec![record("ITA", 2020, Some(1.0)), record("ITA", 2020, Some(2.0))];
        assert!(matches!(Dataset::from_records(rows), Err(Error::Schema(_))));
    }

    #[test]
    fn test_dataset_sorted_and_queries() {
        let rows = vec![
            record("USA", 2011, Some(3.0)),
            record("ITA", 2011, None),
            record("ITA", 2010, Some(1.0)),
        ];
        let ds = Dataset::from_records(rows).unwrap();
        let keys: Vec<(&str, i32)> = ds.records().iter().map(|r| r.key()).collect();
        assert_eq!(keys, vec![("ITA", 2010), ("ITA", 2011), ("USA", 2011)]);
        assert_eq!(ds.years(), vec![2010, 2011]);
        assert_eq!(ds.country_series("ITA", Indicator::GdpPerCapita), vec![(2010, 1.0)]);
        assert_eq!(ds.filtered(Some(2011), Some(Continent::Europe)).count(), 1);
        assert_eq!(ds.continents(), vec![Continent::Europe, Continent::NorthAmerica]);
    }

    #[test]
    fn test_format_value() {
        assert_eq!(Indicator::GdpPerCapita.format_value(63528.6), "$63,529");
        assert_eq!(Indicator::GdpPerCapita.format_value(950.0), "$950");
        assert_eq!(Indicator::LifeExpectancy.format_value(82.345), "82.3 yrs");
    }
}

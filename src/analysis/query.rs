//! Plain-text questions about continents.
//!
//! A question names an indicator by keyword and one or two continents.
//! Two continents compare their latest averages; one gives its trend.

use super::aggregate::{yearly_series, Scope};
use crate::data::{Continent, Dataset, Indicator};
use crate::error::{Error, Result};

/// Keywords that select an indicator, checked in order
const KEYWORDS: [(&[&str], Indicator); 4] = [
    (&["life", "expectancy"], Indicator::LifeExpectancy),
    (&["gdp", "income", "wealth"], Indicator::GdpPerCapita),
    (&["health", "expenditure", "spending"], Indicator::HealthExpPerCapita),
    (&["child", "mortality"], Indicator::ChildMortality),
];

/// Which indicator a question is about
pub fn detect_indicator(question: &str) -> Option<Indicator> {
    let q = question.to_lowercase();
    KEYWORDS
        .iter()
        .find(|(words, _)| words.iter().any(|w| q.contains(w)))
        .map(|&(_, indicator)| indicator)
}

/// Continents named in a question, in the order they appear
pub fn mentioned_continents(question: &str) -> Vec<Continent> {
    let q = question.to_lowercase();
    let mut found: Vec<(usize, Continent)> = Continent::ALL
        .into_iter()
        .filter_map(|c| {
            let name = c.name().to_lowercase();
            let at = q.find(&name);
            let at = match c {
                Continent::Australia => at.or_else(|| q.find("oceania")),
                _ => at,
            };
            at.map(|pos| (pos, c))
        })
        .collect();
    found.sort_by_key(|&(pos, _)| pos);
    found.into_iter().map(|(_, c)| c).collect()
}

/// The answer to a question
#[derive(Debug, Clone, PartialEq)]
pub enum Answer {
    /// Latest continent averages side by side
    Comparison {
        indicator: Indicator,
        first: (Continent, i32, f64),
        second: (Continent, i32, f64),
    },
    /// First and last yearly average of one continent
    Trend {
        indicator: Indicator,
        continent: Continent,
        series: Vec<(i32, f64)>,
    },
}

impl Answer {
    /// Narrative reply
    pub fn summary(&self) -> String {
        match self {
            Answer::Comparison {
                indicator,
                first,
                second,
            } => {
                let (high, low) = if second.2 > first.2 { (second, first) } else { (first, second) };
                if high.2 == low.2 {
                    return format!(
                        "{} and {} have the same average {} ({}).",
                        first.0,
                        second.0,
                        indicator.label(),
                        indicator.format_value(first.2)
                    );
                }
                let by = if low.2 == 0.0 {
                    indicator.format_value(high.2 - low.2)
                } else {
                    format!("{:.2}%", (high.2 - low.2) / low.2.abs() * 100.0)
                };
                format!(
                    "{} has higher average {} than {} by {by} ({} in {} vs {} in {}).",
                    high.0,
                    indicator.label(),
                    low.0,
                    indicator.format_value(high.2),
                    high.1,
                    indicator.format_value(low.2),
                    low.1,
                )
            }
            Answer::Trend {
                indicator,
                continent,
                series,
            } => {
                let (Some(&(from_year, from)), Some(&(to_year, to))) = (series.first(), series.last())
                else {
                    return String::new();
                };
                let verb = if to > from {
                    "increased"
                } else if to < from {
                    "decreased"
                } else {
                    "remained unchanged"
                };
                format!(
                    "In {continent}, average {} has {verb} from {} ({from_year}) to {} ({to_year}).",
                    indicator.label(),
                    indicator.format_value(from),
                    indicator.format_value(to),
                )
            }
        }
    }
}

fn latest(dataset: &Dataset, indicator: Indicator, continent: Continent) -> Result<(Continent, i32, f64)> {
    yearly_series(dataset, indicator, &Scope::Continent(continent))
        .last()
        .map(|&(year, v)| (continent, year, v))
        .ok_or_else(|| Error::MissingValues(format!("no {} data for {continent}", indicator.column())))
}

/// Answer a question from the dataset
pub fn answer(dataset: &Dataset, question: &str) -> Result<Answer> {
    let indicator = detect_indicator(question).ok_or_else(|| {
        Error::InvalidArgument(
            "mention a metric like GDP, life expectancy, health expenditure or child mortality"
                .to_string(),
        )
    })?;

    match mentioned_continents(question).as_slice() {
        [] => Err(Error::InvalidArgument(
            "mention at least one continent, e.g. Europe or Africa".to_string(),
        )),
        [continent] => {
            let series = yearly_series(dataset, indicator, &Scope::Continent(*continent));
            if series.is_empty() {
                return Err(Error::MissingValues(format!(
                    "no {} data for {continent}",
                    indicator.column()
                )));
            }
            Ok(Answer::Trend {
                indicator,
                continent: *continent,
                series,
            })
        }
        [a, b, ..] => Ok(Answer::Comparison {
            indicator,
            first: latest(dataset, indicator, *a)?,
            second: latest(dataset, indicator, *b)?,
        }),
    }
}

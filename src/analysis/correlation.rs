//! Pearson correlation between indicator columns and the insight text built on it.

use crate::data::{Indicator, MergedRecord};
use crate::error::{Error, Result};

/// Minimum number of paired observations for a coefficient
pub const MIN_PAIRS: usize = 3;

/// How rows with a missing value in either column are treated
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CompletionPolicy {
    /// Drop rows missing either value (pairwise complete observations)
    #[default]
    Pairwise,
    /// Fail if any row is missing either value
    Complete,
}

impl CompletionPolicy {
    pub fn toggle(self) -> Self {
        match self {
            CompletionPolicy::Pairwise => CompletionPolicy::Complete,
            CompletionPolicy::Complete => CompletionPolicy::Pairwise,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            CompletionPolicy::Pairwise => "Pairwise",
            CompletionPolicy::Complete => "Complete rows",
        }
    }
}

/// A computed coefficient with the columns and sample size it came from
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Correlation {
    pub x: Indicator,
    pub y: Indicator,
    pub coefficient: f64,
    pub pairs: usize,
}

/// Strength bucket of |r|
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strength {
    Strong,
    Moderate,
    Weak,
}

impl Strength {
    pub fn of(r: f64) -> Self {
        let r = r.abs();
        if r >= 0.7 {
            Strength::Strong
        } else if r >= 0.4 {
            Strength::Moderate
        } else {
            Strength::Weak
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Strength::Strong => "strong",
            Strength::Moderate => "moderate",
            Strength::Weak => "weak",
        }
    }

    fn phrase(self) -> &'static str {
        match self {
            Strength::Strong => "a strong relationship",
            Strength::Moderate => "a moderate connection",
            Strength::Weak => "a weak correlation",
        }
    }
}

/// Collect (x, y) pairs from rows according to the completion policy
pub fn paired_values<'a, I>(
    rows: I,
    x: Indicator,
    y: Indicator,
    policy: CompletionPolicy,
) -> Result<Vec<(f64, f64)>>
where
    I: IntoIterator<Item = &'a MergedRecord>,
{
    let mut pairs = Vec::new();
    for row in rows {
        match (row.value(x), row.value(y), policy) {
            (Some(a), Some(b), _) => pairs.push((a, b)),
            (_, _, CompletionPolicy::Pairwise) => {}
            (_, _, CompletionPolicy::Complete) => {
                let column = if row.value(x).is_none() { x } else { y };
                return Err(Error::MissingValues(format!(
                    "{} has no {} value for {}",
                    row.country,
                    column.column(),
                    row.year
                )));
            }
        }
    }
    Ok(pairs)
}

/// Pearson correlation coefficient of paired samples
pub fn pearson(pairs: &[(f64, f64)]) -> Result<f64> {
    if pairs.len() < MIN_PAIRS {
        return Err(Error::InsufficientData {
            required: MIN_PAIRS,
            actual: pairs.len(),
        });
    }

    let n = pairs.len() as f64;
    let mean_x = pairs.iter().map(|p| p.0).sum::<f64>() / n;
    let mean_y = pairs.iter().map(|p| p.1).sum::<f64>() / n;

    let (mut sxx, mut syy, mut sxy) = (0.0, 0.0, 0.0);
    for &(a, b) in pairs {
        let dx = a - mean_x;
        let dy = b - mean_y;
        sxx += dx * dx;
        syy += dy * dy;
        sxy += dx * dy;
    }

    if sxx == 0.0 || syy == 0.0 {
        return Err(Error::Undefined(
            "correlation of a constant series".to_string(),
        ));
    }

    Ok((sxy / (sxx.sqrt() * syy.sqrt())).clamp(-1.0, 1.0))
}

/// Correlate two indicator columns over the given rows
pub fn correlate<'a, I>(
    rows: I,
    x: Indicator,
    y: Indicator,
    policy: CompletionPolicy,
) -> Result<Correlation>
where
    I: IntoIterator<Item = &'a MergedRecord>,
{
    let pairs = paired_values(rows, x, y, policy)?;
    let coefficient = pearson(&pairs)?;
    Ok(Correlation {
        x,
        y,
        coefficient,
        pairs: pairs.len(),
    })
}

/// Coefficients for every indicator pair, in `Indicator::ALL` order.
///
/// Entries that cannot be computed are `None`.
pub fn correlation_matrix(rows: &[&MergedRecord], policy: CompletionPolicy) -> Vec<Vec<Option<f64>>> {
    Indicator::ALL
        .iter()
        .map(|&x| {
            Indicator::ALL
                .iter()
                .map(|&y| {
                    correlate(rows.iter().copied(), x, y, policy)
                        .ok()
                        .map(|c| c.coefficient)
                })
                .collect()
        })
        .collect()
}

/// One-paragraph reading of a coefficient
pub fn insight(correlation: &Correlation, scope: &str, year: Option<i32>) -> String {
    let r = correlation.coefficient;
    let x_name = correlation.x.label();
    let y_name = correlation.y.label();
    let involves = |i: Indicator| correlation.x == i || correlation.y == i;

    let direction = if r > 0.0 {
        format!("As {x_name} increases, {y_name} tends to rise.")
    } else if r < 0.0 {
        format!("As {x_name} increases, {y_name} tends to decrease.")
    } else {
        format!("{y_name} shows no linear relationship with {x_name}.")
    };

    let context = if involves(Indicator::ChildMortality) && r < 0.0 {
        "This typically reflects how rising income and better healthcare reduce child mortality rates."
    } else if involves(Indicator::LifeExpectancy) && r > 0.0 {
        "This indicates that wealthier nations tend to enjoy longer, healthier lives."
    } else if involves(Indicator::HealthExpPerCapita) {
        "It highlights the close link between healthcare investment and economic strength."
    } else {
        "This reflects broader social and economic patterns."
    };

    let when = year.map(|y| format!(" during {y}")).unwrap_or_default();

    format!(
        "In {scope}{when}, there is {} between {x_name} and {y_name} (correlation = {r:.2}, n = {}). {direction} {context}",
        Strength::of(r).phrase(),
        correlation.pairs,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(code: &str, gdp: Option<f64>, life: Option<f64>, mort: Option<f64>) -> MergedRecord {
        let mut r = MergedRecord::new(code.into(), code.into(), 2020);
        r.set_value(Indicator::GdpPerCapita, gdp);
        r.set_value(Indicator::LifeExpectancy, life);
        r.set_value(Indicator::ChildMortality, mort);
        r
    }

    fn rows() -> Vec<MergedRecord> {
        vec![
            row("A", Some(1_000.0), Some(60.0), Some(80.0)),
            row("B", Some(5_000.0), Some(68.0), Some(40.0)),
            row("C", Some(20_000.0), Some(75.0), Some(10.0)),
            row("D", Some(45_000.0), Some(81.0), Some(4.0)),
            row("E", None, Some(70.0), None),
        ]
    }

    #[test]
    fn test_perfect_linear_relationship() {
        let pairs = vec![(1.0, 2.0), (2.0, 4.0), (3.0, 6.0), (4.0, 8.0)];
        assert!((pearson(&pairs).unwrap() - 1.0).abs() < 1e-12);
        let inverse: Vec<(f64, f64)> = pairs.iter().map(|&(a, b)| (a, -b)).collect();
        assert!((pearson(&inverse).unwrap() + 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_symmetric() {
        let data = rows();
        let xy = correlate(&data, Indicator::GdpPerCapita, Indicator::ChildMortality, CompletionPolicy::Pairwise).unwrap();
        let yx = correlate(&data, Indicator::ChildMortality, Indicator::GdpPerCapita, CompletionPolicy::Pairwise).unwrap();
        assert_eq!(xy.coefficient, yx.coefficient);
        assert_eq!(xy.pairs, 4);
    }

    #[test]
    fn test_pairwise_drops_incomplete_rows() {
        let data = rows();
        let pairs = paired_values(&data, Indicator::GdpPerCapita, Indicator::LifeExpectancy, CompletionPolicy::Pairwise).unwrap();
        assert_eq!(pairs.len(), 4);
    }

    #[test]
    fn test_complete_policy_fails_on_missing() {
        let data = rows();
        let err = correlate(&data, Indicator::GdpPerCapita, Indicator::LifeExpectancy, CompletionPolicy::Complete).unwrap_err();
        assert!(matches!(err, Error::MissingValues(msg) if msg.contains("GDP_per_capita")));
    }

    #[test]
    fn test_insufficient_pairs() {
        for n in 0..MIN_PAIRS {
            let pairs: Vec<(f64, f64)> = (0..n).map(|i| (i as f64, i as f64 * 2.0)).collect();
            let err = pearson(&pairs).unwrap_err();
            assert!(matches!(err, Error::InsufficientData { required: 3, actual } if actual == n));
        }
        assert!(pearson(&[(1.0, 1.0), (2.0, 3.0), (3.0, 2.0)]).is_ok());
    }

    #[test]
    fn test_constant_series_is_undefined() {
        let pairs = vec![(1.0, 5.0), (2.0, 5.0), (3.0, 5.0)];
        assert!(matches!(pearson(&pairs), Err(Error::Undefined(_))));
    }

    #[test]
    fn test_strength_buckets() {
        assert_eq!(Strength::of(0.85), Strength::Strong);
        assert_eq!(Strength::of(-0.7), Strength::Strong);
        assert_eq!(Strength::of(0.5), Strength::Moderate);
        assert_eq!(Strength::of(-0.1), Strength::Weak);
    }

    #[test]
    fn test_insight_text() {
        let data = rows();
        let c = correlate(&data, Indicator::GdpPerCapita, Indicator::ChildMortality, CompletionPolicy::Pairwise).unwrap();
        let text = insight(&c, "Europe", Some(2020));
        assert!(text.starts_with("In Europe during 2020, there is a"));
        assert!(text.contains("tends to decrease"));
        assert!(text.contains("reduce child mortality"));
    }

    #[test]
    fn test_insight_zero_coefficient_has_no_direction() {
        let c = Correlation {
            x: Indicator::GdpPerCapita,
            y: Indicator::LifeExpectancy,
            coefficient: 0.0,
            pairs: 12,
        };
        let text = insight(&c, "Asia", None);
        assert!(text.contains("Life Expectancy shows no linear relationship with GDP per Capita."));
        assert!(!text.contains("tends to"));
        assert!(text.contains("a weak correlation"));
    }

    #[test]
    fn test_matrix_diagonal_and_symmetry() {
        let data = rows();
        let refs: Vec<&MergedRecord> = data.iter().collect();
        let m = correlation_matrix(&refs, CompletionPolicy::Pairwise);
        assert_eq!(m.len(), 4);
        // Health expenditure is entirely missing
        assert_eq!(m[2][0], None);
        assert!((m[0][0].unwrap() - 1.0).abs() < 1e-12);
        assert_eq!(m[0][1], m[1][0]);
    }
}

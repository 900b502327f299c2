//! Least-squares trend models and forecasts over yearly indicator series.
//!
//! Years are centered on their mean before fitting so the degree-2 normal
//! equations stay well conditioned for values around 2000.

use std::fmt;

use super::aggregate::Scope;
use crate::data::Indicator;
use crate::error::{Error, Result};

/// Regression model used for a forecast
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ModelKind {
    Linear,
    /// Degree-2 polynomial
    #[default]
    Polynomial,
}

impl ModelKind {
    /// Fewest historical points the model can be fitted to
    pub fn min_points(self) -> usize {
        match self {
            ModelKind::Linear => 2,
            ModelKind::Polynomial => 3,
        }
    }

    fn degree(self) -> usize {
        match self {
            ModelKind::Linear => 1,
            ModelKind::Polynomial => 2,
        }
    }

    pub fn toggle(self) -> Self {
        match self {
            ModelKind::Linear => ModelKind::Polynomial,
            ModelKind::Polynomial => ModelKind::Linear,
        }
    }
}

impl fmt::Display for ModelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModelKind::Linear => f.write_str("Linear"),
            ModelKind::Polynomial => f.write_str("Polynomial (Degree 2)"),
        }
    }
}

/// Direction from the last observed value to the last forecast value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trend {
    Up,
    Down,
    Flat,
}

impl fmt::Display for Trend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Trend::Up => f.write_str("up"),
            Trend::Down => f.write_str("down"),
            Trend::Flat => f.write_str("flat"),
        }
    }
}

/// A polynomial fitted by ordinary least squares
#[derive(Debug, Clone, PartialEq)]
pub struct FittedModel {
    center: f64,
    /// c0 + c1 * t + c2 * t^2, with t = year - center
    coefficients: Vec<f64>,
    r_squared: f64,
}

impl FittedModel {
    /// Fit `kind` to (year, value) points
    pub fn fit(kind: ModelKind, points: &[(i32, f64)]) -> Result<Self> {
        let required = kind.min_points();
        if points.len() < required {
            return Err(Error::InsufficientData {
                required,
                actual: points.len(),
            });
        }

        let n = points.len() as f64;
        let center = points.iter().map(|&(year, _)| f64::from(year)).sum::<f64>() / n;
        let size = kind.degree() + 1;

        // Normal equations: (X'X) c = X'y
        let mut matrix = vec![vec![0.0; size]; size];
        let mut rhs = vec![0.0; size];
        for &(year, value) in points {
            let t = f64::from(year) - center;
            let powers: Vec<f64> = (0..2 * size - 1).map(|p| t.powi(p as i32)).collect();
            for i in 0..size {
                for j in 0..size {
                    matrix[i][j] += powers[i + j];
                }
                rhs[i] += value * powers[i];
            }
        }

        let coefficients = solve(matrix, rhs)?;

        let mut model = FittedModel {
            center,
            coefficients,
            r_squared: 0.0,
        };

        let mean = points.iter().map(|p| p.1).sum::<f64>() / n;
        let ss_tot: f64 = points.iter().map(|p| (p.1 - mean).powi(2)).sum();
        let ss_res: f64 = points
            .iter()
            .map(|&(year, value)| (value - model.predict(year)).powi(2))
            .sum();
        model.r_squared = if ss_tot > 0.0 { 1.0 - ss_res / ss_tot } else { 1.0 };

        Ok(model)
    }

    pub fn r_squared(&self) -> f64 {
        self.r_squared
    }

    /// Evaluate the fitted curve at a year
    pub fn predict(&self, year: i32) -> f64 {
        let t = f64::from(year) - self.center;
        self.coefficients
            .iter()
            .rev()
            .fold(0.0, |acc, &c| acc * t + c)
    }
}

/// Gaussian elimination with partial pivoting
fn solve(mut a: Vec<Vec<f64>>, mut b: Vec<f64>) -> Result<Vec<f64>> {
    let n = b.len();
    let scale = a
        .iter()
        .flatten()
        .fold(0.0_f64, |m, v| m.max(v.abs()))
        .max(1.0);

    for col in 0..n {
        let pivot = (col..n)
            .max_by(|&i, &j| a[i][col].abs().total_cmp(&a[j][col].abs()))
            .unwrap_or(col);
        if a[pivot][col].abs() <= 1e-12 * scale {
            return Err(Error::Numerical(
                "singular system; are there repeated years?".to_string(),
            ));
        }
        a.swap(col, pivot);
        b.swap(col, pivot);

        for row in col + 1..n {
            let factor = a[row][col] / a[col][col];
            for k in col..n {
                a[row][k] -= factor * a[col][k];
            }
            b[row] -= factor * b[col];
        }
    }

    let mut x = vec![0.0; n];
    for row in (0..n).rev() {
        let tail: f64 = (row + 1..n).map(|k| a[row][k] * x[k]).sum();
        x[row] = (b[row] - tail) / a[row][row];
    }
    Ok(x)
}

/// Historical series plus its projection to a horizon year
#[derive(Debug, Clone, PartialEq)]
pub struct ForecastResult {
    pub indicator: Indicator,
    pub scope: String,
    pub historical_years: Vec<i32>,
    pub historical_values: Vec<f64>,
    /// From the last historical year through the target year
    pub forecast_years: Vec<i32>,
    pub forecast_values: Vec<f64>,
    pub model: ModelKind,
    pub trend: Trend,
    /// `None` when the last historical value is zero
    pub percent_change: Option<f64>,
    pub r_squared: f64,
}

/// Fit `model` to `points` and extrapolate through `target_year`
pub fn forecast(
    indicator: Indicator,
    scope: &Scope,
    points: &[(i32, f64)],
    target_year: i32,
    model: ModelKind,
) -> Result<ForecastResult> {
    let mut points = points.to_vec();
    points.sort_by_key(|&(year, _)| year);

    let fitted = FittedModel::fit(model, &points)?;

    // fit() guarantees at least two points
    let &(last_year, last_value) = points
        .last()
        .ok_or(Error::InsufficientData { required: model.min_points(), actual: 0 })?;
    if target_year < last_year {
        return Err(Error::InvalidArgument(format!(
            "forecast year {target_year} is before the last observed year {last_year}"
        )));
    }

    let forecast_years: Vec<i32> = (last_year..=target_year).collect();
    let forecast_values: Vec<f64> = forecast_years.iter().map(|&y| fitted.predict(y)).collect();

    let final_value = forecast_values.last().copied().unwrap_or(last_value);
    let diff = final_value - last_value;
    let trend = if diff > 0.0 {
        Trend::Up
    } else if diff < 0.0 {
        Trend::Down
    } else {
        Trend::Flat
    };
    let percent_change = if last_value == 0.0 {
        None
    } else {
        Some(diff / last_value * 100.0)
    };

    Ok(ForecastResult {
        indicator,
        scope: scope.to_string(),
        historical_years: points.iter().map(|p| p.0).collect(),
        historical_values: points.iter().map(|p| p.1).collect(),
        forecast_years,
        forecast_values,
        model,
        trend,
        percent_change,
        r_squared: fitted.r_squared(),
    })
}

impl ForecastResult {
    pub fn last_historical(&self) -> Option<(i32, f64)> {
        self.historical_years
            .last()
            .copied()
            .zip(self.historical_values.last().copied())
    }

    pub fn final_forecast(&self) -> Option<(i32, f64)> {
        self.forecast_years
            .last()
            .copied()
            .zip(self.forecast_values.last().copied())
    }

    pub fn percent_change_label(&self) -> String {
        match self.percent_change {
            Some(p) => format!("{p:+.2}%"),
            None => "N/A".to_string(),
        }
    }

    /// One-line statement of the projection
    pub fn headline(&self) -> String {
        let (Some((from_year, from)), Some((to_year, to))) =
            (self.last_historical(), self.final_forecast())
        else {
            return String::new();
        };
        let change = match self.trend {
            Trend::Up => "an increase",
            Trend::Down => "a decrease",
            Trend::Flat => "no change",
        };
        format!(
            "{} is projected to see {change} in {} from {from_year} ({}) to {to_year} ({}) using a {} model, a {} change overall.",
            self.scope,
            self.indicator.label(),
            self.indicator.format_value(from),
            self.indicator.format_value(to),
            self.model,
            self.percent_change_label(),
        )
    }

    /// Narrative summary used in the insight panel and the report
    pub fn summary(&self) -> String {
        let (Some(first_year), Some((to_year, to))) =
            (self.historical_years.first().copied(), self.final_forecast())
        else {
            return String::new();
        };

        let direction = if self.trend == Trend::Down { "decline" } else { "growth" };
        let tone = match self.percent_change.map(f64::abs) {
            Some(p) if p < 5.0 => "a stable trend with minor fluctuations".to_string(),
            Some(p) if p < 20.0 => format!("a moderate {direction} trajectory"),
            Some(_) => format!("a strong {direction} pattern"),
            None => format!("a {direction} trajectory"),
        };
        let model_comment = match self.model {
            ModelKind::Polynomial => "a nonlinear pattern suggesting accelerating or slowing change",
            ModelKind::Linear => "a steady, linear trend over time",
        };

        format!(
            "Between {first_year} and {to_year}, {} exhibits {tone} in {}. The model detects {model_comment} (R² = {:.2}), with projected values reaching approximately {} by {to_year}.",
            self.scope,
            self.indicator.label(),
            self.r_squared,
            self.indicator.format_value(to),
        )
    }
}

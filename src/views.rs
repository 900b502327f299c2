//! Dashboard views: filter state and the chart plus insight each view shows.
//!
//! Every builder takes the filters explicitly. Failures are returned to the
//! caller, which shows them in place of the chart instead of aborting.

use tracing::warn;

use crate::analysis::aggregate::{
    continent_means, indicator_means, latest_value, progress_score, yearly_series,
};
use crate::analysis::correlation::{correlation_matrix, insight, paired_values, pearson, Strength};
use crate::analysis::forecast::forecast;
use crate::analysis::query::{answer, Answer};
use crate::analysis::{CompletionPolicy, Correlation, ModelKind, Scope};
use crate::data::{Continent, Country, Dataset, Indicator, MergedRecord};
use crate::error::{Error, Result};
use crate::report::{ChartSpec, ReportBuilder, Series};

/// Earliest and latest selectable forecast horizon
pub const HORIZON_RANGE: (i32, i32) = (2021, 2050);
pub const DEFAULT_HORIZON: i32 = 2030;

/// Which analysis the main panel shows
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum View {
    Trend,
    Correlation,
    Forecast,
    Continents,
    Matrix,
    /// Answer to a typed question about continents
    Ask,
}

impl View {
    pub const ALL: [View; 6] = [
        View::Trend,
        View::Correlation,
        View::Forecast,
        View::Continents,
        View::Matrix,
        View::Ask,
    ];

    pub fn label(self) -> &'static str {
        match self {
            View::Trend => "Trend",
            View::Correlation => "Correlation",
            View::Forecast => "Forecast",
            View::Continents => "Continents",
            View::Matrix => "Matrix",
            View::Ask => "Ask",
        }
    }

    pub fn index(self) -> usize {
        View::ALL.iter().position(|v| *v == self).unwrap_or(0)
    }

    pub fn next(self) -> Self {
        View::ALL[(self.index() + 1) % View::ALL.len()]
    }

    pub fn prev(self) -> Self {
        View::ALL[(self.index() + View::ALL.len() - 1) % View::ALL.len()]
    }
}

/// Population the forecast view projects
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ForecastScope {
    #[default]
    Global,
    /// The continent currently selected in the filters
    Continent,
    /// The country highlighted in the sidebar
    Country,
}

impl ForecastScope {
    pub fn next(self) -> Self {
        match self {
            ForecastScope::Global => ForecastScope::Continent,
            ForecastScope::Continent => ForecastScope::Country,
            ForecastScope::Country => ForecastScope::Global,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            ForecastScope::Global => "Global",
            ForecastScope::Continent => "Continent",
            ForecastScope::Country => "Country",
        }
    }
}

/// Inclusive GDP per capita bounds. `None` leaves that side open.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct GdpRange {
    pub min: Option<f64>,
    pub max: Option<f64>,
}

impl GdpRange {
    /// Any, then the World Bank income groups (current US$ thresholds)
    pub const PRESETS: [GdpRange; 5] = [
        GdpRange { min: None, max: None },
        GdpRange { min: None, max: Some(1_145.0) },
        GdpRange { min: Some(1_145.0), max: Some(4_515.0) },
        GdpRange { min: Some(4_515.0), max: Some(14_005.0) },
        GdpRange { min: Some(14_005.0), max: None },
    ];

    pub fn is_open(&self) -> bool {
        self.min.is_none() && self.max.is_none()
    }

    pub fn contains(&self, value: f64) -> bool {
        self.min.map_or(true, |lo| value >= lo) && self.max.map_or(true, |hi| value <= hi)
    }

    pub fn label(&self) -> String {
        let fmt = |v: f64| Indicator::GdpPerCapita.format_value(v);
        match (self.min, self.max) {
            (None, None) => "Any".to_string(),
            (None, Some(hi)) => format!("<= {}", fmt(hi)),
            (Some(lo), None) => format!(">= {}", fmt(lo)),
            (Some(lo), Some(hi)) => format!("{}-{}", fmt(lo), fmt(hi)),
        }
    }
}

/// Choices for the top-N-by-GDP filter
pub const TOP_N_OPTIONS: [Option<usize>; 5] = [None, Some(5), Some(10), Some(20), Some(50)];

/// Everything the user can filter on
#[derive(Debug, Clone, PartialEq)]
pub struct DashboardFilters {
    /// `None` means all years
    pub year: Option<i32>,
    /// `None` means every continent
    pub continent: Option<Continent>,
    pub indicator: Indicator,
    pub corr_x: Indicator,
    pub corr_y: Indicator,
    pub policy: CompletionPolicy,
    /// Countries outside the range are left out of cross-country views
    pub gdp_range: GdpRange,
    /// Keep only the N richest countries of each year
    pub top_n: Option<usize>,
    pub model: ModelKind,
    pub horizon: i32,
    pub forecast_scope: ForecastScope,
    /// Question answered by the Ask view
    pub question: String,
}

impl Default for DashboardFilters {
    fn default() -> Self {
        DashboardFilters {
            year: None,
            continent: None,
            indicator: Indicator::GdpPerCapita,
            corr_x: Indicator::GdpPerCapita,
            corr_y: Indicator::LifeExpectancy,
            policy: CompletionPolicy::default(),
            gdp_range: GdpRange::default(),
            top_n: None,
            model: ModelKind::default(),
            horizon: DEFAULT_HORIZON,
            forecast_scope: ForecastScope::default(),
            question: String::new(),
        }
    }
}

fn cycle<T: Copy + PartialEq>(options: &[T], current: T, forward: bool) -> T {
    let Some(pos) = options.iter().position(|o| *o == current) else {
        return options.first().copied().unwrap_or(current);
    };
    let n = options.len();
    let next = if forward { (pos + 1) % n } else { (pos + n - 1) % n };
    options[next]
}

impl DashboardFilters {
    /// Step through `None` followed by each year in `years`
    pub fn step_year(&mut self, years: &[i32], forward: bool) {
        let options: Vec<Option<i32>> = std::iter::once(None)
            .chain(years.iter().copied().map(Some))
            .collect();
        self.year = cycle(&options, self.year, forward);
    }

    /// Step through `None` followed by each continent in `available`
    pub fn step_continent(&mut self, available: &[Continent], forward: bool) {
        let options: Vec<Option<Continent>> = std::iter::once(None)
            .chain(available.iter().copied().map(Some))
            .collect();
        self.continent = cycle(&options, self.continent, forward);
    }

    pub fn step_gdp_range(&mut self) {
        self.gdp_range = cycle(&GdpRange::PRESETS, self.gdp_range, true);
    }

    pub fn step_top_n(&mut self) {
        self.top_n = cycle(&TOP_N_OPTIONS, self.top_n, true);
    }

    /// Next x axis indicator, never equal to the y axis
    pub fn next_corr_x(&mut self) {
        self.corr_x = cycle(&Indicator::ALL, self.corr_x, true);
        if self.corr_x == self.corr_y {
            self.corr_x = cycle(&Indicator::ALL, self.corr_x, true);
        }
    }

    /// Next y axis indicator, never equal to the x axis
    pub fn next_corr_y(&mut self) {
        self.corr_y = cycle(&Indicator::ALL, self.corr_y, true);
        if self.corr_y == self.corr_x {
            self.corr_y = cycle(&Indicator::ALL, self.corr_y, true);
        }
    }

    pub fn shift_horizon(&mut self, delta: i32) {
        self.horizon = (self.horizon + delta).clamp(HORIZON_RANGE.0, HORIZON_RANGE.1);
    }

    pub fn year_label(&self) -> String {
        self.year.map_or_else(|| "All years".to_string(), |y| y.to_string())
    }

    pub fn continent_label(&self) -> &'static str {
        self.continent.map_or("All continents", |c| c.name())
    }

    pub fn top_n_label(&self) -> String {
        self.top_n.map_or_else(|| "All".to_string(), |n| format!("Top {n}"))
    }
}

/// Countries the trend view plots
#[derive(Debug, Clone, Copy, Default)]
pub struct Selection<'a> {
    pub country: Option<&'a Country>,
    pub overlays: &'a [&'a Country],
}

/// What the main panel draws
#[derive(Debug, Clone, PartialEq)]
pub enum Panel {
    Chart(ChartSpec),
    /// Rows and columns in `Indicator::ALL` order
    Matrix(Vec<Vec<Option<f64>>>),
}

/// A panel plus its narrative, or the message explaining why there is none
#[derive(Debug, Clone, PartialEq)]
pub struct ViewContent {
    pub panel: std::result::Result<Panel, String>,
    pub insight: String,
}

/// Compute the content of `view`. Errors are folded into the panel.
pub fn build_view(
    view: View,
    dataset: &Dataset,
    filters: &DashboardFilters,
    selection: Selection<'_>,
) -> ViewContent {
    let result = match view {
        View::Trend => trend_view(dataset, filters, selection).map(chart_panel),
        View::Correlation => correlation_view(dataset, filters).map(chart_panel),
        View::Forecast => forecast_view(dataset, filters, selection).map(chart_panel),
        View::Continents => continent_view(dataset, filters).map(chart_panel),
        View::Matrix => matrix_view(dataset, filters),
        View::Ask => ask_view(dataset, filters).map(chart_panel),
    };
    match result {
        Ok((panel, insight)) => ViewContent {
            panel: Ok(panel),
            insight,
        },
        Err(err) => ViewContent {
            panel: Err(err.to_string()),
            insight: String::new(),
        },
    }
}

fn chart_panel((chart, insight): (ChartSpec, String)) -> (Panel, String) {
    (Panel::Chart(chart), insight)
}

fn as_points(series: &[(i32, f64)]) -> Vec<(f64, f64)> {
    series.iter().map(|&(year, v)| (f64::from(year), v)).collect()
}

/// Country rows (aggregates excluded) for a year and continent, narrowed by
/// the GDP range and top-N filters
fn country_rows<'a>(
    dataset: &'a Dataset,
    filters: &DashboardFilters,
    year: Option<i32>,
    continent: Option<Continent>,
) -> Vec<&'a MergedRecord> {
    fn gdp(r: &MergedRecord) -> Option<f64> {
        r.value(Indicator::GdpPerCapita)
    }

    let mut rows: Vec<&MergedRecord> = dataset
        .filtered(year, continent)
        .filter(|r| r.region.is_some())
        .filter(|r| filters.gdp_range.is_open() || gdp(r).is_some_and(|v| filters.gdp_range.contains(v)))
        .collect();

    if let Some(n) = filters.top_n {
        rows.retain(|r| gdp(r).is_some());
        // Richest first within each year, then keep the first n of every year
        rows.sort_by(|a, b| {
            a.year
                .cmp(&b.year)
                .then_with(|| gdp(b).unwrap_or(0.0).total_cmp(&gdp(a).unwrap_or(0.0)))
        });
        let mut kept = Vec::with_capacity(rows.len());
        let mut current = None;
        let mut count = 0;
        for row in rows {
            if current != Some(row.year) {
                current = Some(row.year);
                count = 0;
            }
            if count < n {
                kept.push(row);
                count += 1;
            }
        }
        rows = kept;
    }
    rows
}

/// Country rows matching every filter
fn filtered_rows<'a>(dataset: &'a Dataset, filters: &DashboardFilters) -> Vec<&'a MergedRecord> {
    country_rows(dataset, filters, filters.year, filters.continent)
}

fn scope_label(filters: &DashboardFilters) -> String {
    filters
        .continent
        .map_or_else(|| "the world".to_string(), |c| c.name().to_string())
}

/// Selected country and comparison countries over time, or the global mean
/// when no country is selected
pub fn trend_view(
    dataset: &Dataset,
    filters: &DashboardFilters,
    selection: Selection<'_>,
) -> Result<(ChartSpec, String)> {
    let indicator = filters.indicator;
    let mut series = Vec::new();

    match selection.country {
        Some(country) => series.push(Series::new(
            &country.name,
            as_points(&dataset.country_series(&country.code, indicator)),
        )),
        None => series.push(Series::new(
            "Global mean",
            as_points(&yearly_series(dataset, indicator, &Scope::Global)),
        )),
    }
    for country in selection.overlays {
        series.push(Series::new(
            &country.name,
            as_points(&dataset.country_series(&country.code, indicator)),
        ));
    }
    series.retain(|s| !s.points.is_empty());
    if series.is_empty() {
        return Err(Error::MissingValues(format!(
            "no {} values for the selected countries",
            indicator.column()
        )));
    }

    let mut insight = match selection.country {
        Some(country) => match latest_value(dataset, &country.code, indicator) {
            Some((year, value)) => {
                let mut text = format!(
                    "Latest {} for {}: {} ({year}).",
                    indicator.label(),
                    country.name,
                    indicator.format_value(value)
                );
                let global = indicator_means(dataset, Some(year), None)
                    .into_iter()
                    .find(|(i, _)| *i == indicator)
                    .and_then(|(_, mean)| mean);
                if let Some(mean) = global {
                    text.push_str(&format!(
                        " The average across countries that year was {}.",
                        indicator.format_value(mean)
                    ));
                }
                text
            }
            None => format!("{} has no {} values.", country.name, indicator.label()),
        },
        None => "Select a country in the sidebar to see its trajectory.".to_string(),
    };
    if let Some(country) = selection.country {
        insight.push_str(&progress_text(dataset, filters, country, selection.overlays));
    }

    let chart = ChartSpec::Line {
        title: format!("{} over time", indicator.label()),
        x_label: "Year".to_string(),
        y_label: indicator.unit().to_string(),
        series,
    };
    Ok((chart, insight))
}

/// Progress score of the selected country and how it compares with each
/// marked country. Empty when the score cannot be computed.
fn progress_text(
    dataset: &Dataset,
    filters: &DashboardFilters,
    country: &Country,
    overlays: &[&Country],
) -> String {
    let Ok(own) = progress_score(dataset, &country.code, filters.year) else {
        return String::new();
    };
    let mut text = format!(
        " National progress score: {:.1} / 100 ({}).",
        own.score, own.year
    );
    for other in overlays {
        let Ok(theirs) = progress_score(dataset, &other.code, filters.year) else {
            continue;
        };
        let diff = own.score - theirs.score;
        let better = if diff >= 0.0 { &country.name } else { &other.name };
        text.push_str(&format!(
            " {} scores {:.1}; {better} is ahead by {:.1} points.",
            other.name,
            theirs.score,
            diff.abs()
        ));
    }
    text
}

/// Scatter of the two correlation axes with the coefficient narrative
pub fn correlation_view(dataset: &Dataset, filters: &DashboardFilters) -> Result<(ChartSpec, String)> {
    let (x, y) = (filters.corr_x, filters.corr_y);
    let rows = filtered_rows(dataset, filters);
    let points = paired_values(rows, x, y, filters.policy)?;
    let coefficient = pearson(&points)?;
    let correlation = Correlation {
        x,
        y,
        coefficient,
        pairs: points.len(),
    };

    let text = insight(&correlation, &scope_label(filters), filters.year);
    let chart = ChartSpec::Scatter {
        title: format!("{} vs {}", x.label(), y.label()),
        x_label: x.label().to_string(),
        y_label: y.label().to_string(),
        points,
    };
    Ok((chart, text))
}

/// Historical series for the forecast scope plus its projection
pub fn forecast_view(
    dataset: &Dataset,
    filters: &DashboardFilters,
    selection: Selection<'_>,
) -> Result<(ChartSpec, String)> {
    let scope = match filters.forecast_scope {
        ForecastScope::Global => Scope::Global,
        ForecastScope::Continent => Scope::Continent(filters.continent.ok_or_else(|| {
            Error::InvalidArgument("select a continent with 'c' to forecast it".to_string())
        })?),
        ForecastScope::Country => {
            let country = selection.country.ok_or_else(|| {
                Error::InvalidArgument("select a country to forecast it".to_string())
            })?;
            Scope::Country {
                code: country.code.clone(),
                name: country.name.clone(),
            }
        }
    };

    let indicator = filters.indicator;
    let history = yearly_series(dataset, indicator, &scope);
    let result = forecast(indicator, &scope, &history, filters.horizon, filters.model)?;

    let projected: Vec<(f64, f64)> = result
        .forecast_years
        .iter()
        .zip(&result.forecast_values)
        .map(|(&year, &v)| (f64::from(year), v))
        .collect();
    let chart = ChartSpec::Line {
        title: format!("{} forecast for {scope}", indicator.label()),
        x_label: "Year".to_string(),
        y_label: indicator.unit().to_string(),
        series: vec![
            Series::new("Historical", as_points(&history)),
            Series::new(format!("Forecast ({})", result.model), projected),
        ],
    };
    Ok((chart, format!("{} {}", result.headline(), result.summary())))
}

/// Mean of the indicator per continent for the selected (or latest) year
pub fn continent_view(dataset: &Dataset, filters: &DashboardFilters) -> Result<(ChartSpec, String)> {
    let indicator = filters.indicator;
    let year = filters
        .year
        .or_else(|| dataset.years().last().copied())
        .ok_or_else(|| Error::MissingValues("the dataset has no years".to_string()))?;

    let means = continent_means(country_rows(dataset, filters, Some(year), None), indicator);
    let highest = means.iter().max_by(|a, b| a.1.total_cmp(&b.1));
    let lowest = means.iter().min_by(|a, b| a.1.total_cmp(&b.1));
    let (Some(&(high, high_v)), Some(&(low, low_v))) = (highest, lowest) else {
        return Err(Error::MissingValues(format!(
            "no {} values in {year}",
            indicator.column()
        )));
    };

    let insight = format!(
        "In {year}, {high} has the highest average {} ({}) and {low} the lowest ({}).",
        indicator.label(),
        indicator.format_value(high_v),
        indicator.format_value(low_v),
    );
    let chart = ChartSpec::Bar {
        title: format!("Average {} by continent, {year}", indicator.label()),
        y_label: indicator.unit().to_string(),
        bars: means
            .into_iter()
            .map(|(c, v)| (c.name().to_string(), v))
            .collect(),
    };
    Ok((chart, insight))
}

/// Every pairwise coefficient for the filtered rows
pub fn matrix_view(dataset: &Dataset, filters: &DashboardFilters) -> Result<(Panel, String)> {
    let rows = filtered_rows(dataset, filters);
    let cells = correlation_matrix(&rows, filters.policy);

    let mut strongest: Option<(Indicator, Indicator, f64)> = None;
    for (i, x) in Indicator::ALL.iter().enumerate() {
        for (j, y) in Indicator::ALL.iter().enumerate().skip(i + 1) {
            if let Some(r) = cells[i][j] {
                if strongest.map_or(true, |(_, _, best)| r.abs() > best.abs()) {
                    strongest = Some((*x, *y, r));
                }
            }
        }
    }

    let (x, y, r) = strongest.ok_or(Error::InsufficientData {
        required: crate::analysis::correlation::MIN_PAIRS,
        actual: 0,
    })?;
    let insight = format!(
        "Strongest relationship in {}: {} and {} (r = {r:.2}, {}).",
        scope_label(filters),
        x.label(),
        y.label(),
        Strength::of(r).name(),
    );
    Ok((Panel::Matrix(cells), insight))
}

/// Chart and reply for the typed question
pub fn ask_view(dataset: &Dataset, filters: &DashboardFilters) -> Result<(ChartSpec, String)> {
    let question = filters.question.trim();
    if question.is_empty() {
        return Err(Error::InvalidArgument(
            "press '/' and ask e.g. \"compare life expectancy in Europe and Africa\"".to_string(),
        ));
    }

    let reply = answer(dataset, question)?;
    let chart = match &reply {
        Answer::Comparison {
            indicator,
            first,
            second,
        } => ChartSpec::Bar {
            title: format!("{}: {} vs {}", indicator.label(), first.0, second.0),
            y_label: indicator.unit().to_string(),
            bars: vec![
                (first.0.name().to_string(), first.2),
                (second.0.name().to_string(), second.2),
            ],
        },
        Answer::Trend {
            indicator,
            continent,
            series,
        } => ChartSpec::Line {
            title: format!("{} trend in {continent}", indicator.label()),
            x_label: "Year".to_string(),
            y_label: indicator.unit().to_string(),
            series: vec![Series::new(continent.name(), as_points(series))],
        },
    };
    Ok((chart, reply.summary()))
}

/// Report with one section per chart view. Views that cannot be computed for
/// the current filters are left out.
pub fn report_builder(
    dataset: &Dataset,
    filters: &DashboardFilters,
    selection: Selection<'_>,
) -> ReportBuilder {
    let mut builder = ReportBuilder::new("Global Wealth & Health Report");
    let sections = [
        (View::Trend, trend_view(dataset, filters, selection)),
        (View::Correlation, correlation_view(dataset, filters)),
        (View::Forecast, forecast_view(dataset, filters, selection)),
        (View::Continents, continent_view(dataset, filters)),
    ];
    for (view, section) in sections {
        match section {
            Ok((chart, summary)) => {
                builder.section(chart, summary);
            }
            Err(err) => warn!(view = view.label(), error = %err, "Skipping report section"),
        }
    }
    builder
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(code: &str, name: &str, year: i32, gdp: f64, life: f64, mort: Option<f64>) -> MergedRecord {
        let mut r = MergedRecord::new(code.into(), name.into(), year);
        r.set_value(Indicator::GdpPerCapita, Some(gdp));
        r.set_value(Indicator::LifeExpectancy, Some(life));
        r.set_value(Indicator::ChildMortality, mort);
        r
    }

    fn dataset() -> Dataset {
        let mut rows = Vec::new();
        for (i, year) in (2015..=2020).enumerate() {
            let step = i as f64;
            rows.push(record("ITA", "Italy", year, 30_000.0 + 500.0 * step, 82.0 + 0.1 * step, Some(3.0)));
            rows.push(record("DEU", "Germany", year, 40_000.0 + 800.0 * step, 80.5 + 0.1 * step, Some(3.5)));
            rows.push(record("NGA", "Nigeria", year, 2_000.0 + 50.0 * step, 53.0 + 0.4 * step, Some(120.0 - step)));
            rows.push(record("BRA", "Brazil", year, 8_000.0 + 100.0 * step, 74.0 + 0.2 * step, Some(15.0)));
            rows.push(record("WLD", "World", year, 11_000.0, 72.0, Some(40.0)));
        }
        Dataset::from_records(rows).unwrap()
    }

    fn italy() -> Country {
        Country {
            code: "ITA".into(),
            name: "Italy".into(),
            region: Some(Continent::Europe),
        }
    }

    #[test]
    fn test_view_cycle() {
        assert_eq!(View::Trend.next(), View::Correlation);
        assert_eq!(View::Matrix.next(), View::Ask);
        assert_eq!(View::Ask.next(), View::Trend);
        assert_eq!(View::Trend.prev(), View::Ask);
    }

    #[test]
    fn test_year_and_continent_stepping() {
        let mut filters = DashboardFilters::default();
        let years = [2019, 2020];
        filters.step_year(&years, true);
        assert_eq!(filters.year, Some(2019));
        filters.step_year(&years, true);
        filters.step_year(&years, true);
        assert_eq!(filters.year, None);
        filters.step_year(&years, false);
        assert_eq!(filters.year, Some(2020));

        let available = dataset().continents();
        assert_eq!(available, vec![Continent::Africa, Continent::Europe, Continent::SouthAmerica]);
        filters.step_continent(&available, true);
        assert_eq!(filters.continent, Some(Continent::Africa));
        filters.step_continent(&available, false);
        filters.step_continent(&available, false);
        assert_eq!(filters.continent, Some(Continent::SouthAmerica));
    }

    #[test]
    fn test_gdp_range_and_top_n_cycle() {
        let mut filters = DashboardFilters::default();
        assert_eq!(filters.gdp_range.label(), "Any");
        filters.step_gdp_range();
        assert_eq!(filters.gdp_range.label(), "<= $1,145");
        for _ in 0..4 {
            filters.step_gdp_range();
        }
        assert!(filters.gdp_range.is_open());

        // A custom range from the command line moves to the first preset
        filters.gdp_range = GdpRange { min: Some(10.0), max: Some(20.0) };
        filters.step_gdp_range();
        assert!(filters.gdp_range.is_open());

        assert_eq!(filters.top_n_label(), "All");
        filters.step_top_n();
        assert_eq!(filters.top_n, Some(5));
        assert_eq!(filters.top_n_label(), "Top 5");
    }

    #[test]
    fn test_gdp_range_and_top_n_narrow_rows() {
        let ds = dataset();
        let mut filters = DashboardFilters {
            year: Some(2020),
            gdp_range: GdpRange { min: Some(5_000.0), max: None },
            ..DashboardFilters::default()
        };
        let codes = |rows: Vec<&MergedRecord>| -> Vec<String> {
            rows.into_iter().map(|r| r.country_code.clone()).collect()
        };
        assert_eq!(codes(filtered_rows(&ds, &filters)), vec!["BRA", "DEU", "ITA"]);

        filters.gdp_range = GdpRange::default();
        filters.top_n = Some(2);
        assert_eq!(codes(filtered_rows(&ds, &filters)), vec!["DEU", "ITA"]);

        // Top N applies per year
        filters.year = None;
        assert_eq!(filtered_rows(&ds, &filters).len(), 12);
    }

    #[test]
    fn test_continent_view_respects_gdp_range() {
        let ds = dataset();
        let filters = DashboardFilters {
            gdp_range: GdpRange { min: Some(5_000.0), max: None },
            ..DashboardFilters::default()
        };
        let (chart, _) = continent_view(&ds, &filters).unwrap();
        match chart {
            ChartSpec::Bar { bars, .. } => {
                let names: Vec<&str> = bars.iter().map(|b| b.0.as_str()).collect();
                assert_eq!(names, vec!["Europe", "South America"]);
            }
            other => panic!("expected bars, got {other:?}"),
        }
    }

    #[test]
    fn test_completion_policy_reaches_correlation() {
        let ds = dataset();
        let mut filters = DashboardFilters {
            year: Some(2020),
            corr_y: Indicator::HealthExpPerCapita,
            ..DashboardFilters::default()
        };
        assert!(matches!(
            correlation_view(&ds, &filters),
            Err(Error::InsufficientData { actual: 0, .. })
        ));
        filters.policy = filters.policy.toggle();
        assert_eq!(filters.policy, CompletionPolicy::Complete);
        assert!(matches!(correlation_view(&ds, &filters), Err(Error::MissingValues(_))));
    }

    #[test]
    fn test_trend_insight_includes_progress_scores() {
        let mut rows = dataset().records().to_vec();
        for r in rows.iter_mut() {
            let gdp = r.value(Indicator::GdpPerCapita);
            r.set_value(Indicator::HealthExpPerCapita, gdp.map(|g| g / 10.0));
        }
        let ds = Dataset::from_records(rows).unwrap();
        let italy = italy();
        let nigeria = Country {
            code: "NGA".into(),
            name: "Nigeria".into(),
            region: Some(Continent::Africa),
        };
        let overlays = [&nigeria];
        let selection = Selection {
            country: Some(&italy),
            overlays: &overlays,
        };
        let (_, insight) = trend_view(&ds, &DashboardFilters::default(), selection).unwrap();
        assert!(insight.contains("National progress score:"));
        assert!(insight.contains("(2020)"));
        assert!(insight.contains("Nigeria scores 0.0; Italy is ahead by"));
    }

    #[test]
    fn test_trend_insight_without_score_when_indicators_missing() {
        let italy = italy();
        let selection = Selection {
            country: Some(&italy),
            overlays: &[],
        };
        let (_, insight) = trend_view(&dataset(), &DashboardFilters::default(), selection).unwrap();
        assert!(!insight.contains("progress score"));
    }

    #[test]
    fn test_ask_view() {
        let ds = dataset();
        let mut filters = DashboardFilters::default();
        let content = build_view(View::Ask, &ds, &filters, Selection::default());
        assert!(content.panel.unwrap_err().contains("press '/'"));

        filters.question = "Compare GDP in Europe and Africa".into();
        let (chart, reply) = ask_view(&ds, &filters).unwrap();
        match chart {
            ChartSpec::Bar { bars, .. } => {
                assert_eq!(bars.len(), 2);
                assert_eq!(bars[0].0, "Europe");
            }
            other => panic!("expected bars, got {other:?}"),
        }
        assert!(reply.starts_with("Europe has higher average GDP per Capita than Africa"));

        filters.question = "child mortality in africa".into();
        let (chart, reply) = ask_view(&ds, &filters).unwrap();
        assert!(matches!(chart, ChartSpec::Line { .. }));
        assert!(reply.contains("has decreased"));
    }

    #[test]
    fn test_correlation_axes_never_match() {
        let mut filters = DashboardFilters::default();
        for _ in 0..8 {
            filters.next_corr_x();
            assert_ne!(filters.corr_x, filters.corr_y);
            filters.next_corr_y();
            assert_ne!(filters.corr_x, filters.corr_y);
        }
    }

    #[test]
    fn test_horizon_is_clamped() {
        let mut filters = DashboardFilters::default();
        filters.shift_horizon(100);
        assert_eq!(filters.horizon, HORIZON_RANGE.1);
        filters.shift_horizon(-100);
        assert_eq!(filters.horizon, HORIZON_RANGE.0);
    }

    #[test]
    fn test_trend_with_overlay() {
        let ds = dataset();
        let italy = italy();
        let germany = Country {
            code: "DEU".into(),
            name: "Germany".into(),
            region: Some(Continent::Europe),
        };
        let overlays = [&germany];
        let selection = Selection {
            country: Some(&italy),
            overlays: &overlays,
        };
        let (chart, insight) = trend_view(&ds, &DashboardFilters::default(), selection).unwrap();
        match chart {
            ChartSpec::Line { series, .. } => {
                assert_eq!(series.len(), 2);
                assert_eq!(series[0].name, "Italy");
                assert_eq!(series[0].points.len(), 6);
            }
            other => panic!("expected line chart, got {other:?}"),
        }
        assert!(insight.starts_with("Latest GDP per Capita for Italy"));
    }

    #[test]
    fn test_correlation_view_excludes_aggregates() {
        let ds = dataset();
        let filters = DashboardFilters {
            year: Some(2020),
            ..DashboardFilters::default()
        };
        let (chart, insight) = correlation_view(&ds, &filters).unwrap();
        match chart {
            ChartSpec::Scatter { points, .. } => assert_eq!(points.len(), 4),
            other => panic!("expected scatter, got {other:?}"),
        }
        assert!(insight.contains("during 2020"));
    }

    #[test]
    fn test_failing_view_degrades_to_message() {
        let ds = dataset();
        let filters = DashboardFilters {
            year: Some(2020),
            continent: Some(Continent::Asia),
            ..DashboardFilters::default()
        };
        let content = build_view(View::Correlation, &ds, &filters, Selection::default());
        let message = content.panel.unwrap_err();
        assert!(message.contains("Insufficient data"));
        assert!(content.insight.is_empty());
    }

    #[test]
    fn test_forecast_scopes() {
        let ds = dataset();
        let mut filters = DashboardFilters {
            model: ModelKind::Linear,
            ..DashboardFilters::default()
        };
        let (_, text) = forecast_view(&ds, &filters, Selection::default()).unwrap();
        assert!(text.starts_with("Global is projected to see an increase"));

        filters.forecast_scope = ForecastScope::Continent;
        assert!(matches!(
            forecast_view(&ds, &filters, Selection::default()),
            Err(Error::InvalidArgument(_))
        ));
        filters.continent = Some(Continent::Africa);
        assert!(forecast_view(&ds, &filters, Selection::default()).is_ok());

        filters.forecast_scope = ForecastScope::Country;
        let italy = italy();
        let selection = Selection {
            country: Some(&italy),
            overlays: &[],
        };
        let (chart, _) = forecast_view(&ds, &filters, selection).unwrap();
        assert_eq!(chart.title(), "GDP per Capita forecast for Italy");
    }

    #[test]
    fn test_continent_view_defaults_to_latest_year() {
        let ds = dataset();
        let (chart, insight) = continent_view(&ds, &DashboardFilters::default()).unwrap();
        assert!(chart.title().ends_with("2020"));
        assert!(insight.contains("Europe has the highest"));
        assert!(insight.contains("Africa the lowest"));
    }

    #[test]
    fn test_matrix_view_reports_strongest_pair() {
        let ds = dataset();
        let (panel, insight) = matrix_view(&ds, &DashboardFilters::default()).unwrap();
        match panel {
            Panel::Matrix(cells) => {
                assert_eq!(cells.len(), 4);
                // Health expenditure column is empty
                assert_eq!(cells[0][2], None);
            }
            other => panic!("expected matrix, got {other:?}"),
        }
        assert!(insight.starts_with("Strongest relationship in the world"));
    }

    #[test]
    fn test_report_builder_skips_failing_sections() {
        let ds = dataset();
        let filters = DashboardFilters {
            forecast_scope: ForecastScope::Country,
            ..DashboardFilters::default()
        };
        // No selected country: the forecast section is skipped
        let builder = report_builder(&ds, &filters, Selection::default());
        assert_eq!(builder.len(), 3);
    }
}

//! Main panel widgets: charts for each view, the view tabs and the indicator
//! selector bar.

use ratatui::{
    layout::{Alignment, Constraint, Rect},
    style::{Modifier, Style},
    symbols::Marker,
    text::{Line, Span},
    widgets::{
        Axis, Bar, BarChart, BarGroup, Block, Borders, Cell, Chart, Dataset, GraphType, Paragraph,
        Row, Table, Tabs, Wrap,
    },
    Frame,
};

use super::theme::Theme;
use crate::data::Indicator;
use crate::report::{ChartSpec, Series};
use crate::views::{Panel, View};

/// Renders whatever the active view produced, or the reason it could not
pub struct ChartPanel<'a> {
    content: &'a Result<Panel, String>,
    title: &'a str,
    theme: &'a Theme,
}

impl<'a> ChartPanel<'a> {
    pub fn new(content: &'a Result<Panel, String>, title: &'a str, theme: &'a Theme) -> Self {
        ChartPanel {
            content,
            title,
            theme,
        }
    }

    fn block(&self, title: &str, focused: bool) -> Block<'static> {
        let (border_style, title_style) = self.theme.panel_styles(focused);
        Block::default()
            .title(format!(" {title} "))
            .borders(Borders::ALL)
            .border_style(border_style)
            .title_style(title_style)
    }

    pub fn render(&self, frame: &mut Frame, area: Rect, focused: bool) {
        match self.content {
            Ok(Panel::Chart(ChartSpec::Line { title, y_label, series, .. })) => {
                self.render_lines(frame, area, focused, title, y_label, series)
            }
            Ok(Panel::Chart(ChartSpec::Scatter { title, x_label, y_label, points })) => {
                self.render_scatter(frame, area, focused, title, x_label, y_label, points)
            }
            Ok(Panel::Chart(ChartSpec::Bar { title, bars, .. })) => {
                self.render_bars(frame, area, focused, title, bars)
            }
            Ok(Panel::Matrix(cells)) => self.render_matrix(frame, area, focused, cells),
            Err(message) => self.render_message(frame, area, focused, message),
        }
    }

    fn render_lines(
        &self,
        frame: &mut Frame,
        area: Rect,
        focused: bool,
        title: &str,
        y_label: &str,
        series: &[Series],
    ) {
        let all = series.iter().flat_map(|s| s.points.iter().copied());
        let [x_min, x_max] = padded_bounds(all.clone().map(|p| p.0), 0.0);
        let [y_min, y_max] = padded_bounds(all.map(|p| p.1), 0.05);

        let datasets: Vec<Dataset> = series
            .iter()
            .enumerate()
            .map(|(i, s)| {
                Dataset::default()
                    .name(s.name.clone())
                    .marker(Marker::Braille)
                    .graph_type(GraphType::Line)
                    .style(Style::default().fg(self.theme.chart_color(i)))
                    .data(&s.points)
            })
            .collect();

        let chart = Chart::new(datasets)
            .block(self.block(title, focused))
            .x_axis(
                Axis::default()
                    .title(Span::styled("year", Style::default().add_modifier(Modifier::DIM)))
                    .style(self.theme.normal_style())
                    .bounds([x_min, x_max])
                    .labels(axis_labels(x_min, x_max, |v| format!("{v:.0}"))),
            )
            .y_axis(
                Axis::default()
                    .title(Span::styled(y_label.to_string(), Style::default().add_modifier(Modifier::DIM)))
                    .style(self.theme.normal_style())
                    .bounds([y_min, y_max])
                    .labels(axis_labels(y_min, y_max, format_value)),
            );

        frame.render_widget(chart, area);
    }

    #[allow(clippy::too_many_arguments)]
    fn render_scatter(
        &self,
        frame: &mut Frame,
        area: Rect,
        focused: bool,
        title: &str,
        x_label: &str,
        y_label: &str,
        points: &[(f64, f64)],
    ) {
        let [x_min, x_max] = padded_bounds(points.iter().map(|p| p.0), 0.05);
        let [y_min, y_max] = padded_bounds(points.iter().map(|p| p.1), 0.05);

        let dataset = Dataset::default()
            .marker(Marker::Dot)
            .graph_type(GraphType::Scatter)
            .style(Style::default().fg(self.theme.chart_color(0)))
            .data(points);

        let chart = Chart::new(vec![dataset])
            .block(self.block(title, focused))
            .x_axis(
                Axis::default()
                    .title(Span::styled(x_label.to_string(), Style::default().add_modifier(Modifier::DIM)))
                    .style(self.theme.normal_style())
                    .bounds([x_min, x_max])
                    .labels(axis_labels(x_min, x_max, format_value)),
            )
            .y_axis(
                Axis::default()
                    .title(Span::styled(y_label.to_string(), Style::default().add_modifier(Modifier::DIM)))
                    .style(self.theme.normal_style())
                    .bounds([y_min, y_max])
                    .labels(axis_labels(y_min, y_max, format_value)),
            );

        frame.render_widget(chart, area);
    }

    fn render_bars(&self, frame: &mut Frame, area: Rect, focused: bool, title: &str, bars: &[(String, f64)]) {
        // BarChart takes integer heights; keep two decimals of resolution
        let items: Vec<Bar> = bars
            .iter()
            .enumerate()
            .map(|(i, (label, value))| {
                Bar::default()
                    .value((value.max(0.0) * 100.0).round() as u64)
                    .text_value(format_value(*value))
                    .label(Line::from(label.clone()))
                    .style(Style::default().fg(self.theme.chart_color(i)))
            })
            .collect();

        let n = bars.len().max(1) as u16;
        let bar_width = (area.width.saturating_sub(2) / n).saturating_sub(2).clamp(3, 20);

        let chart = BarChart::default()
            .block(self.block(title, focused))
            .data(BarGroup::default().bars(&items))
            .bar_width(bar_width)
            .bar_gap(2)
            .value_style(self.theme.highlight_style())
            .label_style(self.theme.normal_style());

        frame.render_widget(chart, area);
    }

    fn render_matrix(&self, frame: &mut Frame, area: Rect, focused: bool, cells: &[Vec<Option<f64>>]) {
        let header = Row::new(
            std::iter::once(Cell::from(""))
                .chain(Indicator::ALL.iter().map(|i| Cell::from(i.column()))),
        )
        .style(self.theme.title_style());

        let rows: Vec<Row> = Indicator::ALL
            .iter()
            .zip(cells)
            .map(|(indicator, row)| {
                let mut line = vec![Cell::from(indicator.column()).style(self.theme.title_style())];
                line.extend(row.iter().map(|r| {
                    let text = r.map_or_else(|| "n/a".to_string(), |r| format!("{r:+.2}"));
                    Cell::from(text).style(self.theme.coefficient_style(*r))
                }));
                Row::new(line)
            })
            .collect();

        let widths = [Constraint::Length(24); 5];
        let table = Table::new(rows, widths)
            .header(header)
            .block(self.block(self.title, focused))
            .column_spacing(1);

        frame.render_widget(table, area);
    }

    fn render_message(&self, frame: &mut Frame, area: Rect, focused: bool, message: &str) {
        let block = self.block(self.title, focused);
        let inner = block.inner(area);
        frame.render_widget(block, area);

        let paragraph = Paragraph::new(message.to_string())
            .style(self.theme.error_style())
            .alignment(Alignment::Center)
            .wrap(Wrap { trim: true });
        frame.render_widget(paragraph, inner);
    }
}

/// Tab strip naming every view, the active one highlighted
pub struct ViewTabs<'a> {
    active: View,
    theme: &'a Theme,
}

impl<'a> ViewTabs<'a> {
    pub fn new(active: View, theme: &'a Theme) -> Self {
        ViewTabs { active, theme }
    }

    pub fn render(&self, frame: &mut Frame, area: Rect) {
        let titles: Vec<String> = View::ALL.iter().map(|v| v.label().to_string()).collect();
        let tabs = Tabs::new(titles)
            .select(self.active.index())
            .style(self.theme.dimmed_style())
            .highlight_style(self.theme.highlight_style())
            .divider("|");
        frame.render_widget(tabs, area);
    }
}

/// Indicator selector bar: `[1] GDP per Capita  [2] Life Expectancy ...`
pub struct IndicatorSelector<'a> {
    selected: Indicator,
    theme: &'a Theme,
}

impl<'a> IndicatorSelector<'a> {
    pub fn new(selected: Indicator, theme: &'a Theme) -> Self {
        IndicatorSelector { selected, theme }
    }

    pub fn render(&self, frame: &mut Frame, area: Rect) {
        let spans: Vec<Span> = Indicator::ALL
            .iter()
            .enumerate()
            .flat_map(|(i, indicator)| {
                let style = if *indicator == self.selected {
                    self.theme.highlight_style()
                } else {
                    self.theme.normal_style()
                };
                [
                    Span::styled(format!("[{}] ", i + 1), Style::default().add_modifier(Modifier::DIM)),
                    Span::styled(format!("{}  ", indicator.label()), style),
                ]
            })
            .collect();

        let paragraph = Paragraph::new(Line::from(spans)).style(self.theme.normal_style());
        frame.render_widget(paragraph, area);
    }
}

/// Axis bounds with `pad` of the range added on each side.
/// Degenerate ranges are widened so ratatui never gets min == max.
fn padded_bounds(values: impl Iterator<Item = f64>, pad: f64) -> [f64; 2] {
    let (mut lo, mut hi) = values.fold((f64::MAX, f64::MIN), |(lo, hi), v| (lo.min(v), hi.max(v)));
    if lo > hi {
        return [0.0, 1.0];
    }
    if lo >= hi {
        hi = lo + 1.0;
        lo -= 1.0;
    }
    let margin = (hi - lo) * pad;
    [lo - margin, hi + margin]
}

fn axis_labels(min: f64, max: f64, fmt: impl Fn(f64) -> String) -> Vec<Span<'static>> {
    vec![
        Span::raw(fmt(min)),
        Span::raw(fmt((min + max) / 2.0)),
        Span::raw(fmt(max)),
    ]
}

/// Compact value for axis labels and bar captions
fn format_value(value: f64) -> String {
    let abs = value.abs();
    if abs >= 1_000_000.0 {
        format!("{:.1}M", value / 1_000_000.0)
    } else if abs >= 10_000.0 {
        format!("{:.0}k", value / 1_000.0)
    } else if abs >= 1_000.0 {
        format!("{:.1}k", value / 1_000.0)
    } else if abs >= 10.0 {
        format!("{value:.0}")
    } else {
        format!("{value:.1}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_value() {
        assert_eq!(format_value(63_529.0), "64k");
        assert_eq!(format_value(2_500.0), "2.5k");
        assert_eq!(format_value(82.3), "82");
        assert_eq!(format_value(4.26), "4.3");
        assert_eq!(format_value(1_260_000.0), "1.3M");
    }

    #[test]
    fn test_padded_bounds() {
        assert_eq!(padded_bounds(std::iter::empty(), 0.05), [0.0, 1.0]);
        assert_eq!(padded_bounds([3.0].into_iter(), 0.0), [2.0, 4.0]);
        assert_eq!(padded_bounds([0.0, 10.0].into_iter(), 0.1), [-1.0, 11.0]);
    }

    #[test]
    fn test_axis_labels_midpoint() {
        let labels = axis_labels(2010.0, 2020.0, |v| format!("{v:.0}"));
        let text: Vec<String> = labels.iter().map(|s| s.content.to_string()).collect();
        assert_eq!(text, vec!["2010", "2015", "2020"]);
    }
}

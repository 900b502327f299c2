//! Sidebar and footer widgets for the dashboard.

use ratatui::{
    layout::Rect,
    style::Style,
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, List, ListItem, ListState, Paragraph, Wrap},
    Frame,
};

use super::theme::Theme;
use crate::comparison::ComparisonState;
use crate::data::Country;
use crate::views::DashboardFilters;

fn panel_block<'b>(title: String, focused: bool, theme: &Theme) -> Block<'b> {
    let (border_style, title_style) = theme.panel_styles(focused);
    Block::default()
        .title(title)
        .borders(Borders::ALL)
        .border_type(if focused {
            BorderType::Double
        } else {
            BorderType::Plain
        })
        .border_style(border_style)
        .title_style(title_style)
}

/// Country list panel. Countries marked for comparison carry a dot.
pub struct CountryList<'a> {
    countries: &'a [Country],
    selected: usize,
    marked: &'a ComparisonState,
    theme: &'a Theme,
}

impl<'a> CountryList<'a> {
    pub fn new(
        countries: &'a [Country],
        selected: usize,
        marked: &'a ComparisonState,
        theme: &'a Theme,
    ) -> Self {
        CountryList {
            countries,
            selected,
            marked,
            theme,
        }
    }

    pub fn render(&self, frame: &mut Frame, area: Rect, focused: bool) {
        let items: Vec<ListItem> = self
            .countries
            .iter()
            .map(|c| {
                let (prefix, style) = if self.marked.is_marked(&c.code) {
                    ("● ", Style::default().fg(self.theme.marked))
                } else {
                    ("  ", self.theme.normal_style())
                };
                ListItem::new(Line::from(vec![
                    Span::styled(prefix, style),
                    Span::styled(c.name.clone(), style),
                    Span::styled(format!(" {}", c.code), self.theme.dimmed_style()),
                ]))
            })
            .collect();

        let title = if !self.marked.is_empty() {
            format!(" Countries ({}, {} marked) ", self.countries.len(), self.marked.len())
        } else {
            format!(" Countries ({}) ", self.countries.len())
        };

        let list = List::new(items)
            .block(panel_block(title, focused, self.theme))
            .highlight_style(self.theme.highlight_style())
            .highlight_symbol("> ");

        let mut state = ListState::default();
        if !self.countries.is_empty() {
            state.select(Some(self.selected));
        }
        frame.render_stateful_widget(list, area, &mut state);
    }
}

/// Current filter values with the keys that change them
pub struct FilterPanel<'a> {
    filters: &'a DashboardFilters,
    theme: &'a Theme,
}

impl<'a> FilterPanel<'a> {
    pub fn new(filters: &'a DashboardFilters, theme: &'a Theme) -> Self {
        FilterPanel { filters, theme }
    }

    pub fn render(&self, frame: &mut Frame, area: Rect, focused: bool) {
        let f = self.filters;
        let entries = [
            ("[ ]", "Year", f.year_label()),
            ("c", "Continent", f.continent_label().to_string()),
            ("1-4", "Indicator", f.indicator.label().to_string()),
            ("x", "Corr. X", f.corr_x.label().to_string()),
            ("y", "Corr. Y", f.corr_y.label().to_string()),
            ("p", "Policy", f.policy.label().to_string()),
            ("b", "GDP", f.gdp_range.label()),
            ("t", "Top", f.top_n_label()),
            ("m", "Model", f.model.to_string()),
            ("+ -", "Horizon", f.horizon.to_string()),
            ("g", "Forecast", f.forecast_scope.label().to_string()),
        ];

        let lines: Vec<Line> = entries
            .into_iter()
            .map(|(key, name, value)| {
                Line::from(vec![
                    Span::styled(format!("{key:>4} "), self.theme.dimmed_style()),
                    Span::styled(format!("{name:<10}"), self.theme.title_style()),
                    Span::styled(value, self.theme.normal_style()),
                ])
            })
            .collect();

        let paragraph = Paragraph::new(lines)
            .block(panel_block(" Filters ".to_string(), focused, self.theme))
            .style(self.theme.surface_style());
        frame.render_widget(paragraph, area);
    }
}

/// Narrative text under the chart
pub struct InsightPanel<'a> {
    text: &'a str,
    theme: &'a Theme,
}

impl<'a> InsightPanel<'a> {
    pub fn new(text: &'a str, theme: &'a Theme) -> Self {
        InsightPanel { text, theme }
    }

    pub fn render(&self, frame: &mut Frame, area: Rect) {
        let body = if self.text.is_empty() {
            Span::styled("No insight for the current filters", self.theme.dimmed_style())
        } else {
            Span::styled(self.text, self.theme.normal_style())
        };
        let paragraph = Paragraph::new(Line::from(body))
            .block(panel_block(" Insight ".to_string(), false, self.theme))
            .wrap(Wrap { trim: true });
        frame.render_widget(paragraph, area);
    }
}

/// Status bar widget
pub struct StatusBar<'a> {
    rows: usize,
    view: &'a str,
    message: Option<&'a str>,
    error: Option<&'a str>,
    prompt: Option<&'a str>,
    theme: &'a Theme,
}

impl<'a> StatusBar<'a> {
    pub fn new(
        rows: usize,
        view: &'a str,
        message: Option<&'a str>,
        error: Option<&'a str>,
        theme: &'a Theme,
    ) -> Self {
        StatusBar {
            rows,
            view,
            message,
            error,
            prompt: None,
            theme,
        }
    }

    /// Show a question being typed in place of the usual status line
    pub fn prompt(mut self, draft: Option<&'a str>) -> Self {
        self.prompt = draft;
        self
    }

    pub fn render(&self, frame: &mut Frame, area: Rect) {
        if let Some(draft) = self.prompt {
            let line = Line::from(vec![
                Span::styled("Ask: ", self.theme.title_style()),
                Span::styled(format!("{draft}_"), self.theme.normal_style()),
                Span::styled("  [Enter] Answer [Esc] Cancel", self.theme.dimmed_style()),
            ]);
            frame.render_widget(Paragraph::new(line).block(Block::default().borders(Borders::TOP)), area);
            return;
        }

        let line = match (self.error, self.message) {
            (Some(e), _) => Line::from(Span::styled(format!("Error: {e}"), self.theme.error_style())),
            (None, Some(m)) => Line::from(Span::styled(m.to_string(), self.theme.title_style())),
            (None, None) => Line::from(format!(
                "wealth-tui: {} rows | {} | [e] Export report [h] Help [q] Quit",
                self.rows, self.view
            )),
        };

        let paragraph = Paragraph::new(line).block(Block::default().borders(Borders::TOP));
        frame.render_widget(paragraph, area);
    }
}

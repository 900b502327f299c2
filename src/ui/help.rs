//! Help overlay widget showing keyboard shortcuts.

use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
    Frame,
};

use super::theme::Theme;

const DESCRIPTION: &str = "A terminal dashboard for World Bank wealth and health indicators. Compare countries over time, correlate indicators, project trends and export the analysis as a PDF report.";

const SHORTCUTS: [(&str, &[(&str, &str)]); 5] = [
    ("Navigation", &[
        ("j / ↓", "Move down (countries, year, view)"),
        ("k / ↑", "Move up"),
        ("Tab", "Cycle focus between panels"),
        ("Shift+Tab", "Cycle focus backwards"),
        ("v / V", "Next / previous view"),
    ]),
    ("Filters", &[
        ("1-4", "Select indicator"),
        ("[ / ]", "Previous / next year"),
        ("c / C", "Next / previous continent"),
        ("x / y", "Cycle correlation axes"),
        ("p", "Toggle pairwise / complete rows"),
        ("b", "Cycle GDP per capita range"),
        ("t", "Cycle top N richest countries"),
        ("/", "Ask a question (Enter answers)"),
    ]),
    ("Forecast", &[
        ("m", "Toggle linear / polynomial model"),
        ("+ / -", "Move the forecast horizon"),
        ("g", "Cycle global / continent / country"),
    ]),
    ("Comparison", &[
        ("s", "Mark country for comparison"),
        ("S", "Clear all comparisons"),
    ]),
    ("General", &[
        ("e", "Export PDF report"),
        ("r", "Reload dataset"),
        ("h / ?", "Toggle this help"),
        ("q", "Quit"),
    ]),
];

/// Help overlay showing all keyboard shortcuts
pub struct HelpOverlay<'a> {
    theme: &'a Theme,
}

impl<'a> HelpOverlay<'a> {
    pub fn new(theme: &'a Theme) -> Self {
        HelpOverlay { theme }
    }

    pub fn render(&self, frame: &mut Frame, area: Rect) {
        let popup_area = centered_rect(65, 85, area);
        frame.render_widget(Clear, popup_area);

        let mut lines: Vec<Line> = vec![
            Line::from(""),
            Line::from(Span::styled(
                format!("  {DESCRIPTION}"),
                Style::default().add_modifier(Modifier::ITALIC),
            )),
            Line::from(""),
        ];

        for (section, items) in SHORTCUTS {
            lines.push(Line::from(Span::styled(
                format!("  {section} "),
                Style::default()
                    .add_modifier(Modifier::BOLD)
                    .add_modifier(Modifier::UNDERLINED),
            )));
            for (key, desc) in items {
                lines.push(Line::from(vec![
                    Span::raw("    "),
                    Span::styled(format!("{key:<14}"), Style::default().fg(self.theme.title)),
                    Span::raw(*desc),
                ]));
            }
            lines.push(Line::from(""));
        }

        let paragraph = Paragraph::new(lines)
            .block(
                Block::default()
                    .title(" wealth-tui Help ")
                    .title_alignment(Alignment::Center)
                    .borders(Borders::ALL)
                    .border_style(self.theme.border_style())
                    .title_style(self.theme.title_style())
                    .style(self.theme.surface_style()),
            )
            .alignment(Alignment::Left)
            .wrap(Wrap { trim: false })
            .style(self.theme.surface_style());

        frame.render_widget(paragraph, popup_area);
    }
}

/// Create a centered rect for popup dialogs
fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let [_, middle, _] = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .areas(area);

    let [_, center, _] = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .areas(middle);
    center
}

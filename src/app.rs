//! Main application logic and TUI event loop.

use std::io;
use std::time::Duration;

use anyhow::{Context, Result};
use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout},
    Terminal,
};
use tracing::{error, info};

use crate::cli::AppConfig;
use crate::comparison::ComparisonState;
use crate::data::{Continent, Country, Dataset, Indicator, Storage};
use crate::ui::{
    chart::{ChartPanel, IndicatorSelector, ViewTabs},
    widgets::{CountryList, FilterPanel, InsightPanel, StatusBar},
    HelpOverlay, Theme,
};
use crate::views::{build_view, report_builder, DashboardFilters, GdpRange, Selection, View, ViewContent};

/// Which panel is currently focused
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FocusedPanel {
    Countries,
    Filters,
    Chart,
}

impl FocusedPanel {
    fn next(self) -> Self {
        match self {
            FocusedPanel::Countries => FocusedPanel::Filters,
            FocusedPanel::Filters => FocusedPanel::Chart,
            FocusedPanel::Chart => FocusedPanel::Countries,
        }
    }

    fn prev(self) -> Self {
        match self {
            FocusedPanel::Countries => FocusedPanel::Chart,
            FocusedPanel::Filters => FocusedPanel::Countries,
            FocusedPanel::Chart => FocusedPanel::Filters,
        }
    }
}

/// Application state
pub struct App {
    // Configuration
    config: AppConfig,
    theme: Theme,

    // Data
    storage: Storage,
    dataset: Dataset,
    countries: Vec<Country>,
    continents: Vec<Continent>,
    years: Vec<i32>,

    // Comparison state
    comparison: ComparisonState,

    // UI State
    filters: DashboardFilters,
    view: View,
    focused: FocusedPanel,
    selected_country: usize,
    show_help: bool,
    /// Question being typed, `Some` while the prompt is open
    question_draft: Option<String>,

    // Exit flag
    should_quit: bool,

    // Last action outcome shown in the status bar
    status_message: Option<String>,
    error_message: Option<String>,
}

impl App {
    /// Create a new App instance from the stored dataset
    pub fn new(config: AppConfig) -> Result<Self> {
        let storage = Storage::new(config.data_dir.clone());
        let dataset = storage
            .read()
            .with_context(|| format!("Failed to load {}", storage.dataset_path().display()))?;
        Ok(App::with_dataset(config, storage, dataset))
    }

    fn with_dataset(config: AppConfig, storage: Storage, dataset: Dataset) -> Self {
        let mut app = App {
            config,
            theme: Theme::default(),
            storage,
            dataset: Dataset::default(),
            countries: Vec::new(),
            continents: Vec::new(),
            years: Vec::new(),
            comparison: ComparisonState::new(),
            filters: DashboardFilters::default(),
            view: View::Trend,
            focused: FocusedPanel::Countries,
            selected_country: 0,
            show_help: false,
            question_draft: None,
            should_quit: false,
            status_message: None,
            error_message: None,
        };
        app.set_dataset(dataset);

        if let Some(year) = app.config.year {
            if app.years.contains(&year) {
                app.filters.year = Some(year);
            } else {
                app.set_error(format!("Year {year} is not in the dataset"));
            }
        }
        if let Some(code) = app.config.country.clone() {
            match app.countries.iter().position(|c| c.code == code) {
                Some(idx) => app.selected_country = idx,
                None => app.set_error(format!("Country {code} is not in the dataset")),
            }
        }
        let range = GdpRange {
            min: app.config.gdp_min,
            max: app.config.gdp_max,
        };
        match (range.min, range.max) {
            (Some(lo), Some(hi)) if lo > hi => {
                app.set_error(format!("GDP range is inverted: {lo} > {hi}"));
            }
            _ => app.filters.gdp_range = range,
        }
        app.filters.top_n = app.config.top_n.filter(|&n| n > 0);
        app
    }

    /// Swap in a dataset, keeping selections that still make sense
    fn set_dataset(&mut self, dataset: Dataset) {
        let previous = self.selected().map(|c| c.code.clone());

        self.countries = dataset.countries();
        self.continents = dataset.continents();
        self.years = dataset.years();
        self.dataset = dataset;

        self.selected_country = previous
            .and_then(|code| self.countries.iter().position(|c| c.code == code))
            .unwrap_or(0)
            .min(self.countries.len().saturating_sub(1));
        self.comparison
            .retain_known(self.countries.iter().map(|c| c.code.as_str()));
        if self.filters.year.is_some_and(|y| !self.years.contains(&y)) {
            self.filters.year = None;
        }
        if self.filters.continent.is_some_and(|c| !self.continents.contains(&c)) {
            self.filters.continent = None;
        }
    }

    /// Re-read the dataset file, keeping the current one on failure
    fn reload(&mut self) -> Result<()> {
        self.error_message = None;
        let dataset = self.storage.read().context("Failed to reload dataset")?;
        info!(rows = dataset.len(), "Reloaded dataset");
        self.set_dataset(dataset);
        self.status_message = Some(format!("Reloaded {} rows", self.dataset.len()));
        Ok(())
    }

    /// Set an error message to display (non-fatal)
    pub fn set_error(&mut self, message: String) {
        self.status_message = None;
        self.error_message = Some(message);
    }

    fn selected(&self) -> Option<&Country> {
        self.countries.get(self.selected_country)
    }

    fn overlay_countries(&self) -> Vec<&Country> {
        let selected = self.selected().map(|c| c.code.as_str());
        self.comparison
            .overlay_codes(selected)
            .filter_map(|code| self.countries.iter().find(|c| c.code == code))
            .collect()
    }

    fn current_content(&self) -> ViewContent {
        let overlays = self.overlay_countries();
        let selection = Selection {
            country: self.selected(),
            overlays: &overlays,
        };
        build_view(self.view, &self.dataset, &self.filters, selection)
    }

    /// Build the PDF report for the current filters and write it out
    fn export_report(&mut self) {
        let path = self.config.report_path.clone();
        let builder = {
            let overlays = self.overlay_countries();
            let selection = Selection {
                country: self.selected(),
                overlays: &overlays,
            };
            report_builder(&self.dataset, &self.filters, selection)
        };
        if builder.is_empty() {
            self.set_error("report generation failed: no section could be computed".to_string());
            return;
        }

        match builder.build().and_then(|document| document.save(&path)) {
            Ok(()) => {
                self.error_message = None;
                self.status_message = Some(format!(
                    "Report written to {} ({} sections)",
                    path.display(),
                    builder.len()
                ));
            }
            Err(e) => {
                error!(error = %e, "Report export failed");
                self.set_error(format!("report generation failed: {e}"));
            }
        }
    }

    /// Handle keyboard input
    fn handle_input(&mut self, key: KeyCode, _modifiers: KeyModifiers) -> Result<()> {
        // The question prompt captures every key until it is closed
        if self.question_draft.is_some() {
            self.handle_question_input(key);
            return Ok(());
        }

        // Global shortcuts
        match key {
            KeyCode::Char('q') => {
                self.should_quit = true;
                return Ok(());
            }
            KeyCode::Char('?') | KeyCode::Char('h') | KeyCode::F(1) => {
                self.show_help = !self.show_help;
                return Ok(());
            }
            KeyCode::Esc if self.show_help => {
                self.show_help = false;
                return Ok(());
            }
            KeyCode::Char('r') => {
                self.reload()?;
                return Ok(());
            }
            KeyCode::Tab => {
                self.focused = self.focused.next();
                return Ok(());
            }
            KeyCode::BackTab => {
                self.focused = self.focused.prev();
                return Ok(());
            }
            _ => {}
        }

        // If help is shown, don't process other keys
        if self.show_help {
            return Ok(());
        }

        // Indicator selection with number keys
        if let KeyCode::Char(c) = key {
            if let Some(n) = c.to_digit(10) {
                if let Some(indicator) = (n as usize).checked_sub(1).and_then(|i| Indicator::ALL.get(i).copied()) {
                    self.filters.indicator = indicator;
                    return Ok(());
                }
            }
        }

        match key {
            KeyCode::Char('v') => self.view = self.view.next(),
            KeyCode::Char('V') => self.view = self.view.prev(),
            KeyCode::Char(']') => self.filters.step_year(&self.years, true),
            KeyCode::Char('[') => self.filters.step_year(&self.years, false),
            KeyCode::Char('c') => self.filters.step_continent(&self.continents, true),
            KeyCode::Char('C') => self.filters.step_continent(&self.continents, false),
            KeyCode::Char('b') => self.filters.step_gdp_range(),
            KeyCode::Char('t') => self.filters.step_top_n(),
            KeyCode::Char('p') => self.filters.policy = self.filters.policy.toggle(),
            KeyCode::Char('/') => self.question_draft = Some(self.filters.question.clone()),
            KeyCode::Char('x') => self.filters.next_corr_x(),
            KeyCode::Char('y') => self.filters.next_corr_y(),
            KeyCode::Char('m') => self.filters.model = self.filters.model.toggle(),
            KeyCode::Char('+') | KeyCode::Char('=') => self.filters.shift_horizon(1),
            KeyCode::Char('-') => self.filters.shift_horizon(-1),
            KeyCode::Char('g') => self.filters.forecast_scope = self.filters.forecast_scope.next(),
            KeyCode::Char('e') => self.export_report(),
            KeyCode::Char('S') => {
                // Shift+S: clear all comparison marks
                self.comparison.clear();
            }
            KeyCode::Char('s') => {
                if let Some(code) = self.selected().map(|c| c.code.clone()) {
                    self.comparison.toggle(&code);
                }
            }
            _ => match self.focused {
                FocusedPanel::Countries => self.handle_country_navigation(key),
                FocusedPanel::Filters => self.handle_filter_navigation(key),
                FocusedPanel::Chart => self.handle_chart_navigation(key),
            },
        }

        Ok(())
    }

    fn handle_question_input(&mut self, key: KeyCode) {
        let Some(draft) = self.question_draft.as_mut() else {
            return;
        };
        match key {
            KeyCode::Char(c) => draft.push(c),
            KeyCode::Backspace => {
                draft.pop();
            }
            KeyCode::Enter => {
                if let Some(question) = self.question_draft.take() {
                    self.filters.question = question.trim().to_string();
                    self.view = View::Ask;
                }
            }
            KeyCode::Esc => self.question_draft = None,
            _ => {}
        }
    }

    fn handle_country_navigation(&mut self, key: KeyCode) {
        if self.countries.is_empty() {
            return;
        }
        match key {
            KeyCode::Down | KeyCode::Char('j') => {
                self.selected_country = (self.selected_country + 1) % self.countries.len();
            }
            KeyCode::Up | KeyCode::Char('k') => {
                self.selected_country = self
                    .selected_country
                    .checked_sub(1)
                    .unwrap_or(self.countries.len() - 1);
            }
            KeyCode::Enter | KeyCode::Char('l') => {
                self.focused = FocusedPanel::Chart;
            }
            _ => {}
        }
    }

    fn handle_filter_navigation(&mut self, key: KeyCode) {
        match key {
            KeyCode::Down | KeyCode::Char('j') => self.filters.step_year(&self.years, true),
            KeyCode::Up | KeyCode::Char('k') => self.filters.step_year(&self.years, false),
            KeyCode::Right | KeyCode::Char('l') => self.filters.step_continent(&self.continents, true),
            KeyCode::Left => self.filters.step_continent(&self.continents, false),
            KeyCode::Esc => self.focused = FocusedPanel::Countries,
            _ => {}
        }
    }

    fn handle_chart_navigation(&mut self, key: KeyCode) {
        match key {
            KeyCode::Down | KeyCode::Char('j') | KeyCode::Right | KeyCode::Char('l') => {
                self.view = self.view.next();
            }
            KeyCode::Up | KeyCode::Char('k') | KeyCode::Left => {
                self.view = self.view.prev();
            }
            KeyCode::Esc => self.focused = FocusedPanel::Countries,
            _ => {}
        }
    }

    /// Render the UI
    fn render(&self, frame: &mut ratatui::Frame) {
        let size = frame.area();

        let [body, footer] = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Min(3),    // Body
                Constraint::Length(2), // Status bar
            ])
            .areas(size);

        let [sidebar, content] = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([
                Constraint::Length(32), // Sidebar
                Constraint::Min(40),    // Content
            ])
            .areas(body);

        let [country_area, filter_area] = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Min(5), Constraint::Length(14)])
            .areas(sidebar);

        let [tabs_area, chart_area, insight_area, selector_area] = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(1), // View tabs
                Constraint::Min(10),   // Chart
                Constraint::Length(7), // Insight
                Constraint::Length(1), // Indicator selector
            ])
            .areas(content);

        CountryList::new(&self.countries, self.selected_country, &self.comparison, &self.theme)
            .render(frame, country_area, self.focused == FocusedPanel::Countries);
        FilterPanel::new(&self.filters, &self.theme)
            .render(frame, filter_area, self.focused == FocusedPanel::Filters);

        ViewTabs::new(self.view, &self.theme).render(frame, tabs_area);

        let content = self.current_content();
        let title = format!(
            "{} | {} | {}",
            self.view.label(),
            self.filters.year_label(),
            self.filters.continent_label()
        );
        ChartPanel::new(&content.panel, &title, &self.theme)
            .render(frame, chart_area, self.focused == FocusedPanel::Chart);
        InsightPanel::new(&content.insight, &self.theme).render(frame, insight_area);
        IndicatorSelector::new(self.filters.indicator, &self.theme).render(frame, selector_area);

        StatusBar::new(
            self.dataset.len(),
            self.view.label(),
            self.status_message.as_deref(),
            self.error_message.as_deref(),
            &self.theme,
        )
        .prompt(self.question_draft.as_deref())
        .render(frame, footer);

        if self.show_help {
            HelpOverlay::new(&self.theme).render(frame, size);
        }
    }
}

/// Restore terminal to normal state
fn restore_terminal() {
    // Best effort cleanup - ignore errors since we may be in a panic
    let _ = disable_raw_mode();
    let _ = execute!(io::stdout(), LeaveAlternateScreen, DisableMouseCapture);
}

/// Run the TUI application
pub fn run(config: AppConfig) -> Result<()> {
    let storage = Storage::new(config.data_dir.clone());
    if !storage.exists() {
        eprintln!("No dataset found at: {}", storage.dataset_path().display());
        eprintln!("Run `wealth-tui refresh` first, or point --data-dir at an existing dataset");
        return Ok(());
    }

    // Load before touching the terminal so errors print normally
    let mut app = App::new(config).context("Failed to initialize application")?;

    enable_raw_mode().context("Failed to enable raw mode")?;
    let mut stdout = io::stdout();
    if let Err(e) = execute!(stdout, EnterAlternateScreen, EnableMouseCapture) {
        restore_terminal();
        return Err(e).context("Failed to setup terminal");
    }
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = match Terminal::new(backend) {
        Ok(t) => t,
        Err(e) => {
            restore_terminal();
            return Err(e).context("Failed to create terminal");
        }
    };

    let result = run_main_loop(&mut terminal, &mut app);

    // Always restore terminal, regardless of result
    restore_terminal();
    terminal.show_cursor().ok();

    result
}

/// Main application loop
fn run_main_loop(terminal: &mut Terminal<CrosstermBackend<io::Stdout>>, app: &mut App) -> Result<()> {
    loop {
        terminal.draw(|f| app.render(f))?;

        if event::poll(Duration::from_millis(250))? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    if let Err(e) = app.handle_input(key.code, key.modifiers) {
                        error!(error = %e, "Input handling failed");
                        app.set_error(format!("{e:#}"));
                    }
                }
            }
        }

        if app.should_quit {
            return Ok(());
        }
    }
}

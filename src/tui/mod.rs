//! Ratatui-based terminal dashboard.
//!
//! The TUI shows the merged price series, the derived indicators and alerts,
//! and a scenario editor for what-if runs. Network calls (FX refresh and
//! forecast requests) happen on worker threads and report back over a
//! channel, so the event loop never blocks; each forecast response carries
//! the ticket it was issued with and is folded through
//! `DashboardState::apply_snapshot`, which discards superseded responses.

use std::io;
use std::sync::mpsc::{Receiver, Sender};
use std::time::Duration;

use chrono::Local;
use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Clear, List, ListItem, Paragraph},
    Terminal,
};

use crate::app::state::{DashboardState, RequestTicket, SnapshotOutcome};
use crate::cli::RunArgs;
use crate::data::{ForecastClient, FxClient};
use crate::domain::{AlertLevel, MarketSnapshot, ScenarioField, ScenarioPatch, ScenarioStore};
use crate::error::AppError;

mod plotters_chart;

use plotters_chart::PricePlottersChart;

/// Start the TUI.
pub fn run(args: RunArgs) -> Result<(), AppError> {
    let _guard = TerminalGuard::new()?;

    let backend = CrosstermBackend::new(io::stdout());
    let mut terminal = Terminal::new(backend)
        .map_err(|e| AppError::new(4, format!("Failed to initialize terminal: {e}")))?;

    let mut app = App::new(args)?;
    app.event_loop(&mut terminal)
}

/// Ensures the terminal is restored (raw mode, alternate screen) on exit.
struct TerminalGuard;

impl TerminalGuard {
    fn new() -> Result<Self, AppError> {
        enable_raw_mode().map_err(|e| AppError::new(4, format!("Failed to enable raw mode: {e}")))?;
        if let Err(e) = execute!(io::stdout(), EnterAlternateScreen) {
            let _ = disable_raw_mode();
            return Err(AppError::new(4, format!("Failed to enter alternate screen: {e}")));
        }
        Ok(Self)
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen);
    }
}

/// Messages from worker threads back to the event loop.
enum WorkerMsg {
    Fx(Result<f64, AppError>),
    Forecast(RequestTicket, Result<MarketSnapshot, AppError>),
}

struct App {
    state: DashboardState,
    client: ForecastClient,
    tx: Sender<WorkerMsg>,
    rx: Receiver<WorkerMsg>,
    selected_field: usize,
    editing: bool,
    edit_input: String,
    what_if: bool,
    pending: ScenarioPatch,
    status: String,
}

impl App {
    fn new(args: RunArgs) -> Result<Self, AppError> {
        let mut store = ScenarioStore::default();
        store.apply(&args.scenario_patch())?;

        let client = match &args.api_url {
            Some(url) => ForecastClient::with_url(url.clone()),
            None => ForecastClient::from_env(),
        };

        let (tx, rx) = std::sync::mpsc::channel();
        let mut app = Self {
            state: DashboardState::new(store),
            client,
            tx,
            rx,
            selected_field: 0,
            editing: false,
            edit_input: String::new(),
            what_if: false,
            pending: ScenarioPatch::new(),
            status: "Requesting forecast...".to_string(),
        };

        // One-time startup FX refresh; a success triggers a fresh forecast
        // via the message handler. Failures stay silent by design.
        if !args.no_fx {
            app.spawn_fx_fetch();
        }
        app.spawn_forecast();
        Ok(app)
    }

    fn spawn_fx_fetch(&self) {
        let tx = self.tx.clone();
        std::thread::spawn(move || {
            let result = FxClient::from_env().fetch_usd_lkr();
            let _ = tx.send(WorkerMsg::Fx(result));
        });
    }

    /// Issue a forecast request on a worker thread.
    ///
    /// With pending what-if overrides, the submitted scenario is the transient
    /// merged view; the baseline store stays untouched either way.
    fn spawn_forecast(&mut self) {
        let scenario = if self.pending.is_empty() {
            self.state.store.get().clone()
        } else {
            match self.state.store.with_override(&self.pending) {
                Ok(view) => view,
                Err(err) => {
                    self.status = format!("What-if run rejected: {err}");
                    return;
                }
            }
        };

        let ticket = self.state.issue_request();
        let client = self.client.clone();
        let tx = self.tx.clone();
        std::thread::spawn(move || {
            let result = client.fetch_snapshot(&scenario);
            let _ = tx.send(WorkerMsg::Forecast(ticket, result));
        });
    }

    fn event_loop<B: ratatui::backend::Backend>(&mut self, terminal: &mut Terminal<B>) -> Result<(), AppError> {
        let mut needs_redraw = true;
        loop {
            if needs_redraw {
                terminal
                    .draw(|f| self.draw(f))
                    .map_err(|e| AppError::new(4, format!("Terminal draw error: {e}")))?;
                needs_redraw = false;
            }

            while let Ok(msg) = self.rx.try_recv() {
                self.handle_worker_msg(msg);
                needs_redraw = true;
            }

            if !event::poll(Duration::from_millis(100))
                .map_err(|e| AppError::new(4, format!("Event poll error: {e}")))? {
                continue;
            }

            match event::read().map_err(|e| AppError::new(4, format!("Event read error: {e}")))? {
                Event::Key(key) => {
                    if key.kind != KeyEventKind::Press {
                        continue;
                    }
                    if self.handle_key(key.code)? {
                        break;
                    }
                    needs_redraw = true;
                }
                Event::Resize(_, _) => {
                    needs_redraw = true;
                }
                _ => {}
            }
        }
        Ok(())
    }

    fn handle_worker_msg(&mut self, msg: WorkerMsg) {
        match msg {
            WorkerMsg::Fx(Ok(rate)) => {
                if self.state.apply_fx_rate(rate).is_ok() {
                    self.status = format!("FX refreshed: {:.0} LKR/USD", self.state.store.get().fx_lkr_per_usd_m);
                    // The rate drives the model; refetch with the new value.
                    self.spawn_forecast();
                }
            }
            WorkerMsg::Fx(Err(_)) => {
                // Best-effort refresh: keep the old rate, say nothing.
            }
            WorkerMsg::Forecast(ticket, result) => {
                match self.state.apply_snapshot(ticket, result) {
                    SnapshotOutcome::Applied => {
                        self.status = format!("Updated {}", Local::now().format("%H:%M:%S"));
                    }
                    SnapshotOutcome::Superseded => {
                        // Expected when requests overlap; nothing to report.
                    }
                    SnapshotOutcome::Failed => {
                        let err = self.state.last_error.as_deref().unwrap_or("unknown error");
                        self.status = format!("{err} Press f to retry.");
                    }
                }
            }
        }
    }

    fn handle_key(&mut self, code: KeyCode) -> Result<bool, AppError> {
        if self.editing {
            return self.handle_value_edit(code);
        }

        match code {
            KeyCode::Char('q') => return Ok(true),
            KeyCode::Up => {
                if self.selected_field > 0 {
                    self.selected_field -= 1;
                }
            }
            KeyCode::Down => {
                if self.selected_field + 1 < ScenarioField::ALL.len() {
                    self.selected_field += 1;
                }
            }
            KeyCode::Enter => {
                self.editing = true;
                self.edit_input.clear();
                let field = ScenarioField::ALL[self.selected_field];
                self.status = format!(
                    "Editing {} (Enter to apply, Esc to cancel).",
                    field.label()
                );
            }
            KeyCode::Char('f') => {
                self.status = if self.pending.is_empty() {
                    "Requesting forecast...".to_string()
                } else {
                    "Requesting what-if forecast...".to_string()
                };
                self.spawn_forecast();
            }
            KeyCode::Char('w') => {
                self.what_if = !self.what_if;
                self.status = if self.what_if {
                    "What-if mode: edits stay transient until committed (c).".to_string()
                } else {
                    "What-if mode off: edits commit to the baseline.".to_string()
                };
            }
            KeyCode::Char('c') => {
                if self.pending.is_empty() {
                    self.status = "No what-if overrides to commit.".to_string();
                } else {
                    for (field, value) in self.pending.clone().iter() {
                        self.state.edit_field(field, value)?;
                    }
                    self.pending.clear();
                    self.status = "What-if overrides committed to baseline.".to_string();
                }
            }
            KeyCode::Char('x') => {
                self.pending.clear();
                self.status = "What-if overrides cleared.".to_string();
            }
            KeyCode::Char('e') => {
                let path = std::path::PathBuf::from(format!(
                    "bopf_export_{}.csv",
                    Local::now().format("%Y%m%d_%H%M%S")
                ));
                match crate::io::export::write_series_csv(&path, &self.state.series) {
                    Ok(()) => self.status = format!("Wrote {}", path.display()),
                    Err(err) => self.status = format!("Export failed: {err}"),
                }
            }
            _ => {}
        }

        Ok(false)
    }

    fn handle_value_edit(&mut self, code: KeyCode) -> Result<bool, AppError> {
        match code {
            KeyCode::Esc => {
                self.editing = false;
                self.status = "Edit canceled.".to_string();
            }
            KeyCode::Enter => {
                self.editing = false;
                self.apply_value_input();
            }
            KeyCode::Backspace => {
                self.edit_input.pop();
            }
            KeyCode::Char(c) => {
                if c.is_ascii_digit() || c == '.' || c == '-' {
                    self.edit_input.push(c);
                }
            }
            _ => {}
        }
        Ok(false)
    }

    fn apply_value_input(&mut self) {
        let field = ScenarioField::ALL[self.selected_field];
        let trimmed = self.edit_input.trim();
        let value = match trimmed.parse::<f64>() {
            Ok(v) => v,
            Err(_) => {
                self.status = format!("Invalid number '{trimmed}' for {}.", field.label());
                return;
            }
        };

        if self.what_if {
            // Validate against the baseline before keeping the override.
            let mut candidate = self.pending.clone();
            candidate.set(field, value);
            match self.state.store.with_override(&candidate) {
                Ok(_) => {
                    self.pending = candidate;
                    self.status = format!("{} -> {value} (what-if).", field.label());
                }
                Err(err) => self.status = err.to_string(),
            }
        } else {
            match self.state.edit_field(field, value) {
                Ok(()) => self.status = format!("{} -> {value}.", field.label()),
                Err(err) => self.status = err.to_string(),
            }
        }
    }

    fn draw(&mut self, frame: &mut ratatui::Frame<'_>) {
        let size = frame.area();
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(5),
                Constraint::Min(0),
                Constraint::Length(3),
            ])
            .split(size);

        self.draw_header(frame, chunks[0]);
        self.draw_body(frame, chunks[1]);
        self.draw_footer(frame, chunks[2]);
    }

    fn draw_header(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let scenario = self.state.store.get();
        let mut lines: Vec<Line> = Vec::new();
        lines.push(Line::from(vec![
            Span::styled("bopf", Style::default().fg(Color::Cyan)),
            Span::raw(" - Mid-Country BOPF tea auction dashboard"),
        ]));

        let updated = self
            .state
            .last_updated
            .map(|t| t.format("%Y-%m-%d %H:%M:%S").to_string())
            .unwrap_or_else(|| "-".to_string());
        let loading = if self.state.is_loading() { " | fetching..." } else { "" };
        let what_if = if self.what_if { " | what-if" } else { "" };

        lines.push(Line::from(Span::styled(
            format!(
                "fx: {:.0} LKR/USD | month: {} | updated: {updated}{what_if}{loading}",
                scenario.fx_lkr_per_usd_m, scenario.month,
            ),
            Style::default().fg(Color::Gray),
        )));

        if let Some(err) = &self.state.last_error {
            lines.push(Line::from(Span::styled(
                err.clone(),
                Style::default().fg(Color::Red),
            )));
        } else if let Some(forecast) = &self.state.forecast {
            lines.push(Line::from(Span::styled(
                format!(
                    "forecast: {} ({}) for {}",
                    crate::report::currency(Some(forecast.price_lkr)),
                    forecast.confidence,
                    forecast.date,
                ),
                Style::default().fg(Color::Gray),
            )));
        }

        let p = Paragraph::new(Text::from(lines)).block(Block::default().borders(Borders::ALL));
        frame.render_widget(p, area);
    }

    fn draw_body(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Min(0),
                Constraint::Length(7),
                Constraint::Length(9),
            ])
            .split(area);

        self.draw_chart(frame, chunks[0]);
        self.draw_metrics(frame, chunks[1]);
        self.draw_scenario(frame, chunks[2]);
    }

    fn draw_chart(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let block = Block::default()
            .title("Price (actual vs forecast), LKR/kg")
            .borders(Borders::ALL);
        let inner = block.inner(area);
        frame.render_widget(block, area);
        frame.render_widget(Clear, inner);

        if self.state.series.is_empty() {
            let msg = Paragraph::new("Waiting for data...")
                .style(Style::default().fg(Color::Yellow))
                .block(Block::default());
            frame.render_widget(msg, inner);
            return;
        }

        let (actual, forecast, lower, upper, x_bounds, y_bounds) = chart_series(&self.state);
        let widget = PricePlottersChart {
            actual: &actual,
            forecast: &forecast,
            lower: &lower,
            upper: &upper,
            x_bounds,
            y_bounds,
            x_label: "auction week",
            y_label: "LKR/kg".to_string(),
            fmt_x: fmt_axis_x,
            fmt_y: fmt_axis_y,
        };
        frame.render_widget(widget, inner);
    }

    fn draw_metrics(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let chunks = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
            .split(area);

        let ind = &self.state.indicators;
        let indicator_lines = vec![
            Line::from(format!("Trend (4w):      {}", crate::report::pct(ind.trend_change_pct))),
            Line::from(format!("Volatility:      {}", crate::report::num(ind.volatility))),
            Line::from(format!("Spread vs Kenya: {}", crate::report::currency(ind.spread_vs_kenya))),
            Line::from(format!("Spread vs India: {}", crate::report::currency(ind.spread_vs_india))),
            Line::from(format!("Field pressure:  {}/100", ind.field_pressure)),
        ];
        let p = Paragraph::new(Text::from(indicator_lines))
            .block(Block::default().title("Indicators").borders(Borders::ALL));
        frame.render_widget(p, chunks[0]);

        let alert_lines: Vec<Line> = self
            .state
            .alerts
            .iter()
            .map(|a| {
                let color = match a.level {
                    AlertLevel::Warning => Color::Yellow,
                    AlertLevel::AllClear => Color::Green,
                };
                Line::from(Span::styled(a.message.clone(), Style::default().fg(color)))
            })
            .collect();
        let p = Paragraph::new(Text::from(alert_lines))
            .block(Block::default().title("Alerts").borders(Borders::ALL));
        frame.render_widget(p, chunks[1]);
    }

    fn draw_scenario(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let scenario = self.state.store.get();
        let items: Vec<ListItem> = ScenarioField::ALL
            .iter()
            .map(|&field| {
                let base = field.get(scenario);
                let text = match self.pending.get(field) {
                    Some(over) => format!("{}: {base} -> {over}", field.label()),
                    None => format!("{}: {base}", field.label()),
                };
                ListItem::new(text)
            })
            .collect();

        let list = List::new(items)
            .block(Block::default().title("Scenario").borders(Borders::ALL))
            .highlight_style(Style::default().fg(Color::Black).bg(Color::White))
            .highlight_symbol("» ");

        let mut list_state = ratatui::widgets::ListState::default();
        list_state.select(Some(self.selected_field));
        frame.render_stateful_widget(list, area, &mut list_state);

        if self.editing {
            let field = ScenarioField::ALL[self.selected_field];
            let hint = Paragraph::new(format!("{}: {}_", field.label(), self.edit_input))
                .style(Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD));
            let rect = Rect {
                x: area.x + 2,
                y: area.y + area.height.saturating_sub(2),
                width: area.width.saturating_sub(4),
                height: 1,
            };
            frame.render_widget(hint, rect);
        }
    }

    fn draw_footer(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let help = "↑/↓ select  Enter edit  f forecast  w what-if  c commit  x clear  e export  q quit";
        let line = Line::from(vec![
            Span::styled(help, Style::default().fg(Color::Gray)),
            Span::raw(" | "),
            Span::styled(&self.status, Style::default().fg(Color::Yellow)),
        ]);
        let p = Paragraph::new(line).block(Block::default().borders(Borders::ALL));
        frame.render_widget(p, area);
    }
}

/// Build chart series for Plotters (x = row index within the merged series).
fn chart_series(
    state: &DashboardState,
) -> (
    Vec<(f64, f64)>,
    Vec<(f64, f64)>,
    Vec<(f64, f64)>,
    Vec<(f64, f64)>,
    [f64; 2],
    [f64; 2],
) {
    let rows = &state.series;

    let mut actual = Vec::new();
    let mut forecast = Vec::new();
    let mut lower = Vec::new();
    let mut upper = Vec::new();

    for (i, row) in rows.iter().enumerate() {
        let x = i as f64;
        if let Some(y) = row.actual {
            actual.push((x, y));
        }
        if let Some(y) = row.predicted {
            // Bridge from the last actual so the forecast reads as a
            // continuation of the series rather than a floating dot.
            if let Some(&(px, py)) = actual.last() {
                forecast.push((px, py));
            }
            forecast.push((x, y));

            // Short horizontal ticks for the confidence bounds.
            if let Some(b) = row.lower {
                lower.push((x - 0.4, b));
                lower.push((x + 0.4, b));
            }
            if let Some(b) = row.upper {
                upper.push((x - 0.4, b));
                upper.push((x + 0.4, b));
            }
        }
    }

    let x_bounds = [0.0, (rows.len().saturating_sub(1)).max(1) as f64];

    let (mut y_min, mut y_max) = (f64::INFINITY, f64::NEG_INFINITY);
    for series in [&actual, &forecast, &lower, &upper] {
        for &(_, y) in series.iter() {
            y_min = y_min.min(y);
            y_max = y_max.max(y);
        }
    }
    if !y_min.is_finite() || !y_max.is_finite() || y_max <= y_min {
        y_min = 0.0;
        y_max = 1.0;
    }
    let pad = ((y_max - y_min).abs() * 0.05).max(1e-12);
    let y_bounds = [y_min - pad, y_max + pad];

    (actual, forecast, lower, upper, x_bounds, y_bounds)
}

fn fmt_axis_x(v: f64) -> String {
    format!("{v:.0}")
}

fn fmt_axis_y(v: f64) -> String {
    format!("{v:.0}")
}

//! Ratatui-based terminal dashboard.
//!
//! The dashboard shows gauges for the latest stress, spread, and repo
//! probabilities, a probability trend chart, a spread chart with its
//! `mean ± 2 sd` band, a table of recent readings, and a settings panel for
//! the tail sensitivity `k`, the lookback window, and the repo signal.
//!
//! Fetches run on a background worker (see `worker`); scoring a fetched
//! snapshot is cheap and happens on the UI thread, so changing `k` or the repo
//! signal re-scores immediately without refetching.

use std::io;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{
    Terminal,
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Cell, Clear, Gauge, List, ListItem, ListState, Paragraph, Row, Table},
};
use tracing::{info, warn};

use crate::app::pipeline::{RunOutput, Snapshot, run_with_snapshot};
use crate::data::SeriesSource;
use crate::domain::{MAX_LOOKBACK_DAYS, MIN_LOOKBACK_DAYS, ScorePoint, StressConfig};
use crate::error::{AppError, EXIT_DATA};
use crate::score::{RiskBand, classify};

mod plotters_chart;
mod worker;

use plotters_chart::{BAND_SIGMAS, SpreadChart, StressChart};
use worker::RefreshWorker;

/// Lookback steps offered by `←/→` on the lookback field.
const LOOKBACK_PRESETS: [u32; 7] = [30, 90, 180, 365, 730, 1825, 3650];
const K_STEP: f64 = 0.25;
const K_MIN: f64 = 0.25;
const K_MAX: f64 = 10.0;
const SETTINGS_FIELDS: usize = 3;

/// Start the dashboard.
pub fn run(config: StressConfig, source: Arc<dyn SeriesSource>, refresh_secs: Option<u64>) -> Result<(), AppError> {
    let refresh_every = refresh_secs.filter(|s| *s > 0).map(Duration::from_secs);
    let mut app = App::new(config, source, refresh_every)?;

    let _guard = TerminalGuard::new()?;
    let backend = CrosstermBackend::new(io::stdout());
    let mut terminal = Terminal::new(backend)
        .map_err(|e| AppError::new(EXIT_DATA, format!("Failed to initialize terminal: {e}")))?;

    app.event_loop(&mut terminal)
}

/// Ensures the terminal is restored (raw mode, alternate screen) on exit.
struct TerminalGuard;

impl TerminalGuard {
    fn new() -> Result<Self, AppError> {
        enable_raw_mode().map_err(|e| AppError::new(EXIT_DATA, format!("Failed to enable raw mode: {e}")))?;
        if let Err(e) = execute!(io::stdout(), EnterAlternateScreen) {
            let _ = disable_raw_mode();
            return Err(AppError::new(EXIT_DATA, format!("Failed to enter alternate screen: {e}")));
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

struct App {
    config: StressConfig,
    selected_field: usize,
    status: String,
    worker: RefreshWorker,
    refresh_every: Option<Duration>,
    last_request: Instant,
    snapshot: Option<Snapshot>,
    run: Option<RunOutput>,
    stress_chart: StressChart,
    spread_chart: SpreadChart,
}

impl App {
    fn new(config: StressConfig, source: Arc<dyn SeriesSource>, refresh_every: Option<Duration>) -> Result<Self, AppError> {
        let worker = RefreshWorker::spawn(source)?;
        let mut app = Self {
            config,
            selected_field: 0,
            status: String::new(),
            worker,
            refresh_every,
            last_request: Instant::now(),
            snapshot: None,
            run: None,
            stress_chart: StressChart::new(),
            spread_chart: SpreadChart::new(),
        };
        app.request_refresh()?;
        Ok(app)
    }

    fn event_loop<B: ratatui::backend::Backend>(&mut self, terminal: &mut Terminal<B>) -> Result<(), AppError> {
        let mut needs_redraw = true;
        loop {
            if self.pump() {
                needs_redraw = true;
            }
            if self.periodic_due() {
                self.request_refresh()?;
                needs_redraw = true;
            }

            if needs_redraw {
                terminal
                    .draw(|f| self.draw(f))
                    .map_err(|e| AppError::new(EXIT_DATA, format!("Terminal draw error: {e}")))?;
                needs_redraw = false;
            }

            if !event::poll(Duration::from_millis(100))
                .map_err(|e| AppError::new(EXIT_DATA, format!("Event poll error: {e}")))?
            {
                continue;
            }

            match event::read().map_err(|e| AppError::new(EXIT_DATA, format!("Event read error: {e}")))? {
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

    fn handle_key(&mut self, code: KeyCode) -> Result<bool, AppError> {
        match code {
            KeyCode::Char('q') | KeyCode::Esc => return Ok(true),
            KeyCode::Up => {
                self.selected_field = self.selected_field.saturating_sub(1);
            }
            KeyCode::Down => {
                if self.selected_field + 1 < SETTINGS_FIELDS {
                    self.selected_field += 1;
                }
            }
            KeyCode::Left => self.adjust_field(-1)?,
            KeyCode::Right => self.adjust_field(1)?,
            KeyCode::Char('+') | KeyCode::Char('=') => self.set_k(step_k(self.config.tail.k, 1)),
            KeyCode::Char('-') => self.set_k(step_k(self.config.tail.k, -1)),
            KeyCode::Char('s') => self.toggle_signal(),
            KeyCode::Char('r') => self.request_refresh()?,
            KeyCode::Char('e') => self.export(),
            _ => {}
        }
        Ok(false)
    }

    fn adjust_field(&mut self, delta: i32) -> Result<(), AppError> {
        match self.selected_field {
            0 => self.set_k(step_k(self.config.tail.k, delta)),
            1 => {
                let next = step_lookback(self.config.lookback_days, delta);
                if next != self.config.lookback_days {
                    self.config.lookback_days = next;
                    // A new window needs new data.
                    self.request_refresh()?;
                }
            }
            2 => self.toggle_signal(),
            _ => {}
        }
        Ok(())
    }

    fn set_k(&mut self, k: f64) {
        if self.retune(|c| c.tail.k = k) {
            self.status = format!("k = {k:.2}");
        }
    }

    fn toggle_signal(&mut self) {
        if self.retune(|c| c.repo_signal = c.repo_signal.next()) {
            self.status = format!("repo signal: {}", self.config.repo_signal.display_name());
        }
    }

    /// Apply a settings change and re-score the current snapshot. On failure
    /// the previous settings are restored so they keep matching what is shown.
    fn retune(&mut self, change: impl FnOnce(&mut StressConfig)) -> bool {
        let previous = self.config.clone();
        change(&mut self.config);
        let Some(snapshot) = self.snapshot.clone() else {
            return true;
        };
        if self.apply_snapshot(snapshot) {
            true
        } else {
            self.config = previous;
            false
        }
    }

    fn request_refresh(&mut self) -> Result<(), AppError> {
        let generation = self.worker.request(&self.config)?;
        self.last_request = Instant::now();
        self.status = format!("Refreshing ({} day lookback)...", self.config.lookback_days);
        info!(generation, lookback = self.config.lookback_days, "refresh requested");
        Ok(())
    }

    fn periodic_due(&self) -> bool {
        match self.refresh_every {
            Some(every) => !self.worker.in_flight() && self.last_request.elapsed() >= every,
            None => false,
        }
    }

    /// Apply a completed fetch, if any. Returns true when state changed.
    fn pump(&mut self) -> bool {
        let Some(result) = self.worker.poll() else {
            return false;
        };
        match result.outcome {
            Ok(snapshot) => {
                let fetched = snapshot.fetched_at.format("%H:%M:%S").to_string();
                if self.apply_snapshot(snapshot) {
                    self.status = format!("Updated at {fetched}");
                }
            }
            Err(err) => {
                warn!(error = %err, "refresh failed");
                self.status = format!("Refresh failed: {err} (showing previous data)");
            }
        }
        true
    }

    /// Score `snapshot` with the current settings. The snapshot, run and charts
    /// are replaced together, and only when scoring succeeds.
    fn apply_snapshot(&mut self, snapshot: Snapshot) -> bool {
        match run_with_snapshot(&self.config, snapshot.clone()) {
            Ok(run) => {
                self.stress_chart.set_data(&run.points);
                self.spread_chart.set_data(&run.features, run.spread_stats);
                self.snapshot = Some(snapshot);
                self.run = Some(run);
                true
            }
            Err(err) => {
                warn!(error = %err, "scoring failed");
                self.status = format!("Scoring failed: {err} (showing previous data)");
                false
            }
        }
    }

    fn export(&mut self) {
        let Some(run) = &self.run else {
            self.status = "Nothing to export yet.".to_string();
            return;
        };
        let csv_path = self
            .config
            .export_csv
            .clone()
            .unwrap_or_else(|| PathBuf::from("fstress-scores.csv"));
        let json_path = self
            .config
            .export_json
            .clone()
            .unwrap_or_else(|| PathBuf::from("fstress-scores.json"));

        let written = crate::io::write_scores_csv(&csv_path, &run.features, &run.points)
            .and_then(|()| crate::io::write_scores_json(&json_path, run, &self.config));
        self.status = match written {
            Ok(()) => format!("Exported {} and {}", csv_path.display(), json_path.display()),
            Err(err) => format!("Export failed: {err}"),
        };
    }

    fn draw(&mut self, frame: &mut ratatui::Frame<'_>) {
        let size = frame.area();
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(4),
                Constraint::Length(3),
                Constraint::Min(0),
                Constraint::Length(3),
            ])
            .split(size);

        self.draw_header(frame, chunks[0]);
        self.draw_gauges(frame, chunks[1]);
        self.draw_body(frame, chunks[2]);
        self.draw_footer(frame, chunks[3]);
    }

    fn draw_header(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let mut lines: Vec<Line> = Vec::new();
        let mut title = vec![
            Span::styled("fstress", Style::default().fg(Color::Cyan)),
            Span::raw(" - funding market stress"),
        ];
        if self.worker.in_flight() {
            title.push(Span::styled("  [refreshing]", Style::default().fg(Color::Yellow)));
        }
        lines.push(Line::from(title));

        match &self.run {
            Some(run) => {
                let snap = &run.snapshot;
                lines.push(Line::from(Span::styled(
                    format!(
                        "{} vs {} | window: {} .. {} | source: {} | latest: {}",
                        snap.secured.id, snap.unsecured.id, snap.start, snap.end, snap.source, run.latest.date,
                    ),
                    Style::default().fg(Color::Gray),
                )));
                if let Some(alert) = &run.alert {
                    lines.push(Line::from(Span::styled(
                        format!("ALERT: {}", alert.message),
                        Style::default().fg(band_color(alert.band)).add_modifier(Modifier::BOLD),
                    )));
                }
            }
            None => lines.push(Line::from(Span::styled(
                "Waiting for data...",
                Style::default().fg(Color::Yellow),
            ))),
        }

        let p = Paragraph::new(Text::from(lines)).block(Block::default().borders(Borders::LEFT | Borders::RIGHT));
        frame.render_widget(p, area);
    }

    fn draw_gauges(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let chunks = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Ratio(1, 3), Constraint::Ratio(1, 3), Constraint::Ratio(1, 3)])
            .split(area);

        let latest = self.run.as_ref().map(|r| r.latest);
        let gauges = [
            ("Stress", latest.map(|p| p.p_stress)),
            ("Spread", latest.map(|p| p.p_spread)),
            ("Repo", latest.map(|p| p.p_repo)),
        ];
        for ((title, p), rect) in gauges.into_iter().zip(chunks.iter()) {
            frame.render_widget(probability_gauge(title, p), *rect);
        }
    }

    fn draw_body(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let columns = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(64), Constraint::Percentage(36)])
            .split(area);
        let charts = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Percentage(55), Constraint::Percentage(45)])
            .split(columns[0]);
        let side = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Min(0), Constraint::Length(SETTINGS_FIELDS as u16 + 4)])
            .split(columns[1]);

        self.draw_stress_chart(frame, charts[0]);
        self.draw_spread_chart(frame, charts[1]);
        self.draw_table(frame, side[0]);
        self.draw_settings(frame, side[1]);
    }

    fn draw_stress_chart(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let block = Block::default()
            .title("Probabilities (stress magenta, spread cyan, repo green)")
            .borders(Borders::ALL);
        let inner = block.inner(area);
        frame.render_widget(block, area);
        frame.render_widget(Clear, inner);

        if self.stress_chart.is_empty() {
            frame.render_widget(waiting(), inner);
            return;
        }
        frame.render_widget(&self.stress_chart, inner);
    }

    fn draw_spread_chart(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let title = match &self.run {
            Some(run) => format!(
                "{}-{} (bp), mean ± {BAND_SIGMAS:.0} sd",
                run.snapshot.secured.id, run.snapshot.unsecured.id
            ),
            None => "Spread (bp)".to_string(),
        };
        let block = Block::default().title(title).borders(Borders::ALL);
        let inner = block.inner(area);
        frame.render_widget(block, area);
        frame.render_widget(Clear, inner);

        if self.spread_chart.is_empty() {
            frame.render_widget(waiting(), inner);
            return;
        }
        frame.render_widget(&self.spread_chart, inner);
    }

    fn draw_table(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let block = Block::default().title("Recent readings").borders(Borders::ALL);
        let Some(run) = &self.run else {
            frame.render_widget(waiting().block(block), area);
            return;
        };

        // Header + borders take three rows.
        let visible = (area.height as usize).saturating_sub(3).min(self.config.top_n.max(1));
        let rows = recent_newest_first(&run.points, visible).map(|p| {
            let band = p.band();
            Row::new(vec![
                Cell::from(p.date.to_string()),
                Cell::from(format!("{:.3}", p.p_stress)),
                Cell::from(format!("{:.3}", p.p_spread)),
                Cell::from(format!("{:.3}", p.p_repo)),
                Cell::from(band.display_name()).style(Style::default().fg(band_color(band))),
            ])
        });

        let header = Row::new(vec!["date", "stress", "spread", "repo", "band"])
            .style(Style::default().fg(Color::Gray).add_modifier(Modifier::BOLD));
        let widths = [
            Constraint::Length(10),
            Constraint::Length(7),
            Constraint::Length(7),
            Constraint::Length(7),
            Constraint::Min(8),
        ];
        let table = Table::new(rows, widths).header(header).block(block);
        frame.render_widget(table, area);
    }

    fn draw_settings(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let items = vec![
            ListItem::new(format!("Tail k: {:.2}", self.config.tail.k)),
            ListItem::new(format!("Lookback: {} days", self.config.lookback_days)),
            ListItem::new(format!("Repo signal: {}", self.config.repo_signal.display_name())),
        ];
        let refresh = match self.refresh_every {
            Some(every) => format!("Settings (auto refresh {}s)", every.as_secs()),
            None => "Settings".to_string(),
        };

        let list = List::new(items)
            .block(Block::default().title(refresh).borders(Borders::ALL))
            .highlight_style(Style::default().fg(Color::Black).bg(Color::White))
            .highlight_symbol("» ");

        let mut state = ListState::default();
        state.select(Some(self.selected_field));
        frame.render_stateful_widget(list, area, &mut state);
    }

    fn draw_footer(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let help = "↑/↓ select  ←/→ adjust  +/- k  s signal  r refresh  e export  q quit";
        let line = Line::from(vec![
            Span::styled(help, Style::default().fg(Color::Gray)),
            Span::raw(" | "),
            Span::styled(&self.status, Style::default().fg(Color::Yellow)),
        ]);
        let p = Paragraph::new(line).block(Block::default().borders(Borders::ALL));
        frame.render_widget(p, area);
    }
}

fn waiting() -> Paragraph<'static> {
    Paragraph::new("Waiting for data...").style(Style::default().fg(Color::Yellow))
}

fn probability_gauge(title: &str, p: Option<f64>) -> Gauge<'_> {
    let block = Block::default().title(title).borders(Borders::ALL);
    match p.filter(|v| v.is_finite()) {
        Some(p) => {
            let band = classify(p);
            Gauge::default()
                .block(block)
                .gauge_style(Style::default().fg(band_color(band)))
                .ratio(p.clamp(0.0, 1.0))
                .label(format!("{:.1}% {}", p * 100.0, band.display_name()))
        }
        None => Gauge::default().block(block).ratio(0.0).label("-"),
    }
}

fn band_color(band: RiskBand) -> Color {
    match band {
        RiskBand::Normal => Color::Green,
        RiskBand::Elevated => Color::Yellow,
        RiskBand::High => Color::Red,
    }
}

fn recent_newest_first(points: &[ScorePoint], n: usize) -> impl Iterator<Item = &ScorePoint> {
    points.iter().rev().take(n)
}

fn step_k(k: f64, delta: i32) -> f64 {
    let next = k + f64::from(delta.signum()) * K_STEP;
    // Snap to the grid so repeated steps do not drift.
    ((next / K_STEP).round() * K_STEP).clamp(K_MIN, K_MAX)
}

fn step_lookback(current: u32, delta: i32) -> u32 {
    let next = if delta >= 0 {
        LOOKBACK_PRESETS.iter().copied().find(|&d| d > current)
    } else {
        LOOKBACK_PRESETS.iter().rev().copied().find(|&d| d < current)
    };
    next.unwrap_or(current).clamp(MIN_LOOKBACK_DAYS, MAX_LOOKBACK_DAYS)
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::data::SampleSource;
    use crate::domain::RepoSignal;

    fn wait_for_data(app: &mut App) {
        let deadline = Instant::now() + Duration::from_secs(10);
        while app.run.is_none() {
            app.pump();
            assert!(Instant::now() < deadline, "no data from worker");
            std::thread::sleep(Duration::from_millis(10));
        }
    }

    fn settle(app: &mut App) {
        let deadline = Instant::now() + Duration::from_secs(10);
        while app.worker.in_flight() {
            app.pump();
            assert!(Instant::now() < deadline, "refresh never settled");
            std::thread::sleep(Duration::from_millis(10));
        }
    }

    #[derive(Clone, Copy)]
    enum Breakage {
        /// Later EFFR fetches share no dates with SOFR.
        Disjoint,
        /// Later EFFR fetches fail outright.
        Error,
    }

    /// Serves scoreable data on the first refresh, then breaks.
    struct BreakingSource {
        unsecured_fetches: AtomicUsize,
        breakage: Breakage,
    }

    impl BreakingSource {
        fn new(breakage: Breakage) -> Self {
            Self {
                unsecured_fetches: AtomicUsize::new(0),
                breakage,
            }
        }
    }

    impl SeriesSource for BreakingSource {
        fn name(&self) -> &str {
            "breaking"
        }

        fn fetch_series(
            &self,
            spec: &crate::domain::SeriesSpec,
            start: chrono::NaiveDate,
            _end: chrono::NaiveDate,
        ) -> Result<crate::domain::Series, AppError> {
            let mut offset = 0;
            if spec.id == "EFFR" && self.unsecured_fetches.fetch_add(1, Ordering::SeqCst) > 0 {
                match self.breakage {
                    Breakage::Disjoint => offset = 1000,
                    Breakage::Error => return Err(AppError::data("upstream unavailable")),
                }
            }
            let obs = (0..20i32)
                .map(|i| {
                    let value = if spec.id == "EFFR" { 5.32 } else { 5.30 + 0.01 * f64::from(i % 3) };
                    let date = start + chrono::Duration::days(i64::from(i) + offset);
                    crate::domain::Observation::new(date, value)
                })
                .collect();
            Ok(crate::domain::Series::new(spec.id.clone(), obs))
        }
    }

    fn spread_only_config() -> StressConfig {
        StressConfig {
            repo: None,
            asof: chrono::NaiveDate::from_ymd_opt(2024, 3, 29),
            ..StressConfig::default()
        }
    }

    fn assert_previous_state_kept(breakage: Breakage) {
        let source = Arc::new(BreakingSource::new(breakage));
        let mut app = App::new(spread_only_config(), source, None).unwrap();
        wait_for_data(&mut app);
        let shown = app.run.as_ref().unwrap().latest;
        let shown_effr_start = app.snapshot.as_ref().unwrap().unsecured.first_date();

        app.handle_key(KeyCode::Char('r')).unwrap();
        settle(&mut app);

        assert!(app.status.contains("showing previous data"), "{}", app.status);
        assert_eq!(app.run.as_ref().unwrap().latest, shown);
        assert_eq!(app.snapshot.as_ref().unwrap().unsecured.first_date(), shown_effr_start);

        // Settings changes still re-score the last good snapshot.
        app.handle_key(KeyCode::Char('-')).unwrap();
        let latest = app.run.as_ref().unwrap().latest;
        assert_eq!(app.status, "k = 2.25");
        assert_eq!(app.run.as_ref().unwrap().snapshot.unsecured.first_date(), shown_effr_start);
        let expected = crate::score::TailModel::with_k(2.25).prob(latest.z_spread);
        assert!((latest.p_spread - expected).abs() < 1e-12);
        assert!(latest.p_spread > shown.p_spread);
    }

    #[test]
    fn unscoreable_refresh_keeps_previous_display() {
        assert_previous_state_kept(Breakage::Disjoint);
    }

    #[test]
    fn failed_fetch_keeps_previous_display() {
        assert_previous_state_kept(Breakage::Error);
    }

    #[test]
    fn k_steps_snap_and_clamp() {
        assert_eq!(step_k(2.5, 1), 2.75);
        assert_eq!(step_k(2.6, -1), 2.25);
        assert_eq!(step_k(K_MIN, -1), K_MIN);
        assert_eq!(step_k(K_MAX, 1), K_MAX);
    }

    #[test]
    fn lookback_walks_presets() {
        assert_eq!(step_lookback(365, 1), 730);
        assert_eq!(step_lookback(365, -1), 180);
        assert_eq!(step_lookback(400, -1), 365);
        assert_eq!(step_lookback(30, -1), 30);
        assert_eq!(step_lookback(4000, 1), 4000);
    }

    #[test]
    fn bands_have_distinct_colors() {
        assert_eq!(band_color(RiskBand::Normal), Color::Green);
        assert_eq!(band_color(RiskBand::Elevated), Color::Yellow);
        assert_eq!(band_color(RiskBand::High), Color::Red);
    }

    #[test]
    fn recent_rows_are_newest_first() {
        let points: Vec<ScorePoint> = (1..=4)
            .map(|d| ScorePoint {
                date: chrono::NaiveDate::from_ymd_opt(2024, 2, d).unwrap(),
                p_stress: 0.0,
                p_spread: 0.0,
                p_repo: 0.0,
                z_spread: 0.0,
                z_repo: None,
            })
            .collect();
        let days: Vec<u32> = recent_newest_first(&points, 2)
            .map(|p| chrono::Datelike::day(&p.date))
            .collect();
        assert_eq!(days, vec![4, 3]);
    }

    #[test]
    fn sensitivity_change_rescores_without_refetch() {
        let mut app = App::new(StressConfig::default(), Arc::new(SampleSource::new(11)), None).unwrap();
        wait_for_data(&mut app);
        let generation = app.worker.latest_generation();
        let before = app.run.as_ref().unwrap().latest;

        app.handle_key(KeyCode::Char('-')).unwrap();
        let after = app.run.as_ref().unwrap().latest;

        assert_eq!(app.config.tail.k, 2.25);
        assert_eq!(app.worker.latest_generation(), generation);
        assert_eq!(after.date, before.date);
        assert_eq!(after.z_spread, before.z_spread);
        // Lower k never lowers a tail probability.
        assert!(after.p_spread >= before.p_spread);
    }

    #[test]
    fn signal_toggle_and_lookback_change() {
        let mut app = App::new(StressConfig::default(), Arc::new(SampleSource::new(5)), None).unwrap();
        wait_for_data(&mut app);

        app.handle_key(KeyCode::Char('s')).unwrap();
        assert_eq!(app.config.repo_signal, RepoSignal::Delta1);

        let generation = app.worker.latest_generation();
        app.selected_field = 1;
        app.handle_key(KeyCode::Right).unwrap();
        assert_eq!(app.config.lookback_days, 730);
        assert_eq!(app.worker.latest_generation(), generation + 1);
        assert!(app.handle_key(KeyCode::Char('q')).unwrap());
    }
}

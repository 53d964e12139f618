//! Plotters-powered chart widgets for Ratatui.
//!
//! Why Plotters instead of Ratatui's built-in `Chart` widget?
//! - nicer axis + mesh rendering
//! - less manual work for ticks/labels
//!
//! We render Plotters output into the Ratatui buffer using `plotters-ratatui-backend`.
//!
//! Each chart is a long-lived object owned by the dashboard. It is built once
//! and fed a freshly computed sequence through `set_data` after every refresh;
//! rendering only reads the prepared series.

use chrono::{Datelike, NaiveDate};
use plotters::prelude::*;
use plotters_ratatui_backend::widget_fn;
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Style},
    widgets::Widget,
};

use crate::domain::{FeatureRow, ScorePoint};
use crate::math::ZScore;
use crate::score::{ELEVATED_THRESHOLD, HIGH_THRESHOLD};

/// Spread bands are drawn at `mean ± BAND_SIGMAS * sd`.
pub const BAND_SIGMAS: f64 = 2.0;

/// Percentage points to basis points.
const BP_PER_PCT: f64 = 100.0;

/// Probability trend chart: `p_stress`, `p_spread`, `p_repo` over time.
#[derive(Debug, Default, Clone)]
pub struct StressChart {
    stress: Vec<(f64, f64)>,
    spread: Vec<(f64, f64)>,
    repo: Vec<(f64, f64)>,
    x_bounds: [f64; 2],
}

impl StressChart {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_data(&mut self, points: &[ScorePoint]) {
        self.stress = points.iter().map(|p| (day_x(p.date), p.p_stress)).collect();
        self.spread = points.iter().map(|p| (day_x(p.date), p.p_spread)).collect();
        self.repo = points.iter().map(|p| (day_x(p.date), p.p_repo)).collect();
        self.x_bounds = x_bounds(&self.stress);
    }

    pub fn is_empty(&self) -> bool {
        self.stress.is_empty()
    }
}

impl Widget for &StressChart {
    fn render(self, area: Rect, buf: &mut Buffer) {
        if !fits(area, buf) {
            return;
        }
        let [x0, x1] = self.x_bounds;
        if !(x0.is_finite() && x1.is_finite()) || x1 <= x0 {
            return;
        }

        let widget = widget_fn(move |root| {
            let mut chart = ChartBuilder::on(&root)
                .margin(1)
                // Terminal cells are low-res, so keep label areas compact.
                .set_label_area_size(LabelAreaPosition::Left, 6)
                .set_label_area_size(LabelAreaPosition::Bottom, 3)
                .build_cartesian_2d(x0..x1, 0.0..1.0)?;

            chart
                .configure_mesh()
                .disable_x_mesh()
                .disable_y_mesh()
                .x_desc("date")
                .y_desc("probability")
                .x_labels(5)
                .y_labels(5)
                .x_label_formatter(&|v| fmt_axis_date(*v))
                .y_label_formatter(&|v| format!("{v:.1}"))
                .label_style(("sans-serif", 10).into_font().color(&WHITE))
                .axis_style(&WHITE)
                .bold_line_style(&WHITE)
                .draw()?;

            let high_color = RGBColor(255, 0, 0);
            let elevated_color = RGBColor(255, 255, 0);
            let stress_color = RGBColor(255, 0, 255); // magenta
            let spread_color = RGBColor(0, 255, 255); // cyan
            let repo_color = RGBColor(0, 255, 0); // green

            // Thresholds first so the series draw over them.
            chart.draw_series(LineSeries::new([(x0, HIGH_THRESHOLD), (x1, HIGH_THRESHOLD)], &high_color))?;
            chart.draw_series(LineSeries::new(
                [(x0, ELEVATED_THRESHOLD), (x1, ELEVATED_THRESHOLD)],
                &elevated_color,
            ))?;

            chart.draw_series(LineSeries::new(self.repo.iter().copied(), &repo_color))?;
            chart.draw_series(LineSeries::new(self.spread.iter().copied(), &spread_color))?;
            chart.draw_series(LineSeries::new(self.stress.iter().copied(), &stress_color))?;

            Ok(())
        });

        widget.render(area, buf);
    }
}

/// Spread chart (in bp) with the normalizer's `mean ± 2 sd` band.
#[derive(Debug, Default, Clone)]
pub struct SpreadChart {
    spread: Vec<(f64, f64)>,
    mean: f64,
    upper: f64,
    lower: f64,
    x_bounds: [f64; 2],
    y_bounds: [f64; 2],
}

impl SpreadChart {
    pub fn new() -> Self {
        Self::default()
    }

    /// `stats` must be the spread normalizer fitted over `rows`.
    pub fn set_data(&mut self, rows: &[FeatureRow], stats: ZScore) {
        self.spread = rows
            .iter()
            .filter_map(|r| r.spread.filter(|v| v.is_finite()).map(|v| (day_x(r.date), v * BP_PER_PCT)))
            .collect();
        self.mean = stats.mean * BP_PER_PCT;
        self.upper = (stats.mean + BAND_SIGMAS * stats.std) * BP_PER_PCT;
        self.lower = (stats.mean - BAND_SIGMAS * stats.std) * BP_PER_PCT;
        self.x_bounds = x_bounds(&self.spread);
        self.y_bounds = padded_bounds(self.spread.iter().map(|&(_, y)| y).chain([self.upper, self.lower]));
    }

    pub fn is_empty(&self) -> bool {
        self.spread.is_empty()
    }

    pub fn band(&self) -> (f64, f64, f64) {
        (self.lower, self.mean, self.upper)
    }
}

impl Widget for &SpreadChart {
    fn render(self, area: Rect, buf: &mut Buffer) {
        if !fits(area, buf) {
            return;
        }
        let [x0, x1] = self.x_bounds;
        let [y0, y1] = self.y_bounds;
        if !(x0.is_finite() && x1.is_finite() && y0.is_finite() && y1.is_finite()) || x1 <= x0 || y1 <= y0 {
            return;
        }

        let widget = widget_fn(move |root| {
            let mut chart = ChartBuilder::on(&root)
                .margin(1)
                .set_label_area_size(LabelAreaPosition::Left, 6)
                .set_label_area_size(LabelAreaPosition::Bottom, 3)
                .build_cartesian_2d(x0..x1, y0..y1)?;

            chart
                .configure_mesh()
                .disable_x_mesh()
                .disable_y_mesh()
                .x_desc("date")
                .y_desc("spread (bp)")
                .x_labels(5)
                .y_labels(5)
                .x_label_formatter(&|v| fmt_axis_date(*v))
                .y_label_formatter(&|v| format!("{v:.1}"))
                .label_style(("sans-serif", 10).into_font().color(&WHITE))
                .axis_style(&WHITE)
                .bold_line_style(&WHITE)
                .draw()?;

            let band_color = RGBColor(128, 128, 128);
            let mean_color = RGBColor(255, 255, 0);
            let spread_color = RGBColor(0, 255, 255);

            chart.draw_series(LineSeries::new([(x0, self.upper), (x1, self.upper)], &band_color))?;
            chart.draw_series(LineSeries::new([(x0, self.lower), (x1, self.lower)], &band_color))?;
            chart.draw_series(LineSeries::new([(x0, self.mean), (x1, self.mean)], &mean_color))?;
            chart.draw_series(LineSeries::new(self.spread.iter().copied(), &spread_color))?;

            Ok(())
        });

        widget.render(area, buf);
    }
}

/// When the area is too small Plotters may fail to build a chart; show a hint instead.
fn fits(area: Rect, buf: &mut Buffer) -> bool {
    if area.width < 20 || area.height < 8 {
        buf.set_string(
            area.x,
            area.y,
            "Chart area too small (resize terminal).",
            Style::default().fg(Color::Yellow),
        );
        return false;
    }
    true
}

/// Dates are plotted as days since the common era so axis labels can map back.
fn day_x(date: NaiveDate) -> f64 {
    f64::from(date.num_days_from_ce())
}

fn fmt_axis_date(v: f64) -> String {
    NaiveDate::from_num_days_from_ce_opt(v.round() as i32)
        .map(|d| d.format("%y-%m-%d").to_string())
        .unwrap_or_default()
}

fn x_bounds(series: &[(f64, f64)]) -> [f64; 2] {
    match (series.first(), series.last()) {
        // A single reading still needs a non-empty x range.
        (Some(&(a, _)), Some(&(b, _))) if b > a => [a, b],
        (Some(&(a, _)), Some(_)) => [a - 1.0, a + 1.0],
        _ => [0.0, 1.0],
    }
}

fn padded_bounds(values: impl Iterator<Item = f64>) -> [f64; 2] {
    let (mut lo, mut hi) = (f64::INFINITY, f64::NEG_INFINITY);
    for v in values.filter(|v| v.is_finite()) {
        lo = lo.min(v);
        hi = hi.max(v);
    }
    if !lo.is_finite() || !hi.is_finite() {
        return [0.0, 1.0];
    }
    if hi <= lo {
        return [lo - 1.0, hi + 1.0];
    }
    let pad = (hi - lo) * 0.05;
    [lo - pad, hi + pad]
}

//! Formatted terminal output.
//!
//! We keep formatting code in one place so:
//! - the scoring code stays free of presentation concerns
//! - output changes are localized (important for snapshot tests)

use crate::app::pipeline::RunOutput;
use crate::domain::{ScorePoint, Series, StressConfig};

/// Full run summary: window, inputs, normalizer stats, headline reading.
pub fn format_run_summary(run: &RunOutput, config: &StressConfig) -> String {
    let mut out = String::new();
    let snap = &run.snapshot;

    out.push_str("=== fstress - funding market stress ===\n");
    out.push_str(&format!(
        "Window: {} .. {} ({} day lookback) | source: {}\n",
        snap.start, snap.end, config.lookback_days, snap.source
    ));
    out.push_str(&format!(
        "Tail: k={:.2} steepness={:.2} | repo signal: {}\n",
        config.tail.k,
        config.tail.steepness,
        config.repo_signal.display_name()
    ));

    out.push_str("\nInputs:\n");
    out.push_str(&series_line("secured", &snap.secured));
    out.push_str(&series_line("unsecured", &snap.unsecured));
    match &snap.repo {
        Some(repo) => out.push_str(&series_line("repo", repo)),
        None => out.push_str("  repo       (disabled)\n"),
    }

    out.push_str("\nNormalization:\n");
    out.push_str(&format!(
        "  spread     mean={:+.4} sd={:.4} n={}{}\n",
        run.spread_stats.mean,
        run.spread_stats.std,
        run.spread_stats.n,
        degenerate_note(run.spread_stats.is_degenerate()),
    ));
    out.push_str(&format!(
        "  repo       mean={:+.4} sd={:.4} n={}{}\n",
        run.repo_stats.mean,
        run.repo_stats.std,
        run.repo_stats.n,
        degenerate_note(run.repo_stats.is_degenerate()),
    ));

    out.push('\n');
    out.push_str(&format_headline(run));
    out
}

/// Headline KPIs for the latest reading plus the alert line, if any.
pub fn format_headline(run: &RunOutput) -> String {
    let p = &run.latest;
    let mut out = format!(
        "Latest {}: stress={:.1}% [{}] | spread p={:.1}% (z={:+.2}) | repo p={:.1}% ({})\n",
        p.date,
        p.p_stress * 100.0,
        run.band.display_name(),
        p.p_spread * 100.0,
        p.z_spread,
        p.p_repo * 100.0,
        p.z_repo
            .map(|z| format!("z={z:+.2}"))
            .unwrap_or_else(|| "no signal".to_string()),
    );
    if let Some(alert) = &run.alert {
        out.push_str(&format!("ALERT: {}\n", alert.message));
    }
    out
}

/// The most recent `rows` readings, oldest first.
pub fn format_score_table(points: &[ScorePoint], rows: usize) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "{:<10} {:>9} {:>8} {:>8} {:>8} {:>8}  {}\n",
        "date", "z_spread", "z_repo", "p_spread", "p_repo", "p_stress", "band"
    ));
    let skip = points.len().saturating_sub(rows);
    for p in &points[skip..] {
        out.push_str(&format!(
            "{:<10} {:>+9.2} {:>8} {:>8.3} {:>8.3} {:>8.3}  {}\n",
            p.date.to_string(),
            p.z_spread,
            p.z_repo.map(|z| format!("{z:+.2}")).unwrap_or_else(|| "-".to_string()),
            p.p_spread,
            p.p_repo,
            p.p_stress,
            p.band().display_name(),
        ));
    }
    out
}

fn series_line(role: &str, series: &Series) -> String {
    let present = series.observations.iter().filter(|o| o.value.is_some()).count();
    let range = match (series.first_date(), series.last_date()) {
        (Some(a), Some(b)) => format!("{a} .. {b}"),
        _ => "empty".to_string(),
    };
    format!(
        "  {role:<10} {:<12} n={:<5} missing={:<3} {range}\n",
        series.id,
        series.len(),
        series.len() - present,
    )
}

fn degenerate_note(degenerate: bool) -> &'static str {
    if degenerate { " (epsilon divisor)" } else { "" }
}

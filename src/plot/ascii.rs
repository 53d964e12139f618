//! ASCII plotting for terminal output.
//!
//! This is intentionally "dumb" (fixed-size grid, y fixed to `[0, 1]`),
//! optimized for:
//! - quick visual sanity checks in a terminal
//! - deterministic output (helpful for golden tests)
//!
//! Plot elements:
//! - stress probability: `*` line, one x step per reading
//! - band thresholds: `=` (high) and `-` (elevated)
//! - latest reading: `X`

use crate::domain::{ScoreFile, ScorePoint};
use crate::score::{ELEVATED_THRESHOLD, HIGH_THRESHOLD};

/// Render `p_stress` over time.
pub fn render_stress_plot(points: &[ScorePoint], width: usize, height: usize) -> String {
    let (Some(first), Some(last)) = (points.first(), points.last()) else {
        return "Plot: no scored readings\n".to_string();
    };

    let width = width.max(10);
    let height = height.max(5);
    let mut grid = vec![vec![' '; width]; height];

    let mut prev = None;
    for (i, p) in points.iter().enumerate() {
        let x = map_x(i, points.len(), width);
        let y = map_y(p.p_stress, height);
        match prev {
            Some((x0, y0)) => draw_line(&mut grid, x0, y0, x, y, '*'),
            None => grid[y][x] = '*',
        }
        prev = Some((x, y));
    }

    fill_row(&mut grid[map_y(HIGH_THRESHOLD, height)], '=');
    fill_row(&mut grid[map_y(ELEVATED_THRESHOLD, height)], '-');

    if let Some((x, y)) = prev {
        grid[y][x] = 'X';
    }

    let mut out = String::new();
    out.push_str(&format!(
        "Plot: {} .. {} | p_stress in [0, 1] | '=' high {HIGH_THRESHOLD:.2}  '-' elevated {ELEVATED_THRESHOLD:.2}  'X' latest\n",
        first.date, last.date,
    ));
    for row in grid {
        out.push_str(&row.into_iter().collect::<String>());
        out.push('\n');
    }
    out
}

/// Render a plot from a saved score JSON file.
pub fn render_score_file_plot(file: &ScoreFile, width: usize, height: usize) -> String {
    let mut out = format!(
        "{} run {} .. {} | k={:.2} | latest band: {}\n",
        file.tool,
        file.window_start,
        file.window_end,
        file.tail.k,
        file.latest_band.display_name(),
    );
    out.push_str(&render_stress_plot(&file.points, width, height));
    out
}

fn fill_row(row: &mut [char], ch: char) {
    for cell in row.iter_mut().filter(|c| **c == ' ') {
        *cell = ch;
    }
}

fn map_x(i: usize, n: usize, width: usize) -> usize {
    let span = n.saturating_sub(1).max(1) as f64;
    let u = (i as f64 / span).clamp(0.0, 1.0);
    (u * (width as f64 - 1.0)).round() as usize
}

fn map_y(p: f64, height: usize) -> usize {
    let u = if p.is_finite() { p.clamp(0.0, 1.0) } else { 0.0 };
    // p=1 is the top row.
    (height as f64 - 1.0 - (u * (height as f64 - 1.0))).round() as usize
}

/// Integer line drawing (Bresenham-ish). Only writes into blank cells.
fn draw_line(grid: &mut [Vec<char>], x0: usize, y0: usize, x1: usize, y1: usize, ch: char) {
    let mut x0 = x0 as isize;
    let mut y0 = y0 as isize;
    let x1 = x1 as isize;
    let y1 = y1 as isize;

    let dx = (x1 - x0).abs();
    let sx = if x0 < x1 { 1 } else { -1 };
    let dy = -(y1 - y0).abs();
    let sy = if y0 < y1 { 1 } else { -1 };
    let mut err = dx + dy;

    loop {
        if y0 >= 0
            && (y0 as usize) < grid.len()
            && x0 >= 0
            && (x0 as usize) < grid[0].len()
            && grid[y0 as usize][x0 as usize] == ' '
        {
            grid[y0 as usize][x0 as usize] = ch;
        }

        if x0 == x1 && y0 == y1 {
            break;
        }
        let e2 = 2 * err;
        if e2 >= dy {
            err += dy;
            x0 += sx;
        }
        if e2 <= dx {
            err += dx;
            y0 += sy;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn point(day: u32, p: f64) -> ScorePoint {
        ScorePoint {
            date: NaiveDate::from_ymd_opt(2024, 1, day).unwrap(),
            p_stress: p,
            p_spread: p,
            p_repo: 0.0,
            z_spread: 0.0,
            z_repo: None,
        }
    }

    #[test]
    fn plot_golden_snapshot_small() {
        let points = vec![point(1, 0.0), point(2, 0.5), point(3, 1.0)];
        let txt = render_stress_plot(&points, 10, 5);
        let expected = concat!(
            "Plot: 2024-01-01 .. 2024-01-03 | p_stress in [0, 1] | '=' high 0.80  '-' elevated 0.50  'X' latest\n",
            "        *X\n",
            "======**==\n",
            "----**----\n",
            "  **      \n",
            "**        \n",
        );
        assert_eq!(txt, expected);
    }

    #[test]
    fn single_point_and_empty() {
        assert_eq!(render_stress_plot(&[], 20, 5), "Plot: no scored readings\n");

        let txt = render_stress_plot(&[point(4, 0.2)], 10, 5);
        let rows: Vec<&str> = txt.lines().skip(1).collect();
        assert_eq!(rows.len(), 5);
        assert_eq!(rows[3], "X         ");
    }
}

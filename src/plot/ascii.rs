//! ASCII/Unicode plotting for terminal output.
//!
//! This is intentionally "dumb" (fixed-size grid), optimized for:
//! - quick visual sanity checks in a terminal
//! - deterministic output (helpful for golden tests)
//!
//! Each series gets its own glyph; consecutive points of a series are joined
//! with that glyph, and the points themselves are drawn last.

use chrono::DateTime;

use crate::domain::SeriesLine;
use crate::reshape::series_bounds;

const GLYPHS: [char; 8] = ['*', '+', 'o', 'x', '#', '@', '%', '&'];

/// Axis label format for the time axis.
const X_LABEL_FORMAT: &str = "%d.%m. %H:%M";

/// Render every series into one plot.
pub fn render_series_plot(lines: &[SeriesLine], width: usize, height: usize) -> String {
    let width = width.max(10);
    let height = height.max(5);

    let Some((x_bounds, y_bounds)) = series_bounds(lines) else {
        return "Plot: no data\n".to_string();
    };
    let [x_min, x_max] = widen_if_flat(x_bounds, 1800.0);
    let [y_min, y_max] = widen_if_flat(y_bounds, 1.0);
    let (y_min, y_max) = pad_range(y_min, y_max, 0.05);

    let mut grid = vec![vec![' '; width]; height];

    // Lines first, so points can overlay.
    for (i, line) in lines.iter().enumerate() {
        let ch = glyph(i);
        let mut prev = None;
        for &(x, y) in &line.points {
            let cell = (map_x(x, x_min, x_max, width), map_y(y, y_min, y_max, height));
            if let Some((x0, y0)) = prev {
                draw_line(&mut grid, x0, y0, cell.0, cell.1, ch);
            }
            prev = Some(cell);
        }
    }
    for (i, line) in lines.iter().enumerate() {
        let ch = glyph(i);
        for &(x, y) in &line.points {
            grid[map_y(y, y_min, y_max, height)][map_x(x, x_min, x_max, width)] = ch;
        }
    }

    let mut out = String::new();
    out.push_str(&format!(
        "Plot: x=[{}, {}] | y=[{y_min:.2}, {y_max:.2}] {}\n",
        fmt_time(x_min),
        fmt_time(x_max),
        common_unit(lines),
    ));

    let legend: Vec<String> = lines
        .iter()
        .enumerate()
        .map(|(i, l)| format!("{} {}", glyph(i), l.source))
        .collect();
    out.push_str(&format!("Legend: {}\n", legend.join("  ")));

    for row in grid {
        out.push_str(&row.into_iter().collect::<String>());
        out.push('\n');
    }

    out
}

fn glyph(series_index: usize) -> char {
    GLYPHS[series_index % GLYPHS.len()]
}

fn common_unit(lines: &[SeriesLine]) -> &str {
    match lines.first() {
        Some(first) if lines.iter().all(|l| l.unit == first.unit) => &first.unit,
        Some(_) => "(mixed units)",
        None => "",
    }
}

fn fmt_time(secs: f64) -> String {
    DateTime::from_timestamp(secs as i64, 0)
        .map(|dt| dt.naive_utc().format(X_LABEL_FORMAT).to_string())
        .unwrap_or_else(|| "?".to_string())
}

fn widen_if_flat(bounds: [f64; 2], half_span: f64) -> [f64; 2] {
    if bounds[1] > bounds[0] {
        bounds
    } else {
        [bounds[0] - half_span, bounds[1] + half_span]
    }
}

fn pad_range(min: f64, max: f64, frac: f64) -> (f64, f64) {
    let span = (max - min).abs();
    let pad = (span * frac).max(1e-12);
    (min - pad, max + pad)
}

fn map_x(t: f64, t_min: f64, t_max: f64, width: usize) -> usize {
    let width = width.max(2);
    let u = ((t - t_min) / (t_max - t_min)).clamp(0.0, 1.0);
    (u * (width as f64 - 1.0)).round() as usize
}

fn map_y(y: f64, y_min: f64, y_max: f64, height: usize) -> usize {
    let height = height.max(2);
    let u = ((y - y_min) / (y_max - y_min)).clamp(0.0, 1.0);
    // y=top is max -> row 0
    (height as f64 - 1.0 - (u * (height as f64 - 1.0))).round() as usize
}

/// Integer line drawing (Bresenham-ish); only fills empty cells.
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

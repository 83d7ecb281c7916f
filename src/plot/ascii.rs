//! ASCII plotting for terminal output.
//!
//! Fixed-size grids with deterministic output (used by golden tests).
//!
//! Plot elements:
//! - data points: `o`
//! - reference line: `.`
//! - bars: `#`

use crate::plot::{ReferenceLine, scatter_bounds};

/// Scatter `points` over a reference line.
pub fn render_scatter(points: &[(f64, f64)], reference: ReferenceLine, width: usize, height: usize) -> String {
    let width = width.max(10);
    let height = height.max(5);
    let ((x_min, x_max), (y_min, y_max)) = scatter_bounds(points, reference);

    let mut grid = vec![vec![' '; width]; height];

    // Reference first so points overlay it.
    let (a, b) = match reference {
        ReferenceLine::Diagonal => ((x_min, x_min), (x_max, x_max)),
        ReferenceLine::Zero => ((x_min, 0.0), (x_max, 0.0)),
    };
    draw_line(
        &mut grid,
        map_x(a.0, x_min, x_max, width),
        map_y(a.1, y_min, y_max, height),
        map_x(b.0, x_min, x_max, width),
        map_y(b.1, y_min, y_max, height),
        '.',
    );

    for &(x, y) in points.iter().filter(|(x, y)| x.is_finite() && y.is_finite()) {
        grid[map_y(y, y_min, y_max, height)][map_x(x, x_min, x_max, width)] = 'o';
    }

    let mut out = format!("Plot: x=[{x_min:.2}, {x_max:.2}] | y=[{y_min:.2}, {y_max:.2}]\n");
    for row in grid {
        out.push_str(&row.into_iter().collect::<String>());
        out.push('\n');
    }
    out
}

/// Horizontal bars scaled so the largest value spans `width` cells.
pub fn render_bars(bars: &[(String, f64)], width: usize) -> String {
    let width = width.max(1);
    let label_width = bars.iter().map(|(l, _)| l.chars().count()).max().unwrap_or(0);
    let max = bars.iter().map(|(_, v)| *v).fold(0.0_f64, f64::max);

    let mut out = String::new();
    for (label, value) in bars {
        let len = if max > 0.0 && value.is_finite() {
            ((value.max(0.0) / max) * width as f64).round() as usize
        } else {
            0
        };
        let bar = "#".repeat(len);
        out.push_str(&format!("{label:<label_width$} | {bar:<width$} {value:.4}\n"));
    }
    out
}

fn map_x(x: f64, x_min: f64, x_max: f64, width: usize) -> usize {
    let u = ((x - x_min) / (x_max - x_min)).clamp(0.0, 1.0);
    (u * (width as f64 - 1.0)).round() as usize
}

fn map_y(y: f64, y_min: f64, y_max: f64, height: usize) -> usize {
    let u = ((y - y_min) / (y_max - y_min)).clamp(0.0, 1.0);
    // y max is row 0
    (height as f64 - 1.0 - (u * (height as f64 - 1.0))).round() as usize
}

/// Integer line drawing (Bresenham).
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
        if y0 >= 0 && (y0 as usize) < grid.len() && x0 >= 0 && (x0 as usize) < grid[0].len() {
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

//! ASCII plotting for terminal output.
//!
//! This is intentionally "dumb" (fixed-size grid), optimized for:
//! - quick visual sanity checks in a terminal
//! - deterministic output (helpful for golden tests)
//!
//! Plot elements:
//! - closing prices: `o`
//! - connecting line: `-`

use crate::domain::ChartSeries;

/// Render a close-price series. The x axis is calendar time, left to right.
pub fn render_ascii_plot(series: &ChartSeries, width: usize, height: usize) -> String {
    let width = width.max(10);
    let height = height.max(5);

    let Some((first, last)) = series.date_range() else {
        return "Plot: nothing to draw\n".to_string();
    };

    let xs: Vec<f64> = series
        .points
        .iter()
        .map(|p| (p.date - first).num_days() as f64)
        .collect();
    let x_max = xs.last().copied().unwrap_or(0.0);
    let (x_min, x_max) = if x_max > 0.0 { (0.0, x_max) } else { (-0.5, 0.5) };

    let (y_min, y_max) = series.close_range().unwrap_or((0.0, 1.0));
    let (y_min, y_max) = pad_range(y_min, y_max, 0.05);

    let mut grid = vec![vec![' '; width]; height];

    let cells: Vec<(usize, usize)> = xs
        .iter()
        .zip(&series.points)
        .map(|(&x, p)| (map_x(x, x_min, x_max, width), map_y(p.close, y_min, y_max, height)))
        .collect();

    // Line first so the markers overlay it.
    for pair in cells.windows(2) {
        let (x0, y0) = pair[0];
        let (x1, y1) = pair[1];
        draw_line(&mut grid, x0, y0, x1, y1, '-');
    }
    for &(x, y) in &cells {
        grid[y][x] = 'o';
    }

    let mut out = String::new();
    out.push_str(&format!(
        "Plot: {} → {} | close=[{y_min:.2}, {y_max:.2}]\n",
        first.format("%m/%d/%Y"),
        last.format("%m/%d/%Y"),
    ));

    for row in grid {
        out.push_str(&row.into_iter().collect::<String>());
        out.push('\n');
    }

    out
}

fn pad_range(min: f64, max: f64, frac: f64) -> (f64, f64) {
    let span = (max - min).abs();
    let pad = if span > 0.0 { span * frac } else { (min.abs() * frac).max(0.5) };
    (min - pad, max + pad)
}

fn map_x(x: f64, x_min: f64, x_max: f64, width: usize) -> usize {
    let width = width.max(2);
    let u = ((x - x_min) / (x_max - x_min)).clamp(0.0, 1.0);
    (u * (width as f64 - 1.0)).round() as usize
}

fn map_y(y: f64, y_min: f64, y_max: f64, height: usize) -> usize {
    let height = height.max(2);
    let u = ((y - y_min) / (y_max - y_min)).clamp(0.0, 1.0);
    // y=top is max -> row 0
    (height as f64 - 1.0 - (u * (height as f64 - 1.0))).round() as usize
}

/// Integer line drawing (Bresenham-ish).
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
    use crate::domain::ChartPoint;
    use chrono::NaiveDate;

    fn point(day: u32, close: f64) -> ChartPoint {
        ChartPoint {
            date: NaiveDate::from_ymd_opt(2024, 1, day).unwrap(),
            close,
        }
    }

    #[test]
    fn plot_golden_snapshot_small() {
        let series = ChartSeries {
            points: vec![point(1, 100.0), point(10, 110.0)],
        };

        let txt = render_ascii_plot(&series, 10, 5);
        let expected = concat!(
            "Plot: 01/01/2024 → 01/10/2024 | close=[99.50, 110.50]\n",
            "        -o\n",
            "      --  \n",
            "    --    \n",
            "  --      \n",
            "o-        \n",
        );
        assert_eq!(txt, expected);
    }

    #[test]
    fn single_point_is_centered_vertically() {
        let series = ChartSeries {
            points: vec![point(5, 42.0)],
        };
        let txt = render_ascii_plot(&series, 10, 5);
        let lines: Vec<&str> = txt.lines().collect();
        assert_eq!(lines.len(), 6);
        assert_eq!(lines[3].trim(), "o");
    }

    #[test]
    fn empty_series_has_nothing_to_draw() {
        assert_eq!(render_ascii_plot(&ChartSeries::default(), 10, 5), "Plot: nothing to draw\n");
    }
}

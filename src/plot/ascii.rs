//! ASCII/Unicode plotting for terminal output.
//!
//! This is intentionally "dumb" (fixed-size grid), optimized for:
//! - quick visual sanity checks in a terminal or over ssh
//! - deterministic output (helpful for golden tests)
//!
//! Plot elements:
//! - center line: `-`
//! - slit edges: `.`
//! - integer-wavelength ticks: `|` (only where nothing else is drawn)

use crate::trace::ChipOverlay;

/// Render one detector's trace curves.
pub fn render_chip_preview(overlay: &ChipOverlay, width: usize, height: usize) -> String {
    let width = width.max(10);
    let height = height.max(5);

    let x_min = 0.0;
    let x_max = overlay.width.saturating_sub(1).max(1) as f64;
    let (y_min, y_max) = overlay.y_extent().unwrap_or((0.0, overlay.width as f64));
    let (y_min, y_max) = pad_range(y_min, y_max, 0.05);

    let mut grid = vec![vec![' '; width]; height];
    let frame = Frame {
        x: (x_min, x_max),
        y: (y_min, y_max),
    };

    // Center lines first so edges never hide them.
    for t in &overlay.traces {
        draw_curve(&mut grid, &overlay.xs, &t.edges.center, &frame, '-');
    }
    for t in &overlay.traces {
        draw_curve(&mut grid, &overlay.xs, &t.edges.upper, &frame, '.');
        draw_curve(&mut grid, &overlay.xs, &t.edges.lower, &frame, '.');
    }
    for t in &overlay.traces {
        for m in &t.marks {
            if !(m.y_lower.is_finite() && m.y_upper.is_finite()) {
                continue;
            }
            let x = map_x(m.x, x_min, x_max, width);
            let y0 = map_y(m.y_lower, y_min, y_max, height);
            let y1 = map_y(m.y_upper, y_min, y_max, height);
            draw_line(&mut grid, x, y0, x, y1, '|');
        }
    }

    let mut out = String::new();
    out.push_str(&format!(
        "{}: x=[{x_min:.0}, {x_max:.0}] px | y=[{y_min:.1}, {y_max:.1}] px | traces={}\n",
        overlay.detector,
        overlay.traces.len()
    ));
    for row in grid {
        out.push_str(&row.into_iter().collect::<String>());
        out.push('\n');
    }
    out
}

struct Frame {
    x: (f64, f64),
    y: (f64, f64),
}

fn pad_range(min: f64, max: f64, frac: f64) -> (f64, f64) {
    let span = (max - min).abs();
    let pad = (span * frac).max(1e-12);
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

/// Connect consecutive finite samples; NaNs leave gaps.
fn draw_curve(grid: &mut [Vec<char>], xs: &[f64], ys: &[f64], frame: &Frame, ch: char) {
    let height = grid.len();
    let width = grid[0].len();

    let mut prev = None;
    for (&x, &y) in xs.iter().zip(ys) {
        if !(x.is_finite() && y.is_finite()) || y < frame.y.0 || y > frame.y.1 {
            prev = None;
            continue;
        }
        let col = map_x(x, frame.x.0, frame.x.1, width);
        let row = map_y(y, frame.y.0, frame.y.1, height);
        match prev {
            Some((c0, r0)) => draw_line(grid, c0, r0, col, row, ch),
            None => {
                if grid[row][col] == ' ' {
                    grid[row][col] = ch;
                }
            }
        }
        prev = Some((col, row));
    }
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
    use crate::domain::{Detector, LabelStyle, OverlayOptions, PixelGrid, TraceRecord};
    use crate::math::Polynomial;
    use crate::trace::build_chip_overlay;

    fn flat_record(center: f64) -> TraceRecord {
        TraceRecord {
            order: 1,
            trace_nb: 1,
            upper: Polynomial::from_ascending(vec![center + 2.0]),
            lower: Polynomial::from_ascending(vec![center - 2.0]),
            all: Polynomial::from_ascending(vec![center]),
            wavelength: Polynomial::from_ascending(vec![1000.0, 1.0]),
            slit_fraction: vec![0.5],
            slit_poly_a: Polynomial::default(),
            slit_poly_b: Polynomial::default(),
            slit_poly_c: Polynomial::default(),
        }
    }

    #[test]
    fn preview_golden_snapshot_small() {
        let options = OverlayOptions {
            wavelength_marks: false,
            curvature: false,
            labels: LabelStyle::None,
            ..OverlayOptions::default()
        };
        let overlay = build_chip_overlay(Detector::Chip1, &[flat_record(5.0)], &PixelGrid::full(10), &options);

        let txt = render_chip_preview(&overlay, 10, 5);
        let expected = concat!(
            "CHIP1: x=[0, 9] px | y=[2.8, 7.2] px | traces=1\n",
            "..........\n",
            "          \n",
            "----------\n",
            "          \n",
            "..........\n",
        );
        assert_eq!(txt, expected);
    }

    #[test]
    fn wavelength_ticks_fill_between_edges() {
        let options = OverlayOptions {
            curvature: false,
            labels: LabelStyle::None,
            ..OverlayOptions::default()
        };
        // w = 1000 + x over 10 pixels: ticks at 1000..1009, pixels 0..=8.
        let overlay = build_chip_overlay(Detector::Chip2, &[flat_record(5.0)], &PixelGrid::full(10), &options);
        let txt = render_chip_preview(&overlay, 10, 5);
        let rows: Vec<&str> = txt.lines().skip(1).collect();
        assert_eq!(rows[1], "||||||||| ");
        assert_eq!(rows[2], "----------");
        assert_eq!(rows[3], "||||||||| ");
    }
}

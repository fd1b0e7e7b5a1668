//! Polyline clipping.
//!
//! Plotters draws series outside the plotting area as-is, so curves that run
//! off a detector panel are clipped here first. Non-finite points break a
//! polyline into separate runs.

/// Axis-aligned clipping window.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClipRect {
    pub x: (f64, f64),
    pub y: (f64, f64),
}

impl ClipRect {
    pub fn new(x: (f64, f64), y: (f64, f64)) -> Self {
        Self { x, y }
    }

    pub fn contains(&self, (x, y): (f64, f64)) -> bool {
        x >= self.x.0 && x <= self.x.1 && y >= self.y.0 && y <= self.y.1
    }
}

/// Clip a polyline to `rect`, returning the visible runs (each with at
/// least two points).
pub fn clip_polyline(points: &[(f64, f64)], rect: ClipRect) -> Vec<Vec<(f64, f64)>> {
    let mut runs = Vec::new();
    let mut current: Vec<(f64, f64)> = Vec::new();

    for pair in points.windows(2) {
        let (p0, p1) = (pair[0], pair[1]);
        let clipped = if is_finite(p0) && is_finite(p1) {
            clip_segment(p0, p1, rect)
        } else {
            None
        };

        match clipped {
            Some((c0, c1)) => {
                if current.last() != Some(&c0) {
                    flush(&mut current, &mut runs);
                    current.push(c0);
                }
                current.push(c1);
            }
            None => flush(&mut current, &mut runs),
        }
    }
    flush(&mut current, &mut runs);
    runs
}

/// Liang–Barsky segment clipping.
pub fn clip_segment(p0: (f64, f64), p1: (f64, f64), rect: ClipRect) -> Option<((f64, f64), (f64, f64))> {
    let dx = p1.0 - p0.0;
    let dy = p1.1 - p0.1;
    let mut t0 = 0.0f64;
    let mut t1 = 1.0f64;

    let edges = [
        (-dx, p0.0 - rect.x.0),
        (dx, rect.x.1 - p0.0),
        (-dy, p0.1 - rect.y.0),
        (dy, rect.y.1 - p0.1),
    ];
    for (p, q) in edges {
        if p == 0.0 {
            if q < 0.0 {
                return None;
            }
            continue;
        }
        let r = q / p;
        if p < 0.0 {
            if r > t1 {
                return None;
            }
            t0 = t0.max(r);
        } else {
            if r < t0 {
                return None;
            }
            t1 = t1.min(r);
        }
    }

    let at = |t: f64| {
        if t == 0.0 {
            p0
        } else if t == 1.0 {
            p1
        } else {
            (p0.0 + t * dx, p0.1 + t * dy)
        }
    };
    Some((at(t0), at(t1)))
}

fn is_finite((x, y): (f64, f64)) -> bool {
    x.is_finite() && y.is_finite()
}

fn flush(current: &mut Vec<(f64, f64)>, runs: &mut Vec<Vec<(f64, f64)>>) {
    if current.len() >= 2 {
        runs.push(std::mem::take(current));
    } else {
        current.clear();
    }
}

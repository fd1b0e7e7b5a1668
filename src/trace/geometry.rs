//! Trace geometry: edge curves, wavelength gridlines and slit-curvature segments.
//!
//! Everything here is a pure function of trace table records. The renderers
//! only ever consume the outputs.
//!
//! Wavelength solutions are low-degree polynomials `w(x) = a + b·x + c·x²`.
//! Inverting them for a target wavelength uses the root
//!
//! ```text
//! x = (√(b² − 4ac + 4c·w) − b) / (2c)
//! ```
//!
//! which is the branch containing the detector for realistic solutions
//! (`b + 2c·x > 0` across the chip).
//!
//! Slit curvature is described by three polynomials along the dispersion
//! axis. At a dispersion pixel `p` they give `a, b, c` of a quadratic in
//! detector `y`; shifting that quadratic into the frame of the mid-slit
//! reference trace `yc` gives
//!
//! ```text
//! a' = a − p + yc·b + yc²·c
//! b' = b + 2·yc·c
//! ```
//!
//! and the curved segment is `x = p + yt·b' + yt²·c` for along-slit offsets
//! `yt`.

use serde::Serialize;
use tracing::warn;

use crate::domain::{PixelGrid, TraceRecord};
use crate::math::{Polynomial, interp_vectors};

/// Slit position of the nominal mid-slit reference trace.
pub const MID_SLIT_FRACTION: f64 = 0.5;

/// Upper bound on integer wavelengths per detector pixel. Real solutions
/// cover well under one nanometre per pixel.
pub const MAX_MARKS_PER_PIXEL: usize = 4;

/// Upper edge, lower edge and center curves evaluated over a pixel grid.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EdgeCurves {
    pub upper: Vec<f64>,
    pub lower: Vec<f64>,
    pub center: Vec<f64>,
}

/// The three edge curves at a single dispersion pixel.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EdgeSample {
    pub upper: f64,
    pub lower: f64,
    pub center: f64,
}

impl EdgeSample {
    pub fn evaluate(record: &TraceRecord, pixel: f64) -> Self {
        Self {
            upper: record.upper.eval(pixel),
            lower: record.lower.eval(pixel),
            center: record.all.eval(pixel),
        }
    }
}

/// Evaluate the upper, lower and center polynomials at every grid pixel.
pub fn evaluate_edges(record: &TraceRecord, grid: &PixelGrid) -> EdgeCurves {
    EdgeCurves {
        upper: record.upper.eval_many(grid.xs()),
        lower: record.lower.eval_many(grid.xs()),
        center: record.all.eval_many(grid.xs()),
    }
}

/// A record is degenerate when its center trace is not a real number at the
/// middle of the detector. Degenerate records are drawn but not annotated.
pub fn is_degenerate(record: &TraceRecord, grid: &PixelGrid) -> bool {
    !record.all.eval(grid.mid_pixel()).is_finite()
}

/// Invert a wavelength solution for a single target wavelength.
///
/// Returns `None` when the target has no real solution (negative
/// discriminant) or the solution is flat. A vanishing quadratic term falls
/// back to the linear inverse. Terms above the quadratic are ignored.
pub fn invert_wavelength(solution: &Polynomial, wavelength: f64) -> Option<f64> {
    let a = solution.coefficient(0);
    let b = solution.coefficient(1);
    let c = solution.coefficient(2);

    let x = if c == 0.0 {
        if b == 0.0 {
            return None;
        }
        (wavelength - a) / b
    } else {
        let discriminant = b * b - 4.0 * a * c + 4.0 * c * wavelength;
        if discriminant < 0.0 {
            return None;
        }
        (discriminant.sqrt() - b) / (2.0 * c)
    };

    x.is_finite().then_some(x)
}

/// Map target wavelengths to detector pixel positions.
///
/// Positions are clamped to `[0, width - 1]`, inside the valid pixel range
/// `[0, width)`. Wavelengths without a solution are skipped; the output
/// pairs each surviving wavelength with its pixel.
pub fn compute_wavelength_to_pixel(solution: &Polynomial, wavelengths: &[f64], width: usize) -> Vec<(f64, f64)> {
    let max_pixel = width.saturating_sub(1) as f64;
    wavelengths
        .iter()
        .filter_map(|&w| invert_wavelength(solution, w).map(|x| (w, x.clamp(0.0, max_pixel))))
        .collect()
}

/// Integer wavelengths covered by the solution over the full detector:
/// `floor(min w)` up to, but excluding, `ceil(max w)`.
///
/// A solution spanning more than `MAX_MARKS_PER_PIXEL * width` wavelengths
/// is rejected with a warning and yields no marks.
pub fn integer_wavelengths(solution: &Polynomial, width: usize) -> Vec<f64> {
    let mut w_min = f64::INFINITY;
    let mut w_max = f64::NEG_INFINITY;
    for x in 0..width {
        let w = solution.eval(x as f64);
        if w.is_finite() {
            w_min = w_min.min(w);
            w_max = w_max.max(w);
        }
    }
    if !(w_min.is_finite() && w_max.is_finite()) {
        return Vec::new();
    }

    let start = w_min.floor();
    let end = w_max.ceil();
    let limit = MAX_MARKS_PER_PIXEL.saturating_mul(width) as f64;
    if end - start > limit {
        warn!(w_min, w_max, width, "wavelength solution spans too many integer wavelengths, no marks");
        return Vec::new();
    }
    (start as i64..end as i64).map(|w| w as f64).collect()
}

/// An integer-wavelength gridline drawn between the trace edges.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WavelengthMark {
    pub wavelength: f64,
    pub x: f64,
    pub y_lower: f64,
    pub y_upper: f64,
}

/// Gridlines at every integer wavelength the record's solution covers.
///
/// The tick spans the edge values at the pixel column `floor(x)`.
pub fn wavelength_marks(record: &TraceRecord, width: usize) -> Vec<WavelengthMark> {
    let targets = integer_wavelengths(&record.wavelength, width);
    compute_wavelength_to_pixel(&record.wavelength, &targets, width)
        .into_iter()
        .map(|(wavelength, x)| {
            let column = x.floor();
            WavelengthMark {
                wavelength,
                x,
                y_lower: record.lower.eval(column),
                y_upper: record.upper.eval(column),
            }
        })
        .collect()
}

/// Center-trace polynomial at slit fraction 0.5 for `order`.
///
/// Interpolates the `All` coefficients of every record of that order,
/// coefficient-by-coefficient, over the records' slit-fraction midpoints.
/// Records without a slit fraction are ignored.
pub fn mid_slit_reference(order: i64, records: &[TraceRecord]) -> Option<Polynomial> {
    let samples: Vec<(f64, &[f64])> = records
        .iter()
        .filter(|r| r.order == order)
        .filter_map(|r| Some((r.slit_fraction_mid()?, r.all.coefficients())))
        .collect();
    interp_vectors(MID_SLIT_FRACTION, &samples).map(Polynomial::from_ascending)
}

/// Slit-curvature quadratic shifted into the mid-slit reference frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LocalCurvature {
    pub a: f64,
    pub b: f64,
    pub c: f64,
}

impl LocalCurvature {
    /// Evaluate the curvature polynomials at `pixel` and shift them by the
    /// reference trace position `yc`.
    pub fn at(record: &TraceRecord, pixel: f64, yc: f64) -> Self {
        let a = record.slit_poly_a.eval(pixel);
        let b = record.slit_poly_b.eval(pixel);
        let c = record.slit_poly_c.eval(pixel);
        Self {
            a: a - pixel + yc * b + yc * yc * c,
            b: b + 2.0 * yc * c,
            c,
        }
    }

    /// Dispersion-axis position of the curved line at along-slit offset `yt`.
    pub fn x_at(&self, pixel: f64, yt: f64) -> f64 {
        pixel + yt * self.b + yt * yt * self.c
    }
}

/// A short curved segment showing the local slit tilt at one pixel.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CurvatureSegment {
    pub pixel: f64,
    pub x: Vec<f64>,
    pub y: Vec<f64>,
}

/// Curvature segment at `pixel`, computing the mid-slit reference from
/// `all_records`.
pub fn compute_curvature_segment(
    record: &TraceRecord,
    pixel: f64,
    edges: EdgeSample,
    all_records: &[TraceRecord],
) -> Option<CurvatureSegment> {
    let reference = mid_slit_reference(record.order, all_records)?;
    curvature_segment_with_reference(record, pixel, edges, &reference)
}

/// Curvature segment at `pixel` against a precomputed mid-slit reference.
///
/// Returns `None` when the slit extents at `pixel` are not finite or negative.
pub fn curvature_segment_with_reference(
    record: &TraceRecord,
    pixel: f64,
    edges: EdgeSample,
    reference: &Polynomial,
) -> Option<CurvatureSegment> {
    let ext_below = (edges.center - edges.lower).floor();
    let ext_above = (edges.upper - edges.center).floor();
    if !(ext_below.is_finite() && ext_above.is_finite()) || ext_below < 0.0 || ext_above < 0.0 {
        return None;
    }

    let yc = reference.eval(pixel);
    if !yc.is_finite() {
        return None;
    }
    let local = LocalCurvature::at(record, pixel, yc);

    let (lo, hi) = (-(ext_below as i64), ext_above as i64);
    let n = (hi - lo + 1) as usize;
    let mut x = Vec::with_capacity(n);
    let mut y = Vec::with_capacity(n);
    for yt in lo..=hi {
        let yt = yt as f64;
        x.push(local.x_at(pixel, yt));
        y.push(edges.center + yt);
    }

    Some(CurvatureSegment { pixel, x, y })
}

/// Dispersion pixels at which curvature segments are sampled.
pub fn curvature_pixels(width: usize, start: usize, stride: usize) -> Vec<f64> {
    (start..width).step_by(stride.max(1)).map(|p| p as f64).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::DETECTOR_PIXELS;

    fn poly(c: &[f64]) -> Polynomial {
        Polynomial::from_ascending(c.to_vec())
    }

    fn record(order: i64, trace_nb: i64, all: &[f64], slit_fraction: &[f64]) -> TraceRecord {
        TraceRecord {
            order,
            trace_nb,
            upper: poly(&[all[0] + 20.0]),
            lower: poly(&[all[0] - 20.0]),
            all: poly(all),
            wavelength: poly(&[1950.0, 0.02, -1.0e-6]),
            slit_fraction: slit_fraction.to_vec(),
            slit_poly_a: poly(&[0.0, 1.0]),
            slit_poly_b: poly(&[0.05]),
            slit_poly_c: poly(&[0.0]),
        }
    }

    #[test]
    fn edges_have_grid_length() {
        let r = record(3, 1, &[500.0, 0.01], &[0.0, 0.5, 1.0]);
        let grid = PixelGrid::sampled(DETECTOR_PIXELS, 16);
        let edges = evaluate_edges(&r, &grid);
        assert_eq!(edges.upper.len(), grid.len());
        assert_eq!(edges.lower.len(), grid.len());
        assert_eq!(edges.center.len(), grid.len());
        assert!((edges.center[1] - (500.0 + 0.01 * 16.0)).abs() < 1e-12);
        assert!((edges.upper[0] - 520.0).abs() < 1e-12);
    }

    #[test]
    fn nan_center_is_degenerate() {
        let grid = PixelGrid::default();
        let good = record(1, 1, &[100.0], &[0.5]);
        let bad = record(1, 2, &[f64::NAN], &[0.5]);
        assert!(!is_degenerate(&good, &grid));
        assert!(is_degenerate(&bad, &grid));
    }

    #[test]
    fn inversion_is_left_inverse_of_forward_solution() {
        for solution in [
            poly(&[1950.0, 0.02, -1.0e-6]),
            poly(&[1100.0, 0.011, 2.5e-7]),
            poly(&[2300.0, 0.03]),
        ] {
            for x0 in [0.0, 1.0, 250.5, 1024.0, 2047.0] {
                let w = solution.eval(x0);
                let x = invert_wavelength(&solution, w).expect("solution exists");
                assert!((x - x0).abs() < 1e-6, "x0={x0} recovered {x}");
            }
        }
    }

    #[test]
    fn negative_discriminant_is_skipped() {
        // w = 1000 + 2x - x², maximum w = 1001 at x = 1.
        let solution = poly(&[1000.0, 2.0, -1.0]);
        assert!(invert_wavelength(&solution, 1002.0).is_none());
        let mapped = compute_wavelength_to_pixel(&solution, &[1000.5, 1002.0, 1500.0], 2048);
        assert_eq!(mapped.len(), 1);
        assert_eq!(mapped[0].0, 1000.5);
    }

    #[test]
    fn flat_solution_has_no_inverse() {
        assert!(invert_wavelength(&poly(&[1000.0]), 1000.0).is_none());
    }

    #[test]
    fn inverted_pixels_are_clamped_into_detector() {
        let solution = poly(&[1000.0, 0.5]);
        let wavelengths = [900.0, 1000.0, 1500.0, 2500.0];
        let mapped = compute_wavelength_to_pixel(&solution, &wavelengths, 2048);
        assert_eq!(mapped.len(), 4);
        for (_, x) in &mapped {
            assert!(*x >= 0.0 && *x < 2048.0, "out of range: {x}");
        }
        assert_eq!(mapped[0].1, 0.0);
        assert_eq!(mapped[2].1, 1000.0);
        assert_eq!(mapped[3].1, 2047.0);
    }

    #[test]
    fn integer_wavelengths_span_solution() {
        // w(x) = 100 + 0.001 x -> [100.0, 102.047]
        let w = integer_wavelengths(&poly(&[100.0, 0.001]), 2048);
        assert_eq!(w, vec![100.0, 101.0, 102.0]);
    }

    #[test]
    fn runaway_solution_yields_no_marks() {
        let w = integer_wavelengths(&poly(&[1950.0, 1.0e6]), 2048);
        assert!(w.is_empty());

        let mut r = record(2, 1, &[800.0], &[0.5]);
        r.wavelength = poly(&[1950.0, 1.0e6]);
        assert!(wavelength_marks(&r, DETECTOR_PIXELS).is_empty());
    }

    #[test]
    fn wavelength_marks_span_edges() {
        let r = record(2, 1, &[800.0], &[0.5]);
        let marks = wavelength_marks(&r, DETECTOR_PIXELS);
        assert!(!marks.is_empty());
        for m in &marks {
            assert!(m.x >= 0.0 && m.x < DETECTOR_PIXELS as f64);
            assert_eq!(m.y_lower, 780.0);
            assert_eq!(m.y_upper, 820.0);
        }
    }

    #[test]
    fn mid_slit_reference_interpolates_between_traces() {
        let records = vec![
            record(5, 1, &[100.0, 0.010, 1.0e-6], &[0.2, 0.3, 0.4]),
            record(5, 2, &[140.0, 0.030, 3.0e-6], &[0.6, 0.7, 0.8]),
            record(6, 1, &[900.0, 0.5, 0.5], &[0.0, 0.5, 1.0]),
        ];
        let reference = mid_slit_reference(5, &records).unwrap();
        let want = [120.0, 0.020, 2.0e-6];
        assert_eq!(reference.coefficients().len(), want.len());
        for (got, want) in reference.coefficients().iter().zip(want) {
            assert!((got - want).abs() < 1e-12, "got {got}, want {want}");
        }
        assert!(mid_slit_reference(7, &records).is_none());
    }

    #[test]
    fn local_curvature_shift_matches_closed_form() {
        let mut r = record(1, 1, &[0.0], &[0.5]);
        r.slit_poly_a = poly(&[3.0]);
        r.slit_poly_b = poly(&[0.5]);
        r.slit_poly_c = poly(&[0.01]);
        let local = LocalCurvature::at(&r, 100.0, 10.0);
        assert!((local.a - (3.0 - 100.0 + 10.0 * 0.5 + 100.0 * 0.01)).abs() < 1e-12);
        assert!((local.b - (0.5 + 2.0 * 10.0 * 0.01)).abs() < 1e-12);
        assert_eq!(local.c, 0.01);
        assert!((local.x_at(100.0, 2.0) - (100.0 + 2.0 * local.b + 4.0 * 0.01)).abs() < 1e-12);
    }

    #[test]
    fn curvature_segment_spans_slit() {
        let records = vec![record(4, 1, &[500.0], &[0.0, 0.5, 1.0])];
        let r = &records[0];
        let edges = EdgeSample {
            upper: 510.7,
            lower: 495.2,
            center: 500.0,
        };
        let seg = compute_curvature_segment(r, 110.0, edges, &records).unwrap();
        // ext_below = floor(4.8) = 4, ext_above = floor(10.7) = 10
        assert_eq!(seg.y.len(), 15);
        assert_eq!(seg.y.first().copied(), Some(496.0));
        assert_eq!(seg.y.last().copied(), Some(510.0));
        // Center point of the slit sits on the sampled pixel.
        assert_eq!(seg.x[4], 110.0);
        // b' = 0.05 with c = 0, so x moves linearly along the slit.
        assert!((seg.x[14] - (110.0 + 10.0 * 0.05)).abs() < 1e-12);
    }

    #[test]
    fn inverted_slit_edges_produce_no_segment() {
        let records = vec![record(4, 1, &[500.0], &[0.5])];
        let edges = EdgeSample {
            upper: 490.0,
            lower: 480.0,
            center: 500.0,
        };
        assert!(compute_curvature_segment(&records[0], 10.0, edges, &records).is_none());
    }

    #[test]
    fn curvature_sampling_pixels() {
        let px = curvature_pixels(2048, 10, 100);
        assert_eq!(px.first().copied(), Some(10.0));
        assert_eq!(px.last().copied(), Some(2010.0));
        assert_eq!(px.len(), 21);
    }
}

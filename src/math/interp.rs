//! Piecewise-linear interpolation.
//!
//! Semantics follow the usual `interp(x, xp, fp)` convention:
//! - sample points are used in ascending order
//! - outside the sampled range the nearest end value is returned
//! - a single sample is returned as-is

use std::cmp::Ordering;

/// Interpolate `fp(xp)` at `x`.
///
/// Returns `None` when there are no samples.
pub fn interp(x: f64, samples: &[(f64, f64)]) -> Option<f64> {
    let mut sorted: Vec<(f64, f64)> = samples.to_vec();
    sorted.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap_or(Ordering::Equal));
    interp_sorted(x, &sorted)
}

fn interp_sorted(x: f64, sorted: &[(f64, f64)]) -> Option<f64> {
    let (first, last) = (sorted.first()?, sorted.last()?);
    if x <= first.0 {
        return Some(first.1);
    }
    if x >= last.0 {
        return Some(last.1);
    }

    for pair in sorted.windows(2) {
        let (x0, y0) = pair[0];
        let (x1, y1) = pair[1];
        if x >= x0 && x <= x1 {
            let span = x1 - x0;
            if span == 0.0 {
                return Some(y1);
            }
            let u = (x - x0) / span;
            return Some(y0 + u * (y1 - y0));
        }
    }

    Some(last.1)
}

/// Interpolate whole coefficient vectors, coefficient-by-coefficient.
///
/// Each sample is `(abscissa, coefficients)`. Vectors of unequal length are
/// zero-padded to the longest one. Returns `None` when there are no samples.
pub fn interp_vectors(x: f64, samples: &[(f64, &[f64])]) -> Option<Vec<f64>> {
    if samples.is_empty() {
        return None;
    }

    let width = samples.iter().map(|(_, v)| v.len()).max().unwrap_or(0);
    let mut ordered: Vec<&(f64, &[f64])> = samples.iter().collect();
    ordered.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap_or(Ordering::Equal));

    let mut out = Vec::with_capacity(width);
    for k in 0..width {
        let column: Vec<(f64, f64)> = ordered
            .iter()
            .map(|(xp, v)| (*xp, v.get(k).copied().unwrap_or(0.0)))
            .collect();
        out.push(interp_sorted(x, &column)?);
    }
    Some(out)
}

//! Detector image loading and display scaling.

use std::path::Path;

use ndarray::Array2;

use crate::domain::{ColorScale, Detector};
use crate::io::fits::{FitsError, FitsFile};

/// Fraction of the image maximum mapped to white by [`ColorScale::MaxFraction`].
pub const MAX_FRACTION: f64 = 0.2;

/// Percentiles mapped to black and white by [`ColorScale::Percentile`].
pub const PERCENTILE_RANGE: (f64, f64) = (5.0, 95.0);

/// A raw detector frame. `pixels[[y, x]]`, row 0 at the bottom.
#[derive(Debug, Clone, PartialEq)]
pub struct DetectorImage {
    pub detector: Detector,
    pub pixels: Array2<f64>,
}

/// A block-averaged image for rendering.
#[derive(Debug, Clone, PartialEq)]
pub struct BinnedImage {
    /// Mean of the finite source pixels in each block (NaN when none).
    pub cells: Array2<f64>,
    /// Block edge length in source pixels.
    pub factor: usize,
}

impl DetectorImage {
    pub fn width(&self) -> usize {
        self.pixels.ncols()
    }

    pub fn height(&self) -> usize {
        self.pixels.nrows()
    }

    /// Gray-level limits `(black, white)` for `scale`, ignoring NaNs.
    ///
    /// Returns `None` for images without finite pixels or with a flat range.
    pub fn display_limits(&self, scale: ColorScale) -> Option<(f64, f64)> {
        let mut finite: Vec<f64> = self.pixels.iter().copied().filter(|v| v.is_finite()).collect();
        if finite.is_empty() {
            return None;
        }

        let (lo, hi) = match scale {
            ColorScale::Percentile => {
                finite.sort_by(|a, b| a.total_cmp(b));
                (
                    percentile_sorted(&finite, PERCENTILE_RANGE.0),
                    percentile_sorted(&finite, PERCENTILE_RANGE.1),
                )
            }
            ColorScale::MaxFraction => {
                let max = finite.iter().copied().fold(f64::NEG_INFINITY, f64::max);
                (0.0, max * MAX_FRACTION)
            }
        };
        (hi > lo).then_some((lo, hi))
    }

    /// Average `factor × factor` blocks so the longest axis has at most
    /// `max_cells` cells.
    pub fn binned(&self, max_cells: usize) -> BinnedImage {
        let (h, w) = self.pixels.dim();
        let longest = h.max(w);
        let factor = longest.div_ceil(max_cells.max(1)).max(1);
        let rows = h.div_ceil(factor);
        let cols = w.div_ceil(factor);

        let cells = Array2::from_shape_fn((rows, cols), |(r, c)| {
            let y0 = r * factor;
            let x0 = c * factor;
            let block = self.pixels.slice(ndarray::s![y0..(y0 + factor).min(h), x0..(x0 + factor).min(w)]);
            let (sum, n) = block
                .iter()
                .filter(|v| v.is_finite())
                .fold((0.0, 0usize), |(s, n), &v| (s + v, n + 1));
            if n == 0 { f64::NAN } else { sum / n as f64 }
        });

        BinnedImage { cells, factor }
    }
}

/// Linear-interpolated percentile of ascending `sorted` values.
fn percentile_sorted(sorted: &[f64], p: f64) -> f64 {
    let rank = (p / 100.0).clamp(0.0, 1.0) * (sorted.len() - 1) as f64;
    let lo = rank.floor() as usize;
    let hi = rank.ceil() as usize;
    let frac = rank - lo as f64;
    sorted[lo] + (sorted[hi] - sorted[lo]) * frac
}

/// An opened detector image file.
pub struct ImageFile {
    fits: FitsFile,
}

impl ImageFile {
    pub fn open(path: &Path) -> Result<Self, FitsError> {
        Ok(Self {
            fits: FitsFile::open(path)?,
        })
    }

    pub fn path(&self) -> &Path {
        self.fits.path()
    }

    /// Image of `detector`, or `None` when the file has no such extension.
    pub fn chip(&mut self, detector: Detector) -> Result<Option<DetectorImage>, FitsError> {
        let Some(index) = self.fits.detector_hdu(detector) else {
            return Ok(None);
        };
        let pixels = self.fits.image(index)?;
        Ok(Some(DetectorImage { detector, pixels }))
    }
}

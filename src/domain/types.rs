//! Shared domain types.
//!
//! These types are intentionally kept lightweight so they can be:
//!
//! - built once per run from FITS tables
//! - passed between the geometry evaluator and the renderers
//! - serialized for geometry exports

use std::path::PathBuf;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::math::Polynomial;

/// Full detector width in pixels (the dispersion axis).
pub const DETECTOR_PIXELS: usize = 2048;

/// Number of detector frames in a trace or image file.
pub const DETECTOR_COUNT: usize = 3;

/// One of the three physical detector channels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Detector {
    #[serde(rename = "CHIP1")]
    Chip1,
    #[serde(rename = "CHIP2")]
    Chip2,
    #[serde(rename = "CHIP3")]
    Chip3,
}

impl Detector {
    pub const ALL: [Detector; DETECTOR_COUNT] = [Detector::Chip1, Detector::Chip2, Detector::Chip3];

    /// 1-based detector number, also the fallback HDU index.
    pub fn number(self) -> usize {
        match self {
            Detector::Chip1 => 1,
            Detector::Chip2 => 2,
            Detector::Chip3 => 3,
        }
    }

    pub fn from_number(n: usize) -> Option<Self> {
        match n {
            1 => Some(Detector::Chip1),
            2 => Some(Detector::Chip2),
            3 => Some(Detector::Chip3),
            _ => None,
        }
    }

    /// Canonical extension name (`CHIP1` ...).
    pub fn extname(self) -> String {
        format!("CHIP{}", self.number())
    }

    /// Extension holding extracted spectra (`CHIP1.INT1` ...).
    pub fn spectrum_extname(self) -> String {
        format!("CHIP{}.INT1", self.number())
    }
}

impl std::fmt::Display for Detector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "CHIP{}", self.number())
    }
}

/// One trace table row: the polynomials describing a single trace of an order.
///
/// All polynomials are in ascending power order (see `math::poly`).
#[derive(Debug, Clone, PartialEq)]
pub struct TraceRecord {
    pub order: i64,
    pub trace_nb: i64,
    pub upper: Polynomial,
    pub lower: Polynomial,
    pub all: Polynomial,
    pub wavelength: Polynomial,
    /// Fractional slit positions spanned by this trace.
    ///
    /// Pipeline products store three values (lower, middle, upper); older
    /// products store only the bounding pair.
    pub slit_fraction: Vec<f64>,
    pub slit_poly_a: Polynomial,
    pub slit_poly_b: Polynomial,
    pub slit_poly_c: Polynomial,
}

impl TraceRecord {
    /// Representative slit position of this trace.
    pub fn slit_fraction_mid(&self) -> Option<f64> {
        match self.slit_fraction.as_slice() {
            [] => None,
            [only] => Some(*only),
            [lo, hi] => Some(0.5 * (lo + hi)),
            [_, mid, ..] => Some(*mid),
        }
    }
}

/// Ordered x-coordinates at which curves are evaluated.
#[derive(Debug, Clone, PartialEq)]
pub struct PixelGrid {
    xs: Vec<f64>,
    width: usize,
}

impl PixelGrid {
    /// Every pixel `0..width`.
    pub fn full(width: usize) -> Self {
        Self::sampled(width, 1)
    }

    /// Every `step`-th pixel of `0..width`, always including the last pixel.
    pub fn sampled(width: usize, step: usize) -> Self {
        let step = step.max(1);
        let mut xs: Vec<f64> = (0..width).step_by(step).map(|x| x as f64).collect();
        if width > 0 && (width - 1) % step != 0 {
            xs.push((width - 1) as f64);
        }
        Self { xs, width }
    }

    pub fn xs(&self) -> &[f64] {
        &self.xs
    }

    pub fn len(&self) -> usize {
        self.xs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.xs.is_empty()
    }

    /// Detector width covered by this grid; valid pixels are `[0, width)`.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Pixel at the middle of the detector (annotation anchor).
    pub fn mid_pixel(&self) -> f64 {
        (self.width / 2) as f64
    }

    /// Grid index closest to `pixel`.
    pub fn nearest_index(&self, pixel: f64) -> Option<usize> {
        if self.xs.is_empty() || !pixel.is_finite() {
            return None;
        }
        let idx = self.xs.partition_point(|&x| x < pixel);
        if idx == 0 {
            return Some(0);
        }
        if idx >= self.xs.len() {
            return Some(self.xs.len() - 1);
        }
        let below = pixel - self.xs[idx - 1];
        let above = self.xs[idx] - pixel;
        Some(if below <= above { idx - 1 } else { idx })
    }
}

impl Default for PixelGrid {
    fn default() -> Self {
        Self::full(DETECTOR_PIXELS)
    }
}

/// How the detector image is mapped to gray levels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum ColorScale {
    /// Black at the 5th percentile, white at the 95th.
    Percentile,
    /// Black at zero, white at 20% of the maximum.
    MaxFraction,
}

/// Which text annotation is placed on each trace.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum LabelStyle {
    None,
    /// `order: N` / `trace: M`.
    Order,
    /// Order and trace plus the slit fractions.
    Slit,
}

/// What the trace overlay draws in addition to the edge curves.
#[derive(Debug, Clone, PartialEq)]
pub struct OverlayOptions {
    pub wavelength_marks: bool,
    pub curvature: bool,
    /// First dispersion pixel sampled for curvature segments.
    pub curvature_start: usize,
    /// Distance between curvature samples.
    pub curvature_stride: usize,
    pub labels: LabelStyle,
}

impl Default for OverlayOptions {
    fn default() -> Self {
        Self {
            wavelength_marks: true,
            curvature: true,
            curvature_start: 10,
            curvature_stride: 100,
            labels: LabelStyle::Order,
        }
    }
}

/// A full `trace-view trace` run's configuration.
///
/// This is derived from CLI flags (plus defaults).
#[derive(Debug, Clone)]
pub struct TraceConfig {
    pub trace_path: PathBuf,
    pub image_path: Option<PathBuf>,
    pub spectrum_path: Option<PathBuf>,
    pub detectors: Vec<Detector>,
    pub grid_step: usize,
    pub overlay: OverlayOptions,
    pub scale: ColorScale,
    /// Image downsampling: the longest image axis is binned to this many cells.
    pub image_bins: usize,
    pub output: PathBuf,
    pub show: bool,
    pub preview: bool,
    pub preview_width: usize,
    pub preview_height: usize,
    pub export_geometry: Option<PathBuf>,
}

/// A full `trace-view wavecal` run's configuration.
#[derive(Debug, Clone)]
pub struct WavecalConfig {
    pub spectrum_path: PathBuf,
    pub catalog_path: Option<PathBuf>,
    pub catalog2_path: Option<PathBuf>,
    pub trace_path: Option<PathBuf>,
    pub out_dir: PathBuf,
}

//! Wavelength-calibration overlays.
//!
//! Extracted spectra of every order and detector are drawn against one or
//! two emission line catalogs. One figure is produced per (order, detector);
//! each figure shows every spectrum, zoomed to that order's wavelength span.
//!
//! When a trace table is supplied, the wavelength axis of each spectrum is
//! recomputed from the table's solution for trace 1 of the order, so a new
//! solution can be checked before the spectra are re-extracted.

use tracing::{debug, warn};

use crate::domain::{DETECTOR_PIXELS, Detector};
use crate::io::fits::FitsError;
use crate::io::{SpectrumFile, TraceFile};
use crate::math::Polynomial;

/// Vertical plot range shared by all figures.
pub const Y_RANGE: (f64, f64) = (-3000.0, 5000.0);

/// Height of the order labels.
pub const LABEL_Y: f64 = 3000.0;

/// Catalog lines are drawn from 0 down to `-CATALOG_SCALE * emission`.
pub const CATALOG_SCALE: f64 = 50.0;

/// Fallback setting id when the primary header has none.
pub const UNKNOWN_SETTING: &str = "unknown";

#[derive(Debug, Clone, PartialEq)]
pub struct WavecalLabel {
    pub x: f64,
    pub y: f64,
    pub text: String,
}

/// One spectrum as drawn.
#[derive(Debug, Clone, PartialEq)]
pub struct SpectrumCurve {
    pub detector: Detector,
    pub order: i64,
    pub wavelength: Vec<f64>,
    pub flux: Vec<f64>,
    pub label: WavecalLabel,
    /// True when the wavelengths come from the trace table's solution.
    pub recomputed: bool,
}

impl SpectrumCurve {
    /// Finite `(min, max)` wavelength.
    pub fn wavelength_span(&self) -> Option<(f64, f64)> {
        finite_span(&self.wavelength)
    }

    /// `(wavelength, flux)` pairs with both values finite.
    pub fn points(&self) -> impl Iterator<Item = (f64, f64)> + '_ {
        self.wavelength
            .iter()
            .zip(&self.flux)
            .map(|(&w, &f)| (w, f))
            .filter(|(w, f)| w.is_finite() && f.is_finite())
    }
}

/// A saved view onto the shared plot.
#[derive(Debug, Clone, PartialEq)]
pub struct WavecalFigure {
    pub order: i64,
    pub detector: Detector,
    pub x_range: (f64, f64),
    pub y_range: (f64, f64),
    pub file_name: String,
}

/// Every spectrum plus the figures to save.
#[derive(Debug, Clone, PartialEq)]
pub struct WavecalPlot {
    pub setting: String,
    pub curves: Vec<SpectrumCurve>,
    pub figures: Vec<WavecalFigure>,
}

/// Output file name of one figure.
pub fn figure_file_name(setting: &str, order: i64, detector: Detector) -> String {
    format!("wavecal_{setting}_o{order}_d{}.svg", detector.number())
}

/// Pixel positions used when recomputing wavelengths (1-based).
pub fn trace_pixels() -> Vec<f64> {
    (1..=DETECTOR_PIXELS).map(|x| x as f64).collect()
}

/// Collect spectra and figures from a spectrum file and optional trace table.
pub fn build_wavecal(spectrum: &mut SpectrumFile, mut trace: Option<&mut TraceFile>) -> Result<WavecalPlot, FitsError> {
    let setting = spectrum.setting_id().unwrap_or_else(|| {
        warn!(
            file = %spectrum.path().display(),
            "spectrum has no setting keyword, using '{UNKNOWN_SETTING}'"
        );
        UNKNOWN_SETTING.to_string()
    });

    let pixels = trace_pixels();
    let mut curves = Vec::new();

    for detector in Detector::ALL {
        let Some(chip) = spectrum.chip(detector)? else {
            warn!(%detector, "spectrum has no extension {}, skipping", detector.spectrum_extname());
            continue;
        };
        for order in &chip.all_nan {
            debug!(%detector, order, "spectrum is all NaN, skipping");
        }

        let mut chip_trace = match trace.as_deref_mut() {
            Some(t) if !t.has_chip(detector) => {
                warn!(%detector, file = %t.path().display(), "trace table has no extension, keeping extracted wavelengths");
                None
            }
            other => other,
        };

        for s in chip.spectra {
            let mut wavelength = s.wavelength;
            let mut recomputed = false;
            if let Some(trace) = chip_trace.as_deref_mut() {
                match trace.wavelength_solution(detector, s.order)? {
                    Some(solution) => {
                        if let Some(w) = recompute_wavelengths(&solution, &pixels) {
                            wavelength = w;
                            recomputed = true;
                        }
                    }
                    None => warn!(%detector, order = s.order, "trace table has no trace 1 for order"),
                }
            }

            let label = WavecalLabel {
                x: finite_mean(&wavelength).unwrap_or(f64::NAN),
                y: LABEL_Y,
                text: format!("(O:{} D:{} X:{:.2})", s.order, detector.number(), s.xcorr),
            };
            curves.push(SpectrumCurve {
                detector,
                order: s.order,
                wavelength,
                flux: s.flux,
                label,
                recomputed,
            });
        }
    }

    let figures = curves
        .iter()
        .filter_map(|c| {
            let Some(x_range) = c.wavelength_span() else {
                warn!(detector = %c.detector, order = c.order, "no finite wavelengths, skipping figure");
                return None;
            };
            Some(WavecalFigure {
                order: c.order,
                detector: c.detector,
                x_range,
                y_range: Y_RANGE,
                file_name: figure_file_name(&setting, c.order, c.detector),
            })
        })
        .collect();

    Ok(WavecalPlot {
        setting,
        curves,
        figures,
    })
}

/// Evaluate a trace-table wavelength solution; `None` when any coefficient
/// is NaN (the extracted wavelengths are kept).
pub fn recompute_wavelengths(solution: &Polynomial, pixels: &[f64]) -> Option<Vec<f64>> {
    if solution.is_empty() || solution.has_nan() {
        return None;
    }
    Some(solution.eval_many(pixels))
}

fn finite_span(values: &[f64]) -> Option<(f64, f64)> {
    let (lo, hi) = values
        .iter()
        .filter(|v| v.is_finite())
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| (lo.min(v), hi.max(v)));
    (lo.is_finite() && hi > lo).then_some((lo, hi))
}

fn finite_mean(values: &[f64]) -> Option<f64> {
    let (sum, n) = values
        .iter()
        .filter(|v| v.is_finite())
        .fold((0.0, 0usize), |(s, n), &v| (s + v, n + 1));
    (n > 0).then(|| sum / n as f64)
}

//! Extracted 1-D spectra.
//!
//! Each detector has a `CHIPn.INT1` table with one row per pixel and a pair
//! of columns per order: `OO_01_WL` (wavelength) and `OO_01_SPEC` (flux),
//! where `OO` is the two-digit order number. Orders not present in a chip's
//! table are simply absent.

use std::path::Path;

use crate::domain::Detector;
use crate::io::fits::{FitsError, FitsFile};

/// Orders looked up in every spectrum table.
pub const ORDERS: std::ops::RangeInclusive<i64> = 1..=9;

/// Primary header keyword holding the instrument setting.
pub const SETTING_KEYWORD: &str = "ESO INS WLEN ID";

/// One order's extracted spectrum on one detector.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderSpectrum {
    pub detector: Detector,
    pub order: i64,
    pub wavelength: Vec<f64>,
    pub flux: Vec<f64>,
    /// Best cross-correlation of the wavelength calibration (0 when absent).
    pub xcorr: f64,
}

/// Spectra found on one detector.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChipSpectra {
    pub spectra: Vec<OrderSpectrum>,
    /// Orders whose flux column is entirely NaN.
    pub all_nan: Vec<i64>,
}

pub fn wavelength_column(order: i64) -> String {
    format!("{order:02}_01_WL")
}

pub fn flux_column(order: i64) -> String {
    format!("{order:02}_01_SPEC")
}

pub fn xcorr_keyword(order: i64) -> String {
    format!("ESO QC WAVE BESTXCORR-{order:02}-01")
}

/// An opened extracted-spectrum file.
pub struct SpectrumFile {
    fits: FitsFile,
}

impl SpectrumFile {
    pub fn open(path: &Path) -> Result<Self, FitsError> {
        Ok(Self {
            fits: FitsFile::open(path)?,
        })
    }

    pub fn path(&self) -> &Path {
        self.fits.path()
    }

    /// Instrument setting with `/` replaced by `_`, safe for file names.
    pub fn setting_id(&mut self) -> Option<String> {
        self.fits
            .read_key_str(0, SETTING_KEYWORD)
            .map(|s| s.trim().replace('/', "_"))
            .filter(|s| !s.is_empty())
    }

    /// Every order with data on `detector`; `None` when the `CHIPn.INT1`
    /// extension is missing.
    pub fn chip(&mut self, detector: Detector) -> Result<Option<ChipSpectra>, FitsError> {
        let Some(index) = self.fits.hdu_by_name(&detector.spectrum_extname()) else {
            return Ok(None);
        };

        let mut out = ChipSpectra::default();
        let mut table = self.fits.table(index)?;
        for order in ORDERS {
            let (wl_col, flux_col) = (wavelength_column(order), flux_column(order));
            if !(table.has_column(&wl_col) && table.has_column(&flux_col)) {
                continue;
            }
            let flux = table.read_column(&flux_col)?;
            if flux.iter().all(|v| v.is_nan()) {
                out.all_nan.push(order);
                continue;
            }
            out.spectra.push(OrderSpectrum {
                detector,
                order,
                wavelength: table.read_column(&wl_col)?,
                flux,
                xcorr: 0.0,
            });
        }

        for spectrum in &mut out.spectra {
            if let Some(xcorr) = self.fits.read_key_f64(index, &xcorr_keyword(spectrum.order)) {
                spectrum.xcorr = xcorr;
            }
        }
        Ok(Some(out))
    }
}

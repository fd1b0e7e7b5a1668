//! FITS access through cfitsio (`fitsio`).
//!
//! Thin adapters over `fitsio::FitsFile` for what the loaders need:
//! - extension lookup by `EXTNAME`, including the per-detector convention
//! - header keywords (cfitsio resolves `HIERARCH ESO ...` names)
//! - 2-D images as `Array2<f64>` with BSCALE/BZERO applied
//! - binary-table columns, scalar and fixed-width vector
//!
//! Extension names are read once on open; every read goes back to the file.

use std::path::{Path, PathBuf};

use fitsio::hdu::HduInfo;
use ndarray::Array2;
use thiserror::Error;

use crate::domain::Detector;
use crate::error::AppError;

pub mod table;

#[cfg(test)]
pub(crate) mod testkit;

pub use table::BinTable;

/// Errors that can occur while reading a FITS file.
#[derive(Error, Debug)]
pub enum FitsError {
    #[error("failed to read '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to open '{path}': {source}")]
    Open {
        path: String,
        #[source]
        source: fitsio::errors::Error,
    },
    #[error("FITS I/O error: {0}")]
    FitsIo(#[from] fitsio::errors::Error),
    #[error("HDU {hdu}: missing or invalid keyword {keyword}")]
    MissingKeyword { hdu: usize, keyword: String },
    #[error("HDU {hdu} is not {expected}")]
    WrongHduType { hdu: usize, expected: &'static str },
    #[error("table column not found: {0}")]
    ColumnNotFound(String),
    #[error("column {column}: {reason}")]
    UnsupportedColumn { column: String, reason: &'static str },
    #[error("column {column}: cfitsio status {status}")]
    ColumnRead { column: String, status: i32 },
    #[error("HDU {hdu}: {reason}")]
    Malformed { hdu: usize, reason: String },
}

impl From<FitsError> for AppError {
    fn from(err: FitsError) -> Self {
        AppError::new(2, format!("FITS error: {err}"))
    }
}

/// An open FITS file.
pub struct FitsFile {
    path: PathBuf,
    len: u64,
    fits: fitsio::FitsFile,
    /// Trimmed `EXTNAME` per HDU; index 0 is the primary.
    extnames: Vec<Option<String>>,
}

impl FitsFile {
    pub fn open(path: &Path) -> Result<Self, FitsError> {
        let len = std::fs::metadata(path)
            .map_err(|source| FitsError::Io {
                path: path.display().to_string(),
                source,
            })?
            .len();
        let mut fits = fitsio::FitsFile::open(path).map_err(|source| FitsError::Open {
            path: path.display().to_string(),
            source,
        })?;

        let count = fits.iter().count();
        let mut extnames = Vec::with_capacity(count);
        for index in 0..count {
            let hdu = fits.hdu(index)?;
            let name = hdu
                .read_key::<String>(&mut fits, "EXTNAME")
                .ok()
                .map(|n| n.trim().to_string())
                .filter(|n| !n.is_empty());
            extnames.push(name);
        }

        Ok(Self {
            path: path.to_path_buf(),
            len,
            fits,
            extnames,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Number of HDUs, primary included.
    pub fn hdu_count(&self) -> usize {
        self.extnames.len()
    }

    pub fn extname(&self, index: usize) -> Option<&str> {
        self.extnames.get(index)?.as_deref()
    }

    /// First extension whose `EXTNAME` equals `name` (case-insensitive).
    pub fn hdu_by_name(&self, name: &str) -> Option<usize> {
        (1..self.hdu_count()).find(|&i| self.extname(i).is_some_and(|n| n.eq_ignore_ascii_case(name)))
    }

    /// Locate the extension of a detector frame.
    ///
    /// Matches `EXTNAME = CHIPn` or any `CHIPn.<suffix>`; files without
    /// extension names fall back to HDU index `n`.
    pub fn detector_hdu(&self, detector: Detector) -> Option<usize> {
        let wanted = detector.extname();
        let prefix = format!("{wanted}.");
        let by_name = (1..self.hdu_count()).find(|&i| {
            self.extname(i).is_some_and(|n| {
                let n = n.to_ascii_uppercase();
                n == wanted || n.starts_with(&prefix)
            })
        });
        if by_name.is_some() {
            return by_name;
        }

        let any_named = (1..self.hdu_count()).any(|i| self.extname(i).is_some());
        if any_named || detector.number() >= self.hdu_count() {
            return None;
        }
        Some(detector.number())
    }

    /// String keyword of an HDU; `None` when absent.
    pub fn read_key_str(&mut self, index: usize, keyword: &str) -> Option<String> {
        let hdu = self.fits.hdu(index).ok()?;
        hdu.read_key::<String>(&mut self.fits, keyword).ok()
    }

    /// Numeric keyword of an HDU; `None` when absent or not a number.
    pub fn read_key_f64(&mut self, index: usize, keyword: &str) -> Option<f64> {
        let hdu = self.fits.hdu(index).ok()?;
        hdu.read_key::<f64>(&mut self.fits, keyword).ok()
    }

    /// Read a 2-D image HDU (row index = detector y).
    pub fn image(&mut self, index: usize) -> Result<Array2<f64>, FitsError> {
        let hdu = self.fits.hdu(index)?;
        if !matches!(hdu.info, HduInfo::ImageInfo { .. }) {
            return Err(FitsError::WrongHduType {
                hdu: index,
                expected: "an image",
            });
        }

        let mut key = |keyword: &str| {
            hdu.read_key::<i64>(&mut self.fits, keyword)
                .map_err(|_| FitsError::MissingKeyword {
                    hdu: index,
                    keyword: keyword.to_string(),
                })
        };
        let naxis = key("NAXIS")?;
        if naxis != 2 {
            return Err(FitsError::Malformed {
                hdu: index,
                reason: format!("expected a 2-D image, NAXIS = {naxis}"),
            });
        }
        let bitpix = key("BITPIX")?;
        let naxis1 = key("NAXIS1")?;
        let naxis2 = key("NAXIS2")?;

        let (width, height) = image_shape(index, naxis1, naxis2, bitpix, self.len)?;
        let pixels: Vec<f64> = hdu.read_image(&mut self.fits)?;
        Array2::from_shape_vec((height, width), pixels).map_err(|e| FitsError::Malformed {
            hdu: index,
            reason: format!("cannot shape image as {height} x {width}: {e}"),
        })
    }

    /// Open a binary-table HDU for column reads.
    pub fn table(&mut self, index: usize) -> Result<BinTable<'_>, FitsError> {
        BinTable::new(&mut self.fits, index)
    }
}

/// Image axes as `(width, height)`, checked against the size of the file.
fn image_shape(index: usize, naxis1: i64, naxis2: i64, bitpix: i64, file_len: u64) -> Result<(usize, usize), FitsError> {
    let malformed = |reason: String| FitsError::Malformed { hdu: index, reason };
    let width = usize::try_from(naxis1).map_err(|_| malformed(format!("invalid NAXIS1 {naxis1}")))?;
    let height = usize::try_from(naxis2).map_err(|_| malformed(format!("invalid NAXIS2 {naxis2}")))?;
    let bytes_per_pixel = (bitpix.unsigned_abs() / 8) as usize;

    let data_len = width
        .checked_mul(height)
        .and_then(|n| n.checked_mul(bytes_per_pixel))
        .ok_or_else(|| malformed(format!("image size {naxis1} x {naxis2} overflows")))?;
    if data_len as u64 > file_len {
        return Err(malformed(format!(
            "image data ({data_len} bytes) is larger than the file ({file_len} bytes)"
        )));
    }
    Ok((width, height))
}

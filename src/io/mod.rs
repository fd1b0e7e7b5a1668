//! Input/output helpers.
//!
//! - FITS access through cfitsio (`fits`)
//! - typed loaders for trace tables, detector images, spectra and line
//!   catalogs (`trace`, `image`, `spectrum`, `catalog`)
//! - geometry JSON export (`export`)

pub mod catalog;
pub mod export;
pub mod fits;
pub mod image;
pub mod spectrum;
pub mod trace;

pub use catalog::{CatalogLine, LineCatalog};
pub use export::write_geometry_json;
pub use fits::{FitsError, FitsFile};
pub use image::{BinnedImage, DetectorImage, ImageFile};
pub use spectrum::{ChipSpectra, OrderSpectrum, SpectrumFile};
pub use trace::{ChipTable, TraceFile};

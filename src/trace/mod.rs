//! Trace overlay construction.
//!
//! - `geometry`: pure evaluation of trace polynomials (edges, wavelength
//!   gridlines, slit-curvature segments)
//! - `overlay`: per-detector collection of everything drawn on a panel

pub mod geometry;
pub mod overlay;

pub use geometry::*;
pub use overlay::*;

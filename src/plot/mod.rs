//! Rendering of trace and wavecal overlays.
//!
//! - `trace_chart`: per-detector trace panels (SVG file and terminal viewer)
//! - `wavecal_chart`: spectrum-vs-catalog figures
//! - `ascii`: plain-text chip preview
//! - `clip`: polyline clipping shared by the Plotters renderers

pub mod ascii;
pub mod clip;
pub mod trace_chart;
pub mod wavecal_chart;

pub use ascii::render_chip_preview;
pub use trace_chart::{ChipPanel, Layers, PanelImage, PanelStyle, save_trace_svg};
pub use wavecal_chart::save_wavecal_figures;

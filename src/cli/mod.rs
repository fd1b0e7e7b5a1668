//! Command-line parsing for the trace/wavecal diagnostic viewer.
//!
//! Argument parsing and command dispatch stay separate from the geometry and
//! rendering code.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::domain::{ColorScale, LabelStyle};

pub mod picker;

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(
    name = "trace-view",
    version,
    about = "Diagnostic plots of spectrograph trace tables and wavelength calibrations"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Overlay trace edges, wavelength ticks and slit curvature per detector.
    Trace(TraceArgs),
    /// Overlay extracted spectra on emission line catalogs.
    Wavecal(WavecalArgs),
}

/// Options for `trace-view trace`.
#[derive(Debug, Parser, Clone)]
pub struct TraceArgs {
    /// Trace table FITS file.
    #[arg(value_name = "TRACE")]
    pub trace: PathBuf,

    /// Detector image FITS file drawn underneath the traces.
    #[arg(value_name = "IMAGE")]
    pub image: Option<PathBuf>,

    /// Extracted spectrum FITS file (checked for readability only).
    #[arg(value_name = "SPECTRUM")]
    pub spectrum: Option<PathBuf>,

    /// Output SVG path (default: the trace file name with `.svg`).
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Open the interactive terminal viewer.
    #[arg(long)]
    pub show: bool,

    /// Print an ASCII preview of every loaded detector.
    #[arg(long)]
    pub preview: bool,

    /// Restrict to detector N (1-3); repeatable.
    #[arg(long = "chip", value_name = "N", value_parser = clap::value_parser!(u8).range(1..=3))]
    pub chips: Vec<u8>,

    /// How the detector image is mapped to gray levels.
    #[arg(long, value_enum, default_value_t = ColorScale::Percentile)]
    pub scale: ColorScale,

    /// Text placed at the middle of each trace.
    #[arg(long, value_enum, default_value_t = LabelStyle::Order)]
    pub labels: LabelStyle,

    /// Skip slit-curvature segments.
    #[arg(long)]
    pub no_curvature: bool,

    /// Skip integer-wavelength ticks.
    #[arg(long)]
    pub no_wavelength: bool,

    /// Pixel distance between curvature segments.
    #[arg(long, default_value_t = 100)]
    pub curvature_stride: usize,

    /// First pixel sampled for curvature segments.
    #[arg(long, default_value_t = 10)]
    pub curvature_start: usize,

    /// Evaluate edge curves every N pixels.
    #[arg(long, default_value_t = 1)]
    pub grid_step: usize,

    /// Bin the image so its longest axis has at most N cells.
    #[arg(long, default_value_t = 128)]
    pub image_bins: usize,

    /// Preview width (columns).
    #[arg(long, default_value_t = 100)]
    pub width: usize,

    /// Preview height (rows).
    #[arg(long, default_value_t = 25)]
    pub height: usize,

    /// Export the evaluated geometry to JSON.
    #[arg(long = "export-geometry", value_name = "JSON")]
    pub export_geometry: Option<PathBuf>,
}

/// Options for `trace-view wavecal`.
#[derive(Debug, Parser, Clone)]
pub struct WavecalArgs {
    /// Extracted spectrum FITS file.
    #[arg(value_name = "SPECTRUM")]
    pub spectrum: PathBuf,

    /// Emission line catalog (drawn gray).
    #[arg(value_name = "CATALOG")]
    pub catalog: Option<PathBuf>,

    /// Second line catalog (drawn green).
    #[arg(value_name = "CATALOG2")]
    pub catalog2: Option<PathBuf>,

    /// Trace table whose wavelength solutions replace the extracted ones.
    #[arg(value_name = "TRACE")]
    pub trace: Option<PathBuf>,

    /// Directory receiving the figures.
    #[arg(long, default_value = ".")]
    pub out_dir: PathBuf,
}

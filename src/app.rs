//! Top-level application orchestration.
//!
//! `src/main.rs` is tiny; this module is the "real main" that:
//! - loads `.env` and starts logging
//! - parses CLI arguments
//! - runs the trace or wavecal pipeline
//! - writes figures, previews and exports, or opens the viewer

use std::ffi::OsString;
use std::path::{Path, PathBuf};

use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::cli::{Command, TraceArgs, WavecalArgs};
use crate::domain::{Detector, OverlayOptions, TraceConfig, WavecalConfig};
use crate::error::AppError;

pub mod pipeline;

/// Entry point for the `trace-view` binary.
pub fn run() -> Result<(), AppError> {
    dotenvy::dotenv().ok();
    init_logging();

    // `trace-view` alone prompts for a trace table; `trace-view tw.fits ...`
    // means `trace-view trace tw.fits ...`. Clap needs the subcommand name,
    // so argv is rewritten before parsing.
    let mut argv: Vec<String> = std::env::args().collect();
    if argv.len() == 1 {
        let path = crate::cli::picker::prompt_for_trace_table()?;
        argv.push("trace".to_string());
        argv.push(path.display().to_string());
    }
    let cli = crate::cli::Cli::parse_from(rewrite_args(argv));

    match cli.command {
        Command::Trace(args) => handle_trace(args),
        Command::Wavecal(args) => handle_wavecal(args),
    }
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

fn handle_trace(args: TraceArgs) -> Result<(), AppError> {
    let config = trace_config_from_args(&args);
    let run = pipeline::run_trace(&config)?;

    crate::plot::save_trace_svg(&config.output, &run.panels)?;
    info!(file = %config.output.display(), "saved trace figure");

    println!("{}", crate::report::format_trace_summary(&run, &config));

    if config.preview {
        for overlay in run.overlays() {
            println!(
                "{}",
                crate::plot::render_chip_preview(&overlay, config.preview_width, config.preview_height)
            );
        }
    }

    if let Some(path) = &config.export_geometry {
        crate::io::write_geometry_json(path, &config, &run.overlays())?;
        info!(file = %path.display(), "wrote geometry export");
    }

    if config.show {
        let title = config.trace_path.display().to_string();
        crate::tui::run(run.panels, title)?;
    }

    Ok(())
}

fn handle_wavecal(args: WavecalArgs) -> Result<(), AppError> {
    let config = wavecal_config_from_args(&args);
    std::fs::create_dir_all(&config.out_dir).map_err(|e| {
        AppError::new(
            2,
            format!("Failed to create output directory '{}': {e}", config.out_dir.display()),
        )
    })?;

    let run = pipeline::run_wavecal(&config)?;
    let written = crate::plot::save_wavecal_figures(&config.out_dir, &run.plot, &run.catalogs)?;
    info!(figures = written.len(), dir = %config.out_dir.display(), "saved wavecal figures");

    println!("{}", crate::report::format_wavecal_summary(&run, &written));
    Ok(())
}

pub fn trace_config_from_args(args: &TraceArgs) -> TraceConfig {
    let detectors = if args.chips.is_empty() {
        Detector::ALL.to_vec()
    } else {
        Detector::ALL
            .into_iter()
            .filter(|d| args.chips.iter().any(|&n| usize::from(n) == d.number()))
            .collect()
    };

    TraceConfig {
        trace_path: args.trace.clone(),
        image_path: args.image.clone(),
        spectrum_path: args.spectrum.clone(),
        detectors,
        grid_step: args.grid_step.max(1),
        overlay: OverlayOptions {
            wavelength_marks: !args.no_wavelength,
            curvature: !args.no_curvature,
            curvature_start: args.curvature_start,
            curvature_stride: args.curvature_stride.max(1),
            labels: args.labels,
        },
        scale: args.scale,
        image_bins: args.image_bins.max(1),
        output: args.output.clone().unwrap_or_else(|| default_output(&args.trace)),
        show: args.show,
        preview: args.preview,
        preview_width: args.width,
        preview_height: args.height,
        export_geometry: args.export_geometry.clone(),
    }
}

pub fn wavecal_config_from_args(args: &WavecalArgs) -> WavecalConfig {
    WavecalConfig {
        spectrum_path: args.spectrum.clone(),
        catalog_path: args.catalog.clone(),
        catalog2_path: args.catalog2.clone(),
        trace_path: args.trace.clone(),
        out_dir: args.out_dir.clone(),
    }
}

/// `tw.fits` -> `tw.svg`; any other name gets `.svg` appended.
pub fn default_output(trace: &Path) -> PathBuf {
    let is_fits = trace
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("fits"));
    if is_fits {
        return trace.with_extension("svg");
    }
    let mut name = OsString::from(trace.as_os_str());
    name.push(".svg");
    PathBuf::from(name)
}

/// Rewrite argv so a bare trace path defaults to the `trace` subcommand.
///
/// Rules:
/// - `trace-view --help/--version/-h/help` -> unchanged
/// - `trace-view trace|wavecal ...`        -> unchanged
/// - `trace-view tw.fits ...`              -> `trace-view trace tw.fits ...`
/// - `trace-view --show tw.fits`           -> `trace-view trace --show tw.fits`
fn rewrite_args(mut argv: Vec<String>) -> Vec<String> {
    let Some(arg1) = argv.get(1) else {
        return argv;
    };

    let is_top_level = matches!(
        arg1.as_str(),
        "-h" | "--help" | "-V" | "--version" | "help" | "trace" | "wavecal"
    );
    if !is_top_level {
        argv.insert(1, "trace".to_string());
    }
    argv
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ColorScale, LabelStyle};

    fn argv(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    fn trace_args(extra: &[&str]) -> TraceArgs {
        let mut full = vec!["trace-view", "trace"];
        full.extend_from_slice(extra);
        match crate::cli::Cli::parse_from(full).command {
            Command::Trace(args) => args,
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn bare_path_defaults_to_trace() {
        assert_eq!(
            rewrite_args(argv(&["trace-view", "tw.fits", "--show"])),
            argv(&["trace-view", "trace", "tw.fits", "--show"])
        );
        assert_eq!(
            rewrite_args(argv(&["trace-view", "--preview", "tw.fits"])),
            argv(&["trace-view", "trace", "--preview", "tw.fits"])
        );
    }

    #[test]
    fn subcommands_and_help_are_unchanged() {
        for args in [
            argv(&["trace-view", "--help"]),
            argv(&["trace-view", "-V"]),
            argv(&["trace-view", "wavecal", "spec.fits"]),
            argv(&["trace-view", "trace", "tw.fits"]),
            argv(&["trace-view"]),
        ] {
            assert_eq!(rewrite_args(args.clone()), args);
        }
    }

    #[test]
    fn default_output_replaces_fits_suffix() {
        assert_eq!(default_output(Path::new("data/tw.fits")), PathBuf::from("data/tw.svg"));
        assert_eq!(default_output(Path::new("tw.FITS")), PathBuf::from("tw.svg"));
        assert_eq!(default_output(Path::new("tw.fits.fz")), PathBuf::from("tw.fits.fz.svg"));
        assert_eq!(default_output(Path::new("trace")), PathBuf::from("trace.svg"));
    }

    #[test]
    fn trace_flags_map_to_config() {
        let args = trace_args(&[
            "tw.fits",
            "flat.fits",
            "--chip",
            "3",
            "--chip",
            "1",
            "--no-curvature",
            "--labels",
            "slit",
            "--scale",
            "max-fraction",
            "--grid-step",
            "0",
            "-o",
            "out.svg",
        ]);
        let config = trace_config_from_args(&args);

        assert_eq!(config.detectors, vec![Detector::Chip1, Detector::Chip3]);
        assert_eq!(config.image_path, Some(PathBuf::from("flat.fits")));
        assert_eq!(config.spectrum_path, None);
        assert!(!config.overlay.curvature);
        assert!(config.overlay.wavelength_marks);
        assert_eq!(config.overlay.labels, LabelStyle::Slit);
        assert_eq!(config.scale, ColorScale::MaxFraction);
        assert_eq!(config.grid_step, 1);
        assert_eq!(config.output, PathBuf::from("out.svg"));
    }

    #[test]
    fn trace_defaults() {
        let config = trace_config_from_args(&trace_args(&["night/tw.fits"]));
        assert_eq!(config.detectors, Detector::ALL.to_vec());
        assert_eq!(config.output, PathBuf::from("night/tw.svg"));
        assert_eq!(config.overlay, OverlayOptions::default());
        assert_eq!(config.image_bins, 128);
        assert!(!config.show && !config.preview);
    }

    #[test]
    fn wavecal_positionals_in_order() {
        let cli = crate::cli::Cli::parse_from(["trace-view", "wavecal", "spec.fits", "thar.fits", "une.fits", "tw.fits"]);
        let Command::Wavecal(args) = cli.command else {
            panic!("expected wavecal");
        };
        let config = wavecal_config_from_args(&args);
        assert_eq!(config.catalog_path, Some(PathBuf::from("thar.fits")));
        assert_eq!(config.catalog2_path, Some(PathBuf::from("une.fits")));
        assert_eq!(config.trace_path, Some(PathBuf::from("tw.fits")));
        assert_eq!(config.out_dir, PathBuf::from("."));
    }

    #[test]
    fn chip_out_of_range_is_rejected() {
        assert!(crate::cli::Cli::try_parse_from(["trace-view", "trace", "tw.fits", "--chip", "4"]).is_err());
    }
}

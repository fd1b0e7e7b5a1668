//! Shared pipelines used by the CLI outputs and the terminal viewer.
//!
//! Each run loads its FITS inputs once and returns everything the front-ends
//! need; saving, printing and the interactive display happen in `app`.
//!
//! trace:   trace table -> per-detector records -> overlays (+ image) -> panels
//! wavecal: spectra (+ trace solutions) -> curves/figures, catalogs

use tracing::{info, warn};

use crate::domain::{DETECTOR_PIXELS, PixelGrid, TraceConfig, WavecalConfig};
use crate::error::AppError;
use crate::io::{ChipTable, ImageFile, LineCatalog, SpectrumFile, TraceFile};
use crate::plot::{ChipPanel, PanelImage};
use crate::trace::{ChipOverlay, build_chip_overlay};
use crate::wavecal::{WavecalPlot, build_wavecal};

/// All computed outputs of a `trace-view trace` run.
#[derive(Debug, Clone)]
pub struct TraceRunOutput {
    /// One panel per requested detector, skipped ones included.
    pub panels: Vec<ChipPanel>,
}

impl TraceRunOutput {
    /// Overlays of the detectors that were drawn.
    pub fn overlays(&self) -> Vec<ChipOverlay> {
        self.panels.iter().filter_map(|p| p.overlay.clone()).collect()
    }

    pub fn loaded_count(&self) -> usize {
        self.panels.iter().filter(|p| p.overlay.is_some()).count()
    }
}

/// Load the trace table (and optional image) and build every detector panel.
///
/// A detector without an extension or with an empty table is skipped; the
/// run fails with exit code 3 only when no detector could be loaded.
pub fn run_trace(config: &TraceConfig) -> Result<TraceRunOutput, AppError> {
    let mut trace = TraceFile::open(&config.trace_path)?;
    info!(file = %config.trace_path.display(), "opened trace table");

    let mut image = match &config.image_path {
        Some(path) => {
            let image = ImageFile::open(path)?;
            info!(file = %path.display(), "opened detector image");
            Some(image)
        }
        None => None,
    };

    if let Some(path) = &config.spectrum_path {
        SpectrumFile::open(path)?;
        info!(file = %path.display(), "spectrum file is readable (not drawn)");
    }

    let grid = PixelGrid::sampled(DETECTOR_PIXELS, config.grid_step);
    let mut panels = Vec::with_capacity(config.detectors.len());

    for &detector in &config.detectors {
        let records = match trace.chip(detector)? {
            ChipTable::Loaded(records) => records,
            ChipTable::MissingExtension => {
                warn!(%detector, "trace table has no extension, skipping");
                panels.push(ChipPanel::skipped(detector, "no trace extension"));
                continue;
            }
            ChipTable::Empty => {
                warn!(%detector, "trace table is empty, skipping");
                panels.push(ChipPanel::skipped(detector, "empty trace table"));
                continue;
            }
        };

        let panel_image = match &mut image {
            Some(file) => match file.chip(detector)? {
                Some(img) => {
                    let panel_image = PanelImage::new(&img, config.scale, config.image_bins);
                    if panel_image.is_none() {
                        warn!(%detector, "image has no finite pixels, drawing without it");
                    }
                    panel_image
                }
                None => {
                    warn!(%detector, file = %file.path().display(), "image has no extension, drawing without it");
                    None
                }
            },
            None => None,
        };

        let overlay = build_chip_overlay(detector, &records, &grid, &config.overlay);
        for (order, trace_nb) in &overlay.unlabeled {
            warn!(%detector, order, trace_nb, "center trace is not finite at the detector middle, no label");
        }
        info!(%detector, traces = overlay.traces.len(), "built overlay");

        panels.push(ChipPanel {
            detector,
            overlay: Some(overlay),
            image: panel_image,
            note: None,
        });
    }

    let out = TraceRunOutput { panels };
    if out.loaded_count() == 0 {
        return Err(AppError::new(
            3,
            format!("No detector could be loaded from '{}'.", config.trace_path.display()),
        ));
    }
    Ok(out)
}

/// All computed outputs of a `trace-view wavecal` run.
#[derive(Debug, Clone)]
pub struct WavecalRunOutput {
    pub plot: WavecalPlot,
    /// Primary catalog first.
    pub catalogs: Vec<LineCatalog>,
}

/// Load spectra, catalogs and the optional trace table.
pub fn run_wavecal(config: &WavecalConfig) -> Result<WavecalRunOutput, AppError> {
    let mut spectrum = SpectrumFile::open(&config.spectrum_path)?;
    info!(file = %config.spectrum_path.display(), "opened spectrum");

    let mut catalogs = Vec::new();
    for path in config.catalog_path.iter().chain(&config.catalog2_path) {
        let catalog = LineCatalog::open(path)?;
        info!(file = %path.display(), lines = catalog.lines.len(), "loaded line catalog");
        catalogs.push(catalog);
    }

    let mut trace = match &config.trace_path {
        Some(path) => {
            let trace = TraceFile::open(path)?;
            info!(file = %path.display(), "recomputing wavelengths from trace table");
            Some(trace)
        }
        None => None,
    };

    let plot = build_wavecal(&mut spectrum, trace.as_mut())?;
    if plot.figures.is_empty() {
        return Err(AppError::new(
            3,
            format!("No usable spectra in '{}'.", config.spectrum_path.display()),
        ));
    }
    Ok(WavecalRunOutput { plot, catalogs })
}

#[cfg(test)]
mod tests {
    use std::path::{Path, PathBuf};

    use super::*;
    use crate::domain::{ColorScale, Detector, OverlayOptions};
    use crate::io::fits::testkit::{FitsBuilder, TestColumn, trace_columns};
    use crate::io::trace::tests::sample_record;

    fn config(trace_path: &Path) -> TraceConfig {
        TraceConfig {
            trace_path: trace_path.to_path_buf(),
            image_path: None,
            spectrum_path: None,
            detectors: Detector::ALL.to_vec(),
            grid_step: 16,
            overlay: OverlayOptions::default(),
            scale: ColorScale::Percentile,
            image_bins: 64,
            output: PathBuf::from("unused.svg"),
            show: false,
            preview: false,
            preview_width: 80,
            preview_height: 20,
            export_geometry: None,
        }
    }

    #[test]
    fn missing_and_empty_detectors_are_skipped() {
        let chip1 = vec![sample_record(3, 1, 500.0), sample_record(4, 1, 900.0)];
        let fixture = FitsBuilder::new()
            .table("CHIP1", &trace_columns(&chip1))
            .table("CHIP3", &trace_columns(&[]))
            .build();

        let run = run_trace(&config(fixture.path())).unwrap();

        assert_eq!(run.panels.len(), 3);
        assert_eq!(run.loaded_count(), 1);
        assert_eq!(run.overlays()[0].traces.len(), 2);
        assert_eq!(run.panels[1].note.as_deref(), Some("no trace extension"));
        assert_eq!(run.panels[2].note.as_deref(), Some("empty trace table"));
    }

    #[test]
    fn no_loadable_detector_is_exit_code_3() {
        let fixture = FitsBuilder::new().table("CHIP2", &trace_columns(&[])).build();
        let err = run_trace(&config(fixture.path())).unwrap_err();
        assert_eq!(err.exit_code(), 3);
    }

    #[test]
    fn unreadable_trace_is_exit_code_2() {
        let err = run_trace(&config(Path::new("/nonexistent/trace.fits"))).unwrap_err();
        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn image_is_attached_per_detector() {
        let chip2 = vec![sample_record(5, 1, 10.0)];
        let trace = FitsBuilder::new().table("CHIP2", &trace_columns(&chip2)).build();
        let pixels: Vec<f64> = (0..64).map(f64::from).collect();
        let image = FitsBuilder::new().image("CHIP2.INT1", 8, 8, &pixels).build();

        let mut cfg = config(trace.path());
        cfg.image_path = Some(image.path().to_path_buf());
        cfg.detectors = vec![Detector::Chip2];
        let run = run_trace(&cfg).unwrap();

        let img = run.panels[0].image.as_ref().unwrap();
        assert_eq!((img.width, img.height), (8, 8));
    }

    #[test]
    fn wavecal_without_spectra_is_exit_code_3() {
        let fixture = FitsBuilder::new()
            .table(
                "CHIP1.INT1",
                &[
                    TestColumn::f64("01_01_WL", 1, &[1.0, 2.0]),
                    TestColumn::f64("01_01_SPEC", 1, &[f64::NAN, f64::NAN]),
                ],
            )
            .build();
        let cfg = WavecalConfig {
            spectrum_path: fixture.path().to_path_buf(),
            catalog_path: None,
            catalog2_path: None,
            trace_path: None,
            out_dir: PathBuf::from("."),
        };
        let err = run_wavecal(&cfg).unwrap_err();
        assert_eq!(err.exit_code(), 3);
    }
}

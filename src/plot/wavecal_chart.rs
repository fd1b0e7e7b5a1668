//! Spectrum-vs-catalog figures.

use std::path::{Path, PathBuf};

use plotters::coord::Shift;
use plotters::prelude::*;
use plotters::style::text_anchor::{HPos, Pos, VPos};

use crate::domain::Detector;
use crate::error::AppError;
use crate::io::LineCatalog;
use crate::plot::clip::{ClipRect, clip_polyline};
use crate::plot::trace_chart::DrawResult;
use crate::wavecal::{CATALOG_SCALE, WavecalFigure, WavecalPlot};

pub const WAVECAL_SIZE: (u32, u32) = (2400, 900);

const CATALOG_PRIMARY: RGBColor = RGBColor(128, 128, 128);
const CATALOG_SECONDARY: RGBColor = RGBColor(0, 128, 0);

/// Spectrum color per detector.
pub fn detector_color(detector: Detector) -> RGBColor {
    match detector {
        Detector::Chip1 => RGBColor(191, 191, 0),
        Detector::Chip2 => RGBColor(220, 30, 30),
        Detector::Chip3 => RGBColor(30, 30, 220),
    }
}

/// Save every figure of `plot` into `out_dir`; returns the written paths.
pub fn save_wavecal_figures(
    out_dir: &Path,
    plot: &WavecalPlot,
    catalogs: &[LineCatalog],
) -> Result<Vec<PathBuf>, AppError> {
    let mut written = Vec::with_capacity(plot.figures.len());
    for figure in &plot.figures {
        let path = out_dir.join(&figure.file_name);
        let root = SVGBackend::new(&path, WAVECAL_SIZE).into_drawing_area();
        draw_wavecal_figure(&root, plot, figure, catalogs)
            .map_err(|e| AppError::new(4, format!("Failed to render '{}': {e}", path.display())))?;
        root.present()
            .map_err(|e| AppError::new(4, format!("Failed to write '{}': {e}", path.display())))?;
        drop(root);
        written.push(path);
    }
    Ok(written)
}

/// Draw one figure: catalogs, every spectrum and the order labels, zoomed to
/// the figure's wavelength span.
pub fn draw_wavecal_figure<DB: DrawingBackend>(
    root: &DrawingArea<DB, Shift>,
    plot: &WavecalPlot,
    figure: &WavecalFigure,
    catalogs: &[LineCatalog],
) -> DrawResult<DB> {
    root.fill(&WHITE)?;
    let (x0, x1) = figure.x_range;
    let (y0, y1) = figure.y_range;

    let mut chart = ChartBuilder::on(root)
        .caption(
            format!("{}  order {}  {}", plot.setting, figure.order, figure.detector),
            ("sans-serif", 20),
        )
        .margin(10)
        .x_label_area_size(30)
        .y_label_area_size(10)
        .build_cartesian_2d(x0..x1, y0..y1)?;

    chart
        .configure_mesh()
        .disable_x_mesh()
        .disable_y_mesh()
        .y_labels(0)
        .x_desc("wavelength [nm]")
        .x_label_formatter(&|v| format!("{v:.1}"))
        .draw()?;

    let rect = ClipRect::new((x0, x1), (y0, y1));

    for (i, catalog) in catalogs.iter().enumerate() {
        let color = if i == 0 { CATALOG_PRIMARY.mix(0.4) } else { CATALOG_SECONDARY.mix(1.0) };
        for line in catalog.in_range(x0, x1) {
            let tick = [(line.wavelength, 0.0), (line.wavelength, -CATALOG_SCALE * line.emission)];
            for run in clip_polyline(&tick, rect) {
                chart.draw_series(std::iter::once(PathElement::new(run, color.stroke_width(1))))?;
            }
        }
    }

    let label_style = ("sans-serif", 12)
        .into_font()
        .color(&BLACK)
        .pos(Pos::new(HPos::Center, VPos::Center));

    for curve in &plot.curves {
        let points: Vec<(f64, f64)> = curve.points().collect();
        let color = detector_color(curve.detector);
        for run in clip_polyline(&points, rect) {
            chart.draw_series(LineSeries::new(run, color.stroke_width(1)))?;
        }

        let label = &curve.label;
        if rect.contains((label.x, label.y)) {
            chart.draw_series(std::iter::once(Text::new(
                label.text.clone(),
                (label.x, label.y),
                label_style.clone(),
            )))?;
        }
    }

    Ok(())
}

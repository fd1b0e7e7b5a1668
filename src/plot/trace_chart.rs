//! Trace overlay figures.
//!
//! One panel per detector, side by side. Each panel shows the (binned,
//! gray-scaled) detector image when one is available, then for every trace:
//! the upper/lower slit edges, the center line, integer-wavelength ticks,
//! slit-curvature segments and the order/trace label.
//!
//! Drawing is generic over the Plotters backend: the same code writes the
//! SVG file and renders into the terminal viewer.

use std::path::Path;

use plotters::coord::Shift;
use plotters::prelude::*;
use plotters::style::text_anchor::{HPos, Pos, VPos};

use crate::domain::{ColorScale, DETECTOR_PIXELS, Detector};
use crate::error::AppError;
use crate::io::{BinnedImage, DetectorImage};
use crate::plot::clip::{ClipRect, clip_polyline};
use crate::trace::ChipOverlay;

/// Saved figure size in pixels (three panels side by side).
pub const FIGURE_SIZE: (u32, u32) = (1800, 630);

/// Result of a Plotters drawing call on backend `DB`.
pub type DrawResult<DB> = Result<(), DrawingAreaErrorKind<<DB as DrawingBackend>::ErrorType>>;

const MARK_COLOR: RGBColor = RGBColor(220, 30, 30);

/// Background raster of one panel.
#[derive(Debug, Clone, PartialEq)]
pub struct PanelImage {
    pub binned: BinnedImage,
    /// `(black, white)` data values.
    pub limits: (f64, f64),
    pub width: usize,
    pub height: usize,
}

impl PanelImage {
    /// Bin and scale a detector image; `None` when it has no usable range.
    pub fn new(image: &DetectorImage, scale: ColorScale, max_cells: usize) -> Option<Self> {
        let limits = image.display_limits(scale)?;
        Some(Self {
            binned: image.binned(max_cells),
            limits,
            width: image.width(),
            height: image.height(),
        })
    }

    /// Gray level of a data value, or `None` for NaN.
    pub fn gray(&self, value: f64) -> Option<u8> {
        if !value.is_finite() {
            return None;
        }
        let (lo, hi) = self.limits;
        let u = ((value - lo) / (hi - lo)).clamp(0.0, 1.0);
        Some((u * 255.0).round() as u8)
    }
}

/// Everything shown in one detector panel.
#[derive(Debug, Clone, PartialEq)]
pub struct ChipPanel {
    pub detector: Detector,
    pub overlay: Option<ChipOverlay>,
    pub image: Option<PanelImage>,
    /// Shown instead of the overlay when the detector was skipped.
    pub note: Option<String>,
}

impl ChipPanel {
    pub fn skipped(detector: Detector, note: impl Into<String>) -> Self {
        Self {
            detector,
            overlay: None,
            image: None,
            note: Some(note.into()),
        }
    }

    /// Data bounds `(x, y)`: the image frame when present, otherwise the
    /// detector width and the vertical extent of the curves.
    pub fn bounds(&self) -> ((f64, f64), (f64, f64)) {
        if let Some(img) = &self.image {
            return ((0.0, img.width as f64), (0.0, img.height as f64));
        }
        let width = self.overlay.as_ref().map_or(DETECTOR_PIXELS, |o| o.width) as f64;
        let y = self
            .overlay
            .as_ref()
            .and_then(ChipOverlay::y_extent)
            .map(|(lo, hi)| {
                let pad = (hi - lo) * 0.02;
                (lo - pad, hi + pad)
            })
            .unwrap_or((0.0, DETECTOR_PIXELS as f64));
        ((0.0, width), y)
    }

    /// Curve color: white over an image, black on a blank panel.
    pub fn line_color(&self) -> RGBColor {
        if self.image.is_some() { WHITE } else { BLACK }
    }
}

/// Which overlay layers to draw.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Layers {
    pub marks: bool,
    pub segments: bool,
    pub labels: bool,
}

impl Default for Layers {
    fn default() -> Self {
        Self {
            marks: true,
            segments: true,
            labels: true,
        }
    }
}

/// Sizes that differ between the SVG figure and the terminal.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PanelStyle {
    pub font_size: u32,
    /// Zero leaves out the caption.
    pub caption_size: u32,
    pub label_area: u32,
    pub margin: u32,
    pub line_height: i32,
    pub draw_image: bool,
    /// Draw curves and text in white regardless of the image.
    pub dark_background: bool,
}

impl PanelStyle {
    pub const SVG: PanelStyle = PanelStyle {
        font_size: 11,
        caption_size: 18,
        label_area: 40,
        margin: 5,
        line_height: 12,
        draw_image: true,
        dark_background: false,
    };

    pub const TERMINAL: PanelStyle = PanelStyle {
        font_size: 10,
        caption_size: 0,
        label_area: 6,
        margin: 1,
        line_height: 1,
        draw_image: false,
        dark_background: true,
    };

    fn text_color(&self) -> RGBColor {
        if self.dark_background { WHITE } else { BLACK }
    }
}

/// Write the full figure as SVG.
pub fn save_trace_svg(path: &Path, panels: &[ChipPanel]) -> Result<(), AppError> {
    let root = SVGBackend::new(path, FIGURE_SIZE).into_drawing_area();
    draw_trace_figure(&root, panels, Layers::default(), &PanelStyle::SVG)
        .map_err(|e| AppError::new(4, format!("Failed to render '{}': {e}", path.display())))?;
    root.present()
        .map_err(|e| AppError::new(4, format!("Failed to write '{}': {e}", path.display())))?;
    Ok(())
}

/// Draw all panels side by side.
pub fn draw_trace_figure<DB: DrawingBackend>(
    root: &DrawingArea<DB, Shift>,
    panels: &[ChipPanel],
    layers: Layers,
    style: &PanelStyle,
) -> DrawResult<DB> {
    root.fill(&WHITE)?;
    let areas = root.split_evenly((1, panels.len().max(1)));
    for (area, panel) in areas.iter().zip(panels) {
        draw_chip_panel(area, panel, layers, style)?;
    }
    Ok(())
}

/// Draw one detector panel.
pub fn draw_chip_panel<DB: DrawingBackend>(
    area: &DrawingArea<DB, Shift>,
    panel: &ChipPanel,
    layers: Layers,
    style: &PanelStyle,
) -> DrawResult<DB> {
    let ((x0, x1), (y0, y1)) = panel.bounds();
    let caption = match &panel.note {
        Some(note) => format!("{}: {note}", panel.detector),
        None => panel.detector.to_string(),
    };

    let mut builder = ChartBuilder::on(area);
    if style.caption_size > 0 {
        builder.caption(caption, ("sans-serif", style.caption_size).into_font().color(&style.text_color()));
    }
    let mut chart = builder
        .margin(style.margin)
        .x_label_area_size(style.label_area / 2)
        .y_label_area_size(style.label_area)
        .build_cartesian_2d(x0..x1, y0..y1)?;

    chart
        .configure_mesh()
        .disable_x_mesh()
        .disable_y_mesh()
        .x_labels(5)
        .y_labels(5)
        .x_label_formatter(&|v| format!("{v:.0}"))
        .y_label_formatter(&|v| format!("{v:.0}"))
        .label_style(("sans-serif", style.font_size).into_font().color(&style.text_color()))
        .axis_style(&style.text_color())
        .draw()?;

    if style.draw_image {
        if let Some(img) = &panel.image {
            let f = img.binned.factor as f64;
            chart.draw_series(img.binned.cells.indexed_iter().filter_map(|((r, c), &v)| {
                let g = img.gray(v)?;
                let (cx, cy) = (c as f64 * f, r as f64 * f);
                Some(Rectangle::new(
                    [(cx, cy), ((cx + f).min(x1), (cy + f).min(y1))],
                    RGBColor(g, g, g).filled(),
                ))
            }))?;
        }
    }

    let Some(overlay) = &panel.overlay else {
        return Ok(());
    };

    let rect = ClipRect::new((x0, x1), (y0, y1));
    let line = if style.dark_background { WHITE } else { panel.line_color() };
    let edge_style = line.mix(0.6).stroke_width(1);
    let center_style = line.stroke_width(1);

    for trace in &overlay.traces {
        for (ys, s) in [
            (&trace.edges.upper, edge_style),
            (&trace.edges.lower, edge_style),
            (&trace.edges.center, center_style),
        ] {
            let points: Vec<(f64, f64)> = overlay.xs.iter().copied().zip(ys.iter().copied()).collect();
            for run in clip_polyline(&points, rect) {
                chart.draw_series(LineSeries::new(run, s))?;
            }
        }

        if layers.marks {
            for mark in &trace.marks {
                let tick = [(mark.x, mark.y_lower), (mark.x, mark.y_upper)];
                for run in clip_polyline(&tick, rect) {
                    chart.draw_series(std::iter::once(PathElement::new(run, MARK_COLOR.stroke_width(1))))?;
                }
            }
        }

        if layers.segments {
            for seg in &trace.segments {
                let points: Vec<(f64, f64)> = seg.x.iter().copied().zip(seg.y.iter().copied()).collect();
                for run in clip_polyline(&points, rect) {
                    chart.draw_series(std::iter::once(PathElement::new(run, MARK_COLOR.stroke_width(1))))?;
                }
            }
        }

        if layers.labels {
            if let Some(label) = &trace.label {
                if !rect.contains((label.x, label.y)) {
                    continue;
                }
                let text_style = ("sans-serif", style.font_size)
                    .into_font()
                    .color(&line)
                    .pos(Pos::new(HPos::Center, VPos::Center));
                let lines: Vec<&str> = label.text.lines().collect();
                let first_offset = -(lines.len() as i32 - 1) * style.line_height / 2;
                for (i, text) in lines.iter().enumerate() {
                    let dy = first_offset + i as i32 * style.line_height;
                    chart.draw_series(std::iter::once(
                        EmptyElement::at((label.x, label.y)) + Text::new(text.to_string(), (0, dy), text_style.clone()),
                    ))?;
                }
            }
        }
    }

    Ok(())
}

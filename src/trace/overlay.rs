//! Per-detector trace overlays.
//!
//! An overlay is everything drawn on top of one detector panel: edge and
//! center curves for every trace, integer-wavelength ticks, slit-curvature
//! segments and text labels. It is render-agnostic, so the SVG writer, the
//! terminal viewer and the geometry export all consume the same values.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::domain::{Detector, LabelStyle, OverlayOptions, PixelGrid, TraceRecord};
use crate::math::Polynomial;
use crate::trace::geometry::{
    CurvatureSegment, EdgeCurves, EdgeSample, WavelengthMark, curvature_pixels, curvature_segment_with_reference,
    evaluate_edges, is_degenerate, mid_slit_reference, wavelength_marks,
};

/// Text annotation anchored on a trace's center line.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TraceLabel {
    pub x: f64,
    pub y: f64,
    pub text: String,
}

/// Everything drawn for a single trace table row.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TraceOverlay {
    pub order: i64,
    pub trace_nb: i64,
    pub edges: EdgeCurves,
    pub marks: Vec<WavelengthMark>,
    pub segments: Vec<CurvatureSegment>,
    pub label: Option<TraceLabel>,
}

/// Overlay for one detector frame.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChipOverlay {
    pub detector: Detector,
    /// Grid x-values shared by every edge curve.
    pub xs: Vec<f64>,
    /// Detector width in pixels.
    pub width: usize,
    pub traces: Vec<TraceOverlay>,
    /// `(order, trace)` of records left unlabeled because their center
    /// trace is not finite at the middle of the detector.
    pub unlabeled: Vec<(i64, i64)>,
}

impl ChipOverlay {
    /// Finite y-range covered by all edge curves, if any.
    pub fn y_extent(&self) -> Option<(f64, f64)> {
        let mut lo = f64::INFINITY;
        let mut hi = f64::NEG_INFINITY;
        for t in &self.traces {
            for &y in t.edges.upper.iter().chain(&t.edges.lower).chain(&t.edges.center) {
                if y.is_finite() {
                    lo = lo.min(y);
                    hi = hi.max(y);
                }
            }
        }
        (lo.is_finite() && hi.is_finite() && hi > lo).then_some((lo, hi))
    }
}

/// Build the overlay for one detector's trace records.
pub fn build_chip_overlay(
    detector: Detector,
    records: &[TraceRecord],
    grid: &PixelGrid,
    options: &OverlayOptions,
) -> ChipOverlay {
    // The mid-slit reference depends only on the order, so compute it once.
    let mut references: BTreeMap<i64, Option<Polynomial>> = BTreeMap::new();
    if options.curvature {
        for r in records {
            references
                .entry(r.order)
                .or_insert_with(|| mid_slit_reference(r.order, records));
        }
    }

    let sample_pixels = curvature_pixels(grid.width(), options.curvature_start, options.curvature_stride);

    let mut traces = Vec::with_capacity(records.len());
    let mut unlabeled = Vec::new();

    for record in records {
        let edges = evaluate_edges(record, grid);

        let marks = if options.wavelength_marks {
            wavelength_marks(record, grid.width())
        } else {
            Vec::new()
        };

        let segments = match references.get(&record.order) {
            Some(Some(reference)) => sample_pixels
                .iter()
                .filter_map(|&p| {
                    curvature_segment_with_reference(record, p, EdgeSample::evaluate(record, p), reference)
                })
                .collect(),
            _ => Vec::new(),
        };

        let label = if is_degenerate(record, grid) {
            unlabeled.push((record.order, record.trace_nb));
            None
        } else {
            label_for(record, grid, options.labels)
        };

        traces.push(TraceOverlay {
            order: record.order,
            trace_nb: record.trace_nb,
            edges,
            marks,
            segments,
            label,
        });
    }

    ChipOverlay {
        detector,
        xs: grid.xs().to_vec(),
        width: grid.width(),
        traces,
        unlabeled,
    }
}

fn label_for(record: &TraceRecord, grid: &PixelGrid, style: LabelStyle) -> Option<TraceLabel> {
    let x = grid.mid_pixel();
    let y = record.all.eval(x);
    let text = match style {
        LabelStyle::None => return None,
        LabelStyle::Order => format!("order: {}\ntrace: {}", record.order, record.trace_nb),
        LabelStyle::Slit => {
            let fractions = record
                .slit_fraction
                .iter()
                .map(|f| format!("{f:.2}"))
                .collect::<Vec<_>>()
                .join(" ");
            format!(
                "order: {}\ntrace: {}\nslitfrac: {fractions}",
                record.order, record.trace_nb
            )
        }
    };
    Some(TraceLabel { x, y, text })
}

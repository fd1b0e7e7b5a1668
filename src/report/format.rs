//! Formatted terminal summaries of trace and wavecal runs.
//!
//! Formatting lives in one place so the geometry code stays free of output
//! concerns and the printed layout can be snapshot-tested.

use std::path::PathBuf;

use crate::app::pipeline::{TraceRunOutput, WavecalRunOutput};
use crate::domain::{LabelStyle, TraceConfig};

/// Per-detector table of what was drawn, plus inputs and outputs.
pub fn format_trace_summary(run: &TraceRunOutput, config: &TraceConfig) -> String {
    let mut out = String::new();

    out.push_str("=== trace-view - trace overlay ===\n");
    out.push_str(&format!("Trace: {}\n", config.trace_path.display()));
    if let Some(image) = &config.image_path {
        out.push_str(&format!("Image: {} (scale: {})\n", image.display(), scale_name(config)));
    }
    out.push_str(&format!(
        "Layers: wavelength={} curvature={} labels={}\n",
        on_off(config.overlay.wavelength_marks),
        on_off(config.overlay.curvature),
        label_name(config.overlay.labels),
    ));
    out.push('\n');

    out.push_str(
        format!(
            "{:<6} {:>7} {:>7} {:>9} {:>10} {:<}\n",
            "chip", "traces", "marks", "segments", "unlabeled", "status"
        )
        .trim_end(),
    );
    out.push('\n');
    out.push_str(format!("{:-<6} {:-<7} {:-<7} {:-<9} {:-<10} {:-<10}\n", "", "", "", "", "", "").trim_end());
    out.push('\n');

    for panel in &run.panels {
        let line = match &panel.overlay {
            Some(overlay) => {
                let marks: usize = overlay.traces.iter().map(|t| t.marks.len()).sum();
                let segments: usize = overlay.traces.iter().map(|t| t.segments.len()).sum();
                let status = if panel.image.is_some() { "ok (image)" } else { "ok" };
                format!(
                    "{:<6} {:>7} {:>7} {:>9} {:>10} {status}",
                    panel.detector.to_string(),
                    overlay.traces.len(),
                    marks,
                    segments,
                    overlay.unlabeled.len(),
                )
            }
            None => format!(
                "{:<6} {:>7} {:>7} {:>9} {:>10} skipped: {}",
                panel.detector.to_string(),
                "-",
                "-",
                "-",
                "-",
                panel.note.as_deref().unwrap_or("no data"),
            ),
        };
        out.push_str(&line);
        out.push('\n');
    }

    out.push('\n');
    out.push_str(&format!("Figure: {}\n", config.output.display()));
    if let Some(path) = &config.export_geometry {
        out.push_str(&format!("Geometry: {}\n", path.display()));
    }
    out
}

/// Spectra drawn and figures written by a wavecal run.
pub fn format_wavecal_summary(run: &WavecalRunOutput, written: &[PathBuf]) -> String {
    let mut out = String::new();

    out.push_str("=== trace-view - wavelength calibration ===\n");
    out.push_str(&format!("Setting: {}\n", run.plot.setting));
    if run.catalogs.is_empty() {
        out.push_str("Catalogs: none\n");
    }
    for catalog in &run.catalogs {
        out.push_str(&format!(
            "Catalog: {} ({} lines)\n",
            catalog.path.display(),
            catalog.lines.len()
        ));
    }
    out.push('\n');

    out.push_str(format!("{:<6} {:>5} {:>24} {:<}\n", "chip", "order", "wavelength", "source").trim_end());
    out.push('\n');
    out.push_str(format!("{:-<6} {:-<5} {:-<24} {:-<10}\n", "", "", "", "").trim_end());
    out.push('\n');
    for curve in &run.plot.curves {
        let span = curve
            .wavelength_span()
            .map(|(lo, hi)| format!("[{lo:.3}, {hi:.3}]"))
            .unwrap_or_else(|| "-".to_string());
        let source = if curve.recomputed { "trace table" } else { "extracted" };
        out.push_str(&format!(
            "{:<6} {:>5} {:>24} {source}\n",
            curve.detector.to_string(),
            curve.order,
            span
        ));
    }

    out.push_str(&format!("\nFigures ({}):\n", written.len()));
    for path in written {
        out.push_str(&format!("- {}\n", path.display()));
    }
    out
}

fn scale_name(config: &TraceConfig) -> &'static str {
    match config.scale {
        crate::domain::ColorScale::Percentile => "percentile",
        crate::domain::ColorScale::MaxFraction => "max-fraction",
    }
}

fn label_name(style: LabelStyle) -> &'static str {
    match style {
        LabelStyle::None => "none",
        LabelStyle::Order => "order",
        LabelStyle::Slit => "slit",
    }
}

fn on_off(v: bool) -> &'static str {
    if v { "on" } else { "off" }
}

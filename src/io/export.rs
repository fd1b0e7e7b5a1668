//! Export evaluated trace geometry to JSON.
//!
//! The export holds exactly what the renderers draw, per detector, so the
//! curves can be checked or re-plotted by other tools. Non-finite values are
//! written as `null`.

use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::domain::TraceConfig;
use crate::error::AppError;
use crate::trace::ChipOverlay;

/// Top-level export document.
#[derive(Debug, Serialize)]
pub struct GeometryExport<'a> {
    pub tool: &'static str,
    pub version: &'static str,
    pub generated_at: DateTime<Utc>,
    pub trace_file: String,
    pub image_file: Option<String>,
    pub chips: &'a [ChipOverlay],
}

impl<'a> GeometryExport<'a> {
    pub fn new(config: &TraceConfig, chips: &'a [ChipOverlay]) -> Self {
        Self {
            tool: env!("CARGO_PKG_NAME"),
            version: env!("CARGO_PKG_VERSION"),
            generated_at: Utc::now(),
            trace_file: config.trace_path.display().to_string(),
            image_file: config.image_path.as_ref().map(|p| p.display().to_string()),
            chips,
        }
    }
}

/// Write every chip overlay to `path` as pretty JSON.
pub fn write_geometry_json(path: &Path, config: &TraceConfig, chips: &[ChipOverlay]) -> Result<(), AppError> {
    let file = File::create(path)
        .map_err(|e| AppError::new(2, format!("Failed to create geometry JSON '{}': {e}", path.display())))?;

    let export = GeometryExport::new(config, chips);
    serde_json::to_writer_pretty(BufWriter::new(file), &export)
        .map_err(|e| AppError::new(2, format!("Failed to write geometry JSON: {e}")))?;

    Ok(())
}

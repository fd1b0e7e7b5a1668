//! Domain types used throughout the pipeline.
//!
//! This module defines:
//!
//! - detector frames and trace table records (`Detector`, `TraceRecord`)
//! - the evaluation grid (`PixelGrid`)
//! - run configuration (`TraceConfig`, `WavecalConfig`, `OverlayOptions`)

pub mod types;

pub use types::*;

//! `trace-view` library crate.
//!
//! The binary (`trace-view`) is a thin wrapper around this library so that:
//!
//! - the geometry evaluator is testable without spawning processes
//! - FITS loading, rendering and the viewer stay separate modules

pub mod app;
pub mod cli;
pub mod domain;
pub mod error;
pub mod io;
pub mod math;
pub mod plot;
pub mod report;
pub mod trace;
pub mod tui;
pub mod wavecal;

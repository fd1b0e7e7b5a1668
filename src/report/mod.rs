//! Terminal reporting for trace and wavecal runs.

pub mod format;

pub use format::{format_trace_summary, format_wavecal_summary};

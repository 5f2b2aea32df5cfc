/// Report Layer - batch results for downstream consumers
///
/// Writes the per-pair records plus `_summary` as one JSON document and renders
/// the human-readable run summary.

pub mod report_writer;

pub use report_writer::{ReportWriter, render_summary};

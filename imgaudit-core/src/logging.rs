//! Structured logging using **tracing**.
//!
//! The JSON subscriber writes to stderr so the report summary printed on
//! stdout stays machine-readable. The helpers below are the events a report
//! cycle emits; each carries the fields a log consumer filters on.

use std::path::Path;

use tracing::{error, info, warn};

use crate::config::CONFIG_FILE;
use crate::error::ImgauditError;
use crate::model::ReportModel;

/// Initializes the global tracing collector (subscriber).
///
/// Call *once* at process start. Later calls are ignored.
///
/// # Environment Variables
/// - `RUST_LOG`: Controls log filtering (e.g., `RUST_LOG=imgaudit_core=debug`)
pub fn init_structured_logging() {
    let _ = tracing_subscriber::fmt()
        .json()
        .with_ansi(false)
        .with_level(true)
        .with_target(true)
        .with_current_span(true)
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .try_init();
}

/// One finished scan/reconcile cycle.
pub fn log_report_generated(root: &Path, model: &ReportModel) {
    info!(
        root = %root.display(),
        project = %model.project_name,
        all = model.counts.all,
        used = model.counts.used,
        unused = model.counts.unused,
        unused_bytes = model.totals.unused,
        "report generated"
    );
}

/// A report document persisted to disk.
pub fn log_report_written(path: &Path, bytes: usize) {
    info!(path = %path.display(), bytes, "report written");
}

/// The project config file could not be used; defaults apply.
pub fn log_config_ignored(root: &Path, error: &anyhow::Error) {
    warn!(
        path = %root.join(CONFIG_FILE).display(),
        error = %format!("{error:#}"),
        "config file ignored, using defaults"
    );
}

/// A failed report cycle.
///
/// Failures the next cycle may get past on its own (a half-written manifest,
/// a file removed mid-write) log at `warn`; the rest at `error`. Returns
/// whether the failure was recoverable.
pub fn log_cycle_failed(error: &anyhow::Error) -> bool {
    let typed = error.downcast_ref::<ImgauditError>();
    let recoverable = typed.is_some_and(ImgauditError::is_recoverable);
    let path = typed
        .and_then(ImgauditError::path)
        .map(|p| p.display().to_string())
        .unwrap_or_default();
    let detail = format!("{error:#}");

    if recoverable {
        warn!(path = %path, error = %detail, "report cycle failed, retrying next cycle");
    } else {
        error!(path = %path, error = %detail, "report cycle failed");
    }
    recoverable
}

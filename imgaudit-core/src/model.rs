//! Canonical report object shared by the HTML and JSON renderers.

use chrono::{DateTime, Local};
use serde::Serialize;

use crate::scan::AssetRecord;

/// Per-bucket byte totals or file counts.
///
/// Serializes as `{ "all", "used", "unused" }` in the JSON report.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Tally {
    pub all: u64,
    pub used: u64,
    pub unused: u64,
}

/// Report for one cycle. Derived, never persisted.
///
/// `used_assets` and `unused_assets` partition `all_assets`;
/// `totals.all == totals.used + totals.unused` and likewise for `counts`.
#[derive(Debug, Clone)]
pub struct ReportModel {
    pub all_assets: Vec<AssetRecord>,
    pub used_assets: Vec<AssetRecord>,
    pub unused_assets: Vec<AssetRecord>,
    /// Sum of `size_bytes` per bucket.
    pub totals: Tally,
    /// Number of assets per bucket.
    pub counts: Tally,
    /// Display name of the audited project.
    pub project_name: String,
    pub generated_at: DateTime<Local>,
}

fn total_size(assets: &[AssetRecord]) -> u64 {
    assets.iter().map(|a| a.size_bytes).sum()
}

impl ReportModel {
    /// Aggregate totals and counts. Empty inputs give all-zero tallies.
    pub fn build(
        inventory: Vec<AssetRecord>,
        used: Vec<AssetRecord>,
        unused: Vec<AssetRecord>,
    ) -> Self {
        let totals = Tally {
            all: total_size(&inventory),
            used: total_size(&used),
            unused: total_size(&unused),
        };
        let counts = Tally {
            all: inventory.len() as u64,
            used: used.len() as u64,
            unused: unused.len() as u64,
        };
        Self {
            all_assets: inventory,
            used_assets: used,
            unused_assets: unused,
            totals,
            counts,
            project_name: String::new(),
            generated_at: Local::now(),
        }
    }

    /// Set the project display name.
    pub fn with_project_name(mut self, name: impl Into<String>) -> Self {
        self.project_name = name.into();
        self
    }

    /// True if any scanned image is not referenced by the build.
    pub fn has_unused(&self) -> bool {
        self.counts.unused > 0
    }

    /// Share of scanned bytes that no build output references.
    pub fn unused_percentage(&self) -> f64 {
        if self.totals.all == 0 {
            0.0
        } else {
            (self.totals.unused as f64 / self.totals.all as f64) * 100.0
        }
    }
}

//! Output formatting - plaintext and JSON.
//!
//! The JSON field names are a public contract consumed by external tooling:
//!
//! ```json
//! {
//!   "allImages":    [{ "path": "a.png", "size": 1024 }],
//!   "usedImages":   [...],
//!   "unusedImages": [...],
//!   "totals": { "all": 1024, "used": 1024, "unused": 0 },
//!   "counts": { "all": 1, "used": 1, "unused": 0 }
//! }
//! ```

use serde::Serialize;

use crate::error::{AuditResult, ImgauditError};
use crate::model::{ReportModel, Tally};
use crate::scan::AssetRecord;

#[derive(Serialize)]
struct JsonImage<'a> {
    path: &'a str,
    size: u64,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct JsonReport<'a> {
    all_images: Vec<JsonImage<'a>>,
    used_images: Vec<JsonImage<'a>>,
    unused_images: Vec<JsonImage<'a>>,
    totals: Tally,
    counts: Tally,
}

fn images(assets: &[AssetRecord]) -> Vec<JsonImage<'_>> {
    assets
        .iter()
        .map(|a| JsonImage {
            path: &a.relative_path,
            size: a.size_bytes,
        })
        .collect()
}

/// Serialize the report as pretty-printed JSON.
pub fn render_json(model: &ReportModel) -> AuditResult<String> {
    let report = JsonReport {
        all_images: images(&model.all_assets),
        used_images: images(&model.used_assets),
        unused_images: images(&model.unused_assets),
        totals: model.totals,
        counts: model.counts,
    };
    serde_json::to_string_pretty(&report).map_err(|e| ImgauditError::render(e.to_string()))
}

/// Format a byte count as KB below 1024 KB, otherwise MB. Two decimals.
pub fn format_size(size_bytes: u64) -> String {
    let kb = size_bytes as f64 / 1024.0;
    if kb < 1024.0 {
        format!("{kb:.2} KB")
    } else {
        format!("{:.2} MB", kb / 1024.0)
    }
}

/// Prints a report summary in plain text format.
pub fn print_plain(model: &ReportModel) {
    println!("=== Image Asset Report: {} ===\n", model.project_name);
    println!("Total:  {:>4} images  {}", model.counts.all, format_size(model.totals.all));
    println!("Used:   {:>4} images  {}", model.counts.used, format_size(model.totals.used));
    println!(
        "Unused: {:>4} images  {} ({:.1}% of bytes)",
        model.counts.unused,
        format_size(model.totals.unused),
        model.unused_percentage()
    );

    if model.unused_assets.is_empty() {
        println!("\nNo unused images found.");
    } else {
        println!("\nUNUSED IMAGES ({}):", model.unused_assets.len());
        for asset in &model.unused_assets {
            println!("- {} ({})", asset.relative_path, format_size(asset.size_bytes));
        }
    }
}

/// Prints the report in JSON format.
///
/// Falls back to the totals alone if serialization fails.
pub fn print_json(model: &ReportModel) {
    match render_json(model) {
        Ok(json) => println!("{}", json),
        Err(e) => {
            tracing::warn!(error = %e, "JSON serialization failed");
            println!(
                "{{\"totals\": {{\"all\": {}, \"used\": {}, \"unused\": {}}}}}",
                model.totals.all, model.totals.used, model.totals.unused
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn record(rel: &str, size: u64) -> AssetRecord {
        AssetRecord {
            absolute_path: PathBuf::from("/project").join(rel),
            relative_path: rel.to_string(),
            size_bytes: size,
        }
    }

    #[test]
    fn test_format_size() {
        assert_eq!(format_size(500), "0.49 KB");
        assert_eq!(format_size(0), "0.00 KB");
        assert_eq!(format_size(1024), "1.00 KB");
        assert_eq!(format_size(2_097_152), "2.00 MB");
        assert_eq!(format_size(1024 * 1024 - 1), "1024.00 KB");
        assert_eq!(format_size(1024 * 1024), "1.00 MB");
    }

    #[test]
    fn test_json_shape() {
        let a = record("a.png", 1024);
        let b = record("img/b.jpg", 2048);
        let model = ReportModel::build(vec![a.clone(), b.clone()], vec![a], vec![b]);

        let json = render_json(&model).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();

        assert_eq!(value["allImages"].as_array().unwrap().len(), 2);
        assert_eq!(
            value["usedImages"],
            serde_json::json!([{ "path": "a.png", "size": 1024 }])
        );
        assert_eq!(
            value["unusedImages"],
            serde_json::json!([{ "path": "img/b.jpg", "size": 2048 }])
        );
        assert_eq!(
            value["totals"],
            serde_json::json!({ "all": 3072, "used": 1024, "unused": 2048 })
        );
        assert_eq!(
            value["counts"],
            serde_json::json!({ "all": 2, "used": 1, "unused": 1 })
        );
        assert_eq!(value.as_object().unwrap().len(), 5);
    }

    #[test]
    fn test_json_empty_report() {
        let model = ReportModel::build(Vec::new(), Vec::new(), Vec::new());
        let value: serde_json::Value = serde_json::from_str(&render_json(&model).unwrap()).unwrap();
        assert_eq!(value["allImages"], serde_json::json!([]));
        assert_eq!(value["totals"]["all"], 0);
    }
}

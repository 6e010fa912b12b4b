//! Project metadata used to label the report.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::debug;

/// Favicon locations checked in order, relative to the project root.
const FAVICON_CANDIDATES: &[&str] = &["src/favicon.icon", "src/favicon.ico"];

#[derive(Deserialize)]
struct PackageJson {
    name: Option<String>,
}

/// Display name of the project.
///
/// Uses `name` from `package.json` when it is a non-empty string, otherwise the
/// root directory's name.
pub fn project_name(root: &Path) -> String {
    let pkg_path = root.join("package.json");
    if let Ok(raw) = fs::read_to_string(&pkg_path) {
        match serde_json::from_str::<PackageJson>(&raw) {
            Ok(PackageJson { name: Some(name) }) if !name.trim().is_empty() => {
                return name.trim().to_string();
            }
            Ok(_) => {}
            Err(e) => debug!(path = %pkg_path.display(), error = %e, "unparsable package.json"),
        }
    }

    root.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| root.display().to_string())
}

/// First existing favicon file of the project, if any.
pub fn find_favicon(root: &Path) -> Option<PathBuf> {
    FAVICON_CANDIDATES
        .iter()
        .map(|c| root.join(c))
        .find(|p| p.is_file())
}

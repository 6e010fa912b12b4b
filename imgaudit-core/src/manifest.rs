//! Build manifest: the flat view of a build that the audit consumes.
//!
//! The host build tool writes a JSON document listing its modules and emitted
//! assets. Only image-like entries count as references:
//!
//! ```json
//! {
//!   "modules": [{ "resource": "src/assets/logo.png" }, { "request": "./icon.svg" }],
//!   "assets":  [{ "name": "img/hero.3f2a.jpg", "sourceFilename": "src/img/hero.jpg" }]
//! }
//! ```

use std::fs;
use std::path::Path;

use serde::Deserialize;

use crate::error::{AuditResult, ImgauditError, IoResultExt};
use crate::reconcile::ReferencedPaths;
use crate::scan::ExtensionFilter;

/// One module of the build's module graph.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModuleRef {
    /// Resolved resource path, when the build resolved one.
    pub resource: Option<String>,
    /// Raw request string, used when `resource` is absent or empty.
    pub request: Option<String>,
}

impl ModuleRef {
    fn path(&self) -> Option<&str> {
        let non_empty = |s: &&str| !s.is_empty();
        self.resource
            .as_deref()
            .filter(non_empty)
            .or_else(|| self.request.as_deref().filter(non_empty))
    }
}

/// One file the build emitted.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmittedAsset {
    /// Output file name.
    pub name: String,
    /// Source file the output was produced from, if known.
    pub source_filename: Option<String>,
}

/// Modules and emitted assets of one build.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct BuildManifest {
    pub modules: Vec<ModuleRef>,
    pub assets: Vec<EmittedAsset>,
}

impl BuildManifest {
    /// Collect the canonical paths of every referenced image.
    ///
    /// Takes each module's resource (falling back to its request) and each
    /// emitted asset's source file, keeps the ones with an allowed image
    /// extension and resolves them against `root`.
    pub fn referenced_paths(&self, root: &Path, extensions: &[String]) -> ReferencedPaths {
        let filter = ExtensionFilter::new(extensions);
        let modules = self.modules.iter().filter_map(ModuleRef::path);
        let sources = self
            .assets
            .iter()
            .filter_map(|a| a.source_filename.as_deref());

        let images = modules
            .chain(sources)
            .filter(|p| filter.is_image(Path::new(p)));
        ReferencedPaths::from_paths(images, root)
    }
}

/// Parse a manifest from JSON text. `path` is only used in error messages.
pub fn parse_manifest(content: &str, path: &Path) -> AuditResult<BuildManifest> {
    serde_json::from_str(content).map_err(|e| ImgauditError::manifest(path, e.to_string()))
}

/// Read and parse a manifest file.
pub fn load_manifest(path: &Path) -> AuditResult<BuildManifest> {
    let content = fs::read_to_string(path).with_path(path)?;
    parse_manifest(&content, path)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn exts() -> Vec<String> {
        crate::config::DEFAULT_EXTENSIONS
            .iter()
            .map(|s| s.to_string())
            .collect()
    }

    #[test]
    fn test_referenced_paths_filters_non_images() {
        let json = r#"{
            "modules": [
                { "resource": "/p/src/logo.png" },
                { "request": "/p/src/icon.SVG" },
                { "resource": "/p/src/index.js" },
                {}
            ],
            "assets": [
                { "name": "hero.abc.jpg", "sourceFilename": "src/hero.jpg" },
                { "name": "main.js" }
            ]
        }"#;
        let manifest = parse_manifest(json, Path::new("manifest.json")).unwrap();
        let refs = manifest.referenced_paths(Path::new("/p"), &exts());

        assert_eq!(refs.len(), 3);
        assert!(refs.contains(Path::new("/p/src/logo.png")));
        assert!(refs.contains(Path::new("/p/src/icon.SVG")));
        assert!(refs.contains(Path::new("/p/src/hero.jpg")));
    }

    #[test]
    fn test_empty_resource_falls_back_to_request() {
        let json = r#"{ "modules": [{ "resource": "", "request": "/p/b.png" }] }"#;
        let manifest = parse_manifest(json, Path::new("m.json")).unwrap();
        let refs = manifest.referenced_paths(Path::new("/p"), &exts());
        assert_eq!(refs.len(), 1);
        assert!(refs.contains(Path::new("/p/b.png")));
    }

    #[test]
    fn test_resource_wins_over_request() {
        let json = r#"{ "modules": [{ "resource": "/p/a.png", "request": "/p/b.png" }] }"#;
        let manifest = parse_manifest(json, Path::new("m.json")).unwrap();
        let refs = manifest.referenced_paths(Path::new("/p"), &exts());
        assert!(refs.contains(Path::new("/p/a.png")));
        assert!(!refs.contains(Path::new("/p/b.png")));
    }

    #[test]
    fn test_empty_object_is_valid() {
        let manifest = parse_manifest("{}", Path::new("m.json")).unwrap();
        assert!(manifest.referenced_paths(Path::new("/p"), &exts()).is_empty());
    }

    #[test]
    fn test_malformed_manifest_is_typed_error() {
        let err = parse_manifest("{ \"modules\": 3 }", Path::new("m.json")).unwrap_err();
        assert!(matches!(err, ImgauditError::Manifest { .. }));
    }

    #[test]
    fn test_missing_manifest_is_io_error() {
        let err = load_manifest(Path::new("/definitely/missing/manifest.json")).unwrap_err();
        assert!(matches!(err, ImgauditError::Io { .. }));
    }
}

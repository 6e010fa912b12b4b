//! Builder pattern API and the per-cycle pipeline.
//!
//! One report cycle is a strict pipeline: scan, reconcile, aggregate, render.
//!
//! ```rust,ignore
//! use imgaudit_core::prelude::*;
//!
//! let manifest = load_manifest(Path::new("dist/build-manifest.json"))?;
//! let audit = ImgAudit::new("/path/to/project")
//!     .mode(Mode::Static)
//!     .emit_json(true)
//!     .manifest(manifest);
//!
//! let model = audit.generate()?;
//! let rendered = audit.render(&model)?;
//! println!("{} unused images", model.counts.unused);
//! ```

use std::path::{Path, PathBuf};
#[cfg(feature = "serve")]
use std::sync::Arc;

use crate::config::{AuditConfig, Mode};
use crate::error::AuditResult;
use crate::logging::log_report_generated;
use crate::manifest::BuildManifest;
use crate::matcher::PathMatcher;
use crate::model::ReportModel;
use crate::project::project_name;
use crate::reconcile::{reconcile, ReferencedPaths, Reconciliation};
use crate::scan::{canonical_root, scan_images};

#[cfg(feature = "html")]
use crate::project::find_favicon;
#[cfg(feature = "html")]
use crate::report::render_json;
#[cfg(feature = "html")]
use crate::report_html::{favicon_data_uri, render_html, HtmlContext, FAVICON_ENDPOINT};
#[cfg(feature = "serve")]
use crate::serve::LiveServer;

/// Run scan, reconcile and aggregate for one cycle.
///
/// The exclusion file is re-read on every call. The inventory is sorted by
/// relative path so repeated cycles over an unchanged tree render identically.
pub fn generate_report(
    root: &Path,
    config: &AuditConfig,
    referenced: &ReferencedPaths,
) -> AuditResult<ReportModel> {
    config.validate(root)?;
    let root = canonical_root(root)?;

    let matcher = PathMatcher::for_project(
        &root,
        config.ignore_dirs.iter().cloned(),
        &config.exclusion_file,
    );
    let mut inventory = scan_images(&root, &config.allowed_extensions, &matcher)?;
    inventory.sort_by(|a, b| a.relative_path.cmp(&b.relative_path));

    let Reconciliation { used, unused } = reconcile(&inventory, referenced);
    let model = ReportModel::build(inventory, used, unused).with_project_name(project_name(&root));

    log_report_generated(&root, &model);
    Ok(model)
}

/// Rendered output documents of one cycle.
#[cfg(feature = "html")]
#[derive(Debug, Clone)]
pub struct RenderedReport {
    pub html: String,
    /// Present only when JSON emission is enabled.
    pub json: Option<String>,
    /// Absolute path of the project favicon served by the live server.
    pub favicon: Option<PathBuf>,
}

/// Render the HTML document and, if enabled, the JSON document.
#[cfg(feature = "html")]
pub fn render_report(
    model: &ReportModel,
    config: &AuditConfig,
    favicon: Option<PathBuf>,
) -> AuditResult<RenderedReport> {
    let favicon_href = favicon.as_deref().and_then(|path| match config.mode {
        Mode::Static => favicon_data_uri(path),
        Mode::Watch => Some(FAVICON_ENDPOINT.to_string()),
    });
    let context = HtmlContext { favicon_href };

    let html = render_html(model, config.mode, &context, config.mode.preview_url_builder());
    let json = if config.emit_json {
        Some(render_json(model)?)
    } else {
        None
    };

    Ok(RenderedReport {
        html,
        json,
        favicon,
    })
}

/// Builder for configuring and running one audit cycle.
#[derive(Debug, Clone)]
pub struct ImgAudit {
    /// Project root to scan
    root: PathBuf,

    /// Scan and output settings
    config: AuditConfig,

    /// Build manifests contributing referenced paths
    manifests: Vec<BuildManifest>,

    /// Explicitly referenced paths (absolute or root-relative)
    references: Vec<PathBuf>,
}

impl ImgAudit {
    /// Create a new audit builder for the given project root.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            config: AuditConfig::default(),
            manifests: Vec::new(),
            references: Vec::new(),
        }
    }

    /// Replace the whole configuration.
    pub fn with_config(mut self, mut config: AuditConfig) -> Self {
        config.normalize();
        self.config = config;
        self
    }

    /// Set the allowed image extensions.
    pub fn extensions(mut self, exts: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.config.allowed_extensions = exts.into_iter().map(Into::into).collect();
        self.config.normalize();
        self
    }

    /// Set the directory names that are never scanned.
    pub fn ignore_dirs(mut self, dirs: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.config.ignore_dirs = dirs.into_iter().map(Into::into).collect();
        self.config.normalize();
        self
    }

    /// Select static or watch rendering.
    pub fn mode(mut self, mode: Mode) -> Self {
        self.config.mode = mode;
        self
    }

    /// Enable or disable the JSON document.
    pub fn emit_json(mut self, enabled: bool) -> Self {
        self.config.emit_json = enabled;
        self
    }

    /// Add a build manifest whose image modules and assets count as used.
    pub fn manifest(mut self, manifest: BuildManifest) -> Self {
        self.manifests.push(manifest);
        self
    }

    /// Add paths that count as used.
    pub fn references(mut self, paths: impl IntoIterator<Item = impl Into<PathBuf>>) -> Self {
        self.references.extend(paths.into_iter().map(Into::into));
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn config(&self) -> &AuditConfig {
        &self.config
    }

    /// Canonical referenced-path set from all manifests and explicit paths.
    pub fn referenced_paths(&self) -> ReferencedPaths {
        let mut referenced = ReferencedPaths::from_paths(&self.references, &self.root);
        for manifest in &self.manifests {
            referenced.extend(manifest.referenced_paths(&self.root, &self.config.allowed_extensions));
        }
        referenced
    }

    /// Run scan, reconcile and aggregate.
    pub fn generate(&self) -> AuditResult<ReportModel> {
        generate_report(&self.root, &self.config, &self.referenced_paths())
    }

    /// Render a model with this builder's configuration.
    #[cfg(feature = "html")]
    pub fn render(&self, model: &ReportModel) -> AuditResult<RenderedReport> {
        let root = canonical_root(&self.root)?;
        render_report(model, &self.config, find_favicon(&root))
    }

    /// Render a model and hand it to the live server, if one is running.
    ///
    /// The returned documents are what the caller persists to disk.
    #[cfg(feature = "serve")]
    pub fn render_and_publish(
        &self,
        model: &ReportModel,
        server: Option<&LiveServer>,
    ) -> AuditResult<Arc<RenderedReport>> {
        let rendered = Arc::new(self.render(model)?);
        if let Some(server) = server {
            server.publish(Arc::clone(&rendered));
        }
        Ok(rendered)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ImgauditError;
    use std::fs;
    use std::sync::atomic::{AtomicU64, Ordering};

    static TEST_COUNTER: AtomicU64 = AtomicU64::new(0);

    fn create_test_project() -> PathBuf {
        let id = TEST_COUNTER.fetch_add(1, Ordering::SeqCst);
        let dir = std::env::temp_dir().join(format!(
            "imgaudit_builder_test_{}_{}",
            std::process::id(),
            id
        ));
        if dir.exists() {
            fs::remove_dir_all(&dir).ok();
        }
        fs::create_dir_all(dir.join("src/img")).expect("Failed to create test directory");

        fs::write(dir.join("src/img/used.png"), [0u8; 10]).expect("Failed to write used.png");
        fs::write(dir.join("src/img/unused.svg"), [0u8; 20]).expect("Failed to write unused.svg");
        fs::write(dir.join("src/index.js"), "import './img/used.png'").expect("Failed to write js");

        dir
    }

    #[test]
    fn test_builder_basic() {
        let dir = create_test_project();

        let model = ImgAudit::new(&dir)
            .references(["src/img/used.png"])
            .generate()
            .unwrap();

        assert_eq!(model.counts.all, 2);
        assert_eq!(model.used_assets[0].relative_path, "src/img/used.png");
        assert_eq!(model.unused_assets[0].relative_path, "src/img/unused.svg");
        assert_eq!(model.totals.unused, 20);

        fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_builder_manifest_references() {
        let dir = create_test_project();
        let manifest = crate::manifest::parse_manifest(
            r#"{ "assets": [{ "name": "x.png", "sourceFilename": "src/img/unused.svg" }] }"#,
            Path::new("m.json"),
        )
        .unwrap();

        let model = ImgAudit::new(&dir).manifest(manifest).generate().unwrap();
        assert_eq!(model.counts.used, 1);
        assert_eq!(model.used_assets[0].relative_path, "src/img/unused.svg");

        fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_builder_extension_filter() {
        let dir = create_test_project();

        let model = ImgAudit::new(&dir).extensions(["SVG"]).generate().unwrap();
        assert_eq!(model.counts.all, 1);
        assert_eq!(model.all_assets[0].relative_path, "src/img/unused.svg");

        fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_generate_respects_exclusion_file() {
        let dir = create_test_project();
        fs::write(dir.join(".gitignore"), "# generated\n/src/img/unused\n").unwrap();

        let model = ImgAudit::new(&dir).generate().unwrap();
        assert_eq!(model.counts.all, 1);
        assert_eq!(model.all_assets[0].relative_path, "src/img/used.png");

        fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_generate_invalid_root() {
        let err = ImgAudit::new("/definitely/not/a/project/root")
            .generate()
            .unwrap_err();
        assert!(matches!(err, ImgauditError::InvalidRoot { .. }));
    }

    #[test]
    fn test_render_respects_emit_json() {
        let dir = create_test_project();
        let audit = ImgAudit::new(&dir);
        let model = audit.generate().unwrap();

        assert!(audit.render(&model).unwrap().json.is_none());
        let rendered = audit.clone().emit_json(true).render(&model).unwrap();
        assert!(rendered.json.unwrap().contains("\"unusedImages\""));

        fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_watch_favicon_goes_through_server() {
        let dir = create_test_project();
        fs::write(dir.join("src/favicon.ico"), [1u8; 4]).unwrap();

        let audit = ImgAudit::new(&dir).mode(Mode::Watch);
        let rendered = audit.render(&audit.generate().unwrap()).unwrap();
        assert!(rendered.html.contains("href=\"/favicon.ico\""));
        let canonical = fs::canonicalize(&dir).unwrap();
        assert_eq!(rendered.favicon, Some(canonical.join("src/favicon.ico")));

        fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_static_favicon_embedded_with_relative_root() {
        let id = TEST_COUNTER.fetch_add(1, Ordering::SeqCst);
        let rel = PathBuf::from(format!(
            "imgaudit_relative_root_{}_{}",
            std::process::id(),
            id
        ));
        fs::create_dir_all(rel.join("src")).unwrap();
        fs::write(rel.join("src/favicon.ico"), [0u8, 0, 1, 0]).unwrap();

        let audit = ImgAudit::new(&rel);
        let rendered = audit.render(&audit.generate().unwrap()).unwrap();
        assert!(rendered
            .html
            .contains("<link rel=\"icon\" href=\"data:image/x-icon;base64,AAABAA==\">"));
        assert!(!rendered.html.contains("file://./"));
        assert!(rendered.favicon.as_deref().is_some_and(Path::is_absolute));

        fs::remove_dir_all(&rel).ok();
    }
}

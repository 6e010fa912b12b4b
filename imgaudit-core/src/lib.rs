//! imgaudit-core: image asset audit library
//!
//! Finds every image file under a project root, reconciles the inventory
//! against the paths a build actually consumed, and renders the result as an
//! HTML page, a JSON document or a plaintext summary.
//!
//! # Features
//!
//! - **Parallel discovery**: walk the project tree once, stat files in parallel
//! - **Exclusions**: ignored directory names plus `.gitignore`-style prefixes
//! - **Reconciliation**: partition the inventory into used and unused images
//! - **Build manifests**: read referenced paths from a bundler's stats output
//! - **Reports**: self-contained HTML, JSON for tooling, plaintext for terminals
//! - **Live server**: serve the latest report with auto-refresh in watch mode
//!
//! # Quick Start
//!
//! Use the [`prelude`] module for convenient imports:
//!
//! ```rust,ignore
//! use imgaudit_core::prelude::*;
//!
//! let model = ImgAudit::new("/path/to/project")
//!     .references(["src/img/logo.png"])
//!     .generate()?;
//!
//! for asset in &model.unused_assets {
//!     println!("Unused image: {}", asset.relative_path);
//! }
//! ```
//!
//! # Module Organization
//!
//! - [`scan`]: Image discovery with ignore-directory pruning
//! - [`matcher`]: Ignore names and exclusion patterns
//! - [`reconcile`]: Used/unused partition against referenced paths
//! - [`manifest`]: Build manifest decoding
//! - [`model`]: Aggregated report model
//! - [`report`]: JSON and plaintext output
//! - [`builder`]: Fluent builder API and the per-cycle pipeline
//! - [`error`]: Typed error handling
//!
//! # Cargo Features
//!
//! - `html` (default): HTML report rendering
//! - `serve` (default): Live report server for watch mode
//! - `full`: Enable all optional features

// Core modules (always available)
pub mod builder;
pub mod config;
pub mod error;
pub mod logging;
pub mod manifest;
pub mod matcher;
pub mod model;
pub mod prelude;
pub mod project;
pub mod reconcile;
pub mod report;
pub mod scan;

// Feature-gated modules
#[cfg(feature = "html")]
pub mod report_html;

#[cfg(feature = "serve")]
pub mod mime;
#[cfg(feature = "serve")]
pub mod serve;

// ============================================================================
// Explicit Re-exports (avoiding glob imports for clear API surface)
// ============================================================================

// Error types
pub use error::{AuditResult, ImgauditError, IoResultExt};

// Builder API
pub use builder::{generate_report, ImgAudit};

// Configuration
pub use config::{
    load_config, normalize_extension, AuditConfig, Mode, ServeConfig, CONFIG_FILE,
    DEFAULT_EXTENSIONS, DEFAULT_IGNORE_DIRS,
};

// Logging
pub use logging::{
    init_structured_logging, log_config_ignored, log_cycle_failed, log_report_generated,
    log_report_written,
};

// Build manifests
pub use manifest::{load_manifest, parse_manifest, BuildManifest, EmittedAsset, ModuleRef};

// Path matching
pub use matcher::{
    lexical_normalize, load_exclusion_patterns, normalize_path_string, parse_exclusion_patterns,
    relative_slash_path, PathMatcher,
};

// Report model
pub use model::{ReportModel, Tally};

// Project metadata
pub use project::{find_favicon, project_name};

// Reconciliation
pub use reconcile::{canonicalize_reference, reconcile, ReferencedPaths, Reconciliation};

// Reporting
pub use report::{format_size, print_json, print_plain, render_json};

// Image discovery
pub use scan::{canonical_root, scan_images, AssetRecord, ExtensionFilter};

// Feature-gated re-exports
#[cfg(feature = "html")]
pub use builder::{render_report, RenderedReport};
#[cfg(feature = "html")]
pub use report_html::{
    escape_html, favicon_data_uri, file_url, preview_url, render_html, HtmlContext,
};

#[cfg(feature = "serve")]
pub use serve::{route, Body, LiveServer, Reply, JSON_ENDPOINT, PLACEHOLDER_HTML};

//! Prelude module for convenient imports.
//!
//! ```rust,ignore
//! use imgaudit_core::prelude::*;
//! ```

// Core audit types
pub use crate::error::{AuditResult, ImgauditError};
pub use crate::model::ReportModel;
pub use crate::scan::AssetRecord;

// Builder API
pub use crate::builder::{generate_report, ImgAudit};

// Configuration
pub use crate::config::{load_config, AuditConfig, Mode};

// Referenced paths
pub use crate::manifest::{load_manifest, BuildManifest};
pub use crate::reconcile::ReferencedPaths;

// Output
pub use crate::report::{print_json, print_plain, render_json};

#[cfg(feature = "html")]
pub use crate::builder::RenderedReport;

#[cfg(feature = "serve")]
pub use crate::serve::LiveServer;

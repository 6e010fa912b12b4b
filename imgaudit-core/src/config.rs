//! Configuration loading from imgaudit.toml.
//!
//! Every field has a default, so an empty or missing file yields a usable
//! configuration. The CLI layers its flags on top of whatever is loaded here.
//!
//! ```toml
//! allowed_extensions = [".png", ".svg"]
//! ignore_dirs = ["node_modules", ".git", "dist", "coverage"]
//! mode = "watch"
//! emit_json = true
//!
//! [serve]
//! interface = "127.0.0.1"
//! port = 8099
//! ```

use anyhow::{Context, Result};
use serde::Deserialize;
use std::fmt;
use std::net::{IpAddr, Ipv4Addr};
use std::{fs, path::Path};

use crate::error::{AuditResult, ImgauditError};

/// Name of the optional per-project config file.
pub const CONFIG_FILE: &str = "imgaudit.toml";

/// Image extensions recognized when none are configured.
pub const DEFAULT_EXTENSIONS: &[&str] = &[".png", ".jpg", ".jpeg", ".gif", ".svg", ".webp"];

/// Directory names never descended into when none are configured.
pub const DEFAULT_IGNORE_DIRS: &[&str] = &["node_modules", ".git", "dist"];

/// Report generation mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    /// One-shot report written to disk; previews reference local files.
    #[default]
    Static,
    /// Repeated cycles served live; previews go through the server.
    Watch,
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Static => write!(f, "static"),
            Self::Watch => write!(f, "watch"),
        }
    }
}

impl std::str::FromStr for Mode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "static" => Ok(Self::Static),
            "watch" => Ok(Self::Watch),
            other => Err(format!("unknown mode '{other}' (expected static or watch)")),
        }
    }
}

/// Main configuration structure for imgaudit.toml.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AuditConfig {
    /// Extensions (with leading dot) that identify image files.
    pub allowed_extensions: Vec<String>,
    /// Bare directory names that are never scanned.
    pub ignore_dirs: Vec<String>,
    /// Static or watch mode.
    pub mode: Mode,
    /// File name of the HTML report.
    pub html_report: String,
    /// File name of the JSON report.
    pub json_report: String,
    /// Whether the JSON report is produced.
    pub emit_json: bool,
    /// Exclusion file read from the project root each cycle.
    pub exclusion_file: String,
    /// Seconds between report cycles in watch mode.
    pub watch_interval_secs: u64,
    /// Live server settings.
    pub serve: ServeConfig,
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            allowed_extensions: DEFAULT_EXTENSIONS.iter().map(|s| s.to_string()).collect(),
            ignore_dirs: DEFAULT_IGNORE_DIRS.iter().map(|s| s.to_string()).collect(),
            mode: Mode::Static,
            html_report: "assets-report.html".to_string(),
            json_report: "asset-report.json".to_string(),
            emit_json: false,
            exclusion_file: ".gitignore".to_string(),
            watch_interval_secs: 2,
            serve: ServeConfig::default(),
        }
    }
}

/// Live server settings (`[serve]` section).
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServeConfig {
    /// Network interface to bind. Loopback unless explicitly widened.
    pub interface: IpAddr,
    /// Fixed HTTP port.
    pub port: u16,
}

impl Default for ServeConfig {
    fn default() -> Self {
        Self {
            interface: IpAddr::V4(Ipv4Addr::LOCALHOST),
            port: 8099,
        }
    }
}

impl AuditConfig {
    /// Normalize user-supplied values in place.
    ///
    /// Extensions are lowercased and given a leading dot. Empty extension or
    /// ignore-dir lists fall back to the defaults.
    pub fn normalize(&mut self) {
        let exts: Vec<String> = self
            .allowed_extensions
            .iter()
            .map(|e| normalize_extension(e))
            .filter(|e| e.len() > 1)
            .collect();
        self.allowed_extensions = if exts.is_empty() {
            DEFAULT_EXTENSIONS.iter().map(|s| s.to_string()).collect()
        } else {
            exts
        };

        self.ignore_dirs.retain(|d| !d.trim().is_empty());
        if self.ignore_dirs.is_empty() {
            self.ignore_dirs = DEFAULT_IGNORE_DIRS.iter().map(|s| s.to_string()).collect();
        }

        if self.watch_interval_secs == 0 {
            self.watch_interval_secs = 1;
        }
    }

    /// Reject configurations that cannot produce a report.
    ///
    /// `root` only names the config file in the error.
    pub fn validate(&self, root: &Path) -> AuditResult<()> {
        let path = root.join(CONFIG_FILE);
        if self.html_report.trim().is_empty() {
            return Err(ImgauditError::config(path, "html_report must not be empty"));
        }
        if self.emit_json {
            if self.json_report.trim().is_empty() {
                return Err(ImgauditError::config(path, "json_report must not be empty"));
            }
            if self.json_report == self.html_report {
                return Err(ImgauditError::config(
                    path,
                    "html_report and json_report must differ",
                ));
            }
        }
        Ok(())
    }
}

/// Lowercase an extension and ensure it starts with a dot.
pub fn normalize_extension(ext: &str) -> String {
    let ext = ext.trim().to_lowercase();
    if ext.starts_with('.') {
        ext
    } else {
        format!(".{ext}")
    }
}

/// Loads configuration from imgaudit.toml if it exists.
pub fn load_config(root: &Path) -> Result<Option<AuditConfig>> {
    let path = root.join(CONFIG_FILE);
    if !path.exists() {
        return Ok(None);
    }

    let content =
        fs::read_to_string(&path).with_context(|| format!("Failed to read {}", path.display()))?;
    let mut cfg: AuditConfig = toml::from_str(&content).context("Invalid imgaudit.toml")?;
    cfg.normalize();
    Ok(Some(cfg))
}

//! Typed error handling for imgaudit.
//!
//! Only cycle-level failures are represented here. Per-path problems during a
//! scan (unreadable directories, failed stats) are skipped where they happen
//! and never become an `ImgauditError`.

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for imgaudit operations.
#[derive(Error, Debug)]
pub enum ImgauditError {
    /// I/O error when reading/writing files
    #[error("I/O error at {path}: {message}")]
    Io {
        path: PathBuf,
        message: String,
        #[source]
        source: Option<std::io::Error>,
    },

    /// Scan root is missing, unreadable or not a directory
    #[error("Invalid project root {path}: {message}")]
    InvalidRoot { path: PathBuf, message: String },

    /// Configuration file errors
    #[error("Config error at {path}: {message}")]
    Config { path: PathBuf, message: String },

    /// Build manifest could not be read or decoded
    #[error("Manifest error at {path}: {message}")]
    Manifest { path: PathBuf, message: String },

    /// Live server could not be started
    #[error("Serve error: {message}")]
    Serve { message: String },

    /// Report could not be rendered
    #[error("Render error: {message}")]
    Render { message: String },
}

impl ImgauditError {
    /// Create an I/O error with path context.
    pub fn io(path: impl Into<PathBuf>, err: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            message: err.to_string(),
            source: Some(err),
        }
    }

    /// Create an invalid-root error.
    pub fn invalid_root(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::InvalidRoot {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create a config error.
    pub fn config(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::Config {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create a manifest error.
    pub fn manifest(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::Manifest {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create a serve error.
    pub fn serve(message: impl Into<String>) -> Self {
        Self::Serve {
            message: message.into(),
        }
    }

    /// Create a render error.
    pub fn render(message: impl Into<String>) -> Self {
        Self::Render {
            message: message.into(),
        }
    }

    /// Check if the next report cycle may succeed without intervention.
    ///
    /// In watch mode a recoverable failure only skips the current cycle.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::Io { .. } | Self::Manifest { .. } | Self::Render { .. }
        )
    }

    /// Get the path associated with this error, if any.
    pub fn path(&self) -> Option<&PathBuf> {
        match self {
            Self::Io { path, .. } => Some(path),
            Self::InvalidRoot { path, .. } => Some(path),
            Self::Config { path, .. } => Some(path),
            Self::Manifest { path, .. } => Some(path),
            _ => None,
        }
    }
}

/// Convenience type alias for imgaudit results.
pub type AuditResult<T> = Result<T, ImgauditError>;

/// Extension trait for converting std::io::Error with path context.
pub trait IoResultExt<T> {
    /// Add path context to an I/O error.
    fn with_path(self, path: impl Into<PathBuf>) -> AuditResult<T>;
}

impl<T> IoResultExt<T> for std::io::Result<T> {
    fn with_path(self, path: impl Into<PathBuf>) -> AuditResult<T> {
        self.map_err(|e| ImgauditError::io(path, e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_io_error() {
        let err = ImgauditError::io(
            PathBuf::from("/project/logo.png"),
            std::io::Error::new(std::io::ErrorKind::NotFound, "file not found"),
        );
        assert!(matches!(err, ImgauditError::Io { .. }));
        assert_eq!(err.path(), Some(&PathBuf::from("/project/logo.png")));
        assert!(err.to_string().contains("/project/logo.png"));
    }

    #[test]
    fn test_invalid_root_message() {
        let err = ImgauditError::invalid_root("/nope", "not a directory");
        assert_eq!(err.to_string(), "Invalid project root /nope: not a directory");
        assert_eq!(err.path(), Some(&PathBuf::from("/nope")));
    }

    #[test]
    fn test_is_recoverable() {
        assert!(ImgauditError::manifest("/m.json", "truncated").is_recoverable());
        assert!(ImgauditError::render("bad").is_recoverable());
        assert!(!ImgauditError::invalid_root("/x", "missing").is_recoverable());
        assert!(!ImgauditError::serve("port in use").is_recoverable());
    }

    #[test]
    fn test_serve_error_has_no_path() {
        assert!(ImgauditError::serve("port in use").path().is_none());
    }

    #[test]
    fn test_io_result_ext() {
        let result: std::io::Result<()> =
            Err(std::io::Error::new(std::io::ErrorKind::NotFound, "missing"));
        let audit_result = result.with_path("/missing/file.png");
        assert!(matches!(audit_result, Err(ImgauditError::Io { .. })));
    }
}

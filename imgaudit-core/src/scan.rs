//! Image discovery with early directory pruning.
//!
//! Performance notes:
//! - Ignored and excluded directories are pruned via `WalkDir::filter_entry`,
//!   so their subtrees are never listed
//! - Stat calls for candidate files run on Rayon's pool via `par_bridge`
//!
//! The walk never fails as a whole once the root is valid. Unreadable
//! directories and files whose size cannot be read are skipped. Symlinks are
//! not followed and are never reported, since they are not regular files.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use rayon::prelude::*;
use tracing::debug;
use walkdir::{DirEntry, WalkDir};

use crate::config::normalize_extension;
use crate::error::{AuditResult, ImgauditError};
use crate::matcher::{relative_slash_path, PathMatcher};

/// One discovered image file. Created by the scanner, never mutated.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AssetRecord {
    /// Canonical absolute path (canonical root joined with the entry path).
    pub absolute_path: PathBuf,
    /// Root-relative path with `/` separators.
    pub relative_path: String,
    /// File size in bytes.
    pub size_bytes: u64,
}

/// Set of allowed image extensions, compared case-insensitively.
#[derive(Debug, Clone)]
pub struct ExtensionFilter {
    extensions: HashSet<String>,
}

impl ExtensionFilter {
    pub fn new(extensions: &[String]) -> Self {
        Self {
            extensions: extensions.iter().map(|e| normalize_extension(e)).collect(),
        }
    }

    /// True iff the path's extension is in the allow-list.
    pub fn is_image(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| self.extensions.contains(&format!(".{}", ext.to_lowercase())))
    }
}

/// Resolve the scan root to its canonical form.
///
/// A missing or non-directory root is a configuration error for the cycle.
pub fn canonical_root(root: &Path) -> AuditResult<PathBuf> {
    let canonical = fs::canonicalize(root)
        .map_err(|e| ImgauditError::invalid_root(root, e.to_string()))?;
    if !canonical.is_dir() {
        return Err(ImgauditError::invalid_root(root, "not a directory"));
    }
    Ok(canonical)
}

/// Decides whether `filter_entry` lets the walker descend into a directory.
///
/// Files always pass here and are filtered in [`to_record`].
#[inline]
fn should_descend(entry: &DirEntry, root: &Path, matcher: &PathMatcher) -> bool {
    if !entry.file_type().is_dir() {
        return true;
    }
    let ignored_name = entry
        .file_name()
        .to_str()
        .is_some_and(|name| matcher.is_ignored_directory(name));
    if ignored_name {
        return false;
    }
    let rel = entry
        .path()
        .strip_prefix(root)
        .map(relative_slash_path)
        .unwrap_or_default();
    !matcher.matches_exclusion_pattern(&rel)
}

fn to_record(
    entry: DirEntry,
    root: &Path,
    filter: &ExtensionFilter,
    matcher: &PathMatcher,
) -> Option<AssetRecord> {
    if !entry.file_type().is_file() {
        return None;
    }
    let rel = relative_slash_path(entry.path().strip_prefix(root).ok()?);
    if matcher.matches_exclusion_pattern(&rel) || !filter.is_image(entry.path()) {
        return None;
    }
    let size_bytes = match entry.metadata() {
        Ok(meta) => meta.len(),
        Err(e) => {
            debug!(path = %entry.path().display(), error = %e, "stat failed, skipping");
            return None;
        }
    };
    Some(AssetRecord {
        absolute_path: entry.into_path(),
        relative_path: rel,
        size_bytes,
    })
}

/// Walk `root` and return every non-ignored image file.
///
/// Order is unspecified; sort the result when determinism matters. Each
/// filesystem path is visited at most once, so there are no duplicates.
pub fn scan_images(
    root: &Path,
    extensions: &[String],
    matcher: &PathMatcher,
) -> AuditResult<Vec<AssetRecord>> {
    let root = canonical_root(root)?;
    let filter = ExtensionFilter::new(extensions);

    let records: Vec<AssetRecord> = WalkDir::new(&root)
        .min_depth(1)
        .into_iter()
        // Prune before listing: ignored subtrees are never read
        .filter_entry(|e| should_descend(e, &root, matcher))
        .filter_map(|entry| match entry {
            Ok(e) => Some(e),
            Err(e) => {
                debug!(error = %e, "unreadable entry, skipping");
                None
            }
        })
        .par_bridge()
        .filter_map(|e| to_record(e, &root, &filter, matcher))
        .collect();

    debug!(root = %root.display(), count = records.len(), "scan finished");
    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU64, Ordering};

    static TEST_COUNTER: AtomicU64 = AtomicU64::new(0);

    fn create_temp_dir(name: &str) -> PathBuf {
        let id = TEST_COUNTER.fetch_add(1, Ordering::SeqCst);
        let dir = std::env::temp_dir()
            .join("imgaudit_scan_test")
            .join(format!("{}_{}_{}", name, std::process::id(), id));
        if dir.exists() {
            fs::remove_dir_all(&dir).ok();
        }
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    fn write_bytes(path: &Path, len: usize) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, vec![0u8; len]).unwrap();
    }

    fn default_exts() -> Vec<String> {
        crate::config::DEFAULT_EXTENSIONS
            .iter()
            .map(|s| s.to_string())
            .collect()
    }

    fn rel_paths(records: &[AssetRecord]) -> Vec<String> {
        let mut paths: Vec<String> = records.iter().map(|r| r.relative_path.clone()).collect();
        paths.sort();
        paths
    }

    #[test]
    fn test_extension_filter_case_insensitive() {
        let filter = ExtensionFilter::new(&["png".to_string(), ".JPG".to_string()]);
        assert!(filter.is_image(Path::new("a/LOGO.PNG")));
        assert!(filter.is_image(Path::new("photo.jpg")));
        assert!(!filter.is_image(Path::new("photo.jpeg")));
        assert!(!filter.is_image(Path::new(".png")));
        assert!(!filter.is_image(Path::new("README")));
    }

    #[test]
    fn test_scan_finds_nested_images_with_sizes() {
        let dir = create_temp_dir("nested");
        write_bytes(&dir.join("logo.png"), 10);
        write_bytes(&dir.join("src/img/hero.JPG"), 20);
        write_bytes(&dir.join("src/main.js"), 5);

        let records = scan_images(&dir, &default_exts(), &PathMatcher::default()).unwrap();
        assert_eq!(rel_paths(&records), vec!["logo.png", "src/img/hero.JPG"]);

        let hero = records
            .iter()
            .find(|r| r.relative_path == "src/img/hero.JPG")
            .unwrap();
        assert_eq!(hero.size_bytes, 20);
        assert!(hero.absolute_path.is_absolute());
        assert!(hero.absolute_path.ends_with("src/img/hero.JPG"));

        fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_ignored_names_prune_at_any_depth() {
        let dir = create_temp_dir("ignored");
        write_bytes(&dir.join("node_modules/logo.png"), 1);
        write_bytes(&dir.join("packages/ui/node_modules/icon.svg"), 1);
        write_bytes(&dir.join("packages/ui/icon.svg"), 1);

        let matcher = PathMatcher::new(["node_modules"], Vec::<String>::new());
        let records = scan_images(&dir, &default_exts(), &matcher).unwrap();
        assert_eq!(rel_paths(&records), vec!["packages/ui/icon.svg"]);

        fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_root_with_ignored_name_is_still_scanned() {
        let dir = create_temp_dir("root").join("dist");
        write_bytes(&dir.join("a.png"), 1);

        let matcher = PathMatcher::new(["dist"], Vec::<String>::new());
        let records = scan_images(&dir, &default_exts(), &matcher).unwrap();
        assert_eq!(rel_paths(&records), vec!["a.png"]);
    }

    #[test]
    fn test_exclusion_patterns_apply_to_dirs_and_files() {
        let dir = create_temp_dir("excluded");
        write_bytes(&dir.join("build/icon.svg"), 1);
        write_bytes(&dir.join("temp.png"), 1);
        write_bytes(&dir.join("a/temp/x.png"), 1);

        let matcher = PathMatcher::new(Vec::<String>::new(), ["/build", "temp"]);
        let records = scan_images(&dir, &default_exts(), &matcher).unwrap();
        assert_eq!(rel_paths(&records), vec!["a/temp/x.png"]);

        fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_invalid_root_is_an_error() {
        let missing = std::env::temp_dir().join("imgaudit_scan_test_missing_root_xyz");
        let err = scan_images(&missing, &default_exts(), &PathMatcher::default()).unwrap_err();
        assert!(matches!(err, ImgauditError::InvalidRoot { .. }));
    }

    #[test]
    fn test_file_root_is_an_error() {
        let dir = create_temp_dir("file_root");
        let file = dir.join("a.png");
        write_bytes(&file, 1);
        let err = scan_images(&file, &default_exts(), &PathMatcher::default()).unwrap_err();
        assert!(matches!(err, ImgauditError::InvalidRoot { .. }));

        fs::remove_dir_all(&dir).ok();
    }

    #[cfg(unix)]
    #[test]
    fn test_symlinks_are_not_reported() {
        let dir = create_temp_dir("symlink");
        write_bytes(&dir.join("real.png"), 3);
        std::os::unix::fs::symlink(dir.join("real.png"), dir.join("alias.png")).unwrap();

        let records = scan_images(&dir, &default_exts(), &PathMatcher::default()).unwrap();
        assert_eq!(rel_paths(&records), vec!["real.png"]);

        fs::remove_dir_all(&dir).ok();
    }

    #[cfg(unix)]
    #[test]
    fn test_unreadable_directory_is_skipped() {
        use std::os::unix::fs::PermissionsExt;

        let dir = create_temp_dir("unreadable");
        write_bytes(&dir.join("ok/a.png"), 4);
        write_bytes(&dir.join("locked/hidden.png"), 4);
        let locked = dir.join("locked");
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o000)).unwrap();

        // Permission bits do not bind a privileged user
        if fs::read_dir(&locked).is_ok() {
            fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).ok();
            fs::remove_dir_all(&dir).ok();
            return;
        }

        let result = scan_images(&dir, &default_exts(), &PathMatcher::default());
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).ok();

        let records = result.unwrap();
        assert_eq!(rel_paths(&records), vec!["ok/a.png"]);

        fs::remove_dir_all(&dir).ok();
    }
}

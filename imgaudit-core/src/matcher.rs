//! Path normalization and ignore-rule evaluation.
//!
//! Two kinds of rules decide what the scanner skips:
//!
//! - **Ignored directory names**: bare names (`node_modules`, `.git`) matched
//!   exactly and case-sensitively against a directory's own name, at any depth.
//! - **Exclusion patterns**: lines of the project's exclusion file
//!   (`.gitignore` by default) used as *path prefixes*.
//!
//! Exclusion handling is a prefix approximation of ignore-file syntax:
//!
//! - `/build` is anchored: the leading slash is stripped and the root-relative
//!   path must start with `build`.
//! - `temp` is unanchored but still a plain string prefix: it excludes
//!   `temp/x.png` and `temporary.png`, never `a/temp/x.png`.
//! - Globs (`*.log`), directory-only suffixes and negations (`!keep.png`) are
//!   not interpreted. Comment and negation lines are dropped when loading.

use std::collections::HashSet;
use std::fs;
use std::path::{Component, Path, PathBuf};

use tracing::{debug, warn};

/// Normalize a path string to forward-slash form.
#[inline]
pub fn normalize_path_string(path: &str) -> String {
    path.replace('\\', "/")
}

/// Render a relative path with `/` separators regardless of platform.
pub fn relative_slash_path(path: &Path) -> String {
    let parts: Vec<String> = path
        .components()
        .filter_map(|c| match c {
            Component::Normal(s) => Some(s.to_string_lossy().into_owned()),
            _ => None,
        })
        .collect();
    parts.join("/")
}

/// Lexically normalize an absolute path: collapse `.` and `..` without
/// touching the filesystem.
pub fn lexical_normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

/// Parse exclusion-file content into prefix patterns.
///
/// Blank lines, `#` comments and `!` negations are dropped; backslashes become
/// forward slashes. A bare `/` would exclude everything and is dropped too.
pub fn parse_exclusion_patterns(content: &str) -> Vec<String> {
    content
        .lines()
        .map(str::trim)
        .filter(|s| !s.is_empty() && !s.starts_with('#') && !s.starts_with('!'))
        .map(normalize_path_string)
        .filter(|s| !s.trim_start_matches('/').is_empty())
        .collect()
}

/// Read exclusion patterns from `path`.
///
/// A missing or unreadable file yields an empty list.
pub fn load_exclusion_patterns(path: &Path) -> Vec<String> {
    if !path.exists() {
        debug!(path = %path.display(), "no exclusion file");
        return Vec::new();
    }
    match fs::read_to_string(path) {
        Ok(content) => parse_exclusion_patterns(&content),
        Err(e) => {
            warn!(path = %path.display(), error = %e, "exclusion file unreadable, ignoring it");
            Vec::new()
        }
    }
}

/// Immutable ignore-rule set for one scan.
#[derive(Debug, Clone, Default)]
pub struct PathMatcher {
    ignored_names: HashSet<String>,
    patterns: Vec<String>,
}

impl PathMatcher {
    /// Build a matcher from directory names and already-parsed patterns.
    pub fn new(
        ignored_names: impl IntoIterator<Item = impl Into<String>>,
        patterns: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        Self {
            ignored_names: ignored_names.into_iter().map(Into::into).collect(),
            patterns: patterns
                .into_iter()
                .map(|p| {
                    let p: String = p.into();
                    normalize_path_string(&p)
                })
                .collect(),
        }
    }

    /// Build a matcher, reading patterns from the exclusion file under `root`.
    pub fn for_project(
        root: &Path,
        ignored_names: impl IntoIterator<Item = impl Into<String>>,
        exclusion_file: &str,
    ) -> Self {
        let patterns = load_exclusion_patterns(&root.join(exclusion_file));
        Self::new(ignored_names, patterns)
    }

    /// True iff `name` is exactly one of the ignored directory names.
    #[inline]
    pub fn is_ignored_directory(&self, name: &str) -> bool {
        self.ignored_names.contains(name)
    }

    /// True iff the root-relative path starts with at least one pattern.
    pub fn matches_exclusion_pattern(&self, relative_path: &str) -> bool {
        let rel = normalize_path_string(relative_path);
        self.patterns.iter().any(|pattern| {
            let prefix = pattern.strip_prefix('/').unwrap_or(pattern);
            !prefix.is_empty() && rel.starts_with(prefix)
        })
    }

    /// Exclusion patterns in load order.
    pub fn patterns(&self) -> &[String] {
        &self.patterns
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn matcher(patterns: &[&str]) -> PathMatcher {
        PathMatcher::new(["node_modules", ".git"], patterns.iter().copied())
    }

    #[test]
    fn test_ignored_directory_exact_and_case_sensitive() {
        let m = matcher(&[]);
        assert!(m.is_ignored_directory("node_modules"));
        assert!(!m.is_ignored_directory("Node_Modules"));
        assert!(!m.is_ignored_directory("node_modules_old"));
    }

    #[test]
    fn test_anchored_pattern() {
        let m = matcher(&["/build"]);
        assert!(m.matches_exclusion_pattern("build/icon.svg"));
        assert!(m.matches_exclusion_pattern("build"));
        assert!(!m.matches_exclusion_pattern("src/build/icon.svg"));
    }

    #[test]
    fn test_unanchored_pattern_is_string_prefix() {
        let m = matcher(&["temp"]);
        assert!(m.matches_exclusion_pattern("temp/x.png"));
        assert!(m.matches_exclusion_pattern("temporary.png"));
        assert!(!m.matches_exclusion_pattern("a/temp/x.png"));
    }

    #[test]
    fn test_backslash_paths_are_normalized() {
        let m = matcher(&["assets/raw"]);
        assert!(m.matches_exclusion_pattern("assets\\raw\\big.png"));
    }

    #[test]
    fn test_trailing_slash_pattern_only_hits_contents() {
        let m = matcher(&["dist/"]);
        assert!(!m.matches_exclusion_pattern("dist"));
        assert!(m.matches_exclusion_pattern("dist/a.png"));
    }

    #[test]
    fn test_glob_is_not_interpreted() {
        let m = matcher(&["*.png"]);
        assert!(!m.matches_exclusion_pattern("logo.png"));
    }

    #[test]
    fn test_parse_drops_comments_negations_and_root() {
        let content = "# build output\n\n/build\n!keep.png\n  coverage  \n/\nassets\\tmp\r\n";
        let patterns = parse_exclusion_patterns(content);
        assert_eq!(patterns, vec!["/build", "coverage", "assets/tmp"]);
    }

    #[test]
    fn test_load_missing_exclusion_file() {
        let patterns = load_exclusion_patterns(Path::new("/definitely/not/here/.gitignore"));
        assert!(patterns.is_empty());
    }

    #[test]
    fn test_relative_slash_path() {
        let p = Path::new("a").join("b").join("c.png");
        assert_eq!(relative_slash_path(&p), "a/b/c.png");
    }

    #[test]
    fn test_lexical_normalize() {
        let p = Path::new("/project/src/../assets/./logo.png");
        assert_eq!(lexical_normalize(p), PathBuf::from("/project/assets/logo.png"));
    }
}

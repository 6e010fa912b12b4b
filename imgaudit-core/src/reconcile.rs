//! Usage reconciliation: partition an inventory into used and unused images.
//!
//! Membership is exact set containment on canonical absolute paths. Both
//! sides must already be canonical: the scanner produces canonical paths and
//! [`ReferencedPaths`] canonicalizes whatever the build reports.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use crate::matcher::lexical_normalize;
use crate::scan::AssetRecord;

/// Canonicalize a referenced path.
///
/// Relative paths are resolved against `root`. Existing paths go through
/// `fs::canonicalize`; missing ones are normalized lexically.
pub fn canonicalize_reference(path: &Path, root: &Path) -> PathBuf {
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        root.join(path)
    };
    fs::canonicalize(&absolute).unwrap_or_else(|_| lexical_normalize(&absolute))
}

/// Canonical absolute paths the build considers used for this cycle.
#[derive(Debug, Clone, Default)]
pub struct ReferencedPaths {
    paths: HashSet<PathBuf>,
}

impl ReferencedPaths {
    pub fn new() -> Self {
        Self::default()
    }

    /// Canonicalize and collect paths, resolving relative ones against `root`.
    pub fn from_paths<P: AsRef<Path>>(paths: impl IntoIterator<Item = P>, root: &Path) -> Self {
        let mut set = Self::new();
        for p in paths {
            set.insert(p.as_ref(), root);
        }
        set
    }

    /// Insert one path after canonicalizing it.
    pub fn insert(&mut self, path: &Path, root: &Path) {
        self.paths.insert(canonicalize_reference(path, root));
    }

    /// Merge another set into this one.
    pub fn extend(&mut self, other: ReferencedPaths) {
        self.paths.extend(other.paths);
    }

    #[inline]
    pub fn contains(&self, path: &Path) -> bool {
        self.paths.contains(path)
    }

    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }
}

/// Disjoint, total partition of an inventory.
#[derive(Debug, Clone, Default)]
pub struct Reconciliation {
    pub used: Vec<AssetRecord>,
    pub unused: Vec<AssetRecord>,
}

/// Classify each record exactly once. Input order is preserved in both halves.
pub fn reconcile(inventory: &[AssetRecord], referenced: &ReferencedPaths) -> Reconciliation {
    let (used, unused): (Vec<AssetRecord>, Vec<AssetRecord>) = inventory
        .iter()
        .cloned()
        .partition(|record| referenced.contains(&record.absolute_path));
    Reconciliation { used, unused }
}

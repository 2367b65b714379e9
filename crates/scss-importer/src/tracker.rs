//! Dependency tracking for cache invalidation.
//!
//! Copyright (c) 2025 Posit, PBC

use std::collections::HashSet;
use std::path::{Path, PathBuf};

/// Ordered set of files read from disk during one compilation.
///
/// Paths keep the order of their first read; later reads of the same path
/// are ignored. Inline importer content never reaches the tracker.
#[derive(Debug, Clone, Default)]
pub struct DependencyTracker {
    order: Vec<PathBuf>,
    seen: HashSet<PathBuf>,
}

impl DependencyTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a file read. Returns `false` if it was already recorded.
    pub fn record(&mut self, path: &Path) -> bool {
        if self.seen.contains(path) {
            return false;
        }
        self.seen.insert(path.to_path_buf());
        self.order.push(path.to_path_buf());
        true
    }

    /// The recorded paths in first-read order.
    pub fn snapshot(&self) -> Vec<PathBuf> {
        self.order.clone()
    }

    pub fn reset(&mut self) {
        self.order.clear();
        self.seen.clear();
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

//! Default filesystem resolution for `@import`.
//!
//! Copyright (c) 2025 Posit, PBC
//!
//! Given the path written in an `@import` and the file that contains it, the
//! resolver searches, in order:
//!
//! 1. the directory of the importing file;
//! 2. each configured load path, in configured order.
//!
//! Within each directory the filename variants below are tried in a fixed
//! order, and the first existing file wins. For `@import "theme"`:
//!
//! ```text
//! theme.scss  _theme.scss  theme.css  _theme.css  theme/index.scss  theme/_index.scss
//! ```
//!
//! A request that already ends in a recognized extension only tries the
//! verbatim name and its partial form. An absolute request ignores the
//! search directories entirely.

use std::path::{Path, PathBuf};

use scss_runtime::SystemRuntime;

use crate::error::CompileError;

/// Prefix marking a partial (import-only) stylesheet.
pub const PARTIAL_PREFIX: &str = "_";

/// Extensions tried, in order, for an extensionless import.
///
/// The indented `.sass` syntax is not listed because the compiler core only
/// accepts SCSS.
pub const STYLESHEET_EXTENSIONS: &[&str] = &["scss", "css"];

/// Stem of the file loaded when an import names a directory.
pub const INDEX_FILE_STEM: &str = "index";

/// Locates stylesheets on the runtime's filesystem.
pub struct FilesystemResolver<'a> {
    runtime: &'a dyn SystemRuntime,
    load_paths: &'a [PathBuf],
}

impl<'a> FilesystemResolver<'a> {
    pub fn new(runtime: &'a dyn SystemRuntime, load_paths: &'a [PathBuf]) -> Self {
        Self {
            runtime,
            load_paths,
        }
    }

    /// Directories searched for `requested`, highest precedence first.
    pub fn candidate_dirs(&self, requested: &str, parent_path: &str) -> Vec<PathBuf> {
        if Path::new(requested).is_absolute() {
            return vec![PathBuf::new()];
        }

        let parent_dir = Path::new(parent_path)
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default();

        let mut dirs = vec![parent_dir];
        for load_path in self.load_paths {
            if !dirs.contains(load_path) {
                dirs.push(load_path.clone());
            }
        }
        dirs
    }

    /// Find the file `requested` refers to, or `None`.
    pub fn find(&self, requested: &str, parent_path: &str) -> Option<PathBuf> {
        let variants = filename_variants(requested);
        for dir in self.candidate_dirs(requested, parent_path) {
            for variant in &variants {
                let candidate = dir.join(variant);
                match self.runtime.is_file(&candidate) {
                    Ok(true) => {
                        tracing::trace!(candidate = %candidate.display(), "import candidate found");
                        return Some(candidate);
                    }
                    Ok(false) => {}
                    Err(e) => {
                        // Unreadable counts as absent
                        tracing::trace!(candidate = %candidate.display(), error = %e, "import candidate check failed");
                    }
                }
            }
        }
        None
    }

    /// Like [`find`](Self::find), but a miss is an `ImportNotFound` error.
    pub fn resolve(&self, requested: &str, parent_path: &str) -> Result<PathBuf, CompileError> {
        self.find(requested, parent_path)
            .ok_or_else(|| CompileError::ImportNotFound {
                path: requested.to_string(),
                parent: parent_path.to_string(),
                location: None,
            })
    }
}

/// Whether `path` already ends in one of [`STYLESHEET_EXTENSIONS`].
pub fn has_stylesheet_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| STYLESHEET_EXTENSIONS.contains(&ext))
}

/// Filename variants for `requested`, relative to a search directory, in
/// precedence order.
pub fn filename_variants(requested: &str) -> Vec<PathBuf> {
    let path = Path::new(requested);
    let Some(file_name) = path.file_name().and_then(|name| name.to_str()) else {
        return vec![path.to_path_buf()];
    };
    let dir = path.parent().unwrap_or_else(|| Path::new(""));
    let partial = |name: &str| -> PathBuf {
        if name.starts_with(PARTIAL_PREFIX) {
            dir.join(name)
        } else {
            dir.join(format!("{PARTIAL_PREFIX}{name}"))
        }
    };

    let mut variants = Vec::new();
    let mut push = |candidate: PathBuf| {
        if !variants.contains(&candidate) {
            variants.push(candidate);
        }
    };

    if has_stylesheet_extension(path) {
        push(path.to_path_buf());
        push(partial(file_name));
        return variants;
    }

    for ext in STYLESHEET_EXTENSIONS {
        let with_ext = format!("{file_name}.{ext}");
        push(dir.join(&with_ext));
        push(partial(&with_ext));
    }
    push(path.join(format!("{INDEX_FILE_STEM}.scss")));
    push(path.join(format!("{PARTIAL_PREFIX}{INDEX_FILE_STEM}.scss")));
    variants
}

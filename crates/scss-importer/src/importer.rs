//! The import resolution protocol.
//!
//! Copyright (c) 2025 Posit, PBC
//!
//! Hosts plug their own stylesheet sources into a compilation by
//! implementing [`Importer`]. The orchestrator consults the importer for
//! every `@import` occurrence before falling back to the filesystem:
//!
//! ```rust
//! use scss_importer::{Import, ImportContext, ImportResult, Importer, ImporterError};
//!
//! struct Fonts;
//!
//! impl Importer for Fonts {
//!     fn imports(&self, ctx: &ImportContext<'_>) -> Result<ImportResult, ImporterError> {
//!         if ctx.path() == "fonts" {
//!             Ok(Import::with_source("fonts.scss", "$font: arial;").into())
//!         } else {
//!             Ok(ImportResult::NotHandled)
//!         }
//!     }
//! }
//! ```

use serde_json::Value;

use crate::options::Options;
use crate::record::Import;

/// Error type importers report failures with.
pub type ImporterError = Box<dyn std::error::Error + Send + Sync>;

/// Outcome of asking an importer about one `@import`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImportResult {
    /// Defer to the default filesystem resolver.
    NotHandled,
    /// The import resolves to nothing: no output and no error.
    Empty,
    /// Exactly one record.
    Single(Import),
    /// Several records, expanded in order as if imported one after another.
    Multiple(Vec<Import>),
}

impl ImportResult {
    /// The records to expand, or `None` when the importer declined.
    pub fn into_records(self) -> Option<Vec<Import>> {
        match self {
            ImportResult::NotHandled => None,
            ImportResult::Empty => Some(Vec::new()),
            ImportResult::Single(import) => Some(vec![import]),
            ImportResult::Multiple(imports) => Some(imports),
        }
    }
}

impl From<Import> for ImportResult {
    fn from(import: Import) -> Self {
        ImportResult::Single(import)
    }
}

impl From<Vec<Import>> for ImportResult {
    fn from(imports: Vec<Import>) -> Self {
        if imports.is_empty() {
            ImportResult::Empty
        } else {
            ImportResult::Multiple(imports)
        }
    }
}

/// Everything an importer learns about one `@import` occurrence.
///
/// A fresh context is built for each occurrence and dropped as soon as the
/// importer returns. Building one does no I/O.
#[derive(Debug, Clone, Copy)]
pub struct ImportContext<'a> {
    path: &'a str,
    parent_path: &'a str,
    options: &'a Options,
}

impl<'a> ImportContext<'a> {
    pub fn new(path: &'a str, parent_path: &'a str, options: &'a Options) -> Self {
        Self {
            path,
            parent_path,
            options,
        }
    }

    /// The path exactly as written in the `@import`.
    pub fn path(&self) -> &'a str {
        self.path
    }

    /// The file containing the `@import`.
    ///
    /// For top-level imports this is the session's `filename` option. For
    /// imports nested in an inline record it is that record's path, and for
    /// imports nested in a file read from disk it is the file's resolved path.
    pub fn parent_path(&self) -> &'a str {
        self.parent_path
    }

    /// The session's full options mapping, including keys the compiler
    /// itself does not recognize.
    pub fn options(&self) -> &'a Options {
        self.options
    }

    /// Shorthand for `options().get(key)`.
    pub fn option(&self, key: &str) -> Option<&'a Value> {
        self.options.get(key)
    }
}

/// A pluggable stylesheet source.
///
/// Implementations may do any I/O they like; the orchestrator applies no
/// timeout and calls `imports` synchronously on the compiling thread.
/// Returning `Err` aborts the compilation.
pub trait Importer: Send + Sync {
    fn imports(&self, ctx: &ImportContext<'_>) -> Result<ImportResult, ImporterError>;
}

impl<F> Importer for F
where
    F: Fn(&ImportContext<'_>) -> Result<ImportResult, ImporterError> + Send + Sync,
{
    fn imports(&self, ctx: &ImportContext<'_>) -> Result<ImportResult, ImporterError> {
        self(ctx)
    }
}

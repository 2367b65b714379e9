//! Error types for SCSS compilation.
//!
//! Copyright (c) 2025 Posit, PBC

use std::fmt;
use std::path::PathBuf;

use scss_runtime::RuntimeError;
use thiserror::Error;

use crate::importer::ImporterError;

/// A position in an original stylesheet. Line and column are 1-based.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceLocation {
    pub file: String,
    pub line: usize,
    pub column: usize,
}

impl SourceLocation {
    pub fn new(file: impl Into<String>, line: usize, column: usize) -> Self {
        Self {
            file: file.into(),
            line,
            column,
        }
    }
}

impl fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.file, self.line, self.column)
    }
}

/// Errors that abort a compilation.
///
/// Every error is terminal: a failed compilation produces no CSS.
#[derive(Debug, Error)]
pub enum CompileError {
    /// A custom importer returned an error
    #[error("importer failed for \"{path}\" (imported from {parent}): {source}")]
    Importer {
        path: String,
        parent: String,
        location: Option<SourceLocation>,
        source: ImporterError,
    },

    /// Neither the importer nor the filesystem produced the stylesheet
    #[error("File to import not found or unreadable: {path} (imported from {parent})")]
    ImportNotFound {
        path: String,
        parent: String,
        location: Option<SourceLocation>,
    },

    /// A stylesheet ended up importing itself
    #[error("An @import loop has been found: {path} (imported from {parent})")]
    ImportLoop {
        path: String,
        parent: String,
        location: Option<SourceLocation>,
    },

    /// An imported stylesheet uses the module system
    #[error(
        "`{rule}` is not supported in imported stylesheet {file}; load it from the root stylesheet instead"
    )]
    ModuleRuleInImport {
        rule: String,
        file: String,
        location: Option<SourceLocation>,
    },

    /// A stylesheet was found but could not be read
    #[error("Failed to read stylesheet {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        source: RuntimeError,
    },

    /// The compiler core rejected the expanded stylesheet
    #[error("{message}")]
    Syntax {
        message: String,
        location: Option<SourceLocation>,
    },

    /// A session option had an unusable value
    #[error("invalid option `{key}`: {reason}")]
    InvalidOption { key: String, reason: String },

    /// Dependencies were requested before any compilation ran
    #[error("dependencies are only available after the stylesheet has been rendered")]
    NotRendered,
}

impl CompileError {
    /// Where in the original stylesheets the error was detected, if known.
    pub fn location(&self) -> Option<&SourceLocation> {
        match self {
            CompileError::Importer { location, .. }
            | CompileError::ImportNotFound { location, .. }
            | CompileError::ImportLoop { location, .. }
            | CompileError::ModuleRuleInImport { location, .. }
            | CompileError::Syntax { location, .. } => location.as_ref(),
            _ => None,
        }
    }

    /// Attach the position of the offending `@import` if none is set yet.
    pub(crate) fn at(mut self, at: &SourceLocation) -> Self {
        if let CompileError::Importer { location, .. }
        | CompileError::ImportNotFound { location, .. }
        | CompileError::ImportLoop { location, .. } = &mut self
        {
            location.get_or_insert_with(|| at.clone());
        }
        self
    }
}

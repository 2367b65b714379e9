//! Import records produced by resolution.
//!
//! Copyright (c) 2025 Posit, PBC

use std::fmt;

/// One resolved import candidate.
///
/// A record either carries its stylesheet text inline (`source`), in which
/// case nothing is read from disk, or names a file that the default
/// filesystem resolver will locate and read. The path of an inline record
/// may be entirely synthetic; it is still used as the parent path for any
/// `@import` inside the inline text and as the file name in error reports.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Import {
    path: String,
    source: Option<String>,
}

impl Import {
    /// A record that must be resolved to a real file.
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            source: None,
        }
    }

    /// A record whose content is supplied directly.
    pub fn with_source(path: impl Into<String>, source: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            source: Some(source.into()),
        }
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn source(&self) -> Option<&str> {
        self.source.as_deref()
    }

    /// True when no filesystem read is needed for this record.
    pub fn is_inline(&self) -> bool {
        self.source.is_some()
    }

    pub fn into_parts(self) -> (String, Option<String>) {
        (self.path, self.source)
    }
}

impl fmt::Display for Import {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_inline() {
            write!(f, "{} (inline)", self.path)
        } else {
            f.write_str(&self.path)
        }
    }
}

/*
 * traits.rs
 * Copyright (c) 2025 Posit, PBC
 *
 * Defines the SystemRuntime trait and supporting types for the runtime abstraction layer.
 *
 * The import resolver never touches std::fs directly. Everything goes through
 * this trait so the same resolution logic can run against:
 * - NativeRuntime: the real filesystem
 * - MemoryRuntime: an in-memory virtual filesystem (hosts, tests)
 */

use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Result type for runtime operations
pub type RuntimeResult<T> = Result<T, RuntimeError>;

/// A runtime shared between sessions.
pub type SharedRuntime = Arc<dyn SystemRuntime>;

/// Errors that can occur during runtime operations
#[derive(Debug)]
pub enum RuntimeError {
    /// Standard I/O error
    Io(io::Error),

    /// SASS compilation failed
    SassError(String),
}

impl std::fmt::Display for RuntimeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RuntimeError::Io(e) => write!(f, "I/O error: {}", e),
            RuntimeError::SassError(msg) => write!(f, "SASS compilation error: {}", msg),
        }
    }
}

impl std::error::Error for RuntimeError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            RuntimeError::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for RuntimeError {
    fn from(e: io::Error) -> Self {
        RuntimeError::Io(e)
    }
}

impl RuntimeError {
    /// Whether this error means the path simply isn't there.
    pub fn is_not_found(&self) -> bool {
        matches!(self, RuntimeError::Io(e) if e.kind() == io::ErrorKind::NotFound)
    }
}

/// Type of filesystem path
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathKind {
    /// Regular file
    File,
    /// Directory
    Directory,
}

/// Read-only filesystem operations needed to resolve and load stylesheets.
///
/// Implementations must never create or modify files: the resolver only
/// checks existence and reads content. Each read acquires and releases
/// its own handle, so a failed read leaves nothing open.
pub trait SystemRuntime: Send + Sync {
    // ═══════════════════════════════════════════════════════════════════════
    // FILE OPERATIONS
    // ═══════════════════════════════════════════════════════════════════════

    /// Read entire file contents as bytes.
    fn file_read(&self, path: &Path) -> RuntimeResult<Vec<u8>>;

    /// Read file as string with UTF-8 encoding.
    ///
    /// Default implementation reads bytes and converts to string.
    fn file_read_string(&self, path: &Path) -> RuntimeResult<String> {
        let bytes = self.file_read(path)?;
        String::from_utf8(bytes).map_err(|e| {
            RuntimeError::Io(io::Error::new(
                io::ErrorKind::InvalidData,
                format!("Invalid UTF-8 in file: {}", e),
            ))
        })
    }

    /// Check if path exists, optionally filtering by type.
    fn path_exists(&self, path: &Path, kind: Option<PathKind>) -> RuntimeResult<bool>;

    /// Check if path exists and is a file.
    ///
    /// Convenience method that calls `path_exists` with `PathKind::File`.
    fn is_file(&self, path: &Path) -> RuntimeResult<bool> {
        self.path_exists(path, Some(PathKind::File))
    }

    /// Check if path exists and is a directory.
    ///
    /// Convenience method that calls `path_exists` with `PathKind::Directory`.
    fn is_dir(&self, path: &Path) -> RuntimeResult<bool> {
        self.path_exists(path, Some(PathKind::Directory))
    }

    /// Canonicalize a path (resolve symlinks, make absolute).
    ///
    /// On the native runtime this resolves symlinks and fails for missing
    /// paths. The in-memory runtime only normalizes `.` and `..` components.
    fn canonicalize(&self, path: &Path) -> RuntimeResult<PathBuf>;

    /// Get current working directory.
    ///
    /// Relative paths handed to this runtime are interpreted against it.
    fn cwd(&self) -> RuntimeResult<PathBuf>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_runtime_error_display() {
        let err = RuntimeError::SassError("Undefined variable.".to_string());
        assert!(err.to_string().contains("SASS compilation error"));
    }

    #[test]
    fn test_runtime_error_not_found() {
        let err = RuntimeError::from(io::Error::new(io::ErrorKind::NotFound, "gone"));
        assert!(err.is_not_found());

        let err = RuntimeError::from(io::Error::new(io::ErrorKind::PermissionDenied, "nope"));
        assert!(!err.is_not_found());
        assert!(std::error::Error::source(&err).is_some());
    }
}

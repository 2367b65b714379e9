/*
 * native.rs
 * Copyright (c) 2025 Posit, PBC
 *
 * NativeRuntime implementation backed by std::fs.
 */

use std::path::{Path, PathBuf};

use crate::traits::{PathKind, RuntimeResult, SystemRuntime};

/// Runtime with direct access to the host filesystem.
#[derive(Debug, Clone, Copy, Default)]
pub struct NativeRuntime;

impl NativeRuntime {
    /// Create a new NativeRuntime.
    pub fn new() -> Self {
        Self
    }
}

impl SystemRuntime for NativeRuntime {
    fn file_read(&self, path: &Path) -> RuntimeResult<Vec<u8>> {
        // std::fs::read opens and closes the handle within the call
        Ok(std::fs::read(path)?)
    }

    fn path_exists(&self, path: &Path, kind: Option<PathKind>) -> RuntimeResult<bool> {
        let metadata = match std::fs::metadata(path) {
            Ok(metadata) => metadata,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(false),
            Err(e) => return Err(e.into()),
        };
        Ok(match kind {
            None => true,
            Some(PathKind::File) => metadata.is_file(),
            Some(PathKind::Directory) => metadata.is_dir(),
        })
    }

    fn canonicalize(&self, path: &Path) -> RuntimeResult<PathBuf> {
        Ok(std::fs::canonicalize(path)?)
    }

    fn cwd(&self) -> RuntimeResult<PathBuf> {
        Ok(std::env::current_dir()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_native_file_operations() {
        let dir = tempfile::tempdir().unwrap();
        let file_path = dir.path().join("_colors.scss");
        std::fs::write(&file_path, "$red: #f00;").unwrap();

        let rt = NativeRuntime::new();
        assert!(rt.is_file(&file_path).unwrap());
        assert!(!rt.is_dir(&file_path).unwrap());
        assert!(rt.is_dir(dir.path()).unwrap());
        assert_eq!(rt.file_read_string(&file_path).unwrap(), "$red: #f00;");
    }

    #[test]
    fn test_native_missing_path_is_not_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let rt = NativeRuntime::new();
        let missing = dir.path().join("missing.scss");

        assert!(!rt.path_exists(&missing, None).unwrap());
        assert!(rt.file_read(&missing).unwrap_err().is_not_found());
    }

    #[test]
    fn test_native_canonicalize_resolves_parent_components() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("sub")).unwrap();
        std::fs::write(dir.path().join("a.scss"), "").unwrap();

        let rt = NativeRuntime::new();
        let through_sub = rt
            .canonicalize(&dir.path().join("sub").join("..").join("a.scss"))
            .unwrap();
        let direct = rt.canonicalize(&dir.path().join("a.scss")).unwrap();
        assert_eq!(through_sub, direct);
        assert!(direct.is_absolute());
    }
}

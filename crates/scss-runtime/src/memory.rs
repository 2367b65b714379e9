/*
 * memory.rs
 * Copyright (c) 2025 Posit, PBC
 *
 * MemoryRuntime implementation backed by an in-memory virtual filesystem.
 *
 * Hosts that keep stylesheets outside the real filesystem (editors, build
 * servers, tests) populate a VirtualFileSystem and hand the runtime to the
 * compiler. Relative paths are interpreted against the project root.
 */

use std::collections::{HashMap, HashSet};
use std::io;
use std::path::{Component, Path, PathBuf};
use std::sync::{PoisonError, RwLock};

use crate::traits::{PathKind, RuntimeError, RuntimeResult, SystemRuntime};

/// Helper function to create a "not found" error.
fn not_found_error(path: &Path) -> RuntimeError {
    RuntimeError::Io(io::Error::new(
        io::ErrorKind::NotFound,
        format!("Path not found: {}", path.display()),
    ))
}

/// In-memory filesystem.
///
/// The VFS supports:
/// - Files with arbitrary byte content
/// - Directory structure (automatically created when files are added)
#[derive(Debug)]
pub struct VirtualFileSystem {
    /// File contents, keyed by normalized absolute path
    files: HashMap<PathBuf, Vec<u8>>,
    /// Directory entries (automatically includes parents of all files)
    directories: HashSet<PathBuf>,
    /// Project root directory (default working directory)
    project_root: PathBuf,
}

impl Default for VirtualFileSystem {
    fn default() -> Self {
        Self::new()
    }
}

impl VirtualFileSystem {
    /// Create a new empty virtual filesystem rooted at `/project`.
    pub fn new() -> Self {
        Self::with_project_root(PathBuf::from("/project"))
    }

    /// Create VFS with a custom project root.
    pub fn with_project_root(project_root: PathBuf) -> Self {
        let mut vfs = Self {
            files: HashMap::new(),
            directories: HashSet::new(),
            project_root: PathBuf::from("/"),
        };
        let root = vfs.normalize_path(&project_root);
        vfs.directories.insert(PathBuf::from("/"));
        vfs.add_directory_and_parents(&root);
        vfs.project_root = root;
        vfs
    }

    /// Add a file to the virtual filesystem.
    ///
    /// This will automatically create all parent directories.
    pub fn add_file(&mut self, path: &Path, contents: impl Into<Vec<u8>>) {
        let normalized = self.normalize_path(path);
        if let Some(parent) = normalized.parent() {
            self.add_directory_and_parents(parent);
        }
        self.files.insert(normalized, contents.into());
    }

    /// Remove a file from the virtual filesystem.
    ///
    /// Returns true if the file existed and was removed.
    pub fn remove_file(&mut self, path: &Path) -> bool {
        let normalized = self.normalize_path(path);
        self.files.remove(&normalized).is_some()
    }

    /// List all files in the virtual filesystem.
    pub fn list_files(&self) -> Vec<PathBuf> {
        self.files.keys().cloned().collect()
    }

    /// Check if a path exists (as file or directory).
    pub fn exists(&self, path: &Path) -> bool {
        let normalized = self.normalize_path(path);
        self.files.contains_key(&normalized) || self.directories.contains(&normalized)
    }

    /// Check if a path is a file.
    pub fn is_file(&self, path: &Path) -> bool {
        self.files.contains_key(&self.normalize_path(path))
    }

    /// Check if a path is a directory.
    pub fn is_directory(&self, path: &Path) -> bool {
        self.directories.contains(&self.normalize_path(path))
    }

    /// Read file contents.
    pub fn read_file(&self, path: &Path) -> RuntimeResult<Vec<u8>> {
        let normalized = self.normalize_path(path);
        self.files
            .get(&normalized)
            .cloned()
            .ok_or_else(|| not_found_error(&normalized))
    }

    /// Get the project root directory.
    pub fn project_root(&self) -> &Path {
        &self.project_root
    }

    /// Normalize a path to an absolute path.
    pub fn normalize_path(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            return normalize_components(path);
        }
        normalize_components(&self.project_root.join(path))
    }

    /// Add a directory and all its parent directories.
    fn add_directory_and_parents(&mut self, path: &Path) {
        let mut current = PathBuf::new();
        for component in path.components() {
            current.push(component);
            self.directories.insert(current.clone());
        }
    }
}

/// Normalize path components (remove . and resolve ..)
fn normalize_components(path: &Path) -> PathBuf {
    let mut normalized = PathBuf::new();
    for component in path.components() {
        match component {
            Component::ParentDir => {
                if !normalized.pop() {
                    // Can't go above root
                    normalized.push("/");
                }
            }
            Component::CurDir => {}
            other => normalized.push(other),
        }
    }
    if normalized.as_os_str().is_empty() {
        normalized.push("/");
    }
    normalized
}

/// Runtime serving files from a [`VirtualFileSystem`].
///
/// Uses RwLock to satisfy Send + Sync trait bounds. A single compilation
/// only ever reads, so the lock is never contended within a session.
#[derive(Debug, Default)]
pub struct MemoryRuntime {
    vfs: RwLock<VirtualFileSystem>,
}

impl MemoryRuntime {
    /// Create a MemoryRuntime with an empty virtual filesystem.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a MemoryRuntime with a pre-populated virtual filesystem.
    pub fn with_vfs(vfs: VirtualFileSystem) -> Self {
        Self {
            vfs: RwLock::new(vfs),
        }
    }

    /// Add a file to the virtual filesystem.
    pub fn add_file(&self, path: impl AsRef<Path>, contents: impl Into<Vec<u8>>) {
        self.vfs
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .add_file(path.as_ref(), contents);
    }

    /// Remove a file from the virtual filesystem.
    pub fn remove_file(&self, path: impl AsRef<Path>) -> bool {
        self.vfs
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove_file(path.as_ref())
    }

    /// List all files in the virtual filesystem.
    pub fn list_files(&self) -> Vec<PathBuf> {
        self.vfs
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .list_files()
    }
}

impl SystemRuntime for MemoryRuntime {
    fn file_read(&self, path: &Path) -> RuntimeResult<Vec<u8>> {
        self.vfs
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .read_file(path)
    }

    fn path_exists(&self, path: &Path, kind: Option<PathKind>) -> RuntimeResult<bool> {
        let vfs = self.vfs.read().unwrap_or_else(PoisonError::into_inner);
        Ok(match kind {
            None => vfs.exists(path),
            Some(PathKind::File) => vfs.is_file(path),
            Some(PathKind::Directory) => vfs.is_directory(path),
        })
    }

    fn canonicalize(&self, path: &Path) -> RuntimeResult<PathBuf> {
        // No symlinks in memory, normalizing is enough
        Ok(self
            .vfs
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .normalize_path(path))
    }

    fn cwd(&self) -> RuntimeResult<PathBuf> {
        Ok(self
            .vfs
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .project_root()
            .to_path_buf())
    }
}

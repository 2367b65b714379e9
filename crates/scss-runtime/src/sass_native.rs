//! SASS compilation using the grass crate.
//!
//! Copyright (c) 2025 Posit, PBC
//!
//! This module is the boundary to the compiler core. grass is a pure Rust
//! implementation targeting dart-sass; it receives one fully expanded SCSS
//! buffer and turns it into CSS.
//!
//! Key components:
//! - `RuntimeFs`: Adapter implementing `grass::Fs` for our `SystemRuntime`
//! - `compile_scss`: High-level function for SCSS compilation

use std::fmt::Debug;
use std::io;
use std::path::{Path, PathBuf};

use grass::{Options, OutputStyle};

use crate::traits::{RuntimeError, RuntimeResult, SystemRuntime};

/// Name grass gives the buffer passed to [`compile_scss`] in its error reports.
pub const CORE_INPUT_NAME: &str = "stdin";

/// Adapter that implements `grass::Fs` using a `SystemRuntime`.
///
/// `@import` is expanded before grass ever sees the buffer. `@use` and
/// `@forward` rules, which may only appear in the root stylesheet, are loaded
/// by grass itself from the load paths. Routing those reads through the
/// runtime keeps both on the same filesystem view.
pub struct RuntimeFs<'a> {
    runtime: &'a dyn SystemRuntime,
}

impl<'a> RuntimeFs<'a> {
    /// Create a new RuntimeFs adapter wrapping the given runtime.
    pub fn new(runtime: &'a dyn SystemRuntime) -> Self {
        Self { runtime }
    }
}

impl Debug for RuntimeFs<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RuntimeFs")
            .field("runtime", &"<SystemRuntime>")
            .finish()
    }
}

impl grass::Fs for RuntimeFs<'_> {
    fn is_dir(&self, path: &Path) -> bool {
        self.runtime.is_dir(path).unwrap_or(false)
    }

    fn is_file(&self, path: &Path) -> bool {
        self.runtime.is_file(path).unwrap_or(false)
    }

    fn read(&self, path: &Path) -> io::Result<Vec<u8>> {
        self.runtime.file_read(path).map_err(|e| match e {
            RuntimeError::Io(io) => io,
            other => io::Error::other(other.to_string()),
        })
    }
}

/// Compile SCSS source to CSS using grass.
///
/// # Arguments
///
/// * `runtime` - The runtime to use for file system access
/// * `scss` - The SCSS source code to compile
/// * `load_paths` - Directories to search for @use/@forward resolution
/// * `minified` - Whether to produce compressed output
///
/// # Returns
///
/// Compiled CSS string on success, `RuntimeError::SassError` carrying grass's
/// full report on failure.
pub fn compile_scss(
    runtime: &dyn SystemRuntime,
    scss: &str,
    load_paths: &[PathBuf],
    minified: bool,
) -> RuntimeResult<String> {
    let fs = RuntimeFs::new(runtime);

    let style = if minified {
        OutputStyle::Compressed
    } else {
        OutputStyle::Expanded
    };

    let options = Options::default()
        .fs(&fs)
        .load_paths(load_paths)
        .style(style);

    tracing::trace!(bytes = scss.len(), minified, "invoking grass");
    grass::from_string(scss, &options).map_err(|e| RuntimeError::SassError(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{MemoryRuntime, NativeRuntime};

    #[test]
    fn test_compile_simple_scss() {
        let runtime = NativeRuntime::new();
        let scss = "$primary: #007bff; .btn { color: $primary; }";

        let css = compile_scss(&runtime, scss, &[], false).unwrap();

        assert!(css.contains(".btn"));
        assert!(css.contains("#007bff"));
    }

    #[test]
    fn test_compile_scss_minified() {
        let runtime = NativeRuntime::new();
        let scss = "$primary: blue;\n\n.btn {\n  color: $primary;\n}";

        let css = compile_scss(&runtime, scss, &[], true).unwrap();

        assert!(!css.contains("\n\n"));
        assert!(css.contains(".btn"));
        assert!(css.contains("blue"));
    }

    #[test]
    fn test_compile_scss_nested_rules() {
        let runtime = NativeRuntime::new();
        let scss = r#"
            .nav {
                .item {
                    &:hover {
                        background: gray;
                    }
                }
            }
        "#;

        let css = compile_scss(&runtime, scss, &[], false).unwrap();

        assert!(css.contains(".nav .item:hover"));
    }

    #[test]
    fn test_compile_scss_error() {
        let runtime = NativeRuntime::new();
        let scss = ".btn { color: $undefined-variable; }";

        let err = compile_scss(&runtime, scss, &[], false).unwrap_err();

        assert!(matches!(err, RuntimeError::SassError(ref msg) if msg.contains("Undefined variable")));
    }

    #[test]
    fn test_use_reads_through_runtime() {
        let runtime = MemoryRuntime::new();
        runtime.add_file("/lib/_colors.scss", "$accent: #123456;");

        let css = compile_scss(
            &runtime,
            "@use 'colors'; .x { color: colors.$accent; }",
            &[PathBuf::from("/lib")],
            false,
        )
        .unwrap();

        assert!(css.contains("#123456"));
    }

    #[test]
    fn test_runtime_fs_debug() {
        let runtime = NativeRuntime::new();
        let fs = RuntimeFs::new(&runtime);
        assert!(format!("{:?}", fs).contains("RuntimeFs"));
    }
}

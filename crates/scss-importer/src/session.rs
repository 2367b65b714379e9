//! Compilation sessions.
//!
//! Copyright (c) 2025 Posit, PBC

use std::path::PathBuf;
use std::sync::Arc;

use scss_runtime::{SharedRuntime, default_runtime};

use crate::compile::compile_expanded;
use crate::error::CompileError;
use crate::options::SessionOptions;
use crate::orchestrator::Orchestrator;
use crate::tracker::DependencyTracker;

/// One stylesheet bound to its options.
///
/// Each call to [`render`](Self::render) is a complete, independent
/// compilation: the dependency list is rebuilt from scratch and nothing is
/// cached between calls or shared with other engines.
///
/// ```rust,no_run
/// use scss_importer::{Engine, SessionOptions};
///
/// let options = SessionOptions::new().with_load_path("vendor");
/// let mut engine = Engine::new("@import 'theme';", options);
/// let css = engine.render()?;
/// for file in engine.dependencies()? {
///     println!("{}", file.display());
/// }
/// # Ok::<(), scss_importer::CompileError>(())
/// ```
pub struct Engine {
    source: String,
    options: SessionOptions,
    runtime: SharedRuntime,
    dependencies: Option<Vec<PathBuf>>,
}

impl Engine {
    /// Create an engine reading imports from the host filesystem.
    pub fn new(source: impl Into<String>, options: SessionOptions) -> Self {
        Self::with_runtime(source, options, Arc::new(default_runtime()))
    }

    /// Create an engine reading imports through `runtime`.
    pub fn with_runtime(
        source: impl Into<String>,
        options: SessionOptions,
        runtime: SharedRuntime,
    ) -> Self {
        Self {
            source: source.into(),
            options,
            runtime,
            dependencies: None,
        }
    }

    /// Compile the stylesheet to CSS.
    ///
    /// The dependency list is updated even when compilation fails, so a
    /// caller can still watch the files that were read before the error.
    pub fn render(&mut self) -> Result<String, CompileError> {
        let mut tracker = DependencyTracker::new();
        let result = self.compile(&mut tracker);
        self.dependencies = Some(tracker.snapshot());

        match &result {
            Ok(css) => tracing::debug!(
                filename = self.options.root_filename(),
                dependencies = tracker.len(),
                bytes = css.len(),
                "rendered stylesheet"
            ),
            Err(e) => tracing::debug!(
                filename = self.options.root_filename(),
                error = %e,
                "render failed"
            ),
        }
        result
    }

    /// Files read by the last [`render`](Self::render), in first-read order.
    ///
    /// # Errors
    ///
    /// Returns `CompileError::NotRendered` if `render` has not been called.
    pub fn dependencies(&self) -> Result<&[PathBuf], CompileError> {
        self.dependencies
            .as_deref()
            .ok_or(CompileError::NotRendered)
    }

    pub fn options(&self) -> &SessionOptions {
        &self.options
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    fn compile(&self, tracker: &mut DependencyTracker) -> Result<String, CompileError> {
        let options = self.options.to_options();
        let runtime = self.runtime.as_ref();

        let buffer = Orchestrator::new(
            runtime,
            self.options.importer.as_deref(),
            &options,
            &self.options.load_paths,
            tracker,
        )
        .expand(&self.source, self.options.root_filename())?;

        compile_expanded(
            runtime,
            &buffer,
            &self.options.load_paths,
            self.options.minified,
        )
    }
}

impl std::fmt::Debug for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine")
            .field("options", &self.options)
            .field("runtime", &"<SystemRuntime>")
            .field("dependencies", &self.dependencies)
            .finish_non_exhaustive()
    }
}

//! SCSS compilation with pluggable `@import` resolution.
//!
//! Copyright (c) 2025 Posit, PBC
//!
//! This crate wraps the grass compiler with an import pipeline that host
//! applications can intercept. Every `@import` is first offered to an
//! optional [`Importer`], which may supply stylesheet text directly, point
//! at different files, or decline and let the filesystem resolver search the
//! importing file's directory followed by the configured load paths.
//!
//! Each [`Engine::render`] also produces the ordered list of files that were
//! read, for cache invalidation in incremental builds.
//!
//! # Modules
//!
//! - [`importer`]: the resolution protocol
//! - [`fs_resolver`]: default filesystem lookup
//! - [`orchestrator`]: `@import` expansion
//! - [`session`]: the [`Engine`] that ties a compilation together

pub mod compile;
pub mod error;
pub mod fs_resolver;
pub mod importer;
pub mod options;
pub mod orchestrator;
pub mod record;
pub mod scanner;
pub mod session;
pub mod source_map;
pub mod tracker;

pub use error::{CompileError, SourceLocation};
pub use fs_resolver::FilesystemResolver;
pub use importer::{ImportContext, ImportResult, Importer, ImporterError};
pub use options::{Options, SessionOptions};
pub use orchestrator::{MAX_IMPORT_DEPTH, Orchestrator};
pub use record::Import;
pub use session::Engine;
pub use tracker::DependencyTracker;

pub use scss_runtime::{MemoryRuntime, NativeRuntime, SharedRuntime, SystemRuntime};

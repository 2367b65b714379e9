//! `@import` expansion.
//!
//! Copyright (c) 2025 Posit, PBC
//!
//! The orchestrator is the single place an `@import` gets resolved. For each
//! occurrence it:
//!
//! 1. asks the custom importer, if one is configured;
//! 2. falls back to the filesystem resolver when there is no importer or
//!    the importer returns [`ImportResult::NotHandled`];
//! 3. reads every record that has no inline source, registering the file
//!    with the [`DependencyTracker`];
//! 4. splices the resulting text into the output buffer in record order and
//!    expands any `@import` inside it, with the record as the new parent.
//!
//! A spliced stylesheet whose last statement has no `;` is closed before the
//! importing text resumes. Imported stylesheets may not contain `@use` or
//! `@forward`: those rules must precede everything else in the compiled
//! buffer and resolve relative to it, so only the root stylesheet can hold
//! them.
//!
//! Nesting is driven by an explicit task stack rather than recursion, so
//! every level fails the same way and deep chains cannot overflow the
//! native stack. Nothing is cached: a path imported twice is resolved and
//! read twice.
//!
//! [`ImportResult::NotHandled`]: crate::ImportResult::NotHandled

use std::path::{Path, PathBuf};
use std::rc::Rc;

use scss_runtime::SystemRuntime;

use crate::error::{CompileError, SourceLocation};
use crate::fs_resolver::FilesystemResolver;
use crate::importer::{ImportContext, Importer};
use crate::options::Options;
use crate::record::Import;
use crate::scanner::{ImportTarget, ends_open_statement, find_module_rule, find_next_import};
use crate::source_map::{FlatBuffer, LineIndex};
use crate::tracker::DependencyTracker;

/// Deepest chain of nested imports before expansion is abandoned as a loop.
pub const MAX_IMPORT_DEPTH: usize = 256;

/// Stylesheet text produced for one import record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadedStylesheet {
    /// Path nested imports are resolved against and errors are reported in:
    /// the record path for inline content, the resolved file otherwise.
    pub origin: String,
    pub text: String,
    /// Canonical path of the file read, `None` for inline content.
    pub file: Option<PathBuf>,
}

/// Where expanded text is being attributed and which files enclose it.
#[derive(Debug)]
struct Scope {
    origin: String,
    files: Vec<PathBuf>,
    depth: usize,
}

#[derive(Debug)]
struct Frame {
    text: String,
    index: LineIndex,
    cursor: usize,
    scope: Rc<Scope>,
}

impl Frame {
    fn new(text: String, scope: Rc<Scope>) -> Self {
        Self {
            index: LineIndex::new(&text),
            text,
            cursor: 0,
            scope,
        }
    }

    fn location(&self, offset: usize) -> (usize, usize) {
        self.index.location(&self.text, offset)
    }
}

#[derive(Debug)]
enum Task {
    /// Copy text and expand imports until the frame is exhausted.
    Scan(Frame),
    /// Ask the importer (or the filesystem) about one `@import` target.
    Resolve {
        path: String,
        scope: Rc<Scope>,
        at: SourceLocation,
    },
    /// Read one record and queue its text for scanning.
    Load {
        record: Import,
        scope: Rc<Scope>,
        at: SourceLocation,
    },
    /// Re-emit a plain CSS import for the compiler core.
    Css {
        raw: String,
        origin: String,
        row: usize,
        column: usize,
    },
}

/// Resolves and expands `@import` rules for one compilation.
pub struct Orchestrator<'a> {
    runtime: &'a dyn SystemRuntime,
    importer: Option<&'a dyn Importer>,
    options: &'a Options,
    resolver: FilesystemResolver<'a>,
    tracker: &'a mut DependencyTracker,
}

impl<'a> Orchestrator<'a> {
    pub fn new(
        runtime: &'a dyn SystemRuntime,
        importer: Option<&'a dyn Importer>,
        options: &'a Options,
        load_paths: &'a [PathBuf],
        tracker: &'a mut DependencyTracker,
    ) -> Self {
        Self {
            runtime,
            importer,
            options,
            resolver: FilesystemResolver::new(runtime, load_paths),
            tracker,
        }
    }

    /// Turn one `@import` occurrence into the records to load.
    ///
    /// When the importer declines, the requested path itself becomes the
    /// single record, which [`load`](Self::load) then finds on disk.
    pub fn resolve(&mut self, path: &str, parent_path: &str) -> Result<Vec<Import>, CompileError> {
        if let Some(importer) = self.importer {
            let ctx = ImportContext::new(path, parent_path, self.options);
            let result = importer
                .imports(&ctx)
                .map_err(|source| CompileError::Importer {
                    path: path.to_string(),
                    parent: parent_path.to_string(),
                    location: None,
                    source,
                })?;
            if let Some(records) = result.into_records() {
                tracing::debug!(path, parent = parent_path, records = records.len(), "importer handled import");
                return Ok(records);
            }
            tracing::debug!(path, parent = parent_path, "importer declined, using filesystem");
        }
        Ok(vec![Import::new(path)])
    }

    /// Produce the text for one record.
    ///
    /// Inline records are used as-is. Anything else is located by the
    /// filesystem resolver relative to `parent_path`, read, and recorded as
    /// a dependency.
    pub fn load(&mut self, record: Import, parent_path: &str) -> Result<LoadedStylesheet, CompileError> {
        let (path, source) = record.into_parts();
        if let Some(text) = source {
            tracing::debug!(path = %path, "using inline stylesheet");
            return Ok(LoadedStylesheet {
                origin: path,
                text,
                file: None,
            });
        }

        let found = self.resolver.resolve(&path, parent_path)?;
        let text = match self.runtime.file_read_string(&found) {
            Ok(text) => text,
            // Removed between the existence check and the read
            Err(e) if e.is_not_found() => {
                return Err(CompileError::ImportNotFound {
                    path,
                    parent: parent_path.to_string(),
                    location: None,
                });
            }
            Err(source) => return Err(CompileError::Io { path: found, source }),
        };
        let canonical = self
            .runtime
            .canonicalize(&found)
            .unwrap_or_else(|_| found.clone());
        if self.tracker.record(&canonical) {
            tracing::debug!(file = %canonical.display(), "new dependency");
        }

        Ok(LoadedStylesheet {
            origin: found.to_string_lossy().into_owned(),
            text,
            file: Some(canonical),
        })
    }

    /// Expand every `@import` in `source`, which is attributed to `filename`.
    pub fn expand(&mut self, source: &str, filename: &str) -> Result<FlatBuffer, CompileError> {
        let mut buffer = FlatBuffer::new();
        let root = Rc::new(Scope {
            origin: filename.to_string(),
            files: self.root_file(filename).into_iter().collect(),
            depth: 0,
        });
        let mut stack = vec![Task::Scan(Frame::new(source.to_string(), root))];

        while let Some(task) = stack.pop() {
            match task {
                Task::Scan(mut frame) => {
                    let Some(rule) = find_next_import(&frame.text, frame.cursor) else {
                        copy_text(&mut buffer, &frame, frame.cursor, frame.text.len());
                        if frame.scope.depth > 0 && ends_open_statement(&frame.text[frame.cursor..]) {
                            buffer.close_statement();
                        }
                        continue;
                    };
                    copy_text(&mut buffer, &frame, frame.cursor, rule.span.start);
                    frame.cursor = rule.span.end;

                    let origin = &frame.scope.origin;
                    let (rule_row, rule_column) = frame.location(rule.span.start);
                    let targets: Vec<Task> = rule
                        .targets
                        .into_iter()
                        .map(|target| match target {
                            ImportTarget::Stylesheet { path, offset } => {
                                let (row, column) = frame.location(offset);
                                Task::Resolve {
                                    path,
                                    scope: Rc::clone(&frame.scope),
                                    at: SourceLocation::new(origin.clone(), row + 1, column + 1),
                                }
                            }
                            // Re-emitted text starts with the `@import` keyword
                            ImportTarget::Css { raw, .. } => Task::Css {
                                raw,
                                origin: origin.clone(),
                                row: rule_row,
                                column: rule_column,
                            },
                        })
                        .collect();

                    // The rest of this frame runs after every target is expanded
                    stack.push(Task::Scan(frame));
                    stack.extend(targets.into_iter().rev());
                }
                Task::Resolve { path, scope, at } => {
                    let records = self.resolve(&path, &scope.origin).map_err(|e| e.at(&at))?;
                    stack.extend(records.into_iter().rev().map(|record| Task::Load {
                        record,
                        scope: Rc::clone(&scope),
                        at: at.clone(),
                    }));
                }
                Task::Load { record, scope, at } => {
                    let loaded = self.load(record, &scope.origin).map_err(|e| e.at(&at))?;
                    let looped = loaded
                        .file
                        .as_ref()
                        .is_some_and(|file| scope.files.contains(file));
                    if looped || scope.depth >= MAX_IMPORT_DEPTH {
                        return Err(CompileError::ImportLoop {
                            path: loaded.origin,
                            parent: scope.origin.clone(),
                            location: Some(at),
                        });
                    }

                    if let Some((offset, rule)) = find_module_rule(&loaded.text) {
                        let (row, column) = LineIndex::new(&loaded.text).location(&loaded.text, offset);
                        return Err(CompileError::ModuleRuleInImport {
                            rule: rule.to_string(),
                            location: Some(SourceLocation::new(loaded.origin.clone(), row + 1, column + 1)),
                            file: loaded.origin,
                        });
                    }

                    let mut files = scope.files.clone();
                    files.extend(loaded.file);
                    let child = Rc::new(Scope {
                        origin: loaded.origin,
                        files,
                        depth: scope.depth + 1,
                    });
                    stack.push(Task::Scan(Frame::new(loaded.text, child)));
                }
                Task::Css {
                    raw,
                    origin,
                    row,
                    column,
                } => {
                    buffer.push_chunk(&format!("@import {raw};"), &origin, row, column);
                }
            }
        }

        Ok(buffer)
    }

    /// The canonical root file, when the session's filename names a real one.
    fn root_file(&self, filename: &str) -> Option<PathBuf> {
        let path = Path::new(filename);
        match self.runtime.is_file(path) {
            Ok(true) => self.runtime.canonicalize(path).ok(),
            _ => None,
        }
    }
}

fn copy_text(buffer: &mut FlatBuffer, frame: &Frame, start: usize, end: usize) {
    if start >= end {
        return;
    }
    let (row, column) = frame.location(start);
    buffer.push_chunk(&frame.text[start..end], &frame.scope.origin, row, column);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::importer::{ImportResult, ImporterError};
    use scss_runtime::MemoryRuntime;
    use std::sync::Mutex;

    fn expand_with(
        runtime: &MemoryRuntime,
        importer: Option<&dyn Importer>,
        source: &str,
    ) -> (Result<String, CompileError>, Vec<PathBuf>) {
        let options = Options::new();
        let mut tracker = DependencyTracker::new();
        let result = Orchestrator::new(runtime, importer, &options, &[], &mut tracker)
            .expand(source, "stdin")
            .map(FlatBuffer::into_string);
        (result, tracker.snapshot())
    }

    #[test]
    fn test_expands_file_in_place() {
        let runtime = MemoryRuntime::new();
        runtime.add_file("_colors.scss", "$red: #f00;");

        let (result, deps) = expand_with(&runtime, None, "@import 'colors';\n.a { color: $red; }\n");

        assert_eq!(result.unwrap(), "$red: #f00;\n\n.a { color: $red; }\n");
        assert_eq!(deps, vec![PathBuf::from("/project/_colors.scss")]);
    }

    #[test]
    fn test_nested_import_inside_rule() {
        let runtime = MemoryRuntime::new();
        runtime.add_file("inner.scss", "b: c;");

        let (result, _) = expand_with(&runtime, None, ".a { @import 'inner'; }");

        assert_eq!(result.unwrap(), ".a { \nb: c;\n }");
    }

    #[test]
    fn test_open_statement_is_closed_at_import_boundary() {
        let runtime = MemoryRuntime::new();
        runtime.add_file("_vars.scss", "$c: red");

        let (result, _) = expand_with(&runtime, None, "@import 'vars';\n.a { color: $c; }");

        assert_eq!(result.unwrap(), "$c: red\n;\n\n.a { color: $c; }");
    }

    #[test]
    fn test_root_is_not_closed() {
        let runtime = MemoryRuntime::new();

        let (result, _) = expand_with(&runtime, None, "$c: red");

        assert_eq!(result.unwrap(), "$c: red");
    }

    #[test]
    fn test_plain_css_import_is_located_at_keyword() {
        let runtime = MemoryRuntime::new();
        let options = Options::new();
        let mut tracker = DependencyTracker::new();
        let buffer = Orchestrator::new(&runtime, None, &options, &[], &mut tracker)
            .expand(".a {}\n  @import url(print.css);", "main.scss")
            .unwrap();

        // The indent before the rule keeps line 2 of the buffer to itself
        assert_eq!(
            buffer.original_location(3, 1),
            Some(SourceLocation::new("main.scss", 2, 3))
        );
    }

    #[test]
    fn test_module_rule_in_import_is_rejected() {
        let runtime = MemoryRuntime::new();
        runtime.add_file("lib/_theme.scss", "// theme\n@use 'colors';");

        let (result, _) = expand_with(&runtime, None, "@import 'lib/theme';");

        let err = result.unwrap_err();
        assert!(
            matches!(err, CompileError::ModuleRuleInImport { ref rule, ref file, .. }
                if rule == "@use" && file == "lib/_theme.scss"),
            "{err:?}"
        );
        assert_eq!(
            err.location(),
            Some(&SourceLocation::new("lib/_theme.scss", 2, 1))
        );
    }

    #[test]
    fn test_plain_css_import_is_reemitted() {
        let runtime = MemoryRuntime::new();

        let (result, deps) = expand_with(&runtime, None, "@import url(print.css);\n");

        assert_eq!(result.unwrap(), "@import url(print.css);\n");
        assert!(deps.is_empty());
    }

    #[test]
    fn test_resolve_falls_back_when_importer_declines() {
        let runtime = MemoryRuntime::new();
        let options = Options::new();
        let mut tracker = DependencyTracker::new();
        let importer = |_: &ImportContext<'_>| -> Result<ImportResult, ImporterError> {
            Ok(ImportResult::NotHandled)
        };
        let mut orchestrator =
            Orchestrator::new(&runtime, Some(&importer), &options, &[], &mut tracker);

        assert_eq!(
            orchestrator.resolve("theme", "stdin").unwrap(),
            vec![Import::new("theme")]
        );
    }

    #[test]
    fn test_inline_load_touches_no_disk() {
        let runtime = MemoryRuntime::new();
        let options = Options::new();
        let mut tracker = DependencyTracker::new();
        let mut orchestrator = Orchestrator::new(&runtime, None, &options, &[], &mut tracker);

        let loaded = orchestrator
            .load(Import::with_source("virtual.scss", "a { b: c }"), "stdin")
            .unwrap();

        assert_eq!(loaded.origin, "virtual.scss");
        assert_eq!(loaded.file, None);
        assert!(tracker.is_empty());
    }

    #[test]
    fn test_same_path_twice_is_resolved_twice_but_tracked_once() {
        let runtime = MemoryRuntime::new();
        runtime.add_file("a.scss", "x;");
        let calls = Mutex::new(0usize);
        let importer = |ctx: &ImportContext<'_>| -> Result<ImportResult, ImporterError> {
            *calls.lock().unwrap() += 1;
            Ok(Import::new(ctx.path()).into())
        };

        let (result, deps) = expand_with(&runtime, Some(&importer), "@import 'a';@import 'a';");

        assert_eq!(result.unwrap(), "x;\nx;");
        assert_eq!(*calls.lock().unwrap(), 2);
        assert_eq!(deps, vec![PathBuf::from("/project/a.scss")]);
    }

    #[test]
    fn test_file_loop_is_reported() {
        let runtime = MemoryRuntime::new();
        runtime.add_file("a.scss", "@import 'b';");
        runtime.add_file("b.scss", "@import 'a';");

        let (result, _) = expand_with(&runtime, None, "@import 'a';");

        let err = result.unwrap_err();
        assert!(matches!(err, CompileError::ImportLoop { .. }), "{err}");
        assert_eq!(err.location().unwrap().file, "b.scss");
    }

    #[test]
    fn test_inline_loop_hits_depth_limit() {
        let runtime = MemoryRuntime::new();
        let importer = |_: &ImportContext<'_>| -> Result<ImportResult, ImporterError> {
            Ok(Import::with_source("again.scss", "@import 'again';").into())
        };

        let (result, _) = expand_with(&runtime, Some(&importer), "@import 'again';");

        assert!(matches!(result, Err(CompileError::ImportLoop { .. })));
    }

    #[test]
    fn test_not_found_carries_import_location() {
        let runtime = MemoryRuntime::new();

        let (result, _) = expand_with(&runtime, None, ".a {}\n  @import 'missing';");

        let err = result.unwrap_err();
        assert!(matches!(err, CompileError::ImportNotFound { ref path, .. } if path == "missing"));
        assert_eq!(err.location(), Some(&SourceLocation::new("stdin", 2, 11)));
    }
}

//! Handing the expanded buffer to the compiler core.
//!
//! Copyright (c) 2025 Posit, PBC

use std::path::PathBuf;

use once_cell::sync::Lazy;
use regex::Regex;
use scss_runtime::{CORE_INPUT_NAME, RuntimeError, SystemRuntime, compile_scss};

use crate::error::{CompileError, SourceLocation};
use crate::source_map::FlatBuffer;

/// The position line of a compiler report.
///
/// Matches both `./stdin:3:7` and `stdin 3:7  root stylesheet`.
static REPORT_LOCATION: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?m)^\s*(?:\./)?(.+?)[\s:](\d+):(\d+)(?:\s+root stylesheet)?\s*$")
        .expect("report location regex is valid")
});

/// Compile the expanded stylesheet, mapping failures back to original files.
pub fn compile_expanded(
    runtime: &dyn SystemRuntime,
    buffer: &FlatBuffer,
    load_paths: &[PathBuf],
    minified: bool,
) -> Result<String, CompileError> {
    compile_scss(runtime, buffer.as_str(), load_paths, minified).map_err(|e| {
        let message = match e {
            RuntimeError::SassError(report) => report,
            other => other.to_string(),
        };
        let location = report_location(&message).and_then(|(file, line, column)| {
            if is_core_input(&file) {
                buffer.original_location(line, column)
            } else {
                Some(SourceLocation::new(file, line, column))
            }
        });
        tracing::debug!(location = ?location, "compiler core rejected stylesheet");
        CompileError::Syntax {
            message: message.trim_end().to_string(),
            location,
        }
    })
}

/// The last (file, line, column) named in a compiler report.
pub fn report_location(report: &str) -> Option<(String, usize, usize)> {
    REPORT_LOCATION
        .captures_iter(report)
        .filter_map(|caps| {
            let line = caps[2].parse().ok()?;
            let column = caps[3].parse().ok()?;
            Some((caps[1].trim().to_string(), line, column))
        })
        .last()
}

fn is_core_input(file: &str) -> bool {
    matches!(file, CORE_INPUT_NAME | "-" | "")
}

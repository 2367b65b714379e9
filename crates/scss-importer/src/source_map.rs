//! Mapping positions in the expanded buffer back to original stylesheets.
//!
//! Copyright (c) 2025 Posit, PBC
//!
//! The orchestrator hands the compiler core one flattened buffer. Every
//! chunk copied into that buffer starts on a fresh line and is recorded as a
//! [`Segment`], so a (line, column) reported by the core can be translated
//! back to the file the text came from.

use crate::error::SourceLocation;

/// Byte offset to (row, column) conversion for one source text.
///
/// Rows and columns are 0-based; columns count characters.
#[derive(Debug, Clone)]
pub struct LineIndex {
    line_starts: Vec<usize>,
}

impl LineIndex {
    pub fn new(text: &str) -> Self {
        let mut line_starts = vec![0];
        line_starts.extend(
            text.char_indices()
                .filter_map(|(idx, ch)| (ch == '\n').then_some(idx + 1)),
        );
        Self { line_starts }
    }

    pub fn location(&self, text: &str, offset: usize) -> (usize, usize) {
        let row = match self.line_starts.binary_search(&offset) {
            Ok(row) => row,
            Err(next) => next - 1,
        };
        let line_start = self.line_starts[row];
        let column = text
            .get(line_start..offset)
            .map_or(offset - line_start, |prefix| prefix.chars().count());
        (row, column)
    }
}

/// A run of buffer lines copied from one origin.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segment {
    /// First buffer row (0-based) of the chunk.
    pub buffer_row: usize,
    /// File the chunk was copied from.
    pub origin: String,
    /// Row and column (0-based) of the chunk's first character in `origin`.
    pub origin_row: usize,
    pub origin_column: usize,
}

/// The expanded stylesheet together with where each part came from.
#[derive(Debug, Clone, Default)]
pub struct FlatBuffer {
    text: String,
    rows: usize,
    segments: Vec<Segment>,
}

impl FlatBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `chunk`, copied from `origin` at (`row`, `column`).
    pub fn push_chunk(&mut self, chunk: &str, origin: &str, row: usize, column: usize) {
        if chunk.is_empty() {
            return;
        }
        self.start_line();
        self.segments.push(Segment {
            buffer_row: self.rows,
            origin: origin.to_string(),
            origin_row: row,
            origin_column: column,
        });
        self.text.push_str(chunk);
        self.rows += chunk.matches('\n').count();
    }

    /// Terminate the statement the last chunk left open.
    ///
    /// The `;` goes on a line of its own so it cannot land inside a
    /// trailing `//` comment.
    pub fn close_statement(&mut self) {
        self.start_line();
        self.text.push(';');
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    pub fn into_string(self) -> String {
        self.text
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Translate a 1-based buffer position into the original location.
    pub fn original_location(&self, line: usize, column: usize) -> Option<SourceLocation> {
        let row = line.checked_sub(1)?;
        let index = self
            .segments
            .partition_point(|segment| segment.buffer_row <= row)
            .checked_sub(1)?;
        let segment = &self.segments[index];
        let origin_row = segment.origin_row + (row - segment.buffer_row);
        let origin_column = if row == segment.buffer_row {
            segment.origin_column + column
        } else {
            column
        };
        Some(SourceLocation::new(
            segment.origin.clone(),
            origin_row + 1,
            origin_column,
        ))
    }

    fn start_line(&mut self) {
        if !self.text.is_empty() && !self.text.ends_with('\n') {
            self.text.push('\n');
            self.rows += 1;
        }
    }
}

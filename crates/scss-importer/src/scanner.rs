//! Locating `@import` rules in SCSS source.
//!
//! Copyright (c) 2025 Posit, PBC
//!
//! This is not a SCSS parser. It only understands enough of the lexical
//! structure (strings, comments, `url(...)`) to find `@import` rules that
//! are not hidden inside one of those, and to split an import rule into its
//! comma-separated targets. The same lexical pass also locates `@use` and
//! `@forward` rules and tells whether a stylesheet ends mid-statement.
//!
//! Targets that Sass treats as plain CSS imports are reported as
//! [`ImportTarget::Css`] and must be left for the compiler core:
//!
//! - `url(...)`
//! - `http://`, `https://` and protocol-relative `//` URLs
//! - paths ending in `.css`
//! - interpolated strings (`"#{$theme}.scss"`)
//! - any rule followed by a media query or otherwise not a plain list of
//!   strings; the whole argument text is kept as one target

use std::ops::Range;

/// One target of an `@import` rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImportTarget {
    /// A stylesheet to resolve; the string value with quotes removed.
    Stylesheet { path: String, offset: usize },
    /// Text to re-emit verbatim after `@import `.
    Css { raw: String, offset: usize },
}

impl ImportTarget {
    /// Byte offset of the target in the scanned source.
    pub fn offset(&self) -> usize {
        match self {
            ImportTarget::Stylesheet { offset, .. } | ImportTarget::Css { offset, .. } => *offset,
        }
    }
}

/// An `@import` rule and the byte range it occupies, terminator included.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportRule {
    pub span: Range<usize>,
    pub targets: Vec<ImportTarget>,
}

const IMPORT_KEYWORD: &str = "@import";

const MODULE_KEYWORDS: &[&str] = &["@use", "@forward"];

/// Find the first `@import` rule at or after `from`.
pub fn find_next_import(source: &str, from: usize) -> Option<ImportRule> {
    let (start, _) = find_at_rule(source.as_bytes(), from, &[IMPORT_KEYWORD])?;
    Some(parse_rule(source, start))
}

/// Offset and keyword of the first `@use` or `@forward` rule.
pub fn find_module_rule(source: &str) -> Option<(usize, &'static str)> {
    find_at_rule(source.as_bytes(), 0, MODULE_KEYWORDS)
}

/// Whether `source` ends in a statement that still lacks its `;`.
///
/// Trailing whitespace and comments are ignored. Text whose last
/// significant character is `;`, `{` or `}` is closed, as is text with
/// nothing but whitespace and comments.
pub fn ends_open_statement(source: &str) -> bool {
    let bytes = source.as_bytes();
    let mut last = None;
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'"' | b'\'' => {
                last = Some(bytes[i]);
                i = skip_string(bytes, i);
            }
            b'/' if bytes.get(i + 1) == Some(&b'*') => i = skip_block_comment(bytes, i),
            b'/' if bytes.get(i + 1) == Some(&b'/') => i = skip_line_comment(bytes, i),
            b'u' | b'U' if is_url_start(bytes, i) => {
                last = Some(b')');
                i = skip_url(bytes, i);
            }
            b if b.is_ascii_whitespace() => i += 1,
            b => {
                last = Some(b);
                i += 1;
            }
        }
    }
    !matches!(last, None | Some(b';' | b'{' | b'}'))
}

/// Offset and keyword of the first of `keywords` outside strings, comments
/// and `url()`, at or after `from`.
fn find_at_rule(
    bytes: &[u8],
    from: usize,
    keywords: &[&'static str],
) -> Option<(usize, &'static str)> {
    let mut i = from;
    while i < bytes.len() {
        match bytes[i] {
            b'"' | b'\'' => i = skip_string(bytes, i),
            b'/' if bytes.get(i + 1) == Some(&b'*') => i = skip_block_comment(bytes, i),
            b'/' if bytes.get(i + 1) == Some(&b'/') => i = skip_line_comment(bytes, i),
            b'u' | b'U' if is_url_start(bytes, i) => i = skip_url(bytes, i),
            b'@' => {
                if let Some(keyword) = keywords.iter().find(|kw| is_keyword(bytes, i, kw.as_bytes())) {
                    return Some((i, *keyword));
                }
                i += 1;
            }
            _ => i += 1,
        }
    }
    None
}

fn parse_rule(source: &str, start: usize) -> ImportRule {
    let bytes = source.as_bytes();
    let args_start = start + IMPORT_KEYWORD.len();
    let mut targets = Vec::new();
    let mut pos = args_start;

    loop {
        pos = skip_trivia(bytes, pos);
        let target_start = pos;
        let target = match bytes.get(pos) {
            Some(b'"' | b'\'') => {
                let end = skip_string(bytes, pos);
                let raw = &source[pos..end];
                pos = end;
                match unquote(raw) {
                    Some(path) if !is_plain_css(&path) => ImportTarget::Stylesheet {
                        path,
                        offset: target_start,
                    },
                    _ => ImportTarget::Css {
                        raw: raw.to_string(),
                        offset: target_start,
                    },
                }
            }
            Some(b'u' | b'U') if is_url_start(bytes, pos) => {
                let end = skip_url(bytes, pos);
                let raw = source[pos..end].to_string();
                pos = end;
                ImportTarget::Css {
                    raw,
                    offset: target_start,
                }
            }
            _ => return passthrough(source, start, args_start),
        };
        targets.push(target);

        pos = skip_trivia(bytes, pos);
        match bytes.get(pos) {
            Some(b',') => pos += 1,
            Some(b';') => {
                return ImportRule {
                    span: start..pos + 1,
                    targets,
                };
            }
            Some(b'}') | None => {
                return ImportRule {
                    span: start..pos,
                    targets,
                };
            }
            // Media query or supports condition
            Some(_) => return passthrough(source, start, args_start),
        }
    }
}

/// The whole rule as a single plain CSS target.
fn passthrough(source: &str, start: usize, args_start: usize) -> ImportRule {
    let bytes = source.as_bytes();
    let mut pos = args_start;
    let mut depth = 0usize;
    let end = loop {
        match bytes.get(pos) {
            None => break pos,
            Some(b'"' | b'\'') => pos = skip_string(bytes, pos),
            Some(b'/') if bytes.get(pos + 1) == Some(&b'*') => pos = skip_block_comment(bytes, pos),
            Some(b'(') => {
                depth += 1;
                pos += 1;
            }
            Some(b')') => {
                depth = depth.saturating_sub(1);
                pos += 1;
            }
            Some(b';') if depth == 0 => break pos + 1,
            Some(b'}') if depth == 0 => break pos,
            Some(_) => pos += 1,
        }
    };
    let raw_end = if bytes.get(end.wrapping_sub(1)) == Some(&b';') {
        end - 1
    } else {
        end
    };
    let offset = skip_trivia(bytes, args_start).min(raw_end);
    ImportRule {
        span: start..end,
        targets: vec![ImportTarget::Css {
            raw: source[offset..raw_end].trim_end().to_string(),
            offset,
        }],
    }
}

fn is_plain_css(path: &str) -> bool {
    path.ends_with(".css")
        || path.starts_with("http://")
        || path.starts_with("https://")
        || path.starts_with("//")
        || path.contains("#{")
}

/// Strip quotes and resolve backslash escapes. `None` for an unterminated string.
fn unquote(raw: &str) -> Option<String> {
    let quote = raw.chars().next()?;
    let inner = raw.strip_prefix(quote)?.strip_suffix(quote)?;
    let mut value = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(c) = chars.next() {
        if c == '\\' {
            if let Some(escaped) = chars.next() {
                value.push(escaped);
            }
        } else {
            value.push(c);
        }
    }
    Some(value)
}

fn is_ident_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'-' || b == b'_' || b >= 0x80
}

fn is_keyword(bytes: &[u8], i: usize, keyword: &[u8]) -> bool {
    bytes[i..].starts_with(keyword)
        && bytes
            .get(i + keyword.len())
            .is_none_or(|&b| !is_ident_byte(b))
}

fn is_url_start(bytes: &[u8], i: usize) -> bool {
    let Some(head) = bytes.get(i..i + 4) else {
        return false;
    };
    head.eq_ignore_ascii_case(b"url(") && (i == 0 || !is_ident_byte(bytes[i - 1]))
}

/// Index just past the closing quote, or the end of input.
fn skip_string(bytes: &[u8], start: usize) -> usize {
    let quote = bytes[start];
    let mut i = start + 1;
    while i < bytes.len() {
        match bytes[i] {
            b'\\' => i += 2,
            b if b == quote => return i + 1,
            b'\n' => return i,
            _ => i += 1,
        }
    }
    bytes.len()
}

fn skip_block_comment(bytes: &[u8], start: usize) -> usize {
    let mut i = start + 2;
    while i + 1 < bytes.len() {
        if bytes[i] == b'*' && bytes[i + 1] == b'/' {
            return i + 2;
        }
        i += 1;
    }
    bytes.len()
}

fn skip_line_comment(bytes: &[u8], start: usize) -> usize {
    bytes[start..]
        .iter()
        .position(|&b| b == b'\n')
        .map_or(bytes.len(), |n| start + n)
}

/// Index just past the `)` closing a `url(`, or the end of input.
fn skip_url(bytes: &[u8], start: usize) -> usize {
    let mut i = start + 4;
    while i < bytes.len() {
        match bytes[i] {
            b'"' | b'\'' => i = skip_string(bytes, i),
            b')' => return i + 1,
            _ => i += 1,
        }
    }
    bytes.len()
}

/// Skip whitespace and comments.
fn skip_trivia(bytes: &[u8], mut i: usize) -> usize {
    loop {
        match bytes.get(i) {
            Some(b) if b.is_ascii_whitespace() => i += 1,
            Some(b'/') if bytes.get(i + 1) == Some(&b'*') => i = skip_block_comment(bytes, i),
            Some(b'/') if bytes.get(i + 1) == Some(&b'/') => i = skip_line_comment(bytes, i),
            _ => return i,
        }
    }
}

//! Position conversion utilities.
//!
//! Tokens and errors carry byte offsets only. Line and column numbers are
//! derived on demand when a diagnostic is rendered.

/// 1-based line and column of a byte offset
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineCol {
    pub line: usize,
    /// Counted in characters, not bytes
    pub col: usize,
}

/// Convert a byte offset to a 1-based line/column pair.
///
/// Offsets past the end are clamped to the end of the source. `\n`, `\r\n`
/// and a lone `\r` each end a line, as they do for the lexer.
pub fn line_col(source: &str, byte_offset: usize) -> LineCol {
    let byte_offset = floor_char_boundary(source, byte_offset);
    let (breaks, line_start) = line_breaks(source, byte_offset)
        .fold((0, 0), |(count, _), next_line| (count + 1, next_line));
    let col = source[line_start..byte_offset].chars().count() + 1;
    LineCol {
        line: breaks + 1,
        col,
    }
}

/// The physical line containing `byte_offset`, without its line break
pub fn line_text(source: &str, byte_offset: usize) -> &str {
    let byte_offset = floor_char_boundary(source, byte_offset);
    let start = line_breaks(source, byte_offset).last().unwrap_or(0);
    let end = source[start..]
        .find(['\n', '\r'])
        .map_or(source.len(), |i| start + i);
    &source[start..end]
}

/// Start offsets of every line after the first, up to `end`
fn line_breaks(source: &str, end: usize) -> impl Iterator<Item = usize> + '_ {
    let bytes = source.as_bytes();
    bytes[..end]
        .iter()
        .enumerate()
        .filter_map(move |(i, &b)| match b {
            b'\n' => Some(i + 1),
            b'\r' if bytes.get(i + 1) != Some(&b'\n') => Some(i + 1),
            _ => None,
        })
}

fn floor_char_boundary(source: &str, byte_offset: usize) -> usize {
    let mut offset = byte_offset.min(source.len());
    while !source.is_char_boundary(offset) {
        offset -= 1;
    }
    offset
}

// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Source location tracking.

use std::fmt;

/// A source position as reported by the parser (both 1-based; 0 means unknown).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Span {
    pub line: u32,
    pub col: u32,
}

impl Span {
    pub const DUMMY: Span = Span { line: 0, col: 0 };

    pub fn new(line: u32, col: u32) -> Self {
        Self { line, col }
    }

    pub fn is_dummy(&self) -> bool {
        self.line == 0
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.col)
    }
}

/// Precomputed line-start offsets for O(1) lookup of a line's text.
#[derive(Debug, Clone)]
pub struct LineMap {
    /// Byte offset of the start of each line. line_starts[0] is always 0.
    line_starts: Vec<u32>,
}

impl LineMap {
    /// Build a line map by scanning source for newlines. O(n).
    pub fn new(source: &str) -> Self {
        let mut line_starts = vec![0u32];
        for (i, b) in source.bytes().enumerate() {
            if b == b'\n' {
                line_starts.push((i + 1) as u32);
            }
        }
        LineMap { line_starts }
    }

    /// Get the source text of a 1-based line number. O(1).
    pub fn line_text<'a>(&self, source: &'a str, line: u32) -> Option<&'a str> {
        let idx = (line as usize).checked_sub(1)?;
        let start = *self.line_starts.get(idx)? as usize;
        let end = self
            .line_starts
            .get(idx + 1)
            .map(|&s| (s as usize).saturating_sub(1)) // exclude the \n
            .unwrap_or(source.len());
        source.get(start..end)
    }
}

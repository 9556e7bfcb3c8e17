use std::ops::Range;

use serde::{Deserialize, Serialize};

/// Byte-offset span into a document's source text (start inclusive, end exclusive).
///
/// Syntax nodes handed to the type checker carry these; diagnostics convert
/// them into line/column pairs through [`LineIndex`] only when rendering.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Span {
    pub start: u32,
    pub end: u32,
}

impl Span {
    pub fn new(start: u32, end: u32) -> Self {
        debug_assert!(start <= end, "span start ({start}) must be <= end ({end})");
        Self { start, end }
    }

    /// Zero-width span used for synthesized nodes without source text.
    pub fn detached() -> Self {
        Self::default()
    }

    pub fn len(&self) -> u32 {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// Smallest span covering both `self` and `other`.
    pub fn cover(self, other: Span) -> Span {
        if self.is_empty() && self.start == 0 {
            return other;
        }
        if other.is_empty() && other.start == 0 {
            return self;
        }
        Span {
            start: self.start.min(other.start),
            end: self.end.max(other.end),
        }
    }

    /// The span as a `usize` range, clamped to `len` (ariadne wants ranges).
    pub fn to_range(self, len: usize) -> Range<usize> {
        let start = (self.start as usize).min(len);
        let end = (self.end as usize).min(len).max(start);
        start..end
    }
}

/// Line start offsets of a source text, for offset -> (line, column) lookup.
#[derive(Debug)]
pub struct LineIndex {
    line_starts: Vec<u32>,
}

impl LineIndex {
    pub fn new(source: &str) -> Self {
        let mut line_starts = vec![0u32];
        line_starts.extend(
            source
                .bytes()
                .enumerate()
                .filter(|(_, b)| *b == b'\n')
                .map(|(i, _)| (i + 1) as u32),
        );
        Self { line_starts }
    }

    /// 1-based (line, column); columns count bytes.
    pub fn line_col(&self, offset: u32) -> (u32, u32) {
        let line_idx = self
            .line_starts
            .partition_point(|&start| start <= offset)
            .saturating_sub(1);
        (line_idx as u32 + 1, offset - self.line_starts[line_idx] + 1)
    }

    pub fn line_count(&self) -> usize {
        self.line_starts.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cover_ignores_detached_spans() {
        let a = Span::new(4, 9);
        assert_eq!(Span::detached().cover(a), a);
        assert_eq!(a.cover(Span::new(2, 5)), Span::new(2, 9));
    }

    #[test]
    fn to_range_clamps_past_end() {
        assert_eq!(Span::new(3, 40).to_range(10), 3..10);
        assert_eq!(Span::new(30, 40).to_range(10), 10..10);
    }

    #[test]
    fn line_col_across_lines() {
        let idx = LineIndex::new("fn f()\n  = 1\n");
        assert_eq!(idx.line_col(0), (1, 1));
        assert_eq!(idx.line_col(9), (2, 3));
        assert_eq!(idx.line_count(), 3);
    }
}

use serde::Serialize;

/// Half-open byte range `[start, end)` into a source file.
///
/// Every position handed between the lexer, the parser and the semantic
/// layer is a byte offset. Line/column pairs only exist at the edges (CLI
/// input and output) and are produced by [`LineIndex`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct Span {
    pub start: u32,
    pub end: u32,
}

impl Span {
    pub fn new(start: u32, end: u32) -> Self {
        debug_assert!(start <= end, "span start ({start}) must be <= end ({end})");
        Self { start, end }
    }

    /// Zero-width span at `offset`.
    pub fn at(offset: u32) -> Self {
        Self::new(offset, offset)
    }

    pub fn len(&self) -> u32 {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// Smallest span covering both `self` and `other`.
    pub fn merge(self, other: Span) -> Span {
        Span {
            start: self.start.min(other.start),
            end: self.end.max(other.end),
        }
    }

    /// Whether `offset` falls inside the span. The end position counts as
    /// inside so a cursor placed right after an identifier still hits it.
    pub fn touches(&self, offset: u32) -> bool {
        self.start <= offset && offset <= self.end
    }
}

/// Line start table for one source file.
#[derive(Debug, Clone)]
pub struct LineIndex {
    line_starts: Vec<u32>,
    len: u32,
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
        Self {
            line_starts,
            len: source.len() as u32,
        }
    }

    /// 1-based `(line, column)` of a byte offset. Columns count bytes.
    pub fn line_col(&self, offset: u32) -> (u32, u32) {
        let line_idx = self
            .line_starts
            .partition_point(|&start| start <= offset)
            .saturating_sub(1);
        let col = offset - self.line_starts[line_idx] + 1;
        (line_idx as u32 + 1, col)
    }

    /// Inverse of [`LineIndex::line_col`]. Returns `None` when the line does
    /// not exist or the column runs past the end of that line.
    pub fn offset(&self, line: u32, col: u32) -> Option<u32> {
        if line == 0 || col == 0 {
            return None;
        }
        let start = *self.line_starts.get(line as usize - 1)?;
        let line_end = self
            .line_starts
            .get(line as usize)
            .map(|next| next - 1)
            .unwrap_or(self.len);
        let offset = start + col - 1;
        (offset <= line_end).then_some(offset)
    }

    pub fn line_count(&self) -> usize {
        self.line_starts.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn span_basics() {
        let span = Span::new(5, 10);
        assert_eq!(span.len(), 5);
        assert!(!span.is_empty());
        assert!(Span::at(3).is_empty());
    }

    #[test]
    fn span_merge_covers_both() {
        let merged = Span::new(5, 10).merge(Span::new(8, 15));
        assert_eq!(merged, Span::new(5, 15));
    }

    #[test]
    fn span_touches_includes_end() {
        let span = Span::new(4, 7);
        assert!(span.touches(4));
        assert!(span.touches(7));
        assert!(!span.touches(8));
        assert!(!span.touches(3));
    }

    #[test]
    fn line_col_across_lines() {
        let idx = LineIndex::new("class A {\n  var x;\n}");
        assert_eq!(idx.line_col(0), (1, 1));
        assert_eq!(idx.line_col(12), (2, 3));
        assert_eq!(idx.line_col(19), (3, 1));
        assert_eq!(idx.line_count(), 3);
    }

    #[test]
    fn offset_inverts_line_col() {
        let src = "ab\ncde\n\nf";
        let idx = LineIndex::new(src);
        for offset in 0..src.len() as u32 {
            let (line, col) = idx.line_col(offset);
            assert_eq!(idx.offset(line, col), Some(offset), "offset {offset}");
        }
    }

    #[test]
    fn offset_rejects_out_of_range() {
        let idx = LineIndex::new("ab\ncd");
        assert_eq!(idx.offset(0, 1), None);
        assert_eq!(idx.offset(3, 1), None);
        assert_eq!(idx.offset(1, 9), None);
    }
}

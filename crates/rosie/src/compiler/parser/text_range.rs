/// Byte range of a token or syntax node in the source text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct SourceRange {
    pub start_offset: usize,
    pub length: usize,
}

impl SourceRange {
    pub const EMPTY: SourceRange = SourceRange {
        start_offset: 0,
        length: 0,
    };

    pub fn new(start_offset: usize, length: usize) -> Self {
        SourceRange {
            start_offset,
            length,
        }
    }

    pub fn end_offset(&self) -> usize {
        self.start_offset + self.length
    }

    /// Smallest range covering both `self` and `other`.
    pub fn merge(&self, other: &SourceRange) -> SourceRange {
        let start = self.start_offset.min(other.start_offset);
        let end = self.end_offset().max(other.end_offset());
        SourceRange::new(start, end - start)
    }

    /// 1-based line and column of the range start within `text`.
    pub fn line_col(&self, text: &str) -> (usize, usize) {
        let end = self.start_offset.min(text.len());
        let mut line = 1;
        let mut column = 1;
        for ch in text[..end].chars() {
            if ch == '\n' {
                line += 1;
                column = 1;
            } else {
                column += 1;
            }
        }
        (line, column)
    }
}

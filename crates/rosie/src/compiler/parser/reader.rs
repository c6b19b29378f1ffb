use crate::compiler::parser::text_range::SourceRange;

/// Character cursor over source text, tracking the start of the current token.
pub struct Reader<'a> {
    text: &'a str,
    start: usize,
    pos: usize,
}

impl<'a> Reader<'a> {
    pub fn new(text: &'a str) -> Self {
        Reader {
            text,
            start: 0,
            pos: 0,
        }
    }

    #[inline]
    pub fn is_eof(&self) -> bool {
        self.pos >= self.text.len()
    }

    /// Current character, or `'\0'` at end of input (check `is_eof` to disambiguate).
    #[inline]
    pub fn current_char(&self) -> char {
        self.text[self.pos..].chars().next().unwrap_or('\0')
    }

    #[inline]
    pub fn next_char(&self) -> char {
        let mut chars = self.text[self.pos..].chars();
        chars.next();
        chars.next().unwrap_or('\0')
    }

    #[inline]
    pub fn bump(&mut self) {
        if let Some(ch) = self.text[self.pos..].chars().next() {
            self.pos += ch.len_utf8();
        }
    }

    pub fn eat_while<F: Fn(char) -> bool>(&mut self, f: F) -> usize {
        let mut count = 0;
        while !self.is_eof() && f(self.current_char()) {
            self.bump();
            count += 1;
        }
        count
    }

    pub fn reset_buff(&mut self) {
        self.start = self.pos;
    }

    pub fn current_range(&self) -> SourceRange {
        SourceRange::new(self.start, self.pos - self.start)
    }

    pub fn current_text(&self) -> &'a str {
        &self.text[self.start..self.pos]
    }
}

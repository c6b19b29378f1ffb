use crate::compiler::parser::{
    error::RplParseError, reader::Reader, rpl_token_data::RplTokenData,
    rpl_token_kind::RplTokenKind, text_range::SourceRange,
};

pub struct RplTokenize<'a> {
    reader: Reader<'a>,
    error: Option<RplParseError>,
}

impl<'a> RplTokenize<'a> {
    pub fn new(reader: Reader<'a>) -> Self {
        RplTokenize {
            reader,
            error: None,
        }
    }

    pub fn tokenize(&mut self) -> Result<Vec<RplTokenData>, RplParseError> {
        let mut tokens = vec![];

        while !self.reader.is_eof() {
            let kind = self.lex();
            if let Some(err) = self.error.take() {
                return Err(err);
            }
            if kind == RplTokenKind::TkEof {
                break;
            }

            tokens.push(RplTokenData::new(kind, self.reader.current_range()));
        }

        Ok(tokens)
    }

    fn name_to_kind(&self, name: &str) -> RplTokenKind {
        match name {
            "package" => RplTokenKind::TkPackage,
            "import" => RplTokenKind::TkImport,
            "as" => RplTokenKind::TkAs,
            "local" => RplTokenKind::TkLocal,
            "alias" => RplTokenKind::TkAlias,
            _ => RplTokenKind::TkName,
        }
    }

    fn lex(&mut self) -> RplTokenKind {
        self.reader.reset_buff();

        match self.reader.current_char() {
            '\n' | '\r' => {
                let first = self.reader.current_char();
                self.reader.bump();
                if first == '\r' && self.reader.current_char() == '\n' {
                    self.reader.bump();
                }
                RplTokenKind::TkEndOfLine
            }
            ' ' | '\t' => {
                self.reader.eat_while(|ch| ch == ' ' || ch == '\t');
                RplTokenKind::TkWhitespace
            }
            '-' => {
                self.reader.bump();
                if self.reader.current_char() != '-' {
                    self.error("unexpected '-' (comments start with '--')");
                    return RplTokenKind::TkUnknown;
                }
                self.reader.eat_while(|ch| ch != '\n' && ch != '\r');
                RplTokenKind::TkComment
            }
            '"' => self.lex_string(),
            '[' => self.lex_charset(),
            '.' => {
                self.reader.bump();
                RplTokenKind::TkDot
            }
            '/' => self.single(RplTokenKind::TkSlash),
            '*' => self.single(RplTokenKind::TkStar),
            '+' => self.single(RplTokenKind::TkPlus),
            '?' => self.single(RplTokenKind::TkQuestion),
            '!' => self.single(RplTokenKind::TkNot),
            '>' => self.single(RplTokenKind::TkGt),
            '^' => self.single(RplTokenKind::TkCaret),
            '$' => self.single(RplTokenKind::TkDollar),
            '~' => self.single(RplTokenKind::TkTilde),
            '=' => self.single(RplTokenKind::TkAssign),
            ':' => self.single(RplTokenKind::TkColon),
            ',' => self.single(RplTokenKind::TkComma),
            ';' => self.single(RplTokenKind::TkSemicolon),
            '(' => self.single(RplTokenKind::TkLeftParen),
            ')' => self.single(RplTokenKind::TkRightParen),
            '{' => self.single(RplTokenKind::TkLeftBrace),
            '}' => self.single(RplTokenKind::TkRightBrace),
            ch if ch.is_ascii_digit() => {
                self.reader.eat_while(|ch| ch.is_ascii_digit());
                RplTokenKind::TkInt
            }
            ch if is_name_start(ch) => {
                self.reader.eat_while(is_name_continue);
                let mut qualified = false;
                // pkg.name: the dot binds only when a name follows immediately
                while self.reader.current_char() == '.' && is_name_start(self.reader.next_char()) {
                    self.reader.bump();
                    self.reader.eat_while(is_name_continue);
                    qualified = true;
                }
                if qualified {
                    RplTokenKind::TkName
                } else {
                    self.name_to_kind(self.reader.current_text())
                }
            }
            ch => {
                self.reader.bump();
                self.error(&format!("unexpected character '{}'", ch.escape_default()));
                RplTokenKind::TkUnknown
            }
        }
    }

    fn single(&mut self, kind: RplTokenKind) -> RplTokenKind {
        self.reader.bump();
        kind
    }

    fn lex_string(&mut self) -> RplTokenKind {
        self.reader.bump(); // opening quote
        loop {
            if self.reader.is_eof() {
                self.error("unterminated string literal");
                return RplTokenKind::TkString;
            }
            match self.reader.current_char() {
                '\n' | '\r' => {
                    self.error("unterminated string literal");
                    return RplTokenKind::TkString;
                }
                '\\' => {
                    self.reader.bump();
                    self.reader.bump();
                }
                '"' => {
                    self.reader.bump();
                    return RplTokenKind::TkString;
                }
                _ => self.reader.bump(),
            }
        }
    }

    // Bracket expressions nest ([[:digit:][a-f]]); the compiler interprets the contents
    fn lex_charset(&mut self) -> RplTokenKind {
        let mut depth = 0usize;
        loop {
            if self.reader.is_eof() {
                self.error("unterminated character set");
                return RplTokenKind::TkCharset;
            }
            match self.reader.current_char() {
                '\\' => {
                    self.reader.bump();
                    self.reader.bump();
                }
                '[' => {
                    depth += 1;
                    self.reader.bump();
                }
                ']' => {
                    depth -= 1;
                    self.reader.bump();
                    if depth == 0 {
                        return RplTokenKind::TkCharset;
                    }
                }
                '\n' | '\r' => {
                    self.error("unterminated character set");
                    return RplTokenKind::TkCharset;
                }
                _ => self.reader.bump(),
            }
        }
    }

    fn error(&mut self, message: &str) {
        if self.error.is_none() {
            let range = self.reader.current_range();
            let range = if range.length == 0 {
                SourceRange::new(range.start_offset, 1)
            } else {
                range
            };
            self.error = Some(RplParseError::lex_error_from(message, range));
        }
    }
}

pub fn is_name_start(ch: char) -> bool {
    ch.is_ascii_alphabetic() || ch == '_'
}

pub fn is_name_continue(ch: char) -> bool {
    ch.is_ascii_alphanumeric() || ch == '_'
}

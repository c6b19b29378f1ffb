mod error;
mod grammar;
mod reader;
mod rpl_token_data;
mod rpl_token_kind;
mod rpl_tokenize;
mod text_range;

pub use crate::compiler::parser::{
    error::{RplParseError, RplParseErrorKind},
    grammar::decode_string,
    reader::Reader,
    rpl_token_data::RplTokenData,
    rpl_token_kind::RplTokenKind,
    rpl_tokenize::{RplTokenize, is_name_continue, is_name_start},
    text_range::SourceRange,
};

use crate::compiler::ast::{Block, Expr};

pub struct RplParser<'a> {
    text: &'a str,
    tokens: Vec<RplTokenData>,
    token_index: usize,
    current_token: RplTokenKind,
    depth: usize,
}

impl<'a> RplParser<'a> {
    pub fn new(text: &'a str, tokens: Vec<RplTokenData>) -> RplParser<'a> {
        let mut parser = RplParser {
            text,
            tokens,
            token_index: 0,
            current_token: RplTokenKind::None,
            depth: 0,
        };

        parser.init();
        parser
    }

    /// Tokenize `text` and parse it as a block of statements.
    pub fn parse_source(text: &'a str) -> Result<Block, RplParseError> {
        let tokens = RplTokenize::new(Reader::new(text)).tokenize()?;
        RplParser::new(text, tokens).parse_block()
    }

    /// Tokenize `text` and parse it as a single expression.
    pub fn parse_pattern(text: &'a str) -> Result<Expr, RplParseError> {
        let tokens = RplTokenize::new(Reader::new(text)).tokenize()?;
        RplParser::new(text, tokens).parse_expression()
    }

    fn init(&mut self) {
        if self.tokens.is_empty() {
            self.current_token = RplTokenKind::TkEof;
        } else {
            self.current_token = self.tokens[0].kind;
        }

        if self.current_token.is_trivia() {
            self.bump();
        }
    }

    pub fn current_token(&self) -> RplTokenKind {
        self.current_token
    }

    pub fn current_token_range(&self) -> SourceRange {
        if self.token_index >= self.tokens.len() {
            return match self.tokens.last() {
                Some(last) => SourceRange::new(last.range.end_offset(), 0),
                None => SourceRange::EMPTY,
            };
        }

        self.tokens[self.token_index].range
    }

    pub fn current_token_text(&self) -> &'a str {
        if self.token_index < self.tokens.len() {
            let range = &self.tokens[self.token_index].range;
            &self.text[range.start_offset..range.end_offset()]
        } else {
            "<eof>"
        }
    }

    pub fn bump(&mut self) {
        let mut next_index = self.token_index + 1;
        self.skip_trivia(&mut next_index);
        self.token_index = next_index;

        if self.token_index >= self.tokens.len() {
            self.current_token = RplTokenKind::TkEof;
            return;
        }

        self.current_token = self.tokens[self.token_index].kind;
    }

    pub fn peek_next_token(&self) -> RplTokenKind {
        let mut next_index = self.token_index + 1;
        self.skip_trivia(&mut next_index);

        if next_index >= self.tokens.len() {
            RplTokenKind::TkEof
        } else {
            self.tokens[next_index].kind
        }
    }

    /// True when the next token follows the current one with no trivia between.
    pub fn next_token_is_adjacent(&self) -> bool {
        match (
            self.tokens.get(self.token_index),
            self.tokens.get(self.token_index + 1),
        ) {
            (Some(cur), Some(next)) => {
                !next.kind.is_trivia() && cur.range.end_offset() == next.range.start_offset
            }
            _ => false,
        }
    }

    fn skip_trivia(&self, index: &mut usize) {
        if *index >= self.tokens.len() {
            return;
        }

        let mut kind = self.tokens[*index].kind;
        while kind.is_trivia() {
            *index += 1;
            if *index >= self.tokens.len() {
                break;
            }
            kind = self.tokens[*index].kind;
        }
    }

    pub(crate) fn syntax_error(&self, message: &str) -> RplParseError {
        let range = self.current_token_range();
        RplParseError::syntax_error_from(message, range)
    }

    pub(crate) fn expect(&mut self, kind: RplTokenKind) -> Result<SourceRange, RplParseError> {
        if self.current_token != kind {
            return Err(self.syntax_error(&format!(
                "expected {}, found {}",
                kind, self.current_token
            )));
        }
        let range = self.current_token_range();
        self.bump();
        Ok(range)
    }
}

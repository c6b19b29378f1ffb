use crate::compiler::parser::text_range::SourceRange;
use crate::rosie_vm::Diagnostic;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum RplParseErrorKind {
    LexError,
    SyntaxError,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RplParseError {
    pub kind: RplParseErrorKind,
    pub message: String,
    pub range: SourceRange,
}

impl RplParseError {
    pub fn new(kind: RplParseErrorKind, message: &str, range: SourceRange) -> Self {
        RplParseError {
            kind,
            message: message.to_string(),
            range,
        }
    }

    pub fn syntax_error_from(message: &str, range: SourceRange) -> Self {
        Self::new(RplParseErrorKind::SyntaxError, message, range)
    }

    pub fn lex_error_from(message: &str, range: SourceRange) -> Self {
        Self::new(RplParseErrorKind::LexError, message, range)
    }

    pub fn to_diagnostic(&self, text: &str) -> Diagnostic {
        let (line, column) = self.range.line_col(text);
        Diagnostic::parser(self.message.clone()).at(line, column)
    }
}

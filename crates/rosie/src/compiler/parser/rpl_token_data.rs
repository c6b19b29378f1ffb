use crate::compiler::parser::{rpl_token_kind::RplTokenKind, text_range::SourceRange};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RplTokenData {
    pub kind: RplTokenKind,
    pub range: SourceRange,
}

impl RplTokenData {
    pub fn new(kind: RplTokenKind, range: SourceRange) -> Self {
        RplTokenData { kind, range }
    }
}

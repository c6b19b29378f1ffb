use crate::compiler::parser::SourceRange;
use smol_str::SmolStr;

/// Pattern expression as written, before name resolution.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// String literal with escapes already decoded
    Literal(Vec<u8>),
    /// Bracket expression, raw text including the outer brackets
    Charset(String, SourceRange),
    Any,
    Boundary,
    Start,
    End,
    Ref(SmolStr, SourceRange),
    Seq(Vec<Expr>),
    Choice(Vec<Expr>),
    Group {
        expr: Box<Expr>,
        cooked: bool,
    },
    Repeat {
        expr: Box<Expr>,
        min: u32,
        max: Option<u32>,
    },
    Not(Box<Expr>),
    Ahead(Box<Expr>),
    Macro {
        name: SmolStr,
        arg: Box<Expr>,
        range: SourceRange,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct ImportSpec {
    /// Package path as written: `net` or `"my/lib/pkg"`
    pub path: SmolStr,
    pub as_name: Option<SmolStr>,
    pub range: SourceRange,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Statement {
    Import(Vec<ImportSpec>),
    Binding {
        local: bool,
        alias: bool,
        name: SmolStr,
        expr: Expr,
        range: SourceRange,
    },
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Block {
    pub package: Option<SmolStr>,
    pub statements: Vec<Statement>,
}

use core::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u16)]
pub enum RplTokenKind {
    None,
    // KeyWord
    TkPackage,
    TkImport,
    TkAs,
    TkLocal,
    TkAlias,

    TkWhitespace, // whitespace
    TkEndOfLine,  // end of line
    TkComment,    // -- comment

    TkDot,       // .
    TkSlash,     // /
    TkStar,      // *
    TkPlus,      // +
    TkQuestion,  // ?
    TkNot,       // !
    TkGt,        // >
    TkCaret,     // ^
    TkDollar,    // $
    TkTilde,     // ~
    TkAssign,    // =
    TkColon,     // :
    TkComma,     // ,
    TkSemicolon, // ;

    TkLeftParen,  // (
    TkRightParen, // )
    TkLeftBrace,  // {
    TkRightBrace, // }

    TkInt,     // int
    TkName,    // name, possibly qualified (pkg.name)
    TkString,  // "string"
    TkCharset, // [...]
    TkEof,     // eof

    TkUnknown, // unknown
}

impl fmt::Display for RplTokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            RplTokenKind::None => "<none>",
            RplTokenKind::TkPackage => "'package'",
            RplTokenKind::TkImport => "'import'",
            RplTokenKind::TkAs => "'as'",
            RplTokenKind::TkLocal => "'local'",
            RplTokenKind::TkAlias => "'alias'",
            RplTokenKind::TkWhitespace => "whitespace",
            RplTokenKind::TkEndOfLine => "end of line",
            RplTokenKind::TkComment => "comment",
            RplTokenKind::TkDot => "'.'",
            RplTokenKind::TkSlash => "'/'",
            RplTokenKind::TkStar => "'*'",
            RplTokenKind::TkPlus => "'+'",
            RplTokenKind::TkQuestion => "'?'",
            RplTokenKind::TkNot => "'!'",
            RplTokenKind::TkGt => "'>'",
            RplTokenKind::TkCaret => "'^'",
            RplTokenKind::TkDollar => "'$'",
            RplTokenKind::TkTilde => "'~'",
            RplTokenKind::TkAssign => "'='",
            RplTokenKind::TkColon => "':'",
            RplTokenKind::TkComma => "','",
            RplTokenKind::TkSemicolon => "';'",
            RplTokenKind::TkLeftParen => "'('",
            RplTokenKind::TkRightParen => "')'",
            RplTokenKind::TkLeftBrace => "'{'",
            RplTokenKind::TkRightBrace => "'}'",
            RplTokenKind::TkInt => "integer",
            RplTokenKind::TkName => "identifier",
            RplTokenKind::TkString => "string literal",
            RplTokenKind::TkCharset => "character set",
            RplTokenKind::TkEof => "end of input",
            RplTokenKind::TkUnknown => "unknown token",
        };
        write!(f, "{}", text)
    }
}

impl RplTokenKind {
    pub fn is_trivia(self) -> bool {
        matches!(
            self,
            RplTokenKind::TkWhitespace | RplTokenKind::TkEndOfLine | RplTokenKind::TkComment
        )
    }
}

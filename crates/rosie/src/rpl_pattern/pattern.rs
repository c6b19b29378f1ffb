// Compiled pattern tree
// The compiler resolves every name before producing one of these; bindings
// shared between patterns are held behind `Arc` so a pattern outlives any
// later redefinition of the names it was compiled from.

use smol_str::SmolStr;
use std::fmt;
use std::sync::Arc;

#[derive(Debug, Clone)]
pub enum Pattern {
    /// Exact byte string
    Literal(Box<[u8]>),
    /// Case-insensitive ASCII literal, stored lowercased
    LiteralCi(Box<[u8]>),
    /// Any single UTF-8 character (or one byte of invalid UTF-8)
    Any,
    Set(CharSet),
    Seq(Vec<Pattern>),
    /// Ordered choice: first alternative that matches wins
    Choice(Vec<Pattern>),
    /// Greedy, possessive repetition
    Repeat {
        pattern: Box<Pattern>,
        min: u32,
        max: Option<u32>,
    },
    Not(Box<Pattern>),
    Ahead(Box<Pattern>),
    /// Token boundary `~`
    Boundary,
    Start,
    End,
    /// Named capture; produces a match node
    Capture {
        name: SmolStr,
        pattern: Arc<Pattern>,
    },
    /// Reference to an alias binding; matches without capturing
    Alias {
        name: SmolStr,
        pattern: Arc<Pattern>,
    },
    /// `find:` scans forward for the first match; `findall:` repeats that
    Find {
        pattern: Box<Pattern>,
        all: bool,
    },
}

/// A bracket expression.
#[derive(Debug, Clone, PartialEq)]
pub struct CharSet {
    pub items: Vec<SetItem>,
    pub negated: bool,
}

impl CharSet {
    pub fn matches(&self, c: char) -> bool {
        self.items.iter().any(|item| item.matches(c)) != self.negated
    }
}

/// An item inside a bracket expression
#[derive(Debug, Clone, PartialEq)]
pub enum SetItem {
    Char(char),
    Range(char, char),
    Class(CharClass),
    InvertedClass(CharClass),
    Nested(CharSet),
}

impl SetItem {
    pub fn matches(&self, c: char) -> bool {
        match self {
            SetItem::Char(ch) => c == *ch,
            SetItem::Range(start, end) => c >= *start && c <= *end,
            SetItem::Class(class) => class.matches(c),
            SetItem::InvertedClass(class) => !class.matches(c),
            SetItem::Nested(set) => set.matches(c),
        }
    }
}

/// POSIX named classes, ASCII semantics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CharClass {
    Alpha,
    Digit,
    Alnum,
    Upper,
    Lower,
    Space,
    Punct,
    Xdigit,
    Cntrl,
    Print,
    Graph,
    Word,
    Ascii,
}

impl CharClass {
    pub fn from_name(name: &str) -> Option<CharClass> {
        let class = match name {
            "alpha" => CharClass::Alpha,
            "digit" => CharClass::Digit,
            "alnum" => CharClass::Alnum,
            "upper" => CharClass::Upper,
            "lower" => CharClass::Lower,
            "space" => CharClass::Space,
            "punct" => CharClass::Punct,
            "xdigit" => CharClass::Xdigit,
            "cntrl" => CharClass::Cntrl,
            "print" => CharClass::Print,
            "graph" => CharClass::Graph,
            "word" => CharClass::Word,
            "ascii" => CharClass::Ascii,
            _ => return None,
        };
        Some(class)
    }

    pub fn name(&self) -> &'static str {
        match self {
            CharClass::Alpha => "alpha",
            CharClass::Digit => "digit",
            CharClass::Alnum => "alnum",
            CharClass::Upper => "upper",
            CharClass::Lower => "lower",
            CharClass::Space => "space",
            CharClass::Punct => "punct",
            CharClass::Xdigit => "xdigit",
            CharClass::Cntrl => "cntrl",
            CharClass::Print => "print",
            CharClass::Graph => "graph",
            CharClass::Word => "word",
            CharClass::Ascii => "ascii",
        }
    }

    pub fn matches(&self, c: char) -> bool {
        match self {
            CharClass::Alpha => c.is_ascii_alphabetic(),
            CharClass::Digit => c.is_ascii_digit(),
            CharClass::Alnum => c.is_ascii_alphanumeric(),
            CharClass::Upper => c.is_ascii_uppercase(),
            CharClass::Lower => c.is_ascii_lowercase(),
            CharClass::Space => c.is_ascii_whitespace() || c == '\x0b',
            CharClass::Punct => c.is_ascii_punctuation(),
            CharClass::Xdigit => c.is_ascii_hexdigit(),
            CharClass::Cntrl => c.is_ascii_control(),
            CharClass::Print => c.is_ascii_graphic() || c == ' ',
            CharClass::Graph => c.is_ascii_graphic(),
            CharClass::Word => c.is_ascii_alphanumeric() || c == '_',
            CharClass::Ascii => c.is_ascii(),
        }
    }
}

impl Pattern {
    /// Approximate heap footprint in bytes, charged to the session's allocation usage.
    /// Shared bindings behind `Arc` are charged when they are bound, not here.
    pub fn footprint(&self) -> usize {
        let node = std::mem::size_of::<Pattern>();
        node + match self {
            Pattern::Literal(bytes) | Pattern::LiteralCi(bytes) => bytes.len(),
            Pattern::Set(set) => set.footprint(),
            Pattern::Seq(items) | Pattern::Choice(items) => {
                items.iter().map(Pattern::footprint).sum()
            }
            Pattern::Repeat { pattern, .. }
            | Pattern::Not(pattern)
            | Pattern::Ahead(pattern)
            | Pattern::Find { pattern, .. } => pattern.footprint(),
            Pattern::Capture { name, .. } | Pattern::Alias { name, .. } => name.len(),
            Pattern::Any | Pattern::Boundary | Pattern::Start | Pattern::End => 0,
        }
    }

    /// True when the pattern is a single named capture.
    pub fn is_capture(&self) -> bool {
        matches!(self, Pattern::Capture { .. })
    }
}

impl CharSet {
    fn footprint(&self) -> usize {
        self.items
            .iter()
            .map(|item| match item {
                SetItem::Nested(set) => std::mem::size_of::<SetItem>() + set.footprint(),
                _ => std::mem::size_of::<SetItem>(),
            })
            .sum()
    }
}

fn write_literal(f: &mut fmt::Formatter<'_>, bytes: &[u8]) -> fmt::Result {
    write!(f, "\"")?;
    for &b in bytes {
        match b {
            b'"' => write!(f, "\\\"")?,
            b'\\' => write!(f, "\\\\")?,
            b'\n' => write!(f, "\\n")?,
            b'\r' => write!(f, "\\r")?,
            b'\t' => write!(f, "\\t")?,
            0x20..=0x7e => write!(f, "{}", b as char)?,
            _ => write!(f, "\\x{:02x}", b)?,
        }
    }
    write!(f, "\"")
}

fn write_set_char(f: &mut fmt::Formatter<'_>, c: char) -> fmt::Result {
    match c {
        ']' | '[' | '\\' | '^' | '-' => write!(f, "\\{}", c),
        '\n' => write!(f, "\\n"),
        '\t' => write!(f, "\\t"),
        '\r' => write!(f, "\\r"),
        _ => write!(f, "{}", c),
    }
}

impl fmt::Display for CharSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let [item] = self.items.as_slice()
            && !self.negated
        {
            match item {
                SetItem::Class(class) => return write!(f, "[:{}:]", class.name()),
                SetItem::InvertedClass(class) => return write!(f, "[:^{}:]", class.name()),
                _ => {}
            }
        }
        write!(f, "[")?;
        if self.negated {
            write!(f, "^")?;
        }
        for item in &self.items {
            match item {
                SetItem::Char(c) => write_set_char(f, *c)?,
                SetItem::Range(a, b) => {
                    write_set_char(f, *a)?;
                    write!(f, "-")?;
                    write_set_char(f, *b)?;
                }
                SetItem::Class(class) => write!(f, "[:{}:]", class.name())?,
                SetItem::InvertedClass(class) => write!(f, "[:^{}:]", class.name())?,
                SetItem::Nested(set) => write!(f, "{}", set)?,
            }
        }
        write!(f, "]")
    }
}

impl fmt::Display for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Pattern::Literal(bytes) => write_literal(f, bytes),
            Pattern::LiteralCi(bytes) => {
                write!(f, "ci:")?;
                write_literal(f, bytes)
            }
            Pattern::Any => write!(f, "."),
            Pattern::Set(set) => write!(f, "{}", set),
            Pattern::Seq(items) => {
                write!(f, "{{")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, " ")?;
                    }
                    write!(f, "{}", item)?;
                }
                write!(f, "}}")
            }
            Pattern::Choice(items) => {
                write!(f, "{{")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, " / ")?;
                    }
                    write!(f, "{}", item)?;
                }
                write!(f, "}}")
            }
            Pattern::Repeat { pattern, min, max } => match (min, max) {
                (0, None) => write!(f, "{}*", pattern),
                (1, None) => write!(f, "{}+", pattern),
                (0, Some(1)) => write!(f, "{}?", pattern),
                (min, None) => write!(f, "{}{{{},}}", pattern, min),
                (min, Some(max)) if min == max => write!(f, "{}{{{}}}", pattern, min),
                (min, Some(max)) => write!(f, "{}{{{},{}}}", pattern, min, max),
            },
            Pattern::Not(pattern) => write!(f, "!{}", pattern),
            Pattern::Ahead(pattern) => write!(f, ">{}", pattern),
            Pattern::Boundary => write!(f, "~"),
            Pattern::Start => write!(f, "^"),
            Pattern::End => write!(f, "$"),
            Pattern::Capture { name, .. } | Pattern::Alias { name, .. } => write!(f, "{}", name),
            Pattern::Find { pattern, all } => {
                if *all {
                    write!(f, "findall:{}", pattern)
                } else {
                    write!(f, "find:{}", pattern)
                }
            }
        }
    }
}

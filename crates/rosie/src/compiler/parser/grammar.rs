use crate::compiler::ast::{Block, Expr, ImportSpec, Statement};
use crate::compiler::parser::{RplParseError, RplParser, RplTokenKind, SourceRange};
use crate::rosie_vm::rosie_limits::MAXCCALLS_PARSER;
use smol_str::SmolStr;

type ParseResult<T> = Result<T, RplParseError>;

impl<'a> RplParser<'a> {
    // block -> [package NAME] { statement [';'] }
    pub fn parse_block(&mut self) -> ParseResult<Block> {
        let mut block = Block::default();

        if self.current_token() == RplTokenKind::TkPackage {
            self.bump();
            if self.current_token() != RplTokenKind::TkName {
                return Err(self.syntax_error("expected a package name after 'package'"));
            }
            let name = self.current_token_text();
            if name.contains('.') {
                return Err(self.syntax_error("package name must not be qualified"));
            }
            block.package = Some(SmolStr::new(name));
            self.bump();
        }

        loop {
            while self.current_token() == RplTokenKind::TkSemicolon {
                self.bump();
            }
            match self.current_token() {
                RplTokenKind::TkEof => break,
                RplTokenKind::TkImport => {
                    let specs = self.parse_import()?;
                    block.statements.push(Statement::Import(specs));
                }
                RplTokenKind::TkPackage => {
                    return Err(self.syntax_error("package declaration must come first"));
                }
                _ => {
                    let stat = self.parse_binding()?;
                    block.statements.push(stat);
                }
            }
        }

        Ok(block)
    }

    /// A whole input that must be exactly one expression.
    pub fn parse_expression(&mut self) -> ParseResult<Expr> {
        if self.current_token() == RplTokenKind::TkEof {
            return Err(self.syntax_error("empty pattern expression"));
        }
        let expr = self.parse_choice()?;
        if self.current_token() != RplTokenKind::TkEof {
            return Err(self.syntax_error(&format!(
                "unexpected {} after expression",
                self.current_token()
            )));
        }
        Ok(expr)
    }

    // import -> 'import' spec {',' spec}; spec -> (NAME | STRING) ['as' NAME]
    fn parse_import(&mut self) -> ParseResult<Vec<ImportSpec>> {
        self.bump(); // 'import'
        let mut specs = vec![];
        loop {
            let range = self.current_token_range();
            let path = match self.current_token() {
                RplTokenKind::TkName => SmolStr::new(self.current_token_text()),
                RplTokenKind::TkString => {
                    let bytes = decode_string(self.current_token_text(), range)?;
                    match String::from_utf8(bytes) {
                        Ok(s) => SmolStr::new(s),
                        Err(_) => {
                            return Err(RplParseError::syntax_error_from(
                                "import path is not valid UTF-8",
                                range,
                            ));
                        }
                    }
                }
                _ => return Err(self.syntax_error("expected a package name to import")),
            };
            self.bump();

            let mut as_name = None;
            if self.current_token() == RplTokenKind::TkAs {
                self.bump();
                if self.current_token() != RplTokenKind::TkName
                    || self.current_token_text().contains('.')
                {
                    return Err(self.syntax_error("expected an unqualified name after 'as'"));
                }
                as_name = Some(SmolStr::new(self.current_token_text()));
                self.bump();
            }
            specs.push(ImportSpec {
                path,
                as_name,
                range,
            });

            if self.current_token() != RplTokenKind::TkComma {
                break;
            }
            self.bump();
        }
        Ok(specs)
    }

    // binding -> ['local'] ['alias'] NAME '=' expression
    fn parse_binding(&mut self) -> ParseResult<Statement> {
        let start = self.current_token_range();
        let mut local = false;
        let mut alias = false;
        if self.current_token() == RplTokenKind::TkLocal {
            local = true;
            self.bump();
        }
        if self.current_token() == RplTokenKind::TkAlias {
            alias = true;
            self.bump();
        }
        if self.current_token() != RplTokenKind::TkName {
            return Err(self.syntax_error(&format!(
                "expected a binding, found {}",
                self.current_token()
            )));
        }
        let name = self.current_token_text();
        if name.contains('.') {
            return Err(self.syntax_error("cannot bind a qualified name"));
        }
        let name = SmolStr::new(name);
        self.bump();
        self.expect(RplTokenKind::TkAssign)?;
        let expr = self.parse_choice()?;
        let range = start.merge(&self.current_token_range());
        Ok(Statement::Binding {
            local,
            alias,
            name,
            expr,
            range,
        })
    }

    // choice -> seq {'/' seq}
    fn parse_choice(&mut self) -> ParseResult<Expr> {
        self.depth += 1;
        if self.depth > MAXCCALLS_PARSER {
            return Err(self.syntax_error("expression nested too deeply"));
        }

        let mut alternatives = vec![self.parse_seq()?];
        while self.current_token() == RplTokenKind::TkSlash {
            self.bump();
            alternatives.push(self.parse_seq()?);
        }

        self.depth -= 1;
        if alternatives.len() == 1 {
            Ok(alternatives.pop().unwrap_or(Expr::Seq(vec![])))
        } else {
            Ok(Expr::Choice(alternatives))
        }
    }

    fn seq_ends_here(&self) -> bool {
        match self.current_token() {
            RplTokenKind::TkEof
            | RplTokenKind::TkSemicolon
            | RplTokenKind::TkSlash
            | RplTokenKind::TkRightParen
            | RplTokenKind::TkRightBrace
            | RplTokenKind::TkLocal
            | RplTokenKind::TkAlias
            | RplTokenKind::TkImport
            | RplTokenKind::TkPackage => true,
            // the start of the next binding
            RplTokenKind::TkName => self.peek_next_token() == RplTokenKind::TkAssign,
            _ => false,
        }
    }

    fn parse_seq(&mut self) -> ParseResult<Expr> {
        let mut items = vec![];
        while !self.seq_ends_here() {
            items.push(self.parse_item()?);
        }
        match items.len() {
            0 => Err(self.syntax_error(&format!(
                "expected an expression, found {}",
                self.current_token()
            ))),
            1 => Ok(items.pop().unwrap_or(Expr::Seq(vec![]))),
            _ => Ok(Expr::Seq(items)),
        }
    }

    // item -> ('!' | '>') item | atom {quantifier}
    fn parse_item(&mut self) -> ParseResult<Expr> {
        match self.current_token() {
            RplTokenKind::TkNot => {
                self.bump();
                return Ok(Expr::Not(Box::new(self.parse_item()?)));
            }
            RplTokenKind::TkGt => {
                self.bump();
                return Ok(Expr::Ahead(Box::new(self.parse_item()?)));
            }
            _ => {}
        }

        let mut expr = self.parse_atom()?;
        loop {
            let (min, max) = match self.current_token() {
                RplTokenKind::TkStar => (0, None),
                RplTokenKind::TkPlus => (1, None),
                RplTokenKind::TkQuestion => (0, Some(1)),
                RplTokenKind::TkLeftBrace
                    if matches!(
                        self.peek_next_token(),
                        RplTokenKind::TkInt | RplTokenKind::TkComma
                    ) =>
                {
                    let bounds = self.parse_bounds()?;
                    expr = Expr::Repeat {
                        expr: Box::new(expr),
                        min: bounds.0,
                        max: bounds.1,
                    };
                    continue;
                }
                _ => break,
            };
            self.bump();
            expr = Expr::Repeat {
                expr: Box::new(expr),
                min,
                max,
            };
        }
        Ok(expr)
    }

    // '{' [INT] [',' [INT]] '}'
    fn parse_bounds(&mut self) -> ParseResult<(u32, Option<u32>)> {
        self.bump(); // '{'
        let mut min = 0;
        let mut max;
        if self.current_token() == RplTokenKind::TkInt {
            min = self.parse_int()?;
        }
        if self.current_token() == RplTokenKind::TkComma {
            self.bump();
            max = None;
            if self.current_token() == RplTokenKind::TkInt {
                max = Some(self.parse_int()?);
            }
        } else {
            max = Some(min);
        }
        let close = self.current_token_range();
        self.expect(RplTokenKind::TkRightBrace)?;
        if let Some(m) = max
            && m < min
        {
            return Err(RplParseError::syntax_error_from(
                &format!("repetition bounds {{{},{}}} are reversed", min, m),
                close,
            ));
        }
        Ok((min, max))
    }

    fn parse_int(&mut self) -> ParseResult<u32> {
        let value = self
            .current_token_text()
            .parse::<u32>()
            .map_err(|_| self.syntax_error("repetition count too large"))?;
        self.bump();
        Ok(value)
    }

    fn parse_atom(&mut self) -> ParseResult<Expr> {
        let range = self.current_token_range();
        match self.current_token() {
            RplTokenKind::TkString => {
                let bytes = decode_string(self.current_token_text(), range)?;
                self.bump();
                Ok(Expr::Literal(bytes))
            }
            RplTokenKind::TkCharset => {
                let text = self.current_token_text().to_string();
                self.bump();
                Ok(Expr::Charset(text, range))
            }
            RplTokenKind::TkDot => {
                self.bump();
                Ok(Expr::Any)
            }
            RplTokenKind::TkTilde => {
                self.bump();
                Ok(Expr::Boundary)
            }
            RplTokenKind::TkCaret => {
                self.bump();
                Ok(Expr::Start)
            }
            RplTokenKind::TkDollar => {
                self.bump();
                Ok(Expr::End)
            }
            RplTokenKind::TkName => {
                let name = SmolStr::new(self.current_token_text());
                if self.peek_next_token() == RplTokenKind::TkColon && self.next_token_is_adjacent()
                {
                    self.bump(); // name
                    self.bump(); // ':'
                    let arg = self.parse_item()?;
                    return Ok(Expr::Macro {
                        name,
                        arg: Box::new(arg),
                        range,
                    });
                }
                self.bump();
                Ok(Expr::Ref(name, range))
            }
            RplTokenKind::TkLeftParen => {
                self.bump();
                let expr = self.parse_choice()?;
                self.expect(RplTokenKind::TkRightParen)?;
                Ok(Expr::Group {
                    expr: Box::new(expr),
                    cooked: true,
                })
            }
            RplTokenKind::TkLeftBrace => {
                self.bump();
                let expr = self.parse_choice()?;
                self.expect(RplTokenKind::TkRightBrace)?;
                Ok(Expr::Group {
                    expr: Box::new(expr),
                    cooked: false,
                })
            }
            kind => Err(self.syntax_error(&format!("unexpected {}", kind))),
        }
    }
}

/// Decode a quoted literal (quotes included) into the bytes it denotes.
pub fn decode_string(token: &str, range: SourceRange) -> ParseResult<Vec<u8>> {
    let inner = token
        .strip_prefix('"')
        .and_then(|s| s.strip_suffix('"'))
        .unwrap_or(token);
    let mut out = Vec::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(ch) = chars.next() {
        if ch != '\\' {
            let mut buf = [0u8; 4];
            out.extend_from_slice(ch.encode_utf8(&mut buf).as_bytes());
            continue;
        }
        match chars.next() {
            Some('"') => out.push(b'"'),
            Some('\\') => out.push(b'\\'),
            Some('n') => out.push(b'\n'),
            Some('r') => out.push(b'\r'),
            Some('t') => out.push(b'\t'),
            Some('x') => {
                let hex: String = chars.by_ref().take(2).collect();
                match u8::from_str_radix(&hex, 16) {
                    Ok(byte) if hex.len() == 2 => out.push(byte),
                    _ => {
                        return Err(RplParseError::syntax_error_from(
                            "invalid \\x escape (two hex digits required)",
                            range,
                        ));
                    }
                }
            }
            Some(other) => {
                return Err(RplParseError::syntax_error_from(
                    &format!("invalid escape sequence '\\{}'", other),
                    range,
                ));
            }
            None => {
                return Err(RplParseError::syntax_error_from(
                    "string ends with a lone backslash",
                    range,
                ));
            }
        }
    }
    Ok(out)
}

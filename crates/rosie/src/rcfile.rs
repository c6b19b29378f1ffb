// Init file parsing
// One option per line, `key = "value"`, `--` comments. The RPL tokenizer
// does the lexing, so quoting and escapes follow pattern source rules.

use crate::compiler::parser::{Reader, RplTokenKind, RplTokenize, SourceRange, decode_string};
use crate::rosie_vm::Diagnostic;
use crate::rosie_vm::rosie_limits::DEFAULT_RCFILE;
use serde::Serialize;
use std::path::{Path, PathBuf};

/// One option of an init file. Serializes as `{"key": "value"}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RcOption {
    /// Replace the library search path
    Libpath(String),
    /// Merge color assignments
    Colors(String),
    /// Load a source file, relative to the init file's directory
    Loadfile(String),
    /// Import a package
    Import(String),
}

impl RcOption {
    pub fn key(&self) -> &'static str {
        match self {
            RcOption::Libpath(_) => "libpath",
            RcOption::Colors(_) => "colors",
            RcOption::Loadfile(_) => "loadfile",
            RcOption::Import(_) => "import",
        }
    }
}

/// Tri-state outcome of reading or executing an init file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RcFile<T> {
    /// No file at the path
    Missing,
    Invalid(Vec<Diagnostic>),
    Valid(T),
}

impl<T> RcFile<T> {
    pub fn is_valid(&self) -> bool {
        matches!(self, RcFile::Valid(_))
    }
}

/// `$HOME/.rosierc`, when HOME is set.
pub fn default_rcfile() -> Option<PathBuf> {
    std::env::var_os("HOME")
        .filter(|home| !home.is_empty())
        .map(|home| Path::new(&home).join(DEFAULT_RCFILE))
}

/// Read `path`; `Ok(None)` when there is no such file.
pub fn read_source(path: &Path) -> Result<Option<String>, Diagnostic> {
    match std::fs::read(path) {
        Ok(bytes) => String::from_utf8(bytes)
            .map(Some)
            .map_err(|_| Diagnostic::loader(format!("{}: not valid UTF-8", path.display()))),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(Diagnostic::loader(format!("{}: {}", path.display(), e))),
    }
}

fn diagnostic_at(message: String, range: SourceRange, text: &str) -> Diagnostic {
    let (line, column) = range.line_col(text);
    Diagnostic::parser(message).at(line, column)
}

/// Parse init file text. Every malformed line is reported.
pub fn parse_rcfile(text: &str) -> Result<Vec<RcOption>, Vec<Diagnostic>> {
    let tokens = RplTokenize::new(Reader::new(text))
        .tokenize()
        .map_err(|e| vec![e.to_diagnostic(text)])?;

    // group significant tokens by line
    let mut lines: Vec<Vec<(RplTokenKind, SourceRange)>> = vec![vec![]];
    for token in tokens {
        match token.kind {
            RplTokenKind::TkEndOfLine | RplTokenKind::TkSemicolon => lines.push(vec![]),
            kind if kind.is_trivia() => {}
            kind => {
                if let Some(line) = lines.last_mut() {
                    line.push((kind, token.range));
                }
            }
        }
    }

    let mut options = Vec::new();
    let mut diagnostics = Vec::new();
    for line in lines.iter().filter(|line| !line.is_empty()) {
        let (key_kind, key_range) = line[0];
        let shape_ok = line.len() == 3
            && matches!(key_kind, RplTokenKind::TkName | RplTokenKind::TkImport)
            && line[1].0 == RplTokenKind::TkAssign
            && line[2].0 == RplTokenKind::TkString;
        if !shape_ok {
            diagnostics.push(diagnostic_at(
                "expected an option of the form key = \"value\"".to_string(),
                key_range,
                text,
            ));
            continue;
        }

        let value_range = line[2].1;
        let quoted = &text[value_range.start_offset..value_range.end_offset()];
        let value = match decode_string(quoted, value_range)
            .ok()
            .and_then(|bytes| String::from_utf8(bytes).ok())
        {
            Some(value) => value,
            None => {
                diagnostics.push(diagnostic_at(
                    "option value is not a valid string".to_string(),
                    value_range,
                    text,
                ));
                continue;
            }
        };

        let key = &text[key_range.start_offset..key_range.end_offset()];
        let option = match key {
            "libpath" => RcOption::Libpath(value),
            "colors" => RcOption::Colors(value),
            "loadfile" => RcOption::Loadfile(value),
            "import" => RcOption::Import(value),
            other => {
                diagnostics.push(diagnostic_at(
                    format!("unknown option '{}'", other),
                    key_range,
                    text,
                ));
                continue;
            }
        };
        options.push(option);
    }

    if diagnostics.is_empty() {
        Ok(options)
    } else {
        Err(diagnostics)
    }
}

/// Options as the JSON list reported across the boundary.
pub fn options_to_json(options: &[RcOption]) -> Vec<u8> {
    serde_json::to_vec(options).unwrap_or_else(|_| b"[]".to_vec())
}

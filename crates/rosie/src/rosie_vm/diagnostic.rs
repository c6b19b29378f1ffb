use serde::{Deserialize, Serialize};
use std::fmt;

/// Stage a diagnostic is attributed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Who {
    Parser,
    Compiler,
    Loader,
}

impl fmt::Display for Who {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Who::Parser => write!(f, "parser"),
            Who::Compiler => write!(f, "compiler"),
            Who::Loader => write!(f, "loader"),
        }
    }
}

/// A structured compile/load/import error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub message: String,
    pub who: Who,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub column: Option<usize>,
}

impl Diagnostic {
    pub fn new(who: Who, message: impl Into<String>) -> Self {
        Diagnostic {
            message: message.into(),
            who,
            line: None,
            column: None,
        }
    }

    pub fn parser(message: impl Into<String>) -> Self {
        Self::new(Who::Parser, message)
    }

    pub fn compiler(message: impl Into<String>) -> Self {
        Self::new(Who::Compiler, message)
    }

    pub fn loader(message: impl Into<String>) -> Self {
        Self::new(Who::Loader, message)
    }

    pub fn at(mut self, line: usize, column: usize) -> Self {
        self.line = Some(line);
        self.column = Some(column);
        self
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.line, self.column) {
            (Some(line), Some(column)) => {
                write!(f, "{} error at {}:{}: {}", self.who, line, column, self.message)
            }
            _ => write!(f, "{} error: {}", self.who, self.message),
        }
    }
}

/// Serialize a diagnostics list the way it crosses the boundary: a JSON array.
pub fn diagnostics_to_json(diagnostics: &[Diagnostic]) -> Vec<u8> {
    // Serializing plain strings and enums cannot fail
    serde_json::to_vec(diagnostics).unwrap_or_else(|_| b"[]".to_vec())
}

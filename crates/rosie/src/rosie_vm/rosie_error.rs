use crate::rosie_vm::diagnostic::Diagnostic;
use std::path::PathBuf;
use thiserror::Error;

/// Errors surfaced by engine operations.
///
/// Application-level outcomes (a pattern that does not match, a load that
/// produced diagnostics) are data, not errors; see `MatchResult` and
/// `LoadOutcome`. These variants cover everything else.
#[derive(Debug, Error)]
pub enum RosieError {
    /// Session creation failed
    #[error("cannot initialize engine: {0}")]
    Initialization(String),

    #[error("compilation failed ({} diagnostics)", .0.len())]
    Compile(Vec<Diagnostic>),

    #[error("load failed ({} diagnostics)", .0.len())]
    Load(Vec<Diagnostic>),

    #[error("import failed ({} diagnostics)", .0.len())]
    Import(Vec<Diagnostic>),

    /// Use of a freed, never-allocated or sentinel pattern id
    #[error("invalid compiled pattern {0} (already freed?)")]
    InvalidHandle(u32),

    #[error("invalid encoder: {0}")]
    InvalidEncoder(String),

    #[error("invalid trace style: {0}")]
    InvalidTraceStyle(String),

    #[error("{path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A match aborted while processing record `record` (1-based) of a file
    #[error("match aborted on record {record}")]
    Abend { record: u64 },

    #[error("allocation limit {requested} KB is below the minimum of {minimum} KB")]
    AllocLimit { requested: i64, minimum: u32 },

    /// A contract violation inside the engine; report, do not retry
    #[error("internal error: {0}")]
    Internal(String),
}

impl RosieError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        RosieError::Io {
            path: path.into(),
            source,
        }
    }

    /// Diagnostics carried by compile/load/import failures.
    pub fn diagnostics(&self) -> Option<&[Diagnostic]> {
        match self {
            RosieError::Compile(d) | RosieError::Load(d) | RosieError::Import(d) => Some(d),
            _ => None,
        }
    }
}

pub type RosieResult<T> = Result<T, RosieError>;

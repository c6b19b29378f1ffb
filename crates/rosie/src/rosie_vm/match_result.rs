use crate::rosie_buffer::ByteBuffer;
use crate::rosie_vm::{Diagnostic, RosieError, RosieResult};
use std::time::Duration;

/// Outcome of one match attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchResult {
    pub matched: bool,
    /// Encoded match; `None` on no-match, abend, or for encoders without payload
    pub data: Option<ByteBuffer>,
    /// Input bytes left unconsumed, counted from the start offset
    pub leftover: i32,
    /// The attempt was aborted by the engine, not rejected by the pattern
    pub abend: bool,
    /// Microseconds spent in the whole call
    pub total_time: i32,
    /// Microseconds spent in the matcher proper
    pub match_time: i32,
}

impl MatchResult {
    pub(crate) fn no_match(leftover: usize, abend: bool) -> Self {
        MatchResult {
            matched: false,
            data: None,
            leftover: clamp_i32(leftover),
            abend,
            total_time: 0,
            match_time: 0,
        }
    }

    pub fn data_bytes(&self) -> &[u8] {
        self.data.as_ref().map(ByteBuffer::as_bytes).unwrap_or(&[])
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TraceResult {
    pub matched: bool,
    pub abend: bool,
    /// Never empty
    pub text: String,
}

/// Session allocation limit and current usage, in kilobytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AllocLimit {
    /// Zero means unlimited
    pub limit_kb: u32,
    pub usage_kb: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum LoadKind {
    Load,
    Import,
}

/// Outcome of `load`, `load_file` and `import`.
///
/// Failure leaves every statement that did succeed in effect.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadOutcome {
    pub ok: bool,
    /// Package declared by the source, or the actual name of an imported package
    pub package: Option<String>,
    pub diagnostics: Vec<Diagnostic>,
    pub(crate) kind: LoadKind,
}

impl LoadOutcome {
    pub(crate) fn new(kind: LoadKind, package: Option<String>, diagnostics: Vec<Diagnostic>) -> Self {
        LoadOutcome {
            ok: diagnostics.is_empty(),
            package,
            diagnostics,
            kind,
        }
    }

    /// The package name on success, `Load`/`Import` error otherwise.
    pub fn into_result(self) -> RosieResult<Option<String>> {
        if self.ok {
            return Ok(self.package);
        }
        match self.kind {
            LoadKind::Load => Err(RosieError::Load(self.diagnostics)),
            LoadKind::Import => Err(RosieError::Import(self.diagnostics)),
        }
    }
}

pub(crate) fn clamp_i32(value: usize) -> i32 {
    i32::try_from(value).unwrap_or(i32::MAX)
}

pub(crate) fn micros(elapsed: Duration) -> i32 {
    i32::try_from(elapsed.as_micros()).unwrap_or(i32::MAX)
}

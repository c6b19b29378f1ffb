use crate::rosie_vm::rosie_limits::{MAX_TRACE_EVENTS, TRACE_INPUT_PREVIEW};
use crate::rosie_vm::{RosieError, RosieResult};
use crate::rpl_pattern::pattern::Pattern;
use serde::Serialize;
use std::fmt::Write;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TraceStyle {
    /// One line per named pattern attempted
    Condensed,
    /// Every sub-expression attempted, indented by depth
    Full,
    Json,
}

impl TraceStyle {
    pub fn from_name(name: &str) -> RosieResult<TraceStyle> {
        match name {
            "condensed" => Ok(TraceStyle::Condensed),
            "full" => Ok(TraceStyle::Full),
            "json" => Ok(TraceStyle::Json),
            other => Err(RosieError::InvalidTraceStyle(other.to_string())),
        }
    }
}

#[derive(Debug, Clone)]
pub struct TraceEvent {
    pub depth: usize,
    pub label: String,
    /// 0-based start offset
    pub start: usize,
    pub end: Option<usize>,
}

/// Attempts recorded while matching with tracing enabled.
#[derive(Debug, Default)]
pub struct TraceLog {
    full: bool,
    pub events: Vec<TraceEvent>,
    pub dropped: usize,
}

impl TraceLog {
    pub fn new(style: TraceStyle) -> Self {
        TraceLog {
            full: style != TraceStyle::Condensed,
            events: Vec::new(),
            dropped: 0,
        }
    }

    pub(crate) fn enter(&mut self, p: &Pattern, depth: usize, start: usize) -> Option<usize> {
        let label = match p {
            Pattern::Capture { name, .. } | Pattern::Alias { name, .. } => name.to_string(),
            _ if self.full => truncate_label(p.to_string()),
            _ => return None,
        };
        if self.events.len() >= MAX_TRACE_EVENTS {
            self.dropped += 1;
            return None;
        }
        self.events.push(TraceEvent {
            depth,
            label,
            start,
            end: None,
        });
        Some(self.events.len() - 1)
    }

    pub(crate) fn leave(&mut self, index: usize, end: Option<usize>) {
        if let Some(event) = self.events.get_mut(index) {
            event.end = end;
        }
    }
}

fn truncate_label(mut label: String) -> String {
    if label.chars().count() > TRACE_INPUT_PREVIEW {
        label = label.chars().take(TRACE_INPUT_PREVIEW).collect();
        label.push_str("...");
    }
    label
}

/// What a finished trace is rendered from.
pub struct TraceReport<'a> {
    pub expression: &'a str,
    pub input: &'a [u8],
    /// 0-based
    pub start: usize,
    pub end: Option<usize>,
    pub abend: bool,
    pub log: &'a TraceLog,
}

#[derive(Serialize)]
struct JsonEvent<'a> {
    depth: usize,
    expr: &'a str,
    s: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    e: Option<usize>,
    matched: bool,
}

#[derive(Serialize)]
struct JsonTrace<'a> {
    expression: &'a str,
    input: String,
    start: usize,
    matched: bool,
    abend: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    end: Option<usize>,
    events: Vec<JsonEvent<'a>>,
    dropped: usize,
}

impl TraceReport<'_> {
    pub fn render(&self, style: TraceStyle) -> String {
        match style {
            TraceStyle::Json => self.render_json(),
            TraceStyle::Condensed | TraceStyle::Full => self.render_text(style),
        }
    }

    fn preview(&self) -> String {
        let rest = self.input.get(self.start..).unwrap_or(&[]);
        let text = String::from_utf8_lossy(rest);
        truncate_label(text.escape_debug().to_string())
    }

    fn render_text(&self, style: TraceStyle) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "Expression: {}", self.expression);
        let _ = writeln!(out, "Input: \"{}\" (from position {})", self.preview(), self.start + 1);
        match self.end {
            Some(end) => {
                let _ = writeln!(out, "Matched: yes, {}..{}", self.start + 1, end);
            }
            None if self.abend => {
                let _ = writeln!(out, "Matched: no (match aborted)");
            }
            None => {
                let _ = writeln!(out, "Matched: no");
            }
        }

        for event in &self.log.events {
            let indent = match style {
                TraceStyle::Full => event.depth * 2,
                _ => 0,
            };
            let _ = match event.end {
                Some(end) => writeln!(
                    out,
                    "{:indent$}{} matched {}..{}",
                    "",
                    event.label,
                    event.start + 1,
                    end,
                    indent = indent
                ),
                None => writeln!(
                    out,
                    "{:indent$}{} failed at {}",
                    "",
                    event.label,
                    event.start + 1,
                    indent = indent
                ),
            };
        }
        if self.log.dropped > 0 {
            let _ = writeln!(out, "... {} further attempts not shown", self.log.dropped);
        }
        out
    }

    fn render_json(&self) -> String {
        let doc = JsonTrace {
            expression: self.expression,
            input: String::from_utf8_lossy(self.input).into_owned(),
            start: self.start + 1,
            matched: self.end.is_some(),
            abend: self.abend,
            end: self.end.map(|e| e + 1),
            events: self
                .log
                .events
                .iter()
                .map(|ev| JsonEvent {
                    depth: ev.depth,
                    expr: &ev.label,
                    s: ev.start + 1,
                    e: ev.end.map(|e| e + 1),
                    matched: ev.end.is_some(),
                })
                .collect(),
            dropped: self.log.dropped,
        };
        serde_json::to_string(&doc).unwrap_or_else(|e| format!("{{\"error\":\"{}\"}}", e))
    }
}

// Rosie matching engine session
// One `Engine` owns a pattern environment, a table of compiled patterns and
// the session-wide settings (library path, allocation limit, colors).
// Operations lock the session for their whole duration; independent
// sessions share nothing.
mod config_entry;
mod diagnostic;
mod engine_option;
mod match_result;
mod rosie_error;
pub mod rosie_limits;
mod rplx;
mod rplx_table;

pub use config_entry::{ConfigEntry, EngineConfig, RPL_VERSION};
pub use diagnostic::{Diagnostic, Who, diagnostics_to_json};
pub use engine_option::EngineOption;
pub use match_result::{AllocLimit, LoadOutcome, MatchResult, TraceResult};
pub use rosie_error::{RosieError, RosieResult};
pub use rplx::Rplx;
pub use rplx_table::{CompiledPattern, PatternId, RplxTable};

use crate::compiler::{Environment, RplCompiler};
use crate::encoder::{ColorMap, EncodeContext, Encoder, EncoderRegistry};
use crate::matchfile::{MatchFileCounts, MatchFileRequest, RecordOutcome, match_stream};
use crate::package::{self, PackageSearcher};
use crate::rcfile::{self, RcFile, RcOption};
use crate::rosie_buffer::ByteBuffer;
use crate::rosie_vm::match_result::{LoadKind, clamp_i32, micros};
use crate::rosie_vm::rosie_limits::*;
use crate::rpl_pattern::{
    MatchLimits, MatchNode, TraceLog, TraceReport, TraceStyle, match_pattern,
};
use chrono::{DateTime, Local};
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Instant;
use tracing::{debug, warn};

/// Session state shared between the `Engine` and the `Rplx` handles it hands out.
pub(crate) struct EngineState {
    env: Environment,
    patterns: RplxTable,
    encoders: EncoderRegistry,
    colors: ColorMap,
    libpath: String,
    searcher: PackageSearcher,
    alloc_limit_kb: u32,
    max_match_depth: usize,
    created: DateTime<Local>,
}

pub(crate) fn lock_state(state: &Mutex<EngineState>) -> RosieResult<MutexGuard<'_, EngineState>> {
    state
        .lock()
        .map_err(|_| RosieError::Internal("engine session lock poisoned".to_string()))
}

/// A matching engine session.
///
/// Dropping the engine (or calling [`Engine::finalize`]) frees every pattern
/// compiled in it; `Rplx` handles still held elsewhere fail with
/// `InvalidHandle` from then on.
pub struct Engine {
    state: Arc<Mutex<EngineState>>,
}

// A match that ran to completion, before encoding
struct RawMatch {
    node: Option<MatchNode>,
    end: Option<usize>,
    abend: bool,
    match_time: i32,
}

impl Engine {
    pub fn new(option: EngineOption) -> RosieResult<Engine> {
        if option.alloc_limit_kb != 0 && option.alloc_limit_kb < MIN_ALLOC_LIMIT_KB {
            return Err(RosieError::Initialization(format!(
                "allocation limit {} KB is below the minimum of {} KB",
                option.alloc_limit_kb, MIN_ALLOC_LIMIT_KB
            )));
        }
        if option.max_match_depth == 0 {
            return Err(RosieError::Initialization(
                "maximum match depth must be positive".to_string(),
            ));
        }

        let mut colors = ColorMap::default();
        if let Some(spec) = &option.colors {
            colors
                .merge(spec)
                .map_err(|e| RosieError::Initialization(format!("bad color map: {}", e)))?;
        }

        let libpath = package::resolve_libpath(&option);
        let state = EngineState {
            env: Environment::new(),
            patterns: RplxTable::new(),
            encoders: EncoderRegistry::with_builtins(),
            colors,
            searcher: PackageSearcher::new(&libpath),
            libpath,
            alloc_limit_kb: option.alloc_limit_kb,
            max_match_depth: option.max_match_depth,
            created: Local::now(),
        };
        debug!(libpath = %state.libpath, alloc_limit_kb = state.alloc_limit_kb, "engine created");

        Ok(Engine {
            state: Arc::new(Mutex::new(state)),
        })
    }

    fn lock(&self) -> RosieResult<MutexGuard<'_, EngineState>> {
        lock_state(&self.state)
    }

    /// Free every pattern, then the session itself.
    pub fn finalize(self) {
        drop(self);
    }

    pub fn config(&self) -> RosieResult<EngineConfig> {
        Ok(self.lock()?.config())
    }

    pub fn libpath(&self) -> RosieResult<String> {
        Ok(self.lock()?.libpath.clone())
    }

    pub fn set_libpath(&self, libpath: &str) -> RosieResult<()> {
        self.lock()?.set_libpath(libpath);
        Ok(())
    }

    /// Set the allocation limit in KB. Zero removes the limit; nonzero values
    /// below `MIN_ALLOC_LIMIT_KB` are rejected.
    pub fn set_alloc_limit(&self, kb: i64) -> RosieResult<()> {
        self.lock()?.set_alloc_limit(kb)
    }

    pub fn alloc_limit(&self) -> RosieResult<AllocLimit> {
        Ok(self.lock()?.alloc_limit())
    }

    /// Compile `expression`. Failure carries the diagnostics and leaves the
    /// pattern table untouched.
    pub fn compile(&self, expression: &[u8]) -> RosieResult<PatternId> {
        self.lock()?.compile(expression).map(|(id, _)| id)
    }

    /// Compile into an owning handle that frees itself on drop.
    pub fn compile_rplx(&self, expression: &[u8]) -> RosieResult<Rplx> {
        let (id, generation) = self.lock()?.compile(expression)?;
        Ok(Rplx::new(id, generation, Arc::downgrade(&self.state)))
    }

    pub fn free_pattern(&self, id: PatternId) -> RosieResult<()> {
        self.lock()?.free_pattern(id)
    }

    pub fn pattern_count(&self) -> RosieResult<usize> {
        Ok(self.lock()?.patterns.len())
    }

    /// Match `input` from the 1-based `start` offset and encode the result.
    pub fn match_input(
        &self,
        id: PatternId,
        input: &[u8],
        start: i32,
        encoder: &str,
    ) -> RosieResult<MatchResult> {
        self.lock()?.match_input(id, input, start, encoder)
    }

    pub fn trace(&self, id: PatternId, input: &[u8], start: i32, style: &str) -> RosieResult<TraceResult> {
        self.lock()?.trace(id, input, start, style)
    }

    pub fn match_file(
        &self,
        id: PatternId,
        encoder: &str,
        request: &MatchFileRequest,
    ) -> RosieResult<MatchFileCounts> {
        self.lock()?.match_file(id, encoder, request)
    }

    pub fn load(&self, source: &[u8]) -> RosieResult<LoadOutcome> {
        Ok(self.lock()?.load(source))
    }

    pub fn load_file(&self, path: &Path) -> RosieResult<LoadOutcome> {
        Ok(self.lock()?.load_file(path))
    }

    /// Import package `name`, bound under `as_name` (default: its declared name).
    pub fn import(&self, name: &str, as_name: Option<&str>) -> RosieResult<LoadOutcome> {
        Ok(self.lock()?.import(name, as_name))
    }

    /// Parse an init file (default `$HOME/.rosierc`) without applying it.
    pub fn read_rcfile(&self, path: Option<&Path>) -> RosieResult<RcFile<Vec<RcOption>>> {
        Ok(read_rcfile(path))
    }

    /// Parse and apply an init file. Options before a failing one stay applied.
    pub fn execute_rcfile(&self, path: Option<&Path>) -> RosieResult<RcFile<()>> {
        let parsed = read_rcfile(path);
        let options = match parsed {
            RcFile::Valid(options) => options,
            RcFile::Missing => return Ok(RcFile::Missing),
            RcFile::Invalid(diagnostics) => return Ok(RcFile::Invalid(diagnostics)),
        };
        let base = path
            .map(Path::to_path_buf)
            .or_else(rcfile::default_rcfile)
            .and_then(|p| p.parent().map(Path::to_path_buf))
            .unwrap_or_default();
        Ok(self.lock()?.execute_rc_options(&options, &base))
    }

    pub fn register_encoder(&self, name: &str, encoder: Arc<dyn Encoder>) -> RosieResult<()> {
        self.lock()?.encoders.register(name, encoder)
    }
}

impl Drop for Engine {
    fn drop(&mut self) {
        // patterns first, then the rest of the session
        if let Ok(mut state) = self.state.lock() {
            let freed = state.patterns.clear();
            debug!(patterns_freed = freed, "engine finalized");
        }
    }
}

fn read_rcfile(path: Option<&Path>) -> RcFile<Vec<RcOption>> {
    let Some(path) = path
        .map(Path::to_path_buf)
        .or_else(rcfile::default_rcfile)
    else {
        return RcFile::Missing;
    };
    match rcfile::read_source(&path) {
        Ok(None) => RcFile::Missing,
        Ok(Some(text)) => match rcfile::parse_rcfile(&text) {
            Ok(options) => RcFile::Valid(options),
            Err(diagnostics) => RcFile::Invalid(diagnostics),
        },
        Err(diagnostic) => RcFile::Invalid(vec![diagnostic]),
    }
}

/// 1-based caller offset to 0-based byte position; offsets below 1 mean the start.
fn start_position(start: i32) -> usize {
    if start <= 1 { 0 } else { (start - 1) as usize }
}

impl EngineState {
    fn usage_bytes(&self) -> usize {
        SESSION_BASE_USAGE + self.env.footprint() + self.patterns.footprint()
    }

    fn alloc_limit(&self) -> AllocLimit {
        AllocLimit {
            limit_kb: self.alloc_limit_kb,
            usage_kb: u32::try_from(self.usage_bytes().div_ceil(1024)).unwrap_or(u32::MAX),
        }
    }

    fn set_alloc_limit(&mut self, kb: i64) -> RosieResult<()> {
        if kb != 0 && kb < MIN_ALLOC_LIMIT_KB as i64 {
            return Err(RosieError::AllocLimit {
                requested: kb,
                minimum: MIN_ALLOC_LIMIT_KB,
            });
        }
        self.alloc_limit_kb = u32::try_from(kb).unwrap_or(u32::MAX);
        debug!(alloc_limit_kb = self.alloc_limit_kb, "allocation limit set");
        Ok(())
    }

    fn set_libpath(&mut self, libpath: &str) {
        self.libpath = libpath.to_string();
        self.searcher = PackageSearcher::new(libpath);
        debug!(libpath, "library path set");
    }

    fn limits(&self) -> MatchLimits {
        let budget = match self.alloc_limit_kb {
            0 => None,
            kb => Some((kb as usize * 1024).saturating_sub(self.usage_bytes())),
        };
        MatchLimits {
            max_depth: self.max_match_depth,
            budget,
        }
    }

    fn config(&self) -> EngineConfig {
        let usage = self.alloc_limit();
        let mut packages: Vec<&str> = self.env.packages.keys().map(|k| k.as_str()).collect();
        packages.sort_unstable();
        let prelude: Vec<&str> = package::prelude::names().collect();

        let build = vec![
            ConfigEntry::new(
                "ROSIE_VERSION",
                Some(env!("CARGO_PKG_VERSION").to_string()),
                "version of the engine",
            ),
            ConfigEntry::new("RPL_VERSION", Some(RPL_VERSION.to_string()), "version of the pattern language"),
            ConfigEntry::new(
                "ROSIE_LIBDIR",
                Some(COLOCATED_LIBDIR.to_string()),
                "package directory relative to the executable",
            ),
            ConfigEntry::new(
                "SYSTEM_LIBDIRS",
                Some(SYSTEM_LIBDIRS.join(&LIBPATH_SEPARATOR.to_string())),
                "system package directories",
            ),
            ConfigEntry::new(
                "BUILTIN_PACKAGES",
                Some(prelude.join(",")),
                "packages compiled into the engine",
            ),
            ConfigEntry::new(
                "MIN_ALLOC_LIMIT_KB",
                Some(MIN_ALLOC_LIMIT_KB.to_string()),
                "smallest nonzero allocation limit",
            ),
        ];

        let runtime = vec![
            ConfigEntry::new("ROSIE_LIBPATH", Some(self.libpath.clone()), "package search path"),
            ConfigEntry::new(
                "ROSIE_LIBPATH_ENV",
                std::env::var(LIBPATH_ENV).ok(),
                "value of the ROSIE_LIBPATH environment variable",
            ),
            ConfigEntry::new(
                "ALLOC_LIMIT_KB",
                Some(usage.limit_kb.to_string()),
                "allocation limit (0 = unlimited)",
            ),
            ConfigEntry::new("ALLOC_USAGE_KB", Some(usage.usage_kb.to_string()), "current allocation"),
            ConfigEntry::new(
                "MAX_MATCH_DEPTH",
                Some(self.max_match_depth.to_string()),
                "matcher recursion limit",
            ),
            ConfigEntry::new("ROSIE_COLORS", Some(self.colors.to_spec()), "color assignments"),
            ConfigEntry::new("ENCODERS", Some(self.encoders.names().join(",")), "output encoders"),
            ConfigEntry::new(
                "LOADED_PACKAGES",
                if packages.is_empty() { None } else { Some(packages.join(",")) },
                "packages loaded in this session",
            ),
            ConfigEntry::new(
                "BINDINGS",
                Some(self.env.binding_count().to_string()),
                "names bound in this session",
            ),
            ConfigEntry::new("PATTERNS", Some(self.patterns.len().to_string()), "live compiled patterns"),
            ConfigEntry::new("CREATED", Some(self.created.to_rfc3339()), "session creation time"),
        ];

        EngineConfig { build, runtime }
    }

    pub(crate) fn compile(&mut self, expression: &[u8]) -> RosieResult<(PatternId, u32)> {
        let source = std::str::from_utf8(expression).map_err(|_| {
            RosieError::Compile(vec![Diagnostic::parser("expression is not valid UTF-8")])
        })?;
        let compiler = RplCompiler::new(&mut self.env, &self.searcher);
        let pattern = compiler.compile_expression(source).map_err(RosieError::Compile)?;
        let footprint = pattern.footprint() + source.len();
        let (id, generation) = self.patterns.insert(CompiledPattern {
            pattern: Arc::new(pattern),
            source: source.to_string(),
            footprint,
        })?;
        debug!(pattern = id.get(), expression = source, "compiled pattern");
        Ok((id, generation))
    }

    pub(crate) fn free_pattern(&mut self, id: PatternId) -> RosieResult<()> {
        self.patterns.remove(id)?;
        debug!(pattern = id.get(), "freed pattern");
        Ok(())
    }

    pub(crate) fn generation(&self, id: PatternId) -> Option<u32> {
        self.patterns.generation(id)
    }

    fn run(&self, id: PatternId, input: &[u8], start: usize) -> RosieResult<RawMatch> {
        let compiled = self.patterns.get(id)?;
        let t0 = Instant::now();
        let outcome = match_pattern(&compiled.pattern, input, start, self.limits(), None);
        let match_time = micros(t0.elapsed());
        if let Some(abend) = outcome.abend {
            warn!(pattern = id.get(), ?abend, input_len = input.len(), "match aborted");
        }
        Ok(RawMatch {
            node: outcome.node,
            end: outcome.end,
            abend: outcome.abend.is_some(),
            match_time,
        })
    }

    fn encode(&self, encoder: &dyn Encoder, input: &[u8], node: &MatchNode) -> RosieResult<Option<Vec<u8>>> {
        let cx = EncodeContext {
            input,
            node,
            colors: &self.colors,
        };
        encoder.encode(&cx)
    }

    pub(crate) fn match_input(
        &self,
        id: PatternId,
        input: &[u8],
        start: i32,
        encoder: &str,
    ) -> RosieResult<MatchResult> {
        let t0 = Instant::now();
        self.patterns.get(id)?;
        let encoder_impl = self.encoders.get(encoder)?;
        let start = start_position(start);

        // start at or past the end: a clean no-match
        if start >= input.len() {
            let mut result = MatchResult::no_match(0, false);
            result.total_time = micros(t0.elapsed());
            return Ok(result);
        }

        let raw = self.run(id, input, start)?;
        let mut result = match (raw.node, raw.end) {
            (Some(node), Some(end)) if !raw.abend => {
                let data = match self.encode(encoder_impl.as_ref(), input, &node)? {
                    Some(bytes) => Some(ByteBuffer::from_vec(bytes)?),
                    None => None,
                };
                MatchResult {
                    matched: true,
                    data,
                    leftover: clamp_i32(input.len() - end),
                    abend: false,
                    total_time: 0,
                    match_time: raw.match_time,
                }
            }
            _ => {
                let mut result = MatchResult::no_match(input.len() - start, raw.abend);
                result.match_time = raw.match_time;
                result
            }
        };
        result.total_time = micros(t0.elapsed()).max(result.match_time);
        Ok(result)
    }

    pub(crate) fn trace(&self, id: PatternId, input: &[u8], start: i32, style: &str) -> RosieResult<TraceResult> {
        let compiled = self.patterns.get(id)?;
        if style.len() > MAX_ENCODER_NAME_LENGTH {
            return Err(RosieError::InvalidTraceStyle(style.to_string()));
        }
        let style = TraceStyle::from_name(style)?;
        let start = start_position(start);

        let mut log = TraceLog::new(style);
        let (end, abend) = if start < input.len() {
            let outcome = match_pattern(&compiled.pattern, input, start, self.limits(), Some(&mut log));
            (outcome.end, outcome.abend.is_some())
        } else {
            (None, false)
        };

        let report = TraceReport {
            expression: &compiled.source,
            input,
            start,
            end,
            abend,
            log: &log,
        };
        Ok(TraceResult {
            matched: end.is_some(),
            abend,
            text: report.render(style),
        })
    }

    pub(crate) fn match_file(
        &self,
        id: PatternId,
        encoder: &str,
        request: &MatchFileRequest,
    ) -> RosieResult<MatchFileCounts> {
        self.patterns.get(id)?;
        let encoder_impl = self.encoders.get(encoder)?;
        let counts = match_stream(request, |record| {
            if record.is_empty() {
                return Ok(RecordOutcome::Unmatched);
            }
            let raw = self.run(id, record, 0)?;
            match (raw.node, raw.abend) {
                (_, true) => Ok(RecordOutcome::Aborted),
                (Some(node), false) => Ok(RecordOutcome::Matched(self.encode(
                    encoder_impl.as_ref(),
                    record,
                    &node,
                )?)),
                (None, false) => Ok(RecordOutcome::Unmatched),
            }
        })?;
        debug!(
            pattern = id.get(),
            encoder,
            cin = counts.cin,
            cout = counts.cout,
            cerr = counts.cerr,
            "matched file"
        );
        Ok(counts)
    }

    fn load_text(&mut self, source: &str) -> LoadOutcome {
        let compiler_report = RplCompiler::new(&mut self.env, &self.searcher).load_source(source);
        LoadOutcome::new(
            LoadKind::Load,
            compiler_report.package.map(|p| p.to_string()),
            compiler_report.diagnostics,
        )
    }

    pub(crate) fn load(&mut self, source: &[u8]) -> LoadOutcome {
        match std::str::from_utf8(source) {
            Ok(text) => self.load_text(text),
            Err(_) => LoadOutcome::new(
                LoadKind::Load,
                None,
                vec![Diagnostic::parser("source is not valid UTF-8")],
            ),
        }
    }

    pub(crate) fn load_file(&mut self, path: &Path) -> LoadOutcome {
        match rcfile::read_source(path) {
            Ok(Some(text)) => {
                debug!(file = %path.display(), "loading file");
                self.load_text(&text)
            }
            Ok(None) => LoadOutcome::new(
                LoadKind::Load,
                None,
                vec![Diagnostic::loader(format!("{}: no such file", path.display()))],
            ),
            Err(diagnostic) => LoadOutcome::new(LoadKind::Load, None, vec![diagnostic]),
        }
    }

    pub(crate) fn import(&mut self, name: &str, as_name: Option<&str>) -> LoadOutcome {
        let result = RplCompiler::new(&mut self.env, &self.searcher).import(name, as_name);
        match result {
            Ok(actual) => {
                debug!(package = name, actual = %actual, as_name, "imported");
                LoadOutcome::new(LoadKind::Import, Some(actual.to_string()), vec![])
            }
            Err(diagnostics) => LoadOutcome::new(LoadKind::Import, None, diagnostics),
        }
    }

    fn execute_rc_options(&mut self, options: &[RcOption], base: &Path) -> RcFile<()> {
        let mut diagnostics = Vec::new();
        for option in options {
            debug!(option = option.key(), "executing init file option");
            match option {
                RcOption::Libpath(libpath) => self.set_libpath(libpath),
                RcOption::Colors(spec) => {
                    if let Err(e) = self.colors.merge(spec) {
                        diagnostics.push(Diagnostic::loader(format!("colors: {}", e)));
                    }
                }
                RcOption::Loadfile(file) => {
                    let path = base.join(file);
                    diagnostics.extend(self.load_file(&path).diagnostics);
                }
                RcOption::Import(name) => {
                    diagnostics.extend(self.import(name, None).diagnostics);
                }
            }
        }
        if diagnostics.is_empty() {
            RcFile::Valid(())
        } else {
            RcFile::Invalid(diagnostics)
        }
    }
}

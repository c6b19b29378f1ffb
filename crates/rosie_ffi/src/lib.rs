//! C ABI for the rosie pattern matching engine.
//!
//! Every call takes an opaque engine pointer from [`rosie_new`] and returns an
//! integer status: `SUCCESS` when the call executed, a negative code when the
//! engine itself failed. Application outcomes (no match, compile errors,
//! failed loads) are reported through the output parameters instead.
//!
//! Strings cross the boundary as [`RosieString`]: a `u32` length and a byte
//! pointer, with no terminator. Every string the engine writes into an output
//! parameter belongs to the caller, who releases it exactly once with
//! [`rosie_free_string`] (or [`rosie_free_string_ptr`] for heap-allocated
//! descriptors). A string with a null `ptr` carries no data; its `len` is one
//! of the `ERR_*`/`MATCH_*` codes explaining why.

use rosie::rcfile::{self, RcFile};
use rosie::rosie_vm::diagnostics_to_json;
use rosie::{Diagnostic, Engine, EngineOption, MatchFileRequest, PatternId, RosieError};
use std::ffi::{CStr, c_char, c_int};
use std::panic::{self, AssertUnwindSafe};
use std::path::PathBuf;
use std::ptr;
use std::slice;
use tracing::{debug, error, warn};

#[cfg(test)]
mod tests;

// Return codes
pub const SUCCESS: c_int = 0;
pub const ERR_OUT_OF_MEMORY: c_int = -2;
pub const ERR_SYSCALL_FAILED: c_int = -3;
pub const ERR_ENGINE_CALL_FAILED: c_int = -4;

// Codes carried in the `len` of a string whose `ptr` is null
pub const ERR_NO_MATCH: u32 = 0;
pub const MATCH_WITHOUT_DATA: u32 = 1;
/// Also used for an unknown trace style
pub const ERR_NO_ENCODER: u32 = 2;
pub const ERR_NO_FILE: u32 = 3;
pub const ERR_NO_PATTERN: u32 = 4;

/// Length-prefixed byte string. Zero bytes inside are ordinary data.
#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct RosieString {
    pub len: u32,
    pub ptr: *mut u8,
}

impl RosieString {
    /// A string with no data, `len` holding an explanation code.
    pub const fn null(code: u32) -> Self {
        RosieString {
            len: code,
            ptr: ptr::null_mut(),
        }
    }

    fn from_vec(bytes: Vec<u8>) -> Result<Self, c_int> {
        let len = u32::try_from(bytes.len()).map_err(|_| ERR_OUT_OF_MEMORY)?;
        let ptr = Box::into_raw(bytes.into_boxed_slice()) as *mut u8;
        Ok(RosieString { len, ptr })
    }

    pub fn is_null(&self) -> bool {
        self.ptr.is_null()
    }

    /// # Safety
    /// `ptr` must be null or valid for reads of `len` bytes for `'a`.
    unsafe fn as_bytes<'a>(&self) -> &'a [u8] {
        if self.ptr.is_null() {
            &[]
        } else {
            unsafe { slice::from_raw_parts(self.ptr, self.len as usize) }
        }
    }

    /// # Safety
    /// The string must have been allocated by this library and not yet released.
    unsafe fn release(self) {
        if !self.ptr.is_null() {
            let raw = ptr::slice_from_raw_parts_mut(self.ptr, self.len as usize);
            drop(unsafe { Box::from_raw(raw) });
        }
    }
}

#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct RosieMatchResult {
    pub data: RosieString,
    pub leftover: c_int,
    pub abend: c_int,
    pub ttotal: c_int,
    pub tmatch: c_int,
}

impl RosieMatchResult {
    fn empty(code: u32) -> Self {
        RosieMatchResult {
            data: RosieString::null(code),
            leftover: 0,
            abend: 0,
            ttotal: 0,
            tmatch: 0,
        }
    }
}

/// Run `f`, turning a panic into `ERR_ENGINE_CALL_FAILED`.
fn guard(f: impl FnOnce() -> c_int) -> c_int {
    match panic::catch_unwind(AssertUnwindSafe(f)) {
        Ok(code) => code,
        Err(_) => {
            error!("panic caught at the C boundary");
            ERR_ENGINE_CALL_FAILED
        }
    }
}

fn pattern_id(pat: c_int) -> Option<PatternId> {
    u32::try_from(pat).ok().and_then(PatternId::from_raw)
}

fn to_c_int(value: u64) -> c_int {
    c_int::try_from(value).unwrap_or(c_int::MAX)
}

/// # Safety
/// `s` must be null or a valid NUL-terminated string.
unsafe fn c_str<'a>(s: *const c_char) -> Option<&'a str> {
    if s.is_null() {
        return None;
    }
    unsafe { CStr::from_ptr(s) }.to_str().ok()
}

/// # Safety
/// `s` must be null or point to a valid `RosieString`.
unsafe fn rosie_str<'a>(s: *const RosieString) -> Option<&'a [u8]> {
    let s = unsafe { s.as_ref() }?;
    if s.is_null() {
        None
    } else {
        Some(unsafe { s.as_bytes() })
    }
}

#[cfg(unix)]
fn path_from(bytes: &[u8]) -> PathBuf {
    use std::ffi::OsStr;
    use std::os::unix::ffi::OsStrExt;
    PathBuf::from(OsStr::from_bytes(bytes))
}

#[cfg(not(unix))]
fn path_from(bytes: &[u8]) -> PathBuf {
    PathBuf::from(String::from_utf8_lossy(bytes).into_owned())
}

/// File name from a C string, byte for byte.
///
/// # Safety
/// `s` must be null or a valid NUL-terminated string.
unsafe fn c_path(s: *const c_char) -> Option<PathBuf> {
    if s.is_null() {
        return None;
    }
    Some(path_from(unsafe { CStr::from_ptr(s) }.to_bytes()))
}

/// Store `bytes` into `out` as a caller-owned string.
fn put(out: &mut RosieString, bytes: Vec<u8>) -> c_int {
    match RosieString::from_vec(bytes) {
        Ok(s) => {
            *out = s;
            SUCCESS
        }
        Err(code) => {
            *out = RosieString::null(0);
            code
        }
    }
}

fn put_diagnostics(out: &mut RosieString, diagnostics: &[Diagnostic]) -> c_int {
    if diagnostics.is_empty() {
        *out = RosieString::null(0);
        SUCCESS
    } else {
        put(out, diagnostics_to_json(diagnostics))
    }
}

// ---------------------------------------------------------------------------
// Strings
// ---------------------------------------------------------------------------

/// Copy `len` bytes from `msg` into a new string owned by the caller.
///
/// # Safety
/// `msg` must be valid for reads of `len` bytes (or null with `len == 0`).
#[unsafe(no_mangle)]
pub unsafe extern "C" fn rosie_new_string(msg: *const u8, len: usize) -> RosieString {
    let bytes = if msg.is_null() || len == 0 {
        Vec::new()
    } else {
        unsafe { slice::from_raw_parts(msg, len) }.to_vec()
    };
    RosieString::from_vec(bytes).unwrap_or(RosieString::null(0))
}

/// Like [`rosie_new_string`], with the descriptor itself on the heap.
///
/// # Safety
/// As for [`rosie_new_string`].
#[unsafe(no_mangle)]
pub unsafe extern "C" fn rosie_new_string_ptr(msg: *const u8, len: usize) -> *mut RosieString {
    let s = unsafe { rosie_new_string(msg, len) };
    Box::into_raw(Box::new(s))
}

/// Wrap `len` bytes at `msg` without copying. The string borrows the
/// caller's memory.
///
/// # Safety
/// `msg` must stay valid for reads of `len` bytes for as long as the string
/// is used. The result must never be passed to [`rosie_free_string`].
#[unsafe(no_mangle)]
pub unsafe extern "C" fn rosie_string_from(msg: *const u8, len: usize) -> RosieString {
    match u32::try_from(len) {
        Ok(len) if !msg.is_null() => RosieString {
            len,
            ptr: msg as *mut u8,
        },
        _ => RosieString::null(0),
    }
}

/// Like [`rosie_string_from`], with the descriptor itself on the heap.
/// Release the descriptor with [`rosie_free_string_descriptor`].
///
/// # Safety
/// As for [`rosie_string_from`]. The result must never be passed to
/// [`rosie_free_string_ptr`].
#[unsafe(no_mangle)]
pub unsafe extern "C" fn rosie_string_ptr_from(msg: *const u8, len: usize) -> *mut RosieString {
    let s = unsafe { rosie_string_from(msg, len) };
    Box::into_raw(Box::new(s))
}

/// Release a descriptor from [`rosie_string_ptr_from`], leaving the borrowed
/// bytes alone.
///
/// # Safety
/// `s` must be null or come from [`rosie_string_ptr_from`], released only once.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn rosie_free_string_descriptor(s: *mut RosieString) {
    if !s.is_null() {
        drop(unsafe { Box::from_raw(s) });
    }
}

/// Release the bytes of a string produced by this library.
///
/// # Safety
/// `s` must come from this library, unmodified, and be released only once.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn rosie_free_string(s: RosieString) {
    unsafe { s.release() };
}

/// Release a descriptor from [`rosie_new_string_ptr`] together with its bytes.
///
/// # Safety
/// `s` must be null or come from [`rosie_new_string_ptr`], released only once.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn rosie_free_string_ptr(s: *mut RosieString) {
    if s.is_null() {
        return;
    }
    let boxed = unsafe { Box::from_raw(s) };
    unsafe { boxed.release() };
}

// ---------------------------------------------------------------------------
// Engine
// ---------------------------------------------------------------------------

/// Create an engine. On failure returns null and writes the reason into
/// `messages` (if not null).
///
/// # Safety
/// `messages` must be null or valid for writes.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn rosie_new(messages: *mut RosieString) -> *mut Engine {
    let messages = unsafe { messages.as_mut() };
    let result = panic::catch_unwind(|| Engine::new(EngineOption::default()));
    let failure = match result {
        Ok(Ok(engine)) => {
            if let Some(out) = messages {
                *out = RosieString::null(0);
            }
            return Box::into_raw(Box::new(engine));
        }
        Ok(Err(err)) => err.to_string(),
        Err(_) => "panic during engine creation".to_string(),
    };
    warn!(error = %failure, "rosie_new failed");
    if let Some(out) = messages {
        put(out, failure.into_bytes());
    }
    ptr::null_mut()
}

/// Free every pattern, then the engine. The pointer is dead afterwards.
///
/// # Safety
/// `e` must be null or come from [`rosie_new`], finalized only once.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn rosie_finalize(e: *mut Engine) {
    if e.is_null() {
        return;
    }
    let engine = unsafe { Box::from_raw(e) };
    let _ = panic::catch_unwind(AssertUnwindSafe(move || engine.finalize()));
}

/// Query or set the library path. A `newpath` with a null `ptr` receives the
/// current path; otherwise its contents become the new path.
///
/// # Safety
/// `e` must be a live engine; `newpath` must be valid for reads and writes.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn rosie_libpath(e: *mut Engine, newpath: *mut RosieString) -> c_int {
    guard(|| {
        let (Some(engine), Some(newpath)) = (unsafe { e.as_ref() }, unsafe { newpath.as_mut() }) else {
            return ERR_ENGINE_CALL_FAILED;
        };
        if newpath.is_null() {
            return match engine.libpath() {
                Ok(libpath) => put(newpath, libpath.into_bytes()),
                Err(_) => ERR_ENGINE_CALL_FAILED,
            };
        }
        let libpath = String::from_utf8_lossy(unsafe { newpath.as_bytes() }).into_owned();
        match engine.set_libpath(&libpath) {
            Ok(()) => SUCCESS,
            Err(_) => ERR_ENGINE_CALL_FAILED,
        }
    })
}

/// Query or set the allocation limit in KB. `*newlimit == -1` (or a null
/// `newlimit`) queries, writing the limit back; any other value sets it.
/// Current usage is written to `usage` when it is not null.
///
/// # Safety
/// `e` must be a live engine; `newlimit` and `usage` must be null or valid.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn rosie_alloc_limit(e: *mut Engine, newlimit: *mut c_int, usage: *mut c_int) -> c_int {
    guard(|| {
        let Some(engine) = (unsafe { e.as_ref() }) else {
            return ERR_ENGINE_CALL_FAILED;
        };
        let newlimit = unsafe { newlimit.as_mut() };
        let query = newlimit.as_deref().is_none_or(|limit| *limit == -1);
        if let (false, Some(limit)) = (query, newlimit.as_deref()) {
            if let Err(err) = engine.set_alloc_limit(i64::from(*limit)) {
                warn!(error = %err, "rosie_alloc_limit rejected");
                return ERR_ENGINE_CALL_FAILED;
            }
        }
        let Ok(current) = engine.alloc_limit() else {
            return ERR_ENGINE_CALL_FAILED;
        };
        if let (true, Some(limit)) = (query, newlimit) {
            *limit = to_c_int(u64::from(current.limit_kb));
        }
        if let Some(usage) = unsafe { usage.as_mut() } {
            *usage = to_c_int(u64::from(current.usage_kb));
        }
        SUCCESS
    })
}

/// Build and runtime configuration as a JSON array of two entry lists.
///
/// # Safety
/// `e` must be a live engine; `retvals` must be valid for writes.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn rosie_config(e: *mut Engine, retvals: *mut RosieString) -> c_int {
    guard(|| {
        let (Some(engine), Some(out)) = (unsafe { e.as_ref() }, unsafe { retvals.as_mut() }) else {
            return ERR_ENGINE_CALL_FAILED;
        };
        match engine.config() {
            Ok(config) => put(out, config.to_json()),
            Err(_) => ERR_ENGINE_CALL_FAILED,
        }
    })
}

// ---------------------------------------------------------------------------
// Patterns
// ---------------------------------------------------------------------------

/// Compile `expression`. On success `*pat` is a positive id and `messages`
/// has a null `ptr`; on failure `*pat` is 0 and `messages` holds a JSON
/// array of diagnostics.
///
/// # Safety
/// `e` must be a live engine; `expression` must be readable; `pat` and
/// `messages` must be valid for writes.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn rosie_compile(
    e: *mut Engine,
    expression: *const RosieString,
    pat: *mut c_int,
    messages: *mut RosieString,
) -> c_int {
    guard(|| {
        let (Some(engine), Some(pat), Some(messages)) =
            (unsafe { e.as_ref() }, unsafe { pat.as_mut() }, unsafe { messages.as_mut() })
        else {
            return ERR_ENGINE_CALL_FAILED;
        };
        *pat = 0;
        let expression = unsafe { rosie_str(expression) }.unwrap_or(&[]);
        match engine.compile(expression) {
            Ok(id) => {
                *pat = to_c_int(u64::from(id.get()));
                *messages = RosieString::null(0);
                SUCCESS
            }
            Err(err) => match err.diagnostics() {
                Some(diagnostics) => put_diagnostics(messages, diagnostics),
                None => {
                    error!(error = %err, "rosie_compile failed");
                    *messages = RosieString::null(0);
                    ERR_ENGINE_CALL_FAILED
                }
            },
        }
    })
}

/// Free one compiled pattern. Freeing an id that is not live fails.
///
/// # Safety
/// `e` must be a live engine.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn rosie_free_rplx(e: *mut Engine, pat: c_int) -> c_int {
    guard(|| {
        let Some(engine) = (unsafe { e.as_ref() }) else {
            return ERR_ENGINE_CALL_FAILED;
        };
        let Some(id) = pattern_id(pat) else {
            return ERR_ENGINE_CALL_FAILED;
        };
        match engine.free_pattern(id) {
            Ok(()) => SUCCESS,
            Err(err) => {
                warn!(pattern = pat, error = %err, "rosie_free_rplx failed");
                ERR_ENGINE_CALL_FAILED
            }
        }
    })
}

// ---------------------------------------------------------------------------
// Matching
// ---------------------------------------------------------------------------

/// Match `input` from the 1-based `start` offset. The result's data is a
/// caller-owned string, or null with `ERR_NO_MATCH`, `MATCH_WITHOUT_DATA`,
/// `ERR_NO_ENCODER` or `ERR_NO_PATTERN` in its `len`.
///
/// # Safety
/// `e` must be a live engine; `encoder` a NUL-terminated string; `input`
/// readable; `result` valid for writes.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn rosie_match(
    e: *mut Engine,
    pat: c_int,
    start: c_int,
    encoder: *const c_char,
    input: *const RosieString,
    result: *mut RosieMatchResult,
) -> c_int {
    guard(|| {
        let (Some(engine), Some(out)) = (unsafe { e.as_ref() }, unsafe { result.as_mut() }) else {
            return ERR_ENGINE_CALL_FAILED;
        };
        *out = RosieMatchResult::empty(ERR_NO_MATCH);
        let Some(id) = pattern_id(pat) else {
            out.data = RosieString::null(ERR_NO_PATTERN);
            return SUCCESS;
        };
        let Some(encoder) = (unsafe { c_str(encoder) }) else {
            out.data = RosieString::null(ERR_NO_ENCODER);
            return SUCCESS;
        };
        let input = unsafe { rosie_str(input) }.unwrap_or(&[]);

        let m = match engine.match_input(id, input, start, encoder) {
            Ok(m) => m,
            Err(RosieError::InvalidHandle(_)) => {
                out.data = RosieString::null(ERR_NO_PATTERN);
                return SUCCESS;
            }
            Err(RosieError::InvalidEncoder(_)) => {
                out.data = RosieString::null(ERR_NO_ENCODER);
                return SUCCESS;
            }
            Err(err) => {
                error!(pattern = pat, error = %err, "rosie_match failed");
                return ERR_ENGINE_CALL_FAILED;
            }
        };

        out.leftover = m.leftover;
        out.abend = c_int::from(m.abend);
        out.ttotal = m.total_time;
        out.tmatch = m.match_time;
        match (m.matched, m.data) {
            (true, Some(data)) => put(&mut out.data, data.into_vec()),
            (true, None) => {
                out.data = RosieString::null(MATCH_WITHOUT_DATA);
                SUCCESS
            }
            (false, _) => SUCCESS,
        }
    })
}

fn matchfile_failed(cin: &mut c_int, cout: &mut c_int, code: u32) {
    *cin = -1;
    *cout = code as c_int;
}

/// Match every record of `infilename`. Null or empty file names mean the
/// standard streams. On failure `*cin` is -1, `*cout` holds `ERR_NO_PATTERN`,
/// `ERR_NO_ENCODER` or `ERR_NO_FILE`, and `err` may carry a message.
///
/// # Safety
/// `e` must be a live engine; the file names null or NUL-terminated; the
/// counters and `err` valid for writes.
#[unsafe(no_mangle)]
#[allow(clippy::too_many_arguments)]
pub unsafe extern "C" fn rosie_matchfile(
    e: *mut Engine,
    pat: c_int,
    encoder: *const c_char,
    wholefileflag: c_int,
    infilename: *const c_char,
    outfilename: *const c_char,
    errfilename: *const c_char,
    cin: *mut c_int,
    cout: *mut c_int,
    cerr: *mut c_int,
    err: *mut RosieString,
) -> c_int {
    guard(|| {
        let (Some(engine), Some(cin), Some(cout), Some(cerr), Some(err)) = (
            unsafe { e.as_ref() },
            unsafe { cin.as_mut() },
            unsafe { cout.as_mut() },
            unsafe { cerr.as_mut() },
            unsafe { err.as_mut() },
        ) else {
            return ERR_ENGINE_CALL_FAILED;
        };
        *err = RosieString::null(0);
        *cerr = 0;
        let Some(id) = pattern_id(pat) else {
            matchfile_failed(cin, cout, ERR_NO_PATTERN);
            return SUCCESS;
        };
        let Some(encoder) = (unsafe { c_str(encoder) }) else {
            matchfile_failed(cin, cout, ERR_NO_ENCODER);
            return SUCCESS;
        };
        let (infile, outfile, errfile) = unsafe {
            (
                c_path(infilename),
                c_path(outfilename),
                c_path(errfilename),
            )
        };
        let request = MatchFileRequest {
            input: infile.as_deref(),
            output: outfile.as_deref(),
            errors: errfile.as_deref(),
            whole_file: wholefileflag != 0,
        };

        match engine.match_file(id, encoder, &request) {
            Ok(counts) => {
                *cin = to_c_int(counts.cin);
                *cout = to_c_int(counts.cout);
                *cerr = to_c_int(counts.cerr);
                SUCCESS
            }
            Err(RosieError::InvalidHandle(_)) => {
                matchfile_failed(cin, cout, ERR_NO_PATTERN);
                SUCCESS
            }
            Err(RosieError::InvalidEncoder(_)) => {
                matchfile_failed(cin, cout, ERR_NO_ENCODER);
                SUCCESS
            }
            Err(io @ RosieError::Io { .. }) => {
                debug!(error = %io, "rosie_matchfile: file error");
                matchfile_failed(cin, cout, ERR_NO_FILE);
                put(err, io.to_string().into_bytes())
            }
            Err(abend @ RosieError::Abend { .. }) => {
                warn!(pattern = pat, error = %abend, "rosie_matchfile: match aborted");
                put(err, abend.to_string().into_bytes());
                ERR_ENGINE_CALL_FAILED
            }
            Err(other) => {
                error!(pattern = pat, error = %other, "rosie_matchfile failed");
                ERR_ENGINE_CALL_FAILED
            }
        }
    })
}

/// Trace a match. `trace` receives the explanation text, or null with
/// `ERR_NO_PATTERN`/`ERR_NO_ENCODER` in its `len`.
///
/// # Safety
/// As for [`rosie_match`]; `matched` and `trace` must be valid for writes.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn rosie_trace(
    e: *mut Engine,
    pat: c_int,
    start: c_int,
    trace_style: *const c_char,
    input: *const RosieString,
    matched: *mut c_int,
    trace: *mut RosieString,
) -> c_int {
    guard(|| {
        let (Some(engine), Some(matched), Some(trace)) =
            (unsafe { e.as_ref() }, unsafe { matched.as_mut() }, unsafe { trace.as_mut() })
        else {
            return ERR_ENGINE_CALL_FAILED;
        };
        *matched = 0;
        let Some(id) = pattern_id(pat) else {
            *trace = RosieString::null(ERR_NO_PATTERN);
            return SUCCESS;
        };
        let Some(style) = (unsafe { c_str(trace_style) }) else {
            *trace = RosieString::null(ERR_NO_ENCODER);
            return SUCCESS;
        };
        let input = unsafe { rosie_str(input) }.unwrap_or(&[]);

        match engine.trace(id, input, start, style) {
            Ok(result) => {
                *matched = c_int::from(result.matched);
                put(trace, result.text.into_bytes())
            }
            Err(RosieError::InvalidHandle(_)) => {
                *trace = RosieString::null(ERR_NO_PATTERN);
                SUCCESS
            }
            Err(RosieError::InvalidTraceStyle(_)) => {
                *trace = RosieString::null(ERR_NO_ENCODER);
                SUCCESS
            }
            Err(err) => {
                error!(pattern = pat, error = %err, "rosie_trace failed");
                ERR_ENGINE_CALL_FAILED
            }
        }
    })
}

// ---------------------------------------------------------------------------
// Loading
// ---------------------------------------------------------------------------

fn put_load_outcome(
    outcome: rosie::LoadOutcome,
    ok: &mut c_int,
    pkgname: &mut RosieString,
    messages: &mut RosieString,
) -> c_int {
    *ok = c_int::from(outcome.ok);
    let code = match outcome.package {
        Some(name) => put(pkgname, name.into_bytes()),
        None => {
            *pkgname = RosieString::null(0);
            SUCCESS
        }
    };
    if code != SUCCESS {
        return code;
    }
    put_diagnostics(messages, &outcome.diagnostics)
}

/// Load pattern source. `*ok` is 1 when every statement succeeded; whatever
/// did succeed stays defined either way.
///
/// # Safety
/// `e` must be a live engine; `src` readable; the outputs valid for writes.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn rosie_load(
    e: *mut Engine,
    ok: *mut c_int,
    src: *const RosieString,
    pkgname: *mut RosieString,
    messages: *mut RosieString,
) -> c_int {
    guard(|| {
        let (Some(engine), Some(ok), Some(pkgname), Some(messages)) = (
            unsafe { e.as_ref() },
            unsafe { ok.as_mut() },
            unsafe { pkgname.as_mut() },
            unsafe { messages.as_mut() },
        ) else {
            return ERR_ENGINE_CALL_FAILED;
        };
        let src = unsafe { rosie_str(src) }.unwrap_or(&[]);
        match engine.load(src) {
            Ok(outcome) => put_load_outcome(outcome, ok, pkgname, messages),
            Err(_) => ERR_ENGINE_CALL_FAILED,
        }
    })
}

/// Load pattern source from the file named by `fn_`.
///
/// # Safety
/// As for [`rosie_load`].
#[unsafe(no_mangle)]
pub unsafe extern "C" fn rosie_loadfile(
    e: *mut Engine,
    ok: *mut c_int,
    fn_: *const RosieString,
    pkgname: *mut RosieString,
    messages: *mut RosieString,
) -> c_int {
    guard(|| {
        let (Some(engine), Some(ok), Some(pkgname), Some(messages)) = (
            unsafe { e.as_ref() },
            unsafe { ok.as_mut() },
            unsafe { pkgname.as_mut() },
            unsafe { messages.as_mut() },
        ) else {
            return ERR_ENGINE_CALL_FAILED;
        };
        let path = path_from(unsafe { rosie_str(fn_) }.unwrap_or(&[]));
        match engine.load_file(&path) {
            Ok(outcome) => put_load_outcome(outcome, ok, pkgname, messages),
            Err(_) => ERR_ENGINE_CALL_FAILED,
        }
    })
}

/// Import package `pkgname`, bound as `as_` when that is given (non-null).
/// `actual_pkgname` receives the name the package declares.
///
/// # Safety
/// As for [`rosie_load`]; `as_` may be null.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn rosie_import(
    e: *mut Engine,
    ok: *mut c_int,
    pkgname: *const RosieString,
    as_: *const RosieString,
    actual_pkgname: *mut RosieString,
    messages: *mut RosieString,
) -> c_int {
    guard(|| {
        let (Some(engine), Some(ok), Some(actual), Some(messages)) = (
            unsafe { e.as_ref() },
            unsafe { ok.as_mut() },
            unsafe { actual_pkgname.as_mut() },
            unsafe { messages.as_mut() },
        ) else {
            return ERR_ENGINE_CALL_FAILED;
        };
        let name = String::from_utf8_lossy(unsafe { rosie_str(pkgname) }.unwrap_or(&[])).into_owned();
        let as_name = unsafe { rosie_str(as_) }.map(|b| String::from_utf8_lossy(b).into_owned());
        match engine.import(&name, as_name.as_deref()) {
            Ok(outcome) => put_load_outcome(outcome, ok, actual, messages),
            Err(_) => ERR_ENGINE_CALL_FAILED,
        }
    })
}

// ---------------------------------------------------------------------------
// Init files
// ---------------------------------------------------------------------------

/// # Safety
/// `filename` must be null or point to a valid `RosieString`.
unsafe fn rcfile_path(filename: *const RosieString) -> Option<PathBuf> {
    unsafe { rosie_str(filename) }
        .filter(|bytes| !bytes.is_empty())
        .map(path_from)
}

/// Parse an init file (default `$HOME/.rosierc`) without applying it.
/// `*file_exists` is 0 when there is no file; otherwise `options` holds the
/// JSON option list, or `messages` the diagnostics when the file is invalid.
///
/// # Safety
/// `e` must be a live engine; `filename` null or readable; outputs valid.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn rosie_read_rcfile(
    e: *mut Engine,
    filename: *const RosieString,
    file_exists: *mut c_int,
    options: *mut RosieString,
    messages: *mut RosieString,
) -> c_int {
    guard(|| {
        let (Some(engine), Some(file_exists), Some(options), Some(messages)) = (
            unsafe { e.as_ref() },
            unsafe { file_exists.as_mut() },
            unsafe { options.as_mut() },
            unsafe { messages.as_mut() },
        ) else {
            return ERR_ENGINE_CALL_FAILED;
        };
        *options = RosieString::null(0);
        *messages = RosieString::null(0);
        let path = unsafe { rcfile_path(filename) };
        match engine.read_rcfile(path.as_deref()) {
            Ok(RcFile::Missing) => {
                *file_exists = 0;
                SUCCESS
            }
            Ok(RcFile::Invalid(diagnostics)) => {
                *file_exists = 1;
                put_diagnostics(messages, &diagnostics)
            }
            Ok(RcFile::Valid(list)) => {
                *file_exists = 1;
                put(options, rcfile::options_to_json(&list))
            }
            Err(_) => ERR_ENGINE_CALL_FAILED,
        }
    })
}

/// Parse and apply an init file. `*no_errors` is 1 when every option
/// applied; options before a failing one stay applied.
///
/// # Safety
/// As for [`rosie_read_rcfile`].
#[unsafe(no_mangle)]
pub unsafe extern "C" fn rosie_execute_rcfile(
    e: *mut Engine,
    filename: *const RosieString,
    file_exists: *mut c_int,
    no_errors: *mut c_int,
    messages: *mut RosieString,
) -> c_int {
    guard(|| {
        let (Some(engine), Some(file_exists), Some(no_errors), Some(messages)) = (
            unsafe { e.as_ref() },
            unsafe { file_exists.as_mut() },
            unsafe { no_errors.as_mut() },
            unsafe { messages.as_mut() },
        ) else {
            return ERR_ENGINE_CALL_FAILED;
        };
        *messages = RosieString::null(0);
        let path = unsafe { rcfile_path(filename) };
        match engine.execute_rcfile(path.as_deref()) {
            Ok(RcFile::Missing) => {
                *file_exists = 0;
                *no_errors = 1;
                SUCCESS
            }
            Ok(RcFile::Invalid(diagnostics)) => {
                *file_exists = 1;
                *no_errors = 0;
                put_diagnostics(messages, &diagnostics)
            }
            Ok(RcFile::Valid(())) => {
                *file_exists = 1;
                *no_errors = 1;
                SUCCESS
            }
            Err(_) => ERR_ENGINE_CALL_FAILED,
        }
    })
}

//! Centralized engine limits and configuration constants.
//!
//! All magic numbers that bound engine behavior are collected here
//! for easy tuning and configuration.

// ===== Pattern table =====

/// Initial capacity of a session's compiled-pattern table.
pub const INITIAL_RPLX_SLOTS: usize = 32;

// ===== Allocation limit =====

/// Allocation limit a new session starts with. Zero means unlimited.
pub const INITIAL_ALLOC_LIMIT_KB: u32 = 0;

/// Smallest nonzero allocation limit accepted by `set_alloc_limit`.
pub const MIN_ALLOC_LIMIT_KB: u32 = 8192;

/// Fixed overhead charged to every session, on top of its patterns and bindings.
pub const SESSION_BASE_USAGE: usize = 64 * 1024;

// ===== Encoders =====

/// Encoder and trace style names longer than this are rejected outright.
pub const MAX_ENCODER_NAME_LENGTH: usize = 64;

// ===== Compiler =====

/// Maximum parser recursion depth (prevents stack overflow in the parser).
pub const MAXCCALLS_PARSER: usize = 200;

/// Maximum nesting of package imports while resolving one import.
pub const MAX_IMPORT_DEPTH: usize = 32;

// ===== Matcher =====

/// Default maximum matcher recursion depth. Exceeding it aborts the match.
pub const MAXCCALLS_MATCH: usize = 400;

/// Bytes charged against the allocation budget for each capture node,
/// in addition to the length of its type name.
pub const CAPTURE_NODE_COST: usize = 64;

// ===== Trace =====

/// Longest input excerpt echoed in a trace header.
pub const TRACE_INPUT_PREVIEW: usize = 60;

/// Attempts recorded by one trace; later attempts are counted but not listed.
pub const MAX_TRACE_EVENTS: usize = 10_000;

// ===== Default search path =====

/// Directory, relative to the running executable, searched for packages.
pub const COLOCATED_LIBDIR: &str = "rosie/rpl";

/// System directories searched for packages, in order.
pub const SYSTEM_LIBDIRS: [&str; 2] = ["/usr/local/lib/rosie/rpl", "/usr/lib/rosie/rpl"];

/// Environment variable overriding the default search path.
pub const LIBPATH_ENV: &str = "ROSIE_LIBPATH";

/// Separator between directories in a library path string.
pub const LIBPATH_SEPARATOR: char = ':';

/// File extension of package source files.
pub const RPL_EXTENSION: &str = "rpl";

/// Name of the init file looked up in `$HOME` when no path is given.
pub const DEFAULT_RCFILE: &str = ".rosierc";

use crate::rosie_vm::rosie_limits::{INITIAL_ALLOC_LIMIT_KB, MAXCCALLS_MATCH};

/// Options a session is created with.
#[derive(Debug, Clone)]
pub struct EngineOption {
    /// Package search path, `:`-separated. `None` uses the default search order.
    pub libpath: Option<String>,
    /// Allocation limit in kilobytes; zero means unlimited.
    pub alloc_limit_kb: u32,
    /// Maximum matcher recursion depth before a match abends.
    pub max_match_depth: usize,
    /// Color assignments merged over the defaults, e.g. `net.*=red:num.int=blue;bold`.
    pub colors: Option<String>,
}

impl Default for EngineOption {
    fn default() -> Self {
        Self {
            libpath: None,
            alloc_limit_kb: INITIAL_ALLOC_LIMIT_KB,
            max_match_depth: MAXCCALLS_MATCH,
            colors: None,
        }
    }
}

impl EngineOption {
    pub fn with_libpath(mut self, libpath: impl Into<String>) -> Self {
        self.libpath = Some(libpath.into());
        self
    }

    pub fn with_alloc_limit_kb(mut self, kb: u32) -> Self {
        self.alloc_limit_kb = kb;
        self
    }

    pub fn with_max_match_depth(mut self, depth: usize) -> Self {
        self.max_match_depth = depth;
        self
    }

    pub fn with_colors(mut self, colors: impl Into<String>) -> Self {
        self.colors = Some(colors.into());
        self
    }
}

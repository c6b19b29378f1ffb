use crate::matchfile::{MatchFileCounts, MatchFileRequest};
use crate::rosie_vm::{
    EngineState, MatchResult, PatternId, RosieError, RosieResult, TraceResult, lock_state,
};
use std::sync::{Mutex, MutexGuard, Weak};
use tracing::debug;

/// Owning handle to a compiled pattern.
///
/// The pattern is freed exactly once: by [`Rplx::free`], by drop, or by the
/// session's finalization, whichever comes first. A handle that outlives its
/// pattern or its session reports `InvalidHandle`.
pub struct Rplx {
    id: PatternId,
    generation: u32,
    engine: Weak<Mutex<EngineState>>,
    released: bool,
}

impl Rplx {
    pub(crate) fn new(id: PatternId, generation: u32, engine: Weak<Mutex<EngineState>>) -> Self {
        Rplx {
            id,
            generation,
            engine,
            released: false,
        }
    }

    pub fn id(&self) -> PatternId {
        self.id
    }

    fn with_state<T>(&self, f: impl FnOnce(&mut MutexGuard<'_, EngineState>) -> RosieResult<T>) -> RosieResult<T> {
        let invalid = RosieError::InvalidHandle(self.id.get());
        if self.released {
            return Err(invalid);
        }
        let Some(state) = self.engine.upgrade() else {
            return Err(invalid);
        };
        let mut guard = lock_state(&state)?;
        // the id may have been freed through the engine and handed to another pattern
        if guard.generation(self.id) != Some(self.generation) {
            return Err(invalid);
        }
        f(&mut guard)
    }

    pub fn match_input(&self, input: &[u8], start: i32, encoder: &str) -> RosieResult<MatchResult> {
        self.with_state(|state| state.match_input(self.id, input, start, encoder))
    }

    pub fn trace(&self, input: &[u8], start: i32, style: &str) -> RosieResult<TraceResult> {
        self.with_state(|state| state.trace(self.id, input, start, style))
    }

    pub fn match_file(&self, encoder: &str, request: &MatchFileRequest) -> RosieResult<MatchFileCounts> {
        self.with_state(|state| state.match_file(self.id, encoder, request))
    }

    /// Free the pattern now, reporting failure instead of swallowing it.
    pub fn free(mut self) -> RosieResult<()> {
        let result = self.with_state(|state| state.free_pattern(self.id));
        self.released = true;
        result
    }
}

impl Drop for Rplx {
    fn drop(&mut self) {
        if self.released {
            return;
        }
        self.released = true;
        let Some(state) = self.engine.upgrade() else {
            return;
        };
        if let Ok(mut guard) = lock_state(&state)
            && guard.generation(self.id) == Some(self.generation)
        {
            let _ = guard.free_pattern(self.id);
            debug!(pattern = self.id.get(), "pattern released on drop");
        }
    }
}

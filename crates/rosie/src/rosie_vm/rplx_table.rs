use crate::rosie_vm::rosie_limits::INITIAL_RPLX_SLOTS;
use crate::rosie_vm::{RosieError, RosieResult};
use crate::rpl_pattern::Pattern;
use std::fmt;
use std::sync::Arc;

/// Compiled pattern identifier, unique among a session's live patterns.
/// Zero is never a valid id; it is the wire sentinel for "no pattern".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PatternId(u32);

impl PatternId {
    pub fn from_raw(raw: u32) -> Option<PatternId> {
        (raw != 0).then_some(PatternId(raw))
    }

    #[inline]
    pub fn get(self) -> u32 {
        self.0
    }

    fn index(self) -> usize {
        (self.0 - 1) as usize
    }
}

impl fmt::Display for PatternId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug)]
pub struct CompiledPattern {
    pub pattern: Arc<Pattern>,
    /// Expression text the pattern was compiled from
    pub source: String,
    pub footprint: usize,
}

#[derive(Debug, Default)]
struct Slot {
    generation: u32,
    entry: Option<CompiledPattern>,
}

/// Slot table of compiled patterns. Freed slots are reused, so an id is
/// unique only among live patterns; the per-slot generation tells a stale
/// holder apart from the current occupant.
#[derive(Debug)]
pub struct RplxTable {
    slots: Vec<Slot>,
    free: Vec<usize>,
    live: usize,
}

impl RplxTable {
    pub fn new() -> Self {
        RplxTable {
            slots: Vec::with_capacity(INITIAL_RPLX_SLOTS),
            free: Vec::new(),
            live: 0,
        }
    }

    pub fn insert(&mut self, compiled: CompiledPattern) -> RosieResult<(PatternId, u32)> {
        let index = match self.free.pop() {
            Some(index) => index,
            None => {
                if self.slots.len() >= u32::MAX as usize {
                    return Err(RosieError::Internal("compiled pattern table is full".to_string()));
                }
                self.slots.push(Slot::default());
                self.slots.len() - 1
            }
        };
        let slot = &mut self.slots[index];
        slot.entry = Some(compiled);
        self.live += 1;
        Ok((PatternId(index as u32 + 1), slot.generation))
    }

    pub fn get(&self, id: PatternId) -> RosieResult<&CompiledPattern> {
        self.slots
            .get(id.index())
            .and_then(|slot| slot.entry.as_ref())
            .ok_or(RosieError::InvalidHandle(id.get()))
    }

    /// Generation of the live pattern at `id`, if any.
    pub fn generation(&self, id: PatternId) -> Option<u32> {
        self.slots
            .get(id.index())
            .filter(|slot| slot.entry.is_some())
            .map(|slot| slot.generation)
    }

    pub fn remove(&mut self, id: PatternId) -> RosieResult<CompiledPattern> {
        let index = id.index();
        let entry = self
            .slots
            .get_mut(index)
            .and_then(|slot| {
                let entry = slot.entry.take()?;
                slot.generation = slot.generation.wrapping_add(1);
                Some(entry)
            })
            .ok_or(RosieError::InvalidHandle(id.get()))?;
        self.free.push(index);
        self.live -= 1;
        Ok(entry)
    }

    /// Free every live pattern; returns how many there were.
    pub fn clear(&mut self) -> usize {
        let freed = self.live;
        for (index, slot) in self.slots.iter_mut().enumerate() {
            if slot.entry.take().is_some() {
                slot.generation = slot.generation.wrapping_add(1);
                self.free.push(index);
            }
        }
        self.live = 0;
        freed
    }

    pub fn len(&self) -> usize {
        self.live
    }

    pub fn is_empty(&self) -> bool {
        self.live == 0
    }

    pub fn footprint(&self) -> usize {
        self.slots
            .iter()
            .filter_map(|slot| slot.entry.as_ref())
            .map(|entry| entry.footprint)
            .sum()
    }
}

impl Default for RplxTable {
    fn default() -> Self {
        Self::new()
    }
}

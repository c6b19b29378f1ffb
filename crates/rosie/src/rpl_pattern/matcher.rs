// Pattern matching engine
//
// Recursive PEG interpretation of a compiled `Pattern` over raw bytes:
// - MatchState holds input, limits, the pending capture nodes and the abend flag
// - match_impl walks the pattern tree; ordered choice backtracks, repetition is possessive
// - Capture nodes are charged against the allocation budget as they are created
// - Every failure path truncates the pending nodes back to its mark

use crate::rosie_vm::rosie_limits::CAPTURE_NODE_COST;
use crate::rpl_pattern::match_node::MatchNode;
use crate::rpl_pattern::pattern::Pattern;
use crate::rpl_pattern::trace::TraceLog;
use smol_str::SmolStr;

/// Why a match attempt was aborted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Abend {
    /// Matcher recursion exceeded the configured depth
    TooDeep,
    /// Capture allocation exceeded the session's remaining budget
    AllocLimit,
}

#[derive(Debug, Clone, Copy)]
pub struct MatchLimits {
    pub max_depth: usize,
    /// Bytes of capture nodes this match may allocate; `None` means unlimited
    pub budget: Option<usize>,
}

#[derive(Debug, Clone)]
pub struct MatchOutcome {
    pub node: Option<MatchNode>,
    /// Exclusive end of the match, when it matched
    pub end: Option<usize>,
    pub abend: Option<Abend>,
}

pub struct MatchState<'a> {
    input: &'a [u8],
    matchdepth: usize,
    limits: MatchLimits,
    allocated: usize,
    nodes: Vec<MatchNode>,
    abend: Option<Abend>,
    trace: Option<&'a mut TraceLog>,
}

/// Match `pattern` anchored at byte offset `start` (0-based).
pub fn match_pattern<'a>(
    pattern: &Pattern,
    input: &'a [u8],
    start: usize,
    limits: MatchLimits,
    trace: Option<&'a mut TraceLog>,
) -> MatchOutcome {
    let mut ms = MatchState {
        input,
        matchdepth: 0,
        limits,
        allocated: 0,
        nodes: Vec::new(),
        abend: None,
        trace,
    };

    let end = ms.match_impl(pattern, start);
    if let Some(abend) = ms.abend {
        return MatchOutcome {
            node: None,
            end: None,
            abend: Some(abend),
        };
    }

    match end {
        Some(end) => {
            let node = if ms.nodes.len() == 1 {
                ms.nodes.pop()
            } else {
                Some(MatchNode::new(
                    SmolStr::new_static("*"),
                    start,
                    end,
                    std::mem::take(&mut ms.nodes),
                ))
            };
            MatchOutcome {
                node,
                end: Some(end),
                abend: None,
            }
        }
        None => MatchOutcome {
            node: None,
            end: None,
            abend: None,
        },
    }
}

/// Decode the character at `pos`. Invalid UTF-8 yields U+FFFD spanning one byte.
#[inline]
pub fn decode_char(input: &[u8], pos: usize) -> Option<(char, usize)> {
    let b = *input.get(pos)?;
    if b < 0x80 {
        return Some((b as char, 1));
    }
    let width = match b {
        0xc2..=0xdf => 2,
        0xe0..=0xef => 3,
        0xf0..=0xf4 => 4,
        _ => return Some((char::REPLACEMENT_CHARACTER, 1)),
    };
    let end = pos + width;
    if end > input.len() {
        return Some((char::REPLACEMENT_CHARACTER, 1));
    }
    match std::str::from_utf8(&input[pos..end]) {
        Ok(s) => s.chars().next().map(|c| (c, width)),
        Err(_) => Some((char::REPLACEMENT_CHARACTER, 1)),
    }
}

impl<'a> MatchState<'a> {
    fn set_abend(&mut self, abend: Abend) {
        if self.abend.is_none() {
            self.abend = Some(abend);
        }
    }

    #[inline]
    fn aborted(&self) -> bool {
        self.abend.is_some()
    }

    fn charge_node(&mut self) -> bool {
        self.allocated += CAPTURE_NODE_COST;
        if let Some(budget) = self.limits.budget
            && self.allocated > budget
        {
            self.set_abend(Abend::AllocLimit);
            return false;
        }
        true
    }

    fn match_impl(&mut self, p: &Pattern, pos: usize) -> Option<usize> {
        self.matchdepth += 1;
        if self.matchdepth > self.limits.max_depth {
            self.set_abend(Abend::TooDeep);
            self.matchdepth -= 1;
            return None;
        }

        let event = match self.trace.as_deref_mut() {
            Some(log) => log.enter(p, self.matchdepth - 1, pos),
            None => None,
        };

        let result = self.do_match(p, pos);

        if let (Some(log), Some(event)) = (self.trace.as_deref_mut(), event) {
            log.leave(event, result);
        }
        self.matchdepth -= 1;
        result
    }

    fn do_match(&mut self, p: &Pattern, pos: usize) -> Option<usize> {
        let input = self.input;
        match p {
            Pattern::Literal(bytes) => {
                if input.get(pos..)?.starts_with(bytes) {
                    Some(pos + bytes.len())
                } else {
                    None
                }
            }
            Pattern::LiteralCi(bytes) => {
                let end = pos + bytes.len();
                let candidate = input.get(pos..end)?;
                if candidate.eq_ignore_ascii_case(bytes) {
                    Some(end)
                } else {
                    None
                }
            }
            Pattern::Any => decode_char(input, pos).map(|(_, len)| pos + len),
            Pattern::Set(set) => {
                let (c, len) = decode_char(input, pos)?;
                if set.matches(c) { Some(pos + len) } else { None }
            }
            Pattern::Seq(items) => {
                let mut cur = pos;
                for item in items {
                    cur = self.match_impl(item, cur)?;
                }
                Some(cur)
            }
            Pattern::Choice(alternatives) => {
                let mark = self.nodes.len();
                for alt in alternatives {
                    if let Some(end) = self.match_impl(alt, pos) {
                        return Some(end);
                    }
                    self.nodes.truncate(mark);
                    if self.aborted() {
                        return None;
                    }
                }
                None
            }
            Pattern::Repeat { pattern, min, max } => self.match_repeat(pattern, *min, *max, pos),
            Pattern::Not(pattern) => {
                let mark = self.nodes.len();
                let inner = self.match_impl(pattern, pos);
                self.nodes.truncate(mark);
                if self.aborted() || inner.is_some() {
                    None
                } else {
                    Some(pos)
                }
            }
            Pattern::Ahead(pattern) => {
                let mark = self.nodes.len();
                let inner = self.match_impl(pattern, pos);
                self.nodes.truncate(mark);
                inner.map(|_| pos)
            }
            Pattern::Boundary => self.match_boundary(pos),
            Pattern::Start => (pos == 0).then_some(pos),
            Pattern::End => (pos == input.len()).then_some(pos),
            Pattern::Capture { name, pattern } => {
                let mark = self.nodes.len();
                match self.match_impl(pattern, pos) {
                    Some(end) => {
                        if !self.charge_node() {
                            self.nodes.truncate(mark);
                            return None;
                        }
                        let subs = self.nodes.split_off(mark);
                        self.nodes.push(MatchNode::new(name.clone(), pos, end, subs));
                        Some(end)
                    }
                    None => {
                        self.nodes.truncate(mark);
                        None
                    }
                }
            }
            Pattern::Alias { pattern, .. } => self.match_impl(pattern, pos),
            Pattern::Find { pattern, all } => {
                let mut cur = self.find_once(pattern, pos)?;
                if *all {
                    loop {
                        let mark = self.nodes.len();
                        match self.find_once(pattern, cur) {
                            Some(end) if end > cur => cur = end,
                            _ => {
                                self.nodes.truncate(mark);
                                if self.aborted() {
                                    return None;
                                }
                                break;
                            }
                        }
                    }
                }
                Some(cur)
            }
        }
    }

    fn match_repeat(&mut self, p: &Pattern, min: u32, max: Option<u32>, pos: usize) -> Option<usize> {
        let mut count = 0u32;
        let mut cur = pos;
        while max.is_none_or(|max| count < max) {
            let mark = self.nodes.len();
            match self.match_impl(p, cur) {
                Some(end) => {
                    count += 1;
                    if end == cur {
                        // an empty iteration would repeat forever
                        break;
                    }
                    cur = end;
                }
                None => {
                    self.nodes.truncate(mark);
                    if self.aborted() {
                        return None;
                    }
                    break;
                }
            }
        }
        if count < min {
            // an empty iteration satisfies any remaining minimum
            if count > 0 && cur == pos {
                return Some(cur);
            }
            return None;
        }
        Some(cur)
    }

    // Leftmost match of `p` at or after `pos`; returns the end of that match
    fn find_once(&mut self, p: &Pattern, pos: usize) -> Option<usize> {
        let mut i = pos;
        loop {
            let mark = self.nodes.len();
            if let Some(end) = self.match_impl(p, i) {
                return Some(end);
            }
            self.nodes.truncate(mark);
            if self.aborted() {
                return None;
            }
            let (_, len) = decode_char(self.input, i)?;
            i += len;
        }
    }

    // `~`: a run of whitespace, or a zero-width edge at the ends of the
    // input or next to punctuation
    fn match_boundary(&mut self, pos: usize) -> Option<usize> {
        let input = self.input;
        let mut end = pos;
        while end < input.len() && input[end].is_ascii_whitespace() {
            end += 1;
        }
        if end > pos {
            return Some(end);
        }
        if pos == 0 || pos >= input.len() {
            return Some(pos);
        }
        let prev = input[pos - 1];
        let next = input[pos];
        if prev.is_ascii_punctuation() || next.is_ascii_punctuation() {
            return Some(pos);
        }
        None
    }
}

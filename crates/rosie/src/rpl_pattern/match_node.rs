use smol_str::SmolStr;

/// One capture in a match tree. Positions are 0-based byte offsets, `end` exclusive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchNode {
    pub kind: SmolStr,
    pub start: usize,
    pub end: usize,
    pub subs: Vec<MatchNode>,
}

impl MatchNode {
    pub fn new(kind: SmolStr, start: usize, end: usize, subs: Vec<MatchNode>) -> Self {
        MatchNode {
            kind,
            start,
            end,
            subs,
        }
    }

    pub fn text<'a>(&self, input: &'a [u8]) -> &'a [u8] {
        let end = self.end.min(input.len());
        let start = self.start.min(end);
        &input[start..end]
    }

}

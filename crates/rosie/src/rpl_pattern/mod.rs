mod match_node;
mod matcher;
mod pattern;
mod trace;

pub use match_node::MatchNode;
pub use matcher::{Abend, MatchLimits, MatchOutcome, decode_char, match_pattern};
pub use pattern::{CharClass, CharSet, Pattern, SetItem};
pub use trace::{TraceEvent, TraceLog, TraceReport, TraceStyle};

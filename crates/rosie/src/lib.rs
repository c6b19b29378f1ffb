// Rosie pattern engine
// Sessions, compiled patterns and the matching protocol, with a compiler
// for the pattern language and encoders for match output

#[cfg(test)]
mod test;

pub mod compiler;
pub mod encoder;
pub mod matchfile;
pub mod package;
pub mod rcfile;
pub mod rosie_buffer;
pub mod rosie_vm;
pub mod rpl_pattern;

pub use encoder::{EncodeContext, Encoder};
pub use matchfile::{MatchFileCounts, MatchFileRequest};
pub use rcfile::{RcFile, RcOption};
pub use rosie_buffer::ByteBuffer;
pub use rosie_vm::{
    AllocLimit, ConfigEntry, Diagnostic, Engine, EngineConfig, EngineOption, LoadOutcome,
    MatchResult, PatternId, RosieError, RosieResult, Rplx, TraceResult, Who,
};

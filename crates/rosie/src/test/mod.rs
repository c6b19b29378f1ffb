pub mod test_alloc;
pub mod test_buffer;
pub mod test_encoder;
pub mod test_load;
pub mod test_matchfile;
pub mod test_parser;
pub mod test_trace;

use crate::rosie_vm::{Engine, EngineOption};

/// Session that only sees the built-in packages.
pub(crate) fn new_engine() -> Engine {
    Engine::new(EngineOption::default().with_libpath("")).unwrap()
}

// Output encoders
// An encoder turns a successful match into the bytes handed back to the
// caller. Built-in encoders are registered by name when a session starts;
// hosts may add their own through `Engine::register_encoder`.

mod color;
mod json;
mod simple;

pub use color::{ColorEncoder, ColorMap};
pub use json::{JsonEncoder, JsonPrettyEncoder};
pub use simple::{BoolEncoder, ByteEncoder, LineEncoder};

use crate::rosie_vm::rosie_limits::MAX_ENCODER_NAME_LENGTH;
use crate::rosie_vm::{RosieError, RosieResult};
use crate::rpl_pattern::MatchNode;
use ahash::AHashMap;
use smol_str::SmolStr;
use std::sync::Arc;

/// Everything an encoder may look at.
pub struct EncodeContext<'a> {
    /// The whole input record
    pub input: &'a [u8],
    /// Root of the match tree
    pub node: &'a MatchNode,
    pub colors: &'a ColorMap,
}

pub trait Encoder: Send + Sync {
    /// Encoded output, or `None` for a match that carries no data.
    fn encode(&self, cx: &EncodeContext) -> RosieResult<Option<Vec<u8>>>;
}

/// Encoders known to a session, by name.
#[derive(Clone)]
pub struct EncoderRegistry {
    encoders: AHashMap<SmolStr, Arc<dyn Encoder>>,
}

impl EncoderRegistry {
    pub fn new() -> Self {
        Self {
            encoders: AHashMap::new(),
        }
    }

    /// Registry holding the built-in encoders.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        let json: Arc<dyn Encoder> = Arc::new(JsonEncoder);
        let color: Arc<dyn Encoder> = Arc::new(ColorEncoder);
        registry.insert("bool", Arc::new(BoolEncoder));
        registry.insert("byte", Arc::new(ByteEncoder));
        registry.insert("line", Arc::new(LineEncoder));
        registry.insert("json", json.clone());
        registry.insert("tree", json);
        registry.insert("jsonpp", Arc::new(JsonPrettyEncoder));
        registry.insert("color", color.clone());
        registry.insert("highlight", color);
        registry
    }

    fn insert(&mut self, name: &str, encoder: Arc<dyn Encoder>) {
        self.encoders.insert(SmolStr::new(name), encoder);
    }

    pub fn register(&mut self, name: &str, encoder: Arc<dyn Encoder>) -> RosieResult<()> {
        check_name(name)?;
        self.insert(name, encoder);
        Ok(())
    }

    pub fn get(&self, name: &str) -> RosieResult<Arc<dyn Encoder>> {
        check_name(name)?;
        self.encoders
            .get(name)
            .cloned()
            .ok_or_else(|| RosieError::InvalidEncoder(name.to_string()))
    }

    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.encoders.keys().map(SmolStr::as_str).collect();
        names.sort_unstable();
        names
    }
}

impl Default for EncoderRegistry {
    fn default() -> Self {
        Self::with_builtins()
    }
}

fn check_name(name: &str) -> RosieResult<()> {
    if name.is_empty() || name.len() > MAX_ENCODER_NAME_LENGTH {
        return Err(RosieError::InvalidEncoder(name.to_string()));
    }
    Ok(())
}

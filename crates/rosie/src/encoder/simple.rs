use crate::encoder::{EncodeContext, Encoder};
use crate::rosie_vm::RosieResult;

/// Presence only: a match carries no data.
pub struct BoolEncoder;

impl Encoder for BoolEncoder {
    fn encode(&self, _cx: &EncodeContext) -> RosieResult<Option<Vec<u8>>> {
        Ok(None)
    }
}

/// The matched span, byte for byte.
pub struct ByteEncoder;

impl Encoder for ByteEncoder {
    fn encode(&self, cx: &EncodeContext) -> RosieResult<Option<Vec<u8>>> {
        Ok(Some(cx.node.text(cx.input).to_vec()))
    }
}

/// The whole input record the match was found in.
pub struct LineEncoder;

impl Encoder for LineEncoder {
    fn encode(&self, cx: &EncodeContext) -> RosieResult<Option<Vec<u8>>> {
        Ok(Some(cx.input.to_vec()))
    }
}

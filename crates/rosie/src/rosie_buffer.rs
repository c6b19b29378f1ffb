// Length-prefixed byte buffer
// Every engine-produced output travels in one of these. There is no
// terminator: a zero byte inside the buffer is ordinary data.

use crate::rosie_vm::{RosieError, RosieResult};
use std::borrow::Cow;
use std::fmt;

/// Owned, engine-produced bytes with a `u32` length.
#[derive(Clone, Default, PartialEq, Eq, Hash)]
pub struct ByteBuffer {
    data: Vec<u8>,
}

impl ByteBuffer {
    pub const fn new() -> Self {
        ByteBuffer { data: Vec::new() }
    }

    /// Wrap `data`, refusing anything whose length does not fit the wire's `u32`.
    pub fn from_vec(data: Vec<u8>) -> RosieResult<Self> {
        if u32::try_from(data.len()).is_err() {
            return Err(RosieError::Internal(format!(
                "buffer of {} bytes exceeds the 4 GB length field",
                data.len()
            )));
        }
        Ok(ByteBuffer { data })
    }

    pub fn copy_from(bytes: &[u8]) -> RosieResult<Self> {
        Self::from_vec(bytes.to_vec())
    }

    #[inline]
    pub fn len(&self) -> u32 {
        // from_vec guarantees the length fits
        self.data.len() as u32
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    #[inline]
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    pub fn into_vec(self) -> Vec<u8> {
        self.data
    }

    pub fn to_string_lossy(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.data)
    }
}

impl AsRef<[u8]> for ByteBuffer {
    fn as_ref(&self) -> &[u8] {
        &self.data
    }
}

impl TryFrom<Vec<u8>> for ByteBuffer {
    type Error = RosieError;

    fn try_from(data: Vec<u8>) -> RosieResult<Self> {
        ByteBuffer::from_vec(data)
    }
}

impl TryFrom<String> for ByteBuffer {
    type Error = RosieError;

    fn try_from(s: String) -> RosieResult<Self> {
        ByteBuffer::from_vec(s.into_bytes())
    }
}

impl fmt::Debug for ByteBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ByteBuffer")
            .field("len", &self.data.len())
            .field("data", &String::from_utf8_lossy(&self.data))
            .finish()
    }
}

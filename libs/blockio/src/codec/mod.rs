//! Binary codecs for device memory images
//!
//! A codec pairs a value type with an endianness and a fixed encoded size,
//! and reads/writes against a [`BlockBuffer`] at a given offset. Extension
//! is by composition, not inheritance: the text codec is built on top of
//! the raw byte-array codec spanning the same slot.
//!
//! Dispatch is a tagged enum rather than trait objects, so codecs stay
//! `Copy`/`Clone`-friendly and statically matched.

mod scalar;
mod text;

pub use scalar::{BytesCodec, ScalarCodec, ScalarType};
pub use text::TextCodec;

use serde::{Deserialize, Serialize};

use crate::buffer::BlockBuffer;
use crate::error::Result;
use crate::value::PointValue;

/// Byte order used for multi-byte numeric encodings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum Endianness {
    #[default]
    Big,
    Little,
}

/// Codec dispatch over the supported slot encodings
#[derive(Debug, Clone)]
pub enum Codec {
    /// Scalar numerics and bool
    Scalar(ScalarCodec),
    /// Raw fixed-length byte arrays
    Bytes(BytesCodec),
    /// Framed, charset-heuristic text slots
    Text(TextCodec),
}

impl Codec {
    /// Number of buffer bytes this codec consumes
    pub fn size(&self) -> usize {
        match self {
            Codec::Scalar(c) => c.size(),
            Codec::Bytes(c) => c.size(),
            Codec::Text(c) => c.size(),
        }
    }

    /// Decode a value from `buf` at `offset`
    pub fn read(&self, buf: &BlockBuffer, offset: usize) -> Result<PointValue> {
        match self {
            Codec::Scalar(c) => c.read(buf, offset),
            Codec::Bytes(c) => c.read(buf, offset),
            Codec::Text(c) => c.read(buf, offset),
        }
    }

    /// Encode `value` into `buf` at `offset`
    pub fn write(&self, buf: &mut BlockBuffer, offset: usize, value: &PointValue) -> Result<()> {
        match self {
            Codec::Scalar(c) => c.write(buf, offset, value),
            Codec::Bytes(c) => c.write(buf, offset, value),
            Codec::Text(c) => c.write(buf, offset, value),
        }
    }
}

impl From<ScalarCodec> for Codec {
    fn from(c: ScalarCodec) -> Self {
        Codec::Scalar(c)
    }
}

impl From<BytesCodec> for Codec {
    fn from(c: BytesCodec) -> Self {
        Codec::Bytes(c)
    }
}

impl From<TextCodec> for Codec {
    fn from(c: TextCodec) -> Self {
        Codec::Text(c)
    }
}

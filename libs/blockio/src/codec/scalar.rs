//! Scalar and raw byte-array codecs
//!
//! Scalar codecs are strict: a value that cannot represent the target type
//! (wrong variant, unparseable string) is an encode/decode error reported
//! per point, never a silent zero.

use serde::{Deserialize, Serialize};

use super::Endianness;
use crate::buffer::BlockBuffer;
use crate::error::{BlockIoError, Result};
use crate::value::PointValue;

/// Scalar value encodings supported on the wire
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScalarType {
    Bool,
    U8,
    I8,
    U16,
    I16,
    U32,
    I32,
    U64,
    I64,
    F32,
    F64,
}

impl ScalarType {
    /// Encoded size in bytes
    pub fn size(&self) -> usize {
        match self {
            ScalarType::Bool | ScalarType::U8 | ScalarType::I8 => 1,
            ScalarType::U16 | ScalarType::I16 => 2,
            ScalarType::U32 | ScalarType::I32 | ScalarType::F32 => 4,
            ScalarType::U64 | ScalarType::I64 | ScalarType::F64 => 8,
        }
    }
}

/// Fixed-size scalar codec with explicit byte order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScalarCodec {
    ty: ScalarType,
    order: Endianness,
}

impl ScalarCodec {
    pub fn new(ty: ScalarType, order: Endianness) -> Self {
        Self { ty, order }
    }

    pub fn scalar_type(&self) -> ScalarType {
        self.ty
    }

    pub fn endianness(&self) -> Endianness {
        self.order
    }

    /// Encoded size in bytes
    #[inline]
    pub fn size(&self) -> usize {
        self.ty.size()
    }

    /// Decode this codec's value from `buf` at `offset`
    pub fn read(&self, buf: &BlockBuffer, offset: usize) -> Result<PointValue> {
        let raw = buf.get_range(offset, self.size())?;
        let value = match self.ty {
            ScalarType::Bool => PointValue::Bool(raw[0] != 0),
            ScalarType::U8 => PointValue::Integer(raw[0] as i64),
            ScalarType::I8 => PointValue::Integer(raw[0] as i8 as i64),
            ScalarType::U16 => {
                let b = [raw[0], raw[1]];
                let v = match self.order {
                    Endianness::Big => u16::from_be_bytes(b),
                    Endianness::Little => u16::from_le_bytes(b),
                };
                PointValue::Integer(v as i64)
            },
            ScalarType::I16 => {
                let b = [raw[0], raw[1]];
                let v = match self.order {
                    Endianness::Big => i16::from_be_bytes(b),
                    Endianness::Little => i16::from_le_bytes(b),
                };
                PointValue::Integer(v as i64)
            },
            ScalarType::U32 => {
                let b = [raw[0], raw[1], raw[2], raw[3]];
                let v = match self.order {
                    Endianness::Big => u32::from_be_bytes(b),
                    Endianness::Little => u32::from_le_bytes(b),
                };
                PointValue::Integer(v as i64)
            },
            ScalarType::I32 => {
                let b = [raw[0], raw[1], raw[2], raw[3]];
                let v = match self.order {
                    Endianness::Big => i32::from_be_bytes(b),
                    Endianness::Little => i32::from_le_bytes(b),
                };
                PointValue::Integer(v as i64)
            },
            ScalarType::U64 => {
                let b = [
                    raw[0], raw[1], raw[2], raw[3], raw[4], raw[5], raw[6], raw[7],
                ];
                let v = match self.order {
                    Endianness::Big => u64::from_be_bytes(b),
                    Endianness::Little => u64::from_le_bytes(b),
                };
                PointValue::Integer(v as i64)
            },
            ScalarType::I64 => {
                let b = [
                    raw[0], raw[1], raw[2], raw[3], raw[4], raw[5], raw[6], raw[7],
                ];
                let v = match self.order {
                    Endianness::Big => i64::from_be_bytes(b),
                    Endianness::Little => i64::from_le_bytes(b),
                };
                PointValue::Integer(v)
            },
            ScalarType::F32 => {
                let b = [raw[0], raw[1], raw[2], raw[3]];
                let v = match self.order {
                    Endianness::Big => f32::from_be_bytes(b),
                    Endianness::Little => f32::from_le_bytes(b),
                };
                PointValue::Float(v as f64)
            },
            ScalarType::F64 => {
                let b = [
                    raw[0], raw[1], raw[2], raw[3], raw[4], raw[5], raw[6], raw[7],
                ];
                let v = match self.order {
                    Endianness::Big => f64::from_be_bytes(b),
                    Endianness::Little => f64::from_le_bytes(b),
                };
                PointValue::Float(v)
            },
        };
        Ok(value)
    }

    /// Encode `value` into `buf` at `offset`
    pub fn write(&self, buf: &mut BlockBuffer, offset: usize, value: &PointValue) -> Result<()> {
        let bytes = self.encode_value(value)?;
        buf.put_range(offset, &bytes)
    }

    fn int_value(&self, value: &PointValue) -> Result<i64> {
        value.as_i64().ok_or_else(|| {
            BlockIoError::encode(format!("cannot encode {:?} as {:?}", value, self.ty))
        })
    }

    fn float_value(&self, value: &PointValue) -> Result<f64> {
        value.as_f64().ok_or_else(|| {
            BlockIoError::encode(format!("cannot encode {:?} as {:?}", value, self.ty))
        })
    }

    fn encode_value(&self, value: &PointValue) -> Result<Vec<u8>> {
        let bytes = match self.ty {
            ScalarType::Bool => {
                let v = value.as_bool().ok_or_else(|| {
                    BlockIoError::encode(format!("cannot encode {:?} as Bool", value))
                })?;
                vec![v as u8]
            },
            ScalarType::U8 => vec![self.int_value(value)? as u8],
            ScalarType::I8 => vec![self.int_value(value)? as i8 as u8],
            ScalarType::U16 => {
                let v = self.int_value(value)? as u16;
                match self.order {
                    Endianness::Big => v.to_be_bytes().to_vec(),
                    Endianness::Little => v.to_le_bytes().to_vec(),
                }
            },
            ScalarType::I16 => {
                let v = self.int_value(value)? as i16;
                match self.order {
                    Endianness::Big => v.to_be_bytes().to_vec(),
                    Endianness::Little => v.to_le_bytes().to_vec(),
                }
            },
            ScalarType::U32 => {
                let v = self.int_value(value)? as u32;
                match self.order {
                    Endianness::Big => v.to_be_bytes().to_vec(),
                    Endianness::Little => v.to_le_bytes().to_vec(),
                }
            },
            ScalarType::I32 => {
                let v = self.int_value(value)? as i32;
                match self.order {
                    Endianness::Big => v.to_be_bytes().to_vec(),
                    Endianness::Little => v.to_le_bytes().to_vec(),
                }
            },
            ScalarType::U64 => {
                let v = self.int_value(value)? as u64;
                match self.order {
                    Endianness::Big => v.to_be_bytes().to_vec(),
                    Endianness::Little => v.to_le_bytes().to_vec(),
                }
            },
            ScalarType::I64 => {
                let v = self.int_value(value)?;
                match self.order {
                    Endianness::Big => v.to_be_bytes().to_vec(),
                    Endianness::Little => v.to_le_bytes().to_vec(),
                }
            },
            ScalarType::F32 => {
                let v = self.float_value(value)? as f32;
                match self.order {
                    Endianness::Big => v.to_be_bytes().to_vec(),
                    Endianness::Little => v.to_le_bytes().to_vec(),
                }
            },
            ScalarType::F64 => {
                let v = self.float_value(value)?;
                match self.order {
                    Endianness::Big => v.to_be_bytes().to_vec(),
                    Endianness::Little => v.to_le_bytes().to_vec(),
                }
            },
        };
        Ok(bytes)
    }
}

/// Raw fixed-length byte-array codec
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BytesCodec {
    size: usize,
}

impl BytesCodec {
    pub fn new(size: usize) -> Self {
        Self { size }
    }

    /// Encoded size in bytes
    #[inline]
    pub fn size(&self) -> usize {
        self.size
    }

    /// Decode the raw slot as a `Bytes` value
    pub fn read(&self, buf: &BlockBuffer, offset: usize) -> Result<PointValue> {
        Ok(PointValue::Bytes(self.read_raw(buf, offset)?.to_vec()))
    }

    /// Borrow the raw slot bytes without copying
    pub fn read_raw<'a>(&self, buf: &'a BlockBuffer, offset: usize) -> Result<&'a [u8]> {
        buf.get_range(offset, self.size)
    }

    /// Encode a `Bytes` value; the length must match the slot exactly
    pub fn write(&self, buf: &mut BlockBuffer, offset: usize, value: &PointValue) -> Result<()> {
        let bytes = match value {
            PointValue::Bytes(b) => b.as_slice(),
            other => {
                return Err(BlockIoError::encode(format!(
                    "cannot encode {:?} as raw bytes",
                    other
                )))
            },
        };
        self.write_raw(buf, offset, bytes)
    }

    /// Write a raw slice spanning the whole slot
    pub fn write_raw(&self, buf: &mut BlockBuffer, offset: usize, bytes: &[u8]) -> Result<()> {
        if bytes.len() != self.size {
            return Err(BlockIoError::encode(format!(
                "byte array length {} does not match slot size {}",
                bytes.len(),
                self.size
            )));
        }
        buf.put_range(offset, bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn roundtrip(ty: ScalarType, order: Endianness, value: PointValue) {
        let codec = ScalarCodec::new(ty, order);
        let mut buf = BlockBuffer::new(codec.size() + 2);
        codec.write(&mut buf, 1, &value).unwrap();
        let back = codec.read(&buf, 1).unwrap();
        assert_eq!(back, value, "{:?} {:?}", ty, order);
    }

    // ---------- round trips across all scalar types and byte orders ----------

    #[test]
    fn test_roundtrip_integers_both_orders() {
        for order in [Endianness::Big, Endianness::Little] {
            roundtrip(ScalarType::U8, order, PointValue::Integer(200));
            roundtrip(ScalarType::I8, order, PointValue::Integer(-100));
            roundtrip(ScalarType::U16, order, PointValue::Integer(0xBEEF));
            roundtrip(ScalarType::I16, order, PointValue::Integer(-20000));
            roundtrip(ScalarType::U32, order, PointValue::Integer(0x1234_5678));
            roundtrip(ScalarType::I32, order, PointValue::Integer(-123_456));
            roundtrip(ScalarType::I64, order, PointValue::Integer(-9_876_543_210));
            roundtrip(ScalarType::U64, order, PointValue::Integer(9_876_543_210));
        }
    }

    #[test]
    fn test_roundtrip_floats_and_bool() {
        for order in [Endianness::Big, Endianness::Little] {
            roundtrip(ScalarType::F64, order, PointValue::Float(-273.15));
            roundtrip(ScalarType::Bool, order, PointValue::Bool(true));
            roundtrip(ScalarType::Bool, order, PointValue::Bool(false));

            // f32 loses f64 precision; compare against the f32 value
            let codec = ScalarCodec::new(ScalarType::F32, order);
            let mut buf = BlockBuffer::new(4);
            codec.write(&mut buf, 0, &PointValue::Float(123.456)).unwrap();
            match codec.read(&buf, 0).unwrap() {
                PointValue::Float(f) => assert!((f - 123.456).abs() < 1e-4),
                other => panic!("expected float, got {:?}", other),
            }
        }
    }

    // ---------- byte-order layout ----------

    #[test]
    fn test_u32_big_endian_layout() {
        let codec = ScalarCodec::new(ScalarType::U32, Endianness::Big);
        let mut buf = BlockBuffer::new(4);
        codec
            .write(&mut buf, 0, &PointValue::Integer(0x1234_5678))
            .unwrap();
        assert_eq!(buf.as_slice(), &[0x12, 0x34, 0x56, 0x78]);
    }

    #[test]
    fn test_u32_little_endian_layout() {
        let codec = ScalarCodec::new(ScalarType::U32, Endianness::Little);
        let mut buf = BlockBuffer::new(4);
        codec
            .write(&mut buf, 0, &PointValue::Integer(0x1234_5678))
            .unwrap();
        assert_eq!(buf.as_slice(), &[0x78, 0x56, 0x34, 0x12]);
    }

    // ---------- strictness ----------

    #[test]
    fn test_encode_type_mismatch_is_error() {
        let codec = ScalarCodec::new(ScalarType::U16, Endianness::Big);
        let mut buf = BlockBuffer::new(2);

        let err = codec
            .write(&mut buf, 0, &PointValue::Bytes(vec![1]))
            .unwrap_err();
        assert!(matches!(err, BlockIoError::EncodeError(_)));

        let err = codec
            .write(&mut buf, 0, &PointValue::from("not a number"))
            .unwrap_err();
        assert!(matches!(err, BlockIoError::EncodeError(_)));
    }

    #[test]
    fn test_numeric_string_values_parse() {
        let codec = ScalarCodec::new(ScalarType::U16, Endianness::Big);
        let mut buf = BlockBuffer::new(2);
        codec.write(&mut buf, 0, &PointValue::from("456")).unwrap();
        assert_eq!(codec.read(&buf, 0).unwrap(), PointValue::Integer(456));
    }

    #[test]
    fn test_read_past_end_is_out_of_range() {
        let codec = ScalarCodec::new(ScalarType::U32, Endianness::Big);
        let buf = BlockBuffer::new(3);
        assert!(matches!(
            codec.read(&buf, 0),
            Err(BlockIoError::OutOfRange(_))
        ));
    }

    // ---------- raw byte arrays ----------

    #[test]
    fn test_bytes_codec_roundtrip() {
        let codec = BytesCodec::new(4);
        let mut buf = BlockBuffer::new(6);
        codec
            .write(&mut buf, 1, &PointValue::Bytes(vec![9, 8, 7, 6]))
            .unwrap();
        assert_eq!(
            codec.read(&buf, 1).unwrap(),
            PointValue::Bytes(vec![9, 8, 7, 6])
        );
    }

    #[test]
    fn test_bytes_codec_length_mismatch() {
        let codec = BytesCodec::new(4);
        let mut buf = BlockBuffer::new(4);
        let err = codec
            .write(&mut buf, 0, &PointValue::Bytes(vec![1, 2]))
            .unwrap_err();
        assert!(matches!(err, BlockIoError::EncodeError(_)));
    }
}

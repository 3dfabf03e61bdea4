//! Single-bit point task
//!
//! Operates on one bit of one byte. Bit points are read directly and
//! written only via UPDATE (read-modify-write): a plain WRITE of a full
//! byte would clobber the other seven bits, which may belong to other
//! points, so it is refused.

use super::{AccessMode, BlockRange};
use crate::buffer::BlockBuffer;
use crate::bytes::{extract_bit_u8, put_bit_u8};
use crate::error::{BlockIoError, Result};
use crate::value::{PointRecord, PointValue, ValueType};

#[derive(Debug)]
pub struct BitTask {
    record: PointRecord,
    byte: u32,
    bit: u8,
    mode: AccessMode,
}

impl BitTask {
    pub fn new(record: PointRecord, byte: u32, bit: u8, mode: AccessMode) -> Result<Self> {
        if bit > 7 {
            return Err(BlockIoError::config(format!(
                "bit index {} out of range 0..=7 for point {}",
                bit, record.point_id
            )));
        }
        Ok(Self {
            record,
            byte,
            bit,
            mode,
        })
    }

    pub fn range(&self) -> BlockRange {
        BlockRange::new(self.byte, self.byte + 1)
    }

    pub fn mode(&self) -> AccessMode {
        self.mode
    }

    pub fn supports(&self, mode: AccessMode) -> bool {
        matches!(mode, AccessMode::Read | AccessMode::Update)
    }

    pub fn record(&self) -> &PointRecord {
        &self.record
    }

    pub fn record_mut(&mut self) -> &mut PointRecord {
        &mut self.record
    }

    pub fn into_record(self) -> PointRecord {
        self.record
    }

    fn local(&self, block_start: u32) -> Result<usize> {
        self.byte
            .checked_sub(block_start)
            .map(|o| o as usize)
            .ok_or_else(|| {
                BlockIoError::out_of_range(format!(
                    "bit byte {} precedes block start {}",
                    self.byte, block_start
                ))
            })
    }

    /// Extract the bit and map it to the point's declared value type.
    /// Only boolean and numeric conversions are defined.
    pub fn decode(&self, block: &BlockBuffer, block_start: u32) -> Result<PointValue> {
        let byte = block.get(self.local(block_start)?)?;
        let on = extract_bit_u8(byte, self.bit);
        match self.record.value_type {
            ValueType::Bool => Ok(PointValue::Bool(on)),
            ValueType::Integer => Ok(PointValue::Integer(on as i64)),
            ValueType::Float => Ok(PointValue::Float(if on { 1.0 } else { 0.0 })),
            other => Err(BlockIoError::decode(format!(
                "bit point {} cannot map to {:?} value",
                self.record.point_id, other
            ))),
        }
    }

    /// Apply this task's bit into the seeded write buffer. The byte is
    /// re-read from the buffer so that sibling bit mutations in the same
    /// byte accumulate instead of overwriting each other.
    pub fn merge(&self, block: &mut BlockBuffer, block_start: u32) -> Result<()> {
        let on = self
            .record
            .value
            .as_ref()
            .and_then(|v| v.as_bool())
            .ok_or_else(|| {
                BlockIoError::encode(format!(
                    "point {} has no boolean value to update",
                    self.record.point_id
                ))
            })?;
        let local = self.local(block_start)?;
        let current = block.get(local)?;
        block.put(local, put_bit_u8(current, self.bit, on))
    }
}

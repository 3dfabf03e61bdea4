//! Byte-range point task
//!
//! Covers `codec.size()` contiguous bytes at a device address and moves a
//! typed value through the codec. Supports READ and WRITE; a general block
//! write has no merge semantics, so UPDATE is refused fast rather than
//! risking unintended bytes.

use super::{AccessMode, BlockRange};
use crate::buffer::BlockBuffer;
use crate::codec::Codec;
use crate::error::{BlockIoError, Result};
use crate::value::{PointRecord, PointValue};

#[derive(Debug)]
pub struct DataTask {
    record: PointRecord,
    codec: Codec,
    range: BlockRange,
    mode: AccessMode,
}

impl DataTask {
    pub fn new(record: PointRecord, codec: Codec, start: u32, mode: AccessMode) -> Self {
        let range = BlockRange::new(start, start + codec.size() as u32);
        Self {
            record,
            codec,
            range,
            mode,
        }
    }

    pub fn range(&self) -> BlockRange {
        self.range
    }

    pub fn mode(&self) -> AccessMode {
        self.mode
    }

    pub fn supports(&self, mode: AccessMode) -> bool {
        matches!(mode, AccessMode::Read | AccessMode::Write)
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

    /// Translate the device-absolute start into a buffer-relative offset
    fn local(&self, block_start: u32) -> Result<usize> {
        self.range
            .start
            .checked_sub(block_start)
            .map(|o| o as usize)
            .ok_or_else(|| {
                BlockIoError::out_of_range(format!(
                    "task start {} precedes block start {}",
                    self.range.start, block_start
                ))
            })
    }

    pub fn decode(&self, block: &BlockBuffer, block_start: u32) -> Result<PointValue> {
        self.codec.read(block, self.local(block_start)?)
    }

    pub fn encode(&self, block: &mut BlockBuffer, block_start: u32) -> Result<()> {
        let value = match (&self.codec, &self.record.value) {
            (_, Some(v)) => v.clone(),
            // A missing string encodes as the empty string
            (Codec::Text(_), None) => PointValue::empty_string(),
            (_, None) => {
                return Err(BlockIoError::encode(format!(
                    "point {} has no value to write",
                    self.record.point_id
                )))
            },
        };
        self.codec.write(block, self.local(block_start)?, &value)
    }
}

//! Point tasks
//!
//! A point task is one point's pending operation: a half-open byte
//! interval in the device's address space plus an access mode. Task
//! variants are a tagged enum with [`PointTask::supports`] as the primary
//! mode dispatch; the `NotSupported` error remains as defense in depth for
//! callers that skip the query.
//!
//! Tasks are created per request batch, consumed during one cycle and
//! never reused. They are owned by the block task that transfers their
//! bytes; run routines receive the block's buffer and start address and
//! translate device-absolute offsets into buffer-relative ones.

mod bit;
mod data;
mod filter;

pub use bit::BitTask;
pub use data::DataTask;
pub use filter::{FilteredTask, MovingAverage, ValueFilter};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::buffer::BlockBuffer;
use crate::error::{BlockIoError, Result};
use crate::value::{PointRecord, PointValue};

/// Access mode of a point request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AccessMode {
    /// Fetch and decode the current device bytes
    Read,
    /// Encode and transfer new device bytes
    Write,
    /// Read-modify-write: merge the new value into the current device
    /// bytes without disturbing co-located data owned by other points
    Update,
}

impl std::fmt::Display for AccessMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AccessMode::Read => write!(f, "READ"),
            AccessMode::Write => write!(f, "WRITE"),
            AccessMode::Update => write!(f, "UPDATE"),
        }
    }
}

/// Half-open byte interval `[start, end)` in device address space
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockRange {
    pub start: u32,
    pub end: u32,
}

impl BlockRange {
    pub fn new(start: u32, end: u32) -> Self {
        debug_assert!(start < end, "empty block range [{}, {})", start, end);
        Self { start, end }
    }

    /// Interval length in bytes
    #[inline]
    pub fn len(&self) -> u32 {
        self.end - self.start
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.start >= self.end
    }

    /// Whether `other` lies fully inside this interval
    #[inline]
    pub fn contains(&self, other: &BlockRange) -> bool {
        self.start <= other.start && other.end <= self.end
    }

    /// Whether the two intervals share at least one byte
    #[inline]
    pub fn overlaps(&self, other: &BlockRange) -> bool {
        self.start < other.end && other.start < self.end
    }
}

/// One point's pending operation, dispatched over the task variants
#[derive(Debug)]
pub enum PointTask {
    /// Byte-range task decoding/encoding through a codec
    Data(DataTask),
    /// Single-bit task within one byte
    Bit(BitTask),
    /// Transparent wrapper applying a value filter around an inner task
    Filtered(FilteredTask),
}

impl PointTask {
    /// Device-address interval covered by this task
    pub fn range(&self) -> BlockRange {
        match self {
            PointTask::Data(t) => t.range(),
            PointTask::Bit(t) => t.range(),
            PointTask::Filtered(t) => t.range(),
        }
    }

    /// Requested access mode
    pub fn mode(&self) -> AccessMode {
        match self {
            PointTask::Data(t) => t.mode(),
            PointTask::Bit(t) => t.mode(),
            PointTask::Filtered(t) => t.mode(),
        }
    }

    /// Whether this task variant implements `mode`
    pub fn supports(&self, mode: AccessMode) -> bool {
        match self {
            PointTask::Data(t) => t.supports(mode),
            PointTask::Bit(t) => t.supports(mode),
            PointTask::Filtered(t) => t.supports(mode),
        }
    }

    pub fn record(&self) -> &PointRecord {
        match self {
            PointTask::Data(t) => t.record(),
            PointTask::Bit(t) => t.record(),
            PointTask::Filtered(t) => t.record(),
        }
    }

    pub fn record_mut(&mut self) -> &mut PointRecord {
        match self {
            PointTask::Data(t) => t.record_mut(),
            PointTask::Bit(t) => t.record_mut(),
            PointTask::Filtered(t) => t.record_mut(),
        }
    }

    pub fn into_record(self) -> PointRecord {
        match self {
            PointTask::Data(t) => t.into_record(),
            PointTask::Bit(t) => t.into_record(),
            PointTask::Filtered(t) => t.into_record(),
        }
    }

    /// Complete the record with a failure status
    pub fn fail(&mut self, err: BlockIoError) {
        self.record_mut().complete_failed(err);
    }

    /// Decode this task's slice of `block` (starting at device address
    /// `block_start`) and complete the record. Failures are captured into
    /// the point status; siblings are unaffected.
    pub fn run_read(&mut self, block: &BlockBuffer, block_start: u32) {
        if !self.supports(AccessMode::Read) {
            let err = BlockIoError::not_supported(format!(
                "point {} does not support READ",
                self.record().point_id
            ));
            self.fail(err);
            return;
        }
        match self.try_read(block, block_start) {
            Ok(value) => self.record_mut().complete_ok(Some(value)),
            Err(err) => {
                debug!(
                    point_id = self.record().point_id,
                    error = %err,
                    "read task failed"
                );
                self.fail(err);
            },
        }
    }

    /// Encode this task's value into `block`. On success the record stays
    /// pending; the owning block completes it once the device transfer
    /// finishes. Encode failures complete the record immediately.
    pub fn run_write(&mut self, block: &mut BlockBuffer, block_start: u32) {
        if !self.supports(AccessMode::Write) {
            let err = BlockIoError::not_supported(format!(
                "point {} does not support WRITE",
                self.record().point_id
            ));
            self.fail(err);
            return;
        }
        if let Err(err) = self.try_write(block, block_start) {
            debug!(
                point_id = self.record().point_id,
                error = %err,
                "write task failed"
            );
            self.fail(err);
        }
    }

    /// Merge this task's value into `block`, which was seeded from the
    /// read-phase snapshot of the same device range, so that co-located
    /// data owned by other points keeps its pre-cycle state. Completion is
    /// deferred to the device transfer, like [`Self::run_write`].
    pub fn run_update(&mut self, block: &mut BlockBuffer, block_start: u32) {
        if !self.supports(AccessMode::Update) {
            let err = BlockIoError::not_supported(format!(
                "point {} does not support UPDATE",
                self.record().point_id
            ));
            self.fail(err);
            return;
        }
        if let Err(err) = self.try_update(block, block_start) {
            debug!(
                point_id = self.record().point_id,
                error = %err,
                "update task failed"
            );
            self.fail(err);
        }
    }

    fn try_read(&mut self, block: &BlockBuffer, block_start: u32) -> Result<PointValue> {
        match self {
            PointTask::Data(t) => t.decode(block, block_start),
            PointTask::Bit(t) => t.decode(block, block_start),
            PointTask::Filtered(t) => t.try_read(block, block_start),
        }
    }

    fn try_write(&mut self, block: &mut BlockBuffer, block_start: u32) -> Result<()> {
        match self {
            PointTask::Data(t) => t.encode(block, block_start),
            PointTask::Bit(_) => Err(BlockIoError::not_supported(
                "bit points must be written via UPDATE",
            )),
            PointTask::Filtered(t) => t.try_write(block, block_start),
        }
    }

    fn try_update(&mut self, block: &mut BlockBuffer, block_start: u32) -> Result<()> {
        match self {
            PointTask::Data(_) => Err(BlockIoError::not_supported(
                "block writes have no merge semantics",
            )),
            PointTask::Bit(t) => t.merge(block, block_start),
            PointTask::Filtered(t) => t.try_update(block, block_start),
        }
    }
}

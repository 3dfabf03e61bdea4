//! Toplevel block transfer task
//!
//! A block task owns one merged device-address interval, the buffer
//! backing it and the point tasks whose intervals it covers. It performs
//! exactly one physical transfer per cycle and dispatches completion (or
//! failure) to every child. A transport failure fails all children of the
//! affected block and nothing else; a codec failure fails one child and
//! nothing else.

use tracing::{debug, warn};

use crate::buffer::BlockBuffer;
use crate::error::{BlockIoError, Result};
use crate::task::{AccessMode, BlockRange, PointTask};
use crate::transport::BlockTransport;
use crate::value::PointRecord;

/// Transfer direction of a block task within a cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferPhase {
    /// Device-to-buffer; runs first
    Read,
    /// Buffer-to-device; runs after every read block finished
    Write,
}

/// One contiguous block transfer and its child point tasks
#[derive(Debug)]
pub struct BlockTask {
    range: BlockRange,
    phase: TransferPhase,
    buffer: BlockBuffer,
    children: Vec<PointTask>,
    /// Write blocks whose buffer must be seeded from the read phase before
    /// children encode: merge gaps or update children are present, so the
    /// transfer must not fabricate bytes the children do not own
    needs_seed: bool,
    /// Transport failure of this block, retained so write blocks seeded
    /// from a failed read block inherit the cause
    failed: Option<BlockIoError>,
}

impl BlockTask {
    pub(crate) fn new(
        range: BlockRange,
        phase: TransferPhase,
        children: Vec<PointTask>,
        needs_seed: bool,
    ) -> Self {
        Self {
            range,
            phase,
            buffer: BlockBuffer::new(range.len() as usize),
            children,
            needs_seed,
            failed: None,
        }
    }

    pub fn range(&self) -> BlockRange {
        self.range
    }

    pub fn phase(&self) -> TransferPhase {
        self.phase
    }

    pub fn child_count(&self) -> usize {
        self.children.len()
    }

    /// Whether this write block is seeded from the read phase
    pub fn is_seeded(&self) -> bool {
        self.needs_seed
    }

    pub(crate) fn into_records(self) -> impl Iterator<Item = PointRecord> {
        self.children.into_iter().map(PointTask::into_record)
    }

    /// Fail every still-pending child with `err`
    fn fail_all(&mut self, err: BlockIoError) {
        self.failed = Some(err.clone());
        for child in self.children.iter_mut() {
            if child.record().status.is_pending() {
                child.fail(err.clone());
            }
        }
    }

    /// Execute a read-phase transfer: fill the buffer from the device,
    /// then let every read-mode child decode its slice. The filled buffer
    /// is retained as the seed snapshot for the write phase.
    pub(crate) async fn execute_read(&mut self, transport: &dyn BlockTransport) {
        debug!(
            start = self.range.start,
            end = self.range.end,
            children = self.children.len(),
            "executing read block"
        );
        if let Err(err) = transport
            .read_block(self.range.start, self.buffer.as_mut_slice())
            .await
        {
            warn!(
                start = self.range.start,
                end = self.range.end,
                error = %err,
                "block read failed"
            );
            self.fail_all(err);
            return;
        }
        let start = self.range.start;
        let buffer = &self.buffer;
        for child in self.children.iter_mut() {
            child.run_read(buffer, start);
        }
    }

    /// Execute a write-phase transfer: seed the buffer from the read phase
    /// if required, let every child encode or merge its slice, then drain
    /// the buffer to the device and complete the children that are still
    /// pending.
    pub(crate) async fn execute_write(
        &mut self,
        transport: &dyn BlockTransport,
        read_blocks: &[BlockTask],
    ) {
        debug!(
            start = self.range.start,
            end = self.range.end,
            children = self.children.len(),
            seeded = self.needs_seed,
            "executing write block"
        );
        if self.needs_seed {
            if let Err(err) = self.seed_from(read_blocks) {
                self.fail_all(err);
                return;
            }
        }

        let start = self.range.start;
        let buffer = &mut self.buffer;
        for child in self.children.iter_mut() {
            match child.mode() {
                AccessMode::Write => child.run_write(buffer, start),
                AccessMode::Update => child.run_update(buffer, start),
                AccessMode::Read => child.fail(BlockIoError::internal(
                    "read-mode task planned into a write block",
                )),
            }
        }

        // Nothing left to transfer if every child already failed encoding
        if self.children.iter().all(|c| !c.record().status.is_pending()) {
            return;
        }

        match transport
            .write_block(self.range.start, self.buffer.as_slice())
            .await
        {
            Ok(()) => {
                for child in self.children.iter_mut() {
                    if child.record().status.is_pending() {
                        child.record_mut().complete_ok(None);
                    }
                }
            },
            Err(err) => {
                warn!(
                    start = self.range.start,
                    end = self.range.end,
                    error = %err,
                    "block write failed"
                );
                self.fail_all(err);
            },
        }
    }

    /// Copy this block's range out of the read-phase snapshot covering it.
    /// The planner guarantees exactly one read block contains the range.
    fn seed_from(&mut self, read_blocks: &[BlockTask]) -> Result<()> {
        let source = read_blocks
            .iter()
            .find(|b| b.range.contains(&self.range))
            .ok_or_else(|| {
                BlockIoError::internal(format!(
                    "no read block covers write block [{}, {})",
                    self.range.start, self.range.end
                ))
            })?;
        if let Some(err) = &source.failed {
            // The snapshot never arrived; writing would clobber unknown
            // device state, so the whole block fails with the read cause
            return Err(err.clone());
        }
        let offset = (self.range.start - source.range.start) as usize;
        let bytes = source.buffer.get_range(offset, self.range.len() as usize)?;
        self.buffer.put_range(0, bytes)
    }
}

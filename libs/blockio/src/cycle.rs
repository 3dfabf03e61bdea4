//! One aggregation/execution cycle
//!
//! A cycle is a single logical unit of work: plan the blocks, run every
//! read-phase transfer, then every write-phase transfer, and dispatch all
//! completions synchronously before returning. Blocks within a phase cover
//! pairwise disjoint device ranges, so their transfers run concurrently.
//! There is no cycle-level cancellation; a new request batch supersedes by
//! planning a new cycle.

use futures::future::join_all;
use tracing::debug;

use crate::block::BlockTask;
use crate::transport::BlockTransport;
use crate::value::PointRecord;

/// A planned cycle: read-phase and write-phase block tasks
#[derive(Debug)]
pub struct BlockCycle {
    read_blocks: Vec<BlockTask>,
    write_blocks: Vec<BlockTask>,
}

impl BlockCycle {
    pub(crate) fn new(read_blocks: Vec<BlockTask>, write_blocks: Vec<BlockTask>) -> Self {
        Self {
            read_blocks,
            write_blocks,
        }
    }

    pub fn read_blocks(&self) -> &[BlockTask] {
        &self.read_blocks
    }

    pub fn write_blocks(&self) -> &[BlockTask] {
        &self.write_blocks
    }

    /// Execute both phases against `transport` and return every point
    /// record with a terminal status. Failures are captured per point (or
    /// per block for transport errors); nothing escapes as an unhandled
    /// error.
    pub async fn execute(self, transport: &dyn BlockTransport) -> Vec<PointRecord> {
        let mut read_blocks = self.read_blocks;
        let mut write_blocks = self.write_blocks;

        debug!(
            read_blocks = read_blocks.len(),
            write_blocks = write_blocks.len(),
            "executing cycle"
        );

        // Phase 1: fill every read block; ranges are disjoint so the
        // transfers may run concurrently
        join_all(
            read_blocks
                .iter_mut()
                .map(|block| block.execute_read(transport)),
        )
        .await;

        // Phase 2: the filled read blocks now serve as seed snapshots
        let read_blocks = read_blocks;
        join_all(
            write_blocks
                .iter_mut()
                .map(|block| block.execute_write(transport, &read_blocks)),
        )
        .await;

        let mut records: Vec<PointRecord> = read_blocks
            .into_iter()
            .chain(write_blocks)
            .flat_map(BlockTask::into_records)
            .collect();
        records.sort_by_key(|r| r.point_id);
        records
    }
}

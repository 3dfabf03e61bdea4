//! Aggregation planner
//!
//! Turns a flat batch of point requests into the minimal set of contiguous
//! block transfers per direction. Points whose intervals are adjacent or
//! closer than the configured merge distance share one transfer to
//! amortize per-transfer protocol overhead; points further apart get
//! separate blocks. Read and update requests feed read-phase blocks, write
//! and update requests feed write-phase blocks; a pure read and a pure
//! write never share a transfer.
//!
//! Correctness invariant: no byte transferred on behalf of one point may
//! clobber another point's data. Write blocks containing merge gaps or
//! update children are therefore seeded from a read-phase snapshot of the
//! same range before any child encodes into them.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::block::{BlockTask, TransferPhase};
use crate::codec::Codec;
use crate::cycle::BlockCycle;
use crate::error::Result;
use crate::task::{AccessMode, BitTask, BlockRange, DataTask, FilteredTask, PointTask, ValueFilter};
use crate::value::{PointRecord, PointValue, ValueType};

/// Planner configuration
///
/// The merge distance depends on the device family's per-transfer protocol
/// overhead, so it is required configuration with no assumed default.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlannerConfig {
    /// Maximum number of bytes between two point intervals that may still
    /// be merged into one block transfer
    pub max_merge_gap: u32,
}

/// Device addressing of one point
#[derive(Debug, Clone)]
pub enum PointAddress {
    /// A byte range starting at `start`, sized by its codec
    Bytes { start: u32, codec: Codec },
    /// A single bit of one byte
    Bit { byte: u32, bit: u8 },
}

/// One point's read/write/update request
#[derive(Debug, Clone)]
pub struct PointRequest {
    pub point_id: u32,
    pub name: String,
    pub mode: AccessMode,
    pub address: PointAddress,
    pub value_type: ValueType,
    /// Input value for write/update requests
    pub value: Option<PointValue>,
    /// Optional value filter layered over the task
    pub filter: Option<ValueFilter>,
}

fn build_task(request: PointRequest) -> Result<PointTask> {
    let mut record = PointRecord::new(request.point_id, request.name, request.value_type);
    record.value = request.value;
    let base = match request.address {
        PointAddress::Bytes { start, codec } => {
            PointTask::Data(DataTask::new(record, codec, start, request.mode))
        },
        PointAddress::Bit { byte, bit } => {
            PointTask::Bit(BitTask::new(record, byte, bit, request.mode)?)
        },
    };
    Ok(match request.filter {
        Some(filter) => PointTask::Filtered(FilteredTask::new(base, filter)),
        None => base,
    })
}

/// Sort contributions by start address and merge every run whose gaps stay
/// within `max_gap`. Range-only contributions (seed ranges) extend a group
/// without adding a task.
fn merge_contributions(
    mut items: Vec<(BlockRange, Option<PointTask>)>,
    max_gap: u32,
) -> Vec<(BlockRange, Vec<PointTask>)> {
    items.sort_by_key(|(range, _)| (range.start, range.end));
    let mut groups: Vec<(BlockRange, Vec<PointTask>)> = Vec::new();
    for (range, task) in items {
        match groups.last_mut() {
            Some((current, tasks)) if range.start.saturating_sub(current.end) <= max_gap => {
                current.end = current.end.max(range.end);
                if let Some(task) = task {
                    tasks.push(task);
                }
            },
            _ => groups.push((range, task.into_iter().collect())),
        }
    }
    groups
}

/// Whether a write block's buffer must be seeded from the read phase:
/// update children always need the device snapshot, and merge gaps mean
/// the block would otherwise transfer bytes no child produced.
fn needs_seed(range: &BlockRange, tasks: &[PointTask]) -> bool {
    if tasks.iter().any(|t| t.mode() == AccessMode::Update) {
        return true;
    }
    let mut child_ranges: Vec<BlockRange> = tasks.iter().map(|t| t.range()).collect();
    child_ranges.sort_by_key(|r| r.start);
    let mut covered_to = range.start;
    for r in child_ranges {
        if r.start > covered_to {
            return true;
        }
        covered_to = covered_to.max(r.end);
    }
    covered_to < range.end
}

/// Plan one execution cycle from a request batch
pub fn plan(requests: Vec<PointRequest>, config: &PlannerConfig) -> Result<BlockCycle> {
    let mut read_items: Vec<(BlockRange, Option<PointTask>)> = Vec::new();
    let mut write_items: Vec<(BlockRange, Option<PointTask>)> = Vec::new();

    for request in requests {
        let task = build_task(request)?;
        match task.mode() {
            AccessMode::Read => read_items.push((task.range(), Some(task))),
            AccessMode::Write | AccessMode::Update => {
                write_items.push((task.range(), Some(task)))
            },
        }
    }

    let mut write_blocks = Vec::new();
    for (range, tasks) in merge_contributions(write_items, config.max_merge_gap) {
        let seeded = needs_seed(&range, &tasks);
        if seeded {
            // The whole block range contributes to the read phase so the
            // seed snapshot lands in exactly one read block
            read_items.push((range, None));
        }
        write_blocks.push(BlockTask::new(range, TransferPhase::Write, tasks, seeded));
    }

    let read_blocks: Vec<BlockTask> = merge_contributions(read_items, config.max_merge_gap)
        .into_iter()
        .map(|(range, tasks)| BlockTask::new(range, TransferPhase::Read, tasks, false))
        .collect();

    debug!(
        read_blocks = read_blocks.len(),
        write_blocks = write_blocks.len(),
        "planned cycle"
    );
    Ok(BlockCycle::new(read_blocks, write_blocks))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::{Endianness, ScalarCodec, ScalarType};

    fn read_request(point_id: u32, start: u32, ty: ScalarType) -> PointRequest {
        PointRequest {
            point_id,
            name: format!("p{}", point_id),
            mode: AccessMode::Read,
            address: PointAddress::Bytes {
                start,
                codec: Codec::Scalar(ScalarCodec::new(ty, Endianness::Big)),
            },
            value_type: ValueType::Integer,
            value: None,
            filter: None,
        }
    }

    fn write_request(point_id: u32, start: u32, value: i64) -> PointRequest {
        PointRequest {
            point_id,
            name: format!("p{}", point_id),
            mode: AccessMode::Write,
            address: PointAddress::Bytes {
                start,
                codec: Codec::Scalar(ScalarCodec::new(ScalarType::U16, Endianness::Big)),
            },
            value_type: ValueType::Integer,
            value: Some(PointValue::Integer(value)),
            filter: None,
        }
    }

    fn config(gap: u32) -> PlannerConfig {
        PlannerConfig { max_merge_gap: gap }
    }

    #[test]
    fn test_adjacent_reads_merge_into_one_block() {
        // Addresses 0..2, 2..4, 4..6 are back to back
        let cycle = plan(
            vec![
                read_request(1, 0, ScalarType::U16),
                read_request(2, 2, ScalarType::U16),
                read_request(3, 4, ScalarType::U16),
            ],
            &config(0),
        )
        .unwrap();
        assert_eq!(cycle.read_blocks().len(), 1);
        assert_eq!(cycle.read_blocks()[0].range(), BlockRange::new(0, 6));
        assert_eq!(cycle.read_blocks()[0].child_count(), 3);
    }

    #[test]
    fn test_gap_threshold_splits_blocks() {
        // Gap of 4 bytes between the intervals
        let requests = vec![
            read_request(1, 0, ScalarType::U16),
            read_request(2, 6, ScalarType::U16),
        ];

        let merged = plan(requests.clone(), &config(4)).unwrap();
        assert_eq!(merged.read_blocks().len(), 1);
        assert_eq!(merged.read_blocks()[0].range(), BlockRange::new(0, 8));

        let split = plan(requests, &config(3)).unwrap();
        assert_eq!(split.read_blocks().len(), 2);
    }

    #[test]
    fn test_blocks_are_pairwise_disjoint_and_cover_inputs() {
        let requests = vec![
            read_request(1, 100, ScalarType::U32),
            read_request(2, 0, ScalarType::U16),
            read_request(3, 102, ScalarType::U16),
            read_request(4, 4, ScalarType::F64),
            read_request(5, 300, ScalarType::U8),
        ];
        let input_ranges: Vec<BlockRange> = vec![
            BlockRange::new(100, 104),
            BlockRange::new(0, 2),
            BlockRange::new(102, 104),
            BlockRange::new(4, 12),
            BlockRange::new(300, 301),
        ];

        let cycle = plan(requests, &config(2)).unwrap();
        let blocks = cycle.read_blocks();

        // Every input interval is contained in exactly one block
        for range in &input_ranges {
            let covering = blocks.iter().filter(|b| b.range().contains(range)).count();
            assert_eq!(covering, 1, "interval {:?}", range);
        }
        // Blocks never overlap each other
        for (i, a) in blocks.iter().enumerate() {
            for b in blocks.iter().skip(i + 1) {
                assert!(!a.range().overlaps(&b.range()));
            }
        }
    }

    #[test]
    fn test_reads_and_writes_never_share_a_transfer() {
        let cycle = plan(
            vec![read_request(1, 0, ScalarType::U16), write_request(2, 2, 5)],
            &config(16),
        )
        .unwrap();
        assert_eq!(cycle.read_blocks().len(), 1);
        assert_eq!(cycle.write_blocks().len(), 1);
        assert_eq!(cycle.read_blocks()[0].child_count(), 1);
        assert_eq!(cycle.write_blocks()[0].child_count(), 1);
    }

    #[test]
    fn test_contiguous_write_block_is_not_seeded() {
        let cycle = plan(
            vec![write_request(1, 0, 1), write_request(2, 2, 2)],
            &config(0),
        )
        .unwrap();
        assert_eq!(cycle.write_blocks().len(), 1);
        assert!(!cycle.write_blocks()[0].is_seeded());
        assert!(cycle.read_blocks().is_empty());
    }

    #[test]
    fn test_gappy_write_block_is_seeded_and_preread() {
        // Two writes with a 2-byte hole merged into one block
        let cycle = plan(
            vec![write_request(1, 0, 1), write_request(2, 4, 2)],
            &config(2),
        )
        .unwrap();
        assert_eq!(cycle.write_blocks().len(), 1);
        assert!(cycle.write_blocks()[0].is_seeded());
        // The seed pre-read covers the write block's whole range
        assert_eq!(cycle.read_blocks().len(), 1);
        assert!(cycle.read_blocks()[0]
            .range()
            .contains(&cycle.write_blocks()[0].range()));
        assert_eq!(cycle.read_blocks()[0].child_count(), 0);
    }

    #[test]
    fn test_update_request_contributes_to_both_phases() {
        let request = PointRequest {
            point_id: 1,
            name: "sw".to_string(),
            mode: AccessMode::Update,
            address: PointAddress::Bit { byte: 10, bit: 3 },
            value_type: ValueType::Bool,
            value: Some(PointValue::Bool(true)),
            filter: None,
        };
        let cycle = plan(vec![request], &config(0)).unwrap();
        assert_eq!(cycle.write_blocks().len(), 1);
        assert!(cycle.write_blocks()[0].is_seeded());
        assert_eq!(cycle.read_blocks().len(), 1);
        assert_eq!(cycle.read_blocks()[0].range(), BlockRange::new(10, 11));
    }

    #[test]
    fn test_invalid_bit_index_is_plan_error() {
        let request = PointRequest {
            point_id: 1,
            name: "bad".to_string(),
            mode: AccessMode::Read,
            address: PointAddress::Bit { byte: 0, bit: 9 },
            value_type: ValueType::Bool,
            value: None,
            filter: None,
        };
        assert!(plan(vec![request], &config(0)).is_err());
    }

    #[test]
    fn test_empty_batch_plans_empty_cycle() {
        let cycle = plan(Vec::new(), &config(0)).unwrap();
        assert!(cycle.read_blocks().is_empty());
        assert!(cycle.write_blocks().is_empty());
    }
}

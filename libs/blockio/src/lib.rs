//! Block I/O Aggregation and Binary Codec Engine
//!
//! This library translates a batch of logically independent per-point
//! read/write/update requests — each addressing an arbitrary byte offset,
//! byte length and optionally a single bit of a field device's memory —
//! into the minimal number of contiguous block transfers, executes them
//! against a pluggable transport, and scatters the typed results (or
//! failures) back to each originating point.
//!
//! # Features
//!
//! - **Block aggregation**: adjacent or near-adjacent point intervals are
//!   merged into one transfer, bounded by a configurable merge distance
//! - **Typed codecs**: every scalar numeric type, bool, raw byte arrays
//!   and a framed, charset-heuristic device string format, in both byte
//!   orders
//! - **Read-modify-write**: sub-byte bit points are updated against a
//!   device snapshot so co-located bits owned by other points survive
//! - **Partial-failure isolation**: a codec error fails one point, a
//!   transport error fails one block; siblings always complete
//! - **Value filters**: linear scaling, boolean inversion and sliding
//!   window averaging layered transparently over point tasks
//!
//! # Architecture
//!
//! ```text
//! PointRequest batch
//!        │ plan()            aggregation: sort, merge by gap, split phases
//!        ▼
//!   BlockCycle ──── read phase ────► BlockTask ► BlockTransport (device)
//!        │                              │ buffer
//!        │                              ▼
//!        │                          PointTask::run_read   (decode, complete)
//!        └──── write phase ───────► BlockTask (seeded from read snapshot)
//!                                       │ buffer ◄─ PointTask::run_write / run_update
//!                                       ▼
//!                                  BlockTransport (device) ► complete children
//! ```
//!
//! # Quick Start
//!
//! ```
//! use blockio::codec::{Codec, Endianness, ScalarCodec, ScalarType};
//! use blockio::plan::{plan, PlannerConfig, PointAddress, PointRequest};
//! use blockio::task::AccessMode;
//! use blockio::transport::MemoryTransport;
//! use blockio::value::ValueType;
//!
//! # #[tokio::main]
//! # async fn main() -> blockio::error::Result<()> {
//! let device = MemoryTransport::new(64);
//! device.load(10, &[0x01, 0x02]);
//!
//! let requests = vec![PointRequest {
//!     point_id: 1,
//!     name: "line_voltage".to_string(),
//!     mode: AccessMode::Read,
//!     address: PointAddress::Bytes {
//!         start: 10,
//!         codec: Codec::Scalar(ScalarCodec::new(ScalarType::U16, Endianness::Big)),
//!     },
//!     value_type: ValueType::Integer,
//!     value: None,
//!     filter: None,
//! }];
//!
//! let cycle = plan(requests, &PlannerConfig { max_merge_gap: 4 })?;
//! let records = cycle.execute(&device).await;
//! assert!(records[0].status.is_ok());
//! # Ok(())
//! # }
//! ```

pub mod block;
pub mod buffer;
pub mod bytes;
pub mod codec;
pub mod cycle;
pub mod error;
pub mod plan;
pub mod task;
pub mod transport;
pub mod value;

// Re-export commonly used items for convenience
pub use block::{BlockTask, TransferPhase};
pub use buffer::BlockBuffer;
pub use codec::{Codec, Endianness, ScalarCodec, ScalarType, TextCodec};
pub use cycle::BlockCycle;
pub use error::{BlockIoError, Result};
pub use plan::{plan, PlannerConfig, PointAddress, PointRequest};
pub use task::{AccessMode, BlockRange, PointTask, ValueFilter};
pub use transport::{BlockTransport, MemoryTransport};
pub use value::{PointRecord, PointStatus, PointValue, ValueType};

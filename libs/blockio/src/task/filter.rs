//! Value filters layered over point tasks
//!
//! A filtered task is a transparent wrapper: interval, mode, support query
//! and record access all delegate to the wrapped task. Only the value is
//! intercepted on its way through — device to system after reads, system
//! to device before writes and updates. The wrapper never owns a buffer or
//! a block reference of its own.

use serde::{Deserialize, Serialize};
use tracing::warn;

use super::{AccessMode, BlockRange, PointTask};
use crate::buffer::BlockBuffer;
use crate::error::Result;
use crate::value::{PointRecord, PointValue};

/// Sliding-window mean over read values
///
/// The window grows to its configured size, then slides: oldest dropped,
/// newest added. Seeded empty.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MovingAverage {
    /// Circular buffer of recent values
    values: Vec<f64>,
    /// Next write position in buffer
    position: usize,
    /// Number of values stored (may be less than buffer size initially)
    count: usize,
}

impl MovingAverage {
    pub fn new(window_size: usize) -> Self {
        Self {
            values: vec![0.0; window_size.max(1)],
            position: 0,
            count: 0,
        }
    }

    /// Add a value and return the new moving average
    pub fn add(&mut self, value: f64) -> f64 {
        self.values[self.position] = value;
        self.position = (self.position + 1) % self.values.len();
        if self.count < self.values.len() {
            self.count += 1;
        }
        self.average()
    }

    /// Get current average
    pub fn average(&self) -> f64 {
        if self.count == 0 {
            return 0.0;
        }
        let sum: f64 = self.values.iter().take(self.count).sum();
        sum / self.count as f64
    }
}

/// Point value transformation hooks
///
/// Static dispatch over the supported filter kinds; non-numeric values
/// pass through numeric filters unchanged.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ValueFilter {
    /// Linear transformation: system = device * scale + offset
    Linear {
        /// Scale factor
        scale: f64,
        /// Offset value
        offset: f64,
    },
    /// Boolean inversion, symmetric in both directions
    Invert,
    /// Sliding-window mean applied to read values only
    MovingAverage(MovingAverage),
}

impl ValueFilter {
    pub fn linear(scale: f64, offset: f64) -> Self {
        Self::Linear { scale, offset }
    }

    pub fn invert() -> Self {
        Self::Invert
    }

    pub fn moving_average(window_size: usize) -> Self {
        Self::MovingAverage(MovingAverage::new(window_size))
    }

    /// Transform a decoded device value into the system value
    fn device_to_system(&mut self, value: PointValue) -> PointValue {
        match self {
            Self::Linear { scale, offset } => match value.as_f64() {
                Some(v) => PointValue::Float(v * *scale + *offset),
                None => value,
            },
            Self::Invert => match value.as_bool() {
                Some(b) => PointValue::Bool(!b),
                None => value,
            },
            Self::MovingAverage(state) => match value.as_f64() {
                Some(v) => PointValue::Float(state.add(v)),
                None => value,
            },
        }
    }

    /// Transform a system value into the raw value sent to the device
    fn system_to_device(&self, value: PointValue) -> PointValue {
        match self {
            Self::Linear { scale, offset } => match value.as_f64() {
                Some(v) => {
                    if *scale != 0.0 {
                        PointValue::Float((v - *offset) / *scale)
                    } else {
                        warn!("ValueFilter::Linear: scale is zero, passing value through");
                        value
                    }
                },
                None => value,
            },
            Self::Invert => match value.as_bool() {
                Some(b) => PointValue::Bool(!b),
                None => value,
            },
            // Read-side filter; outgoing values pass through
            Self::MovingAverage(_) => value,
        }
    }
}

/// Transparent wrapper task applying a [`ValueFilter`] around an inner task
#[derive(Debug)]
pub struct FilteredTask {
    inner: Box<PointTask>,
    filter: ValueFilter,
}

impl FilteredTask {
    pub fn new(inner: PointTask, filter: ValueFilter) -> Self {
        Self {
            inner: Box::new(inner),
            filter,
        }
    }

    pub fn range(&self) -> BlockRange {
        self.inner.range()
    }

    pub fn mode(&self) -> AccessMode {
        self.inner.mode()
    }

    pub fn supports(&self, mode: AccessMode) -> bool {
        self.inner.supports(mode)
    }

    pub fn record(&self) -> &PointRecord {
        self.inner.record()
    }

    pub fn record_mut(&mut self) -> &mut PointRecord {
        self.inner.record_mut()
    }

    pub fn into_record(self) -> PointRecord {
        self.inner.into_record()
    }

    pub(super) fn try_read(&mut self, block: &BlockBuffer, block_start: u32) -> Result<PointValue> {
        let value = self.inner.try_read(block, block_start)?;
        Ok(self.filter.device_to_system(value))
    }

    pub(super) fn try_write(&mut self, block: &mut BlockBuffer, block_start: u32) -> Result<()> {
        self.transform_outgoing();
        self.inner.try_write(block, block_start)
    }

    pub(super) fn try_update(&mut self, block: &mut BlockBuffer, block_start: u32) -> Result<()> {
        self.transform_outgoing();
        self.inner.try_update(block, block_start)
    }

    /// Replace the record's value slot with its raw device form; the raw
    /// value is what actually leaves through the codec
    fn transform_outgoing(&mut self) {
        if let Some(value) = self.inner.record().value.clone() {
            let raw = self.filter.system_to_device(value);
            self.inner.record_mut().value = Some(raw);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::{Codec, Endianness, ScalarCodec, ScalarType};
    use crate::task::DataTask;
    use crate::value::ValueType;

    // ---------- moving average ----------

    #[test]
    fn test_moving_average_grows_then_slides() {
        // Window 3 over [1, 2, 3, 4]: mean after each add
        let mut avg = MovingAverage::new(3);
        let outputs: Vec<f64> = [1.0, 2.0, 3.0, 4.0].iter().map(|v| avg.add(*v)).collect();
        assert_eq!(outputs, vec![1.0, 1.5, 2.0, 3.0]);
    }

    #[test]
    fn test_moving_average_empty_is_zero() {
        let avg = MovingAverage::new(3);
        assert_eq!(avg.average(), 0.0);
    }

    // ---------- filter directions ----------

    #[test]
    fn test_linear_filter_both_directions() {
        let mut filter = ValueFilter::linear(0.1, 0.0);
        let system = filter.device_to_system(PointValue::Integer(6693));
        match system {
            PointValue::Float(f) => assert!((f - 669.3).abs() < 1e-9),
            other => panic!("expected float, got {:?}", other),
        }

        let raw = filter.system_to_device(PointValue::Float(669.3));
        match raw {
            PointValue::Float(f) => assert!((f - 6693.0).abs() < 1e-9),
            other => panic!("expected float, got {:?}", other),
        }
    }

    #[test]
    fn test_linear_zero_scale_passes_through() {
        let filter = ValueFilter::linear(0.0, 10.0);
        assert_eq!(
            filter.system_to_device(PointValue::Float(5.0)),
            PointValue::Float(5.0)
        );
    }

    #[test]
    fn test_invert_filter_is_symmetric() {
        let mut filter = ValueFilter::invert();
        assert_eq!(
            filter.device_to_system(PointValue::Bool(false)),
            PointValue::Bool(true)
        );
        assert_eq!(
            filter.system_to_device(PointValue::Bool(true)),
            PointValue::Bool(false)
        );
    }

    #[test]
    fn test_non_numeric_value_passes_numeric_filter() {
        let mut filter = ValueFilter::linear(2.0, 0.0);
        assert_eq!(
            filter.device_to_system(PointValue::Bytes(vec![1])),
            PointValue::Bytes(vec![1])
        );
    }

    // ---------- wrapper delegation ----------

    fn scaled_u16_read_task(scale: f64) -> FilteredTask {
        let record = PointRecord::new(1, "temp", ValueType::Integer);
        let codec = Codec::Scalar(ScalarCodec::new(ScalarType::U16, Endianness::Big));
        let inner = PointTask::Data(DataTask::new(record, codec, 4, AccessMode::Read));
        FilteredTask::new(inner, ValueFilter::linear(scale, 0.0))
    }

    #[test]
    fn test_wrapper_delegates_interval_and_mode() {
        let task = scaled_u16_read_task(0.1);
        assert_eq!(task.range(), BlockRange::new(4, 6));
        assert_eq!(task.mode(), AccessMode::Read);
        assert!(task.supports(AccessMode::Write));
        assert!(!task.supports(AccessMode::Update));
    }

    #[test]
    fn test_wrapper_scales_read_value() {
        let mut task = scaled_u16_read_task(0.1);
        let mut block = BlockBuffer::new(2);
        block.put_range(0, &[0x00, 0x64]).unwrap(); // 100
        let value = task.try_read(&block, 4).unwrap();
        match value {
            PointValue::Float(f) => assert!((f - 10.0).abs() < 1e-9),
            other => panic!("expected float, got {:?}", other),
        }
    }

    #[test]
    fn test_wrapper_unscales_written_value() {
        let record =
            PointRecord::with_value(2, "sp", ValueType::Float, PointValue::Float(10.0));
        let codec = Codec::Scalar(ScalarCodec::new(ScalarType::U16, Endianness::Big));
        let inner = PointTask::Data(DataTask::new(record, codec, 0, AccessMode::Write));
        let mut task = FilteredTask::new(inner, ValueFilter::linear(0.1, 0.0));

        let mut block = BlockBuffer::new(2);
        task.try_write(&mut block, 0).unwrap();
        // System value 10.0 at scale 0.1 leaves as raw 100
        assert_eq!(block.as_slice(), &[0x00, 0x64]);
    }
}

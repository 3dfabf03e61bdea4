//! Point value and record types
//!
//! A point is one named, typed item of data exchanged with a field device.
//! The record is the unit handed back to the caller after a cycle: identity,
//! value slot and terminal status.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::borrow::Cow;

use crate::error::BlockIoError;

// ============================================================================
// Point Value
// ============================================================================

/// Value type for point data exchange
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum PointValue {
    Bool(bool),
    Integer(i64),
    Float(f64),
    String(Cow<'static, str>),
    Bytes(Vec<u8>),
}

impl From<bool> for PointValue {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<i64> for PointValue {
    fn from(v: i64) -> Self {
        Self::Integer(v)
    }
}

impl From<i32> for PointValue {
    fn from(v: i32) -> Self {
        Self::Integer(v as i64)
    }
}

impl From<u16> for PointValue {
    fn from(v: u16) -> Self {
        Self::Integer(v as i64)
    }
}

impl From<f64> for PointValue {
    fn from(v: f64) -> Self {
        Self::Float(v)
    }
}

impl From<&str> for PointValue {
    fn from(v: &str) -> Self {
        Self::String(Cow::Owned(v.to_string()))
    }
}

impl From<String> for PointValue {
    fn from(v: String) -> Self {
        Self::String(Cow::Owned(v))
    }
}

impl From<Vec<u8>> for PointValue {
    fn from(v: Vec<u8>) -> Self {
        Self::Bytes(v)
    }
}

impl PointValue {
    /// Empty string value
    pub fn empty_string() -> Self {
        Self::String(Cow::Borrowed(""))
    }

    /// Try to convert to f64
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Float(f) => Some(*f),
            Self::Integer(i) => Some(*i as f64),
            Self::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
            Self::String(s) => s.parse().ok(),
            Self::Bytes(_) => None,
        }
    }

    /// Try to convert to i64
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Integer(i) => Some(*i),
            Self::Float(f) => Some(f.round() as i64),
            Self::Bool(b) => Some(if *b { 1 } else { 0 }),
            Self::String(s) => s.parse().ok(),
            Self::Bytes(_) => None,
        }
    }

    /// Try to convert to bool
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            Self::Integer(i) => Some(*i != 0),
            Self::Float(f) => Some(*f != 0.0),
            Self::String(s) => match s.to_lowercase().as_str() {
                "true" | "1" | "on" => Some(true),
                "false" | "0" | "off" => Some(false),
                _ => None,
            },
            Self::Bytes(_) => None,
        }
    }
}

/// Declared value type of a point
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ValueType {
    Bool,
    Integer,
    Float,
    String,
    Bytes,
}

// ============================================================================
// Point Record
// ============================================================================

/// Execution status of one point within a cycle
#[derive(Debug, Clone, PartialEq, Default)]
pub enum PointStatus {
    /// Not yet executed
    #[default]
    Pending,
    /// Completed successfully
    Ok,
    /// Completed with a failure; siblings are unaffected
    Failed(BlockIoError),
}

impl PointStatus {
    pub fn is_pending(&self) -> bool {
        matches!(self, PointStatus::Pending)
    }

    pub fn is_ok(&self) -> bool {
        matches!(self, PointStatus::Ok)
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, PointStatus::Failed(_))
    }
}

/// One point's identity, value slot and completion status
///
/// The value slot is input for write/update requests and output for
/// read/update requests. Completion always fires exactly once per cycle.
#[derive(Debug, Clone)]
pub struct PointRecord {
    pub point_id: u32,
    pub name: String,
    pub value_type: ValueType,
    pub value: Option<PointValue>,
    pub status: PointStatus,
    /// Epoch milliseconds of completion; set when status turns terminal
    pub timestamp: Option<i64>,
}

impl PointRecord {
    pub fn new(point_id: u32, name: impl Into<String>, value_type: ValueType) -> Self {
        Self {
            point_id,
            name: name.into(),
            value_type,
            value: None,
            status: PointStatus::Pending,
            timestamp: None,
        }
    }

    pub fn with_value(
        point_id: u32,
        name: impl Into<String>,
        value_type: ValueType,
        value: PointValue,
    ) -> Self {
        let mut record = Self::new(point_id, name, value_type);
        record.value = Some(value);
        record
    }

    /// Mark the record successful, storing the produced value if any
    pub fn complete_ok(&mut self, value: Option<PointValue>) {
        if let Some(v) = value {
            self.value = Some(v);
        }
        self.status = PointStatus::Ok;
        self.timestamp = Some(Utc::now().timestamp_millis());
    }

    /// Mark the record failed with the causing error
    pub fn complete_failed(&mut self, err: BlockIoError) {
        self.status = PointStatus::Failed(err);
        self.timestamp = Some(Utc::now().timestamp_millis());
    }
}

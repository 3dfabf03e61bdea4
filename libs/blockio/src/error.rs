//! Error handling for the block I/O engine
//!
//! Errors are `Clone` because a single block-level failure (for example a
//! transport timeout) is fanned out into the status slot of every point
//! record carried by that block.

use thiserror::Error;

/// Block I/O engine error type
#[derive(Error, Debug, Clone, PartialEq)]
pub enum BlockIoError {
    /// Buffer access outside `[0, capacity)`; indicates a planner bug and
    /// fails the enclosing block transfer
    #[error("Out of range: {0}")]
    OutOfRange(String),

    /// Task invoked in an access mode it does not implement
    #[error("Not supported: {0}")]
    NotSupported(String),

    /// Codec-level failure while decoding device bytes
    #[error("Decode error: {0}")]
    DecodeError(String),

    /// Codec-level failure while encoding a point value
    #[error("Encode error: {0}")]
    EncodeError(String),

    /// The underlying device transfer failed or timed out
    #[error("Transport error: {0}")]
    TransportError(String),

    /// Invalid planner or codec configuration
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// General internal errors
    #[error("Internal error: {0}")]
    InternalError(String),
}

/// Result type alias for the block I/O engine
pub type Result<T> = std::result::Result<T, BlockIoError>;

// Helper methods for creating errors
impl BlockIoError {
    pub fn out_of_range(msg: impl Into<String>) -> Self {
        BlockIoError::OutOfRange(msg.into())
    }

    pub fn not_supported(msg: impl Into<String>) -> Self {
        BlockIoError::NotSupported(msg.into())
    }

    pub fn decode(msg: impl Into<String>) -> Self {
        BlockIoError::DecodeError(msg.into())
    }

    pub fn encode(msg: impl Into<String>) -> Self {
        BlockIoError::EncodeError(msg.into())
    }

    pub fn transport(msg: impl Into<String>) -> Self {
        BlockIoError::TransportError(msg.into())
    }

    pub fn config(msg: impl Into<String>) -> Self {
        BlockIoError::ConfigError(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        BlockIoError::InternalError(msg.into())
    }
}

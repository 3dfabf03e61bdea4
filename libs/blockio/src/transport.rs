//! Device transport seam
//!
//! The engine needs exactly one collaborator primitive: transfer bytes at
//! a device address range. Real drivers (serial, TCP, fieldbus) implement
//! [`BlockTransport`]; connection handling, retry and reconnect policy
//! live entirely on that side.

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::error::{BlockIoError, Result};

/// Byte-range transfer primitive against a device's addressable memory
#[async_trait]
pub trait BlockTransport: Send + Sync {
    /// Fill `buf` with `buf.len()` bytes starting at device address `start`
    async fn read_block(&self, start: u32, buf: &mut [u8]) -> Result<()>;

    /// Write `data` to the device starting at address `start`
    async fn write_block(&self, start: u32, data: &[u8]) -> Result<()>;
}

/// In-memory device image for tests and demos
///
/// Supports fault injection: reads and writes overlapping a registered
/// fault range fail with a transport error, which is how block-level
/// failure isolation is exercised without a real device.
#[derive(Debug)]
pub struct MemoryTransport {
    image: Mutex<Vec<u8>>,
    faults: Mutex<Vec<(u32, u32)>>,
}

impl MemoryTransport {
    /// Create a zero-filled device image of `size` bytes
    pub fn new(size: usize) -> Self {
        Self {
            image: Mutex::new(vec![0; size]),
            faults: Mutex::new(Vec::new()),
        }
    }

    /// Preload device bytes starting at `start`
    pub fn load(&self, start: u32, data: &[u8]) {
        let mut image = self.image.lock();
        let s = start as usize;
        image[s..s + data.len()].copy_from_slice(data);
    }

    /// Copy of the current device image
    pub fn snapshot(&self) -> Vec<u8> {
        self.image.lock().clone()
    }

    /// Make every transfer overlapping `[start, end)` fail
    pub fn fail_range(&self, start: u32, end: u32) {
        self.faults.lock().push((start, end));
    }

    fn check_access(&self, start: u32, len: usize) -> Result<()> {
        let end = start as usize + len;
        for &(fault_start, fault_end) in self.faults.lock().iter() {
            if (start as usize) < fault_end as usize && (fault_start as usize) < end {
                return Err(BlockIoError::transport(format!(
                    "injected fault at [{}, {})",
                    fault_start, fault_end
                )));
            }
        }
        if end > self.image.lock().len() {
            return Err(BlockIoError::transport(format!(
                "address range [{}, {}) beyond device memory",
                start, end
            )));
        }
        Ok(())
    }
}

#[async_trait]
impl BlockTransport for MemoryTransport {
    async fn read_block(&self, start: u32, buf: &mut [u8]) -> Result<()> {
        self.check_access(start, buf.len())?;
        let image = self.image.lock();
        let s = start as usize;
        buf.copy_from_slice(&image[s..s + buf.len()]);
        Ok(())
    }

    async fn write_block(&self, start: u32, data: &[u8]) -> Result<()> {
        self.check_access(start, data.len())?;
        let mut image = self.image.lock();
        let s = start as usize;
        image[s..s + data.len()].copy_from_slice(data);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_memory_transport_roundtrip() {
        let transport = MemoryTransport::new(16);
        transport.write_block(4, &[1, 2, 3]).await.unwrap();

        let mut buf = [0u8; 3];
        transport.read_block(4, &mut buf).await.unwrap();
        assert_eq!(buf, [1, 2, 3]);
    }

    #[tokio::test]
    async fn test_out_of_image_access_is_transport_error() {
        let transport = MemoryTransport::new(8);
        let mut buf = [0u8; 4];
        assert!(matches!(
            transport.read_block(6, &mut buf).await,
            Err(BlockIoError::TransportError(_))
        ));
    }

    #[tokio::test]
    async fn test_fault_injection_hits_overlapping_transfers_only() {
        let transport = MemoryTransport::new(32);
        transport.fail_range(10, 12);

        let mut buf = [0u8; 4];
        assert!(transport.read_block(8, &mut buf).await.is_err());
        assert!(transport.read_block(0, &mut buf).await.is_ok());
        assert!(transport.write_block(12, &buf).await.is_ok());
    }
}

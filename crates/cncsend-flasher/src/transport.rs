//! DFU device transport boundary
//!
//! The USB control-transfer plumbing is an external collaborator; the
//! engine drives it through this trait. Calls are strictly sequential:
//! the USB DFU protocol does not define behavior for overlapping
//! in-flight control transfers, so each request must complete before the
//! next one is issued.

use async_trait::async_trait;
use thiserror::Error;

use crate::dfu::DeviceStatus;

/// USB-layer transport failure
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    /// Device could not be opened or claimed
    #[error("failed to open DFU device: {reason}")]
    Open {
        /// What went wrong at open time
        reason: String,
    },
    /// A control transfer failed
    #[error("USB control transfer failed: {reason}")]
    Io {
        /// What went wrong during the transfer
        reason: String,
    },
    /// The device went away mid-session
    #[error("DFU device disconnected: {reason}")]
    Disconnected {
        /// What the USB stack reported
        reason: String,
    },
    /// The GETSTATUS payload could not be decoded
    #[error("malformed GETSTATUS response: {reason}")]
    MalformedStatus {
        /// Why the payload was rejected
        reason: String,
    },
}

/// USB DFU control-transfer primitives
///
/// One implementation per USB backend; the engine owns the handle
/// exclusively for the lifetime of a flashing session.
#[async_trait]
pub trait DfuTransport: Send {
    /// Open and claim the DFU interface
    async fn open(&mut self) -> Result<(), TransportError>;

    /// Release the DFU interface
    async fn close(&mut self) -> Result<(), TransportError>;

    /// Issue DFU_ABORT to return the device to dfuIDLE
    async fn abort_to_idle(&mut self) -> Result<(), TransportError>;

    /// Issue DFU_GETSTATUS and decode the 6-byte response
    async fn get_status(&mut self) -> Result<DeviceStatus, TransportError>;

    /// Issue DFU_DNLOAD with `data` at block number `block`
    ///
    /// Returns the number of bytes the device actually accepted, which
    /// may be less than `data.len()`. A zero-length download at block 0
    /// is the manifest trigger.
    async fn download(&mut self, data: &[u8], block: u16) -> Result<usize, TransportError>;
}

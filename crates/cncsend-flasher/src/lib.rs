//! # cncsend Flasher
//!
//! USB DFU firmware flashing engine for GRBL/grblHAL controller boards
//! (DfuSe variant, STM32 bootloaders).
//!
//! The engine drives erase, chunked download and manifest against a
//! [`FirmwareImage`] through a [`DfuTransport`]: every protocol step is
//! strictly sequential, progress and errors are reported on an explicit
//! event channel, and the transport handle is released on every exit
//! path of a flashing session.

pub mod dfu;
pub mod error;
pub mod event;
pub mod flasher;
pub mod image;
pub mod memory;
pub mod poll;
pub mod transport;

pub use dfu::{DeviceStatus, DfuState, DfuStatus, DFU_CMD_ERASE_PAGE, DFU_CMD_SET_ADDRESS};
pub use error::{FlashError, Result};
pub use event::FlashEvent;
pub use flasher::{DfuFlasher, FlashState, FlasherConfig};
pub use image::{FirmwareImage, FormatError, ImageLoader};
pub use memory::{MemoryMap, MemorySegment};
pub use poll::{cancel_pair, CancelHandle, CancelToken, PollConfig};
pub use transport::{DfuTransport, TransportError};

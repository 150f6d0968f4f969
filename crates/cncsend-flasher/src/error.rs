//! Error taxonomy for the flashing engine
//!
//! Parser-level format problems, memory-map lookups, protocol-level
//! device complaints, poll budgets and transport failures each get their
//! own variant so a terminal error event can carry enough detail for
//! operator diagnosis.

use thiserror::Error;

use crate::dfu::{DfuState, DfuStatus};
use crate::image::FormatError;
use crate::transport::TransportError;

/// Fatal flashing error
///
/// Any of these terminates the current session; the engine performs a
/// best-effort abort-to-idle and releases the transport before the error
/// is surfaced.
#[derive(Error, Debug)]
pub enum FlashError {
    /// USB-layer failure (open/send/close)
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// Device reported an unexpected state or a non-OK status
    #[error("device reported state {state} status {status} during {context}")]
    Protocol {
        /// Device state at the failing query
        state: DfuState,
        /// Device status code at the failing query
        status: DfuStatus,
        /// Which operation was in flight
        context: String,
    },

    /// Address is outside every known memory segment
    #[error("no memory segment contains address {address:#010x}")]
    SegmentLookup {
        /// The address that failed the lookup
        address: u32,
    },

    /// Polling budget exhausted before the predicate held
    #[error("device did not reach the expected state after {attempts} status polls")]
    Timeout {
        /// Number of polls performed
        attempts: u32,
    },

    /// Session cancelled from outside
    #[error("flashing session cancelled")]
    Cancelled,

    /// DfuSe command parameter length other than 1 or 4 bytes
    #[error("DFU command parameter must be 1 or 4 bytes, got {len}")]
    InvalidParameterLength {
        /// The rejected length
        len: usize,
    },

    /// Device accepted zero bytes of a chunk without reporting an error
    #[error("device accepted 0 bytes at address {address:#010x}")]
    Stalled {
        /// Target address of the stalled chunk
        address: u32,
    },

    /// Firmware image carries no data blocks
    #[error("firmware image contains no data blocks")]
    EmptyImage,

    /// GETSTATUS response shorter than the 6-byte DFU payload
    #[error("GETSTATUS response too short: {got} of 6 bytes")]
    ShortStatus {
        /// Bytes actually received
        got: usize,
    },

    /// Unrecognized DFU state code in a GETSTATUS response
    #[error("unrecognized DFU state code {0}")]
    UnknownState(u8),

    /// Unrecognized DFU status code in a GETSTATUS response
    #[error("unrecognized DFU status code {0}")]
    UnknownStatus(u8),

    /// Malformed firmware image input
    #[error(transparent)]
    Format(#[from] FormatError),
}

/// Result type using [`FlashError`]
pub type Result<T> = std::result::Result<T, FlashError>;

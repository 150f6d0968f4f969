//! Outbound engine events
//!
//! The engine writes progress and errors to an explicit channel created
//! together with it; the UI (or any other consumer) subscribes to the
//! receiving end independently of the protocol logic.

use serde::{Deserialize, Serialize};

use crate::dfu::{DfuState, DfuStatus};

/// Event emitted by the flashing engine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum FlashEvent {
    /// Informational message about the current step
    Info {
        /// Human-readable step description
        message: String,
    },
    /// Byte-level progress, also emitted per sector during erase
    Progress {
        /// Bytes sent (or erased) so far
        bytes_sent: usize,
        /// Total bytes expected for the operation
        expected_total: usize,
    },
    /// Terminal failure of the session
    Error {
        /// Human-readable cause
        message: String,
        /// Device state at the failure, when a status query produced it
        state: Option<DfuState>,
        /// Device status code at the failure, when available
        status: Option<DfuStatus>,
        /// Flash address the session had reached
        address: u32,
        /// Bytes the session had sent before failing
        bytes_sent: usize,
    },
    /// Session finished successfully and the transport was released
    End,
}

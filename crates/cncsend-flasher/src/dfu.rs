//! DFU 1.1 protocol types
//!
//! State and status code points, the GETSTATUS payload decode, and the
//! DfuSe vendor command opcodes used by STM32 bootloaders.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::FlashError;

/// DfuSe command opcode: set the address pointer for the next transfer
pub const DFU_CMD_SET_ADDRESS: u8 = 0x21;
/// DfuSe command opcode: erase the sector containing the given address
pub const DFU_CMD_ERASE_PAGE: u8 = 0x41;

/// DFU device state (DFU 1.1 §6.1.2)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DfuState {
    /// Device is running its normal application
    AppIdle,
    /// Application has received a detach request
    AppDetach,
    /// Device is in DFU mode, idle
    DfuIdle,
    /// Download in progress, device expects a GETSTATUS
    DnloadSync,
    /// Device is busy programming the last block
    DnBusy,
    /// Download phase idle, device expects more blocks
    DnloadIdle,
    /// All blocks received, device expects the manifest sequence
    ManifestSync,
    /// Device is manifesting the new firmware
    Manifest,
    /// Manifestation complete, device awaits USB reset
    ManifestWaitReset,
    /// Upload in progress
    UploadIdle,
    /// Device reported an error; a CLRSTATUS is required
    Error,
}

impl DfuState {
    /// Decode a state code from a GETSTATUS response
    pub fn from_code(code: u8) -> Result<Self, FlashError> {
        match code {
            0 => Ok(Self::AppIdle),
            1 => Ok(Self::AppDetach),
            2 => Ok(Self::DfuIdle),
            3 => Ok(Self::DnloadSync),
            4 => Ok(Self::DnBusy),
            5 => Ok(Self::DnloadIdle),
            6 => Ok(Self::ManifestSync),
            7 => Ok(Self::Manifest),
            8 => Ok(Self::ManifestWaitReset),
            9 => Ok(Self::UploadIdle),
            10 => Ok(Self::Error),
            other => Err(FlashError::UnknownState(other)),
        }
    }

    /// Wire code of this state
    pub fn code(self) -> u8 {
        match self {
            Self::AppIdle => 0,
            Self::AppDetach => 1,
            Self::DfuIdle => 2,
            Self::DnloadSync => 3,
            Self::DnBusy => 4,
            Self::DnloadIdle => 5,
            Self::ManifestSync => 6,
            Self::Manifest => 7,
            Self::ManifestWaitReset => 8,
            Self::UploadIdle => 9,
            Self::Error => 10,
        }
    }
}

impl fmt::Display for DfuState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::AppIdle => "appIDLE",
            Self::AppDetach => "appDETACH",
            Self::DfuIdle => "dfuIDLE",
            Self::DnloadSync => "dfuDNLOAD-SYNC",
            Self::DnBusy => "dfuDNBUSY",
            Self::DnloadIdle => "dfuDNLOAD-IDLE",
            Self::ManifestSync => "dfuMANIFEST-SYNC",
            Self::Manifest => "dfuMANIFEST",
            Self::ManifestWaitReset => "dfuMANIFEST-WAIT-RESET",
            Self::UploadIdle => "dfuUPLOAD-IDLE",
            Self::Error => "dfuERROR",
        };
        write!(f, "{}", name)
    }
}

/// DFU device status code (DFU 1.1 §6.1.2)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DfuStatus {
    /// No error condition is present
    Ok,
    /// File is not targeted for use by this device
    ErrTarget,
    /// File fails a vendor-specific verification test
    ErrFile,
    /// Device is unable to write memory
    ErrWrite,
    /// Memory erase function failed
    ErrErase,
    /// Memory erase check failed
    ErrCheckErased,
    /// Program memory function failed
    ErrProg,
    /// Programmed memory failed verification
    ErrVerify,
    /// Address received is out of range
    ErrAddress,
    /// Received DFU_DNLOAD with zero length but device expects more data
    ErrNotDone,
    /// Firmware is corrupt; device cannot return to run-time operations
    ErrFirmware,
    /// Vendor-specific error
    ErrVendor,
    /// Device detected an unexpected USB reset
    ErrUsbReset,
    /// Device detected an unexpected power-on reset
    ErrPowerOnReset,
    /// Unknown error
    ErrUnknown,
    /// Device stalled an unexpected request
    ErrStalledPkt,
}

impl DfuStatus {
    /// Decode a status code from a GETSTATUS response
    pub fn from_code(code: u8) -> Result<Self, FlashError> {
        match code {
            0x00 => Ok(Self::Ok),
            0x01 => Ok(Self::ErrTarget),
            0x02 => Ok(Self::ErrFile),
            0x03 => Ok(Self::ErrWrite),
            0x04 => Ok(Self::ErrErase),
            0x05 => Ok(Self::ErrCheckErased),
            0x06 => Ok(Self::ErrProg),
            0x07 => Ok(Self::ErrVerify),
            0x08 => Ok(Self::ErrAddress),
            0x09 => Ok(Self::ErrNotDone),
            0x0a => Ok(Self::ErrFirmware),
            0x0b => Ok(Self::ErrVendor),
            0x0c => Ok(Self::ErrUsbReset),
            0x0d => Ok(Self::ErrPowerOnReset),
            0x0e => Ok(Self::ErrUnknown),
            0x0f => Ok(Self::ErrStalledPkt),
            other => Err(FlashError::UnknownStatus(other)),
        }
    }
}

impl fmt::Display for DfuStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Ok => "OK",
            Self::ErrTarget => "errTARGET",
            Self::ErrFile => "errFILE",
            Self::ErrWrite => "errWRITE",
            Self::ErrErase => "errERASE",
            Self::ErrCheckErased => "errCHECK_ERASED",
            Self::ErrProg => "errPROG",
            Self::ErrVerify => "errVERIFY",
            Self::ErrAddress => "errADDRESS",
            Self::ErrNotDone => "errNOTDONE",
            Self::ErrFirmware => "errFIRMWARE",
            Self::ErrVendor => "errVENDOR",
            Self::ErrUsbReset => "errUSBR",
            Self::ErrPowerOnReset => "errPOR",
            Self::ErrUnknown => "errUNKNOWN",
            Self::ErrStalledPkt => "errSTALLEDPKT",
        };
        write!(f, "{}", name)
    }
}

/// Transient device status returned by every GETSTATUS query
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceStatus {
    /// Status of the last request
    pub status: DfuStatus,
    /// Minimum milliseconds the host should wait before the next GETSTATUS
    pub poll_timeout: u32,
    /// Current device state
    pub state: DfuState,
}

impl DeviceStatus {
    /// Decode the 6-byte GETSTATUS payload
    ///
    /// Layout: bStatus, 3-byte little-endian bwPollTimeout, bState,
    /// iString (ignored).
    pub fn from_bytes(raw: &[u8]) -> Result<Self, FlashError> {
        if raw.len() < 6 {
            return Err(FlashError::ShortStatus { got: raw.len() });
        }
        Ok(Self {
            status: DfuStatus::from_code(raw[0])?,
            poll_timeout: u32::from_le_bytes([raw[1], raw[2], raw[3], 0]),
            state: DfuState::from_code(raw[4])?,
        })
    }

    /// Whether the device reports no error condition
    pub fn is_ok(&self) -> bool {
        self.status == DfuStatus::Ok
    }
}

//! DFU flashing engine
//!
//! Orchestrates erase, chunked download and manifest for one firmware
//! image over one exclusively-owned transport handle. The session state
//! machine is IDLE -> OPENING -> WRITING -> SETTING_ADDRESS ->
//! MANIFESTING -> DONE, with ERROR reachable from any non-terminal state
//! and terminal. The transport is released exactly once on every exit
//! path, and no attempt is made to undo partially written flash: after a
//! failure the device's programmed state is indeterminate and is
//! reported to the operator as incomplete.

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::dfu::{DfuState, DFU_CMD_ERASE_PAGE, DFU_CMD_SET_ADDRESS};
use crate::error::{FlashError, Result};
use crate::event::FlashEvent;
use crate::image::FirmwareImage;
use crate::memory::MemoryMap;
use crate::poll::{self, cancel_pair, CancelHandle, CancelToken, PollConfig};
use crate::transport::DfuTransport;

/// Session state of the flashing engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FlashState {
    /// No session in progress
    Idle,
    /// Transport is being opened
    Opening,
    /// Data blocks are being downloaded
    Writing,
    /// Entry-point address is being set ahead of manifest
    SettingAddress,
    /// Device is manifesting the downloaded image
    Manifesting,
    /// Session finished successfully
    Done,
    /// Session terminated with a fatal error
    Error,
}

/// Engine tuning knobs
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FlasherConfig {
    /// Maximum bytes per DNLOAD transfer
    pub xfer_size: usize,
    /// Retry budget for status poll loops
    pub poll: PollConfig,
}

impl Default for FlasherConfig {
    fn default() -> Self {
        Self {
            xfer_size: 2048,
            poll: PollConfig::default(),
        }
    }
}

/// DFU flashing engine
///
/// Owns the transport for the lifetime of one session. Progress and
/// errors are reported on the event channel returned by [`DfuFlasher::new`];
/// the matching [`CancelHandle`] stops a running session within one poll
/// interval.
pub struct DfuFlasher<T: DfuTransport> {
    transport: T,
    memory: MemoryMap,
    config: FlasherConfig,
    state: FlashState,
    bytes_sent: usize,
    expected_total: usize,
    current_address: u32,
    events: mpsc::UnboundedSender<FlashEvent>,
    cancel: CancelToken,
}

impl<T: DfuTransport> DfuFlasher<T> {
    /// Create an engine around a transport and device memory map
    ///
    /// Returns the engine, the receiving end of its event channel, and
    /// the cancellation handle for the session.
    pub fn new(
        transport: T,
        memory: MemoryMap,
        config: FlasherConfig,
    ) -> (Self, mpsc::UnboundedReceiver<FlashEvent>, CancelHandle) {
        let (events, event_rx) = mpsc::unbounded_channel();
        let (cancel_handle, cancel) = cancel_pair();
        let flasher = Self {
            transport,
            memory,
            config,
            state: FlashState::Idle,
            bytes_sent: 0,
            expected_total: 0,
            current_address: 0,
            events,
            cancel,
        };
        (flasher, event_rx, cancel_handle)
    }

    /// Current session state
    pub fn state(&self) -> FlashState {
        self.state
    }

    /// Flash a firmware image and release the transport
    ///
    /// Consumes the engine: the session ends here on every path. On
    /// failure a best-effort abort-to-idle is attempted, the transport
    /// is closed, and a terminal error event carries the device state,
    /// status code, address and byte offset for diagnosis.
    pub async fn flash(mut self, image: &FirmwareImage) -> Result<()> {
        let outcome = self.run(image).await;
        match outcome {
            Ok(()) => {
                self.state = FlashState::Done;
                if let Err(close_err) = self.transport.close().await {
                    self.state = FlashState::Error;
                    let err = FlashError::from(close_err);
                    self.emit(self.error_event(&err));
                    return Err(err);
                }
                self.emit(FlashEvent::End);
                info!("flashing session complete, {} bytes written", self.bytes_sent);
                Ok(())
            }
            Err(err) => {
                self.state = FlashState::Error;
                if let Err(abort_err) = self.transport.abort_to_idle().await {
                    warn!(%abort_err, "abort-to-idle failed during error recovery");
                }
                if let Err(close_err) = self.transport.close().await {
                    warn!(%close_err, "transport close failed during error recovery");
                }
                self.emit(self.error_event(&err));
                Err(err)
            }
        }
    }

    async fn run(&mut self, image: &FirmwareImage) -> Result<()> {
        if image.is_empty() {
            return Err(FlashError::EmptyImage);
        }

        self.state = FlashState::Opening;
        self.transport.open().await?;

        self.state = FlashState::Writing;
        self.expected_total = image.total_len();
        for (address, block) in image.blocks() {
            self.check_cancelled()?;
            self.emit(FlashEvent::Info {
                message: format!(
                    "Writing block of size {} at address {:#010x}",
                    block.len(),
                    address
                ),
            });
            self.download(address, block).await?;
        }

        // Point the device back at the image entry point before manifest.
        let entry = image.first_address().ok_or(FlashError::EmptyImage)?;
        self.state = FlashState::SettingAddress;
        info!("jumping to entry point {:#010x} to manifest", entry);
        self.send_dfu_command(DFU_CMD_SET_ADDRESS, entry, 4).await?;
        let status = self.transport.get_status().await?;
        if !status.is_ok() {
            return Err(FlashError::Protocol {
                state: status.state,
                status: status.status,
                context: "set entry address".to_string(),
            });
        }

        self.state = FlashState::Manifesting;
        self.transport.download(&[], 0).await?;
        poll::poll_until(
            &mut self.transport,
            &self.config.poll,
            &self.cancel,
            "manifest",
            |state| state == DfuState::Manifest || state == DfuState::ManifestWaitReset,
        )
        .await?;

        Ok(())
    }

    /// Download one data block in transfer-sized chunks
    ///
    /// Advances strictly by the number of bytes the device accepts:
    /// a short write shrinks the step and the next chunk is addressed at
    /// the first unaccepted byte, so the block is reproduced on the
    /// device byte-for-byte with no skips or duplicates.
    pub async fn download(&mut self, start_address: u32, data: &[u8]) -> Result<()> {
        debug!(
            "starting download of {} bytes at {:#010x}",
            data.len(),
            start_address
        );

        // One abort per block, not per chunk.
        self.transport.abort_to_idle().await?;

        self.expected_total = self.expected_total.max(self.bytes_sent + data.len());

        let mut sent = 0usize;
        while sent < data.len() {
            self.check_cancelled()?;

            let address = start_address + sent as u32;
            let chunk_size = (data.len() - sent).min(self.config.xfer_size);

            self.send_dfu_command(DFU_CMD_SET_ADDRESS, address, 4).await?;
            let status = self.transport.get_status().await?;
            if !status.is_ok() {
                return Err(FlashError::Protocol {
                    state: status.state,
                    status: status.status,
                    context: "set chunk address".to_string(),
                });
            }

            let written = self
                .transport
                .download(&data[sent..sent + chunk_size], 2)
                .await?;
            if written == 0 {
                return Err(FlashError::Stalled { address });
            }
            debug!("device accepted {} bytes at {:#010x}", written, address);

            // Wait for the device to leave dfuDNBUSY and settle back
            // into the download-idle state before the next chunk.
            poll::poll_until(
                &mut self.transport,
                &self.config.poll,
                &self.cancel,
                "chunk write",
                |state| state == DfuState::DnloadIdle,
            )
            .await?;

            sent += written;
            self.bytes_sent += written;
            self.current_address = address + written as u32;
            self.emit(FlashEvent::Progress {
                bytes_sent: self.bytes_sent,
                expected_total: self.expected_total,
            });
        }

        debug!("finished block download");
        Ok(())
    }

    /// Erase the sector-aligned range covering `start_address..+length`
    ///
    /// Sectors inside non-eraseable segments are skipped without a
    /// device command but still counted toward progress.
    pub async fn erase(&mut self, start_address: u32, length: u32) -> Result<()> {
        if length == 0 {
            return Ok(());
        }
        let mut segment = *self
            .memory
            .segment_containing(start_address)
            .ok_or(FlashError::SegmentLookup {
                address: start_address,
            })?;

        let last = start_address + length - 1;
        let end_segment = self
            .memory
            .segment_containing(last)
            .copied()
            .unwrap_or(segment);

        let erase_start = segment.sector_start(start_address);
        let erase_end = end_segment.sector_end(last);
        let total = (erase_end - erase_start) as usize;
        let mut erased = 0usize;
        let mut addr = erase_start;

        while addr < erase_end {
            self.check_cancelled()?;

            if segment.end <= addr {
                segment = *self
                    .memory
                    .segment_containing(addr)
                    .ok_or(FlashError::SegmentLookup { address: addr })?;
            }

            if !segment.eraseable {
                let skip_to = segment.end.min(erase_end);
                erased += (skip_to - addr) as usize;
                addr = skip_to;
                self.emit(FlashEvent::Progress {
                    bytes_sent: erased,
                    expected_total: total,
                });
                continue;
            }

            let sector_addr = segment.sector_start(addr);
            debug!("erasing sector at {:#010x}", sector_addr);
            self.send_dfu_command(DFU_CMD_ERASE_PAGE, sector_addr, 4)
                .await?;

            addr = sector_addr + segment.sector_size;
            erased += segment.sector_size as usize;
            self.emit(FlashEvent::Progress {
                bytes_sent: erased,
                expected_total: total,
            });
            info!("erased {} of {} bytes", erased, total);
        }

        Ok(())
    }

    /// Send a DfuSe vendor command with a little-endian parameter
    ///
    /// `parameter_len` must be 1 or 4; anything else is a programming
    /// error and fails before any transport I/O. After the command the
    /// device is polled until it leaves dfuDNBUSY.
    pub async fn send_dfu_command(
        &mut self,
        command: u8,
        parameter: u32,
        parameter_len: usize,
    ) -> Result<()> {
        if parameter_len != 1 && parameter_len != 4 {
            return Err(FlashError::InvalidParameterLength { len: parameter_len });
        }

        let mut payload = Vec::with_capacity(1 + parameter_len);
        payload.push(command);
        if parameter_len == 1 {
            payload.push(parameter as u8);
        } else {
            payload.extend_from_slice(&parameter.to_le_bytes());
        }

        self.transport.download(&payload, 0).await?;

        poll::poll_until(
            &mut self.transport,
            &self.config.poll,
            &self.cancel,
            "vendor command",
            |state| state != DfuState::DnBusy,
        )
        .await?;

        Ok(())
    }

    fn check_cancelled(&self) -> Result<()> {
        if self.cancel.is_cancelled() {
            return Err(FlashError::Cancelled);
        }
        Ok(())
    }

    fn error_event(&self, err: &FlashError) -> FlashEvent {
        let (state, status) = match err {
            FlashError::Protocol { state, status, .. } => (Some(*state), Some(*status)),
            _ => (None, None),
        };
        FlashEvent::Error {
            message: err.to_string(),
            state,
            status,
            address: self.current_address,
            bytes_sent: self.bytes_sent,
        }
    }

    fn emit(&self, event: FlashEvent) {
        // The session does not depend on anyone listening.
        let _ = self.events.send(event);
    }
}

//! Bounded, cancellable status polling
//!
//! A poll loop repeatedly queries device status, evaluates a predicate
//! over the returned state, and fails with a timeout once its attempt
//! budget is exhausted. Cancellation takes effect within one poll
//! interval.

use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::sync::watch;
use tracing::debug;

use crate::dfu::{DeviceStatus, DfuState};
use crate::error::FlashError;
use crate::transport::DfuTransport;

/// Retry budget for one poll loop
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PollConfig {
    /// Maximum number of GETSTATUS queries per loop
    pub max_attempts: u32,
    /// Delay between queries, in milliseconds
    pub interval_ms: u64,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            max_attempts: 50,
            interval_ms: 100,
        }
    }
}

impl PollConfig {
    fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }
}

/// Sending half of a cancellation pair
pub struct CancelHandle {
    tx: watch::Sender<bool>,
}

impl CancelHandle {
    /// Request cancellation of the session holding the matching token
    pub fn cancel(&self) {
        let _ = self.tx.send(true);
    }
}

/// Receiving half of a cancellation pair, held by the engine
#[derive(Clone)]
pub struct CancelToken {
    rx: watch::Receiver<bool>,
}

impl CancelToken {
    /// Whether cancellation has been requested
    pub fn is_cancelled(&self) -> bool {
        *self.rx.borrow()
    }
}

/// Create a linked cancellation handle and token
pub fn cancel_pair() -> (CancelHandle, CancelToken) {
    let (tx, rx) = watch::channel(false);
    (CancelHandle { tx }, CancelToken { rx })
}

/// Poll device status until `predicate` holds for the reported state
///
/// Every returned status must be OK; a non-OK status fails the loop
/// immediately with the device's state and status codes attached. The
/// device's own bwPollTimeout is honored when it exceeds the configured
/// interval.
pub async fn poll_until<T, P>(
    transport: &mut T,
    config: &PollConfig,
    cancel: &CancelToken,
    context: &str,
    mut predicate: P,
) -> Result<DeviceStatus, FlashError>
where
    T: DfuTransport + ?Sized,
    P: FnMut(DfuState) -> bool,
{
    for attempt in 0..config.max_attempts {
        if cancel.is_cancelled() {
            return Err(FlashError::Cancelled);
        }

        let status = transport.get_status().await?;
        if !status.is_ok() {
            return Err(FlashError::Protocol {
                state: status.state,
                status: status.status,
                context: context.to_string(),
            });
        }
        if predicate(status.state) {
            return Ok(status);
        }

        debug!(
            attempt,
            state = %status.state,
            context,
            "device not ready, polling again"
        );

        let wait = config
            .interval()
            .max(Duration::from_millis(status.poll_timeout as u64));
        let mut rx = cancel.rx.clone();
        let sleep = tokio::time::sleep(wait);
        tokio::pin!(sleep);
        // The watch guard returned by wait_for is not Send; map it away
        // inside the arm so the loop's future stays spawnable.
        tokio::select! {
            _ = &mut sleep => {}
            changed = async { rx.wait_for(|cancelled| *cancelled).await.map(|_| ()) } => {
                if changed.is_ok() {
                    return Err(FlashError::Cancelled);
                }
                // Sender dropped: the session can no longer be
                // cancelled, finish the delay and keep polling.
                sleep.as_mut().await;
            }
        }
    }

    Err(FlashError::Timeout {
        attempts: config.max_attempts,
    })
}

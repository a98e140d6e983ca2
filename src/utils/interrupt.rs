//! Interrupt handling

use core::future::Future;
use std::io;
use tokio_util::sync::CancellationToken;
use tracing::warn;

/// Exit status after a second interrupt
pub const INTERRUPTED_EXIT_CODE: i32 = 130;

/// Cancel `cancel` on the first interrupt and wait for a second one
///
/// `next_interrupt` resolves once per interrupt (`tokio::signal::ctrl_c` in
/// the binary). Returns `true` when a second interrupt arrived, meaning the
/// user no longer wants to wait for the cancelled run to wind down, and
/// `false` when interrupts cannot be received.
pub async fn watch_interrupts<F, Fut>(cancel: CancellationToken, mut next_interrupt: F) -> bool
where
    F: FnMut() -> Fut,
    Fut: Future<Output = io::Result<()>>,
{
    if let Err(err) = next_interrupt().await {
        warn!("Cannot listen for interrupts: {err}");
        return false;
    }
    warn!("Interrupted, cancelling (interrupt again to exit immediately)");
    cancel.cancel();

    next_interrupt().await.is_ok()
}

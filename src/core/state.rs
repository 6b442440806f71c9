//! Shutdown state for build cancellation.
//!
//! The build checks `is_shutdown()` between phases and before committing
//! staged output, so Ctrl+C never leaves a half-written destination.

use std::sync::atomic::{AtomicBool, Ordering};

/// Shutdown has been requested (Ctrl+C received)
static SHUTDOWN: AtomicBool = AtomicBool::new(false);

/// Setup the global Ctrl+C handler. Call once at program start.
///
/// The first Ctrl+C only raises the flag; the running pass notices it at the
/// next phase boundary and discards its staging directory. A second Ctrl+C
/// exits immediately.
pub fn setup_shutdown_handler() -> anyhow::Result<()> {
    ctrlc::set_handler(|| {
        if SHUTDOWN.swap(true, Ordering::SeqCst) {
            std::process::exit(130);
        }
        crate::log!("build"; "cancelling...");
    })
    .map_err(|e| anyhow::anyhow!("failed to set Ctrl+C handler: {}", e))
}

/// Check if shutdown has been requested
///
/// Relaxed ordering: worst case a few more resources are transformed
/// before the pass stops.
pub fn is_shutdown() -> bool {
    SHUTDOWN.load(Ordering::Relaxed)
}

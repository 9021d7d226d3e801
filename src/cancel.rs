//! Ctrl+C handling: the refinement loop checks the flag before each
//! provider call and returns its last accepted state.

use std::sync::atomic::{AtomicBool, Ordering};

use log::{debug, warn};

static CANCELLED: AtomicBool = AtomicBool::new(false);

pub fn is_cancelled() -> bool {
    CANCELLED.load(Ordering::SeqCst)
}

/// Reset the cancellation flag (for testing or re-use).
pub fn reset() {
    CANCELLED.store(false, Ordering::SeqCst);
}

/// Set the flag without a signal.
pub fn request() {
    CANCELLED.store(true, Ordering::SeqCst);
}

/// Register the Ctrl+C handler.
pub fn register_handler() {
    if let Err(e) = ctrlc::set_handler(move || {
        warn!("Interrupted, finishing after the current step");
        request();
    }) {
        debug!("Could not install Ctrl+C handler: {}", e);
    }
}

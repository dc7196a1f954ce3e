use tracing::{error, info};

use crate::contract::Progress;

/// Emits progress as structured log events. The default when no richer
/// reporter is installed.
pub struct LogProgress;

impl Progress for LogProgress {
    fn update(&self, message: &str) {
        info!(status = message, "progress");
    }

    fn succeed(&self, message: &str) {
        info!(status = message, "progress succeeded");
    }

    fn fail(&self, message: &str) {
        error!(status = message, "progress failed");
    }
}

/// Discards all progress updates.
pub struct NoopProgress;

impl Progress for NoopProgress {
    fn update(&self, _message: &str) {}

    fn succeed(&self, _message: &str) {}

    fn fail(&self, _message: &str) {}
}

//! Pipeline statistics (atomic for thread-safe access)

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

#[derive(Debug, Default)]
pub struct PipelineStats {
    pub frames_processed: AtomicU64,
    pub records_decoded: AtomicU64,
    pub other_op_codes: AtomicU64,
    pub unknown_log_types: AtomicU64,
    pub malformed_envelopes: AtomicU64,
    pub truncated_messages: AtomicU64,
    pub unmapped_channels: AtomicU64,
    pub sink_failures: AtomicU64,
}

impl PipelineStats {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Frames dropped by any decode stage.
    pub fn dropped(&self) -> u64 {
        self.malformed_envelopes.load(Ordering::Relaxed)
            + self.truncated_messages.load(Ordering::Relaxed)
            + self.unmapped_channels.load(Ordering::Relaxed)
    }

    pub fn summary(&self) -> String {
        let other_ops = self.other_op_codes.load(Ordering::Relaxed);
        let unknown_logs = self.unknown_log_types.load(Ordering::Relaxed);
        format!(
            "Frames: {} | Decoded: {} | Passthrough: {} (other ops {}, unknown logs {}) | \
             Dropped: {} (malformed {}, truncated {}, unmapped {}) | Sink failures: {}",
            self.frames_processed.load(Ordering::Relaxed),
            self.records_decoded.load(Ordering::Relaxed),
            other_ops + unknown_logs,
            other_ops,
            unknown_logs,
            self.dropped(),
            self.malformed_envelopes.load(Ordering::Relaxed),
            self.truncated_messages.load(Ordering::Relaxed),
            self.unmapped_channels.load(Ordering::Relaxed),
            self.sink_failures.load(Ordering::Relaxed),
        )
    }
}

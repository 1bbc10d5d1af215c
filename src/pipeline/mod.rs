//! Decode pipeline
//!
//! Drives one capture frame at a time through envelope parse,
//! technology decode and wire encode, then fans the finished record
//! out to the registered sinks. Every failure is counted and dropped;
//! nothing a single frame contains can stop the loop.

mod registry;
mod stats;

pub use registry::SubscriberRegistry;
pub use stats::PipelineStats;

use std::sync::atomic::Ordering;
use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::diag::{self, DecodeError, DiagFrame, DIAG_LOG_F};
use crate::gsmtap::{encode_record, GpsFix};

pub struct DiagPipeline {
    registry: Arc<SubscriberRegistry>,
    stats: Arc<PipelineStats>,
    fix: Option<GpsFix>,
}

impl DiagPipeline {
    pub fn new(
        registry: Arc<SubscriberRegistry>,
        stats: Arc<PipelineStats>,
        fix: Option<GpsFix>,
    ) -> Self {
        Self {
            registry,
            stats,
            fix,
        }
    }

    pub fn process_frame(&self, frame: DiagFrame) {
        match frame {
            DiagFrame::Log { timestamp, payload } => self.process_log(timestamp, &payload),
            DiagFrame::StartLogFile { name } => {
                info!("[Pipeline] Device log rotation: starting {}", name);
                self.registry.notify_capture_started(&name);
            }
            DiagFrame::EndLogFile { name } => {
                info!("[Pipeline] Device log rotation: closing {}", name);
                self.registry.notify_capture_ended(&name);
            }
        }
    }

    fn process_log(&self, timestamp: f64, payload: &[u8]) {
        self.stats.frames_processed.fetch_add(1, Ordering::Relaxed);

        let message = match diag::parse_envelope(payload) {
            Ok(message) => message,
            Err(e) => {
                self.stats
                    .malformed_envelopes
                    .fetch_add(1, Ordering::Relaxed);
                debug!(
                    "[Pipeline] Dropping malformed message: {} hex={}",
                    e,
                    hex_preview(payload)
                );
                return;
            }
        };
        if message.op_code != DIAG_LOG_F {
            self.stats.other_op_codes.fetch_add(1, Ordering::Relaxed);
            debug!(
                "[Pipeline] Passing over op code {} (not a log record)",
                message.op_code
            );
            return;
        }

        match diag::decode_log(message.log_type, &message.log_payload) {
            Ok(Some(ota)) => {
                self.stats.records_decoded.fetch_add(1, Ordering::Relaxed);
                debug!(
                    "[Pipeline] {} record: {} L3 bytes (log 0x{:04X}, modem ts {})",
                    ota.technology,
                    ota.layer3.len(),
                    message.log_type,
                    message.timestamp
                );
                let record = encode_record(&ota, timestamp, self.fix.as_ref());
                let failures = self.registry.notify_record(&record);
                if failures > 0 {
                    self.stats
                        .sink_failures
                        .fetch_add(failures as u64, Ordering::Relaxed);
                }
            }
            Ok(None) => {
                self.stats.unknown_log_types.fetch_add(1, Ordering::Relaxed);
                debug!(
                    "[Pipeline] No decoder for log type 0x{:04X}",
                    message.log_type
                );
            }
            Err(
                e @ (DecodeError::TruncatedMessage { .. } | DecodeError::StreamTruncated { .. }),
            ) => {
                self.stats
                    .truncated_messages
                    .fetch_add(1, Ordering::Relaxed);
                debug!("[Pipeline] Dropping truncated message: {}", e);
            }
            Err(e @ DecodeError::UnknownChannelMapping { .. }) => {
                self.stats.unmapped_channels.fetch_add(1, Ordering::Relaxed);
                // Raw values land in the log so the tables can be extended
                warn!(
                    "[Pipeline] Dropping unmapped message: {} hex={}",
                    e,
                    hex_preview(&message.log_payload)
                );
            }
            Err(e) => {
                self.stats
                    .malformed_envelopes
                    .fetch_add(1, Ordering::Relaxed);
                debug!(
                    "[Pipeline] Dropping malformed message: {} hex={}",
                    e,
                    hex_preview(&message.log_payload)
                );
            }
        }
    }
}

// Enough of a dropped payload to identify the log format in question
const PREVIEW_LEN: usize = 32;

fn hex_preview(bytes: &[u8]) -> String {
    if bytes.len() > PREVIEW_LEN {
        format!("{}..", hex::encode(&bytes[..PREVIEW_LEN]))
    } else {
        hex::encode(bytes)
    }
}

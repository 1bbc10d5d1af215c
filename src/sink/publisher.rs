//! gRPC publisher sink
//!
//! Bridges the synchronous decode loop onto the async gateway streams.
//! Records and capture status go into bounded tokio channels; the
//! streaming tasks drain them. A full record channel drops the record
//! rather than stalling the capture.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::Utc;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tracing::debug;

use crate::grpc::diagmon::{CaptureStatus, DiagRecord};
use crate::gsmtap::{GpsFix, WireRecord};
use crate::pipeline::PipelineStats;
use crate::sink::{RecordSubscriber, SinkError};

pub struct RecordPublisher {
    device_id: String,
    mission_id: String,
    fix: Option<GpsFix>,
    stats: Arc<PipelineStats>,
    record_tx: mpsc::Sender<DiagRecord>,
    status_tx: mpsc::Sender<CaptureStatus>,
    pub published: AtomicU64,
    pub dropped: AtomicU64,
}

impl RecordPublisher {
    pub fn new(
        device_id: String,
        mission_id: String,
        fix: Option<GpsFix>,
        stats: Arc<PipelineStats>,
        record_tx: mpsc::Sender<DiagRecord>,
        status_tx: mpsc::Sender<CaptureStatus>,
    ) -> Self {
        Self {
            device_id,
            mission_id,
            fix,
            stats,
            record_tx,
            status_tx,
            published: AtomicU64::new(0),
            dropped: AtomicU64::new(0),
        }
    }

    fn capture_status(&self, capturing: bool, capture_file: &str) -> CaptureStatus {
        CaptureStatus {
            device_id: self.device_id.clone(),
            mission_id: self.mission_id.clone(),
            capturing,
            capture_file: capture_file.to_string(),
            frames_processed: self.stats.frames_processed.load(Ordering::Relaxed),
            records_written: self.stats.records_decoded.load(Ordering::Relaxed),
            frames_dropped: self.stats.dropped(),
            timestamp_ms: Utc::now().timestamp_millis() as u64,
        }
    }

    fn push_status(&self, status: CaptureStatus) {
        // Status is advisory; a full or closed channel is not a sink failure
        if let Err(e) = self.status_tx.try_send(status) {
            debug!("[Publisher] Capture status not sent: {}", e);
        }
    }
}

impl RecordSubscriber for RecordPublisher {
    fn name(&self) -> &str {
        "grpc-publisher"
    }

    fn on_capture_started(&self, source_name: &str) -> Result<(), SinkError> {
        self.push_status(self.capture_status(true, source_name));
        Ok(())
    }

    fn on_record(&self, record: &WireRecord) -> Result<(), SinkError> {
        let (latitude, longitude, altitude) = match &self.fix {
            Some(fix) => (fix.latitude, fix.longitude, fix.altitude.unwrap_or(0.0)),
            None => (0.0, 0.0, 0.0),
        };
        let message = DiagRecord {
            device_id: self.device_id.clone(),
            mission_id: self.mission_id.clone(),
            timestamp_ms: (record.meta.timestamp * 1000.0) as u64,
            record: record.bytes.clone(),
            gsmtap_type: record.meta.gsmtap_type as u32,
            gsmtap_subtype: record.meta.gsmtap_subtype as u32,
            uplink: record.meta.uplink,
            latitude,
            longitude,
            altitude,
            has_fix: self.fix.is_some(),
        };
        match self.record_tx.try_send(message) {
            Ok(()) => {
                self.published.fetch_add(1, Ordering::Relaxed);
                Ok(())
            }
            Err(TrySendError::Full(_)) => {
                self.dropped.fetch_add(1, Ordering::Relaxed);
                Err(SinkError::ChannelFull)
            }
            Err(TrySendError::Closed(_)) => Err(SinkError::ChannelClosed),
        }
    }

    fn on_capture_ended(&self, source_name: &str) -> Result<(), SinkError> {
        self.push_status(self.capture_status(false, source_name));
        Ok(())
    }
}

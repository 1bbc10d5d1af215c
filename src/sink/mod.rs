//! Record sinks
//!
//! Everything downstream of the decode pipeline implements
//! [`RecordSubscriber`]: the pcap file writer and the gRPC record
//! publisher today. Sinks fail per record; the pipeline counts the
//! failure and keeps going.

mod pcap_file;
mod publisher;

pub use pcap_file::PcapFileSink;
pub use publisher::RecordPublisher;

use thiserror::Error;

use crate::gsmtap::WireRecord;

#[derive(Debug, Error)]
pub enum SinkError {
    #[error("write failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("sink unavailable until the next capture rotation")]
    Unavailable,
    #[error("publish channel full")]
    ChannelFull,
    #[error("publish channel closed")]
    ChannelClosed,
}

/// A consumer of encoded capture records.
///
/// Calls arrive on the pipeline thread. Implementations must be safe
/// to invoke while other threads register or remove subscribers.
pub trait RecordSubscriber: Send + Sync {
    fn name(&self) -> &str;

    /// The device-side log rotated to a new file.
    fn on_capture_started(&self, _source_name: &str) -> Result<(), SinkError> {
        Ok(())
    }

    /// The device-side log file was closed.
    fn on_capture_ended(&self, _source_name: &str) -> Result<(), SinkError> {
        Ok(())
    }

    fn on_record(&self, record: &WireRecord) -> Result<(), SinkError>;
}

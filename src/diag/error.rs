//! Decode failure taxonomy shared by the framing layer and the OTA decoders

use thiserror::Error;

use super::types::RadioTechnology;

/// Why a frame or message could not be decoded.
///
/// `StreamTruncated` is the only retryable case: on a live pipe it means
/// "read more bytes". Everything else consumes and drops the input.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    /// Fewer bytes buffered than the frame header declares.
    #[error("truncated stream: need {needed} bytes, have {available}")]
    StreamTruncated { needed: usize, available: usize },

    /// Frame or message envelope does not match the expected layout.
    #[error("malformed envelope: {0}")]
    MalformedEnvelope(String),

    /// A (version, channel type) pair absent from the subtype tables.
    #[error("no {technology} mapping for version {version}, channel type 0x{channel_type:02X}")]
    UnknownChannelMapping {
        technology: RadioTechnology,
        version: u8,
        channel_type: u16,
    },

    /// Message body ends before its own header says it should.
    #[error("truncated {technology} message ({len} bytes)")]
    TruncatedMessage { technology: RadioTechnology, len: usize },
}

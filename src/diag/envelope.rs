//! QCDM message envelope
//!
//! Every log frame body is one modem message terminated by a 0x7e footer.
//! Some baseband revisions prepend a fixed 8-byte async marker; it carries
//! no information and is stripped before the envelope proper.

use super::error::DecodeError;

/// Diag opcode for log records. Anything else (events, debug strings,
/// command responses) is passed through untouched.
pub const DIAG_LOG_F: u8 = 16;

const FRAME_FOOTER: u8 = 0x7e;
const ASYNC_PREFIX: [u8; 8] = [0x98, 0x01, 0x00, 0x00, 0x01, 0x00, 0x00, 0x00];

/// Parsed 16-byte log envelope plus the technology-specific payload.
#[derive(Debug, Clone, PartialEq)]
pub struct QcdmMessage {
    pub op_code: u8,
    pub log_type: u16,
    /// Modem-side timestamp in Qualcomm's 1.25 ms tick format.
    pub timestamp: u64,
    pub log_payload: Vec<u8>,
}

pub fn parse_envelope(body: &[u8]) -> Result<QcdmMessage, DecodeError> {
    let Some((&last, inner)) = body.split_last() else {
        return Err(DecodeError::MalformedEnvelope(
            "empty message body".to_string(),
        ));
    };
    if last != FRAME_FOOTER {
        return Err(DecodeError::MalformedEnvelope(
            "missing 0x7e message footer".to_string(),
        ));
    }
    let inner = match inner.strip_prefix(&ASYNC_PREFIX[..]) {
        Some(stripped) => stripped,
        None => inner,
    };
    if inner.len() < 16 {
        return Err(DecodeError::MalformedEnvelope(format!(
            "envelope of {} bytes is shorter than its 16-byte header",
            inner.len()
        )));
    }
    // The length words at 2..6 are advisory only; the slice length wins.
    let mut ts = [0u8; 8];
    ts.copy_from_slice(&inner[8..16]);
    Ok(QcdmMessage {
        op_code: inner[0],
        log_type: u16::from_le_bytes([inner[6], inner[7]]),
        timestamp: u64::from_le_bytes(ts),
        log_payload: inner[16..].to_vec(),
    })
}

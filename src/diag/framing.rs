//! Capture stream framing
//!
//! The native helper wraps everything it reads from the diag device in a
//! small frame: a little-endian type word, a length word, then the body.
//! Log frames carry an 8-byte POSIX timestamp (f64) ahead of the payload;
//! start/end markers carry the device-side log file name.

use super::error::DecodeError;

pub const FRAME_TYPE_LOG: u16 = 1;
pub const FRAME_TYPE_START_LOG_FILE: u16 = 2;
pub const FRAME_TYPE_END_LOG_FILE: u16 = 3;

/// One frame read off the capture stream.
#[derive(Debug, Clone, PartialEq)]
pub enum DiagFrame {
    /// A timestamped QCDM message as delivered by the modem.
    Log { timestamp: f64, payload: Vec<u8> },
    /// The helper opened a new device-side log file.
    StartLogFile { name: String },
    /// The helper closed the current device-side log file.
    EndLogFile { name: String },
}

/// Incremental frame decoder.
///
/// Feed it whatever `read()` returned and drain frames with
/// [`next_frame`](Self::next_frame). `Ok(None)` means the buffered bytes do
/// not yet hold a complete frame; keep reading. A decode error consumes the
/// offending frame so the stream stays in sync.
#[derive(Debug, Default)]
pub struct FrameDecoder {
    buf: Vec<u8>,
}

impl FrameDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, bytes: &[u8]) {
        self.buf.extend_from_slice(bytes);
    }

    /// Bytes buffered but not yet decoded.
    pub fn buffered(&self) -> usize {
        self.buf.len()
    }

    pub fn next_frame(&mut self) -> Result<Option<DiagFrame>, DecodeError> {
        if self.buf.len() < 4 {
            return Ok(None);
        }
        let frame_type = u16::from_le_bytes([self.buf[0], self.buf[1]]);
        let length = u16::from_le_bytes([self.buf[2], self.buf[3]]) as usize;
        if self.buf.len() < 4 + length {
            return Ok(None);
        }
        let body = self.buf[4..4 + length].to_vec();
        self.buf.drain(..4 + length);

        match frame_type {
            FRAME_TYPE_LOG => {
                if body.len() < 8 {
                    return Err(DecodeError::MalformedEnvelope(format!(
                        "log frame of {} bytes is shorter than its timestamp",
                        body.len()
                    )));
                }
                let mut ts = [0u8; 8];
                ts.copy_from_slice(&body[..8]);
                Ok(Some(DiagFrame::Log {
                    timestamp: f64::from_le_bytes(ts),
                    payload: body[8..].to_vec(),
                }))
            }
            FRAME_TYPE_START_LOG_FILE => Ok(Some(DiagFrame::StartLogFile {
                name: frame_name(&body),
            })),
            FRAME_TYPE_END_LOG_FILE => Ok(Some(DiagFrame::EndLogFile {
                name: frame_name(&body),
            })),
            other => Err(DecodeError::MalformedEnvelope(format!(
                "unrecognized frame type {}",
                other
            ))),
        }
    }

    /// Call at end of a finite stream: leftover bytes mean the recording
    /// stops mid-frame.
    pub fn finish(&self) -> Result<(), DecodeError> {
        if self.buf.is_empty() {
            return Ok(());
        }
        let needed = if self.buf.len() >= 4 {
            4 + u16::from_le_bytes([self.buf[2], self.buf[3]]) as usize
        } else {
            4
        };
        Err(DecodeError::StreamTruncated {
            needed,
            available: self.buf.len(),
        })
    }
}

/// File-name bodies are NUL padded by the helper.
fn frame_name(body: &[u8]) -> String {
    String::from_utf8_lossy(body)
        .trim_end_matches('\0')
        .trim()
        .to_string()
}

/// Encode a frame in the helper's on-wire layout.
#[cfg(test)]
pub fn encode_frame(frame: &DiagFrame) -> Vec<u8> {
    let (frame_type, body) = match frame {
        DiagFrame::Log { timestamp, payload } => {
            let mut body = Vec::with_capacity(8 + payload.len());
            body.extend_from_slice(&timestamp.to_le_bytes());
            body.extend_from_slice(payload);
            (FRAME_TYPE_LOG, body)
        }
        DiagFrame::StartLogFile { name } => (FRAME_TYPE_START_LOG_FILE, name.as_bytes().to_vec()),
        DiagFrame::EndLogFile { name } => (FRAME_TYPE_END_LOG_FILE, name.as_bytes().to_vec()),
    };
    let mut out = Vec::with_capacity(4 + body.len());
    out.extend_from_slice(&frame_type.to_le_bytes());
    out.extend_from_slice(&(body.len() as u16).to_le_bytes());
    out.extend_from_slice(&body);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frame_round_trip() {
        let frames = [
            DiagFrame::Log {
                timestamp: 1615436847.25,
                payload: vec![0x10, 0x00, 0xAA, 0xBB],
            },
            DiagFrame::StartLogFile {
                name: "/sdcard/diag_logs/diag_log_20210311.qmdl".to_string(),
            },
            DiagFrame::EndLogFile {
                name: "/sdcard/diag_logs/diag_log_20210311.qmdl".to_string(),
            },
        ];

        let mut decoder = FrameDecoder::new();
        for frame in &frames {
            decoder.push(&encode_frame(frame));
        }
        for frame in &frames {
            assert_eq!(decoder.next_frame().unwrap().as_ref(), Some(frame));
        }
        assert_eq!(decoder.next_frame().unwrap(), None);
        assert!(decoder.finish().is_ok());
    }

    #[test]
    fn test_incremental_feed_retries_until_complete() {
        let encoded = encode_frame(&DiagFrame::Log {
            timestamp: 42.0,
            payload: vec![1, 2, 3, 4, 5, 6],
        });

        let mut decoder = FrameDecoder::new();
        decoder.push(&encoded[..3]);
        assert_eq!(decoder.next_frame().unwrap(), None);
        decoder.push(&encoded[3..10]);
        // Header complete, body still short: keep waiting
        assert_eq!(decoder.next_frame().unwrap(), None);
        decoder.push(&encoded[10..]);
        let frame = decoder.next_frame().unwrap().unwrap();
        assert_eq!(
            frame,
            DiagFrame::Log {
                timestamp: 42.0,
                payload: vec![1, 2, 3, 4, 5, 6],
            }
        );
    }

    #[test]
    fn test_unknown_frame_type_is_dropped_not_fatal() {
        let mut bad = vec![0x07, 0x00, 0x02, 0x00, 0xAA, 0xBB];
        bad.extend_from_slice(&encode_frame(&DiagFrame::StartLogFile {
            name: "next".to_string(),
        }));

        let mut decoder = FrameDecoder::new();
        decoder.push(&bad);
        assert!(matches!(
            decoder.next_frame(),
            Err(DecodeError::MalformedEnvelope(_))
        ));
        // The bad frame was consumed; the following one decodes normally
        assert_eq!(
            decoder.next_frame().unwrap(),
            Some(DiagFrame::StartLogFile {
                name: "next".to_string()
            })
        );
    }

    #[test]
    fn test_log_frame_shorter_than_timestamp_is_dropped() {
        let mut decoder = FrameDecoder::new();
        decoder.push(&[0x01, 0x00, 0x04, 0x00, 1, 2, 3, 4]);
        assert!(matches!(
            decoder.next_frame(),
            Err(DecodeError::MalformedEnvelope(_))
        ));
        assert_eq!(decoder.buffered(), 0);
    }

    #[test]
    fn test_finish_flags_partial_frame() {
        let encoded = encode_frame(&DiagFrame::Log {
            timestamp: 7.0,
            payload: vec![9; 20],
        });
        let mut decoder = FrameDecoder::new();
        decoder.push(&encoded[..encoded.len() - 5]);
        assert_eq!(decoder.next_frame().unwrap(), None);
        assert_eq!(
            decoder.finish(),
            Err(DecodeError::StreamTruncated {
                needed: encoded.len(),
                available: encoded.len() - 5,
            })
        );
    }

    #[test]
    fn test_name_frames_trim_nul_padding() {
        let mut decoder = FrameDecoder::new();
        decoder.push(&[0x02, 0x00, 0x06, 0x00]);
        decoder.push(b"log\0\0\0");
        assert_eq!(
            decoder.next_frame().unwrap(),
            Some(DiagFrame::StartLogFile {
                name: "log".to_string()
            })
        );
    }
}

//! LTE NAS message decoder (logs 0xB0E0-0xB0E3, 0xB0EA-0xB0ED)
//!
//! Eight log codes share one layout: a 4-byte header (log version plus
//! the 24.301 release triplet) followed by the NAS PDU. The log code
//! itself tells us everything else: odd codes are uplink, the lower
//! pair of each group carries the security-protected form.

use super::bytes::ByteReader;
use super::error::DecodeError;
use super::types::{OtaMessage, RadioTechnology};
use crate::gsmtap::header::{GSMTAP_LTE_NAS_PLAIN, GSMTAP_LTE_NAS_SEC_HEADER};

const HEADER_LEN: usize = 4;

pub fn decode(log_type: u16, payload: &[u8]) -> Result<OtaMessage, DecodeError> {
    let mut reader = ByteReader::new(payload);
    reader
        .skip(HEADER_LEN)
        .ok_or(DecodeError::TruncatedMessage {
            technology: RadioTechnology::LteNas,
            len: payload.len(),
        })?;
    let gsmtap_subtype = match log_type & 0x000F {
        0x0 | 0x1 | 0xA | 0xB => GSMTAP_LTE_NAS_SEC_HEADER,
        _ => GSMTAP_LTE_NAS_PLAIN,
    };
    Ok(OtaMessage {
        technology: RadioTechnology::LteNas,
        gsmtap_subtype,
        uplink: log_type & 1 == 1,
        frequency: 0,
        frame_number: 0,
        subframe: 0,
        sim_id: 0,
        layer3: reader.rest().to_vec(),
    })
}

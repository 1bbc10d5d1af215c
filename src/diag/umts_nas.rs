//! UMTS NAS signaling decoder (logs 0x713A and 0x7B3A)
//!
//! Both variants carry a direction byte and an explicit 32-bit message
//! length; the DSDS variant prepends the SIM slot. Anything after the
//! declared length is modem padding and is ignored.

use super::bytes::ByteReader;
use super::error::DecodeError;
use super::types::{OtaMessage, RadioTechnology, LOG_UMTS_NAS_OTA_DSDS};

pub fn decode(log_type: u16, payload: &[u8]) -> Result<OtaMessage, DecodeError> {
    let short = || DecodeError::TruncatedMessage {
        technology: RadioTechnology::UmtsNas,
        len: payload.len(),
    };
    let mut reader = ByteReader::new(payload);

    let sim_id = if log_type == LOG_UMTS_NAS_OTA_DSDS {
        reader.u8().ok_or_else(short)?
    } else {
        0
    };
    let direction = reader.u8().ok_or_else(short)?;
    let length = reader.u32_le().ok_or_else(short)? as usize;
    let message = reader.take(length).ok_or_else(short)?;

    Ok(OtaMessage {
        technology: RadioTechnology::UmtsNas,
        gsmtap_subtype: 0,
        uplink: direction == 1,
        frequency: 0,
        frame_number: 0,
        subframe: 0,
        sim_id,
        layer3: message.to_vec(),
    })
}

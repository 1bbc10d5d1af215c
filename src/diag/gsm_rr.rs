//! GSM RR signaling decoder (log 0x512F)
//!
//! Three-byte header: channel-and-direction, RR message type, message
//! length. Wireshark expects a LAPDm header (and a dummy L1 header for
//! SACCH) in front of dedicated-channel messages, so one is rebuilt
//! here; broadcast and common channels go out as bare L3.

use super::error::DecodeError;
use super::types::{OtaMessage, RadioTechnology};
use crate::gsmtap::header::{
    GSMTAP_CHANNEL_ACCH, GSMTAP_CHANNEL_BCCH, GSMTAP_CHANNEL_CCCH, GSMTAP_CHANNEL_SDCCH8,
};

pub fn decode(payload: &[u8]) -> Result<OtaMessage, DecodeError> {
    let short = || DecodeError::TruncatedMessage {
        technology: RadioTechnology::GsmRr,
        len: payload.len(),
    };
    if payload.len() < 3 {
        return Err(short());
    }
    let channel_dir = payload[0];
    let message_len = usize::from(payload[2]);
    let message = payload.get(3..3 + message_len).ok_or_else(short)?;

    let channel = channel_dir & 0x7F;
    let (gsmtap_channel, layer3) = match channel {
        0 => (GSMTAP_CHANNEL_SDCCH8, with_lapdm(message, false)),
        1 => (GSMTAP_CHANNEL_BCCH, message.to_vec()),
        3 => (GSMTAP_CHANNEL_CCCH, message.to_vec()),
        4 => (
            GSMTAP_CHANNEL_ACCH | GSMTAP_CHANNEL_SDCCH8,
            with_lapdm(message, true),
        ),
        other => {
            return Err(DecodeError::UnknownChannelMapping {
                technology: RadioTechnology::GsmRr,
                version: 0,
                channel_type: u16::from(other),
            })
        }
    };

    Ok(OtaMessage {
        technology: RadioTechnology::GsmRr,
        gsmtap_subtype: gsmtap_channel,
        uplink: channel_dir & 0x80 == 0,
        frequency: 0,
        frame_number: 0,
        subframe: 0,
        sim_id: 0,
        layer3,
    })
}

/// Unnumbered-information LAPDm frame, length indicator with the EL bit
/// set. SACCH additionally gets a two-byte L1 header (power level and
/// timing advance, both zeroed).
fn with_lapdm(message: &[u8], sacch: bool) -> Vec<u8> {
    let mut framed = Vec::with_capacity(message.len() + if sacch { 5 } else { 3 });
    if sacch {
        framed.extend_from_slice(&[0x00, 0x00]);
    }
    framed.extend_from_slice(&[0x01, 0x03, ((message.len() as u8) << 2) | 0x01]);
    framed.extend_from_slice(message);
    framed
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_bcch_downlink() {
        // System information type 3, 23 L3 bytes
        let payload =
            hex::decode("811b1749061b003e62f2201c4ed0010a156544b80000801f011b").unwrap();
        let msg = decode(&payload).unwrap();
        assert_eq!(msg.technology, RadioTechnology::GsmRr);
        assert_eq!(msg.gsmtap_subtype, GSMTAP_CHANNEL_BCCH);
        assert!(!msg.uplink);
        assert_eq!(
            msg.layer3,
            hex::decode("49061b003e62f2201c4ed0010a156544b80000801f011b").unwrap()
        );
    }

    #[test]
    fn test_sdcch_uplink_gets_lapdm_header() {
        let msg = decode(&hex::decode("003f03052471").unwrap()).unwrap();
        assert_eq!(msg.gsmtap_subtype, GSMTAP_CHANNEL_SDCCH8);
        assert!(msg.uplink);
        assert_eq!(msg.layer3, hex::decode("01030d052471").unwrap());
    }

    #[test]
    fn test_sacch_gets_l1_and_lapdm_headers() {
        let msg = decode(&hex::decode("840602aabb").unwrap()).unwrap();
        assert_eq!(msg.gsmtap_subtype, GSMTAP_CHANNEL_ACCH | GSMTAP_CHANNEL_SDCCH8);
        assert!(!msg.uplink);
        assert_eq!(msg.layer3, hex::decode("0000010309aabb").unwrap());
    }

    #[test]
    fn test_ccch_passes_l3_through() {
        let msg = decode(&hex::decode("832103252106200a").unwrap()).unwrap();
        assert_eq!(msg.gsmtap_subtype, GSMTAP_CHANNEL_CCCH);
        assert_eq!(msg.layer3, hex::decode("252106").unwrap());
    }

    #[test]
    fn test_unknown_channel() {
        assert_eq!(
            decode(&hex::decode("820602aabb").unwrap()),
            Err(DecodeError::UnknownChannelMapping {
                technology: RadioTechnology::GsmRr,
                version: 0,
                channel_type: 2,
            })
        );
    }

    #[test]
    fn test_overrunning_length_is_truncated() {
        assert!(matches!(
            decode(&hex::decode("810630aabb").unwrap()),
            Err(DecodeError::TruncatedMessage { .. })
        ));
        assert!(matches!(
            decode(&[0x81]),
            Err(DecodeError::TruncatedMessage { .. })
        ));
    }
}

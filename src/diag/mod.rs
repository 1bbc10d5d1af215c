//! Qualcomm diag protocol decoding
//!
//! Turns raw capture-stream bytes into normalized OTA signaling
//! messages in three steps:
//! 1. Split the byte stream into capture frames (framing)
//! 2. Parse the 16-byte QCDM log envelope (envelope)
//! 3. Decode the technology-specific log payload, one decoder per
//!    radio technology

mod bytes;
mod crc;
mod envelope;
mod error;
mod framing;
mod gsm_rr;
mod lte_mib;
mod lte_nas;
mod lte_rrc;
mod types;
mod umts_nas;
mod wcdma_rrc;

pub use crc::crc16_ccitt_hdlc;
pub use envelope::{parse_envelope, QcdmMessage, DIAG_LOG_F};
pub use error::DecodeError;
#[cfg(test)]
pub use framing::encode_frame;
pub use framing::{DiagFrame, FrameDecoder};
pub use types::{
    is_lte_nas, OtaMessage, RadioTechnology, LOG_GSM_RR_SIGNALING, LOG_LTE_MIB,
    LOG_LTE_NAS_EMM_PLAIN_INCOMING, LOG_LTE_NAS_EMM_PLAIN_OUTGOING, LOG_LTE_NAS_EMM_SEC_INCOMING,
    LOG_LTE_NAS_EMM_SEC_OUTGOING, LOG_LTE_NAS_ESM_PLAIN_INCOMING, LOG_LTE_NAS_ESM_PLAIN_OUTGOING,
    LOG_LTE_NAS_ESM_SEC_INCOMING, LOG_LTE_NAS_ESM_SEC_OUTGOING, LOG_LTE_RRC_OTA, LOG_UMTS_NAS_OTA,
    LOG_UMTS_NAS_OTA_DSDS, LOG_WCDMA_RRC_SIGNALING,
};

/// Decode one log record payload. `Ok(None)` means the log type is not
/// one we subscribe to; the caller counts it and moves on.
pub fn decode_log(log_type: u16, payload: &[u8]) -> Result<Option<OtaMessage>, DecodeError> {
    match log_type {
        LOG_LTE_RRC_OTA => lte_rrc::decode(payload).map(Some),
        LOG_LTE_MIB => lte_mib::decode(payload).map(Some),
        LOG_WCDMA_RRC_SIGNALING => wcdma_rrc::decode(payload).map(Some),
        LOG_GSM_RR_SIGNALING => gsm_rr::decode(payload).map(Some),
        LOG_UMTS_NAS_OTA | LOG_UMTS_NAS_OTA_DSDS => umts_nas::decode(log_type, payload).map(Some),
        other if is_lte_nas(other) => lte_nas::decode(other, payload).map(Some),
        _ => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const GSM_SI3_PAYLOAD: &str = "811b1749061b003e62f2201c4ed0010a156544b80000801f011b";

    #[test]
    fn test_decode_log_dispatch() {
        let payload = hex::decode(GSM_SI3_PAYLOAD).unwrap();
        let msg = decode_log(LOG_GSM_RR_SIGNALING, &payload).unwrap().unwrap();
        assert_eq!(msg.technology, RadioTechnology::GsmRr);

        let nas = decode_log(LOG_LTE_NAS_EMM_PLAIN_OUTGOING, &[1, 9, 5, 0, 0x07, 0x41])
            .unwrap()
            .unwrap();
        assert_eq!(nas.technology, RadioTechnology::LteNas);
        assert!(nas.uplink);
    }

    #[test]
    fn test_decode_log_ignores_trailing_crc() {
        // Log records end in a CRC that is deliberately never checked;
        // decoders slice by their own length fields
        let payload = hex::decode(GSM_SI3_PAYLOAD).unwrap();
        let mut with_crc = payload.clone();
        with_crc.extend_from_slice(&[0xDE, 0xAD]);
        assert_eq!(
            decode_log(LOG_GSM_RR_SIGNALING, &payload).unwrap(),
            decode_log(LOG_GSM_RR_SIGNALING, &with_crc).unwrap()
        );
    }

    #[test]
    fn test_unsubscribed_log_type_is_none() {
        assert_eq!(decode_log(0x11EB, &[1, 2, 3]).unwrap(), None);
    }
}

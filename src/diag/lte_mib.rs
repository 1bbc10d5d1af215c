//! LTE MIB decoder (log 0xB0C1)
//!
//! This log reports the decoded MIB fields rather than the broadcast
//! bits, so the 3-byte BCCH-BCH message is rebuilt here before it goes
//! out as GSMTAP.

use super::bytes::ByteReader;
use super::error::DecodeError;
use super::types::{OtaMessage, RadioTechnology};
use crate::gsmtap::header::GSMTAP_LTE_RRC_SUB_BCCH_BCH;

/// Downlink bandwidth in PRBs to the MIB's dl-Bandwidth enumerator.
const BANDWIDTH_INDEX: &[(u8, u8)] = &[(6, 0), (15, 1), (25, 2), (50, 3), (75, 4), (100, 5)];

pub fn decode(payload: &[u8]) -> Result<OtaMessage, DecodeError> {
    let short = || DecodeError::TruncatedMessage {
        technology: RadioTechnology::LteMib,
        len: payload.len(),
    };
    let mut reader = ByteReader::new(payload);

    let version = reader.u8().ok_or_else(short)?;
    let pci = match version {
        1 | 2 => reader.u16_le().ok_or_else(short)?,
        _ => {
            return Err(DecodeError::UnknownChannelMapping {
                technology: RadioTechnology::LteMib,
                version,
                channel_type: 0,
            })
        }
    };
    let earfcn = if version == 1 {
        u32::from(reader.u16_le().ok_or_else(short)?)
    } else {
        reader.u32_le().ok_or_else(short)?
    };
    let sfn = reader.u16_le().ok_or_else(short)?;
    let _tx_antennas = reader.u8().ok_or_else(short)?;
    let bandwidth = reader.u8().ok_or_else(short)?;

    let bandwidth_index = BANDWIDTH_INDEX
        .iter()
        .find(|(prbs, _)| *prbs == bandwidth)
        .map(|(_, index)| *index)
        .ok_or(DecodeError::UnknownChannelMapping {
            technology: RadioTechnology::LteMib,
            version,
            channel_type: u16::from(bandwidth),
        })?;

    // Rebuild the over-the-air MasterInformationBlock: dl-Bandwidth in
    // the top three bits, the eight systemFrameNumber bits next, spare
    // bits zero.
    let sfn_bits = ((sfn >> 2) & 0xFF) as u8;
    let mib = vec![
        (bandwidth_index << 5) | (sfn_bits >> 6),
        (sfn_bits & 0x3F) << 2,
        0,
    ];

    Ok(OtaMessage {
        technology: RadioTechnology::LteMib,
        gsmtap_subtype: GSMTAP_LTE_RRC_SUB_BCCH_BCH,
        uplink: false,
        frequency: earfcn,
        frame_number: (u32::from(sfn) << 16) | u32::from(pci),
        subframe: 0,
        sim_id: 0,
        layer3: mib,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rebuild_mib_v1() {
        // PCI 160, EARFCN 818, SFN 300, 2 TX antennas, 50 PRBs
        let msg = decode(&hex::decode("01a00032032c010232").unwrap()).unwrap();
        assert_eq!(msg.technology, RadioTechnology::LteMib);
        assert_eq!(msg.gsmtap_subtype, GSMTAP_LTE_RRC_SUB_BCCH_BCH);
        assert!(!msg.uplink);
        assert_eq!(msg.frequency, 818);
        assert_eq!(msg.frame_number, (300 << 16) | 160);
        assert_eq!(msg.layer3, vec![0x61, 0x2C, 0x00]);
    }

    #[test]
    fn test_rebuild_mib_v2() {
        let msg = decode(&hex::decode("02a000320300002c010232").unwrap()).unwrap();
        assert_eq!(msg.frequency, 818);
        assert_eq!(msg.layer3, vec![0x61, 0x2C, 0x00]);
    }

    #[test]
    fn test_unknown_version() {
        assert_eq!(
            decode(&hex::decode("03a00032032c010232").unwrap()),
            Err(DecodeError::UnknownChannelMapping {
                technology: RadioTechnology::LteMib,
                version: 3,
                channel_type: 0,
            })
        );
    }

    #[test]
    fn test_unknown_bandwidth() {
        assert_eq!(
            decode(&hex::decode("01a00032032c010225").unwrap()),
            Err(DecodeError::UnknownChannelMapping {
                technology: RadioTechnology::LteMib,
                version: 1,
                channel_type: 0x25,
            })
        );
    }

    #[test]
    fn test_short_payload_is_truncated() {
        assert!(matches!(
            decode(&hex::decode("01a00032032c").unwrap()),
            Err(DecodeError::TruncatedMessage { .. })
        ));
    }
}

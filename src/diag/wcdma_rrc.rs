//! WCDMA RRC signaling decoder (log 0x412F)
//!
//! Four header layouts share this log type. The channel byte picks one:
//! 0x09 and 0x89 are system-information extensions carrying a
//! second-level SIB class byte, and the 0x80 bit selects the newer
//! layout with explicit UARFCN and scrambling code.

use super::bytes::ByteReader;
use super::error::DecodeError;
use super::types::{OtaMessage, RadioTechnology};
use crate::gsmtap::header::*;

/// Channel number to GSMTAP RRC subtype, shared by the plain and the
/// UARFCN-bearing layouts.
const CHANNEL_SUBTYPES: &[(u8, u8)] = &[
    (0, GSMTAP_RRC_SUB_UL_CCCH),
    (1, GSMTAP_RRC_SUB_UL_DCCH),
    (2, GSMTAP_RRC_SUB_DL_CCCH),
    (3, GSMTAP_RRC_SUB_DL_DCCH),
    (4, GSMTAP_RRC_SUB_BCCH_BCH),
    (5, GSMTAP_RRC_SUB_BCCH_FACH),
    (6, GSMTAP_RRC_SUB_PCCH),
    (7, GSMTAP_RRC_SUB_MCCH),
    (8, GSMTAP_RRC_SUB_MSCH),
];

/// SIB class to subtype, indexed by the raw class byte.
const SIB_SUBTYPES: &[u8] = &[
    GSMTAP_RRC_SUB_MIB,
    GSMTAP_RRC_SUB_SIB1,
    GSMTAP_RRC_SUB_SIB2,
    GSMTAP_RRC_SUB_SIB3,
    GSMTAP_RRC_SUB_SIB4,
    GSMTAP_RRC_SUB_SIB5,
    GSMTAP_RRC_SUB_SIB6,
    GSMTAP_RRC_SUB_SIB7,
    GSMTAP_RRC_SUB_SIB8,
    GSMTAP_RRC_SUB_SIB9,
    GSMTAP_RRC_SUB_SIB10,
    GSMTAP_RRC_SUB_SIB11,
    GSMTAP_RRC_SUB_SIB12,
    GSMTAP_RRC_SUB_SIB13,
    GSMTAP_RRC_SUB_SIB13_1,
    GSMTAP_RRC_SUB_SIB13_2,
    GSMTAP_RRC_SUB_SIB13_3,
    GSMTAP_RRC_SUB_SIB13_4,
    GSMTAP_RRC_SUB_SIB14,
    GSMTAP_RRC_SUB_SIB15,
    GSMTAP_RRC_SUB_SIB15_1,
    GSMTAP_RRC_SUB_SIB15_2,
    GSMTAP_RRC_SUB_SIB15_3,
    GSMTAP_RRC_SUB_SIB16,
    GSMTAP_RRC_SUB_SIB17,
    GSMTAP_RRC_SUB_SIB15_4,
    GSMTAP_RRC_SUB_SIB18,
    GSMTAP_RRC_SUB_SB1,
    GSMTAP_RRC_SUB_SB2,
    GSMTAP_RRC_SUB_SIB15_5,
    GSMTAP_RRC_SUB_SIB5BIS,
    GSMTAP_RRC_SUB_SIB11BIS,
];

fn channel_subtype(channel: u8) -> Option<u8> {
    CHANNEL_SUBTYPES
        .iter()
        .find(|(raw, _)| *raw == channel)
        .map(|(_, subtype)| *subtype)
}

fn sib_subtype(sib_class: u8) -> Option<u8> {
    SIB_SUBTYPES.get(usize::from(sib_class)).copied()
}

pub fn decode(payload: &[u8]) -> Result<OtaMessage, DecodeError> {
    let short = || DecodeError::TruncatedMessage {
        technology: RadioTechnology::UmtsRrc,
        len: payload.len(),
    };
    let unmapped = |raw: u16| DecodeError::UnknownChannelMapping {
        technology: RadioTechnology::UmtsRrc,
        version: 0,
        channel_type: raw,
    };
    let mut reader = ByteReader::new(payload);
    let channel = reader.u8().ok_or_else(short)?;

    let (uarfcn, psc, gsmtap_subtype, message) = match channel {
        0x09 => {
            let _rb_id = reader.u8().ok_or_else(short)?;
            let length = reader.u16_le().ok_or_else(short)? as usize;
            let sib_class = reader.u8().ok_or_else(short)?;
            let subtype = sib_subtype(sib_class).ok_or_else(|| unmapped(u16::from(sib_class)))?;
            (0, 0, subtype, reader.take(length).ok_or_else(short)?)
        }
        0x89 => {
            let uarfcn = reader.u16_le().ok_or_else(short)?;
            let psc = reader.u16_le().ok_or_else(short)?;
            let _rb_id = reader.u8().ok_or_else(short)?;
            let length = reader.u16_le().ok_or_else(short)? as usize;
            let sib_class = reader.u8().ok_or_else(short)?;
            let subtype = sib_subtype(sib_class).ok_or_else(|| unmapped(u16::from(sib_class)))?;
            (
                u32::from(uarfcn),
                u32::from(psc),
                subtype,
                reader.take(length).ok_or_else(short)?,
            )
        }
        new if new & 0x80 != 0 => {
            let uarfcn = reader.u16_le().ok_or_else(short)?;
            let psc = reader.u16_le().ok_or_else(short)?;
            let _rb_id = reader.u8().ok_or_else(short)?;
            let length = reader.u16_le().ok_or_else(short)? as usize;
            let subtype =
                channel_subtype(new & 0x7F).ok_or_else(|| unmapped(u16::from(channel)))?;
            (
                u32::from(uarfcn),
                u32::from(psc),
                subtype,
                reader.take(length).ok_or_else(short)?,
            )
        }
        legacy => {
            let _rb_id = reader.u8().ok_or_else(short)?;
            let length = reader.u16_le().ok_or_else(short)? as usize;
            let subtype = channel_subtype(legacy).ok_or_else(|| unmapped(u16::from(channel)))?;
            (0, 0, subtype, reader.take(length).ok_or_else(short)?)
        }
    };

    Ok(OtaMessage {
        technology: RadioTechnology::UmtsRrc,
        gsmtap_subtype,
        uplink: matches!(
            gsmtap_subtype,
            GSMTAP_RRC_SUB_UL_DCCH | GSMTAP_RRC_SUB_UL_CCCH | GSMTAP_RRC_SUB_UL_SHCCH
        ),
        frequency: uarfcn,
        frame_number: psc,
        subframe: 0,
        sim_id: 0,
        layer3: message.to_vec(),
    })
}

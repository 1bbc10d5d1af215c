//! GSMTAP v2 header construction
//!
//! Type and subtype values follow osmocom's gsmtap.h; Wireshark
//! dissects by these exact numbers, so they are not ours to renumber.

pub const GSMTAP_VERSION: u8 = 2;
/// Header length in 32-bit words.
const GSMTAP_HDR_WORDS: u8 = 4;

pub const GSMTAP_TYPE_UM: u8 = 0x01;
pub const GSMTAP_TYPE_ABIS: u8 = 0x02;
pub const GSMTAP_TYPE_UMTS_RRC: u8 = 0x0C;
pub const GSMTAP_TYPE_LTE_RRC: u8 = 0x0D;
pub const GSMTAP_TYPE_LTE_NAS: u8 = 0x12;

const GSMTAP_ARFCN_MASK: u16 = 0x3FFF;
const GSMTAP_ARFCN_F_UPLINK: u16 = 0x4000;

// GSM Um channel types
pub const GSMTAP_CHANNEL_BCCH: u8 = 0x01;
pub const GSMTAP_CHANNEL_CCCH: u8 = 0x02;
pub const GSMTAP_CHANNEL_SDCCH8: u8 = 0x08;
pub const GSMTAP_CHANNEL_ACCH: u8 = 0x80;

// LTE RRC channel subtypes
pub const GSMTAP_LTE_RRC_SUB_DL_CCCH: u8 = 0;
pub const GSMTAP_LTE_RRC_SUB_DL_DCCH: u8 = 1;
pub const GSMTAP_LTE_RRC_SUB_UL_CCCH: u8 = 2;
pub const GSMTAP_LTE_RRC_SUB_UL_DCCH: u8 = 3;
pub const GSMTAP_LTE_RRC_SUB_BCCH_BCH: u8 = 4;
pub const GSMTAP_LTE_RRC_SUB_BCCH_DL_SCH: u8 = 5;
pub const GSMTAP_LTE_RRC_SUB_PCCH: u8 = 6;
pub const GSMTAP_LTE_RRC_SUB_MCCH: u8 = 7;
pub const GSMTAP_LTE_RRC_SUB_DL_CCCH_NB: u8 = 14;
pub const GSMTAP_LTE_RRC_SUB_DL_DCCH_NB: u8 = 15;
pub const GSMTAP_LTE_RRC_SUB_UL_CCCH_NB: u8 = 16;
pub const GSMTAP_LTE_RRC_SUB_UL_DCCH_NB: u8 = 17;
pub const GSMTAP_LTE_RRC_SUB_BCCH_BCH_NB: u8 = 18;
pub const GSMTAP_LTE_RRC_SUB_BCCH_DL_SCH_NB: u8 = 20;
pub const GSMTAP_LTE_RRC_SUB_PCCH_NB: u8 = 21;

// LTE NAS subtypes
pub const GSMTAP_LTE_NAS_PLAIN: u8 = 0;
pub const GSMTAP_LTE_NAS_SEC_HEADER: u8 = 1;

// UMTS RRC channel subtypes
pub const GSMTAP_RRC_SUB_DL_DCCH: u8 = 0;
pub const GSMTAP_RRC_SUB_UL_DCCH: u8 = 1;
pub const GSMTAP_RRC_SUB_DL_CCCH: u8 = 2;
pub const GSMTAP_RRC_SUB_UL_CCCH: u8 = 3;
pub const GSMTAP_RRC_SUB_PCCH: u8 = 4;
pub const GSMTAP_RRC_SUB_UL_SHCCH: u8 = 6;
pub const GSMTAP_RRC_SUB_BCCH_FACH: u8 = 7;
pub const GSMTAP_RRC_SUB_BCCH_BCH: u8 = 8;
pub const GSMTAP_RRC_SUB_MCCH: u8 = 9;
pub const GSMTAP_RRC_SUB_MSCH: u8 = 10;

// UMTS RRC system-information subtypes
pub const GSMTAP_RRC_SUB_MIB: u8 = 16;
pub const GSMTAP_RRC_SUB_SIB1: u8 = 17;
pub const GSMTAP_RRC_SUB_SIB2: u8 = 18;
pub const GSMTAP_RRC_SUB_SIB3: u8 = 19;
pub const GSMTAP_RRC_SUB_SIB4: u8 = 20;
pub const GSMTAP_RRC_SUB_SIB5: u8 = 21;
pub const GSMTAP_RRC_SUB_SIB5BIS: u8 = 22;
pub const GSMTAP_RRC_SUB_SIB6: u8 = 23;
pub const GSMTAP_RRC_SUB_SIB7: u8 = 24;
pub const GSMTAP_RRC_SUB_SIB8: u8 = 25;
pub const GSMTAP_RRC_SUB_SIB9: u8 = 26;
pub const GSMTAP_RRC_SUB_SIB10: u8 = 27;
pub const GSMTAP_RRC_SUB_SIB11: u8 = 28;
pub const GSMTAP_RRC_SUB_SIB11BIS: u8 = 29;
pub const GSMTAP_RRC_SUB_SIB12: u8 = 30;
pub const GSMTAP_RRC_SUB_SIB13: u8 = 31;
pub const GSMTAP_RRC_SUB_SIB13_1: u8 = 32;
pub const GSMTAP_RRC_SUB_SIB13_2: u8 = 33;
pub const GSMTAP_RRC_SUB_SIB13_3: u8 = 34;
pub const GSMTAP_RRC_SUB_SIB13_4: u8 = 35;
pub const GSMTAP_RRC_SUB_SIB14: u8 = 36;
pub const GSMTAP_RRC_SUB_SIB15: u8 = 37;
pub const GSMTAP_RRC_SUB_SIB15_1: u8 = 39;
pub const GSMTAP_RRC_SUB_SIB15_2: u8 = 40;
pub const GSMTAP_RRC_SUB_SIB15_3: u8 = 41;
pub const GSMTAP_RRC_SUB_SIB16: u8 = 42;
pub const GSMTAP_RRC_SUB_SIB17: u8 = 43;
pub const GSMTAP_RRC_SUB_SB1: u8 = 44;
pub const GSMTAP_RRC_SUB_SB2: u8 = 45;
pub const GSMTAP_RRC_SUB_SIB15_4: u8 = 46;
pub const GSMTAP_RRC_SUB_SIB18: u8 = 47;
pub const GSMTAP_RRC_SUB_SIB15_5: u8 = 48;

/// Well-known GSMTAP UDP port.
pub const GSMTAP_UDP_PORT: u16 = 4729;

/// Build the fixed 16-byte GSMTAP header. Multi-byte fields are
/// big-endian. ARFCNs wider than the 14-bit field are zeroed, the
/// uplink flag is applied afterwards; signal, SNR and antenna fields
/// stay zero because the diag logs do not carry them.
pub fn build_gsmtap_header(
    packet_type: u8,
    sub_type: u8,
    arfcn: u32,
    uplink: bool,
    frame_number: u32,
    sub_slot: u8,
) -> [u8; 16] {
    let mut arfcn_field = if arfcn > u32::from(GSMTAP_ARFCN_MASK) {
        0
    } else {
        arfcn as u16
    };
    if uplink {
        arfcn_field |= GSMTAP_ARFCN_F_UPLINK;
    }

    let mut header = [0u8; 16];
    header[0] = GSMTAP_VERSION;
    header[1] = GSMTAP_HDR_WORDS;
    header[2] = packet_type;
    header[3] = 0; // timeslot
    header[4..6].copy_from_slice(&arfcn_field.to_be_bytes());
    header[6] = 0; // signal dBm
    header[7] = 0; // SNR dB
    header[8..12].copy_from_slice(&frame_number.to_be_bytes());
    header[12] = sub_type;
    header[13] = 0; // antenna number
    header[14] = sub_slot;
    header[15] = 0; // reserved
    header
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lte_rrc_paging_header() {
        let header = build_gsmtap_header(
            GSMTAP_TYPE_LTE_RRC,
            GSMTAP_LTE_RRC_SUB_PCCH,
            875,
            false,
            32309397,
            9,
        );
        assert_eq!(
            header.to_vec(),
            hex::decode("02040d00036b000001ed009506000900").unwrap()
        );
    }

    #[test]
    fn test_uplink_flag_in_arfcn_field() {
        let header = build_gsmtap_header(GSMTAP_TYPE_LTE_RRC, 3, 875, true, 0, 0);
        assert_eq!(&header[4..6], &[0x43, 0x6B]);
    }

    #[test]
    fn test_wide_arfcn_is_zeroed() {
        let downlink = build_gsmtap_header(GSMTAP_TYPE_LTE_RRC, 0, 20000, false, 0, 0);
        assert_eq!(&downlink[4..6], &[0x00, 0x00]);
        // The uplink flag survives the clamp
        let uplink = build_gsmtap_header(GSMTAP_TYPE_LTE_RRC, 0, 20000, true, 0, 0);
        assert_eq!(&uplink[4..6], &[0x40, 0x00]);
    }
}

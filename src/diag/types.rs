//! Shared decoder types and the log codes we subscribe to.

use std::fmt;

/// Radio access technology a decoded message belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RadioTechnology {
    LteRrc,
    LteNas,
    LteMib,
    UmtsRrc,
    UmtsNas,
    GsmRr,
}

impl fmt::Display for RadioTechnology {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RadioTechnology::LteRrc => "LTE RRC",
            RadioTechnology::LteNas => "LTE NAS",
            RadioTechnology::LteMib => "LTE MIB",
            RadioTechnology::UmtsRrc => "WCDMA RRC",
            RadioTechnology::UmtsNas => "UMTS NAS",
            RadioTechnology::GsmRr => "GSM RR",
        };
        f.write_str(name)
    }
}

/// One over-the-air signaling message, normalized for GSMTAP encapsulation.
#[derive(Debug, Clone, PartialEq)]
pub struct OtaMessage {
    pub technology: RadioTechnology,
    pub gsmtap_subtype: u8,
    pub uplink: bool,
    /// Channel number (ARFCN / UARFCN / EARFCN), zero when the log carries none.
    pub frequency: u32,
    /// Frame number, or the technology's closest stand-in.
    pub frame_number: u32,
    pub subframe: u8,
    /// SIM slot the message belongs to, as the modem numbers it. Zero
    /// unless the log format carries one (DSDS).
    pub sim_id: u8,
    pub layer3: Vec<u8>,
}

pub const LOG_WCDMA_RRC_SIGNALING: u16 = 0x412F;
pub const LOG_GSM_RR_SIGNALING: u16 = 0x512F;
pub const LOG_UMTS_NAS_OTA: u16 = 0x713A;
pub const LOG_UMTS_NAS_OTA_DSDS: u16 = 0x7B3A;
pub const LOG_LTE_RRC_OTA: u16 = 0xB0C0;
pub const LOG_LTE_MIB: u16 = 0xB0C1;
pub const LOG_LTE_NAS_ESM_SEC_INCOMING: u16 = 0xB0E0;
pub const LOG_LTE_NAS_ESM_SEC_OUTGOING: u16 = 0xB0E1;
pub const LOG_LTE_NAS_ESM_PLAIN_INCOMING: u16 = 0xB0E2;
pub const LOG_LTE_NAS_ESM_PLAIN_OUTGOING: u16 = 0xB0E3;
pub const LOG_LTE_NAS_EMM_SEC_INCOMING: u16 = 0xB0EA;
pub const LOG_LTE_NAS_EMM_SEC_OUTGOING: u16 = 0xB0EB;
pub const LOG_LTE_NAS_EMM_PLAIN_INCOMING: u16 = 0xB0EC;
pub const LOG_LTE_NAS_EMM_PLAIN_OUTGOING: u16 = 0xB0ED;

pub fn is_lte_nas(log_type: u16) -> bool {
    matches!(
        log_type,
        LOG_LTE_NAS_ESM_SEC_INCOMING
            | LOG_LTE_NAS_ESM_SEC_OUTGOING
            | LOG_LTE_NAS_ESM_PLAIN_INCOMING
            | LOG_LTE_NAS_ESM_PLAIN_OUTGOING
            | LOG_LTE_NAS_EMM_SEC_INCOMING
            | LOG_LTE_NAS_EMM_SEC_OUTGOING
            | LOG_LTE_NAS_EMM_PLAIN_INCOMING
            | LOG_LTE_NAS_EMM_PLAIN_OUTGOING
    )
}

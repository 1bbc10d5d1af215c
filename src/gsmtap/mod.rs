//! GSMTAP/PCAP wire encoding
//!
//! A decoded OTA message leaves the pipeline as one pcap record with a
//! fixed nesting: record header, optional PPI geotag, IPv4, UDP,
//! GSMTAP, payload. Each header's length field counts only what
//! follows it, so the record can be built inside-out.

pub mod header;
mod ip;
mod pcap;
mod ppi;

pub use pcap::build_global_header;
pub use ppi::GpsFix;

use crate::diag::{OtaMessage, RadioTechnology};
use header::build_gsmtap_header;
use ip::{build_ipv4_header, build_udp_header};
use pcap::build_record_header;
use ppi::build_ppi_header;

/// Decoded-record attributes carried alongside the wire bytes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RecordMeta {
    pub timestamp: f64,
    pub gsmtap_type: u8,
    pub gsmtap_subtype: u8,
    pub uplink: bool,
}

/// One complete pcap record, ready for any subscriber.
#[derive(Debug, Clone, PartialEq)]
pub struct WireRecord {
    pub bytes: Vec<u8>,
    pub meta: RecordMeta,
}

pub fn gsmtap_type_for(technology: RadioTechnology) -> u8 {
    match technology {
        RadioTechnology::LteRrc | RadioTechnology::LteMib => header::GSMTAP_TYPE_LTE_RRC,
        RadioTechnology::LteNas => header::GSMTAP_TYPE_LTE_NAS,
        RadioTechnology::UmtsRrc => header::GSMTAP_TYPE_UMTS_RRC,
        RadioTechnology::UmtsNas => header::GSMTAP_TYPE_ABIS,
        RadioTechnology::GsmRr => header::GSMTAP_TYPE_UM,
    }
}

pub fn encode_record(message: &OtaMessage, timestamp: f64, fix: Option<&GpsFix>) -> WireRecord {
    let gsmtap_type = gsmtap_type_for(message.technology);
    let gsmtap = build_gsmtap_header(
        gsmtap_type,
        message.gsmtap_subtype,
        message.frequency,
        message.uplink,
        message.frame_number,
        message.subframe,
    );
    let udp_payload = gsmtap.len() + message.layer3.len();
    let udp = build_udp_header(udp_payload);
    let ipv4 = build_ipv4_header(udp.len() + udp_payload, message.sim_id);
    let ppi = fix.map(build_ppi_header).unwrap_or_default();

    let data_len = ppi.len() + ipv4.len() + udp.len() + udp_payload;
    let mut bytes = Vec::with_capacity(16 + data_len);
    bytes.extend_from_slice(&build_record_header(timestamp, data_len));
    bytes.extend_from_slice(&ppi);
    bytes.extend_from_slice(&ipv4);
    bytes.extend_from_slice(&udp);
    bytes.extend_from_slice(&gsmtap);
    bytes.extend_from_slice(&message.layer3);

    WireRecord {
        bytes,
        meta: RecordMeta {
            timestamp,
            gsmtap_type,
            gsmtap_subtype: message.gsmtap_subtype,
            uplink: message.uplink,
        },
    }
}

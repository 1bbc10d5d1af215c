//! Minimal IPv4/UDP encapsulation for GSMTAP records
//!
//! Loopback pseudo-headers only: no checksums, no fragmentation, no
//! options. The destination address's low byte carries the SIM slot so
//! dual-SIM captures stay separable in the analyzer.

use super::header::GSMTAP_UDP_PORT;

pub fn build_ipv4_header(payload_len: usize, dst_low: u8) -> [u8; 20] {
    let mut header = [0u8; 20];
    header[0] = 0x45; // version 4, 5-word header
    header[1] = 0x00; // DSCP/ECN
    header[2..4].copy_from_slice(&((20 + payload_len) as u16).to_be_bytes());
    // identification, flags and fragment offset stay zero
    header[8] = 64; // TTL
    header[9] = 17; // UDP
    // checksum unused
    header[12..16].copy_from_slice(&[127, 0, 0, 1]);
    header[16..20].copy_from_slice(&[127, 0, 0, dst_low]);
    header
}

pub fn build_udp_header(payload_len: usize) -> [u8; 8] {
    let mut header = [0u8; 8];
    header[0..2].copy_from_slice(&GSMTAP_UDP_PORT.to_be_bytes());
    header[2..4].copy_from_slice(&GSMTAP_UDP_PORT.to_be_bytes());
    header[4..6].copy_from_slice(&((8 + payload_len) as u16).to_be_bytes());
    // checksum unused
    header
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ipv4_header() {
        assert_eq!(
            build_ipv4_header(47, 1).to_vec(),
            hex::decode("4500004300000000401100007f0000017f000001").unwrap()
        );
    }

    #[test]
    fn test_ipv4_destination_carries_sim_slot() {
        let header = build_ipv4_header(47, 2);
        assert_eq!(&header[16..20], &[127, 0, 0, 2]);
    }

    #[test]
    fn test_udp_header() {
        assert_eq!(
            build_udp_header(39).to_vec(),
            hex::decode("12791279002f0000").unwrap()
        );
    }
}

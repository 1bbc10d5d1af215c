//! Legacy pcap file format (little-endian, version 2.4)

/// Raw IPv4 link type; the records have no ethernet framing.
pub const LINKTYPE_IPV4: u32 = 228;

const PCAP_MAGIC: u32 = 0xA1B2_C3D4;
const PCAP_VERSION_MAJOR: u16 = 2;
const PCAP_VERSION_MINOR: u16 = 4;
const PCAP_SNAPLEN: u32 = 0xFFFF;

pub fn build_global_header() -> [u8; 24] {
    let mut header = [0u8; 24];
    header[0..4].copy_from_slice(&PCAP_MAGIC.to_le_bytes());
    header[4..6].copy_from_slice(&PCAP_VERSION_MAJOR.to_le_bytes());
    header[6..8].copy_from_slice(&PCAP_VERSION_MINOR.to_le_bytes());
    // thiszone and sigfigs stay zero
    header[16..20].copy_from_slice(&PCAP_SNAPLEN.to_le_bytes());
    header[20..24].copy_from_slice(&LINKTYPE_IPV4.to_le_bytes());
    header
}

/// Per-record header from a POSIX timestamp. Nothing is ever snapped,
/// so captured and original lengths are equal.
pub fn build_record_header(timestamp: f64, data_len: usize) -> [u8; 16] {
    let mut seconds = timestamp as u32;
    let mut micros = ((timestamp - f64::from(seconds)) * 1_000_000.0).round() as u32;
    if micros >= 1_000_000 {
        seconds += 1;
        micros = 0;
    }
    let mut header = [0u8; 16];
    header[0..4].copy_from_slice(&seconds.to_le_bytes());
    header[4..8].copy_from_slice(&micros.to_le_bytes());
    header[8..12].copy_from_slice(&(data_len as u32).to_le_bytes());
    header[12..16].copy_from_slice(&(data_len as u32).to_le_bytes());
    header
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_global_header() {
        assert_eq!(
            build_global_header().to_vec(),
            hex::decode("d4c3b2a1020004000000000000000000ffff0000e4000000").unwrap()
        );
    }

    #[test]
    fn test_record_header() {
        assert_eq!(
            build_record_header(1615436847.25, 99).to_vec(),
            hex::decode("2f9c496090d003006300000063000000").unwrap()
        );
    }

    #[test]
    fn test_microseconds_round_up_into_seconds() {
        let header = build_record_header(10.9999999, 1);
        assert_eq!(&header[0..4], &11u32.to_le_bytes());
        assert_eq!(&header[4..8], &0u32.to_le_bytes());
    }
}

//! CRC16 variants used by the diag protocol
//!
//! Commands written to the diag device carry the HDLC frame check sequence
//! (CRC-16/X-25). Captured log messages may carry the same FCS ahead of the
//! 0x7e terminator; the decoders never check it and rely on the per-message
//! length fields instead.

/// CRC-16/X-25: reflected polynomial 0x8408, init 0xFFFF, final complement.
/// This is the HDLC FCS appended to every framed diag command.
pub fn crc16_ccitt_hdlc(data: &[u8]) -> u16 {
    let mut crc: u16 = 0xFFFF;
    for &byte in data {
        crc ^= u16::from(byte);
        for _ in 0..8 {
            if crc & 1 != 0 {
                crc = (crc >> 1) ^ 0x8408;
            } else {
                crc >>= 1;
            }
        }
    }
    !crc
}

/// CRC-16/XMODEM: polynomial 0x1021, init 0, no reflection.
#[cfg(test)]
pub fn crc16_xmodem(data: &[u8]) -> u16 {
    let mut crc: u16 = 0;
    for &byte in data {
        crc ^= u16::from(byte) << 8;
        for _ in 0..8 {
            if crc & 0x8000 != 0 {
                crc = (crc << 1) ^ 0x1021;
            } else {
                crc <<= 1;
            }
        }
    }
    crc
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hdlc_check_value() {
        // Standard check input for CRC catalogs
        assert_eq!(crc16_ccitt_hdlc(b"123456789"), 0x906E);
    }

    #[test]
    fn test_xmodem_check_value() {
        assert_eq!(crc16_xmodem(b"123456789"), 0x31C3);
    }

    #[test]
    fn test_hdlc_of_empty_input() {
        assert_eq!(crc16_ccitt_hdlc(&[]), 0x0000);
        assert_eq!(crc16_xmodem(&[]), 0x0000);
    }

    #[test]
    fn test_hdlc_of_diag_command() {
        let cmd = hex::decode("7300000003000000").unwrap();
        let crc = crc16_ccitt_hdlc(&cmd);
        // FCS over payload plus its own CRC always verifies to 0x0f47
        let mut framed = cmd.clone();
        framed.extend_from_slice(&crc.to_le_bytes());
        assert_eq!(crc16_ccitt_hdlc(&framed), 0x0F47);
    }
}

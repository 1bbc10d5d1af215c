//! PPI encapsulation with a GPS geotag
//!
//! When the capture has a position, every record gets a Per-Packet
//! Information wrapper holding one GPS field so the location rides
//! along inside the pcap itself.

use super::pcap::LINKTYPE_IPV4;

/// PPI-GEOLOCATION GPS field type.
const PPI_FIELD_GPS: u16 = 30002;

const PPI_GPS_FLAG_LAT: u32 = 0x2;
const PPI_GPS_FLAG_LON: u32 = 0x4;
const PPI_GPS_FLAG_ALT: u32 = 0x8;

/// Device position applied to emitted records.
#[derive(Debug, Clone)]
pub struct GpsFix {
    pub latitude: f64,
    pub longitude: f64,
    pub altitude: Option<f64>,
}

/// Angles are stored offset by 180 degrees in units of 1e-7 degree.
fn fixed3_7(degrees: f64) -> u32 {
    ((degrees + 180.0) * 1e7).round() as u32
}

/// Altitude is stored offset by 180 km in units of 1e-4 m.
fn fixed6_4(meters: f64) -> u64 {
    ((meters + 180_000.0) * 1e4).round() as u64
}

pub fn build_ppi_header(fix: &GpsFix) -> Vec<u8> {
    let (ppi_len, field_len, mut flags) = match fix.altitude {
        Some(_) => (32u16, 20u16, PPI_GPS_FLAG_ALT),
        None => (24u16, 12u16, 0),
    };
    flags |= PPI_GPS_FLAG_LAT | PPI_GPS_FLAG_LON;

    let mut ppi = Vec::with_capacity(usize::from(ppi_len));
    ppi.push(0); // version
    ppi.push(0); // flags
    ppi.extend_from_slice(&ppi_len.to_le_bytes());
    ppi.extend_from_slice(&LINKTYPE_IPV4.to_le_bytes());
    ppi.extend_from_slice(&PPI_FIELD_GPS.to_le_bytes());
    ppi.extend_from_slice(&field_len.to_le_bytes());
    ppi.extend_from_slice(&flags.to_le_bytes());
    ppi.extend_from_slice(&fixed3_7(fix.latitude).to_le_bytes());
    ppi.extend_from_slice(&fixed3_7(fix.longitude).to_le_bytes());
    if let Some(altitude) = fix.altitude {
        ppi.extend_from_slice(&fixed6_4(altitude).to_le_bytes());
    }
    ppi
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ppi_with_altitude() {
        let fix = GpsFix {
            latitude: 41.4928645,
            longitude: -90.1333759,
            altitude: Some(152.6591),
        };
        assert_eq!(
            build_ppi_header(&fix),
            hex::decode("00002000e4000000327514000e00000005210584018f90353f1d616b00000000")
                .unwrap()
        );
    }

    #[test]
    fn test_ppi_without_altitude() {
        let fix = GpsFix {
            latitude: 41.4928645,
            longitude: -90.1333759,
            altitude: None,
        };
        assert_eq!(
            build_ppi_header(&fix),
            hex::decode("00001800e400000032750c000600000005210584018f9035").unwrap()
        );
    }
}

use serde::{Deserialize, Serialize};

// LoRaWAN ports the lock firmware transmits on
pub const PORT_LOCK_STATE: u8 = 1;
pub const PORT_GPS: u8 = 10;
pub const PORT_WIFI_SCAN: u8 = 11;

// Leading marker bytes per payload family
pub const MARKER_LOCK_STATE: u8 = 0x01;
pub const MARKER_LOCATION: u8 = 0x02;

// Minimum payload sizes (marker byte included)
const LOCK_STATE_LEN: usize = 2;
const GPS_LEN: usize = 11;
// One scanned access point: 6-byte BSSID + 1-byte signal strength
const WIFI_GROUP_LEN: usize = 7;

/// GPS fix reported on port 10.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GpsFix {
    pub latitude: f64,
    pub longitude: f64,
    pub altitude: u32,
    pub hdop: f64,
    pub satellites: u8,
    pub valid: bool,
}

/// One WiFi access point observed by the device scan on port 11.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessPoint {
    /// Lowercase colon-separated hex, e.g. "aa:bb:cc:dd:ee:ff"
    pub bssid: String,
    /// Signal strength in dBm (0 to -255)
    pub rssi: i16,
}

/// Structured result of decoding one uplink payload.
#[derive(Debug, Clone, PartialEq)]
pub enum DecodedPayload {
    LockState { locked: bool },
    GpsFix(GpsFix),
    WifiScan(Vec<AccessPoint>),
    Unrecognized,
}

/// Decode a raw uplink payload by port.
///
/// Total over all inputs: malformed or unknown frames decode to
/// [`DecodedPayload::Unrecognized`], never an error.
pub fn decode(port: u8, payload: &[u8]) -> DecodedPayload {
    match port {
        PORT_LOCK_STATE => decode_lock_state(payload),
        PORT_GPS => decode_gps(payload),
        PORT_WIFI_SCAN => decode_wifi_scan(payload),
        _ => DecodedPayload::Unrecognized,
    }
}

fn decode_lock_state(payload: &[u8]) -> DecodedPayload {
    if payload.len() < LOCK_STATE_LEN || payload[0] != MARKER_LOCK_STATE {
        return DecodedPayload::Unrecognized;
    }
    DecodedPayload::LockState {
        locked: payload[1] == 0x01,
    }
}

fn decode_gps(payload: &[u8]) -> DecodedPayload {
    if payload.len() < GPS_LEN || payload[0] != MARKER_LOCATION {
        return DecodedPayload::Unrecognized;
    }

    // 24-bit coordinates scaled across the full value range
    let latitude = read_u24_be(&payload[1..4]) as f64 / 16777215.0 * 180.0 - 90.0;
    let longitude = read_u24_be(&payload[4..7]) as f64 / 16777215.0 * 360.0 - 180.0;

    // Bit 7 of the altitude high byte marks below-sea-level fixes. The
    // mask is ORed in without sign extension, so flagged altitudes come
    // out as large values near u32::MAX.
    let raw_altitude = u32::from(read_u16_be(&payload[7..9]));
    let altitude = if payload[7] & 0x80 != 0 {
        0xFFFF_0000 | raw_altitude
    } else {
        raw_altitude
    };

    let hdop = payload[9] as f64 / 10.0;
    let satellites = payload[10];

    // An all-zero frame decodes to -90 / -180 / 0; treat it as no fix
    let valid = latitude != -90.0 && latitude != -180.0 && altitude != 0;

    DecodedPayload::GpsFix(GpsFix {
        latitude,
        longitude,
        altitude,
        hdop,
        satellites,
        valid,
    })
}

fn decode_wifi_scan(payload: &[u8]) -> DecodedPayload {
    if payload.first() != Some(&MARKER_LOCATION) {
        return DecodedPayload::Unrecognized;
    }

    // Complete 7-byte groups only; a trailing partial group is dropped
    let access_points = payload[1..]
        .chunks_exact(WIFI_GROUP_LEN)
        .map(|group| AccessPoint {
            bssid: format_bssid(&group[..6]),
            rssi: -i16::from(group[6]),
        })
        .collect();

    DecodedPayload::WifiScan(access_points)
}

fn format_bssid(bytes: &[u8]) -> String {
    bytes
        .iter()
        .map(|b| format!("{:02x}", b))
        .collect::<Vec<_>>()
        .join(":")
}

fn read_u24_be(data: &[u8]) -> u32 {
    (u32::from(data[0]) << 16) | (u32::from(data[1]) << 8) | u32::from(data[2])
}

fn read_u16_be(data: &[u8]) -> u16 {
    u16::from_be_bytes([data[0], data[1]])
}

#[cfg(test)]
mod tests {
    use super::*;

    fn expect_gps(result: DecodedPayload) -> GpsFix {
        match result {
            DecodedPayload::GpsFix(fix) => fix,
            other => panic!("expected gps fix, got {:?}", other),
        }
    }

    fn expect_wifi(result: DecodedPayload) -> Vec<AccessPoint> {
        match result {
            DecodedPayload::WifiScan(aps) => aps,
            other => panic!("expected wifi scan, got {:?}", other),
        }
    }

    #[test]
    fn test_lock_state_locked() {
        // Marker 0x01, state byte 0x01 (locked)
        let result = decode(PORT_LOCK_STATE, &[0x01, 0x01]);
        assert_eq!(result, DecodedPayload::LockState { locked: true });
    }

    #[test]
    fn test_lock_state_open() {
        // Marker 0x01, state byte 0x00 (open)
        let result = decode(PORT_LOCK_STATE, &[0x01, 0x00]);
        assert_eq!(result, DecodedPayload::LockState { locked: false });
    }

    #[test]
    fn test_lock_state_other_value_reads_open() {
        // Only 0x01 means locked; any other state byte reads as open
        let result = decode(PORT_LOCK_STATE, &[0x01, 0x02]);
        assert_eq!(result, DecodedPayload::LockState { locked: false });
    }

    #[test]
    fn test_lock_state_trailing_bytes_ignored() {
        let result = decode(PORT_LOCK_STATE, &[0x01, 0x01, 0xAA, 0xBB]);
        assert_eq!(result, DecodedPayload::LockState { locked: true });
    }

    #[test]
    fn test_lock_state_too_short() {
        let result = decode(PORT_LOCK_STATE, &[0x01]);
        assert_eq!(result, DecodedPayload::Unrecognized);
    }

    #[test]
    fn test_lock_state_wrong_marker() {
        let result = decode(PORT_LOCK_STATE, &[0x02, 0x01]);
        assert_eq!(result, DecodedPayload::Unrecognized);
    }

    #[test]
    fn test_gps_fix() {
        // Marker 0x02
        // lat raw 0x7FFFFF (midpoint, ~0.0 deg)
        // lng raw 0x400000 (quarter, ~-90.0 deg)
        // altitude 0x0064 (100m), hdop 0x05 (0.5), satellites 0x08
        let payload = [
            0x02, 0x7F, 0xFF, 0xFF, 0x40, 0x00, 0x00, 0x00, 0x64, 0x05, 0x08,
        ];
        let fix = expect_gps(decode(PORT_GPS, &payload));
        assert!((fix.latitude - 0.0).abs() < 1e-4);
        assert!((fix.longitude - -90.0).abs() < 1e-4);
        assert_eq!(fix.altitude, 100);
        assert!((fix.hdop - 0.5).abs() < f64::EPSILON);
        assert_eq!(fix.satellites, 8);
        assert!(fix.valid);
    }

    #[test]
    fn test_gps_coordinate_extremes() {
        // Raw 0x000000 maps to the lower bound, 0xFFFFFF to the upper
        let low = [0x02, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x64, 0x0A, 0x04];
        let fix = expect_gps(decode(PORT_GPS, &low));
        assert!((fix.latitude - -90.0).abs() < f64::EPSILON);
        assert!((fix.longitude - -180.0).abs() < f64::EPSILON);

        let high = [0x02, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0x00, 0x64, 0x0A, 0x04];
        let fix = expect_gps(decode(PORT_GPS, &high));
        assert!((fix.latitude - 90.0).abs() < f64::EPSILON);
        assert!((fix.longitude - 180.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_gps_zero_frame_not_valid() {
        // All-zero frame: lat -90, lng -180, altitude 0
        let payload = [0x02, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00];
        let fix = expect_gps(decode(PORT_GPS, &payload));
        assert!(!fix.valid);
    }

    #[test]
    fn test_gps_zero_altitude_not_valid() {
        // Plausible coordinates but altitude 0 still fails the heuristic
        let payload = [0x02, 0x7F, 0xFF, 0xFF, 0x40, 0x00, 0x00, 0x00, 0x00, 0x05, 0x08];
        let fix = expect_gps(decode(PORT_GPS, &payload));
        assert_eq!(fix.altitude, 0);
        assert!(!fix.valid);
    }

    #[test]
    fn test_gps_altitude_sign_bit_masks_high_word() {
        // Altitude bytes 0x80 0x64: bit 7 set, raw 0x8064
        let payload = [0x02, 0x7F, 0xFF, 0xFF, 0x40, 0x00, 0x00, 0x80, 0x64, 0x05, 0x08];
        let fix = expect_gps(decode(PORT_GPS, &payload));
        assert_eq!(fix.altitude, 0xFFFF_8064);
        assert!(fix.valid);
    }

    #[test]
    fn test_gps_too_short() {
        // 10 bytes, one short of a full fix
        let payload = [0x02, 0x7F, 0xFF, 0xFF, 0x40, 0x00, 0x00, 0x00, 0x64, 0x05];
        assert_eq!(decode(PORT_GPS, &payload), DecodedPayload::Unrecognized);
    }

    #[test]
    fn test_gps_wrong_marker() {
        let payload = [0x01, 0x7F, 0xFF, 0xFF, 0x40, 0x00, 0x00, 0x00, 0x64, 0x05, 0x08];
        assert_eq!(decode(PORT_GPS, &payload), DecodedPayload::Unrecognized);
    }

    #[test]
    fn test_wifi_scan_two_access_points() {
        // Marker 0x02, then two 7-byte groups: BSSID + signal strength
        let payload = [
            0x02, 0xAA, 0xBB, 0xCC, 0xDD, 0xEE, 0xFF, 0x2D, 0x11, 0x22, 0x33, 0x44, 0x55, 0x66,
            0x50,
        ];
        let result = decode(PORT_WIFI_SCAN, &payload);
        assert_eq!(
            result,
            DecodedPayload::WifiScan(vec![
                AccessPoint {
                    bssid: "aa:bb:cc:dd:ee:ff".to_string(),
                    rssi: -45,
                },
                AccessPoint {
                    bssid: "11:22:33:44:55:66".to_string(),
                    rssi: -80,
                },
            ])
        );
    }

    #[test]
    fn test_wifi_scan_partial_group_dropped() {
        // One full group followed by three stray bytes
        let payload = [
            0x02, 0xAA, 0xBB, 0xCC, 0xDD, 0xEE, 0xFF, 0x2D, 0x01, 0x02, 0x03,
        ];
        let aps = expect_wifi(decode(PORT_WIFI_SCAN, &payload));
        assert_eq!(aps.len(), 1);
        assert_eq!(aps[0].bssid, "aa:bb:cc:dd:ee:ff");
    }

    #[test]
    fn test_wifi_scan_marker_only_is_empty() {
        let result = decode(PORT_WIFI_SCAN, &[0x02]);
        assert_eq!(result, DecodedPayload::WifiScan(vec![]));
    }

    #[test]
    fn test_wifi_scan_signal_strength_range() {
        // 0x00 -> 0 dBm, 0xFF -> -255 dBm
        let payload = [
            0x02, 0x00, 0x00, 0x00, 0x00, 0x00, 0x01, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x02,
            0xFF,
        ];
        let aps = expect_wifi(decode(PORT_WIFI_SCAN, &payload));
        assert_eq!(aps[0].rssi, 0);
        assert_eq!(aps[1].rssi, -255);
    }

    #[test]
    fn test_wifi_scan_missing_marker() {
        assert_eq!(decode(PORT_WIFI_SCAN, &[]), DecodedPayload::Unrecognized);
        assert_eq!(
            decode(PORT_WIFI_SCAN, &[0x01, 0xAA, 0xBB, 0xCC, 0xDD, 0xEE, 0xFF, 0x2D]),
            DecodedPayload::Unrecognized
        );
    }

    #[test]
    fn test_unknown_port() {
        assert_eq!(decode(2, &[0x01, 0x01]), DecodedPayload::Unrecognized);
        assert_eq!(decode(0, &[0x02, 0x01]), DecodedPayload::Unrecognized);
        assert_eq!(decode(255, &[]), DecodedPayload::Unrecognized);
    }

    #[test]
    fn test_empty_payload_any_port() {
        assert_eq!(decode(PORT_LOCK_STATE, &[]), DecodedPayload::Unrecognized);
        assert_eq!(decode(PORT_GPS, &[]), DecodedPayload::Unrecognized);
    }
}

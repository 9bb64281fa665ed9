mod telemetry;

pub use telemetry::{
    decode, AccessPoint, DecodedPayload, GpsFix, MARKER_LOCATION, MARKER_LOCK_STATE, PORT_GPS,
    PORT_LOCK_STATE, PORT_WIFI_SCAN,
};

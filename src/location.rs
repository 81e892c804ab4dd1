//! Location samples, display formatting, share-message composition and the
//! reverse-geocoding wire types.

use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use serde::{Deserialize, Serialize};
use url::Url;

use crate::capabilities::GeoPosition;

/// Matches `encodeURIComponent`: everything but `A-Z a-z 0-9 - _ . ! ~ * ' ( )`
/// is percent-encoded. Message bodies must survive the trip into the
/// platform's messaging app byte-for-byte.
const URI_COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

/// The latest fix, replaced wholesale on every platform callback. Never
/// persisted; lost on reload by design.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocationSample {
    pub latitude: f64,
    pub longitude: f64,
    pub accuracy: Option<f64>,
    pub timestamp_ms: Option<u64>,
    pub speed: Option<f64>,
    pub altitude: Option<f64>,
    pub heading: Option<f64>,
    /// Reverse-geocoded text, filled in asynchronously after the fix.
    pub address: Option<String>,
}

impl From<GeoPosition> for LocationSample {
    fn from(position: GeoPosition) -> Self {
        Self {
            latitude: position.latitude,
            longitude: position.longitude,
            accuracy: position.accuracy,
            timestamp_ms: position.timestamp_ms,
            speed: position.speed,
            altitude: position.altitude,
            heading: position.heading,
            address: None,
        }
    }
}

#[must_use]
pub fn format_coordinate(value: f64) -> String {
    format!("{value:.6}")
}

#[must_use]
pub fn format_accuracy(accuracy: Option<f64>) -> String {
    match accuracy {
        Some(meters) => format!("\u{b1}{meters:.0}m"),
        None => "N/A".to_string(),
    }
}

#[must_use]
pub fn maps_link(latitude: f64, longitude: f64) -> String {
    format!("https://maps.google.com/maps?q={latitude},{longitude}")
}

/// The exact body handed to the messaging app. Wording is user-facing
/// contract; do not reword.
#[must_use]
pub fn share_message(latitude: f64, longitude: f64, address: Option<&str>) -> String {
    let mut message = format!(
        "Emergency: I'm sharing my current location with you: {}",
        maps_link(latitude, longitude)
    );
    if let Some(address) = address {
        message.push_str("\nAddress: ");
        message.push_str(address);
    }
    message
}

#[must_use]
pub fn sms_uri(number: &str, body: &str) -> String {
    format!(
        "sms:{number}?body={}",
        utf8_percent_encode(body, URI_COMPONENT)
    )
}

#[must_use]
pub fn tel_uri(number: &str) -> String {
    format!("tel:{number}")
}

/// Builds the reverse-geocode lookup URL for a fix, requesting an
/// English-language response.
#[must_use]
pub fn geocode_url(endpoint: &str, latitude: f64, longitude: f64) -> Option<String> {
    let mut url = Url::parse(endpoint).ok()?;
    url.query_pairs_mut()
        .append_pair("format", "jsonv2")
        .append_pair("lat", &latitude.to_string())
        .append_pair("lon", &longitude.to_string())
        .append_pair("accept-language", "en");
    Some(url.into())
}

/// The only field we read from the lookup service.
#[derive(Debug, Clone, Deserialize)]
pub struct GeocodeResponseBody {
    pub display_name: String,
}

/// Parses a lookup response body, degrading to `None` on anything
/// unexpected. A failed lookup must never block the location display.
#[must_use]
pub fn parse_geocode_body(body: &str) -> Option<String> {
    match serde_json::from_str::<GeocodeResponseBody>(body) {
        Ok(parsed) => Some(parsed.display_name),
        Err(error) => {
            tracing::debug!(%error, "reverse geocode response unparseable");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn coordinates_render_six_decimal_places() {
        assert_eq!(format_coordinate(12.9716), "12.971600");
        assert_eq!(format_coordinate(77.5946), "77.594600");
        assert_eq!(format_coordinate(-0.1), "-0.100000");
    }

    #[test]
    fn accuracy_renders_metres_radius() {
        assert_eq!(format_accuracy(Some(15.0)), "\u{b1}15m");
        assert_eq!(format_accuracy(Some(7.4)), "\u{b1}7m");
        assert_eq!(format_accuracy(None), "N/A");
    }

    #[test]
    fn share_message_is_bit_exact() {
        assert_eq!(
            share_message(12.9716, 77.5946, None),
            "Emergency: I'm sharing my current location with you: \
             https://maps.google.com/maps?q=12.9716,77.5946"
        );
    }

    #[test]
    fn share_message_appends_address_on_new_line() {
        let message = share_message(1.0, 2.0, Some("1 Example Street"));
        assert!(message.ends_with("\nAddress: 1 Example Street"));
        assert!(message.contains("q=1,2"));
    }

    #[test]
    fn sms_uri_encodes_like_encode_uri_component() {
        let uri = sms_uri("9876543210", "a b:c/d'e");
        assert_eq!(uri, "sms:9876543210?body=a%20b%3Ac%2Fd'e");
    }

    #[test]
    fn tel_uri_is_plain() {
        assert_eq!(tel_uri("100"), "tel:100");
    }

    #[test]
    fn geocode_url_carries_coordinates_and_language() {
        let url = geocode_url(
            "https://nominatim.openstreetmap.org/reverse",
            12.9716,
            77.5946,
        )
        .unwrap();
        assert!(url.contains("lat=12.9716"));
        assert!(url.contains("lon=77.5946"));
        assert!(url.contains("accept-language=en"));
    }

    #[test]
    fn geocode_parse_degrades_to_none() {
        assert_eq!(parse_geocode_body("not json"), None);
        assert_eq!(
            parse_geocode_body(r#"{"display_name":"MG Road, Bengaluru"}"#),
            Some("MG Road, Bengaluru".to_string())
        );
    }
}

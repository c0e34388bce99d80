//! Share text and external map links.

use crate::geo::Coordinate;
use crate::locale::Locale;

const MAPS_BASE: &str = "https://www.google.com/maps";

/// Plain `lat, lng` text placed on the clipboard.
pub fn clipboard_text(at: Coordinate) -> String {
    format!("{}, {}", at.lat, at.lng)
}

pub fn share_url(at: Coordinate) -> String {
    format!("{}?q={},{}", MAPS_BASE, at.lat, at.lng)
}

pub fn share_text(at: Coordinate, locale: Locale) -> String {
    format!("{}: {}, {}", locale.share_prefix(), at.lat, at.lng)
}

/// Walking directions between two points. Parameter names must match the
/// Google Maps URL API exactly.
pub fn directions_url(origin: Coordinate, destination: Coordinate) -> String {
    format!(
        "{}/dir/?api=1&origin={},{}&destination={},{}&travelmode=walking",
        MAPS_BASE, origin.lat, origin.lng, destination.lat, destination.lng
    )
}

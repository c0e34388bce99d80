//! Coordinates, great-circle distance, and map viewport fitting.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Mean Earth radius in kilometers.
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// Where the map looks before any position is known (Dhaka).
pub const DEFAULT_CENTER: Coordinate = Coordinate {
    lat: 23.8103,
    lng: 90.4125,
};

/// A WGS-84 position in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub lat: f64,
    pub lng: f64,
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum CoordinateError {
    #[error("expected two comma-separated numbers (lat, lng), got {0:?}")]
    Malformed(String),
    #[error("latitude {0} is outside [-90, 90]")]
    LatitudeOutOfRange(f64),
    #[error("longitude {0} is outside [-180, 180]")]
    LongitudeOutOfRange(f64),
}

impl Coordinate {
    /// Build a coordinate, rejecting non-finite or out-of-range values.
    pub fn new(lat: f64, lng: f64) -> Result<Self, CoordinateError> {
        if !lat.is_finite() || !(-90.0..=90.0).contains(&lat) {
            return Err(CoordinateError::LatitudeOutOfRange(lat));
        }
        if !lng.is_finite() || !(-180.0..=180.0).contains(&lng) {
            return Err(CoordinateError::LongitudeOutOfRange(lng));
        }
        Ok(Self { lat, lng })
    }

    /// Build a coordinate without range checks. Callers own validation.
    pub const fn new_unchecked(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    /// Fixed five-decimal rendering used in the UI.
    pub fn display_precise(&self) -> String {
        format!("{:.5}, {:.5}", self.lat, self.lng)
    }
}

impl fmt::Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}, {}", self.lat, self.lng)
    }
}

impl std::str::FromStr for Coordinate {
    type Err = CoordinateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_coordinate(s)
    }
}

/// Haversine great-circle distance in kilometers.
///
/// Does not validate ranges; out-of-range input yields a meaningless (but
/// finite, non-negative) number.
pub fn distance_km(a: Coordinate, b: Coordinate) -> f64 {
    let lat1 = a.lat.to_radians();
    let lat2 = b.lat.to_radians();
    let d_lat = (b.lat - a.lat).to_radians();
    let d_lng = (b.lng - a.lng).to_radians();

    let h = (d_lat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (d_lng / 2.0).sin().powi(2);
    // Rounding can push h a hair past 1 for antipodal points.
    let h = h.clamp(0.0, 1.0);
    let c = 2.0 * h.sqrt().atan2((1.0 - h).sqrt());

    EARTH_RADIUS_KM * c
}

/// Parse `"lat, lng"` as typed by a user. Exactly two finite numbers, in range.
pub fn parse_coordinate(input: &str) -> Result<Coordinate, CoordinateError> {
    let parts: Vec<&str> = input.split(',').map(str::trim).collect();
    let [lat, lng] = parts.as_slice() else {
        return Err(CoordinateError::Malformed(input.to_string()));
    };

    let lat: f64 = lat
        .parse()
        .map_err(|_| CoordinateError::Malformed(input.to_string()))?;
    let lng: f64 = lng
        .parse()
        .map_err(|_| CoordinateError::Malformed(input.to_string()))?;

    if !lat.is_finite() || !lng.is_finite() {
        return Err(CoordinateError::Malformed(input.to_string()));
    }

    Coordinate::new(lat, lng)
}

/// Visible map region in degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub south: f64,
    pub west: f64,
    pub north: f64,
    pub east: f64,
}

impl Viewport {
    /// Fit the viewport around `points`.
    ///
    /// `padding_ratio` grows each side by that fraction of the span.
    /// `min_span` (degrees) is the zoom limit: no axis gets narrower.
    pub fn fit(points: &[Coordinate], padding_ratio: f64, min_span: f64) -> Self {
        let Some(first) = points.first() else {
            return Self::centered(DEFAULT_CENTER, min_span, min_span);
        };

        let mut south = first.lat;
        let mut north = first.lat;
        let mut west = first.lng;
        let mut east = first.lng;
        for p in &points[1..] {
            south = south.min(p.lat);
            north = north.max(p.lat);
            west = west.min(p.lng);
            east = east.max(p.lng);
        }

        let lat_span = (north - south) * (1.0 + 2.0 * padding_ratio);
        let lng_span = (east - west) * (1.0 + 2.0 * padding_ratio);
        let center = Coordinate::new_unchecked((south + north) / 2.0, (west + east) / 2.0);

        Self::centered(center, lat_span.max(min_span), lng_span.max(min_span))
    }

    fn centered(center: Coordinate, lat_span: f64, lng_span: f64) -> Self {
        Self {
            south: (center.lat - lat_span / 2.0).max(-90.0),
            north: (center.lat + lat_span / 2.0).min(90.0),
            west: (center.lng - lng_span / 2.0).max(-180.0),
            east: (center.lng + lng_span / 2.0).min(180.0),
        }
    }

    #[cfg(test)]
    pub fn center(&self) -> Coordinate {
        Coordinate::new_unchecked((self.south + self.north) / 2.0, (self.west + self.east) / 2.0)
    }

    pub fn contains(&self, p: Coordinate) -> bool {
        (self.south..=self.north).contains(&p.lat) && (self.west..=self.east).contains(&p.lng)
    }

    pub fn lat_bounds(&self) -> [f64; 2] {
        [self.south, self.north]
    }

    pub fn lng_bounds(&self) -> [f64; 2] {
        [self.west, self.east]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn c(lat: f64, lng: f64) -> Coordinate {
        Coordinate::new_unchecked(lat, lng)
    }

    #[test]
    fn test_distance_identical_points_is_zero() {
        let dhaka = c(23.8103, 90.4125);
        assert_eq!(distance_km(dhaka, dhaka), 0.0);
    }

    #[test]
    fn test_distance_one_degree_at_equator() {
        let d = distance_km(c(0.0, 0.0), c(0.0, 1.0));
        assert!((d - 111.19).abs() < 0.5, "got {}", d);
    }

    #[test]
    fn test_distance_is_symmetric() {
        let pairs = [
            (c(23.8103, 90.4125), c(22.3569, 91.7832)),
            (c(-33.8688, 151.2093), c(51.5074, -0.1278)),
            (c(89.9, 0.0), c(-89.9, 179.0)),
        ];
        for (a, b) in pairs {
            assert!((distance_km(a, b) - distance_km(b, a)).abs() < 1e-9);
            assert!(distance_km(a, b) >= 0.0);
        }
    }

    #[test]
    fn test_distance_antipodal_is_half_circumference() {
        let d = distance_km(c(0.0, 0.0), c(0.0, 180.0));
        let half = std::f64::consts::PI * EARTH_RADIUS_KM;
        assert!(d.is_finite());
        assert!((d - half).abs() < 1e-6);
    }

    #[test]
    fn test_parse_valid_input() {
        let coord = parse_coordinate("23.81, 90.41").unwrap();
        assert_eq!(coord, c(23.81, 90.41));

        let coord = parse_coordinate("  -1.5,2  ").unwrap();
        assert_eq!(coord, c(-1.5, 2.0));
    }

    #[test]
    fn test_parse_rejects_malformed_input() {
        assert!(matches!(parse_coordinate("abc"), Err(CoordinateError::Malformed(_))));
        assert!(matches!(parse_coordinate("23.81"), Err(CoordinateError::Malformed(_))));
        assert!(matches!(parse_coordinate("1, 2, 3"), Err(CoordinateError::Malformed(_))));
        assert!(matches!(parse_coordinate("NaN, 2"), Err(CoordinateError::Malformed(_))));
        assert!(matches!(parse_coordinate(""), Err(CoordinateError::Malformed(_))));
    }

    #[test]
    fn test_parse_rejects_out_of_range() {
        assert_eq!(
            parse_coordinate("91, 0"),
            Err(CoordinateError::LatitudeOutOfRange(91.0))
        );
        assert_eq!(
            parse_coordinate("0, -180.5"),
            Err(CoordinateError::LongitudeOutOfRange(-180.5))
        );
        assert!(parse_coordinate("90, 180").is_ok());
    }

    #[test]
    fn test_display_precise() {
        assert_eq!(c(23.8103, 90.4125).display_precise(), "23.81030, 90.41250");
    }

    #[test]
    fn test_viewport_without_points_uses_default_center() {
        let view = Viewport::fit(&[], 0.1, 0.02);
        let center = view.center();
        assert!((center.lat - DEFAULT_CENTER.lat).abs() < 1e-9);
        assert!((center.lng - DEFAULT_CENTER.lng).abs() < 1e-9);
    }

    #[test]
    fn test_viewport_single_point_respects_min_span() {
        let p = c(10.0, 20.0);
        let view = Viewport::fit(&[p], 0.1, 0.02);
        assert!(view.contains(p));
        assert!((view.north - view.south - 0.02).abs() < 1e-9);
        assert!((view.east - view.west - 0.02).abs() < 1e-9);
    }

    #[test]
    fn test_viewport_two_points_padded() {
        let a = c(23.0, 90.0);
        let b = c(24.0, 92.0);
        let view = Viewport::fit(&[a, b], 0.25, 0.02);
        assert!(view.contains(a));
        assert!(view.contains(b));
        assert!((view.north - view.south - 1.5).abs() < 1e-9);
        assert!((view.east - view.west - 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_viewport_clamped_to_globe() {
        let view = Viewport::fit(&[c(89.0, 179.0), c(-89.0, -179.0)], 0.5, 0.02);
        assert_eq!(view.north, 90.0);
        assert_eq!(view.south, -90.0);
        assert_eq!(view.east, 180.0);
        assert_eq!(view.west, -180.0);
    }
}

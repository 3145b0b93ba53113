use serde::Deserialize;

/// Kilometers per degree of latitude (and of longitude at the equator).
pub const KM_PER_DEG: f64 = 111.0;

/// A geographic coordinate pair in degrees.
#[derive(Clone, Copy, Debug, PartialEq, Deserialize)]
pub struct LatLng {
    pub lat: f64,
    pub lng: f64,
}

impl LatLng {
    pub const fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    pub fn is_finite(&self) -> bool {
        self.lat.is_finite() && self.lng.is_finite()
    }
}

/// A rectangular region as southwest/northeast corners.
#[derive(Clone, Copy, Debug, PartialEq, Deserialize)]
pub struct LatLngBounds {
    pub southwest: LatLng,
    pub northeast: LatLng,
}

impl LatLngBounds {
    pub const fn new(southwest: LatLng, northeast: LatLng) -> Self {
        Self {
            southwest,
            northeast,
        }
    }

    pub fn center(&self) -> LatLng {
        LatLng::new(
            (self.southwest.lat + self.northeast.lat) / 2.0,
            (self.southwest.lng + self.northeast.lng) / 2.0,
        )
    }
}

/// A location record as it arrives from external sources (stored sessions,
/// upstream panels). Three shapes are accepted; anything else fails to parse.
#[derive(Clone, Debug, Deserialize)]
#[serde(untagged)]
pub enum RawLocation {
    /// `{"coordinates": [lat, lng]}`
    Coordinates { coordinates: [f64; 2] },
    /// `{"lat": .., "lng": ..}`
    LatLng { lat: f64, lng: f64 },
    /// `{"latitude": .., "longitude": ..}`
    LatitudeLongitude { latitude: f64, longitude: f64 },
}

/// Extract a canonical coordinate pair from a raw location record.
///
/// Lenient on range (out-of-range values pass through) but strict on shape:
/// a missing record or non-finite field yields `None` rather than an error.
pub fn normalize(record: Option<&RawLocation>) -> Option<LatLng> {
    let point = match record? {
        RawLocation::Coordinates { coordinates } => LatLng::new(coordinates[0], coordinates[1]),
        RawLocation::LatLng { lat, lng } => LatLng::new(*lat, *lng),
        RawLocation::LatitudeLongitude {
            latitude,
            longitude,
        } => LatLng::new(*latitude, *longitude),
    };

    point.is_finite().then_some(point)
}

/// Bounds of the square highlight box drawn around a selected point:
/// `half_km` in each direction, with the longitude span widened by
/// `1 / cos(lat)` so the box stays visually square away from the equator.
pub fn highlight_bounds(center: LatLng, half_km: f64) -> LatLngBounds {
    let lat_offset = half_km / KM_PER_DEG;
    let lng_offset = half_km / (KM_PER_DEG * center.lat.to_radians().cos());

    LatLngBounds::new(
        LatLng::new(center.lat - lat_offset, center.lng - lng_offset),
        LatLng::new(center.lat + lat_offset, center.lng + lng_offset),
    )
}

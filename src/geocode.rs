//! Free-text place search against a Nominatim-style geocoding endpoint.

use reqwest::Client;
use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

use crate::geo::{LatLng, LatLngBounds, RawLocation};
use crate::map::LocationSelection;

const DEFAULT_BASE_URL: &str = "https://nominatim.openstreetmap.org";

/// City-level zoom suggested for a freshly geocoded point.
const GEOCODED_ZOOM: u8 = 11;

/// Outcomes a caller must handle; retry is the caller's decision.
#[derive(Debug, Error)]
pub enum GeocodeError {
    /// The provider returned no result (or the query was blank).
    #[error("location not found")]
    NotFound,
    /// Network failure, non-2xx status, or a malformed payload. No partial
    /// selection is ever produced from a response we cannot fully parse.
    #[error("geocoding failed: {0}")]
    Transport(String),
}

/// One search result as the provider reports it. `boundingbox` is four
/// numeric strings ordered south, north, west, east.
#[derive(Debug, Deserialize)]
struct Place {
    display_name: String,
    lat: String,
    lon: String,
    #[serde(default)]
    boundingbox: Option<[String; 4]>,
}

/// Client scoped to a single country: the query gets a `,<country>`
/// qualifier and a `countrycodes` filter, and only the best-ranked result
/// is used. One request per call; no coalescing or cancellation, so a
/// fast second call may finish before a slow first one and consumers
/// apply last-write-wins.
#[derive(Clone)]
pub struct GeocodeClient {
    client: Client,
    base_url: String,
    country: String,
    country_code: String,
}

impl GeocodeClient {
    pub fn new() -> reqwest::Result<Self> {
        let client = Client::builder()
            .user_agent(concat!("geoscope/", env!("CARGO_PKG_VERSION")))
            .timeout(std::time::Duration::from_secs(15))
            .build()?;
        Ok(Self {
            client,
            base_url: DEFAULT_BASE_URL.to_string(),
            country: "Canada".to_string(),
            country_code: "ca".to_string(),
        })
    }

    #[cfg(test)]
    fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.to_string();
        self
    }

    fn search_url(&self, query: &str) -> String {
        format!(
            "{}/search?format=json&q={},{}&limit=1&countrycodes={}",
            self.base_url,
            urlencoding::encode(query),
            self.country,
            self.country_code
        )
    }

    /// Resolve a free-text query to a selection. A blank query resolves to
    /// `NotFound` without touching the network.
    pub async fn geocode(&self, query: &str) -> Result<LocationSelection, GeocodeError> {
        let query = query.trim();
        if query.is_empty() {
            return Err(GeocodeError::NotFound);
        }

        let url = self.search_url(query);
        debug!(%url, "geocoding query");

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| GeocodeError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(GeocodeError::Transport(format!("status {status}")));
        }

        let body = response
            .text()
            .await
            .map_err(|e| GeocodeError::Transport(e.to_string()))?;
        parse_search_response(&body)
    }
}

/// Turn the provider's JSON array into a selection, reordering the bounding
/// box into southwest/northeast corners.
fn parse_search_response(body: &str) -> Result<LocationSelection, GeocodeError> {
    let places: Vec<Place> =
        serde_json::from_str(body).map_err(|e| GeocodeError::Transport(e.to_string()))?;

    let Some(place) = places.into_iter().next() else {
        return Err(GeocodeError::NotFound);
    };

    let lat = parse_coord(&place.lat)?;
    let lon = parse_coord(&place.lon)?;

    let bounds = match &place.boundingbox {
        Some([south, north, west, east]) => {
            let south = parse_coord(south)?;
            let north = parse_coord(north)?;
            let west = parse_coord(west)?;
            let east = parse_coord(east)?;
            Some(LatLngBounds::new(
                LatLng::new(south, west),
                LatLng::new(north, east),
            ))
        }
        None => None,
    };

    Ok(LocationSelection {
        name: place.display_name,
        coordinates: RawLocation::Coordinates {
            coordinates: [lat, lon],
        },
        bounds,
        zoom: Some(GEOCODED_ZOOM),
    })
}

fn parse_coord(value: &str) -> Result<f64, GeocodeError> {
    value
        .parse::<f64>()
        .map_err(|_| GeocodeError::Transport(format!("unparseable coordinate {value:?}")))
}

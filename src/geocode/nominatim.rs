use crate::geocode::error::GeocodeError;
use crate::geocode::Geocoder;
use crate::types::station::LatLon;
use async_trait::async_trait;
use log::{debug, warn};
use reqwest::Client;
use serde::Deserialize;

/// Geocoder backed by a Nominatim-compatible `/search` endpoint.
#[derive(Debug, Clone)]
pub struct NominatimGeocoder {
    base_url: String,
    http: Client,
}

#[derive(Debug, Deserialize)]
struct SearchHit {
    lat: String,
    lon: String,
}

impl NominatimGeocoder {
    pub fn new(base_url: &str, http: Client) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            http,
        }
    }

    /// Looks up `address`, returning the best match if there is one.
    pub async fn search(&self, address: &str) -> Result<Option<LatLon>, GeocodeError> {
        let url = format!("{}/search", self.base_url);
        let response = self
            .http
            .get(&url)
            .query(&[("q", address), ("format", "json"), ("limit", "1")])
            .send()
            .await
            .map_err(|e| GeocodeError::NetworkRequest(url.clone(), e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(GeocodeError::HttpStatus { url, status });
        }

        let body = response
            .text()
            .await
            .map_err(|e| GeocodeError::NetworkRequest(url, e))?;
        parse_search_response(&body)
    }
}

#[async_trait]
impl Geocoder for NominatimGeocoder {
    async fn geocode(&self, address: &str) -> Option<LatLon> {
        let address = address.trim();
        if address.is_empty() {
            return None;
        }
        match self.search(address).await {
            Ok(Some(location)) => {
                debug!("Geocoded '{}' to {}", address, location);
                Some(location)
            }
            Ok(None) => {
                warn!("No geocoding match for '{}'", address);
                None
            }
            Err(e) => {
                warn!("Geocoding '{}' failed: {}", address, e);
                None
            }
        }
    }
}

/// Parses a `format=json` search response. Nominatim encodes coordinates as strings.
pub(crate) fn parse_search_response(body: &str) -> Result<Option<LatLon>, GeocodeError> {
    let hits: Vec<SearchHit> = serde_json::from_str(body)?;
    let Some(hit) = hits.into_iter().next() else {
        return Ok(None);
    };
    match (hit.lat.trim().parse::<f64>(), hit.lon.trim().parse::<f64>()) {
        (Ok(lat), Ok(lon))
            if lat.is_finite() && lon.is_finite() && lat.abs() <= 90.0 && lon.abs() <= 180.0 =>
        {
            Ok(Some(LatLon(lat, lon)))
        }
        _ => Err(GeocodeError::InvalidCoordinate {
            lat: hit.lat,
            lon: hit.lon,
        }),
    }
}

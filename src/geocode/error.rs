use thiserror::Error;

#[derive(Debug, Error)]
pub enum GeocodeError {
    #[error("Geocoding request to {0} failed")]
    NetworkRequest(String, #[source] reqwest::Error),

    #[error("Geocoding service returned HTTP {status} for {url}")]
    HttpStatus {
        url: String,
        status: reqwest::StatusCode,
    },

    #[error("Failed to parse geocoding response")]
    JsonParse(#[from] serde_json::Error),

    #[error("Geocoding response contains an invalid coordinate: lat '{lat}', lon '{lon}'")]
    InvalidCoordinate { lat: String, lon: String },
}

use crate::archive::error::{ArchiveError, DecodeError};
use crate::geocode::error::GeocodeError;
use crate::stations::error::DirectoryError;
use crate::types::resolution::YearFailure;
use thiserror::Error;

/// Why a resolution produced no data at all.
#[derive(Debug, Error)]
pub enum ResolutionError {
    #[error("Invalid year range {start}..={end}")]
    InvalidYearRange { start: i32, end: i32 },

    #[error("Could not geocode address '{address}'")]
    GeocodeFailed { address: String },

    #[error(transparent)]
    Directory(#[from] DirectoryError),

    #[error("No station could provide data for any requested year ({} years failed)", .failures.len())]
    StationExhausted { failures: Vec<YearFailure> },
}

#[derive(Debug, Error)]
pub enum IsdError {
    #[error(transparent)]
    Resolution(#[from] ResolutionError),

    #[error(transparent)]
    Directory(#[from] DirectoryError),

    #[error(transparent)]
    Archive(#[from] ArchiveError),

    #[error(transparent)]
    Decode(#[from] DecodeError),

    #[error(transparent)]
    Geocode(#[from] GeocodeError),

    #[error("Failed to build HTTP client")]
    HttpClient(#[source] reqwest::Error),

    #[error(transparent)]
    DataFrame(#[from] polars::prelude::PolarsError),
}

//! Historical hourly weather for an address, from the nearest NOAA ISD station that has it.
//!
//! See [`IsdClient`] for the entry point.

mod archive;
mod cache;
mod config;
mod error;
mod geocode;
mod isd;
mod stations;
mod types;
mod utils;

pub use error::{IsdError, ResolutionError};
pub use isd::IsdClient;

pub use cache::{ResolutionCache, ResolveKey, TtlCache};
pub use config::{
    IsdConfig, DEFAULT_ARCHIVE_URL, DEFAULT_DIRECTORY_URL, DEFAULT_GEOCODER_URL,
    DEFAULT_USER_AGENT,
};

pub use archive::decoder::{
    decode, decode_line, decode_text, decompress, DecodedArchive, SkippedLine, FIELD_COUNT,
    MISSING_VALUE,
};
pub use archive::error::{ArchiveError, CandidateError, DecodeError, LineError};
pub use archive::fetcher::ArchiveFetcher;

pub use geocode::error::GeocodeError;
pub use geocode::nominatim::NominatimGeocoder;
pub use geocode::Geocoder;

pub use stations::coverage::{select, CoverageCandidates};
pub use stations::directory::{parse_directory_file, StationDirectoryLoader};
pub use stations::error::DirectoryError;
pub use stations::ranking::{distance_km, nearest, rank};

pub use types::dataset::WeatherDataset;
pub use types::observation::ObservationRecord;
pub use types::resolution::{CandidateFailure, Resolution, YearFailure};
pub use types::station::*;

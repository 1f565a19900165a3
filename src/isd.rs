//! This module provides the main entry point of the crate. It resolves an address or a
//! location to the nearest ISD station that has data for each requested year, and returns the
//! decoded hourly records.

use crate::archive::decoder::{decode, DecodedArchive};
use crate::archive::error::CandidateError;
use crate::archive::fetcher::ArchiveFetcher;
use crate::cache::{ResolutionCache, ResolveKey};
use crate::config::IsdConfig;
use crate::error::{IsdError, ResolutionError};
use crate::geocode::nominatim::NominatimGeocoder;
use crate::geocode::Geocoder;
use crate::stations::coverage::CoverageCandidates;
use crate::stations::directory::StationDirectoryLoader;
use crate::stations::ranking::{nearest, rank};
use crate::types::dataset::WeatherDataset;
use crate::types::resolution::{CandidateFailure, Resolution, YearFailure};
use crate::types::station::{LatLon, RankedStation, StationRecord};
use crate::utils::build_http_client;
use bon::bon;
use futures_util::future::join_all;
use log::{info, warn};
use std::ops::RangeInclusive;
use std::sync::Arc;

/// The client for resolving weather records from the NOAA ISD-lite archive.
///
/// Every resolution loads the station inventory once, ranks all stations by great-circle
/// distance to the query location and then, for each requested year independently, walks the
/// ranking from the closest station outwards until a station's archive file for that year can
/// be fetched and decoded.
///
/// Create an instance with [`IsdClient::new()`] for the public NOAA and OpenStreetMap services,
/// or [`IsdClient::with_config()`] to point it somewhere else.
///
/// # Examples
///
/// ```rust,no_run
/// # use isd_lite::{IsdClient, IsdError};
/// # async fn run() -> Result<(), IsdError> {
/// let client = IsdClient::new()?;
/// let resolution = client
///     .resolve()
///     .address("Boston, MA")
///     .years(2020..=2021)
///     .call()
///     .await?;
/// println!("{} records from {}", resolution.record_count(), resolution.station_info.station);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct IsdClient {
    config: IsdConfig,
    geocoder: Arc<dyn Geocoder>,
    directory_loader: StationDirectoryLoader,
    archive_fetcher: ArchiveFetcher,
    cache: Option<Arc<ResolutionCache>>,
}

#[bon]
impl IsdClient {
    /// Creates a client with [`IsdConfig::default()`].
    ///
    /// # Errors
    ///
    /// Returns [`IsdError::HttpClient`] if the HTTP client cannot be initialized.
    pub fn new() -> Result<Self, IsdError> {
        Self::with_config(IsdConfig::default())
    }

    /// Creates a client with the given configuration.
    ///
    /// A [`NominatimGeocoder`] for `config.geocoder_url` is used for addresses, and a result
    /// cache is created when `config.cache_ttl` is set.
    ///
    /// # Errors
    ///
    /// Returns [`IsdError::HttpClient`] if the HTTP client cannot be initialized.
    pub fn with_config(config: IsdConfig) -> Result<Self, IsdError> {
        let http = build_http_client(&config).map_err(IsdError::HttpClient)?;
        let cache = config
            .cache_ttl
            .map(|ttl| Arc::new(ResolutionCache::new(ttl)));
        Ok(Self {
            geocoder: Arc::new(NominatimGeocoder::new(&config.geocoder_url, http.clone())),
            directory_loader: StationDirectoryLoader::new(http.clone()),
            archive_fetcher: ArchiveFetcher::new(&config.archive_base_url, http),
            cache,
            config,
        })
    }

    /// Replaces the geocoder used by [`IsdClient::resolve`].
    pub fn with_geocoder(mut self, geocoder: Arc<dyn Geocoder>) -> Self {
        self.geocoder = geocoder;
        self
    }

    /// Uses `cache` for resolutions, for example to share one cache between clients.
    pub fn with_cache(mut self, cache: Arc<ResolutionCache>) -> Self {
        self.cache = Some(cache);
        self
    }

    pub fn config(&self) -> &IsdConfig {
        &self.config
    }

    /// Resolves an address to hourly weather records for a range of years.
    ///
    /// The address is geocoded once. Each year is then served by the closest station whose
    /// inventory covers it and whose archive file for that year can be fetched and decoded.
    /// Years are resolved concurrently, but the datasets of the result are always in ascending
    /// year order.
    ///
    /// This method uses a builder pattern.
    ///
    /// # Arguments
    ///
    /// * `.address(&str)`: **Required.** A free-form address, e.g. `"Boston, MA"`.
    /// * `.years(RangeInclusive<i32>)`: **Required.** The years to fetch, e.g. `2020..=2022`.
    ///
    /// # Returns
    ///
    /// The [`Resolution`], shared with the result cache if one is configured. It is returned as
    /// long as at least one year could be resolved; the years that could not are listed in
    /// [`Resolution::failed_years`].
    ///
    /// # Errors
    ///
    /// Returns [`ResolutionError::InvalidYearRange`] if the range is empty.
    /// Returns [`ResolutionError::GeocodeFailed`] if the address cannot be geocoded.
    /// Returns [`ResolutionError::Directory`] if the station inventory cannot be loaded.
    /// Returns [`ResolutionError::StationExhausted`] if no year could be resolved.
    ///
    /// # Examples
    ///
    /// ```rust,no_run
    /// # use isd_lite::{IsdClient, IsdError};
    /// # #[tokio::main]
    /// # async fn main() -> Result<(), IsdError> {
    /// let client = IsdClient::new()?;
    /// let resolution = client
    ///     .resolve()
    ///     .address("Logan Airport, Boston")
    ///     .years(2022..=2023)
    ///     .call()
    ///     .await?;
    ///
    /// for dataset in &resolution.datasets {
    ///     println!(
    ///         "{}: {} hours from {} ({:.1} km)",
    ///         dataset.year,
    ///         dataset.len(),
    ///         dataset.station.station,
    ///         dataset.station.distance_km
    ///     );
    /// }
    /// let df = resolution.to_dataframe()?;
    /// println!("{}", df.head(Some(5)));
    /// # Ok(())
    /// # }
    /// ```
    #[builder]
    pub async fn resolve(
        &self,
        address: &str,
        years: RangeInclusive<i32>,
    ) -> Result<Arc<Resolution>, ResolutionError> {
        check_years(&years)?;
        let key = ResolveKey::address(address, &years);
        if let Some(cached) = self.cached(&key).await {
            return Ok(cached);
        }

        let location = self.geocoder.geocode(address).await.ok_or_else(|| {
            ResolutionError::GeocodeFailed {
                address: address.to_string(),
            }
        })?;
        info!("Resolved '{}' to {}", address, location);

        let resolution = self.resolve_years(location, years).await?;
        Ok(self.store(key, resolution).await)
    }

    /// Like [`IsdClient::resolve`], but for a known location. No geocoding is done.
    ///
    /// # Arguments
    ///
    /// * `.location(LatLon)`: **Required.** The query coordinates.
    /// * `.years(RangeInclusive<i32>)`: **Required.** The years to fetch.
    ///
    /// # Errors
    ///
    /// The same as [`IsdClient::resolve`], except for [`ResolutionError::GeocodeFailed`].
    #[builder]
    pub async fn resolve_location(
        &self,
        location: LatLon,
        years: RangeInclusive<i32>,
    ) -> Result<Arc<Resolution>, ResolutionError> {
        check_years(&years)?;
        let key = ResolveKey::location(location, &years);
        if let Some(cached) = self.cached(&key).await {
            return Ok(cached);
        }
        let resolution = self.resolve_years(location, years).await?;
        Ok(self.store(key, resolution).await)
    }

    /// Finds the stations closest to a location.
    ///
    /// # Arguments
    ///
    /// * `.location(LatLon)`: **Required.** The coordinates to search around.
    /// * `.station_limit(usize)`: Optional. Maximum number of stations. Defaults to `5`.
    /// * `.max_distance_km(f64)`: Optional. Search radius in kilometers. Defaults to `50.0`.
    /// * `.year(i32)`: Optional. Only return stations whose inventory covers this year.
    ///
    /// # Returns
    ///
    /// The stations sorted by distance, closest first. The list is empty if no station matches.
    ///
    /// # Errors
    ///
    /// Returns [`IsdError::Directory`] if the station inventory cannot be loaded.
    ///
    /// # Examples
    ///
    /// ```rust,no_run
    /// # use isd_lite::{IsdClient, IsdError, LatLon};
    /// # #[tokio::main]
    /// # async fn main() -> Result<(), IsdError> {
    /// let client = IsdClient::new()?;
    /// let stations = client
    ///     .find_stations()
    ///     .location(LatLon(52.52, 13.40))
    ///     .max_distance_km(100.0)
    ///     .year(2023)
    ///     .call()
    ///     .await?;
    /// for candidate in &stations {
    ///     println!("{} at {:.1} km", candidate.station, candidate.distance_km);
    /// }
    /// # Ok(())
    /// # }
    /// ```
    #[builder]
    pub async fn find_stations(
        &self,
        location: LatLon,
        station_limit: Option<usize>,
        max_distance_km: Option<f64>,
        year: Option<i32>,
    ) -> Result<Vec<RankedStation>, IsdError> {
        let station_limit = station_limit.unwrap_or(5);
        let max_distance_km = max_distance_km.unwrap_or(50.0);

        let stations = self
            .directory_loader
            .load(&self.config.directory_url)
            .await?;
        let ranked = rank(&stations, location)
            .into_iter()
            .filter(|candidate| year.map_or(true, |y| candidate.station.covers_year(y)));
        Ok(nearest(ranked, station_limit, max_distance_km))
    }

    /// Fetches and decodes the archive file of one station for one year.
    ///
    /// No inventory lookup or fallback is done.
    ///
    /// # Arguments
    ///
    /// * `.usaf(&str)`: **Required.** USAF station id, e.g. `"725090"`.
    /// * `.wban(&str)`: **Required.** WBAN station id, e.g. `"14739"`.
    /// * `.year(i32)`: **Required.** The year of the archive file.
    ///
    /// # Errors
    ///
    /// Returns [`IsdError::Archive`] if the file cannot be fetched and [`IsdError::Decode`] if
    /// it cannot be decoded.
    #[builder]
    pub async fn from_station(
        &self,
        usaf: &str,
        wban: &str,
        year: i32,
    ) -> Result<DecodedArchive, IsdError> {
        let station_id = format!("{}-{}", usaf, wban);
        let raw = self.archive_fetcher.fetch(&station_id, year).await?;
        Ok(decode(&raw, Some(year)).await?)
    }

    async fn cached(&self, key: &ResolveKey) -> Option<Arc<Resolution>> {
        let cached = self.cache.as_ref()?.get(key).await;
        if cached.is_some() {
            info!("Using cached resolution for {:?}", key);
        }
        cached
    }

    async fn store(&self, key: ResolveKey, resolution: Resolution) -> Arc<Resolution> {
        let resolution = Arc::new(resolution);
        match &self.cache {
            Some(cache) => cache.insert(key, resolution).await,
            None => resolution,
        }
    }

    async fn resolve_years(
        &self,
        location: LatLon,
        years: RangeInclusive<i32>,
    ) -> Result<Resolution, ResolutionError> {
        let stations = self
            .directory_loader
            .load(&self.config.directory_url)
            .await?;
        let ranked = rank(&stations, location);
        info!(
            "Ranked {} stations around {} for {}..={}",
            ranked.len(),
            location,
            years.start(),
            years.end()
        );

        let outcomes = join_all(years.map(|year| self.resolve_year(&ranked, year))).await;

        let mut datasets = Vec::new();
        let mut failed_years = Vec::new();
        for outcome in outcomes {
            match outcome {
                Ok(dataset) => datasets.push(dataset),
                Err(failure) => {
                    warn!("{}", failure);
                    failed_years.push(failure);
                }
            }
        }
        Resolution::from_parts(location, datasets, failed_years)
    }

    /// Walks the ranking for one year until a candidate's archive can be decoded.
    async fn resolve_year(
        &self,
        ranked: &[RankedStation],
        year: i32,
    ) -> Result<WeatherDataset, YearFailure> {
        let mut failures: Vec<CandidateFailure> = Vec::new();

        for (rank_index, candidate) in CoverageCandidates::new(ranked, year) {
            if failures.len() >= self.config.max_candidates_per_year {
                warn!(
                    "Giving up on {} after {} failed candidates",
                    year,
                    failures.len()
                );
                break;
            }

            match self.fetch_station_year(&candidate.station, year).await {
                Ok(decoded) => {
                    if !failures.is_empty() {
                        info!(
                            "Using station {} (rank {}) for {} after {} closer stations failed",
                            candidate.station,
                            rank_index,
                            year,
                            failures.len()
                        );
                    }
                    return Ok(WeatherDataset {
                        station: candidate.clone(),
                        rank_index,
                        year,
                        records: decoded.records,
                        skipped_lines: decoded.skipped,
                        duplicates_replaced: decoded.duplicates_replaced,
                        failed_candidates: failures,
                    });
                }
                Err(error) => {
                    warn!(
                        "Station {} has no usable data for {}: {}",
                        candidate.station, year, error
                    );
                    failures.push(CandidateFailure {
                        station: candidate.clone(),
                        rank_index,
                        error,
                    });
                }
            }
        }

        Err(YearFailure {
            year,
            attempts: failures,
        })
    }

    async fn fetch_station_year(
        &self,
        station: &StationRecord,
        year: i32,
    ) -> Result<DecodedArchive, CandidateError> {
        let station_id = station.station_id();
        let raw = self.archive_fetcher.fetch(&station_id, year).await?;
        let decoded = decode(&raw, Some(year)).await?;
        if decoded.records.is_empty() {
            return Err(CandidateError::EmptyArchive {
                url: self.archive_fetcher.archive_url(&station_id, year),
            });
        }
        Ok(decoded)
    }
}

fn check_years(years: &RangeInclusive<i32>) -> Result<(), ResolutionError> {
    if years.start() > years.end() {
        return Err(ResolutionError::InvalidYearRange {
            start: *years.start(),
            end: *years.end(),
        });
    }
    Ok(())
}

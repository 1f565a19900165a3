//! Loading of the ISD station inventory (`isd-history.csv`).
//!
//! The inventory is a quoted CSV file with a header row. Only `USAF`, `WBAN`, `LAT`, `LON` and
//! `END` are required; `BEGIN`, `STATION NAME`, `CTRY`, `STATE`, `ICAO` and `ELEV(M)` are
//! picked up when present.

use crate::stations::error::DirectoryError;
use crate::types::station::{DateRange, StationRecord};
use crate::utils::SourceLocation;
use chrono::NaiveDate;
use futures_util::TryStreamExt;
use log::{info, warn};
use polars::prelude::*;
use reqwest::Client;
use std::path::Path;
use tempfile::NamedTempFile;
use tokio::io::AsyncWriteExt;
use tokio::task;
use tokio_util::io::StreamReader;

const REQUIRED_COLUMNS: [&str; 5] = ["USAF", "WBAN", "LAT", "LON", "END"];
const INVENTORY_DATE_FORMAT: &str = "%Y%m%d";

type ColumnValues<'a> = Vec<Option<&'a str>>;

/// Fetches and parses the station inventory.
///
/// Each call to [`StationDirectoryLoader::load`] performs exactly one fetch; nothing is retried
/// and nothing is kept on disk after the call returns.
#[derive(Debug, Clone)]
pub struct StationDirectoryLoader {
    download_client: Client,
}

impl StationDirectoryLoader {
    pub fn new(download_client: Client) -> Self {
        Self { download_client }
    }

    /// Loads all stations with a usable location from `source`.
    ///
    /// `source` is an `http(s)://` URL, a `file://` URI or a plain path. Rows whose latitude or
    /// longitude is missing or not a number are left out.
    pub async fn load(&self, source: &str) -> Result<Vec<StationRecord>, DirectoryError> {
        match SourceLocation::parse(source) {
            SourceLocation::Remote(url) => {
                let staging = self.download_to_staging(&url).await?;
                // The staging file is deleted when it is dropped at the end of the task,
                // whether parsing succeeded or not.
                task::spawn_blocking(move || parse_directory_file(staging.path(), &url)).await?
            }
            SourceLocation::Local(path) => {
                match tokio::fs::metadata(&path).await {
                    Ok(_) => {}
                    Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                        return Err(DirectoryError::NotFound(path));
                    }
                    Err(e) => return Err(DirectoryError::Io(path, e)),
                }
                task::spawn_blocking(move || {
                    let source_name = path.display().to_string();
                    parse_directory_file(&path, &source_name)
                })
                .await?
            }
        }
    }

    /// Streams the inventory at `url` into a temporary file.
    async fn download_to_staging(&self, url: &str) -> Result<NamedTempFile, DirectoryError> {
        info!("Downloading station inventory from {}", url);
        let response = self
            .download_client
            .get(url)
            .send()
            .await
            .map_err(|e| DirectoryError::NetworkRequest(url.to_string(), e))?;

        let status = response.status();
        if !status.is_success() {
            warn!("HTTP {} for {}", status, url);
            return Err(DirectoryError::HttpStatus {
                url: url.to_string(),
                status,
            });
        }

        let staging = NamedTempFile::new().map_err(DirectoryError::Staging)?;
        let handle = staging.as_file().try_clone().map_err(DirectoryError::Staging)?;
        let mut file = tokio::fs::File::from_std(handle);

        let stream = response
            .bytes_stream()
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e));
        let mut reader = StreamReader::new(stream);
        let written = tokio::io::copy(&mut reader, &mut file)
            .await
            .map_err(DirectoryError::DownloadIo)?;
        file.flush().await.map_err(DirectoryError::DownloadIo)?;

        info!("Downloaded station inventory ({} bytes)", written);
        Ok(staging)
    }
}

/// Parses an inventory CSV file into station records.
pub fn parse_directory_file(
    path: &Path,
    source_name: &str,
) -> Result<Vec<StationRecord>, DirectoryError> {
    let parse_start = std::time::Instant::now();
    // Every column is read as text so that ids keep their leading zeros.
    let df = CsvReadOptions::default()
        .with_has_header(true)
        .with_infer_schema_length(Some(0))
        .try_into_reader_with_file_path(Some(path.to_path_buf()))
        .and_then(|reader| reader.finish())
        .map_err(|e| DirectoryError::CsvParse {
            source_name: source_name.to_string(),
            source: e,
        })?;

    let stations = stations_from_frame(&df, source_name)?;
    info!(
        "Parsed {} stations from {} in {:?}",
        stations.len(),
        source_name,
        parse_start.elapsed()
    );
    Ok(stations)
}

/// Converts an all-text inventory frame into station records.
fn stations_from_frame(
    df: &DataFrame,
    source_name: &str,
) -> Result<Vec<StationRecord>, DirectoryError> {
    for column in REQUIRED_COLUMNS {
        if df.column(column).is_err() {
            return Err(DirectoryError::MissingColumn(column.to_string()));
        }
    }

    let usaf = text_column(df, "USAF", source_name)?;
    let wban = text_column(df, "WBAN", source_name)?;
    let lat = text_column(df, "LAT", source_name)?;
    let lon = text_column(df, "LON", source_name)?;
    let end = text_column(df, "END", source_name)?;
    let begin = text_column(df, "BEGIN", source_name)?;
    let name = text_column(df, "STATION NAME", source_name)?;
    let country = text_column(df, "CTRY", source_name)?;
    let state = text_column(df, "STATE", source_name)?;
    let icao = text_column(df, "ICAO", source_name)?;
    let elevation = text_column(df, "ELEV(M)", source_name)?;

    let mut stations = Vec::with_capacity(df.height());
    let mut dropped = 0usize;

    for row in 0..df.height() {
        let location = (
            cell(&lat, row).and_then(parse_coordinate(90.0)),
            cell(&lon, row).and_then(parse_coordinate(180.0)),
        );
        let ids = (cell(&usaf, row), cell(&wban, row));
        let ((Some(latitude), Some(longitude)), (Some(usaf_id), Some(wban_id))) = (location, ids)
        else {
            dropped += 1;
            continue;
        };

        stations.push(StationRecord {
            usaf_id: usaf_id.to_string(),
            wban_id: wban_id.to_string(),
            name: cell(&name, row).map(str::to_string),
            country: cell(&country, row).map(str::to_string),
            state: cell(&state, row).map(str::to_string),
            icao: cell(&icao, row).map(str::to_string),
            latitude,
            longitude,
            elevation_m: cell(&elevation, row).and_then(|v| v.parse::<f64>().ok()),
            coverage: DateRange {
                start: cell(&begin, row).and_then(parse_inventory_date),
                end: cell(&end, row).and_then(parse_inventory_date),
            },
        });
    }

    if dropped > 0 {
        warn!(
            "Dropped {} of {} inventory rows without a usable id or location",
            dropped,
            df.height()
        );
    }
    Ok(stations)
}

fn text_column<'a>(
    df: &'a DataFrame,
    name: &str,
    source_name: &str,
) -> Result<Option<ColumnValues<'a>>, DirectoryError> {
    let Ok(column) = df.column(name) else {
        return Ok(None);
    };
    let values = column.str().map_err(|e| DirectoryError::CsvParse {
        source_name: source_name.to_string(),
        source: e,
    })?;
    Ok(Some(values.into_iter().collect()))
}

/// Trimmed, non-empty text of a cell; `None` for absent columns.
fn cell<'a>(values: &Option<ColumnValues<'a>>, row: usize) -> Option<&'a str> {
    values
        .as_ref()
        .and_then(|column| column.get(row).copied().flatten())
        .map(str::trim)
        .filter(|value| !value.is_empty())
}

fn parse_coordinate(limit: f64) -> impl Fn(&str) -> Option<f64> {
    move |value| {
        value
            .parse::<f64>()
            .ok()
            .filter(|degrees| degrees.is_finite() && degrees.abs() <= limit)
    }
}

fn parse_inventory_date(value: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(value, INVENTORY_DATE_FORMAT).ok()
}

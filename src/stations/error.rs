use polars::error::PolarsError;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DirectoryError {
    #[error("Network request failed for {0}")]
    NetworkRequest(String, #[source] reqwest::Error),

    #[error("HTTP request failed for {url} with status {status}")]
    HttpStatus {
        url: String,
        status: reqwest::StatusCode,
    },

    // Covers errors while streaming the download into the staging file
    #[error("Station inventory download failed")]
    DownloadIo(#[source] std::io::Error),

    #[error("Failed to create staging file for the station inventory")]
    Staging(#[source] std::io::Error),

    #[error("Station inventory file '{0}' does not exist")]
    NotFound(PathBuf),

    #[error("Failed to access station inventory file '{0}'")]
    Io(PathBuf, #[source] std::io::Error),

    #[error("Failed to parse station inventory '{source_name}'")]
    CsvParse {
        source_name: String,
        #[source]
        source: PolarsError,
    },

    #[error("Station inventory is missing required column '{0}'")]
    MissingColumn(String),

    // Covers errors joining tokio blocking tasks
    #[error("Background task failed to complete")]
    TaskJoin(#[from] tokio::task::JoinError),
}

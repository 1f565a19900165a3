use crate::archive::error::ArchiveError;
use crate::utils::SourceLocation;
use futures_util::TryStreamExt;
use log::{info, warn};
use reqwest::Client;
use tokio::io::AsyncReadExt;
use tokio_util::io::StreamReader;

/// Downloads the compressed per-station, per-year ISD-lite files.
///
/// Files are addressed as `{base_url}/{year}/{station_id}-{year}.gz`. The base can be the NOAA
/// server or a local directory with the same layout. Bytes are kept in memory only.
#[derive(Debug, Clone)]
pub struct ArchiveFetcher {
    base: SourceLocation,
    download_client: Client,
}

impl ArchiveFetcher {
    pub fn new(base_url: &str, download_client: Client) -> Self {
        Self {
            base: SourceLocation::parse(base_url),
            download_client,
        }
    }

    /// Location of the archive file for `station_id` (`"{usaf}-{wban}"`) and `year`.
    pub fn archive_url(&self, station_id: &str, year: i32) -> String {
        let file_name = format!("{}-{}.gz", station_id, year);
        match &self.base {
            SourceLocation::Remote(base) => format!("{}/{}/{}", base, year, file_name),
            SourceLocation::Local(dir) => dir
                .join(year.to_string())
                .join(file_name)
                .display()
                .to_string(),
        }
    }

    /// Fetches the raw (still compressed) archive file.
    ///
    /// A non-success HTTP status or missing local file is [`ArchiveError::NotFound`].
    pub async fn fetch(&self, station_id: &str, year: i32) -> Result<Vec<u8>, ArchiveError> {
        match &self.base {
            SourceLocation::Remote(_) => self.download(station_id, year).await,
            SourceLocation::Local(dir) => {
                let path = dir
                    .join(year.to_string())
                    .join(format!("{}-{}.gz", station_id, year));
                match tokio::fs::read(&path).await {
                    Ok(bytes) => Ok(bytes),
                    Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                        Err(ArchiveError::NotFound {
                            url: path.display().to_string(),
                            status: None,
                        })
                    }
                    Err(e) => Err(ArchiveError::Io(path, e)),
                }
            }
        }
    }

    async fn download(&self, station_id: &str, year: i32) -> Result<Vec<u8>, ArchiveError> {
        let url = self.archive_url(station_id, year);
        info!("Downloading archive from {}", url);

        let response = self
            .download_client
            .get(&url)
            .send()
            .await
            .map_err(|e| transport_error(&url, e))?;

        let status = response.status();
        if !status.is_success() {
            warn!("HTTP {} for {}", status, url);
            return Err(ArchiveError::NotFound {
                url,
                status: Some(status),
            });
        }

        let stream = response
            .bytes_stream()
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e));
        let mut reader = StreamReader::new(stream);
        let mut raw = Vec::new();
        reader
            .read_to_end(&mut raw)
            .await
            .map_err(|e| ArchiveError::Download(url.clone(), e))?;
        info!(
            "Downloaded {} compressed bytes for station {} ({})",
            raw.len(),
            station_id,
            year
        );
        Ok(raw)
    }
}

fn transport_error(url: &str, e: reqwest::Error) -> ArchiveError {
    if e.is_timeout() {
        ArchiveError::Timeout(url.to_string(), e)
    } else {
        ArchiveError::NetworkRequest(url.to_string(), e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::test_server::{serve, Reply};
    use reqwest::StatusCode;
    use std::time::Duration;

    #[test]
    fn test_archive_url_layout() {
        let fetcher = ArchiveFetcher::new(
            "https://www.ncei.noaa.gov/pub/data/noaa/isd-lite/",
            Client::new(),
        );
        assert_eq!(
            fetcher.archive_url("725090-14739", 2023),
            "https://www.ncei.noaa.gov/pub/data/noaa/isd-lite/2023/725090-14739-2023.gz"
        );
    }

    #[tokio::test]
    async fn test_local_mirror_missing_file_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let year_dir = dir.path().join("2020");
        std::fs::create_dir_all(&year_dir).unwrap();
        std::fs::write(year_dir.join("010010-99999-2020.gz"), b"raw").unwrap();

        let fetcher = ArchiveFetcher::new(&dir.path().display().to_string(), Client::new());

        let found = fetcher.fetch("010010-99999", 2020).await.unwrap();
        assert_eq!(found, b"raw");

        let missing = fetcher.fetch("010020-99999", 2020).await.unwrap_err();
        assert!(missing.is_not_found());
    }

    #[tokio::test]
    async fn test_remote_status_mapping() {
        let base = serve(vec![
            ("/isd-lite/2020/010010-99999-2020.gz", Reply::Body(b"compressed".to_vec())),
            ("/isd-lite/2020/010030-99999-2020.gz", Reply::Status(500)),
        ])
        .await;
        let fetcher = ArchiveFetcher::new(&format!("{}/isd-lite/", base), Client::new());

        let found = fetcher.fetch("010010-99999", 2020).await.unwrap();
        assert_eq!(found, b"compressed");

        match fetcher.fetch("010020-99999", 2020).await {
            Err(ArchiveError::NotFound { url, status }) => {
                assert_eq!(status, Some(StatusCode::NOT_FOUND));
                assert!(url.ends_with("/isd-lite/2020/010020-99999-2020.gz"));
            }
            other => panic!("expected NotFound, got {:?}", other),
        }

        let server_error = fetcher.fetch("010030-99999", 2020).await;
        assert!(matches!(
            server_error,
            Err(ArchiveError::NotFound {
                status: Some(StatusCode::INTERNAL_SERVER_ERROR),
                ..
            })
        ));
    }

    #[tokio::test]
    async fn test_remote_timeout_counts_as_not_found() {
        let base = serve(vec![("/2020/010010-99999-2020.gz", Reply::Stall)]).await;
        let client = Client::builder()
            .timeout(Duration::from_millis(200))
            .build()
            .unwrap();
        let fetcher = ArchiveFetcher::new(&base, client);

        let error = fetcher.fetch("010010-99999", 2020).await.unwrap_err();
        assert!(matches!(error, ArchiveError::Timeout(..)));
        assert!(error.is_not_found());
    }

    #[tokio::test]
    #[ignore = "requires network access"]
    async fn test_download_unknown_station_is_not_found() {
        let fetcher = ArchiveFetcher::new(
            "https://www.ncei.noaa.gov/pub/data/noaa/isd-lite",
            Client::new(),
        );
        let result = fetcher.fetch("000000-00000", 2020).await;
        assert!(matches!(result, Err(ArchiveError::NotFound { .. })));
    }
}

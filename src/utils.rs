use crate::config::IsdConfig;
use reqwest::Client;
use std::path::PathBuf;

/// Where the inventory or the archive files are read from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum SourceLocation {
    /// An `http://` or `https://` URL, without trailing slash.
    Remote(String),
    /// A local file or directory (plain path or `file://` URI).
    Local(PathBuf),
}

impl SourceLocation {
    pub fn parse(source: &str) -> Self {
        let trimmed = source.trim();
        if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
            SourceLocation::Remote(trimmed.trim_end_matches('/').to_string())
        } else if let Some(path) = trimmed.strip_prefix("file://") {
            SourceLocation::Local(PathBuf::from(path))
        } else {
            SourceLocation::Local(PathBuf::from(trimmed))
        }
    }
}

pub(crate) fn build_http_client(config: &IsdConfig) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(config.user_agent.as_str())
        .timeout(config.request_timeout)
        .build()
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_source_location() {
        assert_eq!(
            SourceLocation::parse("https://www.ncei.noaa.gov/pub/data/noaa/isd-lite/"),
            SourceLocation::Remote("https://www.ncei.noaa.gov/pub/data/noaa/isd-lite".to_string())
        );
        assert_eq!(
            SourceLocation::parse("file:///data/isd-history.csv"),
            SourceLocation::Local(PathBuf::from("/data/isd-history.csv"))
        );
        assert_eq!(
            SourceLocation::parse("mirror/isd-lite"),
            SourceLocation::Local(PathBuf::from("mirror/isd-lite"))
        );
    }
}

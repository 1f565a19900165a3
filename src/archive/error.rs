use std::path::PathBuf;
use thiserror::Error;

/// Failure to obtain the compressed archive file of one station-year.
///
/// Every variant means "try the next candidate station"; none of them is fatal for a
/// resolution on its own.
#[derive(Debug, Error)]
pub enum ArchiveError {
    #[error("Archive file not found at {url} (status {status:?})")]
    NotFound {
        url: String,
        status: Option<reqwest::StatusCode>,
    },

    #[error("Request for {0} timed out")]
    Timeout(String, #[source] reqwest::Error),

    #[error("Network request failed for {0}")]
    NetworkRequest(String, #[source] reqwest::Error),

    #[error("Archive download from {0} was interrupted")]
    Download(String, #[source] std::io::Error),

    #[error("Failed to read archive file '{0}'")]
    Io(PathBuf, #[source] std::io::Error),
}

impl ArchiveError {
    /// Timeouts are treated the same as a missing file.
    pub fn is_not_found(&self) -> bool {
        matches!(self, ArchiveError::NotFound { .. } | ArchiveError::Timeout(..))
    }
}

/// A whole archive file could not be turned into records.
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("Failed to decompress archive data")]
    Decompress(#[source] std::io::Error),

    #[error("Archive data is not valid UTF-8 text")]
    InvalidText(#[source] std::string::FromUtf8Error),

    #[error("Archive contained {lines} non-empty lines but none could be decoded")]
    NoValidRecords { lines: usize },
}

/// Why a single archive line was skipped.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LineError {
    #[error("line has {found} tokens, at most {expected} are allowed")]
    TooManyTokens { expected: usize, found: usize },

    #[error("line has {found} tokens, the 4 timestamp fields are required")]
    MissingTimestamp { found: usize },

    #[error("token '{token}' in column '{column}' is not an integer")]
    NonNumeric { column: &'static str, token: String },

    #[error("{year:04}-{month:02}-{day:02} {hour:02}:00 is not a valid timestamp")]
    InvalidTimestamp {
        year: i32,
        month: i32,
        day: i32,
        hour: i32,
    },

    #[error("record year {found} does not match the requested year {expected}")]
    OutOfYear { expected: i32, found: i32 },
}

/// Why a candidate station could not serve a requested year.
#[derive(Debug, Error)]
pub enum CandidateError {
    #[error(transparent)]
    Archive(#[from] ArchiveError),

    #[error(transparent)]
    Decode(#[from] DecodeError),

    #[error("Archive file {url} contains no records")]
    EmptyArchive { url: String },
}

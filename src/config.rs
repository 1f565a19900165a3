//! Client configuration.

use bon::Builder;
use std::time::Duration;

/// NOAA's ISD station inventory.
pub const DEFAULT_DIRECTORY_URL: &str = "https://www.ncei.noaa.gov/pub/data/noaa/isd-history.csv";
/// Root of the ISD-lite archive; files live at `{root}/{year}/{usaf}-{wban}-{year}.gz`.
pub const DEFAULT_ARCHIVE_URL: &str = "https://www.ncei.noaa.gov/pub/data/noaa/isd-lite";
/// Public OpenStreetMap Nominatim instance.
pub const DEFAULT_GEOCODER_URL: &str = "https://nominatim.openstreetmap.org";
/// Nominatim's usage policy requires an identifying user agent.
pub const DEFAULT_USER_AGENT: &str = concat!("isd_lite/", env!("CARGO_PKG_VERSION"));

/// Settings for an [`IsdClient`](crate::IsdClient).
///
/// Every field has a default, so `IsdConfig::default()` talks to the public NOAA and
/// OpenStreetMap services. The URLs also accept local paths (or `file://` URIs) of a mirror with
/// the same layout.
///
/// # Examples
///
/// ```
/// use isd_lite::IsdConfig;
/// use std::time::Duration;
///
/// let config = IsdConfig::builder()
///     .archive_base_url("/data/isd-lite")
///     .request_timeout(Duration::from_secs(10))
///     .cache_ttl(Duration::from_secs(600))
///     .build();
/// assert_eq!(config.max_candidates_per_year, usize::MAX);
/// ```
#[derive(Debug, Clone, Builder)]
pub struct IsdConfig {
    /// Where the station inventory CSV is loaded from.
    #[builder(into, default = DEFAULT_DIRECTORY_URL.to_string())]
    pub directory_url: String,

    /// Root of the per-year archive directories.
    #[builder(into, default = DEFAULT_ARCHIVE_URL.to_string())]
    pub archive_base_url: String,

    /// Base URL of the Nominatim-compatible geocoding service.
    #[builder(into, default = DEFAULT_GEOCODER_URL.to_string())]
    pub geocoder_url: String,

    #[builder(into, default = DEFAULT_USER_AGENT.to_string())]
    pub user_agent: String,

    /// Timeout applied to every HTTP request. A timed out archive download counts as missing.
    #[builder(default = Duration::from_secs(30))]
    pub request_timeout: Duration,

    /// How many candidate stations may fail for one year before the year is given up.
    /// By default the whole ranking is walked.
    #[builder(default = usize::MAX)]
    pub max_candidates_per_year: usize,

    /// Keep resolutions in memory for this long. `None` disables the cache.
    pub cache_ttl: Option<Duration>,
}

impl Default for IsdConfig {
    fn default() -> Self {
        Self::builder().build()
    }
}

//! Defines the data structures representing ISD weather stations as listed in the
//! station inventory, including identifiers, location and the period a station reported data.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Represents a geographical coordinate using latitude and longitude.
///
/// Latitude is the first element (index 0), and longitude is the second (index 1).
/// Both values are decimal degrees.
///
/// # Examples
///
/// ```
/// use isd_lite::LatLon;
///
/// let boston = LatLon(42.3601, -71.0589);
/// assert_eq!(boston.0, 42.3601); // Latitude
/// assert_eq!(boston.1, -71.0589); // Longitude
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatLon(pub f64, pub f64);

impl LatLon {
    pub fn latitude(&self) -> f64 {
        self.0
    }

    pub fn longitude(&self) -> f64 {
        self.1
    }
}

impl fmt::Display for LatLon {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({:.4}, {:.4})", self.0, self.1)
    }
}

/// A single row of the ISD station inventory.
///
/// A station is identified by its `(usaf_id, wban_id)` pair. The pair also names the
/// archive files of the station: `"{usaf_id}-{wban_id}-{year}.gz"`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StationRecord {
    /// Air Force station identifier (e.g. "725090").
    pub usaf_id: String,
    /// NCDC Weather Bureau Army Navy identifier (e.g. "14739").
    pub wban_id: String,
    /// Station name as listed in the inventory, if any.
    pub name: Option<String>,
    /// FIPS country code, if any.
    pub country: Option<String>,
    /// US state code, if any.
    pub state: Option<String>,
    /// ICAO airport code, if the station is at an airport.
    pub icao: Option<String>,
    /// Latitude in decimal degrees (positive for North, negative for South).
    pub latitude: f64,
    /// Longitude in decimal degrees (positive for East, negative for West).
    pub longitude: f64,
    /// Elevation above sea level in meters, if available.
    pub elevation_m: Option<f64>,
    /// The period the station reported data, according to the inventory.
    pub coverage: DateRange,
}

impl StationRecord {
    /// The archive station id, `"{usaf_id}-{wban_id}"`.
    pub fn station_id(&self) -> String {
        format!("{}-{}", self.usaf_id, self.wban_id)
    }

    pub fn location(&self) -> LatLon {
        LatLon(self.latitude, self.longitude)
    }

    /// Whether the inventory says this station reported data during `year`.
    ///
    /// Only the end date is checked: a station covers every year up to and including the year
    /// its coverage ends. A station without a known end date never covers a year.
    pub fn covers_year(&self, year: i32) -> bool {
        let (Some(first_day), Some(end)) = (NaiveDate::from_ymd_opt(year, 1, 1), self.coverage.end)
        else {
            return false;
        };
        end >= first_day
    }

    /// Same identity (`usaf_id`, `wban_id`) as `other`.
    pub fn same_station(&self, other: &StationRecord) -> bool {
        self.usaf_id == other.usaf_id && self.wban_id == other.wban_id
    }
}

impl fmt::Display for StationRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.name {
            Some(name) => write!(f, "{} ({})", self.station_id(), name),
            None => write!(f, "{}", self.station_id()),
        }
    }
}

/// Represents a date range with optional start and end dates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DateRange {
    /// The earliest date for which data is reported available, if known.
    pub start: Option<NaiveDate>,
    /// The latest date for which data is reported available, if known.
    pub end: Option<NaiveDate>,
}

/// A [`StationRecord`] together with its distance to a query location.
///
/// Produced by [`crate::rank`]; the list is ordered by `distance_km`, and stations at equal
/// distance keep their inventory order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedStation {
    pub station: StationRecord,
    /// Great-circle distance to the query location in kilometers.
    pub distance_km: f64,
    /// Position of the station in the inventory it was loaded from.
    pub directory_index: usize,
}

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One decoded line of an ISD-lite archive file: the observations of one station for one hour.
///
/// Measurements the station did not report are `None`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObservationRecord {
    /// Observation hour (UTC).
    pub timestamp: DateTime<Utc>,
    /// Air temperature in degrees Celsius.
    pub air_temp_c: Option<f64>,
    /// Dew point temperature in degrees Celsius.
    pub dew_point_c: Option<f64>,
    /// Sea level pressure in kilopascal.
    pub sea_level_pressure_kpa: Option<f64>,
    /// Wind direction in angular degrees from true north.
    pub wind_dir_deg: Option<f64>,
    /// Wind speed in meters per second.
    pub wind_speed_ms: Option<f64>,
    /// Sky condition total coverage code (0-19, see the ISD-lite format document).
    pub sky_cover_code: Option<f64>,
    /// Liquid precipitation depth over one hour, in millimeters.
    pub precip_1h_mm: Option<f64>,
    /// Liquid precipitation depth over six hours, in millimeters.
    pub precip_6h_mm: Option<f64>,
}

impl ObservationRecord {
    /// Whether at least one measurement is present.
    pub fn has_measurements(&self) -> bool {
        [
            self.air_temp_c,
            self.dew_point_c,
            self.sea_level_pressure_kpa,
            self.wind_dir_deg,
            self.wind_speed_ms,
            self.sky_cover_code,
            self.precip_1h_mm,
            self.precip_6h_mm,
        ]
        .iter()
        .any(Option::is_some)
    }
}

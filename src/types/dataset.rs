//! Decoded observations of one station for one year.

use crate::archive::decoder::SkippedLine;
use crate::types::observation::ObservationRecord;
use crate::types::resolution::CandidateFailure;
use crate::types::station::RankedStation;
use chrono::{DateTime, Duration, Timelike, Utc};
use polars::prelude::*;

/// The hourly records one station reported for one year.
///
/// Records are sorted by timestamp, at most one per hour, and all fall within `year`. A dataset
/// produced by a resolution is never empty: a station whose archive holds no records is treated
/// like a station without an archive.
#[derive(Debug)]
pub struct WeatherDataset {
    /// The station the records were decoded for, with its distance to the query location.
    pub station: RankedStation,
    /// Position of `station` in the distance ranking; `0` is the closest station.
    pub rank_index: usize,
    pub year: i32,
    pub records: Vec<ObservationRecord>,
    /// Malformed lines that were left out while decoding.
    pub skipped_lines: Vec<SkippedLine>,
    /// Number of lines that replaced an earlier line for the same hour.
    pub duplicates_replaced: usize,
    /// Closer stations that were tried for this year and failed, in the order they were tried.
    pub failed_candidates: Vec<CandidateFailure>,
}

impl WeatherDataset {
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Whether a farther station had to be used because a closer one could not serve the year.
    pub fn fell_back(&self) -> bool {
        !self.failed_candidates.is_empty()
    }

    /// Records with `start <= timestamp <= end`.
    pub fn get_range(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> &[ObservationRecord] {
        let from = self.records.partition_point(|r| r.timestamp < start);
        let to = self.records.partition_point(|r| r.timestamp <= end);
        if from >= to {
            return &[];
        }
        &self.records[from..to]
    }

    /// The record for the hour closest to `datetime` (>= 30 minutes rounds up).
    pub fn get_at(&self, datetime: DateTime<Utc>) -> Option<&ObservationRecord> {
        let base = if datetime.minute() >= 30 {
            datetime + Duration::hours(1)
        } else {
            datetime
        };
        let hour = base
            .with_minute(0)
            .and_then(|dt| dt.with_second(0))
            .and_then(|dt| dt.with_nanosecond(0))?;
        self.records
            .binary_search_by_key(&hour, |r| r.timestamp)
            .ok()
            .map(|index| &self.records[index])
    }

    /// The records as a Polars `DataFrame`, one row per hour.
    pub fn to_dataframe(&self) -> PolarsResult<DataFrame> {
        observations_frame(std::iter::once(self))
    }
}

/// Builds one frame from the records of several datasets, in iteration order.
pub(crate) fn observations_frame<'a>(
    datasets: impl Iterator<Item = &'a WeatherDataset> + Clone,
) -> PolarsResult<DataFrame> {
    let rows = datasets.clone().map(|d| d.records.len()).sum();
    let mut datetime = Vec::with_capacity(rows);
    let mut usaf = Vec::with_capacity(rows);
    let mut wban = Vec::with_capacity(rows);
    for dataset in datasets.clone() {
        let station = &dataset.station.station;
        for record in &dataset.records {
            datetime.push(record.timestamp.timestamp_millis());
            usaf.push(station.usaf_id.as_str());
            wban.push(station.wban_id.as_str());
        }
    }

    let measurement = |name: &str, get: fn(&ObservationRecord) -> Option<f64>| {
        let values: Vec<Option<f64>> = datasets
            .clone()
            .flat_map(|d| d.records.iter().map(get))
            .collect();
        Column::new(name.into(), values)
    };

    let datetime = Series::new("datetime".into(), datetime)
        .cast(&DataType::Datetime(TimeUnit::Milliseconds, None))?;

    DataFrame::new(vec![
        datetime.into_column(),
        Column::new("usaf".into(), usaf),
        Column::new("wban".into(), wban),
        measurement("air_temp_c", |r| r.air_temp_c),
        measurement("dew_point_c", |r| r.dew_point_c),
        measurement("sea_level_pressure_kpa", |r| r.sea_level_pressure_kpa),
        measurement("wind_dir_deg", |r| r.wind_dir_deg),
        measurement("wind_speed_ms", |r| r.wind_speed_ms),
        measurement("sky_cover_code", |r| r.sky_cover_code),
        measurement("precip_1h_mm", |r| r.precip_1h_mm),
        measurement("precip_6h_mm", |r| r.precip_6h_mm),
    ])
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::types::station::{DateRange, StationRecord};
    use chrono::TimeZone;

    pub(crate) fn ranked_station(usaf: &str, distance_km: f64) -> RankedStation {
        RankedStation {
            station: StationRecord {
                usaf_id: usaf.to_string(),
                wban_id: "99999".to_string(),
                name: None,
                country: None,
                state: None,
                icao: None,
                latitude: 0.0,
                longitude: 0.0,
                elevation_m: None,
                coverage: DateRange::default(),
            },
            distance_km,
            directory_index: 0,
        }
    }

    pub(crate) fn record(year: i32, month: u32, day: u32, hour: u32, temp: f64) -> ObservationRecord {
        ObservationRecord {
            timestamp: Utc.with_ymd_and_hms(year, month, day, hour, 0, 0).unwrap(),
            air_temp_c: Some(temp),
            dew_point_c: None,
            sea_level_pressure_kpa: Some(101.32),
            wind_dir_deg: None,
            wind_speed_ms: None,
            sky_cover_code: None,
            precip_1h_mm: None,
            precip_6h_mm: None,
        }
    }

    pub(crate) fn dataset(year: i32, records: Vec<ObservationRecord>) -> WeatherDataset {
        WeatherDataset {
            station: ranked_station("725090", 3.5),
            rank_index: 0,
            year,
            records,
            skipped_lines: Vec::new(),
            duplicates_replaced: 0,
            failed_candidates: Vec::new(),
        }
    }

    #[test]
    fn test_get_at_rounds_to_nearest_hour() {
        let data = dataset(
            2021,
            vec![record(2021, 5, 20, 14, 10.0), record(2021, 5, 20, 15, 11.0)],
        );
        let down = data.get_at(Utc.with_ymd_and_hms(2021, 5, 20, 14, 25, 0).unwrap());
        assert_eq!(down.and_then(|r| r.air_temp_c), Some(10.0));
        let up = data.get_at(Utc.with_ymd_and_hms(2021, 5, 20, 14, 35, 0).unwrap());
        assert_eq!(up.and_then(|r| r.air_temp_c), Some(11.0));
        assert!(data
            .get_at(Utc.with_ymd_and_hms(2021, 5, 20, 18, 0, 0).unwrap())
            .is_none());
    }

    #[test]
    fn test_get_range_is_inclusive() {
        let data = dataset(
            2021,
            (0..6).map(|h| record(2021, 1, 1, h, h as f64)).collect(),
        );
        let slice = data.get_range(
            Utc.with_ymd_and_hms(2021, 1, 1, 1, 0, 0).unwrap(),
            Utc.with_ymd_and_hms(2021, 1, 1, 3, 0, 0).unwrap(),
        );
        assert_eq!(slice.len(), 3);
        assert_eq!(slice[0].air_temp_c, Some(1.0));

        let inverted = data.get_range(
            Utc.with_ymd_and_hms(2021, 1, 1, 3, 0, 0).unwrap(),
            Utc.with_ymd_and_hms(2021, 1, 1, 1, 0, 0).unwrap(),
        );
        assert!(inverted.is_empty());
    }

    #[test]
    fn test_to_dataframe_schema() -> Result<(), Box<dyn std::error::Error>> {
        let data = dataset(
            2021,
            vec![record(2021, 1, 1, 0, -5.0), record(2021, 1, 1, 1, -4.5)],
        );
        let df = data.to_dataframe()?;
        assert_eq!(df.height(), 2);
        assert_eq!(df.width(), 11);
        assert!(matches!(
            df.column("datetime")?.dtype(),
            DataType::Datetime(TimeUnit::Milliseconds, None)
        ));
        let temps: Vec<Option<f64>> = df.column("air_temp_c")?.f64()?.into_iter().collect();
        assert_eq!(temps, [Some(-5.0), Some(-4.5)]);
        assert_eq!(df.column("dew_point_c")?.null_count(), 2);
        assert_eq!(df.column("usaf")?.str()?.get(0), Some("725090"));
        Ok(())
    }
}

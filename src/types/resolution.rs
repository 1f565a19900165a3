use crate::archive::error::CandidateError;
use crate::error::ResolutionError;
use crate::types::dataset::{observations_frame, WeatherDataset};
use crate::types::observation::ObservationRecord;
use crate::types::station::{LatLon, RankedStation};
use polars::prelude::{DataFrame, PolarsResult};
use thiserror::Error;

/// A candidate station that could not serve a year.
#[derive(Debug, Error)]
#[error("station {} (rank {rank_index}) failed: {error}", .station.station.station_id())]
pub struct CandidateFailure {
    pub station: RankedStation,
    pub rank_index: usize,
    #[source]
    pub error: CandidateError,
}

/// No station in the ranking could provide data for `year`.
#[derive(Debug, Error)]
#[error("no station could provide data for {year} ({} candidates failed)", .attempts.len())]
pub struct YearFailure {
    pub year: i32,
    /// Every candidate that was tried, closest first.
    pub attempts: Vec<CandidateFailure>,
}

/// Weather records for a location over a range of years.
///
/// Each year is served by the closest station that could provide it, so different years may
/// come from different stations. Years no station could serve are listed in `failed_years`.
#[derive(Debug)]
pub struct Resolution {
    /// The location the stations were ranked against.
    pub location: LatLon,
    /// Station of the first year that could be resolved.
    pub station_info: RankedStation,
    /// One dataset per resolved year, in ascending year order.
    pub datasets: Vec<WeatherDataset>,
    /// Years for which every candidate failed, in ascending order.
    pub failed_years: Vec<YearFailure>,
}

impl Resolution {
    /// Assembles per-year outcomes. Fails if no year could be resolved.
    pub fn from_parts(
        location: LatLon,
        datasets: Vec<WeatherDataset>,
        failed_years: Vec<YearFailure>,
    ) -> Result<Self, ResolutionError> {
        let Some(first) = datasets.first() else {
            return Err(ResolutionError::StationExhausted {
                failures: failed_years,
            });
        };
        Ok(Self {
            location,
            station_info: first.station.clone(),
            datasets,
            failed_years,
        })
    }

    /// All records, ascending by timestamp across years.
    pub fn records(&self) -> impl Iterator<Item = &ObservationRecord> {
        self.datasets.iter().flat_map(|d| d.records.iter())
    }

    pub fn record_count(&self) -> usize {
        self.datasets.iter().map(WeatherDataset::len).sum()
    }

    /// Whether every requested year was resolved.
    pub fn is_complete(&self) -> bool {
        self.failed_years.is_empty()
    }

    /// Years served by a different station than `station_info`.
    pub fn substituted_years(&self) -> Vec<i32> {
        self.datasets
            .iter()
            .filter(|d| !d.station.station.same_station(&self.station_info.station))
            .map(|d| d.year)
            .collect()
    }

    /// Years for which a closer station failed before one succeeded.
    pub fn fallback_years(&self) -> Vec<i32> {
        self.datasets
            .iter()
            .filter(|d| d.fell_back())
            .map(|d| d.year)
            .collect()
    }

    /// All records as one frame with a `usaf`/`wban` column per row.
    pub fn to_dataframe(&self) -> PolarsResult<DataFrame> {
        observations_frame(self.datasets.iter())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::archive::error::ArchiveError;
    use crate::types::dataset::tests::{dataset, ranked_station, record};

    fn not_found(usaf: &str, rank_index: usize) -> CandidateFailure {
        CandidateFailure {
            station: ranked_station(usaf, 1.0),
            rank_index,
            error: CandidateError::Archive(ArchiveError::NotFound {
                url: format!("{}-99999-2020.gz", usaf),
                status: None,
            }),
        }
    }

    #[test]
    fn test_from_parts_without_datasets_is_exhausted() {
        let failures = vec![YearFailure {
            year: 2020,
            attempts: vec![not_found("000001", 0)],
        }];
        let result = Resolution::from_parts(LatLon(0.0, 0.0), Vec::new(), failures);
        match result {
            Err(ResolutionError::StationExhausted { failures }) => {
                assert_eq!(failures.len(), 1);
                assert_eq!(failures[0].year, 2020);
            }
            other => panic!("expected StationExhausted, got {:?}", other),
        }
    }

    #[test]
    fn test_substitution_and_fallback_reporting() {
        let first = dataset(2020, vec![record(2020, 12, 31, 23, 1.0)]);
        let mut second = dataset(2021, vec![record(2021, 1, 1, 0, 2.0)]);
        second.station = ranked_station("725095", 20.0);
        second.rank_index = 1;
        second.failed_candidates.push(not_found("725090", 0));

        let resolution = Resolution::from_parts(
            LatLon(42.36, -71.01),
            vec![first, second],
            vec![YearFailure {
                year: 2022,
                attempts: Vec::new(),
            }],
        )
        .unwrap();

        assert_eq!(resolution.station_info.station.usaf_id, "725090");
        assert_eq!(resolution.substituted_years(), [2021]);
        assert_eq!(resolution.fallback_years(), [2021]);
        assert!(!resolution.is_complete());
        assert_eq!(resolution.record_count(), 2);

        let df = resolution.to_dataframe().unwrap();
        assert_eq!(df.height(), 2);
        let usaf: Vec<Option<&str>> = df.column("usaf").unwrap().str().unwrap().into_iter().collect();
        assert_eq!(usaf, [Some("725090"), Some("725095")]);
    }
}

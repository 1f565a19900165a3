//! Decoder for the ISD-lite archive format.
//!
//! An archive file is gzip-compressed ASCII with one observation per line and twelve
//! whitespace separated integer fields:
//!
//! | # | field | unit after scaling |
//! |---|---|---|
//! | 1-4 | year, month, day, hour (UTC) | |
//! | 5 | air temperature | °C (/10) |
//! | 6 | dew point temperature | °C (/10) |
//! | 7 | sea level pressure | kPa (/100) |
//! | 8 | wind direction | degrees |
//! | 9 | wind speed | m/s (/10) |
//! | 10 | sky condition total coverage code | code |
//! | 11 | precipitation, one hour | mm (/10) |
//! | 12 | precipitation, six hours | mm (/10) |
//!
//! `-9999` marks a missing value.

use crate::archive::error::{DecodeError, LineError};
use crate::types::observation::ObservationRecord;
use async_compression::tokio::bufread::GzipDecoder;
use chrono::{DateTime, Datelike, NaiveDate, Utc};
use log::{debug, warn};
use std::collections::btree_map::Entry;
use std::collections::BTreeMap;
use tokio::io::AsyncReadExt;

/// Number of fields in a complete archive line.
pub const FIELD_COUNT: usize = 12;

/// Sentinel used by the archive for "no observation".
pub const MISSING_VALUE: i32 = -9999;

const TIMESTAMP_FIELDS: usize = 4;

const COLUMN_NAMES: [&str; FIELD_COUNT] = [
    "year",
    "month",
    "day",
    "hour",
    "air_temp",
    "dew_point",
    "sea_level_pressure",
    "wind_dir",
    "wind_speed",
    "sky_cover",
    "precip_1h",
    "precip_6h",
];

// Divisors from archive integers to physical units, for the columns after the timestamp.
const DIVISORS: [f64; FIELD_COUNT - TIMESTAMP_FIELDS] =
    [10.0, 10.0, 100.0, 1.0, 10.0, 1.0, 10.0, 10.0];

/// A line that was left out of the decoded records.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedLine {
    /// 1-based line number in the decompressed file.
    pub line_number: usize,
    pub error: LineError,
}

/// The records of one archive file plus what was dropped while decoding it.
#[derive(Debug, Clone, Default)]
pub struct DecodedArchive {
    /// Records sorted by timestamp, at most one per hour.
    pub records: Vec<ObservationRecord>,
    /// Malformed lines that were skipped.
    pub skipped: Vec<SkippedLine>,
    /// Lines whose hour was already present; the later line wins.
    pub duplicates_replaced: usize,
}

/// Decompresses and decodes a raw archive file.
///
/// If `expected_year` is given, lines from other years are skipped.
pub async fn decode(raw: &[u8], expected_year: Option<i32>) -> Result<DecodedArchive, DecodeError> {
    let text = decompress(raw).await?;
    decode_text(&text, expected_year)
}

/// Gunzips `raw` into text.
pub async fn decompress(raw: &[u8]) -> Result<String, DecodeError> {
    let mut decoder = GzipDecoder::new(raw);
    decoder.multiple_members(true);
    let mut decompressed = Vec::with_capacity(raw.len() * 6);
    decoder
        .read_to_end(&mut decompressed)
        .await
        .map_err(DecodeError::Decompress)?;
    String::from_utf8(decompressed).map_err(DecodeError::InvalidText)
}

/// Decodes decompressed archive text.
///
/// Malformed lines are skipped and reported in [`DecodedArchive::skipped`]. Fails only when the
/// text has lines but none of them decodes.
pub fn decode_text(text: &str, expected_year: Option<i32>) -> Result<DecodedArchive, DecodeError> {
    let mut by_hour: BTreeMap<DateTime<Utc>, ObservationRecord> = BTreeMap::new();
    let mut skipped = Vec::new();
    let mut duplicates_replaced = 0;
    let mut non_blank_lines = 0;

    for (index, line) in text.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        non_blank_lines += 1;

        let decoded = decode_line(line).and_then(|record| match expected_year {
            Some(expected) if record.timestamp.year() != expected => Err(LineError::OutOfYear {
                expected,
                found: record.timestamp.year(),
            }),
            _ => Ok(record),
        });

        match decoded {
            Ok(record) => match by_hour.entry(record.timestamp) {
                Entry::Occupied(mut entry) => {
                    duplicates_replaced += 1;
                    entry.insert(record);
                }
                Entry::Vacant(entry) => {
                    entry.insert(record);
                }
            },
            Err(error) => {
                debug!("Skipping archive line {}: {}", index + 1, error);
                skipped.push(SkippedLine {
                    line_number: index + 1,
                    error,
                });
            }
        }
    }

    if non_blank_lines > 0 && by_hour.is_empty() {
        return Err(DecodeError::NoValidRecords {
            lines: non_blank_lines,
        });
    }
    if !skipped.is_empty() {
        warn!(
            "Skipped {} of {} archive lines that could not be decoded",
            skipped.len(),
            non_blank_lines
        );
    }

    Ok(DecodedArchive {
        records: by_hour.into_values().collect(),
        skipped,
        duplicates_replaced,
    })
}

/// Decodes a single archive line.
///
/// Lines shorter than [`FIELD_COUNT`] keep their columns in place: the absent trailing
/// measurements are `None`.
pub fn decode_line(line: &str) -> Result<ObservationRecord, LineError> {
    let tokens: Vec<&str> = line.split_whitespace().collect();
    if tokens.len() > FIELD_COUNT {
        return Err(LineError::TooManyTokens {
            expected: FIELD_COUNT,
            found: tokens.len(),
        });
    }
    if tokens.len() < TIMESTAMP_FIELDS {
        return Err(LineError::MissingTimestamp {
            found: tokens.len(),
        });
    }

    let mut fields = [MISSING_VALUE; FIELD_COUNT];
    for (column, token) in tokens.iter().enumerate() {
        fields[column] = token.parse().map_err(|_| LineError::NonNumeric {
            column: COLUMN_NAMES[column],
            token: token.to_string(),
        })?;
    }

    let timestamp = hour_timestamp(fields[0], fields[1], fields[2], fields[3])?;
    let measurement = |column: usize| -> Option<f64> {
        let raw = fields[column];
        (raw != MISSING_VALUE).then(|| f64::from(raw) / DIVISORS[column - TIMESTAMP_FIELDS])
    };

    Ok(ObservationRecord {
        timestamp,
        air_temp_c: measurement(4),
        dew_point_c: measurement(5),
        sea_level_pressure_kpa: measurement(6),
        wind_dir_deg: measurement(7),
        wind_speed_ms: measurement(8),
        sky_cover_code: measurement(9),
        precip_1h_mm: measurement(10),
        precip_6h_mm: measurement(11),
    })
}

fn hour_timestamp(year: i32, month: i32, day: i32, hour: i32) -> Result<DateTime<Utc>, LineError> {
    let invalid = LineError::InvalidTimestamp {
        year,
        month,
        day,
        hour,
    };
    let (Ok(month_u), Ok(day_u), Ok(hour_u)) =
        (u32::try_from(month), u32::try_from(day), u32::try_from(hour))
    else {
        return Err(invalid);
    };
    NaiveDate::from_ymd_opt(year, month_u, day_u)
        .and_then(|date| date.and_hms_opt(hour_u, 0, 0))
        .map(|naive| DateTime::<Utc>::from_naive_utc_and_offset(naive, Utc))
        .ok_or(invalid)
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_compression::tokio::write::GzipEncoder;
    use chrono::TimeZone;
    use tokio::io::AsyncWriteExt;

    async fn gzip(text: &str) -> Vec<u8> {
        let mut encoder = GzipEncoder::new(Vec::new());
        encoder.write_all(text.as_bytes()).await.unwrap();
        encoder.shutdown().await.unwrap();
        encoder.into_inner()
    }

    #[test]
    fn test_decode_line_scales_and_missing() {
        let record = decode_line("2023 01 01 00 -50 -100 10132 180 50 0 -9999 -9999").unwrap();

        assert_eq!(
            record.timestamp,
            Utc.with_ymd_and_hms(2023, 1, 1, 0, 0, 0).unwrap()
        );
        assert_eq!(record.air_temp_c, Some(-5.0));
        assert_eq!(record.dew_point_c, Some(-10.0));
        assert_eq!(record.sea_level_pressure_kpa, Some(101.32));
        assert_eq!(record.wind_dir_deg, Some(180.0));
        assert_eq!(record.wind_speed_ms, Some(5.0));
        assert_eq!(record.sky_cover_code, Some(0.0));
        assert_eq!(record.precip_1h_mm, None);
        assert_eq!(record.precip_6h_mm, None);
    }

    #[test]
    fn test_missing_temperature_is_none_not_scaled_sentinel() {
        let record = decode_line("2023 07 04 12 -9999 150 10100 90 30 4 0 5").unwrap();
        assert_eq!(record.air_temp_c, None);
        assert_eq!(record.dew_point_c, Some(15.0));
        assert_eq!(record.precip_6h_mm, Some(0.5));
    }

    #[test]
    fn test_short_line_pads_trailing_fields() {
        let record = decode_line("2021 03 10 06 123 45").unwrap();
        assert_eq!(record.air_temp_c, Some(12.3));
        assert_eq!(record.dew_point_c, Some(4.5));
        assert_eq!(record.sea_level_pressure_kpa, None);
        assert_eq!(record.wind_speed_ms, None);
        assert_eq!(record.precip_6h_mm, None);
    }

    #[test]
    fn test_malformed_lines_are_rejected() {
        assert_eq!(
            decode_line("2023 01 01 00 1 2 3 4 5 6 7 8 9"),
            Err(LineError::TooManyTokens {
                expected: 12,
                found: 13
            })
        );
        assert_eq!(
            decode_line("2023 01 01"),
            Err(LineError::MissingTimestamp { found: 3 })
        );
        assert_eq!(
            decode_line("2023 01 01 00 abc -100 10132 180 50 0 0 0"),
            Err(LineError::NonNumeric {
                column: "air_temp",
                token: "abc".to_string()
            })
        );
        assert!(matches!(
            decode_line("2023 02 30 00 0 0 0 0 0 0 0 0"),
            Err(LineError::InvalidTimestamp { .. })
        ));
        assert!(matches!(
            decode_line("2023 01 01 24 0 0 0 0 0 0 0 0"),
            Err(LineError::InvalidTimestamp { .. })
        ));
    }

    #[test]
    fn test_decode_text_skips_and_counts() {
        let text = "\
2022 01 01 00 10 0 10000 0 0 0 0 0
2022 01 01 01 10 0 10000 0 0 0 0 0 99
2022 01 01 02 x 0 10000 0 0 0 0 0

2022 01 01 03 30 0 10000 0 0 0 0 0
";
        let decoded = decode_text(text, Some(2022)).unwrap();
        assert_eq!(decoded.records.len(), 2);
        assert_eq!(decoded.skipped.len(), 2);
        assert_eq!(decoded.skipped[0].line_number, 2);
        assert_eq!(decoded.skipped[1].line_number, 3);
        assert_eq!(decoded.duplicates_replaced, 0);
    }

    #[test]
    fn test_duplicate_hours_last_line_wins() {
        let text = "\
2022 05 01 01 100 0 10000 0 0 0 0 0
2022 05 01 00 10 0 10000 0 0 0 0 0
2022 05 01 01 200 0 10000 0 0 0 0 0
";
        let decoded = decode_text(text, None).unwrap();
        assert_eq!(decoded.duplicates_replaced, 1);
        assert_eq!(decoded.records.len(), 2);
        // Sorted by hour, and the later duplicate replaced the earlier one.
        assert_eq!(decoded.records[0].air_temp_c, Some(1.0));
        assert_eq!(decoded.records[1].air_temp_c, Some(20.0));
    }

    #[test]
    fn test_records_from_other_years_are_skipped() {
        let text = "\
2021 12 31 23 10 0 10000 0 0 0 0 0
2022 01 01 00 20 0 10000 0 0 0 0 0
";
        let decoded = decode_text(text, Some(2022)).unwrap();
        assert_eq!(decoded.records.len(), 1);
        assert_eq!(
            decoded.skipped[0].error,
            LineError::OutOfYear {
                expected: 2022,
                found: 2021
            }
        );
    }

    #[test]
    fn test_file_without_valid_lines_fails() {
        let result = decode_text("garbage line\nmore garbage here\n", None);
        assert!(matches!(
            result,
            Err(DecodeError::NoValidRecords { lines: 2 })
        ));
        assert!(decode_text("", None).unwrap().records.is_empty());
    }

    #[tokio::test]
    async fn test_decode_gzip_archive() {
        let raw = gzip("2023 01 01 00 -50 -100 10132 180 50 0 -9999 -9999\n2023 01 01 01 -40 -90 10130 190 60 2 0 -9999\n").await;
        let decoded = decode(&raw, Some(2023)).await.unwrap();
        assert_eq!(decoded.records.len(), 2);
        assert_eq!(decoded.records[1].air_temp_c, Some(-4.0));
        assert!(decoded.skipped.is_empty());
    }

    #[tokio::test]
    async fn test_decode_rejects_non_gzip_data() {
        let result = decode(b"2023 01 01 00 0 0 0 0 0 0 0 0", None).await;
        assert!(matches!(result, Err(DecodeError::Decompress(_))));
    }
}

//! Decoding Hydrocron responses: the JSON envelope, the embedded CSV and the
//! `time_str` column.

use crate::hydrocron::error::FetchError;
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use polars::prelude::*;
use serde::Deserialize;
use std::io::Cursor;

pub const TIME_COLUMN: &str = "time_str";

const NAIVE_TIME_FORMATS: &[&str] = &["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"];

/// `{"status": ..., "hits": ..., "results": {"csv": "...", "geojson": {}}}`
#[derive(Debug, Deserialize)]
pub struct TimeseriesResponse {
    #[serde(default)]
    pub results: Option<TimeseriesResults>,
}

#[derive(Debug, Deserialize)]
pub struct TimeseriesResults {
    #[serde(default)]
    pub csv: Option<String>,
}

impl TimeseriesResponse {
    pub fn from_slice(reach_id: &str, body: &[u8]) -> Result<Self, FetchError> {
        serde_json::from_slice(body).map_err(|source| FetchError::JsonParse {
            reach_id: reach_id.to_string(),
            source,
        })
    }

    /// The CSV payload, if there is any non-blank text in it.
    pub fn csv(&self) -> Option<&str> {
        self.results
            .as_ref()
            .and_then(|r| r.csv.as_deref())
            .filter(|csv| !csv.trim().is_empty())
    }
}

/// Reads `csv` (with header) into a table and normalises `time_str`.
pub fn parse_timeseries_csv(reach_id: &str, csv: &str) -> Result<DataFrame, FetchError> {
    let csv_err = |source: PolarsError| FetchError::CsvParse {
        reach_id: reach_id.to_string(),
        source,
    };
    let frame = CsvReadOptions::default()
        .with_has_header(true)
        .with_infer_schema_length(None)
        .into_reader_with_file_handle(Cursor::new(csv.as_bytes().to_vec()))
        .finish()
        .map_err(csv_err)?;
    clean_time_column(frame).map_err(csv_err)
}

/// Parses `time_str` into a datetime column and drops rows where it does
/// not parse (Hydrocron writes `no_data` for passes without a time).
/// Frames without the column are returned untouched.
pub fn clean_time_column(frame: DataFrame) -> PolarsResult<DataFrame> {
    if frame.column(TIME_COLUMN).is_err() {
        return Ok(frame);
    }
    let text = frame.column(TIME_COLUMN)?.cast(&DataType::String)?;
    let parsed: Vec<Option<NaiveDateTime>> = text
        .str()?
        .into_iter()
        .map(|value| value.and_then(parse_time))
        .collect();

    let mask: BooleanChunked = parsed.iter().map(Option::is_some).collect();
    let times = DatetimeChunked::from_naive_datetime(
        TIME_COLUMN.into(),
        parsed.into_iter().flatten(),
        TimeUnit::Milliseconds,
    );

    let mut kept = frame.filter(&mask)?;
    kept.with_column(times.into_series())?;
    Ok(kept)
}

fn parse_time(value: &str) -> Option<NaiveDateTime> {
    let value = value.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.naive_utc());
    }
    NAIVE_TIME_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(value, format).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(value, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_csv_from_envelope() -> Result<(), FetchError> {
        let body =
            br#"{"status": "200 OK", "hits": 2, "results": {"csv": "a,b\n1,2\n", "geojson": {}}}"#;
        let response = TimeseriesResponse::from_slice("1", body)?;
        assert_eq!(response.csv(), Some("a,b\n1,2\n"));
        Ok(())
    }

    #[test]
    fn blank_or_missing_csv_is_none() -> Result<(), FetchError> {
        for body in [
            &br#"{"results": {"csv": ""}}"#[..],
            &br#"{"results": {"csv": "  \n"}}"#[..],
            &br#"{"results": {}}"#[..],
            &br#"{"status": "200 OK"}"#[..],
        ] {
            assert_eq!(TimeseriesResponse::from_slice("1", body)?.csv(), None);
        }
        Ok(())
    }

    #[test]
    fn invalid_json_is_reported() {
        assert!(matches!(
            TimeseriesResponse::from_slice("7", b"<html>"),
            Err(FetchError::JsonParse { .. })
        ));
    }

    #[test]
    fn drops_rows_with_unparsable_times() -> Result<(), Box<dyn std::error::Error>> {
        let csv = "reach_id,time_str,wse\n\
                   7,2024-02-11T08:31:12Z,301.5\n\
                   7,no_data,-999999999999.0\n\
                   7,2024-03-01 10:00:00,302.0\n";
        let frame = parse_timeseries_csv("7", csv)?;

        assert_eq!(frame.height(), 2);
        let times = frame.column(TIME_COLUMN)?;
        assert_eq!(
            times.dtype(),
            &DataType::Datetime(TimeUnit::Milliseconds, None)
        );
        let wse = frame.column("wse")?.f64()?;
        assert_eq!(wse.get(0), Some(301.5));
        assert_eq!(wse.get(1), Some(302.0));
        Ok(())
    }

    #[test]
    fn frames_without_time_column_are_untouched() -> Result<(), Box<dyn std::error::Error>> {
        let frame = parse_timeseries_csv("7", "reach_id,wse\n7,1.0\n7,2.0\n")?;
        assert_eq!(frame.height(), 2);
        assert_eq!(frame.get_column_names().len(), 2);
        Ok(())
    }

    #[test]
    fn parses_common_time_forms() {
        assert!(parse_time("2024-02-11T08:31:12Z").is_some());
        assert!(parse_time("2024-02-11T08:31:12.250+00:00").is_some());
        assert!(parse_time("2024-02-11T08:31:12").is_some());
        assert!(parse_time("2024-02-11").is_some());
        assert!(parse_time("no_data").is_none());
        assert!(parse_time("").is_none());
    }
}

//! Request parameters for a single reach timeseries query.

use crate::types::field_catalog::FieldSelection;
use chrono::NaiveDate;

/// Inclusive date range, each bound taken as midnight UTC.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateWindow {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateWindow {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self { start, end }
    }

    pub fn start_param(&self) -> String {
        midnight_utc(self.start)
    }

    pub fn end_param(&self) -> String {
        midnight_utc(self.end)
    }
}

impl Default for DateWindow {
    /// 2023-08-01 to 2025-05-30, the span of the SWOT science orbit data the
    /// tool was first used with.
    fn default() -> Self {
        Self {
            start: NaiveDate::from_ymd_opt(2023, 8, 1).unwrap_or_default(),
            end: NaiveDate::from_ymd_opt(2025, 5, 30).unwrap_or_default(),
        }
    }
}

fn midnight_utc(date: NaiveDate) -> String {
    format!("{}T00:00:00Z", date.format("%Y-%m-%d"))
}

/// One timeseries query: a reach, a window and the fields to return.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchRequest {
    pub reach_id: String,
    pub window: DateWindow,
    pub fields: FieldSelection,
}

impl FetchRequest {
    pub fn new(reach_id: impl Into<String>, window: DateWindow, fields: FieldSelection) -> Self {
        Self {
            reach_id: reach_id.into(),
            window,
            fields,
        }
    }

    /// Query parameters in the order the endpoint documents them.
    pub fn query_pairs(&self) -> Vec<(&'static str, String)> {
        vec![
            ("feature", "Reach".to_string()),
            ("feature_id", self.reach_id.clone()),
            ("start_time", self.window.start_param()),
            ("end_time", self.window.end_param()),
            ("output", "csv".to_string()),
            ("fields", self.fields.to_query_value()),
        ]
    }
}

use crate::output::csv_file::CsvWriteError;
use polars::error::PolarsError;
use std::path::PathBuf;
use thiserror::Error;

/// Why a single reach could not be turned into a table. Never fatal to a run.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("Network request failed for {0}")]
    NetworkRequest(String, #[source] reqwest::Error),

    #[error("HTTP request failed for {url} with status {status}")]
    HttpStatus {
        url: String,
        status: reqwest::StatusCode,
        body: String,
    },

    #[error("Failed to decode JSON response for reach '{reach_id}'")]
    JsonParse {
        reach_id: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Parsing error processing CSV data for reach '{reach_id}'")]
    CsvParse {
        reach_id: String,
        #[source]
        source: PolarsError,
    },

    #[error("Failed to save reach '{reach_id}'")]
    WriteReachFile {
        reach_id: String,
        #[source]
        source: CsvWriteError,
    },
}

/// Failures that stop a run before or between reaches.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Failed to create output directory '{0}'")]
    OutputDirCreation(PathBuf, #[source] std::io::Error),

    #[error("Failed to open error log '{0}'")]
    ErrorLogOpen(PathBuf, #[source] std::io::Error),
}

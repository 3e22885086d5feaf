use polars::error::PolarsError;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LoadReachesError {
    #[error("No .shp file found in upload")]
    MissingGeometryFile,

    #[error("Error loading shapefile '{path}': {message}")]
    ShapefileParse { path: PathBuf, message: String },

    #[error("Shapefile has no '{0}' column")]
    MissingIdColumn(String),

    #[error("Uploaded file name '{0}' is not a plain file name")]
    InvalidUploadName(String),

    #[error("Failed to create temporary upload directory")]
    TempDir(#[source] std::io::Error),

    #[error("Failed to write uploaded file '{0}'")]
    WriteUpload(PathBuf, #[source] std::io::Error),

    #[error("Failed to scan upload directory '{0}'")]
    ScanUpload(PathBuf, #[source] std::io::Error),

    #[error("Failed to build reach table from '{path}'")]
    Table {
        path: PathBuf,
        #[source]
        source: PolarsError,
    },

    #[error("Background task failed to complete")]
    TaskJoin(#[from] tokio::task::JoinError),
}

#[derive(Debug, Error)]
pub enum FilterError {
    #[error("Column '{0}' not found in reach dataset")]
    UnknownColumn(String),

    #[error("Failed evaluating filter on column '{column}'")]
    Polars {
        column: String,
        #[source]
        source: PolarsError,
    },
}

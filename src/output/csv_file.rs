use polars::prelude::*;
use std::path::PathBuf;
use thiserror::Error;
use tokio::task;

#[derive(Debug, Error)]
pub enum CsvWriteError {
    #[error("I/O error writing CSV file '{0}'")]
    Io(PathBuf, #[source] std::io::Error),

    #[error("Encoding error writing CSV file '{0}'")]
    Encode(PathBuf, #[source] PolarsError),

    #[error("Background task failed to complete")]
    TaskJoin(#[from] tokio::task::JoinError),
}

/// Writes `frame` with a header row to `path`, replacing any existing file,
/// and hands the frame back.
pub async fn write_csv(mut frame: DataFrame, path: PathBuf) -> Result<DataFrame, CsvWriteError> {
    task::spawn_blocking(move || {
        let file = std::fs::File::create(&path).map_err(|e| CsvWriteError::Io(path.clone(), e))?;
        CsvWriter::new(file)
            .include_header(true)
            .finish(&mut frame)
            .map_err(|e| CsvWriteError::Encode(path, e))?;
        Ok::<DataFrame, CsvWriteError>(frame)
    })
    .await?
}

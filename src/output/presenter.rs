//! Merging per-reach tables into the single downloadable result.

use crate::output::csv_file::{write_csv, CsvWriteError};
use crate::output::run_directory::RunDirectory;
use log::{info, warn};
use polars::prelude::*;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PresentError {
    #[error("Failed to concatenate reach tables")]
    Concat(#[source] PolarsError),

    #[error("Failed to write combined result")]
    WriteCombined(#[source] CsvWriteError),

    #[error("Failed to read combined result '{0}'")]
    ReadCombined(PathBuf, #[source] std::io::Error),
}

/// The merged table of a run and where it was saved.
#[derive(Debug, Clone)]
pub struct CombinedResult {
    pub path: PathBuf,
    pub frame: DataFrame,
}

impl CombinedResult {
    pub fn rows(&self) -> usize {
        self.frame.height()
    }

    /// Name to offer the file under when downloading.
    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default()
    }

    /// The saved CSV, byte for byte.
    pub async fn read_bytes(&self) -> Result<Vec<u8>, PresentError> {
        tokio::fs::read(&self.path)
            .await
            .map_err(|e| PresentError::ReadCombined(self.path.clone(), e))
    }
}

#[derive(Debug)]
pub enum Presentation {
    Combined(CombinedResult),
    /// No reach produced data; nothing was written.
    NoData,
}

pub struct ResultPresenter;

impl ResultPresenter {
    /// Stacks `tables` in the given order, keeping row order within each.
    /// Columns missing from some tables are filled with nulls, and columns
    /// whose types differ between reaches are widened to a common type.
    pub fn combine(tables: &[DataFrame]) -> PolarsResult<Option<DataFrame>> {
        if tables.is_empty() {
            return Ok(None);
        }
        let frames: Vec<LazyFrame> = tables.iter().map(|t| t.clone().lazy()).collect();
        let combined = concat_lf_diagonal(
            frames,
            UnionArgs {
                rechunk: true,
                to_supertypes: true,
                ..Default::default()
            },
        )?
        .collect()?;
        Ok(Some(combined))
    }

    /// Combines and writes `tables` to the run's combined file.
    pub async fn present(
        tables: &[DataFrame],
        run_dir: &RunDirectory,
    ) -> Result<Presentation, PresentError> {
        let Some(frame) = Self::combine(tables).map_err(PresentError::Concat)? else {
            warn!("No data retrieved.");
            return Ok(Presentation::NoData);
        };

        let path = run_dir.combined_file();
        let frame = write_csv(frame, path.clone())
            .await
            .map_err(PresentError::WriteCombined)?;
        info!("Wrote {} combined rows to {}", frame.height(), path.display());
        Ok(Presentation::Combined(CombinedResult { path, frame }))
    }
}

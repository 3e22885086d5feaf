//! Where a run writes its files.
//!
//! ```text
//! <output_root>/swot_<label>_output/
//!     logger.txt
//!     reach_<reach_id>.csv
//!     combined_<label>.csv
//! ```
//!
//! `<label>` is the filter value passed through
//! [`sanitize_component`](crate::utils::sanitize_component).

use crate::hydrocron::error::PipelineError;
use crate::utils::{ensure_dir_exists, sanitize_component};
use std::path::{Path, PathBuf};

const ERROR_LOG_NAME: &str = "logger.txt";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunDirectory {
    root: PathBuf,
    label: String,
}

impl RunDirectory {
    pub fn for_filter_value(output_root: &Path, value: &str) -> Self {
        Self {
            root: output_root.to_path_buf(),
            label: sanitize_component(value),
        }
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn path(&self) -> PathBuf {
        self.root.join(format!("swot_{}_output", self.label))
    }

    pub fn error_log_path(&self) -> PathBuf {
        self.path().join(ERROR_LOG_NAME)
    }

    pub fn reach_file(&self, reach_id: &str) -> PathBuf {
        self.path()
            .join(format!("reach_{}.csv", sanitize_component(reach_id)))
    }

    pub fn combined_file(&self) -> PathBuf {
        self.path().join(format!("combined_{}.csv", self.label))
    }

    /// Creates the directory if needed. An existing one is reused as is.
    pub async fn create(&self) -> Result<(), PipelineError> {
        let path = self.path();
        ensure_dir_exists(&path)
            .await
            .map_err(|e| PipelineError::OutputDirCreation(path, e))
    }
}

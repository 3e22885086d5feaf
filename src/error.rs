use crate::config::ConfigError;
use crate::hydrocron::error::PipelineError;
use crate::output::presenter::PresentError;
use crate::reaches::error::{FilterError, LoadReachesError};
use crate::types::field_catalog::FieldError;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SwordError {
    #[error(transparent)]
    LoadReaches(#[from] LoadReachesError),

    #[error(transparent)]
    Filter(#[from] FilterError),

    #[error(transparent)]
    Field(#[from] FieldError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Pipeline(#[from] PipelineError),

    #[error(transparent)]
    Present(#[from] PresentError),

    #[error("No reach IDs for '{value}' in column '{column}'")]
    EmptyFilterResult { column: String, value: String },

    #[error("No reach dataset loaded, upload a SWORD shapefile first")]
    NoDatasetLoaded,

    #[error("Failed to build HTTP client")]
    ClientBuild(#[source] reqwest::Error),

    #[error("Failed to read input file '{0}'")]
    ReadInput(PathBuf, #[source] std::io::Error),
}

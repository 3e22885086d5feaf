mod app_state;
mod config;
mod error;
mod explorer;
mod hydrocron;
mod output;
mod reaches;
mod types;
mod utils;

#[cfg(test)]
mod test_support;

pub use app_state::*;
pub use config::*;
pub use error::SwordError;
pub use explorer::*;

pub use hydrocron::client::{HydrocronClient, RawResponse};
pub use hydrocron::pipeline::{ErrorLog, FetchPipeline, RunOutput, RunPlan};
pub use hydrocron::retry::{RateLimitPolicy, RetryDecision};

pub use output::presenter::{CombinedResult, Presentation, ResultPresenter};
pub use output::run_directory::RunDirectory;

pub use reaches::filter::{distinct_values, FilterSelection};
pub use reaches::loader::{bundle_parts, is_bundle_part, ShapefileLoader, UploadedFile};

pub use types::fetch_request::*;
pub use types::field_catalog::*;
pub use types::outcome::*;
pub use types::reach_dataset::*;

pub use utils::sanitize_component;

pub use hydrocron::error::{FetchError, PipelineError};
pub use output::csv_file::CsvWriteError;
pub use output::presenter::PresentError;
pub use reaches::error::{FilterError, LoadReachesError};

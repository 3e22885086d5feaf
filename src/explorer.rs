//! The entry point tying reach loading, filtering, fetching and presentation
//! together.

use crate::app_state::{AppState, LoadStatus};
use crate::config::{FetchConfig, ThrottleDelay};
use crate::error::SwordError;
use crate::hydrocron::client::HydrocronClient;
use crate::hydrocron::pipeline::{FetchPipeline, RunPlan};
use crate::output::presenter::{Presentation, ResultPresenter};
use crate::output::run_directory::RunDirectory;
use crate::reaches::filter::{distinct_values, FilterSelection};
use crate::reaches::loader::{ShapefileLoader, UploadedFile};
use crate::types::fetch_request::DateWindow;
use crate::types::field_catalog::{FieldError, FieldSelection};
use crate::types::outcome::{RunProgress, RunSummary};
use crate::types::reach_dataset::ReachDataset;
use bon::Builder;
use log::{info, warn};
use std::path::PathBuf;

/// What to fetch in one run: every reach whose `column` equals `value`.
///
/// # Examples
///
/// ```
/// use swordxplorer::{ProcessRequest, ThrottleDelay};
///
/// let request = ProcessRequest::builder()
///     .column("river_name")
///     .value("Congo")
///     .delay(ThrottleDelay::from_secs(1.0).unwrap())
///     .build();
/// assert_eq!(request.delay.as_secs(), 1.0);
/// assert!(request.fields.is_none());
/// ```
#[derive(Debug, Clone, Builder)]
pub struct ProcessRequest {
    #[builder(into)]
    pub column: String,

    #[builder(into)]
    pub value: String,

    #[builder(default)]
    pub window: DateWindow,

    #[builder(default)]
    pub delay: ThrottleDelay,

    /// Overrides the fields selected in the [`AppState`].
    pub fields: Option<FieldSelection>,
}

/// Result of a finished run.
#[derive(Debug)]
pub struct ProcessReport {
    pub output_dir: PathBuf,
    pub summary: RunSummary,
    pub presentation: Presentation,
}

/// Client for exploring SWORD reaches and downloading their SWOT time series.
///
/// # Examples
///
/// ```no_run
/// # use swordxplorer::{AppState, ProcessRequest, SwordError, SwordXplorer, UploadedFile};
/// # async fn run() -> Result<(), SwordError> {
/// let explorer = SwordXplorer::new()?;
/// let mut state = AppState::new();
///
/// let files = vec![
///     UploadedFile::new("af_sword_reaches.shp", std::fs::read("af_sword_reaches.shp").unwrap()),
///     UploadedFile::new("af_sword_reaches.dbf", std::fs::read("af_sword_reaches.dbf").unwrap()),
/// ];
/// explorer.load_upload(&mut state, &files).await?;
///
/// let request = ProcessRequest::builder().column("river_name").value("Congo").build();
/// let report = explorer
///     .process(&state, &request, |p| println!("{}/{} {}", p.position, p.total, p.reach_id))
///     .await?;
/// println!("{} errors", report.summary.errors());
/// # Ok(())
/// # }
/// ```
pub struct SwordXplorer {
    client: HydrocronClient,
    loader: ShapefileLoader,
    config: FetchConfig,
}

impl SwordXplorer {
    /// Client against the public Hydrocron API, writing runs to the current directory.
    pub fn new() -> Result<Self, SwordError> {
        Self::with_config(FetchConfig::default())
    }

    pub fn with_config(config: FetchConfig) -> Result<Self, SwordError> {
        let client = HydrocronClient::new(&config).map_err(SwordError::ClientBuild)?;
        Ok(Self {
            client,
            loader: ShapefileLoader::new(),
            config,
        })
    }

    pub fn config(&self) -> &FetchConfig {
        &self.config
    }

    /// Loads an uploaded SWORD bundle into `state`, skipping it if unchanged.
    pub async fn load_upload(
        &self,
        state: &mut AppState,
        files: &[UploadedFile],
    ) -> Result<LoadStatus, SwordError> {
        let status = state.load_upload(&self.loader, files).await?;
        if let LoadStatus::Loaded { reaches } = status {
            info!("Shapefile loaded successfully with {} reaches", reaches);
        }
        Ok(status)
    }

    /// Column names of the loaded reaches, for picking the filter column.
    pub fn columns(&self, state: &AppState) -> Result<Vec<String>, SwordError> {
        Ok(loaded(state)?.columns())
    }

    /// Distinct values of `column`, for picking the filter value.
    pub fn filter_values(&self, state: &AppState, column: &str) -> Result<Vec<String>, SwordError> {
        Ok(distinct_values(loaded(state)?, column)?)
    }

    /// Fetches every reach matched by `request` and merges the results.
    ///
    /// Nothing is requested and no directory is created when no dataset is
    /// loaded, no field is selected, or the filter matches no reach.
    /// Per-reach failures never abort the run; they are reported in the
    /// returned [`RunSummary`].
    pub async fn process<F>(
        &self,
        state: &AppState,
        request: &ProcessRequest,
        on_progress: F,
    ) -> Result<ProcessReport, SwordError>
    where
        F: FnMut(&RunProgress<'_>),
    {
        let dataset = loaded(state)?;
        let fields = request
            .fields
            .clone()
            .unwrap_or_else(|| state.selected_fields().clone());
        if fields.is_empty() {
            return Err(FieldError::NoFieldsSelected.into());
        }

        let selection = FilterSelection::apply(dataset, &request.column, &request.value)?;
        if selection.is_empty() {
            warn!(
                "No reach IDs found for '{}' in column '{}'",
                request.value, request.column
            );
            return Err(SwordError::EmptyFilterResult {
                column: request.column.clone(),
                value: request.value.clone(),
            });
        }

        let run_dir = RunDirectory::for_filter_value(&self.config.output_root, &request.value);
        let plan = RunPlan {
            reach_ids: selection.reach_ids,
            window: request.window,
            fields,
            delay: request.delay,
        };
        let output = FetchPipeline::new(&self.client)
            .run(&plan, &run_dir, on_progress)
            .await?;
        let presentation = ResultPresenter::present(&output.tables, &run_dir).await?;

        Ok(ProcessReport {
            output_dir: run_dir.path(),
            summary: output.summary,
            presentation,
        })
    }
}

fn loaded(state: &AppState) -> Result<&ReachDataset, SwordError> {
    state
        .dataset()
        .map(|dataset| dataset.as_ref())
        .ok_or(SwordError::NoDatasetLoaded)
}

//! The sequential per-reach download loop.
//!
//! Reaches are fetched one after another, never overlapping. Each reach ends
//! in exactly one [`ReachOutcome`]; a failing reach is logged, counted and
//! skipped, it does not stop the run. After every reach, whatever happened,
//! the loop sleeps for the run's [`ThrottleDelay`], so two consecutive
//! request starts are always at least one delay apart.

use crate::config::ThrottleDelay;
use crate::hydrocron::client::HydrocronClient;
use crate::hydrocron::error::{FetchError, PipelineError};
use crate::hydrocron::payload::{parse_timeseries_csv, TimeseriesResponse};
use crate::output::csv_file::write_csv;
use crate::output::run_directory::RunDirectory;
use crate::types::fetch_request::{DateWindow, FetchRequest};
use crate::types::field_catalog::FieldSelection;
use crate::types::outcome::{ReachOutcome, ReachReport, RunProgress, RunSummary};
use chrono::{SecondsFormat, Utc};
use log::{error, info, warn};
use polars::frame::DataFrame;
use reqwest::StatusCode;
use std::path::{Path, PathBuf};
use tokio::fs::OpenOptions;
use tokio::io::AsyncWriteExt;

/// Append-only record of reaches the API rejected with 400.
///
/// Each line is `<RFC 3339 UTC timestamp> - <reach_id>`.
#[derive(Debug, Clone)]
pub struct ErrorLog {
    path: PathBuf,
}

impl ErrorLog {
    /// Opens (creating if needed) the log without truncating it.
    pub async fn open(path: PathBuf) -> Result<Self, PipelineError> {
        OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .await
            .map_err(|e| PipelineError::ErrorLogOpen(path.clone(), e))?;
        Ok(Self { path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub async fn record(&self, reach_id: &str) -> std::io::Result<()> {
        let line = format!(
            "{} - {}\n",
            Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true),
            reach_id
        );
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await?;
        file.write_all(line.as_bytes()).await?;
        file.flush().await
    }
}

/// Everything one run needs besides the client and the output location.
#[derive(Debug, Clone)]
pub struct RunPlan {
    /// Processed in order; duplicates are fetched again.
    pub reach_ids: Vec<String>,
    pub window: DateWindow,
    pub fields: FieldSelection,
    pub delay: ThrottleDelay,
}

#[derive(Debug, Default)]
pub struct RunOutput {
    pub summary: RunSummary,
    /// Successful tables, in processing order.
    pub tables: Vec<DataFrame>,
}

pub struct FetchPipeline<'a> {
    client: &'a HydrocronClient,
}

impl<'a> FetchPipeline<'a> {
    pub fn new(client: &'a HydrocronClient) -> Self {
        Self { client }
    }

    /// Runs `plan` to completion, calling `on_progress` after each reach.
    ///
    /// # Errors
    ///
    /// Only environment failures before the first request: the output
    /// directory or the error log cannot be created.
    pub async fn run<F>(
        &self,
        plan: &RunPlan,
        run_dir: &RunDirectory,
        mut on_progress: F,
    ) -> Result<RunOutput, PipelineError>
    where
        F: FnMut(&RunProgress<'_>),
    {
        run_dir.create().await?;
        let error_log = ErrorLog::open(run_dir.error_log_path()).await?;
        let total = plan.reach_ids.len();
        info!(
            "Processing {} reaches into {}",
            total,
            run_dir.path().display()
        );

        let mut output = RunOutput::default();
        for (index, reach_id) in plan.reach_ids.iter().enumerate() {
            let request = FetchRequest::new(reach_id.clone(), plan.window, plan.fields.clone());
            let outcome = match self.process_reach(&request, run_dir, &error_log).await {
                Ok((outcome, table)) => {
                    output.tables.extend(table);
                    outcome
                }
                Err(e) => {
                    error!("Error with reach {}: {}", reach_id, e);
                    ReachOutcome::Failed(e)
                }
            };

            on_progress(&RunProgress {
                position: index + 1,
                total,
                reach_id,
                outcome: &outcome,
            });
            output.summary.reports.push(ReachReport {
                reach_id: reach_id.clone(),
                outcome,
            });

            tokio::time::sleep(plan.delay.duration()).await;
        }

        info!(
            "Processed {} reaches with {} errors",
            output.summary.successes(),
            output.summary.errors()
        );
        Ok(output)
    }

    async fn process_reach(
        &self,
        request: &FetchRequest,
        run_dir: &RunDirectory,
        error_log: &ErrorLog,
    ) -> Result<(ReachOutcome, Option<DataFrame>), FetchError> {
        let reach_id = request.reach_id.as_str();
        let response = self.client.fetch(request).await?;

        if response.status == StatusCode::BAD_REQUEST {
            let message = response.text();
            warn!("Bad request for reach {}: {}", reach_id, message);
            if let Err(e) = error_log.record(reach_id).await {
                error!(
                    "Failed to append reach {} to {}: {}",
                    reach_id,
                    error_log.path().display(),
                    e
                );
            }
            return Ok((ReachOutcome::NotFound { message }, None));
        }

        if !response.status.is_success() {
            let body = response.text();
            return Err(FetchError::HttpStatus {
                url: response.url,
                status: response.status,
                body,
            });
        }

        let envelope = TimeseriesResponse::from_slice(reach_id, &response.body)?;
        let Some(csv) = envelope.csv() else {
            warn!("No data for reach {}", reach_id);
            return Ok((ReachOutcome::Empty, None));
        };
        let table = parse_timeseries_csv(reach_id, csv)?;
        if table.height() == 0 {
            warn!("No usable rows for reach {}", reach_id);
            return Ok((ReachOutcome::Empty, None));
        }

        let path = run_dir.reach_file(reach_id);
        let table = write_csv(table, path.clone())
            .await
            .map_err(|source| FetchError::WriteReachFile {
                reach_id: reach_id.to_string(),
                source,
            })?;
        info!("Saved {} rows for reach {}", table.height(), reach_id);
        Ok((
            ReachOutcome::Success {
                rows: table.height(),
                path,
            },
            Some(table),
        ))
    }
}

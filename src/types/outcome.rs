//! Per-reach outcomes of a fetch run and the summary built from them.

use crate::hydrocron::error::FetchError;
use std::fmt;
use std::path::PathBuf;

/// The single terminal result of processing one reach in a run.
#[derive(Debug)]
pub enum ReachOutcome {
    /// Parsed, non-empty data was written to `path`.
    Success { rows: usize, path: PathBuf },
    /// The API answered 400; the reach was appended to the error log.
    NotFound { message: String },
    /// The API answered successfully but without CSV content.
    Empty,
    /// Transport failure, unexpected status, or an unreadable payload.
    Failed(FetchError),
}

impl ReachOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, ReachOutcome::Success { .. })
    }
}

impl fmt::Display for ReachOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReachOutcome::Success { rows, path } => {
                write!(f, "{} rows saved to {}", rows, path.display())
            }
            ReachOutcome::NotFound { message } => write!(f, "bad request: {}", message),
            ReachOutcome::Empty => write!(f, "no data"),
            ReachOutcome::Failed(e) => write!(f, "error: {}", e),
        }
    }
}

#[derive(Debug)]
pub struct ReachReport {
    pub reach_id: String,
    pub outcome: ReachOutcome,
}

/// Tally of a finished run, in processing order.
#[derive(Debug, Default)]
pub struct RunSummary {
    pub reports: Vec<ReachReport>,
}

impl RunSummary {
    pub fn total(&self) -> usize {
        self.reports.len()
    }

    pub fn successes(&self) -> usize {
        self.reports.iter().filter(|r| r.outcome.is_success()).count()
    }

    /// Every non-success counts as one error.
    pub fn errors(&self) -> usize {
        self.total() - self.successes()
    }

    pub fn not_found(&self) -> impl Iterator<Item = &str> {
        self.reports.iter().filter_map(|r| match r.outcome {
            ReachOutcome::NotFound { .. } => Some(r.reach_id.as_str()),
            _ => None,
        })
    }
}

/// Emitted once per reach, after its outcome is known.
#[derive(Debug, Clone, Copy)]
pub struct RunProgress<'a> {
    /// 1-based position of the reach in the run.
    pub position: usize,
    pub total: usize,
    pub reach_id: &'a str,
    pub outcome: &'a ReachOutcome,
}

impl RunProgress<'_> {
    pub fn fraction(&self) -> f64 {
        if self.total == 0 {
            return 1.0;
        }
        self.position as f64 / self.total as f64
    }
}

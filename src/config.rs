//! Settings for talking to Hydrocron and for where run output goes.

use bon::Builder;
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

pub const HYDROCRON_TIMESERIES_URL: &str =
    "https://soto.podaac.earthdatacloud.nasa.gov/hydrocron/v1/timeseries";

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("Request delay {0}s is outside the allowed range [0.1, 2.0] seconds")]
    DelayOutOfRange(f64),
}

/// Pause taken after every reach, whatever its outcome.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ThrottleDelay(f64);

impl ThrottleDelay {
    pub const MIN_SECS: f64 = 0.1;
    pub const MAX_SECS: f64 = 2.0;

    pub fn from_secs(secs: f64) -> Result<Self, ConfigError> {
        if !(Self::MIN_SECS..=Self::MAX_SECS).contains(&secs) {
            return Err(ConfigError::DelayOutOfRange(secs));
        }
        Ok(Self(secs))
    }

    pub fn as_secs(&self) -> f64 {
        self.0
    }

    pub fn duration(&self) -> Duration {
        Duration::from_secs_f64(self.0)
    }
}

impl Default for ThrottleDelay {
    fn default() -> Self {
        Self(0.5)
    }
}

impl fmt::Display for ThrottleDelay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}s", self.0)
    }
}

/// Client and output settings.
///
/// ```
/// use swordxplorer::FetchConfig;
/// use std::time::Duration;
///
/// let config = FetchConfig::builder()
///     .base_url("http://localhost:8080/timeseries".to_string())
///     .request_timeout(Duration::from_secs(5))
///     .build();
/// assert_eq!(config.max_rate_limit_retries, 1);
/// ```
#[derive(Debug, Clone, Builder)]
pub struct FetchConfig {
    #[builder(default = HYDROCRON_TIMESERIES_URL.to_string())]
    pub base_url: String,

    #[builder(default = Duration::from_secs(30))]
    pub request_timeout: Duration,

    /// Used when a 429 carries no usable `Retry-After`.
    #[builder(default = Duration::from_secs(10))]
    pub default_retry_after: Duration,

    #[builder(default = 1)]
    pub max_rate_limit_retries: u32,

    /// Directory the `swot_<value>_output` run directories are created in.
    #[builder(default = PathBuf::from("."))]
    pub output_root: PathBuf,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self::builder().build()
    }
}

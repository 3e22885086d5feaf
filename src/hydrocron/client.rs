use crate::config::FetchConfig;
use crate::hydrocron::error::FetchError;
use crate::hydrocron::retry::{RateLimitPolicy, RetryDecision};
use crate::types::fetch_request::FetchRequest;
use log::{debug, info, warn};
use reqwest::header::RETRY_AFTER;
use reqwest::{Client, Response, StatusCode};

/// A response after the rate-limit policy is done with it.
#[derive(Debug, Clone)]
pub struct RawResponse {
    pub url: String,
    pub status: StatusCode,
    pub body: Vec<u8>,
}

impl RawResponse {
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

/// Thin wrapper over `reqwest` for the Hydrocron timeseries endpoint.
pub struct HydrocronClient {
    http: Client,
    base_url: String,
    policy: RateLimitPolicy,
}

impl HydrocronClient {
    pub fn new(config: &FetchConfig) -> Result<Self, reqwest::Error> {
        let http = Client::builder().timeout(config.request_timeout).build()?;
        Ok(Self {
            http,
            base_url: config.base_url.clone(),
            policy: RateLimitPolicy {
                max_retries: config.max_rate_limit_retries,
                default_wait: config.default_retry_after,
            },
        })
    }

    /// Issues `request`, sleeping and retrying on 429 as the policy allows.
    ///
    /// Any status is returned as `Ok`; only transport failures (connect,
    /// timeout, body read) are errors here.
    pub async fn fetch(&self, request: &FetchRequest) -> Result<RawResponse, FetchError> {
        let mut retries = 0;
        loop {
            let response = self.send(request).await?;
            let status = response.status();
            match self
                .policy
                .decide(status, retries, response.headers().get(RETRY_AFTER))
            {
                RetryDecision::RetryAfter(wait) => {
                    warn!(
                        "Rate limited on reach {}, retrying in {}s...",
                        request.reach_id,
                        wait.as_secs()
                    );
                    tokio::time::sleep(wait).await;
                    retries += 1;
                }
                RetryDecision::Proceed => {
                    let url = response.url().to_string();
                    let body = response
                        .bytes()
                        .await
                        .map_err(|e| FetchError::NetworkRequest(url.clone(), e))?;
                    debug!("{} answered {} ({} bytes)", url, status, body.len());
                    return Ok(RawResponse {
                        url,
                        status,
                        body: body.to_vec(),
                    });
                }
            }
        }
    }

    async fn send(&self, request: &FetchRequest) -> Result<Response, FetchError> {
        let http_request = self
            .http
            .get(&self.base_url)
            .query(&request.query_pairs())
            .build()
            .map_err(|e| FetchError::NetworkRequest(self.base_url.clone(), e))?;
        let url = http_request.url().to_string();
        info!("Fetching reach {} from {}", request.reach_id, url);

        self.http
            .execute(http_request)
            .await
            .map_err(|e| FetchError::NetworkRequest(url, e))
    }
}

use std::future::Future;
use std::time::Duration;

use super::query::BoundingBox;
use super::rules::SourceInfo;

/// Body FIRMS returns (with a 2xx or 4xx status) when the map key is rejected. Matched
/// after trimming, so a trailing newline or surrounding whitespace still counts.
pub const INVALID_KEY_SENTINEL: &str = "Invalid MAP_KEY.";

/// Every FIRMS area CSV starts with a header naming this column.
pub const HEADER_MARKER: &str = "latitude";

const ERROR_BODY_PREVIEW_CHARS: usize = 200;

#[derive(Debug, Clone)]
pub struct FetchRequest {
    pub map_key: String,
    pub source: &'static SourceInfo,
    pub bbox: BoundingBox,
    pub day_window: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub enum FetchOutcome {
    Csv(String),
    /// The provider answered but had no detections for this source/window.
    NoData,
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum FetchError {
    #[error("FIRMS rejected the map key")]
    InvalidKey,
    #[error("request timed out after {}s", .0.as_secs())]
    Timeout(Duration),
    #[error("FIRMS HTTP {status}: {body}")]
    Http { status: u16, body: String },
    #[error("FIRMS request failed: {0}")]
    Transport(String),
}

pub trait SourceFetcher: Send + Sync {
    fn fetch(
        &self,
        request: FetchRequest,
    ) -> impl Future<Output = Result<FetchOutcome, FetchError>> + Send;
}

/// Classifies a response body independently of transport.
pub fn classify_body(status: u16, body: String) -> Result<FetchOutcome, FetchError> {
    if body.trim() == INVALID_KEY_SENTINEL {
        return Err(FetchError::InvalidKey);
    }
    if !(200..300).contains(&status) {
        let preview: String = body.trim().chars().take(ERROR_BODY_PREVIEW_CHARS).collect();
        return Err(FetchError::Http {
            status,
            body: preview,
        });
    }
    let header = body.lines().next().unwrap_or("").to_ascii_lowercase();
    if !header.contains(HEADER_MARKER) {
        return Ok(FetchOutcome::NoData);
    }
    Ok(FetchOutcome::Csv(body))
}

/// NASA FIRMS area API client (`/api/area/csv/{key}/{source}/{bbox}/{days}`).
#[derive(Clone)]
pub struct FirmsClient {
    http: reqwest::Client,
    base_url: String,
    timeout: Duration,
}

impl FirmsClient {
    pub fn new(http: reqwest::Client, base_url: impl Into<String>, timeout: Duration) -> Self {
        Self {
            http,
            base_url: base_url.into(),
            timeout,
        }
    }

    pub fn area_url(&self, request: &FetchRequest) -> String {
        format!(
            "{}/api/area/csv/{}/{}/{}/{}",
            self.base_url.trim_end_matches('/'),
            request.map_key,
            request.source.id,
            request.bbox,
            request.day_window
        )
    }
}

impl SourceFetcher for FirmsClient {
    async fn fetch(&self, request: FetchRequest) -> Result<FetchOutcome, FetchError> {
        let url = self.area_url(&request);
        let response = self
            .http
            .get(&url)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|err| {
                if err.is_timeout() {
                    FetchError::Timeout(self.timeout)
                } else {
                    FetchError::Transport(err.without_url().to_string())
                }
            })?;

        let status = response.status().as_u16();
        let body = response.text().await.map_err(|err| {
            if err.is_timeout() {
                FetchError::Timeout(self.timeout)
            } else {
                FetchError::Transport(err.without_url().to_string())
            }
        })?;
        classify_body(status, body)
    }
}

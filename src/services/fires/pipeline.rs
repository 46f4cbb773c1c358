use chrono::{DateTime, Utc};
use futures::future::join_all;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

use super::cache::TtlCache;
use super::fetcher::{FetchError, FetchOutcome, FetchRequest, SourceFetcher};
use super::merge::merge_sources;
use super::normalize::normalize_record;
use super::parser::{parse_rows, HeaderError};
use super::query::{DetectionCacheKey, DetectionQuery, StatsCacheKey};
use super::rules::SourceInfo;
use super::stats::{aggregate, StatisticsSnapshot};
use super::types::{FireDetection, SourceError};
use crate::time::SharedClock;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PipelineError {
    #[error("FIRMS map key is not configured")]
    MissingCredential,
}

/// Merged detections for one query plus whatever went wrong per source.
#[derive(Debug, Clone)]
pub struct DetectionSet {
    pub detections: Arc<Vec<FireDetection>>,
    pub errors: Vec<SourceError>,
    pub cached: bool,
}

impl DetectionSet {
    /// Every requested source failed and nothing was returned.
    pub fn is_total_failure(&self) -> bool {
        self.detections.is_empty() && !self.errors.is_empty()
    }
}

#[derive(Debug, Clone)]
pub struct StatisticsReport {
    pub snapshot: Arc<StatisticsSnapshot>,
    pub errors: Vec<SourceError>,
    pub cached: bool,
}

#[derive(Debug, Clone)]
pub struct FireServiceSettings {
    pub map_key: Option<String>,
    pub overall_timeout: Duration,
    pub detections_ttl: Duration,
    pub statistics_ttl: Duration,
}

/// Fetch → parse → normalize → merge pipeline with its two result caches.
pub struct FireService<F> {
    fetcher: F,
    map_key: Option<String>,
    overall_timeout: Duration,
    detections: TtlCache<DetectionCacheKey, DetectionSet>,
    statistics: TtlCache<StatsCacheKey, StatisticsReport>,
    clock: SharedClock,
}

impl<F: SourceFetcher> FireService<F> {
    pub fn new(fetcher: F, settings: FireServiceSettings, clock: SharedClock) -> Self {
        Self {
            fetcher,
            map_key: settings
                .map_key
                .map(|key| key.trim().to_string())
                .filter(|key| !key.is_empty()),
            overall_timeout: settings.overall_timeout,
            detections: TtlCache::new(settings.detections_ttl, clock.clone()),
            statistics: TtlCache::new(settings.statistics_ttl, clock.clone()),
            clock,
        }
    }

    pub fn has_credential(&self) -> bool {
        self.map_key.is_some()
    }

    pub async fn detections(&self, query: &DetectionQuery) -> Result<DetectionSet, PipelineError> {
        let map_key = self
            .map_key
            .as_deref()
            .ok_or(PipelineError::MissingCredential)?;

        let key = query.detection_key();
        if let Some(hit) = self.detections.get(&key).await {
            tracing::debug!(source = key.source, days = key.day_window, bbox = %key.bbox, "detections cache hit");
            return Ok(DetectionSet { cached: true, ..hit });
        }

        let set = self.fetch_and_merge(map_key, query).await;
        if !set.is_total_failure() {
            self.detections.set(key, set.clone()).await;
        }
        Ok(set)
    }

    pub async fn statistics(
        &self,
        query: &DetectionQuery,
    ) -> Result<StatisticsReport, PipelineError> {
        if self.map_key.is_none() {
            return Err(PipelineError::MissingCredential);
        }

        let key = query.stats_key();
        if let Some(hit) = self.statistics.get(&key).await {
            tracing::debug!(source = key.source, days = key.day_window, area = %key.area, "statistics cache hit");
            return Ok(StatisticsReport { cached: true, ..hit });
        }

        let set = self.detections(query).await?;
        let report = StatisticsReport {
            snapshot: Arc::new(aggregate(&set.detections, self.clock.now())),
            errors: set.errors.clone(),
            cached: false,
        };
        if !set.is_total_failure() {
            self.statistics.set(key, report.clone()).await;
        }
        Ok(report)
    }

    pub async fn clear_caches(&self) -> usize {
        self.detections.clear().await + self.statistics.clear().await
    }

    pub async fn prune_caches(&self) -> usize {
        self.detections.prune_expired().await + self.statistics.prune_expired().await
    }

    async fn fetch_source(
        &self,
        map_key: &str,
        source: &'static SourceInfo,
        query: &DetectionQuery,
        deadline: tokio::time::Instant,
    ) -> (&'static SourceInfo, Result<FetchOutcome, FetchError>) {
        let request = FetchRequest {
            map_key: map_key.to_string(),
            source,
            bbox: query.bbox,
            day_window: query.day_window,
        };
        let outcome = tokio::time::timeout_at(deadline, self.fetcher.fetch(request))
            .await
            .unwrap_or_else(|_| Err(FetchError::Timeout(self.overall_timeout)));
        (source, outcome)
    }

    async fn fetch_and_merge(&self, map_key: &str, query: &DetectionQuery) -> DetectionSet {
        let sources = query.source.sources();
        let deadline = tokio::time::Instant::now() + self.overall_timeout;

        let fetches: Vec<_> = sources
            .into_iter()
            .map(|source| self.fetch_source(map_key, source, query, deadline))
            .collect();
        let results = join_all(fetches).await;

        let now = self.clock.now();
        let mut batches = Vec::with_capacity(results.len());
        let mut errors = Vec::new();
        for (source, outcome) in results {
            match outcome {
                Ok(FetchOutcome::Csv(text)) => batches.push(normalize_payload(source, &text, now)),
                Ok(FetchOutcome::NoData) => {
                    tracing::debug!(source = source.id, "no detections for window");
                }
                Err(err) => {
                    tracing::warn!(source = source.id, error = %err, "FIRMS fetch failed");
                    errors.push(SourceError {
                        source: source.id.to_string(),
                        source_label: source.label.to_string(),
                        message: err.to_string(),
                    });
                }
            }
        }

        let detections = merge_sources(batches);
        tracing::info!(
            source = query.source.id(),
            days = query.day_window,
            bbox = %query.bbox,
            detections = detections.len(),
            failed_sources = errors.len(),
            "fetched fire detections"
        );
        DetectionSet {
            detections: Arc::new(detections),
            errors,
            cached: false,
        }
    }
}

impl<F: SourceFetcher + 'static> FireService<F> {
    /// Periodically evicts expired entries from both caches until `cancel` fires.
    pub fn start_sweeper(self: Arc<Self>, interval: Duration, cancel: CancellationToken) {
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            loop {
                tokio::select! {
                    _ = cancel.cancelled() => break,
                    _ = ticker.tick() => {
                        let evicted = self.prune_caches().await;
                        if evicted > 0 {
                            tracing::debug!(evicted, "pruned expired cache entries");
                        }
                    }
                }
            }
        });
    }
}

/// Parses and normalizes one source's CSV. Structural failures yield an empty batch.
pub fn normalize_payload(
    source: &'static SourceInfo,
    text: &str,
    now: DateTime<Utc>,
) -> Vec<FireDetection> {
    let parsed = match parse_rows(text) {
        Ok(parsed) => parsed,
        Err(HeaderError::NoDataRows) => return Vec::new(),
        Err(err) => {
            tracing::warn!(source = source.id, error = %err, "discarding FIRMS payload");
            return Vec::new();
        }
    };

    let mut rejected = parsed.rejected.len();
    let mut detections = Vec::with_capacity(parsed.records.len());
    for record in &parsed.records {
        match normalize_record(record, source, now) {
            Ok(detection) => detections.push(detection),
            Err(_) => rejected += 1,
        }
    }
    if rejected > 0 {
        tracing::debug!(source = source.id, rejected, "dropped malformed rows");
    }
    detections
}

use chrono::{DateTime, Duration as ChronoDuration, TimeZone, Utc};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::config::FirewatchConfig;
use crate::services::fires::fetcher::{FetchError, FetchOutcome, FetchRequest, SourceFetcher};
use crate::services::fires::rules::{self, Severity};
use crate::services::fires::{FireDetection, FireService, FireServiceSettings};
use crate::state::AppState;
use crate::time::{self, Clock};

pub fn test_config() -> FirewatchConfig {
    FirewatchConfig {
        firms_map_key: None,
        firms_base_url: "https://firms.example".to_string(),
        max_day_window: 10,
        default_region: "bolivia".to_string(),
        fetch_timeout_seconds: 2,
        overall_timeout_seconds: 3,
        detections_cache_ttl_seconds: 300,
        stats_cache_ttl_seconds: 600,
        cache_sweep_interval_seconds: 60,
        rate_limit_per_second: 5,
        rate_limit_burst: 30,
        static_root: None,
    }
}

/// State without a map key over a fetcher that reports no data for every source.
pub fn test_state() -> AppState<ScriptedFetcher> {
    test_state_with(None, ScriptedFetcher::default())
}

pub fn test_state_with(
    map_key: Option<&str>,
    fetcher: ScriptedFetcher,
) -> AppState<ScriptedFetcher> {
    let mut config = test_config();
    config.firms_map_key = map_key.map(str::to_string);
    let fires = FireService::new(
        fetcher,
        FireServiceSettings {
            map_key: config.firms_map_key.clone(),
            overall_timeout: config.overall_timeout(),
            detections_ttl: config.detections_cache_ttl(),
            statistics_ttl: config.stats_cache_ttl(),
        },
        Arc::new(ManualClock::default()),
    );
    AppState {
        config,
        fires: Arc::new(fires),
    }
}

/// Clock that only moves when told to.
#[derive(Debug)]
pub struct ManualClock {
    now: Mutex<DateTime<Utc>>,
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::at(
            Utc.with_ymd_and_hms(2024, 8, 15, 20, 0, 0)
                .single()
                .expect("valid instant"),
        )
    }
}

impl ManualClock {
    pub fn at(now: DateTime<Utc>) -> Self {
        Self {
            now: Mutex::new(now),
        }
    }

    pub fn advance(&self, by: ChronoDuration) {
        let mut now = self.now.lock().expect("clock lock");
        *now += by;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().expect("clock lock")
    }
}

#[derive(Default)]
struct ScriptState {
    responses: HashMap<&'static str, Result<FetchOutcome, FetchError>>,
    requests: Vec<FetchRequest>,
}

/// Fetcher answering from a per-source script; unscripted sources report no data.
/// Clones share the script and the request log.
#[derive(Clone, Default)]
pub struct ScriptedFetcher {
    state: Arc<Mutex<ScriptState>>,
    delay: Option<Duration>,
}

impl ScriptedFetcher {
    pub fn with_csv(self, source_id: &str, csv: &str) -> Self {
        self.script(source_id, Ok(FetchOutcome::Csv(csv.to_string())))
    }

    pub fn with_error(self, source_id: &str, error: FetchError) -> Self {
        self.script(source_id, Err(error))
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    fn script(self, source_id: &str, response: Result<FetchOutcome, FetchError>) -> Self {
        let source = rules::source_info(source_id).expect("known source id");
        self.state
            .lock()
            .expect("script lock")
            .responses
            .insert(source.id, response);
        self
    }

    pub fn calls(&self) -> usize {
        self.state.lock().expect("script lock").requests.len()
    }

    pub fn requested_days(&self) -> Vec<u32> {
        self.state
            .lock()
            .expect("script lock")
            .requests
            .iter()
            .map(|request| request.day_window)
            .collect()
    }
}

impl SourceFetcher for ScriptedFetcher {
    async fn fetch(&self, request: FetchRequest) -> Result<FetchOutcome, FetchError> {
        let response = {
            let mut state = self.state.lock().expect("script lock");
            let response = state
                .responses
                .get(request.source.id)
                .cloned()
                .unwrap_or(Ok(FetchOutcome::NoData));
            state.requests.push(request);
            response
        };
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        response
    }
}

/// A plausible VIIRS NOAA-20 detection at `timestamp_millis` (regional wall clock).
pub fn detection(lat: f64, lng: f64, timestamp_millis: i64) -> FireDetection {
    let local = time::regional_from_millis(timestamp_millis).expect("timestamp in range");
    let confidence = 50;
    FireDetection {
        lat,
        lng,
        acquisition_date_utc: String::new(),
        acquisition_time_utc: String::new(),
        local_date: local.format("%Y-%m-%d").to_string(),
        local_time: local.format("%H:%M").to_string(),
        timestamp_millis,
        confidence,
        confidence_tier: rules::confidence_tier(confidence).id.to_string(),
        risk_level: confidence,
        category: rules::CATEGORY_HEAT_SOURCE.to_string(),
        severity: Severity::Low,
        satellite: "N20".to_string(),
        instrument: "VIIRS".to_string(),
        day_night: "D".to_string(),
        sensor_version: "2.0NRT".to_string(),
        brightness_ti4: 300.0,
        brightness_ti5: 290.0,
        fire_radiative_power: 1.0,
        scan_size: 0.4,
        track_size: 0.4,
        pixel_area: 0.16,
        estimated_temperature_c: Some(26.85),
        source: "VIIRS_NOAA20_NRT".to_string(),
        source_label: "VIIRS NOAA-20 (375 m)".to_string(),
    }
}

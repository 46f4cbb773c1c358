use chrono::{DateTime, Duration, Timelike, Utc};
use serde::Serialize;
use std::collections::BTreeMap;

use super::rules::{self, Severity};
use super::types::FireDetection;
use crate::time;

pub const TOP_LIST_LIMIT: usize = 10;
const HOURS_PER_DAY: usize = 24;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum TrendDirection {
    Increasing,
    Decreasing,
    Stable,
}

#[derive(Debug, Clone, PartialEq, Serialize, utoipa::ToSchema)]
pub struct TrendSummary {
    pub last_24h: u64,
    pub previous_24h: u64,
    pub percent_change: f64,
    pub direction: TrendDirection,
}

#[derive(Debug, Clone, PartialEq, Serialize, utoipa::ToSchema)]
pub struct StatisticsSnapshot {
    pub total: u64,
    pub by_confidence: BTreeMap<String, u64>,
    pub by_satellite: BTreeMap<String, u64>,
    /// Index = regional hour of day.
    pub by_hour: Vec<u64>,
    pub by_day: BTreeMap<String, u64>,
    pub by_severity: BTreeMap<String, u64>,
    pub mean_confidence: f64,
    pub mean_frp: f64,
    pub max_frp: f64,
    pub total_pixel_area: f64,
    pub most_recent: Vec<FireDetection>,
    pub highest_confidence: Vec<FireDetection>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trend: Option<TrendSummary>,
    pub generated_at: DateTime<Utc>,
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

fn trend(detections: &[FireDetection], now: DateTime<Utc>) -> Option<TrendSummary> {
    let now_ms = time::regional_millis(now);
    let day_ms = Duration::hours(24).num_milliseconds();
    let (mut last, mut previous) = (0u64, 0u64);
    for detection in detections {
        let age = now_ms - detection.timestamp_millis;
        if (0..day_ms).contains(&age) {
            last += 1;
        } else if (day_ms..2 * day_ms).contains(&age) {
            previous += 1;
        }
    }
    if previous == 0 {
        return None;
    }

    let delta = last as f64 - previous as f64;
    let direction = if delta > 0.0 {
        TrendDirection::Increasing
    } else if delta < 0.0 {
        TrendDirection::Decreasing
    } else {
        TrendDirection::Stable
    };
    Some(TrendSummary {
        last_24h: last,
        previous_24h: previous,
        percent_change: ((delta / previous as f64) * 1000.0).round() / 10.0,
        direction,
    })
}

fn top_by<F>(detections: &[FireDetection], mut order: F) -> Vec<FireDetection>
where
    F: FnMut(&FireDetection, &FireDetection) -> std::cmp::Ordering,
{
    let mut ranked: Vec<&FireDetection> = detections.iter().collect();
    ranked.sort_by(|a, b| order(a, b));
    ranked.into_iter().take(TOP_LIST_LIMIT).cloned().collect()
}

/// Folds a detection set into a [`StatisticsSnapshot`]. `now` anchors the 24h trend windows.
pub fn aggregate(detections: &[FireDetection], now: DateTime<Utc>) -> StatisticsSnapshot {
    let mut by_confidence: BTreeMap<String, u64> = rules::CONFIDENCE_TIERS
        .iter()
        .map(|tier| (tier.id.to_string(), 0))
        .collect();
    let mut by_severity: BTreeMap<String, u64> = Severity::ALL
        .iter()
        .map(|severity| (severity.as_str().to_string(), 0))
        .collect();
    let mut by_satellite: BTreeMap<String, u64> = BTreeMap::new();
    let mut by_day: BTreeMap<String, u64> = BTreeMap::new();
    let mut by_hour = vec![0u64; HOURS_PER_DAY];

    let mut confidence_sum = 0u64;
    let mut frp_sum = 0.0;
    let mut max_frp = 0.0f64;
    let mut pixel_area_sum = 0.0;

    for detection in detections {
        *by_confidence
            .entry(detection.confidence_tier.clone())
            .or_insert(0) += 1;
        *by_severity
            .entry(detection.severity.as_str().to_string())
            .or_insert(0) += 1;
        *by_satellite.entry(detection.satellite.clone()).or_insert(0) += 1;
        *by_day.entry(detection.local_date.clone()).or_insert(0) += 1;
        if let Some(local) = time::regional_from_millis(detection.timestamp_millis) {
            by_hour[local.hour() as usize] += 1;
        }

        confidence_sum += u64::from(detection.confidence);
        frp_sum += detection.fire_radiative_power;
        max_frp = max_frp.max(detection.fire_radiative_power);
        pixel_area_sum += detection.pixel_area;
    }

    let total = detections.len() as u64;
    let mean = |sum: f64| if total == 0 { 0.0 } else { round2(sum / total as f64) };

    StatisticsSnapshot {
        total,
        by_confidence,
        by_satellite,
        by_hour,
        by_day,
        by_severity,
        mean_confidence: mean(confidence_sum as f64),
        mean_frp: mean(frp_sum),
        max_frp: round2(max_frp),
        total_pixel_area: round2(pixel_area_sum),
        most_recent: top_by(detections, |a, b| b.timestamp_millis.cmp(&a.timestamp_millis)),
        highest_confidence: top_by(detections, |a, b| {
            b.confidence
                .cmp(&a.confidence)
                .then(b.timestamp_millis.cmp(&a.timestamp_millis))
        }),
        trend: trend(detections, now),
        generated_at: now,
    }
}

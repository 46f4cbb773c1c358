use serde::Serialize;

use super::rules::Severity;

/// A single normalized hotspot. Built once per accepted CSV row and never mutated.
#[derive(Debug, Clone, PartialEq, Serialize, utoipa::ToSchema)]
pub struct FireDetection {
    pub lat: f64,
    pub lng: f64,
    pub acquisition_date_utc: String,
    pub acquisition_time_utc: String,
    /// Regional (UTC-4) calendar date, `YYYY-MM-DD`.
    pub local_date: String,
    /// Regional (UTC-4) wall clock, `HH:MM`.
    pub local_time: String,
    /// Regional wall clock as epoch milliseconds.
    pub timestamp_millis: i64,
    pub confidence: u8,
    pub confidence_tier: String,
    pub risk_level: u8,
    pub category: String,
    pub severity: Severity,
    pub satellite: String,
    pub instrument: String,
    pub day_night: String,
    pub sensor_version: String,
    pub brightness_ti4: f64,
    pub brightness_ti5: f64,
    pub fire_radiative_power: f64,
    pub scan_size: f64,
    pub track_size: f64,
    pub pixel_area: f64,
    /// `bright_ti4 - 273.15` rounded to 2 decimals; absent when brightness is missing or not positive.
    pub estimated_temperature_c: Option<f64>,
    pub source: String,
    pub source_label: String,
}

/// Per-source failure carried alongside whatever the other sources returned.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, utoipa::ToSchema)]
pub struct SourceError {
    pub source: String,
    pub source_label: String,
    pub message: String,
}

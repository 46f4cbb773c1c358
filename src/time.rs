use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use std::sync::Arc;

/// Fixed regional offset applied to FIRMS UTC acquisition times (UTC-4, no DST).
pub const REGIONAL_OFFSET_HOURS: i64 = -4;

pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

pub type SharedClock = Arc<dyn Clock>;

pub fn system_clock() -> SharedClock {
    Arc::new(SystemClock)
}

/// Wall clock in the detection region for a UTC instant.
pub fn to_regional(utc: DateTime<Utc>) -> NaiveDateTime {
    utc.naive_utc() + Duration::hours(REGIONAL_OFFSET_HOURS)
}

/// Regional wall clock expressed as epoch milliseconds, the frame detection timestamps use.
pub fn regional_millis(utc: DateTime<Utc>) -> i64 {
    to_regional(utc).and_utc().timestamp_millis()
}

pub fn regional_from_millis(millis: i64) -> Option<NaiveDateTime> {
    DateTime::<Utc>::from_timestamp_millis(millis).map(|dt| dt.naive_utc())
}

/// Parses a FIRMS `HHMM` acquisition time. Missing or invalid components fall back to 0,
/// short values (`930`) are left-padded the way FIRMS strips leading zeros.
pub fn parse_hhmm(raw: &str) -> NaiveTime {
    let digits: String = raw.trim().chars().filter(|c| c.is_ascii_digit()).collect();
    let padded = format!("{digits:0>4}");
    let hour = padded
        .get(0..2)
        .and_then(|v| v.parse::<u32>().ok())
        .filter(|h| *h < 24)
        .unwrap_or(0);
    let minute = padded
        .get(2..4)
        .and_then(|v| v.parse::<u32>().ok())
        .filter(|m| *m < 60)
        .unwrap_or(0);
    NaiveTime::from_hms_opt(hour, minute, 0).unwrap_or(NaiveTime::MIN)
}

/// UTC instant for a FIRMS `acq_date` / `acq_time` pair, `None` when either is missing or
/// the date is not `YYYY-MM-DD`.
pub fn acquisition_instant(date: &str, time: &str) -> Option<DateTime<Utc>> {
    let date = date.trim();
    let time = time.trim();
    if date.is_empty() || time.is_empty() {
        return None;
    }
    let day = NaiveDate::parse_from_str(date, "%Y-%m-%d").ok()?;
    Some(day.and_time(parse_hhmm(time)).and_utc())
}

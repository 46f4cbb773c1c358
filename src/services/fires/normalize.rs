use chrono::{DateTime, Utc};

use super::parser::{coordinate, RawRecord, RowRejection, FIELD_LATITUDE, FIELD_LONGITUDE};
use super::rules::{self, Severity, SourceInfo};
use super::types::FireDetection;
use crate::time;

fn parse_f64_or_zero(raw: &str) -> f64 {
    raw.trim()
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .unwrap_or(0.0)
}

/// Integer confidence in `0..=100`; fractional values truncate, anything else is 0.
pub fn parse_confidence(raw: &str) -> u8 {
    let raw = raw.trim();
    let value = raw
        .parse::<i64>()
        .ok()
        .or_else(|| {
            raw.parse::<f64>()
                .ok()
                .filter(|v| v.is_finite())
                .map(|v| v.trunc() as i64)
        })
        .unwrap_or(0);
    value.clamp(0, 100) as u8
}

fn pass_through(record: &RawRecord, field: &str) -> String {
    let value = record.get(field);
    if value.is_empty() {
        rules::PLACEHOLDER.to_string()
    } else {
        value.to_string()
    }
}

pub fn risk_level(confidence: u8, brightness_ti4: f64, brightness_ti5: f64, frp: f64) -> u8 {
    let mut risk = i64::from(confidence);
    if brightness_ti4 > rules::BRIGHTNESS_TI4_RISK_K {
        risk += rules::BRIGHTNESS_TI4_RISK_BONUS;
    }
    if brightness_ti5 > rules::BRIGHTNESS_TI5_RISK_K {
        risk += rules::BRIGHTNESS_TI5_RISK_BONUS;
    }
    if frp > rules::FRP_HIGH_MW {
        risk += rules::FRP_HIGH_RISK_BONUS;
    }
    if frp > rules::FRP_VERY_HIGH_MW {
        risk += rules::FRP_VERY_HIGH_RISK_BONUS;
    }
    risk.clamp(0, 100) as u8
}

pub fn classify(frp: f64, pixel_area: f64) -> (String, Severity) {
    let (category, severity) = rules::SEVERITY_BY_FRP
        .iter()
        .find(|(threshold, _, _)| frp > *threshold)
        .map(|(_, category, severity)| (*category, *severity))
        .unwrap_or((rules::CATEGORY_HEAT_SOURCE, Severity::Low));

    let mut category = category.to_string();
    if pixel_area > rules::EXTENSIVE_AREA_KM2 {
        category.push_str(rules::EXTENSIVE_AREA_SUFFIX);
    }
    (category, severity)
}

/// Maps one parsed row into a [`FireDetection`]. `now` stands in for the acquisition
/// instant when the row has no usable date/time.
pub fn normalize_record(
    record: &RawRecord,
    source: &SourceInfo,
    now: DateTime<Utc>,
) -> Result<FireDetection, RowRejection> {
    let lat = coordinate(record, FIELD_LATITUDE)?;
    let lng = coordinate(record, FIELD_LONGITUDE)?;

    let acquisition_date_utc = record.get("acq_date").to_string();
    let acquisition_time_utc = record.get("acq_time").to_string();
    let instant = time::acquisition_instant(&acquisition_date_utc, &acquisition_time_utc)
        .unwrap_or(now);
    let local = time::to_regional(instant);

    let confidence = parse_confidence(record.get("confidence"));

    // MODIS rows report `brightness` / `bright_t31` instead of the VIIRS I-band columns.
    let brightness_ti4_raw = record.first_of(&["bright_ti4", "brightness"]);
    let brightness_ti4 = parse_f64_or_zero(brightness_ti4_raw);
    let brightness_ti5 = parse_f64_or_zero(record.first_of(&["bright_ti5", "bright_t31"]));
    let fire_radiative_power = parse_f64_or_zero(record.get("frp"));
    let scan_size = parse_f64_or_zero(record.get("scan"));
    let track_size = parse_f64_or_zero(record.get("track"));
    let pixel_area = scan_size * track_size;

    let estimated_temperature_c = (brightness_ti4 > 0.0)
        .then(|| ((brightness_ti4 - rules::KELVIN_OFFSET) * 100.0).round() / 100.0);

    let (category, severity) = classify(fire_radiative_power, pixel_area);

    Ok(FireDetection {
        lat,
        lng,
        acquisition_date_utc,
        acquisition_time_utc,
        local_date: local.format("%Y-%m-%d").to_string(),
        local_time: local.format("%H:%M").to_string(),
        timestamp_millis: local.and_utc().timestamp_millis(),
        confidence,
        confidence_tier: rules::confidence_tier(confidence).id.to_string(),
        risk_level: risk_level(
            confidence,
            brightness_ti4,
            brightness_ti5,
            fire_radiative_power,
        ),
        category,
        severity,
        satellite: pass_through(record, "satellite"),
        instrument: pass_through(record, "instrument"),
        day_night: pass_through(record, "daynight"),
        sensor_version: pass_through(record, "version"),
        brightness_ti4,
        brightness_ti5,
        fire_radiative_power,
        scan_size,
        track_size,
        pixel_area,
        estimated_temperature_c,
        source: source.id.to_string(),
        source_label: source.label.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::fires::parser::parse_rows;
    use chrono::TimeZone;

    const HEADER: &str = "latitude,longitude,acq_date,acq_time,confidence,bright_ti4,bright_ti5,frp,scan,track,satellite,instrument,daynight,version";

    fn viirs() -> &'static SourceInfo {
        rules::source_info("VIIRS_NOAA20_NRT").expect("source")
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 9, 1, 12, 0, 0).single().expect("now")
    }

    fn single(row: &str) -> FireDetection {
        let parsed = parse_rows(&format!("{HEADER}\n{row}\n")).expect("parse");
        normalize_record(&parsed.records[0], viirs(), now()).expect("normalize")
    }

    #[test]
    fn large_fire_row_normalizes_with_clamped_risk() {
        let detection =
            single("-16.5,-63.2,2024-08-15,1430,72,335,325,120,1.2,1.1,N20,VIIRS,D,2.0");
        assert_eq!(detection.confidence, 72);
        assert_eq!(detection.confidence_tier, "high");
        assert_eq!(detection.risk_level, 100);
        assert_eq!(detection.category, "large active fire");
        assert_eq!(detection.severity, Severity::VeryHigh);
        assert!((detection.pixel_area - 1.32).abs() < 1e-9);
        assert_eq!(detection.pixel_area, detection.scan_size * detection.track_size);
        assert_eq!(detection.local_date, "2024-08-15");
        assert_eq!(detection.local_time, "10:30");
        assert_eq!(detection.estimated_temperature_c, Some(61.85));
        assert_eq!(detection.satellite, "N20");
        assert_eq!(detection.source_label, "VIIRS NOAA-20 (375 m)");
    }

    #[test]
    fn risk_adds_bonuses_before_clamping() {
        assert_eq!(risk_level(20, 300.0, 300.0, 60.0), 35);
        assert_eq!(risk_level(20, 331.0, 321.0, 101.0), 60);
        assert_eq!(risk_level(0, 0.0, 0.0, 0.0), 0);
        assert_eq!(risk_level(95, 331.0, 0.0, 0.0), 100);
    }

    #[test]
    fn classification_checks_frp_from_highest_threshold() {
        assert_eq!(classify(5.0, 1.0), ("heat source".to_string(), Severity::Low));
        assert_eq!(
            classify(10.5, 1.0),
            ("small active fire".to_string(), Severity::Medium)
        );
        assert_eq!(
            classify(75.0, 2.5),
            ("moderate active fire (extensive area)".to_string(), Severity::High)
        );
        assert_eq!(classify(100.0, 0.1).1, Severity::High);
    }

    #[test]
    fn unparseable_numbers_default_to_zero() {
        let detection = single("-16.5,-63.2,2024-08-15,1430,h,,x,,,,,,,");
        assert_eq!(detection.confidence, 0);
        assert_eq!(detection.confidence_tier, "nominal");
        assert_eq!(detection.brightness_ti4, 0.0);
        assert_eq!(detection.pixel_area, 0.0);
        assert_eq!(detection.estimated_temperature_c, None);
        assert_eq!(detection.satellite, rules::PLACEHOLDER);
        assert_eq!(detection.severity, Severity::Low);
    }

    #[test]
    fn temperature_is_rounded_to_two_decimals() {
        let detection =
            single("-16.5,-63.2,2024-08-15,1430,50,335.123,300,1,0.4,0.4,N20,VIIRS,D,2.0");
        assert_eq!(detection.estimated_temperature_c, Some(61.97));
    }

    #[test]
    fn confidence_is_truncated_and_clamped() {
        assert_eq!(parse_confidence("72.9"), 72);
        assert_eq!(parse_confidence("150"), 100);
        assert_eq!(parse_confidence("-3"), 0);
        assert_eq!(parse_confidence(""), 0);
    }

    #[test]
    fn missing_acquisition_time_falls_back_to_now() {
        let detection = single("-16.5,-63.2,2024-08-15,,50,300,290,1,0.4,0.4,N,VIIRS,N,2.0");
        assert_eq!(detection.timestamp_millis, time::regional_millis(now()));
        assert_eq!(detection.local_time, "08:00");
    }

    #[test]
    fn modis_columns_feed_brightness() {
        let text = "latitude,longitude,acq_date,acq_time,confidence,brightness,bright_t31,frp,scan,track\n-15.0,-62.0,2024-08-15,0930,80,340.5,321,12,1.0,1.0\n";
        let parsed = parse_rows(text).expect("parse");
        let modis = rules::source_info("MODIS_NRT").expect("source");
        let detection = normalize_record(&parsed.records[0], modis, now()).expect("normalize");
        assert_eq!(detection.brightness_ti4, 340.5);
        assert_eq!(detection.risk_level, 95);
        assert_eq!(detection.local_time, "05:30");
        assert_eq!(detection.category, "small active fire");
    }
}

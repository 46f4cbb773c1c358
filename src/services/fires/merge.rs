use std::collections::HashSet;

use super::types::FireDetection;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DedupKey {
    lat_e4: i64,
    lng_e4: i64,
    timestamp_millis: i64,
}

impl DedupKey {
    pub fn of(detection: &FireDetection) -> Self {
        Self {
            lat_e4: (detection.lat * 10_000.0).round() as i64,
            lng_e4: (detection.lng * 10_000.0).round() as i64,
            timestamp_millis: detection.timestamp_millis,
        }
    }
}

/// Concatenates per-source batches in the given order, keeps the first detection for each
/// [`DedupKey`], and sorts the survivors newest first.
pub fn merge_sources<I>(batches: I) -> Vec<FireDetection>
where
    I: IntoIterator<Item = Vec<FireDetection>>,
{
    let mut seen: HashSet<DedupKey> = HashSet::new();
    let mut merged: Vec<FireDetection> = batches
        .into_iter()
        .flatten()
        .filter(|detection| seen.insert(DedupKey::of(detection)))
        .collect();
    merged.sort_by(|a, b| b.timestamp_millis.cmp(&a.timestamp_millis));
    merged
}

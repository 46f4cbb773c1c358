use serde::Serialize;
use std::fmt;

use super::rules::{self, SourceInfo};

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum QueryError {
    #[error("unknown source {0:?}")]
    UnknownSource(String),
    #[error("unknown region {0:?}")]
    UnknownRegion(String),
    #[error("bbox must be minLon,minLat,maxLon,maxLat: {0}")]
    InvalidBoundingBox(String),
}

/// `minLon,minLat,maxLon,maxLat` in WGS84 degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, utoipa::ToSchema)]
pub struct BoundingBox {
    pub min_lon: f64,
    pub min_lat: f64,
    pub max_lon: f64,
    pub max_lat: f64,
}

impl BoundingBox {
    pub fn parse(raw: &str) -> Result<Self, QueryError> {
        let invalid = |reason: &str| QueryError::InvalidBoundingBox(format!("{reason} ({raw:?})"));
        let parts: Vec<f64> = raw
            .split(',')
            .map(|part| part.trim().parse::<f64>())
            .collect::<Result<_, _>>()
            .map_err(|_| invalid("non-numeric component"))?;
        let [min_lon, min_lat, max_lon, max_lat] = parts[..] else {
            return Err(invalid("expected four components"));
        };
        if ![min_lon, min_lat, max_lon, max_lat].iter().all(|v| v.is_finite()) {
            return Err(invalid("non-finite component"));
        }
        if !(-180.0..=180.0).contains(&min_lon) || !(-180.0..=180.0).contains(&max_lon) {
            return Err(invalid("longitude must be -180..180"));
        }
        if !(-90.0..=90.0).contains(&min_lat) || !(-90.0..=90.0).contains(&max_lat) {
            return Err(invalid("latitude must be -90..90"));
        }
        if min_lon >= max_lon || min_lat >= max_lat {
            return Err(invalid("min must be below max"));
        }
        Ok(Self {
            min_lon,
            min_lat,
            max_lon,
            max_lat,
        })
    }
}

impl fmt::Display for BoundingBox {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{},{},{},{}",
            self.min_lon, self.min_lat, self.max_lon, self.max_lat
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SourceSelector {
    All,
    One(&'static SourceInfo),
}

impl SourceSelector {
    pub fn parse(raw: Option<&str>) -> Result<Self, QueryError> {
        match raw.map(str::trim).filter(|value| !value.is_empty()) {
            None => Ok(Self::All),
            Some(value) if value.eq_ignore_ascii_case(rules::ALL_SOURCES) => Ok(Self::All),
            Some(value) => rules::source_info(value)
                .map(Self::One)
                .ok_or_else(|| QueryError::UnknownSource(value.to_string())),
        }
    }

    pub fn sources(&self) -> Vec<&'static SourceInfo> {
        match self {
            Self::All => rules::SOURCES.iter().collect(),
            Self::One(source) => vec![*source],
        }
    }

    pub fn id(&self) -> &'static str {
        match self {
            Self::All => rules::ALL_SOURCES,
            Self::One(source) => source.id,
        }
    }
}

/// Where a query's bounding box came from; statistics are cached per area name.
#[derive(Debug, Clone, PartialEq)]
pub enum Area {
    Region(&'static rules::RegionPreset),
    Custom(BoundingBox),
}

impl Area {
    pub fn label(&self) -> String {
        match self {
            Self::Region(region) => region.id.to_string(),
            Self::Custom(bbox) => bbox.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DetectionQuery {
    pub source: SourceSelector,
    pub day_window: u32,
    pub bbox: BoundingBox,
    pub area: Area,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DetectionCacheKey {
    pub source: &'static str,
    pub day_window: u32,
    pub bbox: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct StatsCacheKey {
    pub source: &'static str,
    pub day_window: u32,
    pub area: String,
}

impl DetectionQuery {
    /// Resolves raw request parameters. `region` wins over `bbox`; with neither the
    /// `default_region` preset applies. The day window is clamped to `1..=max_day_window`.
    pub fn resolve(
        source: Option<&str>,
        days: Option<u32>,
        bbox: Option<&str>,
        region: Option<&str>,
        default_region: &str,
        max_day_window: u32,
    ) -> Result<Self, QueryError> {
        let source = SourceSelector::parse(source)?;
        let day_window = days.unwrap_or(1).clamp(1, max_day_window.max(1));

        let region = region.map(str::trim).filter(|value| !value.is_empty());
        let bbox = bbox.map(str::trim).filter(|value| !value.is_empty());
        let area = match (region, bbox) {
            (Some(id), _) => Area::Region(
                rules::region(id).ok_or_else(|| QueryError::UnknownRegion(id.to_string()))?,
            ),
            (None, Some(raw)) => Area::Custom(BoundingBox::parse(raw)?),
            (None, None) => Area::Region(
                rules::region(default_region)
                    .ok_or_else(|| QueryError::UnknownRegion(default_region.to_string()))?,
            ),
        };
        let bbox = match &area {
            Area::Region(region) => BoundingBox::parse(region.bbox)?,
            Area::Custom(bbox) => *bbox,
        };

        Ok(Self {
            source,
            day_window,
            bbox,
            area,
        })
    }

    pub fn detection_key(&self) -> DetectionCacheKey {
        DetectionCacheKey {
            source: self.source.id(),
            day_window: self.day_window,
            bbox: self.bbox.to_string(),
        }
    }

    pub fn stats_key(&self) -> StatsCacheKey {
        StatsCacheKey {
            source: self.source.id(),
            day_window: self.day_window,
            area: self.area.label(),
        }
    }
}

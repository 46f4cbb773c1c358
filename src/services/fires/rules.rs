use serde::Serialize;

pub const PLACEHOLDER: &str = "N/A";

pub const KELVIN_OFFSET: f64 = 273.15;

pub const BRIGHTNESS_TI4_RISK_K: f64 = 330.0;
pub const BRIGHTNESS_TI5_RISK_K: f64 = 320.0;
pub const BRIGHTNESS_TI4_RISK_BONUS: i64 = 10;
pub const BRIGHTNESS_TI5_RISK_BONUS: i64 = 5;
pub const FRP_HIGH_MW: f64 = 50.0;
pub const FRP_HIGH_RISK_BONUS: i64 = 15;
pub const FRP_VERY_HIGH_MW: f64 = 100.0;
pub const FRP_VERY_HIGH_RISK_BONUS: i64 = 10;
pub const FRP_SMALL_FIRE_MW: f64 = 10.0;

pub const EXTENSIVE_AREA_KM2: f64 = 2.0;
pub const EXTENSIVE_AREA_SUFFIX: &str = " (extensive area)";

pub const CATEGORY_HEAT_SOURCE: &str = "heat source";

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Low,
    Medium,
    High,
    VeryHigh,
}

impl Severity {
    pub const ALL: [Severity; 4] = [
        Severity::Low,
        Severity::Medium,
        Severity::High,
        Severity::VeryHigh,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Severity::Low => "low",
            Severity::Medium => "medium",
            Severity::High => "high",
            Severity::VeryHigh => "very_high",
        }
    }
}

/// FRP thresholds ordered from highest to lowest; the first one exceeded wins.
pub const SEVERITY_BY_FRP: [(f64, &str, Severity); 3] = [
    (FRP_VERY_HIGH_MW, "large active fire", Severity::VeryHigh),
    (FRP_HIGH_MW, "moderate active fire", Severity::High),
    (FRP_SMALL_FIRE_MW, "small active fire", Severity::Medium),
];

#[derive(Debug, Clone, Copy, Serialize, utoipa::ToSchema)]
pub struct ConfidenceTier {
    pub id: &'static str,
    pub min: u8,
    pub max: u8,
    pub label: &'static str,
    pub color: &'static str,
}

/// Half-open `[min, max)` intervals in ascending `min` order. Lookups scan this list
/// front to back and take the first match; the top tier also owns `max` itself. Anything
/// unmatched falls back to the first (nominal) tier.
pub const CONFIDENCE_TIERS: [ConfidenceTier; 5] = [
    ConfidenceTier {
        id: "nominal",
        min: 0,
        max: 30,
        label: "Nominal",
        color: "#9e9e9e",
    },
    ConfidenceTier {
        id: "low",
        min: 30,
        max: 50,
        label: "Low",
        color: "#fdd835",
    },
    ConfidenceTier {
        id: "medium",
        min: 50,
        max: 70,
        label: "Medium",
        color: "#fb8c00",
    },
    ConfidenceTier {
        id: "high",
        min: 70,
        max: 85,
        label: "High",
        color: "#e53935",
    },
    ConfidenceTier {
        id: "very_high",
        min: 85,
        max: 100,
        label: "Very high",
        color: "#8e0000",
    },
];

pub fn confidence_tier(confidence: u8) -> &'static ConfidenceTier {
    let last = CONFIDENCE_TIERS.len() - 1;
    CONFIDENCE_TIERS
        .iter()
        .enumerate()
        .find(|(idx, tier)| {
            confidence >= tier.min
                && (confidence < tier.max || (*idx == last && confidence == tier.max))
        })
        .map(|(_, tier)| tier)
        .unwrap_or(&CONFIDENCE_TIERS[0])
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, utoipa::ToSchema)]
pub struct SourceInfo {
    pub id: &'static str,
    pub label: &'static str,
}

pub const ALL_SOURCES: &str = "ALL";

pub const SOURCES: [SourceInfo; 4] = [
    SourceInfo {
        id: "VIIRS_SNPP_NRT",
        label: "VIIRS S-NPP (375 m)",
    },
    SourceInfo {
        id: "VIIRS_NOAA20_NRT",
        label: "VIIRS NOAA-20 (375 m)",
    },
    SourceInfo {
        id: "VIIRS_NOAA21_NRT",
        label: "VIIRS NOAA-21 (375 m)",
    },
    SourceInfo {
        id: "MODIS_NRT",
        label: "MODIS Terra/Aqua (1 km)",
    },
];

pub fn source_info(id: &str) -> Option<&'static SourceInfo> {
    let id = id.trim();
    SOURCES
        .iter()
        .find(|source| source.id.eq_ignore_ascii_case(id))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, utoipa::ToSchema)]
pub struct RegionPreset {
    pub id: &'static str,
    pub label: &'static str,
    /// `minLon,minLat,maxLon,maxLat`
    pub bbox: &'static str,
}

pub const REGIONS: [RegionPreset; 7] = [
    RegionPreset {
        id: "bolivia",
        label: "Bolivia",
        bbox: "-69.7,-22.9,-57.4,-9.6",
    },
    RegionPreset {
        id: "santa_cruz",
        label: "Santa Cruz",
        bbox: "-64.8,-20.5,-57.4,-13.4",
    },
    RegionPreset {
        id: "beni",
        label: "Beni",
        bbox: "-67.5,-16.0,-61.8,-10.2",
    },
    RegionPreset {
        id: "pando",
        label: "Pando",
        bbox: "-69.6,-12.6,-65.2,-9.6",
    },
    RegionPreset {
        id: "la_paz",
        label: "La Paz",
        bbox: "-69.7,-18.1,-66.7,-11.8",
    },
    RegionPreset {
        id: "cochabamba",
        label: "Cochabamba",
        bbox: "-67.2,-18.6,-64.1,-15.8",
    },
    RegionPreset {
        id: "chiquitania",
        label: "Chiquitania",
        bbox: "-62.5,-18.5,-58.0,-15.5",
    },
];

pub fn region(id: &str) -> Option<&'static RegionPreset> {
    let id = id.trim();
    REGIONS
        .iter()
        .find(|region| region.id.eq_ignore_ascii_case(id))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_confidence_maps_to_the_tier_containing_it() {
        for confidence in 0..100u8 {
            let containing: Vec<&str> = CONFIDENCE_TIERS
                .iter()
                .filter(|tier| (tier.min..tier.max).contains(&confidence))
                .map(|tier| tier.id)
                .collect();
            assert_eq!(containing.len(), 1, "confidence {confidence}");
            assert_eq!(confidence_tier(confidence).id, containing[0], "confidence {confidence}");
        }
        assert_eq!(confidence_tier(100).id, "very_high");
        assert_eq!(confidence_tier(u8::MAX).id, "nominal");
    }

    #[test]
    fn tier_boundaries_follow_half_open_intervals() {
        assert_eq!(confidence_tier(0).id, "nominal");
        assert_eq!(confidence_tier(29).id, "nominal");
        assert_eq!(confidence_tier(30).id, "low");
        assert_eq!(confidence_tier(69).id, "medium");
        assert_eq!(confidence_tier(70).id, "high");
        assert_eq!(confidence_tier(84).id, "high");
        assert_eq!(confidence_tier(85).id, "very_high");
        assert_eq!(confidence_tier(100).id, "very_high");
    }

    #[test]
    fn tiers_are_listed_in_ascending_min_order() {
        assert!(CONFIDENCE_TIERS.windows(2).all(|w| w[0].max == w[1].min));
    }

    #[test]
    fn lookups_are_case_insensitive() {
        assert_eq!(source_info("modis_nrt").map(|s| s.id), Some("MODIS_NRT"));
        assert!(source_info("GOES").is_none());
        assert_eq!(region(" Santa_Cruz ").map(|r| r.label), Some("Santa Cruz"));
    }
}

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Component, Path, PathBuf};
use std::time::Duration;

use crate::services::fires::rules;

pub const DEFAULT_FIRMS_BASE_URL: &str = "https://firms.modaps.eosdis.nasa.gov";
pub const DEFAULT_MAX_DAY_WINDOW: u32 = 10;

#[derive(Debug, Clone, Default, Deserialize)]
struct ConfigFileOverrides {
    #[serde(default)]
    firms_map_key: Option<String>,
    #[serde(default)]
    firms_base_url: Option<String>,
    #[serde(default)]
    default_region: Option<String>,
    #[serde(default)]
    max_day_window: Option<u32>,
}

fn load_config_file_overrides(path: &Path) -> Option<ConfigFileOverrides> {
    if !path.exists() {
        return None;
    }
    let contents = match std::fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(err) => {
            tracing::warn!(
                path = %path.display(),
                error = %err,
                "failed to read config file; using env defaults"
            );
            return None;
        }
    };
    match serde_json::from_str(&contents) {
        Ok(value) => Some(value),
        Err(err) => {
            tracing::warn!(
                path = %path.display(),
                error = %err,
                "failed to parse config file; using env defaults"
            );
            None
        }
    }
}

fn trimmed(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

#[derive(Debug, Clone)]
pub struct FirewatchConfig {
    pub firms_map_key: Option<String>,
    pub firms_base_url: String,
    pub max_day_window: u32,
    pub default_region: String,
    pub fetch_timeout_seconds: u64,
    pub overall_timeout_seconds: u64,
    pub detections_cache_ttl_seconds: u64,
    pub stats_cache_ttl_seconds: u64,
    pub cache_sweep_interval_seconds: u64,
    pub rate_limit_per_second: u64,
    pub rate_limit_burst: u32,
    pub static_root: Option<PathBuf>,
}

impl FirewatchConfig {
    pub fn from_env(cli_static_root: Option<PathBuf>) -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok(), cli_static_root)
    }

    pub fn from_lookup<L>(lookup: L, cli_static_root: Option<PathBuf>) -> Result<Self>
    where
        L: Fn(&str) -> Option<String>,
    {
        let env = Env(&lookup);
        let overrides = env
            .optional_string("FIREWATCH_CONFIG_PATH")
            .and_then(|path| load_config_file_overrides(Path::new(&path)))
            .unwrap_or_default();

        let firms_map_key = env
            .optional_string("FIRMS_MAP_KEY")
            .or_else(|| trimmed(overrides.firms_map_key.as_deref()));
        if firms_map_key.is_none() {
            tracing::warn!("FIRMS_MAP_KEY is not set; detection queries will be refused");
        }

        let firms_base_url = env
            .optional_string("FIRMS_BASE_URL")
            .or_else(|| trimmed(overrides.firms_base_url.as_deref()))
            .unwrap_or_else(|| DEFAULT_FIRMS_BASE_URL.to_string());
        if !firms_base_url.starts_with("http://") && !firms_base_url.starts_with("https://") {
            anyhow::bail!("FIRMS_BASE_URL must be an http(s) URL, got {firms_base_url:?}");
        }

        let max_day_window = env
            .optional_u64("FIREWATCH_MAX_DAY_WINDOW")
            .map(|v| v.min(u64::from(u32::MAX)) as u32)
            .or(overrides.max_day_window)
            .unwrap_or(DEFAULT_MAX_DAY_WINDOW)
            .clamp(1, DEFAULT_MAX_DAY_WINDOW);

        let default_region = env
            .optional_string("FIREWATCH_DEFAULT_REGION")
            .or_else(|| trimmed(overrides.default_region.as_deref()))
            .unwrap_or_else(|| rules::REGIONS[0].id.to_string());
        let default_region = rules::region(&default_region)
            .map(|region| region.id.to_string())
            .with_context(|| format!("FIREWATCH_DEFAULT_REGION {default_region:?} is not a known region"))?;

        let fetch_timeout_seconds = env.u64("FIREWATCH_FETCH_TIMEOUT_SECONDS", 15).clamp(1, 120);
        let overall_timeout_seconds = env
            .u64("FIREWATCH_OVERALL_TIMEOUT_SECONDS", 25)
            .clamp(fetch_timeout_seconds, 300);
        let detections_cache_ttl_seconds =
            env.u64("FIREWATCH_DETECTIONS_CACHE_TTL_SECONDS", 300).clamp(1, 24 * 3600);
        let stats_cache_ttl_seconds =
            env.u64("FIREWATCH_STATS_CACHE_TTL_SECONDS", 600).clamp(1, 24 * 3600);
        let cache_sweep_interval_seconds =
            env.u64("FIREWATCH_CACHE_SWEEP_INTERVAL_SECONDS", 60).clamp(5, 3600);
        let rate_limit_per_second = env.u64("FIREWATCH_RATE_LIMIT_PER_SECOND", 5).clamp(1, 1000);
        let rate_limit_burst = env
            .u64("FIREWATCH_RATE_LIMIT_BURST", 30)
            .clamp(1, 10_000) as u32;

        let static_root = match cli_static_root.or_else(|| env.optional_path("FIREWATCH_STATIC_ROOT")) {
            Some(path) => Some(validate_static_root(path, "FIREWATCH_STATIC_ROOT")?),
            None => None,
        };

        Ok(Self {
            firms_map_key,
            firms_base_url,
            max_day_window,
            default_region,
            fetch_timeout_seconds,
            overall_timeout_seconds,
            detections_cache_ttl_seconds,
            stats_cache_ttl_seconds,
            cache_sweep_interval_seconds,
            rate_limit_per_second,
            rate_limit_burst,
            static_root,
        })
    }

    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_seconds)
    }

    pub fn overall_timeout(&self) -> Duration {
        Duration::from_secs(self.overall_timeout_seconds)
    }

    pub fn detections_cache_ttl(&self) -> Duration {
        Duration::from_secs(self.detections_cache_ttl_seconds)
    }

    pub fn stats_cache_ttl(&self) -> Duration {
        Duration::from_secs(self.stats_cache_ttl_seconds)
    }

    pub fn cache_sweep_interval(&self) -> Duration {
        Duration::from_secs(self.cache_sweep_interval_seconds)
    }
}

struct Env<'a, L>(&'a L);

impl<L> Env<'_, L>
where
    L: Fn(&str) -> Option<String>,
{
    fn optional_string(&self, key: &str) -> Option<String> {
        trimmed((self.0)(key).as_deref())
    }

    fn optional_u64(&self, key: &str) -> Option<u64> {
        self.optional_string(key)
            .and_then(|value| value.parse::<u64>().ok())
    }

    fn u64(&self, key: &str, default: u64) -> u64 {
        self.optional_u64(key).unwrap_or(default)
    }

    fn optional_path(&self, key: &str) -> Option<PathBuf> {
        self.optional_string(key).map(PathBuf::from)
    }
}

fn validate_static_root(path: PathBuf, label: &str) -> Result<PathBuf> {
    for component in path.components() {
        if matches!(component, Component::ParentDir) {
            anyhow::bail!("{label} must not contain '..' segments");
        }
    }
    let canonical = path
        .canonicalize()
        .with_context(|| format!("{label} not found at {}", path.display()))?;
    if !canonical.is_dir() {
        anyhow::bail!("{label} must be a directory ({})", canonical.display());
    }
    Ok(canonical)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(vars: &[(&str, &str)]) -> Result<FirewatchConfig> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        FirewatchConfig::from_lookup(|key| vars.get(key).cloned(), None)
    }

    #[test]
    fn defaults_apply_without_environment() -> Result<()> {
        let config = config_from(&[])?;
        assert!(config.firms_map_key.is_none());
        assert_eq!(config.firms_base_url, DEFAULT_FIRMS_BASE_URL);
        assert_eq!(config.max_day_window, 10);
        assert_eq!(config.default_region, "bolivia");
        assert_eq!(config.detections_cache_ttl(), Duration::from_secs(300));
        assert_eq!(config.stats_cache_ttl(), Duration::from_secs(600));
        Ok(())
    }

    #[test]
    fn values_are_trimmed_and_clamped() -> Result<()> {
        let config = config_from(&[
            ("FIRMS_MAP_KEY", "  abc  "),
            ("FIREWATCH_MAX_DAY_WINDOW", "40"),
            ("FIREWATCH_FETCH_TIMEOUT_SECONDS", "20"),
            ("FIREWATCH_OVERALL_TIMEOUT_SECONDS", "5"),
            ("FIREWATCH_DEFAULT_REGION", "Beni"),
        ])?;
        assert_eq!(config.firms_map_key.as_deref(), Some("abc"));
        assert_eq!(config.max_day_window, 10);
        assert_eq!(config.overall_timeout_seconds, 20);
        assert_eq!(config.default_region, "beni");
        Ok(())
    }

    #[test]
    fn rejects_unknown_region_and_bad_base_url() {
        assert!(config_from(&[("FIREWATCH_DEFAULT_REGION", "atlantis")]).is_err());
        assert!(config_from(&[("FIRMS_BASE_URL", "ftp://firms")]).is_err());
    }

    #[test]
    fn config_file_supplies_missing_values() -> Result<()> {
        let temp = tempfile::tempdir()?;
        let path = temp.path().join("firewatch.json");
        std::fs::write(
            &path,
            r#"{"firms_map_key": "from-file", "default_region": "pando", "max_day_window": 3}"#,
        )?;
        let path = path.to_string_lossy().to_string();
        let config = config_from(&[("FIREWATCH_CONFIG_PATH", path.as_str())])?;
        assert_eq!(config.firms_map_key.as_deref(), Some("from-file"));
        assert_eq!(config.default_region, "pando");
        assert_eq!(config.max_day_window, 3);
        Ok(())
    }

    #[test]
    fn static_root_rejects_parent_segments_and_missing_dirs() -> Result<()> {
        assert!(validate_static_root(PathBuf::from("/tmp/../etc"), "TEST").is_err());
        assert!(validate_static_root(PathBuf::from("/definitely/not/here"), "TEST").is_err());
        let temp = tempfile::tempdir()?;
        assert!(validate_static_root(temp.path().to_path_buf(), "TEST").is_ok());
        Ok(())
    }
}

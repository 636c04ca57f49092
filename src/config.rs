//! Runtime configuration, read from `dashboard.json` when present.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;

/// Config file looked up in the working directory.
pub const CONFIG_FILE: &str = "dashboard.json";

/// Environment variable that points at an alternative config file.
pub const CONFIG_ENV: &str = "MOTO_DASH_CONFIG";

/// Bounds of the map sample-size slider.
pub const SAMPLE_SIZE_MIN: usize = 1000;
pub const SAMPLE_SIZE_MAX: usize = 20_000;
pub const SAMPLE_SIZE_STEP: usize = 1000;

/// How the occurrence-time column encodes the clock.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimeEncoding {
    /// `1430` means 14:30.
    Hhmm,
    /// `143000` means 14:30:00.
    Hhmmss,
}

impl TimeEncoding {
    /// Divisor that turns the numeric time into an hour.
    pub fn hour_divisor(self) -> i64 {
        match self {
            TimeEncoding::Hhmm => 100,
            TimeEncoding::Hhmmss => 10_000,
        }
    }
}

/// Settings the feature pipeline depends on.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Substring the vehicle-category column must contain.
    pub vehicle_keyword: String,
    pub time_encoding: TimeEncoding,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            vehicle_keyword: "機車".to_string(),
            time_encoding: TimeEncoding::Hhmm,
        }
    }
}

/// Full application configuration.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct DashboardConfig {
    /// Snapshot produced by the conversion step.
    pub snapshot_path: PathBuf,
    #[serde(flatten)]
    pub pipeline: PipelineConfig,
    /// City pre-selected when the dashboard opens, if present in the data.
    pub default_city: String,
    pub default_sample_size: usize,
    /// Rows in the "most dangerous locations" table.
    pub location_top_n: usize,
    /// Bars in the categorical top-N charts and causes in the cross-tabs.
    pub category_top_n: usize,
    /// Font with CJK glyphs; falls back to well-known system fonts.
    pub cjk_font_path: Option<PathBuf>,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            snapshot_path: PathBuf::from("all_accidents_data.parquet"),
            pipeline: PipelineConfig::default(),
            default_city: "臺北市政府警察局".to_string(),
            default_sample_size: 5000,
            location_top_n: 10,
            category_top_n: 5,
            cjk_font_path: None,
        }
    }
}

impl DashboardConfig {
    /// Read a config file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        let config: DashboardConfig = serde_json::from_str(&text)
            .with_context(|| format!("parsing config {}", path.display()))?;
        Ok(config.normalized())
    }

    /// Locate and read the config; defaults when absent or broken.
    pub fn load() -> Self {
        let path = std::env::var_os(CONFIG_ENV)
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(CONFIG_FILE));

        if !path.exists() {
            log::debug!("No config at {}, using defaults", path.display());
            return Self::default();
        }

        match Self::from_file(&path) {
            Ok(config) => {
                log::info!("Loaded config from {}", path.display());
                config
            }
            Err(e) => {
                log::warn!("Ignoring config: {e:#}");
                Self::default()
            }
        }
    }

    fn normalized(mut self) -> Self {
        self.default_sample_size = clamp_sample_size(self.default_sample_size);
        self.location_top_n = self.location_top_n.max(1);
        self.category_top_n = self.category_top_n.max(1);
        self
    }
}

/// Snap a sample size onto the slider grid.
pub fn clamp_sample_size(n: usize) -> usize {
    let snapped = n.saturating_add(SAMPLE_SIZE_STEP / 2) / SAMPLE_SIZE_STEP * SAMPLE_SIZE_STEP;
    snapped.clamp(SAMPLE_SIZE_MIN, SAMPLE_SIZE_MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_config_keeps_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dashboard.json");
        std::fs::write(
            &path,
            r#"{ "snapshot_path": "data/snap.parquet", "time_encoding": "hhmmss", "default_sample_size": 123456 }"#,
        )
        .unwrap();

        let config = DashboardConfig::from_file(&path).unwrap();
        assert_eq!(config.snapshot_path, PathBuf::from("data/snap.parquet"));
        assert_eq!(config.pipeline.time_encoding, TimeEncoding::Hhmmss);
        assert_eq!(config.pipeline.vehicle_keyword, "機車");
        assert_eq!(config.default_sample_size, SAMPLE_SIZE_MAX);
        assert_eq!(config.location_top_n, 10);
    }

    #[test]
    fn malformed_config_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dashboard.json");
        std::fs::write(&path, "{ not json").unwrap();
        assert!(DashboardConfig::from_file(&path).is_err());
    }

    #[test]
    fn sample_size_snaps_to_slider_grid() {
        assert_eq!(clamp_sample_size(0), 1000);
        assert_eq!(clamp_sample_size(5000), 5000);
        assert_eq!(clamp_sample_size(5400), 5000);
        assert_eq!(clamp_sample_size(5600), 6000);
        assert_eq!(clamp_sample_size(99_999), 20_000);
        assert_eq!(clamp_sample_size(usize::MAX), 20_000);
    }

    #[test]
    fn huge_sample_size_in_config_is_clamped() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dashboard.json");
        std::fs::write(&path, r#"{ "default_sample_size": 18446744073709551615 }"#).unwrap();

        let config = DashboardConfig::from_file(&path).unwrap();
        assert_eq!(config.default_sample_size, SAMPLE_SIZE_MAX);
    }
}

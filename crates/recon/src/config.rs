use serde::Deserialize;

use crate::error::ReconError;
use crate::sky::CompareMode;

/// Seconds in a day; wrapped weather timestamps are shifted back by this much.
pub const DAY_SECS: i64 = 86_400;

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct ReconConfig {
    #[serde(default = "default_detector")]
    pub detector: String,
    #[serde(default)]
    pub timeline: TimelineConfig,
    #[serde(default)]
    pub weather: WeatherConfig,
    #[serde(default)]
    pub corrections: CorrectionConfig,
    #[serde(default)]
    pub merge: MergeConfig,
    #[serde(default)]
    pub assign: AssignConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

fn default_detector() -> String {
    "tale".into()
}

impl Default for ReconConfig {
    fn default() -> Self {
        Self {
            detector: default_detector(),
            timeline: TimelineConfig::default(),
            weather: WeatherConfig::default(),
            corrections: CorrectionConfig::default(),
            merge: MergeConfig::default(),
            assign: AssignConfig::default(),
            output: OutputConfig::default(),
        }
    }
}

// ---------------------------------------------------------------------------
// Timeline
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct TimelineConfig {
    /// Longest a data part may last; recorded on each segment as a safety bound.
    #[serde(default = "default_twenty_minutes")]
    pub max_part_secs: i64,
    /// Added to a part's start when no stop can be recovered from alarms.
    #[serde(default = "default_twenty_minutes")]
    pub fallback_stop_secs: i64,
}

fn default_twenty_minutes() -> i64 {
    20 * 60
}

impl Default for TimelineConfig {
    fn default() -> Self {
        Self {
            max_part_secs: default_twenty_minutes(),
            fallback_stop_secs: default_twenty_minutes(),
        }
    }
}

// ---------------------------------------------------------------------------
// Weather
// ---------------------------------------------------------------------------

/// Runners sometimes arrive early and enter codes before midnight UTC.
/// Timestamps in `[wrap_start, wrap_end)` are moved to the previous day
/// (negative offsets) so they compare correctly against the run.
#[derive(Debug, Clone, Deserialize)]
pub struct WeatherConfig {
    #[serde(default = "default_wrap_start")]
    pub wrap_start: i64,
    #[serde(default = "default_wrap_end")]
    pub wrap_end: i64,
}

fn default_wrap_start() -> i64 {
    61_200 // 17:00 UTC
}

fn default_wrap_end() -> i64 {
    DAY_SECS
}

impl Default for WeatherConfig {
    fn default() -> Self {
        Self {
            wrap_start: default_wrap_start(),
            wrap_end: default_wrap_end(),
        }
    }
}

impl WeatherConfig {
    pub fn shift(&self, t: i64) -> i64 {
        if self.wrap_start <= t && t < self.wrap_end {
            t - DAY_SECS
        } else {
            t
        }
    }
}

// ---------------------------------------------------------------------------
// Corrections + Merge
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct CorrectionConfig {
    #[serde(default = "default_correction_window")]
    pub window_secs: i64,
}

fn default_correction_window() -> i64 {
    600
}

impl Default for CorrectionConfig {
    fn default() -> Self {
        Self {
            window_secs: default_correction_window(),
        }
    }
}

/// Detectors listed here fill long gaps between local codes with remote ones.
#[derive(Debug, Clone, Deserialize)]
pub struct MergeConfig {
    #[serde(default = "default_merge_detectors")]
    pub detectors: Vec<String>,
    #[serde(default = "default_max_gap")]
    pub max_gap_secs: i64,
}

fn default_merge_detectors() -> Vec<String> {
    vec!["brtax4".into()]
}

fn default_max_gap() -> i64 {
    2 * 3600
}

impl Default for MergeConfig {
    fn default() -> Self {
        Self {
            detectors: default_merge_detectors(),
            max_gap_secs: default_max_gap(),
        }
    }
}

impl MergeConfig {
    pub fn applies_to(&self, detector: &str) -> bool {
        self.detectors.iter().any(|d| d.eq_ignore_ascii_case(detector))
    }
}

// ---------------------------------------------------------------------------
// Assign + Output
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AssignConfig {
    #[serde(default)]
    pub mode: CompareMode,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    #[serde(default = "default_output_dir")]
    pub dir: String,
}

fn default_output_dir() -> String {
    "weather_files".into()
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: default_output_dir(),
        }
    }
}

// ---------------------------------------------------------------------------
// Parse + Validate
// ---------------------------------------------------------------------------

impl ReconConfig {
    pub fn from_toml(input: &str) -> Result<Self, ReconError> {
        let config: ReconConfig =
            toml::from_str(input).map_err(|e| ReconError::ConfigParse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ReconError> {
        if self.detector.trim().is_empty() {
            return Err(ReconError::ConfigValidation("detector must not be empty".into()));
        }

        let positive = [
            ("timeline.max_part_secs", self.timeline.max_part_secs),
            ("timeline.fallback_stop_secs", self.timeline.fallback_stop_secs),
            ("corrections.window_secs", self.corrections.window_secs),
            ("merge.max_gap_secs", self.merge.max_gap_secs),
        ];
        for (name, value) in positive {
            if value <= 0 {
                return Err(ReconError::ConfigValidation(format!(
                    "{name} must be positive, got {value}"
                )));
            }
        }

        let w = &self.weather;
        if w.wrap_start >= w.wrap_end || w.wrap_start < 0 || w.wrap_end > DAY_SECS {
            return Err(ReconError::ConfigValidation(format!(
                "weather wrap window [{}, {}) must lie within one day and be non-empty",
                w.wrap_start, w.wrap_end
            )));
        }

        Ok(())
    }

    /// Whether remote codes are merged into the local list for this run.
    pub fn merges_remote(&self) -> bool {
        self.merge.applies_to(&self.detector)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_config_uses_defaults() {
        let config = ReconConfig::from_toml("").unwrap();
        assert_eq!(config.detector, "tale");
        assert_eq!(config.timeline.max_part_secs, 1200);
        assert_eq!(config.timeline.fallback_stop_secs, 1200);
        assert_eq!(config.weather.wrap_start, 61200);
        assert_eq!(config.weather.wrap_end, 86400);
        assert_eq!(config.corrections.window_secs, 600);
        assert_eq!(config.merge.max_gap_secs, 7200);
        assert_eq!(config.assign.mode, CompareMode::TimeWeighted);
        assert_eq!(config.output.dir, "weather_files");
        assert!(!config.merges_remote());
    }

    #[test]
    fn parse_full_config() {
        let input = r#"
detector = "BRTAX4"

[timeline]
max_part_secs = 1500
fallback_stop_secs = 900

[corrections]
window_secs = 300

[merge]
detectors = ["brtax4", "mdtax4"]
max_gap_secs = 3600

[assign]
mode = "worse"

[output]
dir = "/data/weather"
"#;
        let config = ReconConfig::from_toml(input).unwrap();
        assert_eq!(config.timeline.fallback_stop_secs, 900);
        assert_eq!(config.corrections.window_secs, 300);
        assert_eq!(config.assign.mode, CompareMode::Worse);
        assert_eq!(config.output.dir, "/data/weather");
        assert!(config.merges_remote(), "detector match is case-insensitive");
    }

    #[test]
    fn reject_unknown_mode() {
        let err = ReconConfig::from_toml("[assign]\nmode = \"median\"\n").unwrap_err();
        assert!(matches!(err, ReconError::ConfigParse(_)));
    }

    #[test]
    fn reject_non_positive_window() {
        let err = ReconConfig::from_toml("[corrections]\nwindow_secs = 0\n").unwrap_err();
        assert!(err.to_string().contains("corrections.window_secs"));
    }

    #[test]
    fn reject_inverted_wrap_window() {
        let err = ReconConfig::from_toml("[weather]\nwrap_start = 80000\nwrap_end = 70000\n")
            .unwrap_err();
        assert!(err.to_string().contains("wrap window"));
    }

    #[test]
    fn wrap_shift_is_half_open() {
        let w = WeatherConfig::default();
        assert_eq!(w.shift(61_199), 61_199);
        assert_eq!(w.shift(61_200), 61_200 - DAY_SECS);
        assert_eq!(w.shift(86_399), -1);
        assert_eq!(w.shift(3_600), 3_600);
    }
}

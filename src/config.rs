//! Configuration bundle for the full pipeline.
//!
//! Every field falls back to its default, so a partial JSON object is a
//! valid configuration:
//!
//! ```
//! use igc_thermals::AnalysisConfig;
//!
//! let config = AnalysisConfig::from_json(r#"{"thermal": {"min_turn_deg": 330.0}}"#).unwrap();
//! assert_eq!(config.thermal.min_turn_deg, 330.0);
//! assert_eq!(config.thermal.window_pts, 70);
//! assert_eq!(config.series_window_sec, 5);
//! ```

use serde::{Deserialize, Serialize};

use crate::climb::ClimbDetectConfig;
use crate::error::{AnalysisError, Result};
use crate::series::DEFAULT_WINDOW_SEC;
use crate::thermal::DetectThermalCirclesConfig;
use crate::wind::WindConfig;

/// Parameters for every stage of [`analyze_flight`](crate::analyze_flight).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Bucket length of the window series (seconds).
    /// Default: 5
    pub series_window_sec: u32,
    pub climb: ClimbDetectConfig,
    pub thermal: DetectThermalCirclesConfig,
    pub wind: WindConfig,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            series_window_sec: DEFAULT_WINDOW_SEC,
            climb: ClimbDetectConfig::default(),
            thermal: DetectThermalCirclesConfig::default(),
            wind: WindConfig::default(),
        }
    }
}

impl AnalysisConfig {
    /// Parse and validate a JSON configuration. Missing keys take defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: AnalysisConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize to pretty JSON.
    pub fn to_json(&self) -> String {
        serde_json::to_string_pretty(self).unwrap_or_else(|_| "{}".to_string())
    }

    pub fn validate(&self) -> Result<()> {
        if self.series_window_sec == 0 {
            return Err(AnalysisError::config("series_window_sec must be at least 1"));
        }
        self.climb.validate()?;
        self.thermal.validate()?;
        self.wind.validate()
    }
}

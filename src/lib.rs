//! # IGC Thermals
//!
//! Flight-track signal analysis for paragliding and hang-gliding IGC logs.
//!
//! This library provides:
//! - IGC B-record parsing into time-ordered fixes
//! - Per-fix and fixed-window motion series (altitude, vario, ground speed)
//! - Climb phase segmentation over the altitude trace
//! - Thermal circle detection with wind drift compensation
//! - Wind estimation from ground track geometry
//!
//! ## Features
//!
//! - **`parallel`** - Run per-climb thermal detection in parallel with rayon
//!
//! ## Quick Start
//!
//! ```rust
//! use igc_thermals::{
//!     detect_climb_phases, detect_thermal_circles_in_climbs, parse_igc_fixes,
//!     ClimbDetectConfig, ClimbRange, DetectThermalCirclesConfig,
//! };
//!
//! let igc = "B1200004630000N00800000EA0100001000\nB1200014630001N00800000EA0100001001\n";
//! let fixes = parse_igc_fixes(igc);
//! assert_eq!(fixes.len(), 2);
//!
//! let climbs = detect_climb_phases(&fixes, &ClimbDetectConfig::default());
//! let ranges: Vec<ClimbRange> = climbs.iter().map(ClimbRange::from).collect();
//! let circles =
//!     detect_thermal_circles_in_climbs(&fixes, &ranges, &DetectThermalCirclesConfig::default());
//! assert!(circles.is_empty());
//! ```

use serde::{Deserialize, Serialize};

// Unified error handling
pub mod error;
pub use error::{AnalysisError, Result};

// Geographic utilities (distance, projection, bearings, angles)
pub mod geo_utils;

// IGC flight-recorder parsing
pub mod igc;
pub use igc::{parse_igc, parse_igc_fixes, IgcFlight, IgcHeader};

// Derived time series and flight summary
pub mod series;
pub use series::{
    build_flight_series, summarize_flight, FlightSeries, FlightSummary, SeriesPoint, WindowPoint,
    DEFAULT_WINDOW_SEC,
};

// Climb phase segmentation
pub mod climb;
pub use climb::{detect_climb_phases, ClimbDetectConfig, ClimbPhase};

// Thermal circle detection
pub mod thermal;
pub use thermal::{
    detect_thermal_circles_in_climbs, resolve_climb_range, ClimbRange,
    DetectThermalCirclesConfig, ThermalCircle, TurnDirection,
};

// Wind estimation
pub mod wind;
pub use wind::{
    estimate_wind, estimate_wind_opposite, estimate_wind_window, WindConfig, WindEstimate,
    WindEstimates, WindMethod,
};

// Background thermal detection
pub mod worker;
pub use worker::{ThermalResult, ThermalWorker};

// Configuration bundle
pub mod config;
pub use config::AnalysisConfig;

// One-call pipeline
pub mod analysis;
pub use analysis::{analyze_flight, analyze_parsed, FlightAnalysis};

// Deterministic synthetic flights for tests and benchmarks
pub mod synthetic;

// ============================================================================
// Core Types
// ============================================================================

/// One GPS/barometric sample from a flight recorder.
///
/// # Example
/// ```
/// use igc_thermals::FixPoint;
/// let fix = FixPoint::new(43_200, 46.5, 8.0, 1500.0); // 12:00:00 UTC
/// assert!(fix.is_valid());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FixPoint {
    /// Seconds since UTC midnight of the flight date
    pub t_sec: i64,
    /// Latitude in decimal degrees
    pub lat: f64,
    /// Longitude in decimal degrees
    pub lon: f64,
    /// Altitude in meters (GNSS preferred over pressure)
    pub altitude_m: f64,
}

impl FixPoint {
    /// Create a new fix.
    pub fn new(t_sec: i64, lat: f64, lon: f64, altitude_m: f64) -> Self {
        Self {
            t_sec,
            lat,
            lon,
            altitude_m,
        }
    }

    /// Check that every numeric field is finite and coordinates are in range.
    pub fn is_valid(&self) -> bool {
        self.lat.is_finite()
            && self.lon.is_finite()
            && self.altitude_m.is_finite()
            && (-90.0..=90.0).contains(&self.lat)
            && (-180.0..=180.0).contains(&self.lon)
    }
}

// ============================================================================
// Tests
// ============================================================================

//! # Thermal Circle Detection
//!
//! Finds circling inside climb phases and measures the wind drift of each
//! circling segment.
//!
//! ## Algorithm
//! 1. Resolve each climb (index or time range) to a fix-index range
//! 2. Slide a `window_pts` window by `step_pts` across the range and fit a
//!    drift-compensated circle to each window (see [`evaluate_window`])
//! 3. Merge accepted windows separated by at most `merge_gap_pts` fixes
//! 4. Per merged interval, take the best-quality window as representative,
//!    trim `backtrack_pts / 2` fixes off each end, and measure the drift over
//!    whole turns of the trimmed interval
//! 5. Keep at most `max_circles_per_climb` circles per climb, by quality
//!
//! Circles from different climbs that overlap are merged into one circle
//! spanning both, carrying the metadata of the better one.
//!
//! ## Whole-turn drift
//! Start-to-end displacement of a window carries its circling phase, and
//! the straight fixes at either end of an interval do not circle at all.
//! The emitted drift is measured over one-turn spans of the circling core
//! of the trimmed interval (see `drift.rs`). Without a core the
//! representative window's drift is used.

mod drift;
mod merge;
mod window;

use log::{debug, info};
#[cfg(feature = "parallel")]
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::climb::ClimbPhase;
use crate::error::{AnalysisError, Result};
use crate::geo_utils::vector_to_direction;
use crate::FixPoint;

use drift::whole_turn_drift;
pub(crate) use merge::{merge_overlapping_circles, merge_windows, MergedInterval};
pub use window::{
    evaluate_window, window_quality, WindowFit, WindowRejection, MIN_WINDOW_SPAN_SEC,
};

// ============================================================================
// Configuration
// ============================================================================

/// Thresholds for thermal circle detection, tuned for 1 Hz logging.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectThermalCirclesConfig {
    /// Fixes per evaluation window. Should span at least one full turn.
    /// Default: 70
    pub window_pts: usize,
    /// Fixes between consecutive window starts.
    /// Default: 5
    pub step_pts: usize,
    /// Minimum accumulated turn around the window centroid (degrees).
    /// Default: 300.0
    pub min_turn_deg: f64,
    /// Minimum mean circling radius (meters).
    /// Default: 15.0
    pub min_radius_m: f64,
    /// Maximum mean circling radius (meters).
    /// Default: 150.0
    pub max_radius_m: f64,
    /// Extra allowance above `max_radius_m` (meters).
    /// Default: 30.0
    pub max_radius_slack_m: f64,
    /// Maximum radius standard deviation relative to the mean.
    /// Default: 0.35
    pub max_radius_rel_std: f64,
    /// Minimum fraction of steps turning in the dominant direction.
    /// Default: 0.8
    pub min_sign_consistency: f64,
    /// Minimum altitude gain across a window (meters), unchecked when `None`.
    /// Default: None
    pub min_alt_gain_m: Option<f64>,
    /// Accepted windows closer than this many fixes are merged.
    /// Default: 5
    pub merge_gap_pts: usize,
    /// Total fixes trimmed from a merged interval (half at each end).
    /// Default: 10
    pub backtrack_pts: usize,
    /// Maximum circles kept per climb.
    /// Default: 20
    pub max_circles_per_climb: usize,
}

impl Default for DetectThermalCirclesConfig {
    fn default() -> Self {
        Self {
            window_pts: 70,
            step_pts: 5,
            min_turn_deg: 300.0,
            min_radius_m: 15.0,
            max_radius_m: 150.0,
            max_radius_slack_m: 30.0,
            max_radius_rel_std: 0.35,
            min_sign_consistency: 0.8,
            min_alt_gain_m: None,
            merge_gap_pts: 5,
            backtrack_pts: 10,
            max_circles_per_climb: 20,
        }
    }
}

impl DetectThermalCirclesConfig {
    pub fn validate(&self) -> Result<()> {
        if self.window_pts < 3 {
            return Err(AnalysisError::config("thermal.window_pts must be at least 3"));
        }
        if self.step_pts == 0 {
            return Err(AnalysisError::config("thermal.step_pts must be at least 1"));
        }
        if !(self.min_turn_deg.is_finite() && self.min_turn_deg >= 0.0) {
            return Err(AnalysisError::config("thermal.min_turn_deg must be >= 0"));
        }
        if !(self.min_radius_m.is_finite() && self.min_radius_m >= 0.0) {
            return Err(AnalysisError::config("thermal.min_radius_m must be >= 0"));
        }
        if !(self.max_radius_m.is_finite() && self.max_radius_m >= self.min_radius_m) {
            return Err(AnalysisError::config(
                "thermal.max_radius_m must be >= thermal.min_radius_m",
            ));
        }
        if !(self.max_radius_slack_m.is_finite() && self.max_radius_slack_m >= 0.0) {
            return Err(AnalysisError::config("thermal.max_radius_slack_m must be >= 0"));
        }
        if !(self.max_radius_rel_std.is_finite() && self.max_radius_rel_std >= 0.0) {
            return Err(AnalysisError::config("thermal.max_radius_rel_std must be >= 0"));
        }
        if !(0.0..=1.0).contains(&self.min_sign_consistency) {
            return Err(AnalysisError::config(
                "thermal.min_sign_consistency must be within [0, 1]",
            ));
        }
        if let Some(gain) = self.min_alt_gain_m {
            if !gain.is_finite() {
                return Err(AnalysisError::config("thermal.min_alt_gain_m must be finite"));
            }
        }
        if self.max_circles_per_climb == 0 {
            return Err(AnalysisError::config(
                "thermal.max_circles_per_climb must be at least 1",
            ));
        }
        Ok(())
    }
}

// ============================================================================
// Types
// ============================================================================

/// Turning sense of a circle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TurnDirection {
    /// Counter-clockwise seen from above
    Left,
    /// Clockwise seen from above
    Right,
}

/// A climb to search, by fix index or by time.
///
/// Serialized with a `kind` tag:
/// `{"kind":"indices","startIdx":10,"endIdx":90}` or
/// `{"kind":"times","startSec":10.0,"endSec":90.0}`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum ClimbRange {
    /// Inclusive fix indices
    #[serde(rename_all = "camelCase")]
    Indices { start_idx: usize, end_idx: usize },
    /// Seconds since the first fix
    #[serde(rename_all = "camelCase")]
    Times { start_sec: f64, end_sec: f64 },
}

impl From<&ClimbPhase> for ClimbRange {
    fn from(phase: &ClimbPhase) -> Self {
        ClimbRange::Indices {
            start_idx: phase.start_idx,
            end_idx: phase.end_idx,
        }
    }
}

impl From<ClimbPhase> for ClimbRange {
    fn from(phase: ClimbPhase) -> Self {
        ClimbRange::from(&phase)
    }
}

/// A detected circling segment.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ThermalCircle {
    pub start_idx: usize,
    /// Inclusive
    pub end_idx: usize,
    /// Seconds since the first fix
    pub start_sec: i64,
    pub end_sec: i64,
    /// Thermal drift east, m/s
    pub drift_vx_ms: f64,
    /// Thermal drift north, m/s
    pub drift_vy_ms: f64,
    /// Magnitude of the drift
    pub wind_speed_ms: f64,
    /// Downwind direction of the drift, 0 = N, 90 = E
    pub wind_dir_deg: f64,
    /// Unsigned accumulated turn
    pub turn_deg: f64,
    pub r_mean_m: f64,
    pub r_std_m: f64,
    /// Confidence score in [0, 1]
    pub quality: f64,
    pub direction: TurnDirection,
    /// Vertical speed across the segment, m/s
    pub climb_rate_ms: f64,
}

// ============================================================================
// Range Resolution
// ============================================================================

/// Resolve a climb range to inclusive fix indices.
///
/// Index ranges are clamped to the fix array. Time ranges scan forward for
/// the first fix at or after `start_sec` and backward for the last fix at or
/// before `end_sec`. Returns `None` for an empty or inverted result.
pub fn resolve_climb_range(fixes: &[FixPoint], range: &ClimbRange) -> Option<(usize, usize)> {
    let last = fixes.len().checked_sub(1)?;

    let (start, end) = match *range {
        ClimbRange::Indices { start_idx, end_idx } => (start_idx, end_idx.min(last)),
        ClimbRange::Times { start_sec, end_sec } => {
            if !(start_sec.is_finite() && end_sec.is_finite()) {
                return None;
            }
            let t0 = fixes[0].t_sec;
            let rel = |i: usize| (fixes[i].t_sec - t0) as f64;

            let mut start = 0;
            while start < last && rel(start) < start_sec {
                start += 1;
            }
            let mut end = last;
            while end > 0 && rel(end) > end_sec {
                end -= 1;
            }
            (start, end)
        }
    };

    (start <= end).then_some((start, end))
}

// ============================================================================
// Detection
// ============================================================================

/// Detect thermal circles inside the given climbs.
///
/// Climbs that do not resolve, or are shorter than one window, contribute
/// nothing. The result is sorted by start index.
pub fn detect_thermal_circles_in_climbs(
    fixes: &[FixPoint],
    climbs: &[ClimbRange],
    config: &DetectThermalCirclesConfig,
) -> Vec<ThermalCircle> {
    if fixes.len() < 3 || climbs.is_empty() {
        return Vec::new();
    }

    #[cfg(feature = "parallel")]
    let per_climb: Vec<Vec<ThermalCircle>> = climbs
        .par_iter()
        .map(|range| detect_for_range(fixes, range, config))
        .collect();

    #[cfg(not(feature = "parallel"))]
    let per_climb: Vec<Vec<ThermalCircle>> = climbs
        .iter()
        .map(|range| detect_for_range(fixes, range, config))
        .collect();

    let found: usize = per_climb.iter().map(Vec::len).sum();
    let circles = merge_overlapping_circles(per_climb.into_iter().flatten().collect());

    info!(
        "[Thermals] Detected {} circles in {} climbs ({} before cross-climb merge)",
        circles.len(),
        climbs.len(),
        found
    );
    circles
}

fn detect_for_range(
    fixes: &[FixPoint],
    range: &ClimbRange,
    config: &DetectThermalCirclesConfig,
) -> Vec<ThermalCircle> {
    match resolve_climb_range(fixes, range) {
        Some((start, end)) => detect_in_range(fixes, start, end, config),
        None => {
            debug!("[Thermals] Climb {:?} does not resolve to any fixes", range);
            Vec::new()
        }
    }
}

/// Detect circles within one resolved climb.
///
/// `end` is clamped to the last fix; an inverted range yields nothing.
pub fn detect_in_range(
    fixes: &[FixPoint],
    start: usize,
    end: usize,
    config: &DetectThermalCirclesConfig,
) -> Vec<ThermalCircle> {
    let Some(last) = fixes.len().checked_sub(1) else {
        return Vec::new();
    };
    let end = end.min(last);
    if start > end {
        return Vec::new();
    }

    let starts = window_starts(start, end, config.window_pts, config.step_pts);

    let mut accepted = Vec::new();
    let mut rejected = 0usize;
    for s in starts {
        match evaluate_window(fixes, s, s + config.window_pts - 1, config) {
            Ok(fit) => accepted.push(fit),
            Err(_) => rejected += 1,
        }
    }

    let intervals = merge_windows(accepted, config.merge_gap_pts);
    let mut circles: Vec<ThermalCircle> = intervals
        .iter()
        .map(|interval| build_circle(fixes, interval, config))
        .collect();

    debug!(
        "[Thermals] Climb {}..{}: {} windows rejected, {} intervals",
        start,
        end,
        rejected,
        circles.len()
    );

    if circles.len() > config.max_circles_per_climb {
        circles.sort_by(|a, b| b.quality.total_cmp(&a.quality));
        circles.truncate(config.max_circles_per_climb);
        circles.sort_by_key(|c| c.start_idx);
    }
    circles
}

/// Window start indices over `[start, end]`.
///
/// When stepping leaves fixes uncovered at the tail, one more window is
/// aligned to end exactly at `end`.
fn window_starts(start: usize, end: usize, window_pts: usize, step_pts: usize) -> Vec<usize> {
    if window_pts == 0 || step_pts == 0 || end < start || end - start + 1 < window_pts {
        return Vec::new();
    }
    let last_start = end + 1 - window_pts;

    let mut starts: Vec<usize> = (start..=last_start).step_by(step_pts).collect();
    if starts.last().is_some_and(|&s| s < last_start) {
        starts.push(last_start);
    }
    starts
}

fn build_circle(
    fixes: &[FixPoint],
    interval: &MergedInterval,
    config: &DetectThermalCirclesConfig,
) -> ThermalCircle {
    let rep = &interval.representative;
    let (start, end) = trimmed(interval.start_idx, interval.end_idx, config.backtrack_pts / 2);
    debug!(
        "[Thermals] Interval {}..{} from {} windows, trimmed to {}..{}",
        interval.start_idx, interval.end_idx, interval.window_count, start, end
    );

    let turns = whole_turn_drift(fixes, interval, start, end);
    let (drift_vx_ms, drift_vy_ms) = turns.drift.unwrap_or((rep.drift_vx_ms, rep.drift_vy_ms));
    let (r_mean_m, r_std_m) = turns.radius.unwrap_or((rep.r_mean_m, rep.r_std_m));
    let (wind_speed_ms, wind_dir_deg) = vector_to_direction(drift_vx_ms, drift_vy_ms);

    let t0 = fixes[0].t_sec;
    let dt = (fixes[end].t_sec - fixes[start].t_sec) as f64;
    let climb_rate_ms = if dt > 0.0 {
        (fixes[end].altitude_m - fixes[start].altitude_m) / dt
    } else {
        0.0
    };

    ThermalCircle {
        start_idx: start,
        end_idx: end,
        start_sec: fixes[start].t_sec - t0,
        end_sec: fixes[end].t_sec - t0,
        drift_vx_ms,
        drift_vy_ms,
        wind_speed_ms,
        wind_dir_deg,
        turn_deg: rep.turn_deg.max(turns.turn_deg),
        r_mean_m,
        r_std_m,
        quality: rep.quality,
        direction: rep.direction,
        climb_rate_ms,
    }
}

/// Trim `trim` fixes off each end, unless that leaves fewer than three.
fn trimmed(start: usize, end: usize, trim: usize) -> (usize, usize) {
    if end >= start + 2 * trim + 2 {
        (start + trim, end - trim)
    } else {
        (start, end)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::synthetic::SyntheticFlight;

    fn fixes_at_1hz(n: i64) -> Vec<FixPoint> {
        (0..n)
            .map(|i| FixPoint::new(1000 + i, 46.5, 8.0, 1000.0))
            .collect()
    }

    /// Straight lead-in, 120 s of left circling, straight exit.
    fn thermal_flight(wind: (f64, f64), heading_deg: f64) -> Vec<FixPoint> {
        SyntheticFlight::new(46.5, 8.0)
            .wind(wind.0, wind.1)
            .straight(50, heading_deg, 10.0, 0.5)
            .circle(120, 50.0, 30.0, TurnDirection::Left, 0.5)
            .straight(30, heading_deg, 10.0, 0.5)
            .fixes()
    }

    #[test]
    fn test_resolve_indices_clamped() {
        let fixes = fixes_at_1hz(10);
        let range = ClimbRange::Indices { start_idx: 2, end_idx: 50 };
        assert_eq!(resolve_climb_range(&fixes, &range), Some((2, 9)));

        let inverted = ClimbRange::Indices { start_idx: 12, end_idx: 50 };
        assert_eq!(resolve_climb_range(&fixes, &inverted), None);
        assert_eq!(resolve_climb_range(&[], &range), None);
    }

    #[test]
    fn test_resolve_times() {
        let fixes = fixes_at_1hz(10);
        let range = ClimbRange::Times { start_sec: 2.5, end_sec: 6.5 };
        assert_eq!(resolve_climb_range(&fixes, &range), Some((3, 6)));

        let whole = ClimbRange::Times { start_sec: -5.0, end_sec: 100.0 };
        assert_eq!(resolve_climb_range(&fixes, &whole), Some((0, 9)));

        let past_end = ClimbRange::Times { start_sec: 50.0, end_sec: 60.0 };
        assert_eq!(resolve_climb_range(&fixes, &past_end), None);

        let nan = ClimbRange::Times { start_sec: f64::NAN, end_sec: 6.0 };
        assert_eq!(resolve_climb_range(&fixes, &nan), None);
    }

    #[test]
    fn test_climb_range_serde_tags() {
        let json = serde_json::to_string(&ClimbRange::Indices { start_idx: 1, end_idx: 5 }).unwrap();
        assert_eq!(json, r#"{"kind":"indices","startIdx":1,"endIdx":5}"#);

        let parsed: ClimbRange =
            serde_json::from_str(r#"{"kind":"times","startSec":10.0,"endSec":20.0}"#).unwrap();
        assert_eq!(parsed, ClimbRange::Times { start_sec: 10.0, end_sec: 20.0 });
    }

    #[test]
    fn test_window_starts_tail_aligned() {
        assert_eq!(window_starts(0, 39, 30, 5), vec![0, 5, 10]);
        assert_eq!(window_starts(0, 41, 30, 5), vec![0, 5, 10, 12]);
        assert_eq!(window_starts(10, 39, 30, 5), vec![10]);
        assert!(window_starts(10, 38, 30, 5).is_empty());
    }

    #[test]
    fn test_trimmed_keeps_short_intervals() {
        assert_eq!(trimmed(100, 200, 5), (105, 195));
        assert_eq!(trimmed(100, 111, 5), (105, 106));
        assert_eq!(trimmed(100, 110, 5), (100, 110));
    }

    #[test]
    fn test_detects_circle_and_recovers_drift() {
        let fixes = thermal_flight((2.0, 1.0), 90.0);
        let climbs = [ClimbRange::Indices { start_idx: 0, end_idx: fixes.len() - 1 }];
        let circles =
            detect_thermal_circles_in_climbs(&fixes, &climbs, &DetectThermalCirclesConfig::default());

        assert_eq!(circles.len(), 1);
        let c = &circles[0];
        assert!(c.start_idx >= 40 && c.start_idx <= 60, "start {}", c.start_idx);
        assert!(c.end_idx >= 160 && c.end_idx <= 185, "end {}", c.end_idx);
        assert!(c.turn_deg >= 1000.0, "turn {}", c.turn_deg);
        assert!((c.r_mean_m - 50.0).abs() < 5.0);
        assert!((c.drift_vx_ms - 2.0).abs() < 0.1, "vx {}", c.drift_vx_ms);
        assert!((c.drift_vy_ms - 1.0).abs() < 0.1, "vy {}", c.drift_vy_ms);
        assert!((c.wind_speed_ms - 5f64.sqrt()).abs() < 0.1);
        assert_eq!(c.direction, TurnDirection::Left);
        assert!((c.climb_rate_ms - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_drift_recovered_for_any_wind() {
        for wind in [(0.0, 0.0), (-3.0, 2.0), (4.0, -4.0)] {
            for heading in [0.0, 200.0] {
                let fixes = thermal_flight(wind, heading);
                let circles = detect_in_range(
                    &fixes,
                    0,
                    fixes.len() - 1,
                    &DetectThermalCirclesConfig::default(),
                );
                assert_eq!(circles.len(), 1, "wind {wind:?} heading {heading}");
                assert!((circles[0].drift_vx_ms - wind.0).abs() < 0.1);
                assert!((circles[0].drift_vy_ms - wind.1).abs() < 0.1);
            }
        }
    }

    #[test]
    fn test_right_turns() {
        let fixes = SyntheticFlight::new(46.5, 8.0)
            .wind(2.0, 1.0)
            .straight(50, 30.0, 10.0, 0.5)
            .circle(120, 60.0, 25.0, TurnDirection::Right, 0.5)
            .straight(30, 30.0, 10.0, 0.5)
            .fixes();
        let circles =
            detect_in_range(&fixes, 0, fixes.len() - 1, &DetectThermalCirclesConfig::default());

        assert_eq!(circles.len(), 1);
        assert_eq!(circles[0].direction, TurnDirection::Right);
        assert!((circles[0].drift_vx_ms - 2.0).abs() < 0.1);
        assert!((circles[0].drift_vy_ms - 1.0).abs() < 0.1);
    }

    #[test]
    fn test_straight_flight_yields_nothing() {
        let fixes = SyntheticFlight::new(46.5, 8.0)
            .wind(2.0, 1.0)
            .straight(400, 90.0, 10.0, 1.0)
            .fixes();
        let climbs = [ClimbRange::Indices { start_idx: 0, end_idx: 399 }];
        let circles =
            detect_thermal_circles_in_climbs(&fixes, &climbs, &DetectThermalCirclesConfig::default());
        assert!(circles.is_empty());
    }

    #[test]
    fn test_climb_shorter_than_window() {
        let fixes = thermal_flight((2.0, 1.0), 90.0);
        let climbs = [ClimbRange::Indices { start_idx: 60, end_idx: 80 }];
        let circles =
            detect_thermal_circles_in_climbs(&fixes, &climbs, &DetectThermalCirclesConfig::default());
        assert!(circles.is_empty());
    }

    #[test]
    fn test_range_past_last_fix_is_clamped() {
        let fixes = thermal_flight((2.0, 1.0), 90.0);
        let config = DetectThermalCirclesConfig::default();

        let clamped = detect_in_range(&fixes, 0, 1000, &config);
        assert_eq!(clamped.len(), 1);
        assert_eq!(clamped, detect_in_range(&fixes, 0, fixes.len() - 1, &config));

        assert!(detect_in_range(&fixes[..50], 0, 200, &config).is_empty());
        assert!(detect_in_range(&fixes, 120, 80, &config).is_empty());
        assert!(detect_in_range(&[], 0, 10, &config).is_empty());
    }

    #[test]
    fn test_time_range_matches_index_range() {
        let fixes = thermal_flight((2.0, 1.0), 90.0);
        let config = DetectThermalCirclesConfig::default();
        let by_index = detect_thermal_circles_in_climbs(
            &fixes,
            &[ClimbRange::Indices { start_idx: 20, end_idx: 190 }],
            &config,
        );
        let by_time = detect_thermal_circles_in_climbs(
            &fixes,
            &[ClimbRange::Times { start_sec: 20.0, end_sec: 190.0 }],
            &config,
        );
        assert_eq!(by_index, by_time);
    }

    #[test]
    fn test_overlapping_climbs_merge_into_one_circle() {
        let fixes = thermal_flight((2.0, 1.0), 90.0);
        let climbs = [
            ClimbRange::Indices { start_idx: 0, end_idx: 130 },
            ClimbRange::Indices { start_idx: 90, end_idx: fixes.len() - 1 },
        ];
        let circles =
            detect_thermal_circles_in_climbs(&fixes, &climbs, &DetectThermalCirclesConfig::default());
        assert_eq!(circles.len(), 1);
    }

    #[test]
    fn test_max_circles_keeps_best() {
        // Two thermals separated by a long glide
        let fixes = SyntheticFlight::new(46.5, 8.0)
            .straight(20, 0.0, 10.0, 0.0)
            .circle(90, 50.0, 30.0, TurnDirection::Left, 1.0)
            .straight(60, 0.0, 10.0, 0.0)
            .circle(90, 80.0, 30.0, TurnDirection::Left, 1.0)
            .straight(20, 0.0, 10.0, 0.0)
            .fixes();
        let config = DetectThermalCirclesConfig::default();
        let all = detect_in_range(&fixes, 0, fixes.len() - 1, &config);
        assert_eq!(all.len(), 2);

        let config = DetectThermalCirclesConfig {
            max_circles_per_climb: 1,
            ..Default::default()
        };
        let best = detect_in_range(&fixes, 0, fixes.len() - 1, &config);
        assert_eq!(best.len(), 1);
        let top = all.iter().map(|c| c.quality).fold(0.0, f64::max);
        assert_eq!(best[0].quality, top);
    }

    #[test]
    fn test_validate() {
        assert!(DetectThermalCirclesConfig::default().validate().is_ok());

        let bad = DetectThermalCirclesConfig {
            min_radius_m: 200.0,
            ..Default::default()
        };
        assert!(bad.validate().is_err());

        let bad = DetectThermalCirclesConfig {
            step_pts: 0,
            ..Default::default()
        };
        assert!(bad.validate().is_err());

        let bad = DetectThermalCirclesConfig {
            min_sign_consistency: 1.5,
            ..Default::default()
        };
        assert!(bad.validate().is_err());
    }
}

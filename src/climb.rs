//! Climb phase segmentation over the altitude trace.
//!
//! A single forward pass drives a two-state machine:
//!
//! ```text
//! Searching --[alt >= baseline + start_gain]--> InSegment
//! Searching --[alt < baseline]--> Searching (baseline moves to the new low)
//! InSegment --[alt > peak]--> InSegment (peak moves)
//! InSegment --[alt <= peak - drop_abs OR alt <= peak * (1 - drop_pct)]--> Searching
//! ```
//!
//! Every exit from `InSegment` (and an open segment at the end of the
//! track) yields a candidate that is kept only if it gained at least
//! `min_gain_m` over at least `min_len_pts` fixes.

use log::{debug, info};
use serde::{Deserialize, Serialize};

use crate::error::{AnalysisError, Result};
use crate::FixPoint;

/// Thresholds for climb phase detection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClimbDetectConfig {
    /// Minimum peak-minus-start gain for a phase to count (meters).
    /// Default: 50.0
    pub min_gain_m: f64,
    /// Gain above the baseline that starts a candidate phase (meters).
    /// Default: 15.0
    pub start_gain_m: f64,
    /// Absolute drop below the peak that ends a phase (meters).
    /// Default: 40.0
    pub drop_abs_m: f64,
    /// Relative drop below the peak that ends a phase (fraction of peak).
    /// Default: 0.10
    pub drop_pct: f64,
    /// Minimum phase length in fixes.
    /// Default: 25
    pub min_len_pts: usize,
}

impl Default for ClimbDetectConfig {
    fn default() -> Self {
        Self {
            min_gain_m: 50.0,
            start_gain_m: 15.0,
            drop_abs_m: 40.0,
            drop_pct: 0.10,
            min_len_pts: 25,
        }
    }
}

impl ClimbDetectConfig {
    pub fn validate(&self) -> Result<()> {
        if !(self.min_gain_m.is_finite() && self.min_gain_m >= 0.0) {
            return Err(AnalysisError::config("climb.min_gain_m must be >= 0"));
        }
        if !(self.start_gain_m.is_finite() && self.start_gain_m >= 0.0) {
            return Err(AnalysisError::config("climb.start_gain_m must be >= 0"));
        }
        if !(self.drop_abs_m.is_finite() && self.drop_abs_m >= 0.0) {
            return Err(AnalysisError::config("climb.drop_abs_m must be >= 0"));
        }
        if !(0.0..=1.0).contains(&self.drop_pct) {
            return Err(AnalysisError::config("climb.drop_pct must be within [0, 1]"));
        }
        if self.min_len_pts < 2 {
            return Err(AnalysisError::config("climb.min_len_pts must be at least 2"));
        }
        Ok(())
    }
}

/// A detected climb over the fix array.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClimbPhase {
    pub start_idx: usize,
    /// Inclusive
    pub end_idx: usize,
    pub peak_idx: usize,
    /// Seconds since the first fix
    pub start_sec: i64,
    pub end_sec: i64,
    pub start_alt_m: f64,
    pub peak_alt_m: f64,
    pub end_alt_m: f64,
    /// Peak minus start
    pub gain_m: f64,
    /// Peak minus end
    pub drop_from_peak_m: f64,
}

impl ClimbPhase {
    /// Number of fixes in the phase.
    pub fn len_pts(&self) -> usize {
        self.end_idx - self.start_idx + 1
    }

    /// Average climb rate from start to peak, m/s.
    pub fn climb_rate_ms(&self, fixes: &[FixPoint]) -> f64 {
        let dt = (fixes[self.peak_idx].t_sec - fixes[self.start_idx].t_sec) as f64;
        if dt <= 0.0 {
            0.0
        } else {
            self.gain_m / dt
        }
    }
}

// ============================================================================
// State Machine
// ============================================================================

/// Detector state between fixes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) enum ClimbState {
    /// Not climbing; tracking the lowest recent fix as baseline.
    Searching { base_idx: usize, base_alt: f64 },
    /// Climbing from `start` with the best altitude so far at `peak`.
    InSegment {
        start_idx: usize,
        start_alt: f64,
        peak_idx: usize,
        peak_alt: f64,
    },
}

/// A finished segment awaiting the accept/reject check.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct SegmentCandidate {
    pub start_idx: usize,
    pub start_alt: f64,
    pub peak_idx: usize,
    pub peak_alt: f64,
    pub end_idx: usize,
    pub end_alt: f64,
}

impl SegmentCandidate {
    fn gain_m(&self) -> f64 {
        self.peak_alt - self.start_alt
    }

    fn len_pts(&self) -> usize {
        self.end_idx - self.start_idx + 1
    }

    pub(crate) fn is_accepted(&self, config: &ClimbDetectConfig) -> bool {
        self.gain_m() >= config.min_gain_m && self.len_pts() >= config.min_len_pts
    }
}

impl ClimbState {
    pub(crate) fn start(idx: usize, alt: f64) -> Self {
        ClimbState::Searching {
            base_idx: idx,
            base_alt: alt,
        }
    }

    /// Feed one fix. Returns the next state and a candidate when a segment ended.
    pub(crate) fn step(
        self,
        idx: usize,
        alt: f64,
        config: &ClimbDetectConfig,
    ) -> (ClimbState, Option<SegmentCandidate>) {
        match self {
            ClimbState::Searching { base_idx, base_alt } => {
                if alt < base_alt {
                    (ClimbState::start(idx, alt), None)
                } else if alt - base_alt >= config.start_gain_m {
                    let next = ClimbState::InSegment {
                        start_idx: base_idx,
                        start_alt: base_alt,
                        peak_idx: idx,
                        peak_alt: alt,
                    };
                    (next, None)
                } else {
                    (self, None)
                }
            }
            ClimbState::InSegment {
                start_idx,
                start_alt,
                peak_idx,
                peak_alt,
            } => {
                if alt > peak_alt {
                    let next = ClimbState::InSegment {
                        start_idx,
                        start_alt,
                        peak_idx: idx,
                        peak_alt: alt,
                    };
                    return (next, None);
                }

                // Reaching either drop threshold alone ends the segment
                let below_abs = alt <= peak_alt - config.drop_abs_m;
                let below_pct = alt <= peak_alt * (1.0 - config.drop_pct);
                if below_abs || below_pct {
                    let candidate = SegmentCandidate {
                        start_idx,
                        start_alt,
                        peak_idx,
                        peak_alt,
                        end_idx: idx,
                        end_alt: alt,
                    };
                    (ClimbState::start(idx, alt), Some(candidate))
                } else {
                    (self, None)
                }
            }
        }
    }

    /// Close an open segment at the end of the track.
    pub(crate) fn finish(self, last_idx: usize, last_alt: f64) -> Option<SegmentCandidate> {
        match self {
            ClimbState::Searching { .. } => None,
            ClimbState::InSegment {
                start_idx,
                start_alt,
                peak_idx,
                peak_alt,
            } => Some(SegmentCandidate {
                start_idx,
                start_alt,
                peak_idx,
                peak_alt,
                end_idx: last_idx,
                end_alt: last_alt,
            }),
        }
    }
}

// ============================================================================
// Detection
// ============================================================================

/// Segment the altitude trace into climb phases.
///
/// Returns an empty list for fewer than two fixes.
///
/// # Example
/// ```
/// use igc_thermals::{detect_climb_phases, ClimbDetectConfig, FixPoint};
///
/// let fixes: Vec<FixPoint> = (0..60)
///     .map(|i| FixPoint::new(i, 46.5, 8.0, 1000.0 + i as f64 * 2.0))
///     .collect();
/// let climbs = detect_climb_phases(&fixes, &ClimbDetectConfig::default());
/// assert_eq!(climbs.len(), 1);
/// assert_eq!(climbs[0].gain_m, 118.0);
/// ```
pub fn detect_climb_phases(fixes: &[FixPoint], config: &ClimbDetectConfig) -> Vec<ClimbPhase> {
    if fixes.len() < 2 {
        return Vec::new();
    }

    let t0 = fixes[0].t_sec;
    let to_phase = |c: SegmentCandidate| ClimbPhase {
        start_idx: c.start_idx,
        end_idx: c.end_idx,
        peak_idx: c.peak_idx,
        start_sec: fixes[c.start_idx].t_sec - t0,
        end_sec: fixes[c.end_idx].t_sec - t0,
        start_alt_m: c.start_alt,
        peak_alt_m: c.peak_alt,
        end_alt_m: c.end_alt,
        gain_m: c.gain_m(),
        drop_from_peak_m: c.peak_alt - c.end_alt,
    };

    let mut phases = Vec::new();
    let mut rejected = 0usize;
    let mut state = ClimbState::start(0, fixes[0].altitude_m);

    let mut handle = |candidate: SegmentCandidate, phases: &mut Vec<ClimbPhase>| {
        if candidate.is_accepted(config) {
            phases.push(to_phase(candidate));
        } else {
            debug!(
                "[Climbs] Rejected candidate {}..{} (gain {:.1}m, {} pts)",
                candidate.start_idx,
                candidate.end_idx,
                candidate.gain_m(),
                candidate.len_pts()
            );
            rejected += 1;
        }
    };

    for (idx, fix) in fixes.iter().enumerate().skip(1) {
        let (next, ended) = state.step(idx, fix.altitude_m, config);
        if let Some(candidate) = ended {
            handle(candidate, &mut phases);
        }
        state = next;
    }

    let last_idx = fixes.len() - 1;
    if let Some(candidate) = state.finish(last_idx, fixes[last_idx].altitude_m) {
        handle(candidate, &mut phases);
    }

    info!(
        "[Climbs] Detected {} climb phases ({} candidates rejected)",
        phases.len(),
        rejected
    );
    phases
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fixes_from_altitudes(alts: &[f64]) -> Vec<FixPoint> {
        alts.iter()
            .enumerate()
            .map(|(i, &a)| FixPoint::new(36_000 + i as i64, 46.5, 8.0, a))
            .collect()
    }

    /// `count` points rising linearly from `from` to exactly `from + gain`.
    fn linear(from: f64, gain: f64, count: usize) -> Vec<f64> {
        (0..count)
            .map(|i| from + gain * i as f64 / (count - 1) as f64)
            .collect()
    }

    #[test]
    fn test_exact_thresholds_accepted() {
        let config = ClimbDetectConfig::default();
        let fixes = fixes_from_altitudes(&linear(1000.0, 50.0, 25));
        let climbs = detect_climb_phases(&fixes, &config);

        assert_eq!(climbs.len(), 1);
        assert_eq!(climbs[0].start_idx, 0);
        assert_eq!(climbs[0].end_idx, 24);
        assert_eq!(climbs[0].len_pts(), 25);
        assert_eq!(climbs[0].gain_m, 50.0);
        assert_eq!(climbs[0].drop_from_peak_m, 0.0);
    }

    #[test]
    fn test_one_point_short_rejected() {
        let fixes = fixes_from_altitudes(&linear(1000.0, 50.0, 24));
        assert!(detect_climb_phases(&fixes, &ClimbDetectConfig::default()).is_empty());
    }

    #[test]
    fn test_one_meter_short_rejected() {
        let fixes = fixes_from_altitudes(&linear(1000.0, 49.0, 25));
        assert!(detect_climb_phases(&fixes, &ClimbDetectConfig::default()).is_empty());
    }

    #[test]
    fn test_absolute_drop_alone_terminates() {
        // Peak 1000, drop to 959: 41m below peak but above 900 (10% rule)
        let mut alts = linear(900.0, 100.0, 60);
        alts.push(959.0);
        alts.extend(linear(959.0, 141.0, 60).into_iter().skip(1));
        let fixes = fixes_from_altitudes(&alts);

        let climbs = detect_climb_phases(&fixes, &ClimbDetectConfig::default());
        assert_eq!(climbs.len(), 2);

        assert_eq!(climbs[0].peak_idx, 59);
        assert_eq!(climbs[0].end_idx, 60);
        assert_eq!(climbs[0].end_alt_m, 959.0);
        assert_eq!(climbs[0].drop_from_peak_m, 41.0);

        assert_eq!(climbs[1].start_idx, 60);
        assert_eq!(climbs[1].start_alt_m, 959.0);
        assert_eq!(climbs[1].peak_alt_m, 1100.0);
    }

    #[test]
    fn test_drop_of_exactly_abs_threshold_terminates() {
        let mut alts = linear(900.0, 100.0, 60);
        alts.push(960.0);
        alts.extend(linear(960.0, 140.0, 60).into_iter().skip(1));
        let fixes = fixes_from_altitudes(&alts);

        let climbs = detect_climb_phases(&fixes, &ClimbDetectConfig::default());
        assert_eq!(climbs.len(), 2);
        assert_eq!(climbs[0].peak_alt_m, 1000.0);
        assert_eq!(climbs[0].end_idx, 60);
        assert_eq!(climbs[0].drop_from_peak_m, 40.0);
        assert_eq!(climbs[1].start_idx, 60);
        assert_eq!(climbs[1].start_alt_m, 960.0);
        assert_eq!(climbs[1].peak_alt_m, 1100.0);
    }

    #[test]
    fn test_drop_just_short_of_threshold_continues() {
        let mut alts = linear(900.0, 100.0, 60);
        alts.push(961.0);
        alts.extend(linear(961.0, 139.0, 60).into_iter().skip(1));
        let fixes = fixes_from_altitudes(&alts);

        let climbs = detect_climb_phases(&fixes, &ClimbDetectConfig::default());
        assert_eq!(climbs.len(), 1);
        assert_eq!(climbs[0].start_alt_m, 900.0);
        assert_eq!(climbs[0].peak_alt_m, 1100.0);
    }

    #[test]
    fn test_relative_drop_alone_terminates() {
        // Low altitudes: 25m drop from a 200m peak is under drop_abs but over 10%
        let mut alts = linear(100.0, 100.0, 40);
        alts.push(175.0);
        let fixes = fixes_from_altitudes(&alts);

        let climbs = detect_climb_phases(&fixes, &ClimbDetectConfig::default());
        assert_eq!(climbs.len(), 1);
        assert_eq!(climbs[0].end_idx, 40);
        assert_eq!(climbs[0].drop_from_peak_m, 25.0);
    }

    #[test]
    fn test_baseline_follows_lows() {
        // Sink 1000 -> 900 first; the climb must start at the low, not at 1000
        let mut alts = linear(1000.0, -100.0, 30);
        alts.extend(linear(900.0, 120.0, 40).into_iter().skip(1));
        let fixes = fixes_from_altitudes(&alts);

        let climbs = detect_climb_phases(&fixes, &ClimbDetectConfig::default());
        assert_eq!(climbs.len(), 1);
        assert_eq!(climbs[0].start_idx, 29);
        assert_eq!(climbs[0].start_alt_m, 900.0);
        assert!((climbs[0].gain_m - 120.0).abs() < 1e-9);
    }

    #[test]
    fn test_short_segment_discarded_without_partial_credit() {
        // 20m bump then a long climb: the bump must not merge into the climb
        let mut alts = linear(1000.0, 20.0, 10);
        alts.extend(linear(1020.0, -60.0, 10).into_iter().skip(1));
        alts.extend(linear(960.0, 80.0, 40).into_iter().skip(1));
        let fixes = fixes_from_altitudes(&alts);

        let climbs = detect_climb_phases(&fixes, &ClimbDetectConfig::default());
        assert_eq!(climbs.len(), 1);
        assert_eq!(climbs[0].start_alt_m, 960.0);
    }

    #[test]
    fn test_state_machine_transitions() {
        let config = ClimbDetectConfig::default();
        let state = ClimbState::start(0, 1000.0);

        let (state, ended) = state.step(1, 990.0, &config);
        assert_eq!(ended, None);
        assert_eq!(
            state,
            ClimbState::Searching {
                base_idx: 1,
                base_alt: 990.0
            }
        );

        let (state, _) = state.step(2, 1005.0, &config);
        assert!(matches!(state, ClimbState::InSegment { start_idx: 1, .. }));

        let (state, ended) = state.step(3, 960.0, &config);
        let candidate = ended.unwrap();
        assert_eq!(candidate.end_idx, 3);
        assert!(!candidate.is_accepted(&config));
        assert_eq!(state, ClimbState::start(3, 960.0));
        assert_eq!(state.finish(3, 960.0), None);
    }

    #[test]
    fn test_insufficient_input() {
        let config = ClimbDetectConfig::default();
        assert!(detect_climb_phases(&[], &config).is_empty());
        assert!(detect_climb_phases(&fixes_from_altitudes(&[1000.0]), &config).is_empty());
    }

    #[test]
    fn test_config_validation() {
        assert!(ClimbDetectConfig::default().validate().is_ok());
        let bad = ClimbDetectConfig {
            drop_pct: 1.5,
            ..Default::default()
        };
        assert!(bad.validate().is_err());
    }
}

//! Single-window circle fit.
//!
//! A window of consecutive fixes is projected to a local meter plane,
//! its translational drift (start-to-end displacement over time) is
//! removed, and the remaining motion is tested for circling around the
//! centroid: radius band, radius spread, accumulated turn and turn-sign
//! consistency.

use crate::geo_utils::{angle_delta, LocalProjection, VECTOR_EPSILON};
use crate::FixPoint;

use super::{DetectThermalCirclesConfig, TurnDirection};

/// Windows spanning less time than this are not evaluated.
pub const MIN_WINDOW_SPAN_SEC: f64 = 0.5;

const TURN_WEIGHT: f64 = 0.45;
const RADIUS_WEIGHT: f64 = 0.35;
const SIGN_WEIGHT: f64 = 0.20;

/// Turn margin (as a fraction of `min_turn_deg`) that earns full turn score.
const TURN_MARGIN_FRACTION: f64 = 0.2;

/// Why a window was not accepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowRejection {
    /// The index range is inverted or runs past the last fix
    OutOfBounds,
    ShortSpan,
    LowAltitudeGain,
    RadiusOutOfRange,
    RadiusSpread,
    InsufficientTurn,
    InconsistentTurnSign,
}

/// An accepted window.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WindowFit {
    pub start_idx: usize,
    /// Inclusive
    pub end_idx: usize,
    /// Drift east, m/s
    pub drift_vx_ms: f64,
    /// Drift north, m/s
    pub drift_vy_ms: f64,
    /// Unsigned accumulated turn around the centroid
    pub turn_deg: f64,
    pub direction: TurnDirection,
    pub r_mean_m: f64,
    pub r_std_m: f64,
    /// Fraction of steps turning in the dominant direction
    pub sign_consistency: f64,
    pub quality: f64,
}

/// Evaluate `fixes[start_idx..=end_idx]` as a circling window.
pub fn evaluate_window(
    fixes: &[FixPoint],
    start_idx: usize,
    end_idx: usize,
    config: &DetectThermalCirclesConfig,
) -> Result<WindowFit, WindowRejection> {
    let window = fixes
        .get(start_idx..=end_idx)
        .filter(|w| !w.is_empty())
        .ok_or(WindowRejection::OutOfBounds)?;
    let first = &window[0];
    let last = &window[window.len() - 1];

    let span = (last.t_sec - first.t_sec) as f64;
    if window.len() < 3 || span < MIN_WINDOW_SPAN_SEC {
        return Err(WindowRejection::ShortSpan);
    }
    if let Some(min_gain) = config.min_alt_gain_m {
        if last.altitude_m - first.altitude_m < min_gain {
            return Err(WindowRejection::LowAltitudeGain);
        }
    }

    let (detrended, drift_vx_ms, drift_vy_ms) = detrend(window);

    let n = detrended.len() as f64;
    let cx = detrended.iter().map(|p| p.0).sum::<f64>() / n;
    let cy = detrended.iter().map(|p| p.1).sum::<f64>() / n;

    let radii: Vec<f64> = detrended
        .iter()
        .map(|&(x, y)| (x - cx).hypot(y - cy))
        .collect();
    let r_mean_m = radii.iter().sum::<f64>() / n;
    let r_std_m = (radii.iter().map(|r| (r - r_mean_m).powi(2)).sum::<f64>() / n).sqrt();

    if r_mean_m < VECTOR_EPSILON
        || r_mean_m < config.min_radius_m
        || r_mean_m > config.max_radius_m + config.max_radius_slack_m
    {
        return Err(WindowRejection::RadiusOutOfRange);
    }
    let rel_std = r_std_m / r_mean_m;
    if rel_std > config.max_radius_rel_std {
        return Err(WindowRejection::RadiusSpread);
    }

    let (total_turn, positive, negative) = accumulate_turn(&detrended, cx, cy);
    let turn_deg = total_turn.abs().to_degrees();
    if turn_deg < config.min_turn_deg {
        return Err(WindowRejection::InsufficientTurn);
    }

    let steps = (detrended.len() - 1) as f64;
    let sign_consistency = positive.max(negative) as f64 / steps;
    if sign_consistency < config.min_sign_consistency {
        return Err(WindowRejection::InconsistentTurnSign);
    }

    let quality = window_quality(turn_deg, rel_std, sign_consistency, config);
    let direction = if total_turn >= 0.0 {
        TurnDirection::Left
    } else {
        TurnDirection::Right
    };

    Ok(WindowFit {
        start_idx,
        end_idx,
        drift_vx_ms,
        drift_vy_ms,
        turn_deg,
        direction,
        r_mean_m,
        r_std_m,
        sign_consistency,
        quality,
    })
}

/// Project around the first fix and subtract the start-to-end drift.
///
/// Returns the detrended (east, north) points and the drift velocity.
fn detrend(window: &[FixPoint]) -> (Vec<(f64, f64)>, f64, f64) {
    let first = &window[0];
    let last = &window[window.len() - 1];
    let proj = LocalProjection::around(first);

    let span = (last.t_sec - first.t_sec) as f64;
    let (ex, ey) = proj.project_fix(last);
    let vx = ex / span;
    let vy = ey / span;

    let points = window
        .iter()
        .map(|fix| {
            let (x, y) = proj.project_fix(fix);
            let dt = (fix.t_sec - first.t_sec) as f64;
            (x - vx * dt, y - vy * dt)
        })
        .collect();

    (points, vx, vy)
}

/// Signed total rotation around (cx, cy) plus counts of positive and
/// negative steps. Steps with no rotation count toward neither.
fn accumulate_turn(points: &[(f64, f64)], cx: f64, cy: f64) -> (f64, usize, usize) {
    let mut total = 0.0;
    let mut positive = 0;
    let mut negative = 0;

    let mut prev_angle = (points[0].1 - cy).atan2(points[0].0 - cx);
    for &(x, y) in &points[1..] {
        let angle = (y - cy).atan2(x - cx);
        let delta = angle_delta(prev_angle, angle);
        total += delta;
        if delta > 0.0 {
            positive += 1;
        } else if delta < 0.0 {
            negative += 1;
        }
        prev_angle = angle;
    }

    (total, positive, negative)
}

/// Weighted blend of turn margin, radius tightness and sign consistency.
pub fn window_quality(
    turn_deg: f64,
    rel_std: f64,
    sign_consistency: f64,
    config: &DetectThermalCirclesConfig,
) -> f64 {
    let turn_margin = (config.min_turn_deg * TURN_MARGIN_FRACTION).max(1.0);
    let turn_term = ((turn_deg - config.min_turn_deg) / turn_margin).clamp(0.0, 1.0);

    let radius_term = if config.max_radius_rel_std > 0.0 {
        (1.0 - rel_std / config.max_radius_rel_std).clamp(0.0, 1.0)
    } else {
        1.0
    };

    let sign_term = if config.min_sign_consistency >= 1.0 {
        1.0
    } else {
        ((sign_consistency - config.min_sign_consistency) / (1.0 - config.min_sign_consistency))
            .clamp(0.0, 1.0)
    };

    TURN_WEIGHT * turn_term + RADIUS_WEIGHT * radius_term + SIGN_WEIGHT * sign_term
}

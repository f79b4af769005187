//! # Wind Estimation
//!
//! Two independent estimates over a time range of the track:
//!
//! - **Window**: assumes a constant true airspeed along the ground track.
//!   Each fix pair gives `ground_velocity - airspeed * track_unit`; the
//!   estimate is the mean over all pairs.
//! - **Opposite 180**: pairs headings roughly 180° apart. Along one axis the
//!   ground speed difference between the two directions is twice the wind
//!   component on that axis. Components from several axes are solved for
//!   the wind vector by least squares.
//!
//! Opposite pairing bins ground tracks into sectors on a fixed grid: sector
//! centres sit `2 * opposition_tolerance_deg` apart starting at 0°, each
//! `opposition_tolerance_deg` wide on either side, and a sector pairs with
//! the one 180° from it. The grid only decides which samples pair up. Each
//! axis then points along the mean track of its samples (the backward side
//! reversed), not along the sector centre. Two legs almost opposite but on
//! either side of a sector boundary land in neighbouring sectors and are not
//! paired.
//!
//! Both may be `None` independently. Directions are downwind (where the air
//! moves to), 0 = N, 90 = E.

use log::{debug, info};
use serde::{Deserialize, Serialize};

use crate::error::{AnalysisError, Result};
use crate::geo_utils::{direction_to_unit, normalize_deg, vector_to_direction, LocalProjection, VECTOR_EPSILON};
use crate::FixPoint;

/// Fewest valid pairs the window method accepts.
pub const MIN_WINDOW_SAMPLES: usize = 4;

/// Sample count at which coverage quality saturates.
const FULL_QUALITY_SAMPLES: f64 = 40.0;

const KMH_TO_MS: f64 = 1.0 / 3.6;

/// Wind estimation parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WindConfig {
    /// Assumed true airspeed (km/h).
    /// Default: 36.0
    pub airspeed_kmh: f64,
    /// Fix pairs slower than this over ground are ignored (m/s).
    /// Default: 2.0
    pub min_ground_speed_ms: f64,
    /// Half-width of a heading sector (degrees).
    /// Default: 15.0
    pub opposition_tolerance_deg: f64,
    /// Samples required on each side of an axis.
    /// Default: 5
    pub min_side_samples: usize,
    /// Range start, seconds since the first fix. Whole flight when `None`.
    /// Default: None
    pub start_sec: Option<f64>,
    /// Range end, seconds since the first fix. Whole flight when `None`.
    /// Default: None
    pub end_sec: Option<f64>,
}

impl Default for WindConfig {
    fn default() -> Self {
        Self {
            airspeed_kmh: 36.0,
            min_ground_speed_ms: 2.0,
            opposition_tolerance_deg: 15.0,
            min_side_samples: 5,
            start_sec: None,
            end_sec: None,
        }
    }
}

impl WindConfig {
    pub fn validate(&self) -> Result<()> {
        if !(self.airspeed_kmh.is_finite() && self.airspeed_kmh > 0.0) {
            return Err(AnalysisError::config("wind.airspeed_kmh must be > 0"));
        }
        if !(self.min_ground_speed_ms.is_finite() && self.min_ground_speed_ms >= 0.0) {
            return Err(AnalysisError::config("wind.min_ground_speed_ms must be >= 0"));
        }
        if !(self.opposition_tolerance_deg > 0.0 && self.opposition_tolerance_deg <= 90.0) {
            return Err(AnalysisError::config(
                "wind.opposition_tolerance_deg must be within (0, 90]",
            ));
        }
        if self.min_side_samples == 0 {
            return Err(AnalysisError::config("wind.min_side_samples must be at least 1"));
        }
        if let (Some(start), Some(end)) = (self.start_sec, self.end_sec) {
            if start > end {
                return Err(AnalysisError::config("wind.start_sec must be <= wind.end_sec"));
            }
        }
        Ok(())
    }

    /// Same parameters restricted to `[start_sec, end_sec]`.
    pub fn with_range(&self, start_sec: f64, end_sec: f64) -> Self {
        Self {
            start_sec: Some(start_sec),
            end_sec: Some(end_sec),
            ..self.clone()
        }
    }
}

/// Estimation strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum WindMethod {
    Window,
    Opposite180,
}

/// A wind vector estimate.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WindEstimate {
    pub method: WindMethod,
    /// Downwind direction, 0 = N, 90 = E
    pub dir_deg: f64,
    pub speed_ms: f64,
    /// Confidence score in [0, 1]
    pub quality: f64,
    pub sample_count: usize,
}

impl WindEstimate {
    /// Meteorological direction the wind blows from.
    pub fn from_dir_deg(&self) -> f64 {
        normalize_deg(self.dir_deg + 180.0)
    }

    /// East/north components, m/s.
    pub fn components(&self) -> (f64, f64) {
        let (ux, uy) = direction_to_unit(self.dir_deg);
        (ux * self.speed_ms, uy * self.speed_ms)
    }
}

/// Both estimates for one range.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WindEstimates {
    pub window: Option<WindEstimate>,
    pub opposite: Option<WindEstimate>,
}

// ============================================================================
// Ground Samples
// ============================================================================

/// Ground velocity between two consecutive fixes.
#[derive(Debug, Clone, Copy, PartialEq)]
struct GroundSample {
    vx: f64,
    vy: f64,
    speed_ms: f64,
    /// Ground track, 0 = N
    track_deg: f64,
}

fn ground_samples(fixes: &[FixPoint], config: &WindConfig) -> Vec<GroundSample> {
    let Some(first) = fixes.first() else {
        return Vec::new();
    };
    let t0 = first.t_sec;
    let in_range = |fix: &FixPoint| {
        let t = (fix.t_sec - t0) as f64;
        config.start_sec.map_or(true, |s| t >= s) && config.end_sec.map_or(true, |e| t <= e)
    };

    fixes
        .windows(2)
        .filter(|pair| in_range(&pair[0]) && in_range(&pair[1]))
        .filter_map(|pair| {
            let dt = (pair[1].t_sec - pair[0].t_sec) as f64;
            if dt <= 0.0 {
                return None;
            }
            let (dx, dy) = LocalProjection::around(&pair[0]).project_fix(&pair[1]);
            let (vx, vy) = (dx / dt, dy / dt);
            let (speed_ms, track_deg) = vector_to_direction(vx, vy);
            let usable = speed_ms.is_finite()
                && speed_ms > VECTOR_EPSILON
                && speed_ms > config.min_ground_speed_ms;
            usable.then_some(GroundSample {
                vx,
                vy,
                speed_ms,
                track_deg,
            })
        })
        .collect()
}

fn coverage_quality(samples: usize) -> f64 {
    (samples as f64 / FULL_QUALITY_SAMPLES).min(1.0)
}

// ============================================================================
// Estimators
// ============================================================================

/// Run both estimators over the configured range.
pub fn estimate_wind(fixes: &[FixPoint], config: &WindConfig) -> WindEstimates {
    let samples = ground_samples(fixes, config);
    let estimates = WindEstimates {
        window: window_from_samples(&samples, config),
        opposite: opposite_from_samples(&samples, config),
    };

    info!(
        "[Wind] {} samples: window {}, opposite {}",
        samples.len(),
        describe(estimates.window.as_ref()),
        describe(estimates.opposite.as_ref())
    );
    estimates
}

fn describe(estimate: Option<&WindEstimate>) -> String {
    match estimate {
        Some(e) => format!("{:.1} m/s to {:.0}° (q {:.2})", e.speed_ms, e.dir_deg, e.quality),
        None => "none".to_string(),
    }
}

/// Assumed-airspeed estimate. `None` below [`MIN_WINDOW_SAMPLES`] pairs.
pub fn estimate_wind_window(fixes: &[FixPoint], config: &WindConfig) -> Option<WindEstimate> {
    window_from_samples(&ground_samples(fixes, config), config)
}

fn window_from_samples(samples: &[GroundSample], config: &WindConfig) -> Option<WindEstimate> {
    if samples.len() < MIN_WINDOW_SAMPLES {
        return None;
    }
    let airspeed_ms = config.airspeed_kmh * KMH_TO_MS;

    let (sum_x, sum_y) = samples.iter().fold((0.0, 0.0), |(sx, sy), s| {
        let scale = airspeed_ms / s.speed_ms;
        (sx + s.vx - s.vx * scale, sy + s.vy - s.vy * scale)
    });
    let n = samples.len() as f64;
    let (speed_ms, dir_deg) = vector_to_direction(sum_x / n, sum_y / n);

    Some(WindEstimate {
        method: WindMethod::Window,
        dir_deg,
        speed_ms,
        quality: coverage_quality(samples.len()),
        sample_count: samples.len(),
    })
}

/// Opposite-heading estimate. `None` unless at least one axis has
/// `min_side_samples` on both sides.
pub fn estimate_wind_opposite(fixes: &[FixPoint], config: &WindConfig) -> Option<WindEstimate> {
    opposite_from_samples(&ground_samples(fixes, config), config)
}

/// Wind component along one heading axis.
#[derive(Debug, Clone, Copy, PartialEq)]
struct AxisComponent {
    axis_deg: f64,
    /// Wind speed along `axis_deg`, m/s
    component_ms: f64,
    samples: usize,
}

fn opposite_from_samples(samples: &[GroundSample], config: &WindConfig) -> Option<WindEstimate> {
    let tolerance = config.opposition_tolerance_deg;
    let sector_step = (2.0 * tolerance).max(1.0);

    let mut axes = Vec::new();
    let mut sector_deg = 0.0;
    while sector_deg < 180.0 {
        let forward = side_stats(samples, sector_deg, tolerance);
        let backward = side_stats(samples, sector_deg + 180.0, tolerance);
        if let (Some(fwd), Some(back)) = (forward, backward) {
            if fwd.count >= config.min_side_samples && back.count >= config.min_side_samples {
                axes.push(AxisComponent {
                    axis_deg: mean_axis_deg(&fwd, &back).unwrap_or(sector_deg),
                    component_ms: (fwd.mean_speed_ms - back.mean_speed_ms) / 2.0,
                    samples: fwd.count + back.count,
                });
            }
        }
        sector_deg += sector_step;
    }

    if axes.is_empty() {
        debug!("[Wind] No opposing heading pairs");
        return None;
    }

    let (wx, wy) = solve_axes(&axes);
    let residual_ms = axis_residual_rms(&axes, wx, wy);
    let sample_count: usize = axes.iter().map(|a| a.samples).sum();
    let (speed_ms, dir_deg) = vector_to_direction(wx, wy);

    debug!(
        "[Wind] Opposite method used {} axes, residual {:.2} m/s",
        axes.len(),
        residual_ms
    );

    Some(WindEstimate {
        method: WindMethod::Opposite180,
        dir_deg,
        speed_ms,
        quality: coverage_quality(sample_count) / (1.0 + residual_ms),
        sample_count,
    })
}

/// Samples tracking within `tolerance` of one sector centre.
#[derive(Debug, Clone, Copy, PartialEq)]
struct SideStats {
    mean_speed_ms: f64,
    count: usize,
    /// Sum of unit track vectors (east, north)
    track_sum: (f64, f64),
}

fn side_stats(samples: &[GroundSample], sector_deg: f64, tolerance: f64) -> Option<SideStats> {
    let (speed_sum, track_sum, count) = samples
        .iter()
        .filter(|s| {
            let d = normalize_deg(s.track_deg - sector_deg);
            d.min(360.0 - d) <= tolerance
        })
        .fold((0.0, (0.0, 0.0), 0usize), |(speed, (ux, uy), n), s| {
            (speed + s.speed_ms, (ux + s.vx / s.speed_ms, uy + s.vy / s.speed_ms), n + 1)
        });
    (count > 0).then(|| SideStats {
        mean_speed_ms: speed_sum / count as f64,
        count,
        track_sum,
    })
}

/// Mean track of both sides, with the backward side reversed.
fn mean_axis_deg(forward: &SideStats, backward: &SideStats) -> Option<f64> {
    let x = forward.track_sum.0 - backward.track_sum.0;
    let y = forward.track_sum.1 - backward.track_sum.1;
    let (norm, dir_deg) = vector_to_direction(x, y);
    (norm > VECTOR_EPSILON).then_some(dir_deg)
}

/// Least-squares wind from per-axis components.
///
/// With a single usable axis (or only parallel ones) the wind is taken to
/// lie along the best-populated axis.
fn solve_axes(axes: &[AxisComponent]) -> (f64, f64) {
    let (mut sxx, mut sxy, mut syy, mut bx, mut by) = (0.0, 0.0, 0.0, 0.0, 0.0);
    for a in axes {
        let (ux, uy) = direction_to_unit(a.axis_deg);
        sxx += ux * ux;
        sxy += ux * uy;
        syy += uy * uy;
        bx += ux * a.component_ms;
        by += uy * a.component_ms;
    }

    let det = sxx * syy - sxy * sxy;
    if det.abs() > 1e-6 {
        return ((syy * bx - sxy * by) / det, (sxx * by - sxy * bx) / det);
    }

    let best = axes
        .iter()
        .max_by_key(|a| a.samples)
        .copied()
        .unwrap_or(AxisComponent {
            axis_deg: 0.0,
            component_ms: 0.0,
            samples: 0,
        });
    let (ux, uy) = direction_to_unit(best.axis_deg);
    (ux * best.component_ms, uy * best.component_ms)
}

fn axis_residual_rms(axes: &[AxisComponent], wx: f64, wy: f64) -> f64 {
    let sum_sq: f64 = axes
        .iter()
        .map(|a| {
            let (ux, uy) = direction_to_unit(a.axis_deg);
            (ux * wx + uy * wy - a.component_ms).powi(2)
        })
        .sum();
    (sum_sq / axes.len() as f64).sqrt()
}

//! Whole-turn drift of a merged circling interval.
//!
//! A window's start-to-end drift carries whatever circling phase its
//! endpoints land on, and the straight flight at either end of an interval
//! is not circling at all. The estimate here works on the circling core
//! only:
//!
//! 1. Step headings are taken after removing a reference drift, so they
//!    follow the air track rather than the ground track. The representative
//!    window gives the reference turn rate.
//! 2. A step belongs to the core when its smoothed turn rate lies within
//!    `[0.5, 2]` times the reference rate and the step itself is not a kink
//!    (more than four times the reference rate).
//! 3. Each core run gives a circling period from its mean turn rate. Every
//!    fix of the run is paired with the point one period later, and the
//!    displacement over that period is one drift sample.
//! 4. The drift is the per-component median of the samples. A first pass
//!    uses the representative drift and lets the run reach one fix past its
//!    ends; a second pass repeats with the first pass's drift.
//!
//! The circling radius is measured around the centroid of a whole number
//! of turns of the longest core run, detrended by the final drift.

use std::f64::consts::TAU;

use crate::geo_utils::{angle_delta, LocalProjection, VECTOR_EPSILON};
use crate::FixPoint;

use super::MergedInterval;

/// Core steps turn at least this fraction of the reference rate.
const CORE_RATE_MIN: f64 = 0.5;
/// Core steps turn at most this multiple of the reference rate.
const CORE_RATE_MAX: f64 = 2.0;
/// A single step above this multiple of the reference rate is a kink.
const KINK_RATE: f64 = 4.0;
/// Steps on each side used to smooth a step's turn rate.
const SMOOTHING_STEPS: usize = 2;
/// Seconds a one-turn span may run past the end of its core.
const TURN_OVERSHOOT_SEC: f64 = 0.5;
const TIME_EPSILON: f64 = 1e-6;

/// Drift, turn and radius measured over an interval.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct TurnDrift {
    /// Median one-turn drift, if the interval has a circling core
    pub drift: Option<(f64, f64)>,
    /// Unsigned heading turn across the interval
    pub turn_deg: f64,
    /// Mean and standard deviation of the core radius
    pub radius: Option<(f64, f64)>,
}

/// Measure drift over `[start, end]`, a sub-range of `interval`.
pub(crate) fn whole_turn_drift(
    fixes: &[FixPoint],
    interval: &MergedInterval,
    start: usize,
    end: usize,
) -> TurnDrift {
    let rep = &interval.representative;
    let plane = TrackPlane::new(fixes, interval.start_idx, interval.end_idx);
    let rep_drift = (rep.drift_vx_ms, rep.drift_vy_ms);

    let pass = mean_turn_rate(&plane.headings(rep.start_idx, rep.end_idx, rep_drift))
        .and_then(|reference| {
            let first = plane.one_turn_pass(start, end, rep_drift, reference, 1)?;
            Some(
                plane
                    .one_turn_pass(start, end, first.drift, reference, 0)
                    .unwrap_or(first),
            )
        });

    let drift = pass.map_or(rep_drift, |p| p.drift);
    let turn_deg = plane
        .headings(start, end, drift)
        .last()
        .map_or(0.0, |step| step.heading.abs().to_degrees());

    TurnDrift {
        drift: pass.map(|p| p.drift),
        turn_deg,
        radius: pass.and_then(|p| plane.core_radius(p.core, drift)),
    }
}

/// Absolute turn rate (rad/s) from the first to the last step.
fn mean_turn_rate(steps: &[Step]) -> Option<f64> {
    let (first, last) = (steps.first()?, steps.last()?);
    let dt = last.t_mid - first.t_mid;
    (dt > 0.0).then(|| (last.heading - first.heading).abs() / dt)
}

pub(crate) fn median(values: &mut [f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    values.sort_by(f64::total_cmp);
    let mid = values.len() / 2;
    Some(if values.len() % 2 == 0 {
        (values[mid - 1] + values[mid]) / 2.0
    } else {
        values[mid]
    })
}

// ============================================================================
// Track Plane
// ============================================================================

#[derive(Debug, Clone, Copy)]
struct Step {
    /// Fix index where the step starts
    fix: usize,
    /// Time of the step midpoint
    t_mid: f64,
    /// Unwrapped heading, radians
    heading: f64,
}

#[derive(Debug, Clone, Copy)]
struct CoreRun {
    first_fix: usize,
    last_fix: usize,
    period_sec: f64,
}

#[derive(Debug, Clone, Copy)]
struct TurnPass {
    drift: (f64, f64),
    /// Longest run of the pass
    core: CoreRun,
}

/// Fixes of one interval projected to a shared meter plane.
struct TrackPlane<'a> {
    fixes: &'a [FixPoint],
    base: usize,
    points: Vec<(f64, f64)>,
}

impl<'a> TrackPlane<'a> {
    fn new(fixes: &'a [FixPoint], start: usize, end: usize) -> Self {
        let proj = LocalProjection::around(&fixes[start]);
        let points = fixes[start..=end].iter().map(|f| proj.project_fix(f)).collect();
        Self {
            fixes,
            base: start,
            points,
        }
    }

    fn t(&self, idx: usize) -> f64 {
        self.fixes[idx].t_sec as f64
    }

    fn xy(&self, idx: usize) -> (f64, f64) {
        self.points[idx - self.base]
    }

    /// Unwrapped step headings over `[start, end]` relative to `drift`.
    /// Steps without elapsed time are skipped.
    fn headings(&self, start: usize, end: usize, drift: (f64, f64)) -> Vec<Step> {
        let mut steps = Vec::with_capacity(end.saturating_sub(start));
        let mut prev: Option<f64> = None;
        let mut cumulative = 0.0;

        for k in start..end {
            let dt = self.t(k + 1) - self.t(k);
            if dt <= 0.0 {
                continue;
            }
            let (x0, y0) = self.xy(k);
            let (x1, y1) = self.xy(k + 1);
            let heading = ((y1 - y0) / dt - drift.1).atan2((x1 - x0) / dt - drift.0);
            if let Some(p) = prev {
                cumulative += angle_delta(p, heading);
            }
            prev = Some(heading);
            steps.push(Step {
                fix: k,
                t_mid: (self.t(k) + self.t(k + 1)) / 2.0,
                heading: cumulative,
            });
        }
        steps
    }

    /// Steps turning at the circling rate, in the interval's turn sense.
    fn core_mask(steps: &[Step], reference: f64) -> Vec<bool> {
        let n = steps.len();
        let sign = match (steps.first(), steps.last()) {
            (Some(a), Some(b)) if b.heading < a.heading => -1.0,
            _ => 1.0,
        };

        (0..n)
            .map(|i| {
                let lo = i.saturating_sub(SMOOTHING_STEPS);
                let hi = (i + SMOOTHING_STEPS).min(n - 1);
                let span = steps[hi].t_mid - steps[lo].t_mid;
                if hi == lo || span <= 0.0 {
                    return false;
                }
                let smoothed = sign * (steps[hi].heading - steps[lo].heading) / span;
                let own = if i > 0 {
                    (steps[i].heading - steps[i - 1].heading).abs()
                        / (steps[i].t_mid - steps[i - 1].t_mid)
                } else {
                    0.0
                };
                (CORE_RATE_MIN * reference..=CORE_RATE_MAX * reference).contains(&smoothed)
                    && own <= KINK_RATE * reference
            })
            .collect()
    }

    /// One pass of one-turn sampling. `extend` lets each run reach that
    /// many fixes past its ends.
    fn one_turn_pass(
        &self,
        start: usize,
        end: usize,
        drift: (f64, f64),
        reference: f64,
        extend: usize,
    ) -> Option<TurnPass> {
        let steps = self.headings(start, end, drift);
        if steps.len() < 2 * SMOOTHING_STEPS + 1 || reference <= 0.0 {
            return None;
        }
        let mask = Self::core_mask(&steps, reference);

        let mut vx_samples = Vec::new();
        let mut vy_samples = Vec::new();
        let mut longest: Option<CoreRun> = None;

        let mut i = 0;
        while i < steps.len() {
            if !mask[i] {
                i += 1;
                continue;
            }
            let a = i;
            while i + 1 < steps.len() && mask[i + 1] {
                i += 1;
            }
            let b = i;
            i += 1;
            if b == a {
                continue;
            }

            let (sa, sb) = (&steps[a], &steps[b]);
            let rate = (sb.heading - sa.heading).abs() / (sb.t_mid - sa.t_mid);
            if rate <= VECTOR_EPSILON {
                continue;
            }
            let run = CoreRun {
                first_fix: sa.fix,
                last_fix: sb.fix + 1,
                period_sec: TAU / rate,
            };
            if longest.map_or(true, |l| run.last_fix - run.first_fix > l.last_fix - l.first_fix) {
                longest = Some(run);
            }

            let first = start.max(run.first_fix.saturating_sub(extend));
            let last = end.min(run.last_fix + extend);
            self.sample_run(first, last, run.period_sec, &mut vx_samples, &mut vy_samples);
        }

        let drift = median(&mut vx_samples).zip(median(&mut vy_samples))?;
        Some(TurnPass {
            drift,
            core: longest?,
        })
    }

    /// Displacement over one period from every fix in `[first, last]`
    /// whose period ends by `last`.
    fn sample_run(
        &self,
        first: usize,
        last: usize,
        period: f64,
        vx: &mut Vec<f64>,
        vy: &mut Vec<f64>,
    ) {
        let t_last = self.t(last);
        let mut q = first;
        for f in first..=last {
            let target = self.t(f) + period;
            if target > t_last + TURN_OVERSHOOT_SEC + TIME_EPSILON {
                break;
            }
            let target = target.min(t_last);
            while q < last && self.t(q + 1) < target {
                q += 1;
            }
            let (x, y) = self.position_at(q, last, target);
            let (xf, yf) = self.xy(f);
            vx.push((x - xf) / period);
            vy.push((y - yf) / period);
        }
    }

    /// Position at `target`, interpolated forward from fix `q`.
    fn position_at(&self, q: usize, last: usize, target: f64) -> (f64, f64) {
        let (x0, y0) = self.xy(q);
        if q == last || self.t(q) >= target {
            return (x0, y0);
        }
        let (x1, y1) = self.xy(q + 1);
        let u = (target - self.t(q)) / (self.t(q + 1) - self.t(q));
        (x0 + u * (x1 - x0), y0 + u * (y1 - y0))
    }

    /// Radius mean and spread over whole turns of `core`.
    fn core_radius(&self, core: CoreRun, drift: (f64, f64)) -> Option<(f64, f64)> {
        let t0 = self.t(core.first_fix);
        let turns = ((self.t(core.last_fix) - t0) / core.period_sec + TIME_EPSILON).floor();
        let span = turns * core.period_sec - TIME_EPSILON;

        let points: Vec<(f64, f64)> = (core.first_fix..=core.last_fix)
            .filter(|&f| turns < 1.0 || self.t(f) - t0 < span)
            .map(|f| {
                let (x, y) = self.xy(f);
                let dt = self.t(f) - t0;
                (x - drift.0 * dt, y - drift.1 * dt)
            })
            .collect();
        if points.is_empty() {
            return None;
        }

        let n = points.len() as f64;
        let cx = points.iter().map(|p| p.0).sum::<f64>() / n;
        let cy = points.iter().map(|p| p.1).sum::<f64>() / n;
        let radii: Vec<f64> = points.iter().map(|&(x, y)| (x - cx).hypot(y - cy)).collect();
        let mean = radii.iter().sum::<f64>() / n;
        let std = (radii.iter().map(|r| (r - mean).powi(2)).sum::<f64>() / n).sqrt();
        Some((mean, std))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::synthetic::SyntheticFlight;
    use crate::thermal::{
        evaluate_window, merge_windows, DetectThermalCirclesConfig, TurnDirection, WindowFit,
    };

    fn interval_for(fixes: &[FixPoint], config: &DetectThermalCirclesConfig) -> MergedInterval {
        let accepted: Vec<_> = (0..=fixes.len() - config.window_pts)
            .step_by(config.step_pts)
            .filter_map(|s| evaluate_window(fixes, s, s + config.window_pts - 1, config).ok())
            .collect();
        let mut intervals = merge_windows(accepted, config.merge_gap_pts);
        assert_eq!(intervals.len(), 1);
        intervals.remove(0)
    }

    #[test]
    fn test_single_turn_ignores_straight_ends() {
        // One slow turn between long straight legs
        let fixes = SyntheticFlight::new(46.5, 8.0)
            .wind(2.0, 1.0)
            .straight(60, 90.0, 10.0, 0.5)
            .circle(80, 50.0, 80.0, TurnDirection::Left, 0.5)
            .straight(60, 90.0, 10.0, 0.5)
            .fixes();
        let config = DetectThermalCirclesConfig::default();
        let interval = interval_for(&fixes, &config);

        let (start, end) = (interval.start_idx + 5, interval.end_idx - 5);
        let measured = whole_turn_drift(&fixes, &interval, start, end);
        let (vx, vy) = measured.drift.unwrap();
        assert!((vx - 2.0).abs() < 0.05, "vx {vx}");
        assert!((vy - 1.0).abs() < 0.05, "vy {vy}");
        assert!(measured.turn_deg >= 300.0, "turn {}", measured.turn_deg);

        let (r_mean, _) = measured.radius.unwrap();
        assert!((r_mean - 50.0).abs() < 2.0, "r_mean {r_mean}");
    }

    #[test]
    fn test_partial_turns_do_not_bias_drift() {
        // 80 s at a 30 s period ends mid-turn, then a sharp heading change
        let fixes = SyntheticFlight::new(46.5, 8.0)
            .wind(1.5, -0.5)
            .straight(40, 0.0, 10.0, 0.25)
            .circle(80, 50.0, 30.0, TurnDirection::Left, 0.5)
            .straight(40, 0.0, 10.0, 0.25)
            .fixes();
        let config = DetectThermalCirclesConfig::default();
        let interval = interval_for(&fixes, &config);

        let measured = whole_turn_drift(&fixes, &interval, interval.start_idx, interval.end_idx);
        let (vx, vy) = measured.drift.unwrap();
        assert!((vx - 1.5).abs() < 0.05, "vx {vx}");
        assert!((vy + 0.5).abs() < 0.05, "vy {vy}");
    }

    #[test]
    fn test_straight_interval_has_no_core() {
        let fixes = SyntheticFlight::new(46.5, 8.0)
            .wind(2.0, 1.0)
            .straight(100, 45.0, 10.0, 0.0)
            .fixes();
        let representative = WindowFit {
            start_idx: 10,
            end_idx: 79,
            drift_vx_ms: 2.0,
            drift_vy_ms: 1.0,
            turn_deg: 360.0,
            direction: TurnDirection::Left,
            r_mean_m: 50.0,
            r_std_m: 0.0,
            sign_consistency: 1.0,
            quality: 1.0,
        };
        let interval = MergedInterval {
            start_idx: 0,
            end_idx: 99,
            representative,
            window_count: 1,
        };

        let measured = whole_turn_drift(&fixes, &interval, 5, 94);
        assert_eq!(measured.drift, None);
        assert_eq!(measured.radius, None);
        assert!(measured.turn_deg < 1.0, "turn {}", measured.turn_deg);
    }

    #[test]
    fn test_median() {
        assert_eq!(median(&mut []), None);
        assert_eq!(median(&mut [3.0, 1.0, 2.0]), Some(2.0));
        assert_eq!(median(&mut [4.0, 1.0, 2.0, 3.0]), Some(2.5));
    }
}

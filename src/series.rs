//! Derived motion series for charting and summary statistics.
//!
//! Two resolutions are produced from the same fixes:
//! - **series**: one point per fix (altitude, instantaneous ground speed)
//! - **windows**: fixed-duration buckets (vario, averaged ground speed)
//!
//! All times are relative to the first fix.

use log::info;
use serde::{Deserialize, Serialize};

use crate::geo_utils::{haversine_distance, track_length};
use crate::FixPoint;

/// Default bucket length for the window series, seconds.
pub const DEFAULT_WINDOW_SEC: u32 = 5;

const MS_TO_KMH: f64 = 3.6;

/// Per-fix derived sample.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeriesPoint {
    /// Seconds since the first fix
    pub t_sec: i64,
    pub altitude_m: f64,
    /// Ground speed from the previous fix, km/h (0 for the first fix)
    pub g_speed_kmh: f64,
}

/// Fixed-window derived sample.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WindowPoint {
    /// Seconds since the first fix at the last fix in the window
    pub t_sec: i64,
    /// Vertical speed across the window, m/s
    pub v_speed_ms: f64,
    /// Average ground speed across the window, km/h
    pub g_speed_kmh: f64,
}

/// Both series for one flight.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlightSeries {
    pub series: Vec<SeriesPoint>,
    pub windows: Vec<WindowPoint>,
}

/// Build the per-fix and window series.
///
/// Returns two empty series for fewer than two fixes.
///
/// # Example
/// ```
/// use igc_thermals::{build_flight_series, FixPoint};
///
/// let fixes: Vec<FixPoint> = (0..20)
///     .map(|i| FixPoint::new(i, 46.5 + i as f64 * 0.0001, 8.0, 1000.0 + i as f64))
///     .collect();
/// let built = build_flight_series(&fixes, 5);
/// assert_eq!(built.series.len(), fixes.len());
/// assert_eq!(built.series[0].g_speed_kmh, 0.0);
/// ```
pub fn build_flight_series(fixes: &[FixPoint], window_sec: u32) -> FlightSeries {
    if fixes.len() < 2 {
        return FlightSeries::default();
    }

    let series = build_point_series(fixes);
    let windows = build_window_series(fixes, window_sec as i64);

    info!(
        "[Series] Built {} points and {} windows ({}s)",
        series.len(),
        windows.len(),
        window_sec
    );

    FlightSeries { series, windows }
}

fn build_point_series(fixes: &[FixPoint]) -> Vec<SeriesPoint> {
    let t0 = fixes[0].t_sec;

    fixes
        .iter()
        .enumerate()
        .map(|(i, fix)| {
            let g_speed_kmh = if i == 0 {
                0.0
            } else {
                let prev = &fixes[i - 1];
                let dt = (fix.t_sec - prev.t_sec) as f64;
                if dt <= 0.0 {
                    0.0
                } else {
                    haversine_distance(prev, fix) / dt * MS_TO_KMH
                }
            };

            SeriesPoint {
                t_sec: fix.t_sec - t0,
                altitude_m: fix.altitude_m,
                g_speed_kmh,
            }
        })
        .collect()
}

fn build_window_series(fixes: &[FixPoint], window_sec: i64) -> Vec<WindowPoint> {
    let t0 = fixes[0].t_sec;
    let n = fixes.len();
    let mut windows = Vec::new();
    let mut i = 0;

    while i < n - 1 {
        let start = &fixes[i];

        // Extend until the next fix would pass the window end
        let mut j = i;
        while j + 1 < n && fixes[j + 1].t_sec <= start.t_sec + window_sec {
            j += 1;
        }

        if j == i {
            i += 1;
            continue;
        }

        let end = &fixes[j];
        let dt = (end.t_sec - start.t_sec) as f64;
        if dt > 0.0 {
            let distance = track_length(&fixes[i..=j]);
            windows.push(WindowPoint {
                t_sec: end.t_sec - t0,
                v_speed_ms: (end.altitude_m - start.altitude_m) / dt,
                g_speed_kmh: distance / dt * MS_TO_KMH,
            });
        }

        i = j;
    }

    windows
}

// ============================================================================
// Flight Summary
// ============================================================================

/// Headline numbers for a flight.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlightSummary {
    pub duration_sec: i64,
    pub min_altitude_m: f64,
    pub max_altitude_m: f64,
    /// Sum of positive altitude steps between fixes
    pub total_gain_m: f64,
    /// Best window vario, m/s
    pub max_climb_ms: f64,
    /// Worst window vario (most negative), m/s
    pub max_sink_ms: f64,
    pub max_speed_kmh: f64,
    /// Track length along the fixes, km
    pub distance_km: f64,
}

/// Summarize a built series. `None` when the series is empty.
pub fn summarize_flight(built: &FlightSeries) -> Option<FlightSummary> {
    let first = built.series.first()?;
    let last = built.series.last()?;

    let mut min_altitude_m = f64::INFINITY;
    let mut max_altitude_m = f64::NEG_INFINITY;
    let mut total_gain_m = 0.0;
    let mut max_speed_kmh: f64 = 0.0;
    let mut distance_m = 0.0;

    for (i, p) in built.series.iter().enumerate() {
        min_altitude_m = min_altitude_m.min(p.altitude_m);
        max_altitude_m = max_altitude_m.max(p.altitude_m);
        max_speed_kmh = max_speed_kmh.max(p.g_speed_kmh);

        if i > 0 {
            let prev = &built.series[i - 1];
            total_gain_m += (p.altitude_m - prev.altitude_m).max(0.0);
            // Speed is distance over dt, so this recovers segment length
            distance_m += p.g_speed_kmh / MS_TO_KMH * (p.t_sec - prev.t_sec) as f64;
        }
    }

    let max_climb_ms = built
        .windows
        .iter()
        .map(|w| w.v_speed_ms)
        .fold(0.0, f64::max);
    let max_sink_ms = built
        .windows
        .iter()
        .map(|w| w.v_speed_ms)
        .fold(0.0, f64::min);

    Some(FlightSummary {
        duration_sec: last.t_sec - first.t_sec,
        min_altitude_m,
        max_altitude_m,
        total_gain_m,
        max_climb_ms,
        max_sink_ms,
        max_speed_kmh,
        distance_km: distance_m / 1000.0,
    })
}

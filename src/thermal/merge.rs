//! Interval merging for accepted windows and finished circles.

use super::{ThermalCircle, WindowFit};

/// Accepted windows merged into one contiguous interval.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct MergedInterval {
    pub start_idx: usize,
    /// Inclusive
    pub end_idx: usize,
    /// Best-quality window in the interval (earliest on ties)
    pub representative: WindowFit,
    pub window_count: usize,
}

/// Merge windows whose start lies within `gap_pts` fixes of the running
/// interval's end.
pub(crate) fn merge_windows(mut fits: Vec<WindowFit>, gap_pts: usize) -> Vec<MergedInterval> {
    fits.sort_by_key(|f| f.start_idx);

    let mut merged: Vec<MergedInterval> = Vec::new();
    for fit in fits {
        match merged.last_mut() {
            Some(current) if fit.start_idx <= current.end_idx + gap_pts => {
                current.end_idx = current.end_idx.max(fit.end_idx);
                current.window_count += 1;
                if fit.quality > current.representative.quality {
                    current.representative = fit;
                }
            }
            _ => merged.push(MergedInterval {
                start_idx: fit.start_idx,
                end_idx: fit.end_idx,
                representative: fit,
                window_count: 1,
            }),
        }
    }
    merged
}

/// Merge circles with overlapping index ranges.
///
/// The result spans the union of both ranges and carries the drift and
/// diagnostics of the higher-quality circle (the earlier one on ties).
pub(crate) fn merge_overlapping_circles(mut circles: Vec<ThermalCircle>) -> Vec<ThermalCircle> {
    circles.sort_by_key(|c| c.start_idx);

    let mut merged: Vec<ThermalCircle> = Vec::with_capacity(circles.len());
    for circle in circles {
        match merged.last_mut() {
            Some(current) if circle.start_idx <= current.end_idx => {
                let (start_idx, start_sec) = (current.start_idx, current.start_sec);
                let (end_idx, end_sec) = if circle.end_idx > current.end_idx {
                    (circle.end_idx, circle.end_sec)
                } else {
                    (current.end_idx, current.end_sec)
                };
                if circle.quality > current.quality {
                    *current = circle;
                }
                current.start_idx = start_idx;
                current.start_sec = start_sec;
                current.end_idx = end_idx;
                current.end_sec = end_sec;
            }
            _ => merged.push(circle),
        }
    }
    merged
}

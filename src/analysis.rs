//! One-call flight analysis.
//!
//! Runs the whole pipeline over an IGC file:
//!
//! ```text
//! parse ─┬─ series ── summary
//!        ├─ climbs ── thermals
//!        └─ wind
//! ```

use chrono::NaiveDate;
use log::info;
use serde::{Deserialize, Serialize};

use crate::climb::{detect_climb_phases, ClimbPhase};
use crate::config::AnalysisConfig;
use crate::error::Result;
use crate::igc::{parse_igc, IgcFlight, IgcHeader};
use crate::series::{build_flight_series, summarize_flight, FlightSeries, FlightSummary};
use crate::thermal::{detect_thermal_circles_in_climbs, ClimbRange, ThermalCircle};
use crate::wind::{estimate_wind, WindEstimates};
use crate::FixPoint;

/// Everything derived from one flight.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlightAnalysis {
    pub header: IgcHeader,
    /// Resolved flight date
    pub date: Option<NaiveDate>,
    pub fixes: Vec<FixPoint>,
    pub series: FlightSeries,
    pub summary: Option<FlightSummary>,
    pub climbs: Vec<ClimbPhase>,
    pub thermals: Vec<ThermalCircle>,
    /// Whole-flight (or configured range) wind
    pub wind: WindEstimates,
}

impl FlightAnalysis {
    /// Serialize to JSON for external consumers.
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| "{}".to_string())
    }

    /// Mean thermal drift across all circles, weighted by circle duration.
    pub fn mean_thermal_drift(&self) -> Option<(f64, f64)> {
        let (mut vx, mut vy, mut total) = (0.0, 0.0, 0.0);
        for circle in &self.thermals {
            let weight = (circle.end_sec - circle.start_sec) as f64;
            vx += circle.drift_vx_ms * weight;
            vy += circle.drift_vy_ms * weight;
            total += weight;
        }
        (total > 0.0).then(|| (vx / total, vy / total))
    }
}

/// Parse and analyze an IGC file.
///
/// `flight_date` (`YYYY-MM-DD`) overrides the file's date header. Fails
/// only for an invalid configuration or an unparsable explicit date.
pub fn analyze_flight(
    igc_text: &str,
    flight_date: Option<&str>,
    config: &AnalysisConfig,
) -> Result<FlightAnalysis> {
    config.validate()?;
    let flight = parse_igc(igc_text, flight_date)?;
    Ok(analyze_parsed(flight, config))
}

/// Analyze an already parsed flight. The configuration is used as given.
pub fn analyze_parsed(flight: IgcFlight, config: &AnalysisConfig) -> FlightAnalysis {
    let IgcFlight {
        header,
        date,
        fixes,
    } = flight;

    let series = build_flight_series(&fixes, config.series_window_sec);
    let summary = summarize_flight(&series);

    let climbs = detect_climb_phases(&fixes, &config.climb);
    let ranges: Vec<ClimbRange> = climbs.iter().map(ClimbRange::from).collect();
    let thermals = detect_thermal_circles_in_climbs(&fixes, &ranges, &config.thermal);

    let wind = estimate_wind(&fixes, &config.wind);

    info!(
        "[Analysis] {} fixes: {} climbs, {} thermal circles",
        fixes.len(),
        climbs.len(),
        thermals.len()
    );

    FlightAnalysis {
        header,
        date,
        fixes,
        series,
        summary,
        climbs,
        thermals,
        wind,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AnalysisError;
    use crate::synthetic::SyntheticFlight;
    use crate::thermal::TurnDirection;

    fn sample_igc() -> String {
        let date = NaiveDate::from_ymd_opt(2024, 6, 17).unwrap();
        SyntheticFlight::new(46.5, 8.0)
            .start_altitude(1500.0)
            .wind(2.0, 1.0)
            .straight(50, 90.0, 10.0, -1.0)
            .straight(50, 90.0, 10.0, 0.5)
            .circle(120, 50.0, 30.0, TurnDirection::Left, 0.5)
            .straight(30, 90.0, 10.0, 0.5)
            .straight(350, 90.0, 10.0, -1.0)
            .to_igc(date)
    }

    #[test]
    fn test_analyze_synthetic_flight() {
        let analysis = analyze_flight(&sample_igc(), None, &AnalysisConfig::default()).unwrap();

        assert_eq!(analysis.date, NaiveDate::from_ymd_opt(2024, 6, 17));
        assert_eq!(analysis.fixes.len(), 600);
        assert_eq!(analysis.series.series.len(), 600);
        assert_eq!(analysis.climbs.len(), 1);
        assert_eq!(analysis.thermals.len(), 1);

        let summary = analysis.summary.unwrap();
        assert_eq!(summary.duration_sec, 599);

        let (vx, vy) = analysis.mean_thermal_drift().unwrap();
        assert!((vx - 2.0).abs() < 0.2 && (vy - 1.0).abs() < 0.2, "drift ({vx}, {vy})");
    }

    #[test]
    fn test_json_output() {
        let analysis = analyze_flight(&sample_igc(), None, &AnalysisConfig::default()).unwrap();
        let json = analysis.to_json();
        assert!(json.contains("\"thermals\":[{"));
        assert!(json.contains("\"driftVxMs\""));
        assert!(json.contains("\"date\":\"2024-06-17\""));

        let back: FlightAnalysis = serde_json::from_str(&json).unwrap();
        assert_eq!(back.climbs, analysis.climbs);
    }

    #[test]
    fn test_empty_file() {
        let analysis = analyze_flight("", None, &AnalysisConfig::default()).unwrap();
        assert!(analysis.fixes.is_empty());
        assert!(analysis.summary.is_none());
        assert!(analysis.climbs.is_empty());
        assert!(analysis.thermals.is_empty());
        assert!(analysis.wind.window.is_none());
        assert!(analysis.mean_thermal_drift().is_none());
    }

    #[test]
    fn test_errors_at_the_edges() {
        let err = analyze_flight(&sample_igc(), Some("2024/06/17"), &AnalysisConfig::default())
            .unwrap_err();
        assert!(matches!(err, AnalysisError::InvalidFlightDate { .. }));

        let mut config = AnalysisConfig::default();
        config.thermal.window_pts = 1;
        let err = analyze_flight(&sample_igc(), None, &config).unwrap_err();
        assert!(matches!(err, AnalysisError::Config { .. }));
    }
}

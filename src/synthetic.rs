//! Deterministic synthetic flights.
//!
//! Builds 1 Hz fix sequences from a scripted profile of straight legs and
//! circling segments flown through a uniformly drifting air mass. Used by
//! the unit tests, the integration tests and the benchmarks.
//!
//! # Example
//! ```
//! use igc_thermals::synthetic::SyntheticFlight;
//! use igc_thermals::TurnDirection;
//!
//! let fixes = SyntheticFlight::new(46.5, 8.0)
//!     .start_altitude(1500.0)
//!     .wind(2.0, 1.0)
//!     .straight(60, 90.0, 10.0, -1.0)
//!     .circle(120, 50.0, 30.0, TurnDirection::Left, 1.5)
//!     .fixes();
//! assert_eq!(fixes.len(), 180);
//! ```

use std::f64::consts::TAU;

use chrono::NaiveDate;

use crate::geo_utils::{normalize_deg, LocalProjection};
use crate::thermal::TurnDirection;
use crate::FixPoint;

/// Default start time: 10:00:00 UTC.
pub const DEFAULT_START_SEC: i64 = 36_000;

/// Default start altitude, meters.
pub const DEFAULT_START_ALTITUDE_M: f64 = 1000.0;

/// Scripted flight builder.
///
/// Positions are integrated in the air-mass frame and displaced by the
/// wind drift accumulated since the first fix.
#[derive(Debug, Clone)]
pub struct SyntheticFlight {
    projection: LocalProjection,
    start_sec: i64,
    wind_vx_ms: f64,
    wind_vy_ms: f64,
    /// Air-mass position, meters east/north of the origin
    air_x: f64,
    air_y: f64,
    /// Compass heading, degrees
    heading_deg: f64,
    altitude_m: f64,
    elapsed_sec: i64,
    fixes: Vec<FixPoint>,
}

impl SyntheticFlight {
    /// Start a flight at the given origin, heading north.
    pub fn new(lat: f64, lon: f64) -> Self {
        Self {
            projection: LocalProjection::new(lat, lon),
            start_sec: DEFAULT_START_SEC,
            wind_vx_ms: 0.0,
            wind_vy_ms: 0.0,
            air_x: 0.0,
            air_y: 0.0,
            heading_deg: 0.0,
            altitude_m: DEFAULT_START_ALTITUDE_M,
            elapsed_sec: 0,
            fixes: Vec::new(),
        }
    }

    /// Seconds since UTC midnight of the first fix.
    pub fn start_time(mut self, t_sec: i64) -> Self {
        self.start_sec = t_sec;
        self
    }

    pub fn start_altitude(mut self, altitude_m: f64) -> Self {
        self.altitude_m = altitude_m;
        self
    }

    /// Constant air-mass drift, m/s east and north.
    pub fn wind(mut self, vx_ms: f64, vy_ms: f64) -> Self {
        self.wind_vx_ms = vx_ms;
        self.wind_vy_ms = vy_ms;
        self
    }

    /// Fly a straight leg on a compass heading for `seconds` fixes.
    pub fn straight(mut self, seconds: u32, heading_deg: f64, airspeed_ms: f64, climb_ms: f64) -> Self {
        let (sin_h, cos_h) = heading_deg.to_radians().sin_cos();
        let (x0, y0, alt0) = (self.air_x, self.air_y, self.altitude_m);

        for k in 0..seconds {
            let s = k as f64;
            self.push(x0 + airspeed_ms * s * sin_h, y0 + airspeed_ms * s * cos_h, alt0 + climb_ms * s);
        }

        let s = seconds as f64;
        self.air_x = x0 + airspeed_ms * s * sin_h;
        self.air_y = y0 + airspeed_ms * s * cos_h;
        self.altitude_m = alt0 + climb_ms * s;
        self.heading_deg = normalize_deg(heading_deg);
        self
    }

    /// Circle for `seconds` fixes, one full turn every `period_sec`.
    ///
    /// The circle is tangent to the current heading, centered on the
    /// turning side.
    pub fn circle(
        mut self,
        seconds: u32,
        radius_m: f64,
        period_sec: f64,
        direction: TurnDirection,
        climb_ms: f64,
    ) -> Self {
        let (sin_h, cos_h) = self.heading_deg.to_radians().sin_cos();
        // Counter-clockwise in the east/north plane for left turns
        let sign = match direction {
            TurnDirection::Left => 1.0,
            TurnDirection::Right => -1.0,
        };
        let cx = self.air_x - sign * radius_m * cos_h;
        let cy = self.air_y + sign * radius_m * sin_h;
        let phase0 = (self.air_y - cy).atan2(self.air_x - cx);
        let omega = sign * TAU / period_sec;
        let alt0 = self.altitude_m;

        for k in 0..seconds {
            let phase = phase0 + omega * k as f64;
            self.push(cx + radius_m * phase.cos(), cy + radius_m * phase.sin(), alt0 + climb_ms * k as f64);
        }

        let s = seconds as f64;
        let phase = phase0 + omega * s;
        self.air_x = cx + radius_m * phase.cos();
        self.air_y = cy + radius_m * phase.sin();
        self.altitude_m = alt0 + climb_ms * s;
        self.heading_deg = normalize_deg(self.heading_deg - (omega * s).to_degrees());
        self
    }

    fn push(&mut self, air_x: f64, air_y: f64, altitude_m: f64) {
        let t = self.elapsed_sec as f64;
        let x = air_x + self.wind_vx_ms * t;
        let y = air_y + self.wind_vy_ms * t;
        let (lat, lon) = self.projection.unproject(x, y);
        self.fixes.push(FixPoint::new(self.start_sec + self.elapsed_sec, lat, lon, altitude_m));
        self.elapsed_sec += 1;
    }

    /// The generated fixes.
    pub fn fixes(self) -> Vec<FixPoint> {
        self.fixes
    }

    /// Render the flight as IGC text with a date header and B records.
    pub fn to_igc(&self, date: NaiveDate) -> String {
        to_igc(&self.fixes, date)
    }
}

/// Render fixes as IGC text. Positions are rounded to 0.001 minute.
pub fn to_igc(fixes: &[FixPoint], date: NaiveDate) -> String {
    let mut out = String::new();
    out.push_str("AXXXSYN synthetic\r\n");
    out.push_str(&format!("HFDTE{}\r\n", date.format("%d%m%y")));

    for fix in fixes {
        let t = fix.t_sec.rem_euclid(86_400);
        let altitude = fix.altitude_m.round().clamp(-9999.0, 99_999.0) as i64;
        out.push_str(&format!(
            "B{:02}{:02}{:02}{}{}A{:05}{:05}\r\n",
            t / 3600,
            (t / 60) % 60,
            t % 60,
            format_latitude(fix.lat),
            format_longitude(fix.lon),
            altitude,
            altitude,
        ));
    }
    out
}

/// `DDMMmmmN`
fn format_latitude(lat: f64) -> String {
    let hemisphere = if lat < 0.0 { 'S' } else { 'N' };
    let (deg, milli_min) = split_degrees(lat.abs());
    format!("{:02}{:05}{}", deg, milli_min, hemisphere)
}

/// `DDDMMmmmE`
fn format_longitude(lon: f64) -> String {
    let hemisphere = if lon < 0.0 { 'W' } else { 'E' };
    let (deg, milli_min) = split_degrees(lon.abs());
    format!("{:03}{:05}{}", deg, milli_min, hemisphere)
}

/// Whole degrees and thousandths of a minute, carrying rounding overflow.
fn split_degrees(value: f64) -> (u32, u32) {
    let total = (value * 60_000.0).round() as u64;
    ((total / 60_000) as u32, (total % 60_000) as u32)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geo_utils::haversine_distance;
    use crate::parse_igc_fixes;

    #[test]
    fn test_fix_count_and_timing() {
        let fixes = SyntheticFlight::new(46.5, 8.0)
            .start_time(43_200)
            .straight(10, 0.0, 10.0, 0.0)
            .circle(20, 50.0, 30.0, TurnDirection::Right, 1.0)
            .fixes();

        assert_eq!(fixes.len(), 30);
        assert_eq!(fixes[0].t_sec, 43_200);
        assert!(fixes.windows(2).all(|w| w[1].t_sec - w[0].t_sec == 1));
    }

    #[test]
    fn test_straight_speed_and_climb() {
        let fixes = SyntheticFlight::new(46.5, 8.0)
            .straight(11, 90.0, 10.0, 2.0)
            .fixes();
        let d = haversine_distance(&fixes[0], &fixes[10]);
        assert!((d - 100.0).abs() < 0.5, "distance {d}");
        assert!((fixes[10].altitude_m - 1020.0).abs() < 1e-9);
        assert!(fixes[10].lon > fixes[0].lon);
    }

    #[test]
    fn test_circle_closes_without_wind() {
        let fixes = SyntheticFlight::new(46.5, 8.0)
            .circle(31, 50.0, 30.0, TurnDirection::Left, 0.0)
            .fixes();
        assert!(haversine_distance(&fixes[0], &fixes[30]) < 0.01);
        // Half a turn puts the glider a diameter away
        let d = haversine_distance(&fixes[0], &fixes[15]);
        assert!((d - 100.0).abs() < 0.5, "diameter {d}");
    }

    #[test]
    fn test_wind_displaces_closed_circle() {
        let fixes = SyntheticFlight::new(46.5, 8.0)
            .wind(3.0, 4.0)
            .circle(31, 50.0, 30.0, TurnDirection::Left, 0.0)
            .fixes();
        let d = haversine_distance(&fixes[0], &fixes[30]);
        assert!((d - 150.0).abs() < 0.5, "drift {d}");
    }

    #[test]
    fn test_continuous_across_segments() {
        let fixes = SyntheticFlight::new(46.5, 8.0)
            .straight(10, 0.0, 10.0, 0.0)
            .circle(10, 50.0, 30.0, TurnDirection::Left, 0.0)
            .straight(10, 0.0, 10.0, 0.0)
            .fixes();
        for pair in fixes.windows(2) {
            let step = haversine_distance(&pair[0], &pair[1]);
            assert!(step < 11.0, "jump of {step} m");
        }
    }

    #[test]
    fn test_igc_round_trip() {
        let flight = SyntheticFlight::new(-33.5, -70.25)
            .start_altitude(800.0)
            .straight(5, 45.0, 10.0, 1.0);
        let date = NaiveDate::from_ymd_opt(2024, 6, 17).unwrap();
        let text = flight.to_igc(date);
        let original = flight.fixes();
        let parsed = parse_igc_fixes(&text);

        let lines: Vec<&str> = text.split("\r\n").collect();
        assert_eq!(lines[0], "AXXXSYN synthetic");
        assert_eq!(lines[1], "HFDTE170624");
        assert_eq!(lines[2], "B1000003330000S07015000WA0080000800");
        assert_eq!(lines.iter().filter(|l| l.starts_with('B')).count(), 5);
        assert_eq!(parsed.len(), original.len());
        for (a, b) in parsed.iter().zip(&original) {
            assert_eq!(a.t_sec, b.t_sec);
            assert!(haversine_distance(a, b) < 2.0);
            assert!((a.altitude_m - b.altitude_m).abs() <= 0.5);
        }
    }

    #[test]
    fn test_coordinate_formatting() {
        assert_eq!(format_latitude(46.5), "4630000N");
        assert_eq!(format_longitude(-8.0), "00800000W");
        // 59.9999 minutes rounds up into the next degree
        assert_eq!(format_latitude(46.0 + 59.99999 / 60.0), "4700000N");
    }
}

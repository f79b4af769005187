//! IGC flight-recorder parsing.
//!
//! Only two record types matter for analysis:
//! - **B records**: one position fix each (fixed-width, 35+ characters)
//! - **H records**: header metadata (flight date, pilot, glider)
//!
//! B record layout (1-based columns):
//!
//! ```text
//! B HHMMSS DDMMmmmN DDDMMmmmE V PPPPP GGGGG
//!   2-7    8-15     16-24     25 26-30 31-35
//! ```
//!
//! Malformed records are skipped silently so that partially corrupt files
//! still yield every readable fix. No day-rollover correction is applied:
//! a flight crossing UTC midnight sorts its post-midnight fixes first.

use chrono::{DateTime, NaiveDate, TimeDelta, Utc};
use log::{info, warn};
use serde::{Deserialize, Serialize};

use crate::error::{AnalysisError, Result};
use crate::FixPoint;

/// Minimum length of a usable B record.
pub const MIN_B_RECORD_LEN: usize = 35;

/// Header metadata from H records.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IgcHeader {
    /// Flight date from `HFDTE`
    pub date: Option<NaiveDate>,
    /// Pilot in charge from `HFPLT`
    pub pilot: Option<String>,
    /// Glider model from `HFGTY`
    pub glider_type: Option<String>,
    /// Glider registration / competition id from `HFGID`
    pub glider_id: Option<String>,
}

/// A parsed IGC file.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IgcFlight {
    pub header: IgcHeader,
    /// Resolved flight date: explicit argument first, then header
    pub date: Option<NaiveDate>,
    /// Fixes sorted ascending by `t_sec`
    pub fixes: Vec<FixPoint>,
}

impl IgcFlight {
    /// Absolute UTC time of a fix, if the flight date is known.
    pub fn fix_datetime(&self, fix: &FixPoint) -> Option<DateTime<Utc>> {
        let midnight = self.date?.and_hms_opt(0, 0, 0)?.and_utc();
        midnight.checked_add_signed(TimeDelta::try_seconds(fix.t_sec)?)
    }

    /// Absolute UTC time of the first fix.
    pub fn start_time(&self) -> Option<DateTime<Utc>> {
        self.fixes.first().and_then(|f| self.fix_datetime(f))
    }
}

/// Parse an IGC file with an optional explicit flight date (`YYYY-MM-DD`).
///
/// The explicit date wins over the `HFDTE` header. An explicit date that
/// does not parse is the only error; bad records are skipped.
///
/// # Example
/// ```
/// use igc_thermals::parse_igc;
///
/// let text = "HFDTE170624\nB1200004630000N00800000EA0100001000\n";
/// let flight = parse_igc(text, None).unwrap();
/// assert_eq!(flight.fixes.len(), 1);
/// assert_eq!(flight.date.unwrap().to_string(), "2024-06-17");
/// ```
pub fn parse_igc(text: &str, flight_date: Option<&str>) -> Result<IgcFlight> {
    let explicit = flight_date
        .map(|value| {
            NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d").map_err(|_| {
                AnalysisError::InvalidFlightDate {
                    value: value.to_string(),
                }
            })
        })
        .transpose()?;

    let header = parse_header(text);
    let date = explicit.or(header.date);
    if date.is_none() {
        warn!("[Igc] No flight date available, absolute fix times unavailable");
    }

    let fixes = parse_igc_fixes(text);

    Ok(IgcFlight {
        header,
        date,
        fixes,
    })
}

/// Parse every B record into a fix, sorted ascending by time.
pub fn parse_igc_fixes(text: &str) -> Vec<FixPoint> {
    let mut skipped = 0usize;
    let mut fixes: Vec<FixPoint> = Vec::new();

    for line in text.lines() {
        let line = line.trim_end();
        if !line.starts_with('B') {
            continue;
        }
        match parse_b_record(line) {
            Some(fix) => fixes.push(fix),
            None => skipped += 1,
        }
    }

    // Stable sort keeps file order for equal timestamps
    fixes.sort_by_key(|f| f.t_sec);

    info!(
        "[Igc] Parsed {} fixes ({} malformed B records skipped)",
        fixes.len(),
        skipped
    );
    fixes
}

/// Parse a single B record. Returns `None` for anything malformed.
pub fn parse_b_record(line: &str) -> Option<FixPoint> {
    if !line.starts_with('B') || line.len() < MIN_B_RECORD_LEN {
        return None;
    }

    let hh: i64 = parse_int(line.get(1..3)?)?;
    let mm: i64 = parse_int(line.get(3..5)?)?;
    let ss: i64 = parse_int(line.get(5..7)?)?;
    let t_sec = hh * 3600 + mm * 60 + ss;

    let lat_deg = parse_number(line.get(7..9)?)?;
    let lat_min = parse_number(line.get(9..14)?)? / 1000.0;
    let mut lat = lat_deg + lat_min / 60.0;
    if line.get(14..15)? == "S" {
        lat = -lat;
    }

    let lon_deg = parse_number(line.get(15..18)?)?;
    let lon_min = parse_number(line.get(18..23)?)? / 1000.0;
    let mut lon = lon_deg + lon_min / 60.0;
    if line.get(23..24)? == "W" {
        lon = -lon;
    }

    let pressure_alt = line.get(25..30).and_then(parse_number).unwrap_or(f64::NAN);
    let gnss_alt = line.get(30..35).and_then(parse_number).unwrap_or(f64::NAN);
    let altitude_m = if gnss_alt.is_finite() && gnss_alt > 0.0 {
        gnss_alt
    } else {
        pressure_alt
    };

    let fix = FixPoint::new(t_sec, lat, lon, altitude_m);
    fix.is_valid().then_some(fix)
}

/// Parse the H records this library cares about.
pub fn parse_header(text: &str) -> IgcHeader {
    let mut header = IgcHeader::default();

    for line in text.lines() {
        let line = line.trim_end();
        if !line.starts_with('H') {
            continue;
        }
        // H + source letter (F/O/P) + three-letter subject
        let Some(code) = line.get(2..5) else {
            continue;
        };
        let rest = line.get(5..).unwrap_or("");

        match code {
            "DTE" => {
                if header.date.is_none() {
                    header.date = parse_header_date(rest);
                }
            }
            "PLT" => header.pilot = header_value(rest),
            "GTY" => header.glider_type = header_value(rest),
            "GID" => header.glider_id = header_value(rest),
            _ => {}
        }
    }

    header
}

/// `ddmmyy`, optionally prefixed by `DATE:` and followed by `,NN`.
fn parse_header_date(rest: &str) -> Option<NaiveDate> {
    let rest = rest.strip_prefix("DATE:").unwrap_or(rest);
    let digits = rest.get(0..6)?;
    let day: u32 = parse_int(digits.get(0..2)?)?;
    let month: u32 = parse_int(digits.get(2..4)?)?;
    let yy: i32 = parse_int(digits.get(4..6)?)?;
    let year = if yy < 80 { 2000 + yy } else { 1900 + yy };
    NaiveDate::from_ymd_opt(year, month, day)
}

/// Long-form headers carry `LABEL:value`; short-form ones just the value.
fn header_value(rest: &str) -> Option<String> {
    let value = match rest.split_once(':') {
        Some((_, v)) => v,
        None => rest,
    }
    .trim();
    (!value.is_empty()).then(|| value.to_string())
}

fn parse_number(field: &str) -> Option<f64> {
    field.trim().parse::<f64>().ok()
}

fn parse_int<T: std::str::FromStr>(field: &str) -> Option<T> {
    if !field.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    field.parse::<T>().ok()
}

//! Weather and load-curve file ingestion.
//!
//! Weather files hold hourly station records over several years. Each hour
//! of the year is averaged across the configured year range, with February 29
//! dropped so the result maps onto the non-leap reference calendar.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use chrono::{Datelike, NaiveDate, NaiveDateTime, Timelike};
use serde::Deserialize;

use crate::error::DataError;
use crate::model::{HOURS, Weather};

/// Values at or below this mark a missing measurement.
const MISSING_MARK: f64 = -999.0;

/// Column layout of a weather file. Column indexes are zero-based.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct WeatherFileSettings {
    pub separator: char,
    /// Whether the first row is a header.
    pub has_header: bool,
    /// Timestamp column, `YYYYMMDDHH` or `YYYY-MM-DD HH:MM`.
    pub date_column: usize,
    /// Air temperature (°C).
    pub temperature_column: usize,
    /// Direct irradiance (W/m²).
    pub direct_radiation_column: usize,
    /// Diffuse irradiance (W/m²).
    pub diffuse_radiation_column: usize,
    /// First year to include.
    pub start_year: i32,
    /// Last year to include.
    pub end_year: i32,
}

impl Default for WeatherFileSettings {
    fn default() -> Self {
        Self {
            separator: ';',
            has_header: true,
            date_column: 1,
            temperature_column: 5,
            direct_radiation_column: 12,
            diffuse_radiation_column: 13,
            start_year: 1994,
            end_year: 2013,
        }
    }
}

fn open(path: &Path) -> Result<File, DataError> {
    File::open(path).map_err(|source| DataError::Io {
        path: path.display().to_string(),
        source,
    })
}

fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    if raw.len() == 10 && raw.bytes().all(|b| b.is_ascii_digit()) {
        let date = NaiveDate::parse_from_str(&raw[..8], "%Y%m%d").ok()?;
        let hour: u32 = raw[8..].parse().ok()?;
        return date.and_hms_opt(hour, 0, 0);
    }
    ["%Y-%m-%d %H:%M", "%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M:%S"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
}

/// Hour of the non-leap year; `None` for February 29.
fn hour_of_year(stamp: NaiveDateTime) -> Option<usize> {
    let day = NaiveDate::from_ymd_opt(2023, stamp.month(), stamp.day())?;
    Some(day.ordinal0() as usize * 24 + stamp.hour() as usize)
}

fn field(record: &csv::StringRecord, column: usize, line: u64) -> Result<&str, DataError> {
    record.get(column).ok_or_else(|| DataError::Parse {
        line,
        message: format!("missing column {column}"),
    })
}

/// Parses a numeric field; missing-value marks yield `None`.
fn number(record: &csv::StringRecord, column: usize, line: u64) -> Result<Option<f64>, DataError> {
    let raw = field(record, column, line)?;
    let value: f64 = raw.parse().map_err(|_| DataError::Parse {
        line,
        message: format!("`{raw}` in column {column} is not a number"),
    })?;
    Ok((value > MISSING_MARK).then_some(value))
}

#[derive(Debug, Clone)]
struct HourlyMean {
    sums: Vec<f64>,
    counts: Vec<u32>,
}

impl HourlyMean {
    fn new() -> Self {
        Self {
            sums: vec![0.0; HOURS],
            counts: vec![0; HOURS],
        }
    }

    fn add(&mut self, hour: usize, value: f64) {
        self.sums[hour] += value;
        self.counts[hour] += 1;
    }

    fn missing(&self) -> usize {
        self.counts.iter().filter(|&&c| c == 0).count()
    }

    fn means(&self) -> Vec<f64> {
        self.sums
            .iter()
            .zip(&self.counts)
            .map(|(&s, &c)| if c > 0 { s / f64::from(c) } else { 0.0 })
            .collect()
    }
}

/// Reads a weather file into a full-year [`Weather`].
///
/// # Errors
///
/// Returns a [`DataError`] if the file cannot be read, a row is malformed,
/// or some hour of the year has no temperature in the year range.
pub fn read_weather(path: &Path, settings: &WeatherFileSettings) -> Result<Weather, DataError> {
    read_weather_from(open(path)?, settings)
}

/// Reads weather records from any reader. See [`read_weather`].
///
/// # Errors
///
/// See [`read_weather`].
pub fn read_weather_from(
    reader: impl Read,
    settings: &WeatherFileSettings,
) -> Result<Weather, DataError> {
    let mut rdr = csv::ReaderBuilder::new()
        .delimiter(settings.separator as u8)
        .has_headers(settings.has_header)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let mut temperature = HourlyMean::new();
    let mut radiation = HourlyMean::new();

    for record in rdr.records() {
        let record = record?;
        let line = record.position().map_or(0, csv::Position::line);
        let raw_date = field(&record, settings.date_column, line)?;
        let stamp = parse_timestamp(raw_date).ok_or_else(|| DataError::Parse {
            line,
            message: format!("invalid timestamp `{raw_date}`"),
        })?;
        if stamp.year() < settings.start_year || stamp.year() > settings.end_year {
            continue;
        }
        let Some(hour) = hour_of_year(stamp) else {
            continue;
        };

        if let Some(t) = number(&record, settings.temperature_column, line)? {
            temperature.add(hour, t);
        }
        let direct = number(&record, settings.direct_radiation_column, line)?;
        let diffuse = number(&record, settings.diffuse_radiation_column, line)?;
        if direct.is_some() || diffuse.is_some() {
            radiation.add(hour, direct.unwrap_or(0.0) + diffuse.unwrap_or(0.0));
        }
    }

    let missing = temperature.missing();
    if missing > 0 {
        return Err(DataError::Incomplete {
            series: "temperature",
            count: missing,
        });
    }
    Ok(Weather {
        temperatures: temperature.means(),
        radiation: radiation.means(),
    })
}

/// Reads a single-column load curve (kW per hour). A non-numeric first row
/// is treated as a header.
///
/// The length is not checked here; the project validation does that.
///
/// # Errors
///
/// Returns a [`DataError`] if the file cannot be read or a value is not a number.
pub fn read_load_curve(path: &Path) -> Result<Vec<f64>, DataError> {
    read_load_curve_from(open(path)?)
}

/// Reads a load curve from any reader. See [`read_load_curve`].
///
/// # Errors
///
/// See [`read_load_curve`].
pub fn read_load_curve_from(reader: impl Read) -> Result<Vec<f64>, DataError> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let mut values = Vec::with_capacity(HOURS);
    for (i, record) in rdr.records().enumerate() {
        let record = record?;
        let Some(raw) = record.get(0).filter(|s| !s.is_empty()) else {
            continue;
        };
        match raw.parse::<f64>() {
            Ok(v) => values.push(v),
            Err(_) if i == 0 => {}
            Err(_) => {
                return Err(DataError::Parse {
                    line: record.position().map_or(0, csv::Position::line),
                    message: format!("`{raw}` is not a number"),
                });
            }
        }
    }
    Ok(values)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings() -> WeatherFileSettings {
        WeatherFileSettings {
            separator: ';',
            has_header: true,
            date_column: 0,
            temperature_column: 1,
            direct_radiation_column: 2,
            diffuse_radiation_column: 3,
            start_year: 2000,
            end_year: 2001,
        }
    }

    /// Two full years (2000 is a leap year) with a per-year temperature offset.
    fn two_years() -> String {
        let mut text = String::from("date;t;dir;dif\n");
        for (year, offset) in [(2000, 0.0), (2001, 2.0), (2002, 50.0)] {
            let mut day = NaiveDate::from_ymd_opt(year, 1, 1).expect("valid date");
            while day.year() == year {
                for hour in 0..24 {
                    let t = offset + f64::from(hour);
                    let rad = if (8..16).contains(&hour) { "300;100" } else { "0;-999" };
                    text.push_str(&format!("{}{hour:02};{t};{rad}\n", day.format("%Y%m%d")));
                }
                day = day.succ_opt().expect("next day");
            }
        }
        text
    }

    #[test]
    fn default_settings_match_station_format() {
        let s = WeatherFileSettings::default();
        assert_eq!(s.separator, ';');
        assert_eq!((s.date_column, s.temperature_column), (1, 5));
        assert_eq!((s.direct_radiation_column, s.diffuse_radiation_column), (12, 13));
        assert_eq!((s.start_year, s.end_year), (1994, 2013));
    }

    #[test]
    fn averages_years_and_skips_leap_day() {
        let weather = read_weather_from(two_years().as_bytes(), &settings())
            .expect("weather should parse");
        assert_eq!(weather.temperatures.len(), HOURS);
        // mean of offsets 0 and 2, year 2002 is outside the range
        assert!((weather.temperatures[0] - 1.0).abs() < 1e-9);
        assert!((weather.temperatures[HOURS - 1] - 24.0).abs() < 1e-9);
        // March 1 follows Feb 28 directly
        let march_first = (31 + 28) * 24;
        assert!((weather.temperatures[march_first + 5] - 6.0).abs() < 1e-9);
        assert!((weather.radiation[10] - 400.0).abs() < 1e-9);
        assert_eq!(weather.radiation[2], 0.0);
    }

    #[test]
    fn incomplete_year_is_rejected() {
        let text = "date;t;dir;dif\n2000010100;1.0;0;0\n";
        let err = read_weather_from(text.as_bytes(), &settings());
        assert!(matches!(err, Err(DataError::Incomplete { series: "temperature", .. })));
    }

    #[test]
    fn bad_timestamp_reports_line() {
        let text = "date;t;dir;dif\nyesterday;1.0;0;0\n";
        match read_weather_from(text.as_bytes(), &settings()) {
            Err(DataError::Parse { line, message }) => {
                assert_eq!(line, 2);
                assert!(message.contains("yesterday"));
            }
            other => panic!("expected parse error, got {other:?}"),
        }
    }

    #[test]
    fn iso_timestamps_are_accepted() {
        let stamp = parse_timestamp("2001-03-01 05:00").expect("iso stamp");
        assert_eq!(hour_of_year(stamp), Some((31 + 28) * 24 + 5));
        let leap = parse_timestamp("2000022912").expect("compact stamp");
        assert_eq!(hour_of_year(leap), None);
    }

    #[test]
    fn load_curve_with_header() {
        let values = read_load_curve_from("load_kw\n1.5\n2\n\n3.25\n".as_bytes())
            .expect("load curve should parse");
        assert_eq!(values, vec![1.5, 2.0, 3.25]);
    }

    #[test]
    fn load_curve_rejects_garbage() {
        let err = read_load_curve_from("1\nabc\n".as_bytes());
        assert!(matches!(err, Err(DataError::Parse { line: 2, .. })));
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = read_load_curve(Path::new("/nonexistent/load.csv"));
        assert!(matches!(err, Err(DataError::Io { .. })));
    }
}

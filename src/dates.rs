//! Date helpers for seNorge file names and the NetCDF time axis.
//!
//! Theme files are named `<theme>_YYYY_MM_DD.<ext>`; the theme name itself
//! may contain underscores.

use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Timelike, Utc};
use std::path::Path;

use crate::error::{Result, SenorgeError};

/// Units of the NetCDF `time` coordinate
pub const TIME_UNITS: &str = "seconds since 1970-01-01 00:00:00 +00:00";

/// Hour of day a daily theme value refers to
pub const THEME_HOUR: u32 = 6;

fn invalid_name(path: &Path, message: &str) -> SenorgeError {
    SenorgeError::InvalidParameter {
        param: "filename".to_string(),
        message: format!("{}: {}", path.display(), message),
    }
}

/// Split `<theme>_YYYY_MM_DD.<ext>` into theme name and date
pub fn split_filename(path: &Path) -> Result<(String, NaiveDate)> {
    let stem = path
        .file_stem()
        .and_then(|s| s.to_str())
        .ok_or_else(|| invalid_name(path, "file name is not valid UTF-8"))?;

    let parts: Vec<&str> = stem.rsplitn(4, '_').collect();
    if parts.len() != 4 {
        return Err(invalid_name(path, "expected <theme>_YYYY_MM_DD"));
    }
    let (day, month, year, theme) = (parts[0], parts[1], parts[2], parts[3]);

    let parse = |v: &str| {
        v.parse::<u32>()
            .map_err(|_| invalid_name(path, "date fields must be numeric"))
    };
    let date = NaiveDate::from_ymd_opt(parse(year)? as i32, parse(month)?, parse(day)?)
        .ok_or_else(|| invalid_name(path, "not a calendar date"))?;
    Ok((theme.to_string(), date))
}

/// Date encoded in a theme file name
pub fn date_from_filename(path: &Path) -> Result<NaiveDate> {
    split_filename(path).map(|(_, date)| date)
}

/// `YYYY_MM_DD`, as used in BIL file names
pub fn bil_date_string(date: NaiveDate) -> String {
    date.format("%Y_%m_%d").to_string()
}

/// `HH_YYYY_MM_DD`, as used in model forecast file names
pub fn um_date_string(datetime: NaiveDateTime) -> String {
    format!("{:02}_{}", datetime.hour(), bil_date_string(datetime.date()))
}

/// Hydrological year of `date`: September to December count toward the
/// following calendar year
pub fn hydrological_year(date: NaiveDate) -> i32 {
    if date.month() >= 9 {
        date.year() + 1
    } else {
        date.year()
    }
}

/// The UTC instant a daily theme value refers to (06:00 on `date`)
pub fn theme_time(date: NaiveDate) -> DateTime<Utc> {
    let time = NaiveTime::from_hms_opt(THEME_HOUR, 0, 0).unwrap_or_default();
    Utc.from_utc_datetime(&date.and_time(time))
}

/// Seconds since 1970-01-01T00:00:00Z
pub fn epoch_seconds(datetime: DateTime<Utc>) -> f64 {
    datetime.timestamp() as f64
}

/// Inverse of [`epoch_seconds`]; `None` when out of range
pub fn from_epoch_seconds(seconds: f64) -> Option<DateTime<Utc>> {
    Utc.timestamp_opt(seconds.round() as i64, 0).single()
}

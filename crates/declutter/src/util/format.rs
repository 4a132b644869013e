use crate::error::{DeclutterError, Result};
use chrono::{DateTime, Local, Utc};
use std::time::Duration;

/// Binary units, smallest first, shared by formatting and parsing.
const UNITS: [&str; 4] = ["B", "KB", "MB", "GB"];

pub fn format_bytes(bytes: u64) -> String {
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit + 1 < UNITS.len() {
        value /= 1024.0;
        unit += 1;
    }

    if unit == 0 {
        format!("{} B", bytes)
    } else {
        format!("{:.2} {}", value, UNITS[unit])
    }
}

/// Sub-second runs show milliseconds, longer ones seconds with one decimal.
pub fn format_duration(duration: Duration) -> String {
    if duration < Duration::from_secs(1) {
        format!("{}ms", duration.as_millis())
    } else {
        format!("{:.1}s", duration.as_secs_f64())
    }
}

/// Local time, minute precision, as shown in the duplicates table.
pub fn format_timestamp(dt: &DateTime<Utc>) -> String {
    dt.with_timezone(&Local).format("%Y-%m-%d %H:%M").to_string()
}

/// Parses `--min-size` values such as `512`, `10KB` or `1.5 mb` into bytes.
pub fn parse_size_string(input: &str) -> Result<u64> {
    let upper = input.trim().to_uppercase();
    let invalid = || DeclutterError::Config(format!("Invalid size: {}", input));

    let (number, exponent) = UNITS
        .iter()
        .enumerate()
        .rev()
        .find_map(|(i, unit)| upper.strip_suffix(unit).map(|rest| (rest, i as i32)))
        .unwrap_or((upper.as_str(), 0));

    let value: f64 = number.trim().parse().map_err(|_| invalid())?;
    if !value.is_finite() || value < 0.0 {
        return Err(invalid());
    }

    Ok((value * 1024f64.powi(exponent)) as u64)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_bytes() {
        assert_eq!(format_bytes(0), "0 B");
        assert_eq!(format_bytes(1023), "1023 B");
        assert_eq!(format_bytes(1024), "1.00 KB");
        assert_eq!(format_bytes(1536 * 1024), "1.50 MB");
        assert_eq!(format_bytes(3 * 1024_u64.pow(4)), "3072.00 GB");
    }

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(Duration::from_millis(250)), "250ms");
        assert_eq!(format_duration(Duration::from_millis(12_340)), "12.3s");
    }

    #[test]
    fn test_parse_size_string() {
        assert_eq!(parse_size_string("512").unwrap(), 512);
        assert_eq!(parse_size_string("512b").unwrap(), 512);
        assert_eq!(parse_size_string("1kb").unwrap(), 1024);
        assert_eq!(parse_size_string("1.5 MB").unwrap(), 1_572_864);
        assert_eq!(parse_size_string("2GB").unwrap(), 2 * 1024_u64.pow(3));
        assert!(matches!(parse_size_string("lots"), Err(DeclutterError::Config(_))));
        assert!(parse_size_string("-1").is_err());
    }
}

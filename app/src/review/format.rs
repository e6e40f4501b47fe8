//! Formatting helpers for review values.

use chrono::{DateTime, Utc};
use icp_common::ParserError;

/// Decimals of one ICP in e8s.
const ICP_DECIMALS: u32 = 8;
/// Fraction digits always shown.
const MIN_FRACTION_DIGITS: usize = 2;

const SECONDS_PER_MINUTE: u64 = 60;
const SECONDS_PER_HOUR: u64 = 60 * SECONDS_PER_MINUTE;
const SECONDS_PER_DAY: u64 = 24 * SECONDS_PER_HOUR;
const SECONDS_PER_YEAR: u64 = 365 * SECONDS_PER_DAY;

/// Formats an e8s amount as ICP: `150000000` is `1.50`.
pub fn format_icp(e8s: u64) -> String {
    let divisor = 10u64.pow(ICP_DECIMALS);
    let whole = e8s / divisor;
    let frac = e8s % divisor;

    let frac_str = format!("{:0width$}", frac, width = ICP_DECIMALS as usize);
    let trimmed = frac_str.trim_end_matches('0');
    let shown = if trimmed.len() < MIN_FRACTION_DIGITS {
        &frac_str[..MIN_FRACTION_DIGITS]
    } else {
        trimmed
    };
    format!("{}.{}", whole, shown)
}

/// Formats a duration as `1y 2d 3h 4m 5s`, omitting zero components.
pub fn format_duration(seconds: u64) -> String {
    if seconds == 0 {
        return String::from("0s");
    }

    let parts = [
        (seconds / SECONDS_PER_YEAR, 'y'),
        ((seconds % SECONDS_PER_YEAR) / SECONDS_PER_DAY, 'd'),
        ((seconds % SECONDS_PER_DAY) / SECONDS_PER_HOUR, 'h'),
        ((seconds % SECONDS_PER_HOUR) / SECONDS_PER_MINUTE, 'm'),
        (seconds % SECONDS_PER_MINUTE, 's'),
    ];

    let mut out = String::new();
    for (value, unit) in parts {
        if value == 0 {
            continue;
        }
        if !out.is_empty() {
            out.push(' ');
        }
        out.push_str(&format!("{}{}", value, unit));
    }
    out
}

/// Formats seconds since the epoch as `YYYY-MM-DD HH:MM:SS UTC`.
pub fn format_timestamp(seconds: u64) -> Result<String, ParserError> {
    let seconds = i64::try_from(seconds).map_err(|_| ParserError::ValueOutOfRange)?;
    let datetime =
        DateTime::<Utc>::from_timestamp(seconds, 0).ok_or(ParserError::ValueOutOfRange)?;
    Ok(datetime.format("%Y-%m-%d %H:%M:%S UTC").to_string())
}

/// Lowercase hex.
pub fn format_hex(bytes: &[u8]) -> String {
    hex::encode(bytes)
}

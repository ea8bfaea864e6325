//! Production-timestamp decoding
//!
//! The broker stamps each message descriptor with fixed-width UTC date and
//! time fields: `YYYYMMDD` and `HHMMSSff`, where `ff` is hundredths of a
//! second. Latency is the gap between that instant and the retrieval
//! instant, so a malformed stamp means the message cannot contribute a
//! sample.

use chrono::{DateTime, NaiveDate, NaiveTime, TimeDelta, Utc};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TimestampError {
    #[error("put date must be 8 ASCII digits, got {0:?}")]
    MalformedDate(String),
    #[error("put time must be 8 ASCII digits, got {0:?}")]
    MalformedTime(String),
    #[error("put timestamp out of range: {0:?} {1:?}")]
    OutOfRange(String, String),
}

fn is_fixed_width_digits(field: &str) -> bool {
    field.len() == 8 && field.bytes().all(|b| b.is_ascii_digit())
}

/// Decode a descriptor's put date and time into a UTC instant.
pub fn decode_put_timestamp(
    put_date: &str,
    put_time: &str,
) -> Result<DateTime<Utc>, TimestampError> {
    if !is_fixed_width_digits(put_date) {
        return Err(TimestampError::MalformedDate(put_date.to_string()));
    }
    if !is_fixed_width_digits(put_time) {
        return Err(TimestampError::MalformedTime(put_time.to_string()));
    }

    let out_of_range =
        || TimestampError::OutOfRange(put_date.to_string(), put_time.to_string());

    let date = NaiveDate::parse_from_str(put_date, "%Y%m%d").map_err(|_| out_of_range())?;
    let time = NaiveTime::parse_from_str(&put_time[..6], "%H%M%S").map_err(|_| out_of_range())?;
    // Width and digit checks above make this parse infallible.
    let hundredths: i64 = put_time[6..].parse().map_err(|_| out_of_range())?;

    Ok(date.and_time(time).and_utc() + TimeDelta::milliseconds(hundredths * 10))
}

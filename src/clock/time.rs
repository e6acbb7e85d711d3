//! Wall-clock source and time text formatting

use chrono::{DateTime, FixedOffset, Local, Timelike};
use std::time::Duration;

use crate::constants::timing::MINUTE_MS;

/// Source of the current wall-clock time
pub trait WallClock: Send + Sync + 'static {
    fn now(&self) -> DateTime<FixedOffset>;
}

/// The system clock in the local time zone
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl WallClock for SystemClock {
    fn now(&self) -> DateTime<FixedOffset> {
        Local::now().fixed_offset()
    }
}

/// "13:05" in 24-hour mode, "01:05" in 12-hour mode (no AM/PM marker)
pub fn format_time<T: Timelike>(use_24_hour_format: bool, time: &T) -> String {
    let hour = if use_24_hour_format {
        time.hour()
    } else {
        time.hour12().1
    };
    format!("{:02}:{:02}", hour, time.minute())
}

/// Time left until the next wall-clock minute boundary
pub fn until_next_minute(now: &DateTime<FixedOffset>) -> Duration {
    let into_minute = now.timestamp_millis().rem_euclid(MINUTE_MS);
    Duration::from_millis((MINUTE_MS - into_minute) as u64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveTime, TimeZone};

    fn at(h: u32, m: u32, s: u32, ms: u32) -> DateTime<FixedOffset> {
        FixedOffset::east_opt(0)
            .unwrap()
            .with_ymd_and_hms(2024, 3, 9, h, m, s)
            .unwrap()
            + chrono::Duration::milliseconds(i64::from(ms))
    }

    #[test]
    fn test_format_24_hour() {
        let time = NaiveTime::from_hms_opt(13, 5, 0).unwrap();
        assert_eq!(format_time(true, &time), "13:05");
    }

    #[test]
    fn test_format_12_hour() {
        let time = NaiveTime::from_hms_opt(13, 5, 0).unwrap();
        assert_eq!(format_time(false, &time), "01:05");
    }

    #[test]
    fn test_format_midnight_and_noon() {
        let midnight = NaiveTime::from_hms_opt(0, 7, 0).unwrap();
        let noon = NaiveTime::from_hms_opt(12, 30, 0).unwrap();
        assert_eq!(format_time(true, &midnight), "00:07");
        assert_eq!(format_time(false, &midnight), "12:07");
        assert_eq!(format_time(false, &noon), "12:30");
    }

    #[test]
    fn test_until_next_minute() {
        assert_eq!(until_next_minute(&at(13, 5, 0, 0)), Duration::from_secs(60));
        assert_eq!(until_next_minute(&at(13, 5, 59, 0)), Duration::from_secs(1));
        assert_eq!(until_next_minute(&at(13, 5, 30, 250)), Duration::from_millis(29_750));
    }
}

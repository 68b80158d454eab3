// src/services/display_time.rs
use chrono::{DateTime, Duration, FixedOffset, NaiveDate, Offset, TimeZone, Utc};

/// Timestamps are stored in UTC and shown in Beijing time (UTC+8).
const DISPLAY_OFFSET_SECONDS: i32 = 8 * 3600;

pub const DATETIME: &str = "%Y-%m-%d %H:%M:%S";
pub const DATETIME_MINUTES: &str = "%Y-%m-%d %H:%M";
pub const CLOCK: &str = "%H:%M";

fn display_offset() -> FixedOffset {
    FixedOffset::east_opt(DISPLAY_OFFSET_SECONDS).unwrap_or_else(|| Utc.fix())
}

pub fn format_local(ts: &DateTime<Utc>, fmt: &str) -> String {
    ts.with_timezone(&display_offset()).format(fmt).to_string()
}

/// UTC bounds of the current display-timezone calendar day.
pub fn today_bounds(now: DateTime<Utc>) -> (DateTime<Utc>, DateTime<Utc>) {
    let offset = display_offset();
    let local_date: NaiveDate = now.with_timezone(&offset).date_naive();
    let start = local_date
        .and_hms_opt(0, 0, 0)
        .and_then(|midnight| offset.from_local_datetime(&midnight).single())
        .map(|t| t.with_timezone(&Utc))
        .unwrap_or(now);
    (start, start + Duration::days(1))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_shifts_to_utc_plus_eight() {
        let ts = Utc.with_ymd_and_hms(2024, 1, 10, 20, 30, 0).unwrap();
        assert_eq!(format_local(&ts, DATETIME), "2024-01-11 04:30:00");
        assert_eq!(format_local(&ts, CLOCK), "04:30");
    }

    #[test]
    fn test_today_bounds_follow_local_midnight() {
        // 17:00 UTC is already 01:00 the next day in UTC+8
        let now = Utc.with_ymd_and_hms(2024, 3, 1, 17, 0, 0).unwrap();
        let (start, end) = today_bounds(now);
        assert_eq!(start, Utc.with_ymd_and_hms(2024, 3, 1, 16, 0, 0).unwrap());
        assert_eq!(end, Utc.with_ymd_and_hms(2024, 3, 2, 16, 0, 0).unwrap());
    }
}

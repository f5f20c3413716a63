pub mod channel;
pub mod report;
pub mod warning;

pub use channel::ChannelSnapshot;
pub use report::ChannelReportRow;
pub use warning::{StoredWarningRow, WarningRow};

use chrono::{DateTime, FixedOffset, Utc};

pub const SECONDS_PER_DAY: i64 = 86_400;

/// Whole days from `since` (epoch seconds) to `now`, rounded down
pub fn days_since(now: DateTime<Utc>, since: i64) -> i64 {
    (now.timestamp() - since).div_euclid(SECONDS_PER_DAY)
}

/// Human-readable "YYYY/MM/DD HH:MM:SS" at the display offset
pub fn format_timestamp(ts: i64, offset: &FixedOffset) -> String {
    DateTime::from_timestamp(ts, 0)
        .map(|dt| dt.with_timezone(offset).format("%Y/%m/%d %H:%M:%S").to_string())
        .unwrap_or_default()
}

/// "@name", or "unknown" when the user couldn't be resolved
pub fn mention(name: &str) -> String {
    if name.is_empty() {
        "unknown".to_string()
    } else {
        format!("@{}", name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_days_since_rounds_down() {
        let now = Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap();
        let ts = now.timestamp();
        assert_eq!(days_since(now, ts), 0);
        assert_eq!(days_since(now, ts - SECONDS_PER_DAY + 1), 0);
        assert_eq!(days_since(now, ts - SECONDS_PER_DAY), 1);
        assert_eq!(days_since(now, ts - 90 * SECONDS_PER_DAY - 3600), 90);
        // future timestamps (clock skew) stay below zero
        assert_eq!(days_since(now, ts + 10), -1);
    }

    #[test]
    fn test_format_timestamp() {
        let tokyo = FixedOffset::east_opt(9 * 3600).unwrap();
        assert_eq!(format_timestamp(0, &tokyo), "1970/01/01 09:00:00");
        let utc = FixedOffset::east_opt(0).unwrap();
        assert_eq!(format_timestamp(1_700_000_000, &utc), "2023/11/14 22:13:20");
    }

    #[test]
    fn test_mention() {
        assert_eq!(mention("alice"), "@alice");
        assert_eq!(mention(""), "unknown");
    }
}

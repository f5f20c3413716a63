use super::days_since;
use super::channel::ChannelSnapshot;
use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Fallback layout for hand-edited cells, read as UTC
const PLAIN_DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// A channel that has been on the warning list since `listed_at`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WarningRecord {
    pub channel_id: String,
    pub listed_at: DateTime<Utc>,
}

/// Why a stored warning row was not recognized
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum RowSkip {
    #[error("row has no channel id")]
    MissingChannelId,

    #[error("row has no listed_at value")]
    MissingListedAt,

    #[error("listed_at is not a date: {0}")]
    NotADate(String),
}

/// One row of the archive warning table as computed by a run
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WarningRow {
    pub channel_name: String,
    pub channel_id: String,
    pub creator_name: String,
    pub last_user_name: String,
    pub elapsed_days: i64,
    pub listed_at: DateTime<Utc>,
    pub days_from_listed: i64,
}

impl WarningRow {
    pub fn new(snapshot: &ChannelSnapshot, listed_at: DateTime<Utc>, now: DateTime<Utc>) -> Self {
        Self {
            channel_name: snapshot.name.clone(),
            channel_id: snapshot.id.clone(),
            creator_name: snapshot.creator_name.clone(),
            last_user_name: snapshot.last_actor_name.clone(),
            elapsed_days: snapshot.elapsed_days,
            listed_at,
            days_from_listed: days_since(now, listed_at.timestamp()),
        }
    }
}

/// Row layout of the `archive_warning_channels` table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct StoredWarningRow {
    pub channel_name: String,
    pub channel_id: String,
    pub creator_name: String,
    pub last_user_name: String,
    pub elapsed_days: i64,
    pub listed_at: Option<String>,
    pub days_from_listed: i64,
}

impl From<&WarningRow> for StoredWarningRow {
    fn from(row: &WarningRow) -> Self {
        Self {
            channel_name: row.channel_name.clone(),
            channel_id: row.channel_id.clone(),
            creator_name: row.creator_name.clone(),
            last_user_name: row.last_user_name.clone(),
            elapsed_days: row.elapsed_days,
            listed_at: Some(row.listed_at.to_rfc3339()),
            days_from_listed: row.days_from_listed,
        }
    }
}

impl StoredWarningRow {
    /// Only rows with a channel id and a real date in `listed_at` are records
    pub fn parse_record(&self) -> Result<WarningRecord, RowSkip> {
        let channel_id = self.channel_id.trim();
        if channel_id.is_empty() {
            return Err(RowSkip::MissingChannelId);
        }

        let raw = self
            .listed_at
            .as_deref()
            .map(str::trim)
            .filter(|raw| !raw.is_empty())
            .ok_or(RowSkip::MissingListedAt)?;

        Ok(WarningRecord {
            channel_id: channel_id.to_string(),
            listed_at: parse_listed_at(raw)?,
        })
    }
}

fn parse_listed_at(raw: &str) -> Result<DateTime<Utc>, RowSkip> {
    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Ok(parsed.with_timezone(&Utc));
    }

    NaiveDateTime::parse_from_str(raw, PLAIN_DATETIME_FORMAT)
        .map(|naive| naive.and_utc())
        .map_err(|_| RowSkip::NotADate(raw.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn stored(channel_id: &str, listed_at: Option<&str>) -> StoredWarningRow {
        StoredWarningRow {
            channel_name: "dev".to_string(),
            channel_id: channel_id.to_string(),
            creator_name: String::new(),
            last_user_name: String::new(),
            elapsed_days: 100,
            listed_at: listed_at.map(str::to_string),
            days_from_listed: 1,
        }
    }

    #[test]
    fn test_parse_rfc3339_and_plain_dates() {
        let expected = Utc.with_ymd_and_hms(2024, 5, 20, 3, 0, 0).unwrap();

        let record = stored("C1", Some("2024-05-20T12:00:00+09:00")).parse_record().unwrap();
        assert_eq!(record.channel_id, "C1");
        assert_eq!(record.listed_at, expected);

        let record = stored("C1", Some("2024-05-20 03:00:00")).parse_record().unwrap();
        assert_eq!(record.listed_at, expected);
    }

    #[test]
    fn test_non_date_rows_are_skipped() {
        assert_eq!(
            stored("C1", Some("listed_at")).parse_record(),
            Err(RowSkip::NotADate("listed_at".to_string()))
        );
        assert_eq!(stored("C1", Some("  ")).parse_record(), Err(RowSkip::MissingListedAt));
        assert_eq!(stored("C1", None).parse_record(), Err(RowSkip::MissingListedAt));
        assert_eq!(
            stored("", Some("2024-05-20 03:00:00")).parse_record(),
            Err(RowSkip::MissingChannelId)
        );
    }

    #[test]
    fn test_stored_row_round_trips_listed_at() {
        let listed_at = Utc.with_ymd_and_hms(2024, 5, 20, 3, 0, 0).unwrap();
        let row = WarningRow {
            channel_name: "dev".to_string(),
            channel_id: "C1".to_string(),
            creator_name: "alice".to_string(),
            last_user_name: "bob".to_string(),
            elapsed_days: 120,
            listed_at,
            days_from_listed: 3,
        };

        let record = StoredWarningRow::from(&row).parse_record().unwrap();
        assert_eq!(record.listed_at, listed_at);
    }
}

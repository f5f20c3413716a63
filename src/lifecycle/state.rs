use crate::models::StoredWarningRow;
use chrono::{DateTime, Utc};
use std::collections::HashMap;

/// Warning start times carried over from the previous run
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WarningState {
    listed: HashMap<String, DateTime<Utc>>,
}

impl WarningState {
    /// Scan stored rows in order. Unrecognized rows are skipped and a later
    /// row for the same channel replaces an earlier one.
    pub fn from_rows(rows: &[StoredWarningRow]) -> Self {
        let mut listed = HashMap::new();

        for (index, row) in rows.iter().enumerate() {
            match row.parse_record() {
                Ok(record) => {
                    listed.insert(record.channel_id, record.listed_at);
                }
                Err(reason) => {
                    tracing::debug!("Skipping warning row {} ({}): {}", index, row.channel_id, reason);
                }
            }
        }

        Self { listed }
    }

    pub fn listed_at(&self, channel_id: &str) -> Option<DateTime<Utc>> {
        self.listed.get(channel_id).copied()
    }

    pub fn len(&self) -> usize {
        self.listed.len()
    }

    pub fn is_empty(&self) -> bool {
        self.listed.is_empty()
    }
}

impl FromIterator<(String, DateTime<Utc>)> for WarningState {
    fn from_iter<I: IntoIterator<Item = (String, DateTime<Utc>)>>(iter: I) -> Self {
        Self {
            listed: iter.into_iter().collect(),
        }
    }
}

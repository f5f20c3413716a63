//! Reconciliation of this run's channel snapshots against the warning list
//! persisted by the previous run.
//!
//! A channel moves ACTIVE -> WARNED once its inactivity reaches the warning
//! threshold, stays WARNED with its original `listed_at` for as long as it
//! keeps qualifying, and becomes an archive candidate once it has been
//! warned for the grace period. Leaving the warned set (new activity, a
//! whitelist rule, or the channel disappearing) forgets the warning.

use super::state::WarningState;
use crate::config::Thresholds;
use crate::models::{ChannelSnapshot, WarningRow};
use chrono::{DateTime, Utc};
use std::cmp::Ordering;

/// Everything one run decides, in output order
#[derive(Debug, Clone, Default)]
pub struct Reconciliation {
    /// All channels, most inactive first
    pub report: Vec<ChannelSnapshot>,
    /// Warned channels, longest warned first
    pub warnings: Vec<WarningRow>,
    /// Warned channels past the grace period, in `warnings` order
    pub archive_candidates: Vec<WarningRow>,
}

pub fn is_warn_eligible(snapshot: &ChannelSnapshot, thresholds: &Thresholds) -> bool {
    snapshot.elapsed_days >= thresholds.warning_days && !snapshot.is_whitelisted()
}

pub fn is_archive_candidate(row: &WarningRow, thresholds: &Thresholds) -> bool {
    row.days_from_listed >= thresholds.grace_days
}

/// elapsed_days descending, then name ascending
pub fn report_order(a: &ChannelSnapshot, b: &ChannelSnapshot) -> Ordering {
    b.elapsed_days
        .cmp(&a.elapsed_days)
        .then_with(|| a.name.cmp(&b.name))
}

/// days_from_listed descending, then name ascending
pub fn warning_order(a: &WarningRow, b: &WarningRow) -> Ordering {
    b.days_from_listed
        .cmp(&a.days_from_listed)
        .then_with(|| a.channel_name.cmp(&b.channel_name))
}

pub fn reconcile(
    snapshots: Vec<ChannelSnapshot>,
    previous: &WarningState,
    thresholds: &Thresholds,
    now: DateTime<Utc>,
) -> Reconciliation {
    let mut warnings: Vec<WarningRow> = snapshots
        .iter()
        .filter(|snapshot| is_warn_eligible(snapshot, thresholds))
        .map(|snapshot| {
            let listed_at = previous.listed_at(&snapshot.id).unwrap_or(now);
            WarningRow::new(snapshot, listed_at, now)
        })
        .collect();
    warnings.sort_by(warning_order);

    let archive_candidates: Vec<WarningRow> = warnings
        .iter()
        .filter(|row| is_archive_candidate(row, thresholds))
        .cloned()
        .collect();

    let mut report = snapshots;
    report.sort_by(report_order);

    Reconciliation {
        report,
        warnings,
        archive_candidates,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::channel::WhitelistReasons;
    use crate::models::{StoredWarningRow, SECONDS_PER_DAY};
    use chrono::{Duration, TimeZone};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap()
    }

    fn thresholds() -> Thresholds {
        Thresholds::new(90, 5).unwrap()
    }

    fn snapshot(id: &str, name: &str, elapsed_days: i64) -> ChannelSnapshot {
        let last_activity_at = now().timestamp() - elapsed_days * SECONDS_PER_DAY;
        ChannelSnapshot {
            id: id.to_string(),
            name: name.to_string(),
            creator_id: "U1".to_string(),
            creator_name: "alice".to_string(),
            created_at: last_activity_at,
            member_count: 3,
            is_shared: false,
            last_activity_at,
            last_message_at: None,
            last_actor_id: None,
            last_actor_name: String::new(),
            last_message_text: String::new(),
            elapsed_days,
            whitelist: WhitelistReasons::empty(),
        }
    }

    fn whitelisted(mut snapshot: ChannelSnapshot) -> ChannelSnapshot {
        snapshot.whitelist = WhitelistReasons::KEEP_MARKER;
        snapshot
    }

    fn ids(rows: &[WarningRow]) -> Vec<&str> {
        rows.iter().map(|row| row.channel_id.as_str()).collect()
    }

    #[test]
    fn test_new_warning_starts_now() {
        let result = reconcile(
            vec![snapshot("C1", "old", 95)],
            &WarningState::default(),
            &thresholds(),
            now(),
        );

        assert_eq!(result.warnings.len(), 1);
        let row = &result.warnings[0];
        assert_eq!(row.listed_at, now());
        assert_eq!(row.days_from_listed, 0);
        assert_eq!(row.elapsed_days, 95);
        assert!(result.archive_candidates.is_empty());
    }

    #[test]
    fn test_warning_threshold_boundary() {
        let result = reconcile(
            vec![snapshot("C1", "at", 90), snapshot("C2", "below", 89)],
            &WarningState::default(),
            &thresholds(),
            now(),
        );
        assert_eq!(ids(&result.warnings), vec!["C1"]);
        assert_eq!(result.report.len(), 2);
    }

    #[test]
    fn test_continuity_keeps_previous_listed_at() {
        let listed_at = now() - Duration::days(3) - Duration::hours(2);
        let previous: WarningState = [("C1".to_string(), listed_at)].into_iter().collect();

        let result = reconcile(vec![snapshot("C1", "old", 120)], &previous, &thresholds(), now());

        assert_eq!(result.warnings[0].listed_at, listed_at);
        assert_eq!(result.warnings[0].days_from_listed, 3);
        assert!(result.archive_candidates.is_empty());
    }

    #[test]
    fn test_grace_boundary() {
        let previous: WarningState = [
            ("C1".to_string(), now() - Duration::days(5)),
            ("C2".to_string(), now() - Duration::days(4)),
        ]
        .into_iter()
        .collect();

        let result = reconcile(
            vec![snapshot("C1", "five", 200), snapshot("C2", "four", 200)],
            &previous,
            &thresholds(),
            now(),
        );

        assert_eq!(ids(&result.archive_candidates), vec!["C1"]);
    }

    #[test]
    fn test_past_grace_is_candidate() {
        let previous: WarningState = [("C1".to_string(), now() - Duration::days(7))].into_iter().collect();
        let result = reconcile(vec![snapshot("C1", "stale", 102)], &previous, &thresholds(), now());

        assert_eq!(ids(&result.archive_candidates), vec!["C1"]);
        assert_eq!(result.archive_candidates[0].days_from_listed, 7);
    }

    #[test]
    fn test_zero_grace_archives_same_run() {
        let thresholds = Thresholds::new(90, 0).unwrap();
        let result = reconcile(
            vec![snapshot("C1", "old", 90)],
            &WarningState::default(),
            &thresholds,
            now(),
        );
        assert_eq!(ids(&result.archive_candidates), vec!["C1"]);
    }

    #[test]
    fn test_whitelisted_channel_never_warned() {
        let previous: WarningState = [("C2".to_string(), now() - Duration::days(30))].into_iter().collect();
        let result = reconcile(
            vec![whitelisted(snapshot("C2", "keepme", 500))],
            &previous,
            &thresholds(),
            now(),
        );

        assert!(result.warnings.is_empty());
        assert!(result.archive_candidates.is_empty());
        assert_eq!(result.report.len(), 1);
        assert!(result.report[0].is_whitelisted());
    }

    #[test]
    fn test_resumed_or_missing_channels_are_dropped() {
        let previous: WarningState = [
            ("C1".to_string(), now() - Duration::days(2)),
            ("CGONE".to_string(), now() - Duration::days(2)),
        ]
        .into_iter()
        .collect();

        let result = reconcile(vec![snapshot("C1", "revived", 1)], &previous, &thresholds(), now());
        assert!(result.warnings.is_empty());

        // crossing again later starts a fresh clock
        let later = now() + Duration::days(100);
        let result = reconcile(
            vec![snapshot("C1", "revived", 91)],
            &WarningState::default(),
            &thresholds(),
            later,
        );
        assert_eq!(result.warnings[0].listed_at, later);
    }

    #[test]
    fn test_report_order() {
        let result = reconcile(
            vec![
                snapshot("C1", "beta", 10),
                snapshot("C2", "alpha", 10),
                snapshot("C3", "Zeta", 10),
                snapshot("C4", "gamma", 300),
                snapshot("C5", "delta", 0),
            ],
            &WarningState::default(),
            &thresholds(),
            now(),
        );

        let names: Vec<&str> = result.report.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["gamma", "Zeta", "alpha", "beta", "delta"]);
    }

    #[test]
    fn test_warning_order() {
        let previous: WarningState = [
            ("C1".to_string(), now() - Duration::days(1)),
            ("C2".to_string(), now() - Duration::days(3)),
            ("C3".to_string(), now() - Duration::days(1)),
        ]
        .into_iter()
        .collect();

        let result = reconcile(
            vec![
                snapshot("C1", "mango", 100),
                snapshot("C2", "kiwi", 95),
                snapshot("C3", "apple", 400),
                snapshot("C4", "fig", 91),
            ],
            &previous,
            &thresholds(),
            now(),
        );

        assert_eq!(ids(&result.warnings), vec!["C2", "C3", "C1", "C4"]);
    }

    #[test]
    fn test_rerun_is_idempotent() {
        let previous: WarningState = [("C1".to_string(), now() - Duration::days(6))].into_iter().collect();
        let snapshots = vec![
            snapshot("C1", "old", 150),
            snapshot("C2", "new", 93),
            snapshot("C3", "active", 2),
        ];

        let first = reconcile(snapshots.clone(), &previous, &thresholds(), now());

        let stored: Vec<StoredWarningRow> = first.warnings.iter().map(StoredWarningRow::from).collect();
        let carried = WarningState::from_rows(&stored);
        let second = reconcile(snapshots, &carried, &thresholds(), now());

        assert_eq!(first.warnings, second.warnings);
        assert_eq!(first.archive_candidates, second.archive_candidates);
    }

    #[test]
    fn test_empty_input() {
        let result = reconcile(Vec::new(), &WarningState::default(), &thresholds(), now());
        assert!(result.report.is_empty());
        assert!(result.warnings.is_empty());
        assert!(result.archive_candidates.is_empty());
    }
}

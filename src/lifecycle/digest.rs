use super::reconcile::warning_order;
use crate::config::Thresholds;
use crate::models::{mention, WarningRow};
use std::collections::HashSet;

pub struct DigestOptions<'a> {
    pub thresholds: &'a Thresholds,
    pub keep_marker: &'a str,
    /// Link to the warning table, shown in the pending section
    pub report_url: Option<&'a str>,
}

/// Text announcing what was archived and what is still pending.
/// Returns an empty string when there is nothing to say.
///
/// Pending channels already at or past the grace period (an archive attempt
/// that failed) count toward the pending header but get no line of their own.
pub fn compose_digest(archived: &[WarningRow], warnings: &[WarningRow], options: &DigestOptions) -> String {
    let archived_ids: HashSet<&str> = archived.iter().map(|row| row.channel_id.as_str()).collect();

    let mut pending: Vec<&WarningRow> = warnings
        .iter()
        .filter(|row| !archived_ids.contains(row.channel_id.as_str()))
        .collect();
    pending.sort_by(|a, b| warning_order(a, b));

    let mut archived_sorted: Vec<&WarningRow> = archived.iter().collect();
    archived_sorted.sort_by(|a, b| a.channel_name.cmp(&b.channel_name));

    let mut message = String::new();

    if !archived_sorted.is_empty() {
        message.push_str(&format!(
            "*:wave: {} channel(s) archived after {} or more days without activity since the warning*\n\n",
            archived_sorted.len(),
            options.thresholds.grace_days
        ));
        for row in &archived_sorted {
            message.push_str(&format!("#{} by {}\n", row.channel_name, mention(&row.creator_name)));
        }
        if !pending.is_empty() {
            message.push_str("\n\n\n");
        }
    }

    if !pending.is_empty() {
        message.push_str(&format!(
            "*:hourglass_flowing_sand: {} channel(s) have had no activity for {} or more days and are candidates for automatic archival*\n",
            pending.len(),
            options.thresholds.warning_days
        ));
        message.push_str("Go ahead and archive them if they are no longer needed!\n");
        message.push_str(&format!(
            "To keep a channel, post something in it or add {} to its description :pray:\n",
            options.keep_marker
        ));
        if let Some(url) = options.report_url {
            message.push_str(&format!("{}\n", url));
        }
        message.push('\n');

        for row in &pending {
            let remaining_days = options.thresholds.grace_days - row.days_from_listed;
            if remaining_days > 0 {
                message.push_str(&format!(
                    "`{} days left` #{} by {}\n",
                    remaining_days,
                    row.channel_name,
                    mention(&row.creator_name)
                ));
            }
        }
    }

    message
}

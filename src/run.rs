use crate::config::Config;
use crate::db::{ReportRepository, WarningRepository};
use crate::lifecycle::{
    archive_channels, compose_digest, persisted_warnings, reconcile, ChannelActions, DigestOptions,
    SlackChannelActions, WarningState,
};
use crate::models::{format_timestamp, mention, ChannelReportRow, ChannelSnapshot};
use crate::slack::{latest_activity, BotIdentity, SlackClient};
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::SqlitePool;

/// What a single run did
#[derive(Debug, Clone, Default, Serialize)]
pub struct RunSummary {
    pub channels: usize,
    pub previously_warned: usize,
    pub warned: usize,
    pub archived: Vec<String>,
    pub archive_failed: Vec<String>,
    pub digest_posted: bool,
}

/// Fetch, reconcile, archive, persist and announce. Slack read errors abort
/// the run before any table is rewritten and database errors abort it where
/// they happen; failed archive and post calls are logged and the run carries on.
pub async fn run_once(config: &Config, slack: &SlackClient, pool: Option<&SqlitePool>) -> Result<RunSummary> {
    let now = Utc::now();

    let snapshots = collect_snapshots(config, slack, now).await?;

    let actions = SlackChannelActions::new(slack, &config.bot_user_id);
    let Some((mut summary, message)) = process_snapshots(config, pool, &actions, snapshots, now).await? else {
        return Ok(RunSummary::default());
    };

    if let Some(channel_id) = digest_target(config, &message) {
        let identity = BotIdentity {
            name: config.bot_name.clone(),
            icon_emoji: config.bot_icon_emoji.clone(),
        };
        match slack.post_message(channel_id, &message, &identity).await {
            Ok(()) => summary.digest_posted = true,
            Err(e) => tracing::warn!("Failed to post digest to {}: {}", channel_id, e),
        }
    }

    Ok(summary)
}

async fn collect_snapshots(config: &Config, slack: &SlackClient, now: DateTime<Utc>) -> Result<Vec<ChannelSnapshot>> {
    let channels = slack
        .list_public_channels()
        .await
        .context("Failed to list public channels")?;
    tracing::info!("Public channels: {}", channels.len());

    let user_names = slack
        .list_user_names()
        .await
        .context("Failed to list users")?;
    tracing::info!("Users: {}", user_names.len());

    let mut snapshots = Vec::new();
    for channel in channels.iter().filter(|channel| channel.is_channel) {
        let history = slack
            .channel_history(&channel.id)
            .await
            .with_context(|| format!("Failed to read history of #{}", channel.name))?;
        let latest = latest_activity(&history);

        let snapshot = ChannelSnapshot::build(channel, &user_names, latest.as_ref(), &config.whitelist, now);
        tracing::debug!(
            "  [#{}] creator: {} ({}), last activity {} by {}, idle {} day(s), whitelist: {:?}",
            snapshot.name,
            mention(&snapshot.creator_name),
            snapshot.creator_id,
            format_timestamp(snapshot.last_activity_at, &config.display_offset),
            snapshot.last_actor_id.as_deref().unwrap_or("-"),
            snapshot.elapsed_days,
            snapshot.whitelist
        );
        snapshots.push(snapshot);
    }

    Ok(snapshots)
}

/// Everything between the Slack reads and the digest post. Returns `None`
/// without touching either table when there are no channels.
async fn process_snapshots<A>(
    config: &Config,
    pool: Option<&SqlitePool>,
    actions: &A,
    snapshots: Vec<ChannelSnapshot>,
    now: DateTime<Utc>,
) -> Result<Option<(RunSummary, String)>>
where
    A: ChannelActions + Sync,
{
    if snapshots.is_empty() {
        tracing::info!("No public channels found, nothing to do");
        return Ok(None);
    }

    let previous = match pool {
        Some(pool) => {
            let rows = WarningRepository::new(pool.clone())
                .list()
                .await
                .context("Failed to read warning table")?;
            WarningState::from_rows(&rows)
        }
        None => {
            tracing::warn!("No database configured, starting from an empty warning list");
            WarningState::default()
        }
    };
    if previous.is_empty() {
        tracing::info!("No channels were warned before this run");
    } else {
        tracing::info!("Channels warned before this run: {}", previous.len());
    }

    let reconciliation = reconcile(snapshots, &previous, &config.thresholds, now);
    tracing::info!(
        "Warned channels: {} ({} past the grace period)",
        reconciliation.warnings.len(),
        reconciliation.archive_candidates.len()
    );

    if let Some(pool) = pool {
        let rows: Vec<ChannelReportRow> = reconciliation
            .report
            .iter()
            .map(|snapshot| ChannelReportRow::from_snapshot(snapshot, &config.display_offset))
            .collect();
        ReportRepository::new(pool.clone())
            .replace_all(&rows)
            .await
            .context("Failed to write channel report")?;
        tracing::info!("Wrote {} channel(s) to the report table", rows.len());
    }

    let outcome = archive_channels(actions, &reconciliation.archive_candidates).await;
    tracing::info!("Archived channels: {}", outcome.archived.len());
    for failed in &outcome.failed {
        tracing::warn!(
            "[#{}] stays on the warning list after a failed archive ({} day(s) listed)",
            failed.channel_name,
            failed.days_from_listed
        );
    }

    if let Some(pool) = pool {
        let rows = persisted_warnings(&reconciliation.warnings, &outcome);
        WarningRepository::new(pool.clone())
            .replace_all(&rows)
            .await
            .context("Failed to write warning table")?;
        tracing::info!("Wrote {} channel(s) to the warning table", rows.len());
    }

    let message = compose_digest(
        &outcome.archived,
        &reconciliation.warnings,
        &DigestOptions {
            thresholds: &config.thresholds,
            keep_marker: &config.whitelist.keep_marker,
            report_url: config.report_url.as_deref(),
        },
    );
    tracing::debug!("Digest:\n{}", message);

    let summary = RunSummary {
        channels: reconciliation.report.len(),
        previously_warned: previous.len(),
        warned: reconciliation.warnings.len(),
        archived: outcome.archived.into_iter().map(|row| row.channel_name).collect(),
        archive_failed: outcome.failed.into_iter().map(|row| row.channel_name).collect(),
        digest_posted: false,
    };

    Ok(Some((summary, message)))
}

/// Announce channel to post to, if there is one and anything to say
fn digest_target<'a>(config: &'a Config, message: &str) -> Option<&'a str> {
    let Some(channel_id) = config.announce_channel_id.as_deref() else {
        tracing::info!("No announce channel configured, digest not posted");
        return None;
    };
    if message.is_empty() {
        tracing::info!("Nothing archived or pending, digest not posted");
        return None;
    }
    Some(channel_id)
}

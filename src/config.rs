use chrono::FixedOffset;

pub const DEFAULT_API_URL: &str = "https://slack.com/api";
pub const DEFAULT_WARNING_DAYS: i64 = 95;
pub const DEFAULT_GRACE_DAYS: i64 = 5;
pub const DEFAULT_KEEP_MARKER: &str = ":keep:";
pub const DEFAULT_NAME_PATTERNS: &str = "alert";
pub const DEFAULT_UTC_OFFSET_HOURS: i32 = 9;

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),

    #[error("{name} is not a valid number: {value}")]
    InvalidNumber { name: &'static str, value: String },

    #[error("WARNING_DAYS_COUNT must be at least 1 (got {0})")]
    InvalidWarningDays(i64),

    #[error("GRACE_DAYS_COUNT must not be negative (got {0})")]
    InvalidGraceDays(i64),

    #[error("DISPLAY_UTC_OFFSET_HOURS out of range: {0}")]
    InvalidOffset(i32),
}

/// The two fixed lifecycle thresholds, in whole days
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Thresholds {
    /// Inactivity at or beyond this puts a channel on the warning list
    pub warning_days: i64,
    /// Days on the warning list before the channel is archived
    pub grace_days: i64,
}

impl Thresholds {
    pub fn new(warning_days: i64, grace_days: i64) -> Result<Self, ConfigError> {
        if warning_days < 1 {
            return Err(ConfigError::InvalidWarningDays(warning_days));
        }
        if grace_days < 0 {
            return Err(ConfigError::InvalidGraceDays(grace_days));
        }
        Ok(Self {
            warning_days,
            grace_days,
        })
    }
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            warning_days: DEFAULT_WARNING_DAYS,
            grace_days: DEFAULT_GRACE_DAYS,
        }
    }
}

/// Rules that exempt a channel from warning and archival
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WhitelistRules {
    /// Marker looked for in the channel purpose
    pub keep_marker: String,
    /// Substrings that exempt a channel by name
    pub name_patterns: Vec<String>,
}

impl Default for WhitelistRules {
    fn default() -> Self {
        Self {
            keep_marker: DEFAULT_KEEP_MARKER.to_string(),
            name_patterns: split_patterns(DEFAULT_NAME_PATTERNS),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub api_url: String,
    pub user_token: String,
    pub bot_token: String,
    pub bot_user_id: String,
    pub bot_name: Option<String>,
    pub bot_icon_emoji: Option<String>,
    pub announce_channel_id: Option<String>,
    pub database_url: Option<String>,
    pub report_url: Option<String>,
    pub thresholds: Thresholds,
    pub whitelist: WhitelistRules,
    pub display_offset: FixedOffset,
    pub host: String,
    pub port: u16,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build the config from any variable source; blank values count as unset
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let optional = |name: &str| {
            lookup(name)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };
        let required = |name: &'static str| optional(name).ok_or(ConfigError::Missing(name));

        let warning_days = parse_number(&optional, "WARNING_DAYS_COUNT", DEFAULT_WARNING_DAYS)?;
        let grace_days = parse_number(&optional, "GRACE_DAYS_COUNT", DEFAULT_GRACE_DAYS)?;
        let offset_hours =
            parse_number(&optional, "DISPLAY_UTC_OFFSET_HOURS", DEFAULT_UTC_OFFSET_HOURS)?;
        let display_offset = offset_hours
            .checked_mul(3600)
            .and_then(FixedOffset::east_opt)
            .ok_or(ConfigError::InvalidOffset(offset_hours))?;

        let whitelist = WhitelistRules {
            keep_marker: optional("KEEP_MARKER").unwrap_or_else(|| DEFAULT_KEEP_MARKER.to_string()),
            name_patterns: split_patterns(
                &optional("WHITELIST_NAME_PATTERNS").unwrap_or_else(|| DEFAULT_NAME_PATTERNS.to_string()),
            ),
        };

        Ok(Self {
            api_url: optional("SLACK_API_URL").unwrap_or_else(|| DEFAULT_API_URL.to_string()),
            user_token: required("SLACK_TOKEN")?,
            bot_token: required("SLACK_BOT_TOKEN")?,
            bot_user_id: required("SLACK_BOT_USER_ID")?,
            bot_name: optional("SLACK_BOT_NAME"),
            bot_icon_emoji: optional("SLACK_BOT_ICON_EMOJI"),
            announce_channel_id: optional("ANNOUNCE_SLACK_CHANNEL_ID"),
            database_url: optional("DATABASE_URL"),
            report_url: optional("REPORT_URL"),
            thresholds: Thresholds::new(warning_days, grace_days)?,
            whitelist,
            display_offset,
            host: optional("HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
            port: parse_number(&optional, "PORT", 3000)?,
        })
    }
}

fn parse_number<T, F>(optional: &F, name: &'static str, default: T) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    F: Fn(&str) -> Option<String>,
{
    match optional(name) {
        Some(value) => value
            .parse()
            .map_err(|_| ConfigError::InvalidNumber { name, value }),
        None => Ok(default),
    }
}

fn split_patterns(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|pattern| !pattern.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name: &str| vars.get(name).cloned()
    }

    const TOKENS: &[(&str, &str)] = &[
        ("SLACK_TOKEN", "xoxp-user"),
        ("SLACK_BOT_TOKEN", "xoxb-bot"),
        ("SLACK_BOT_USER_ID", "UBOT"),
    ];

    #[test]
    fn test_defaults() {
        let config = Config::from_lookup(lookup(TOKENS)).unwrap();
        assert_eq!(config.api_url, DEFAULT_API_URL);
        assert_eq!(config.thresholds, Thresholds::new(95, 5).unwrap());
        assert_eq!(config.whitelist, WhitelistRules::default());
        assert_eq!(config.whitelist.name_patterns, vec!["alert".to_string()]);
        assert_eq!(config.display_offset.local_minus_utc(), 9 * 3600);
        assert!(config.database_url.is_none());
        assert!(config.announce_channel_id.is_none());
        assert_eq!(config.port, 3000);
    }

    #[test]
    fn test_overrides() {
        let mut vars = TOKENS.to_vec();
        vars.extend_from_slice(&[
            ("WARNING_DAYS_COUNT", "90"),
            ("GRACE_DAYS_COUNT", "0"),
            ("WHITELIST_NAME_PATTERNS", "alert, ops-, ,incident"),
            ("ANNOUNCE_SLACK_CHANNEL_ID", "CANNOUNCE"),
            ("DATABASE_URL", "  "),
            ("DISPLAY_UTC_OFFSET_HOURS", "-5"),
        ]);
        let config = Config::from_lookup(lookup(&vars)).unwrap();

        assert_eq!(config.thresholds.warning_days, 90);
        assert_eq!(config.thresholds.grace_days, 0);
        assert_eq!(config.whitelist.name_patterns, vec!["alert", "ops-", "incident"]);
        assert_eq!(config.announce_channel_id.as_deref(), Some("CANNOUNCE"));
        assert!(config.database_url.is_none());
        assert_eq!(config.display_offset.local_minus_utc(), -5 * 3600);
    }

    #[test]
    fn test_missing_token() {
        let err = Config::from_lookup(lookup(&[("SLACK_TOKEN", "x")])).unwrap_err();
        assert_eq!(err, ConfigError::Missing("SLACK_BOT_TOKEN"));
    }

    #[test]
    fn test_invalid_thresholds() {
        assert_eq!(Thresholds::new(0, 5), Err(ConfigError::InvalidWarningDays(0)));
        assert_eq!(Thresholds::new(90, -1), Err(ConfigError::InvalidGraceDays(-1)));

        let mut vars = TOKENS.to_vec();
        vars.push(("GRACE_DAYS_COUNT", "five"));
        let err = Config::from_lookup(lookup(&vars)).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidNumber { name: "GRACE_DAYS_COUNT", .. }));
    }
}

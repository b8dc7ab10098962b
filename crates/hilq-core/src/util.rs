//! Utility functions for HILQ
//!
//! Provides id generation, elapsed-time formatting and environment loading.

use std::path::Path;

use chrono::{DateTime, Utc};

/// Build an identifier from a prefix and a unix timestamp in milliseconds.
///
/// # Example
/// ```
/// use chrono::{TimeZone, Utc};
/// use hilq_core::util::timestamp_id;
///
/// let at = Utc.timestamp_millis_opt(1_700_000_000_123).unwrap();
/// assert_eq!(timestamp_id("rl_session_", at), "rl_session_1700000000123");
/// ```
pub fn timestamp_id(prefix: &str, at: DateTime<Utc>) -> String {
    format!("{prefix}{}", at.timestamp_millis())
}

/// Format a duration in seconds as `mm:ss`.
///
/// # Example
/// ```
/// use hilq_core::util::format_elapsed;
///
/// assert_eq!(format_elapsed(75), "01:15");
/// ```
pub fn format_elapsed(secs: u64) -> String {
    format!("{:02}:{:02}", secs / 60, secs % 60)
}

/// Load environment variables from the HILQ env file if not already set.
/// Searches standard locations in order:
/// 1. /usr/local/etc/hilq/hilq.env
/// 2. User's config directory/hilq/hilq.env
/// 3. ~/.config/hilq/hilq.env
pub fn load_env_file() {
    let env_paths = [
        "/usr/local/etc/hilq/hilq.env".to_string(),
        dirs::config_dir()
            .map(|p| p.join("hilq/hilq.env").to_string_lossy().to_string())
            .unwrap_or_default(),
        dirs::home_dir()
            .map(|p| p.join(".config/hilq/hilq.env").to_string_lossy().to_string())
            .unwrap_or_default(),
    ];

    for path in &env_paths {
        if path.is_empty() {
            continue;
        }
        if Path::new(path).exists() {
            if let Ok(contents) = std::fs::read_to_string(path) {
                tracing::debug!("Loading environment from {}", path);
                parse_env_file(&contents);
            }
            break;
        }
    }
}

/// Parse env file contents and set environment variables (only if not already set).
/// Supports `KEY=value`, `export KEY=value`, quoted values and `#` comments.
pub fn parse_env_file(contents: &str) {
    for line in contents.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let line = line.strip_prefix("export ").unwrap_or(line);
        if let Some((key, value)) = line.split_once('=') {
            let key = key.trim();
            let value = value.trim().trim_matches('"').trim_matches('\'');
            if std::env::var(key).is_err() {
                std::env::set_var(key, value);
            }
        }
    }
}

use crate::models::LOG_TIMESTAMP_FORMAT;
use anyhow::{Context, Result};
use chrono::{DateTime, FixedOffset, TimeZone, Utc};

/// Handles parsing timestamps in the access-log date-time layout
pub struct TimestampParser;

impl TimestampParser {
    /// Parse a timestamp such as `01/Jan/2023:10:00:00 -0000`, keeping its offset
    pub fn parse(timestamp_str: &str) -> Result<DateTime<FixedOffset>> {
        DateTime::parse_from_str(timestamp_str.trim(), LOG_TIMESTAMP_FORMAT)
            .with_context(|| format!("Failed to parse timestamp: {}", timestamp_str))
    }

    /// Parse a timestamp, falling back to the Unix epoch (UTC) when it is malformed
    pub fn parse_or_epoch(timestamp_str: &str) -> DateTime<FixedOffset> {
        match Self::parse(timestamp_str) {
            Ok(timestamp) => timestamp,
            Err(e) => {
                tracing::warn!(timestamp = timestamp_str, error = %e, "Defaulting timestamp to epoch");
                Self::epoch()
            }
        }
    }

    pub fn epoch() -> DateTime<FixedOffset> {
        Utc.timestamp_opt(0, 0)
            .single()
            .unwrap_or_default()
            .fixed_offset()
    }
}

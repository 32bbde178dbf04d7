//! Access-log Record Parser
//!
//! Turns raw access-log lines into [`UsageRecord`] values. Lines are first
//! normalized (see [`crate::normalize`]) and split into positional fields:
//!
//! | field | meaning                                   |
//! |-------|-------------------------------------------|
//! | 0     | source address                            |
//! | 1–2   | timestamp (`01/Jan/2023:10:00:00 -0000`)  |
//! | 3     | request method                            |
//! | 4     | request target (version token source)     |
//! | 5     | protocol                                  |
//! | 6     | status code                               |
//! | 7     | payload size or latency                   |
//!
//! Lines with fewer than [`MIN_FIELDS`] fields are rejected and logged. Any line
//! with enough fields always yields a record: malformed numbers default to zero
//! through [`parse_or_default`].

use crate::models::UsageRecord;
use crate::normalize::split_fields;
use crate::timestamp_parser::TimestampParser;
use std::str::FromStr;
use tracing::warn;

/// Minimum number of whitespace-delimited fields for a usable line.
pub const MIN_FIELDS: usize = 8;

/// Parse `raw`, or return `T::default()` when it is not a valid `T`.
pub fn parse_or_default<T>(raw: &str) -> T
where
    T: FromStr + Default,
{
    raw.parse().unwrap_or_default()
}

/// First `/`-separated segment of a request target that starts with a digit.
///
/// `/app/2.3.1/sync` yields `2.3.1`; `/app/sync` yields `None`.
pub fn extract_version(target: &str) -> Option<&str> {
    target
        .split('/')
        .find(|segment| segment.chars().next().is_some_and(|c| c.is_ascii_digit()))
}

/// Parse one raw line into a record for `platform`.
///
/// Returns `None` (after logging) when the line has fewer than [`MIN_FIELDS`] fields.
pub fn parse_line(line: &str, platform: &str) -> Option<UsageRecord> {
    let fields = split_fields(line);

    if fields.len() < MIN_FIELDS {
        warn!(
            platform = platform,
            fields = fields.len(),
            line = line,
            "Skipping access log entry with too few fields"
        );
        return None;
    }

    let timestamp = TimestampParser::parse_or_epoch(&format!("{} {}", fields[1], fields[2]));

    Some(UsageRecord {
        platform: platform.to_string(),
        address: fields[0].clone(),
        timestamp,
        method: fields[3].clone(),
        version: extract_version(&fields[4]).map(str::to_string),
        protocol: fields[5].clone(),
        status: parse_or_default(&fields[6]),
        payload: parse_or_default(&fields[7]),
    })
}

/// Parse every line for one platform, keeping input order and dropping rejects.
pub fn parse_lines<S: AsRef<str>>(lines: &[S], platform: &str) -> Vec<UsageRecord> {
    let records: Vec<UsageRecord> = lines
        .iter()
        .filter_map(|line| parse_line(line.as_ref(), platform))
        .collect();

    if records.len() < lines.len() {
        tracing::debug!(
            platform = platform,
            accepted = records.len(),
            rejected = lines.len() - records.len(),
            "Parsed access log lines"
        );
    }

    records
}

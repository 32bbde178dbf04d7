//! Core Data Models
//!
//! This module defines the value types that flow through the access-log
//! ingestion pipeline. Every value is built once by a constructor and never
//! mutated afterwards; they live only for the duration of one file's processing.
//!
//! ## Data Flow
//!
//! 1. **Raw Data**: lines of an access log, split per [`Platform`]
//! 2. **Records**: [`UsageRecord`] - one parsed log line
//! 3. **Counts**: [`AddressCount`] - distinct source addresses and their usage
//! 4. **Summaries**: [`PlatformSummary`] - per-platform statistics for one file
//! 5. **Output**: [`CombinedSummary`] - the platform pair merged into one row
//!
//! ## Features
//!
//! - **Serde Integration**: summaries serialize for the JSON report
//! - **Typed Timestamps**: records carry the offset written in the log line
//! - **Optional Fields**: a missing version token is `None`, not an empty string

use chrono::{DateTime, Duration, FixedOffset, NaiveDate};
use serde::{Deserialize, Serialize};

/// Access-log timestamp layout, e.g. `01/Jan/2023:10:00:00 -0000`.
pub const LOG_TIMESTAMP_FORMAT: &str = "%d/%b/%Y:%H:%M:%S %z";

/// Wall-clock layout used for summary start/end times.
pub const CLOCK_FORMAT: &str = "%H:%M:%S";

/// A client category and the substring that identifies its log lines.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Platform {
    pub tag: String,
    pub marker: String,
}

impl Platform {
    pub fn new(tag: impl Into<String>, marker: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            marker: marker.into(),
        }
    }

    pub fn ios() -> Self {
        Self::new("iOS", "iOS")
    }

    pub fn android() -> Self {
        Self::new("android", "android")
    }

    pub fn matches(&self, line: &str) -> bool {
        line.contains(self.marker.as_str())
    }
}

/// The two platforms whose summaries are merged into one combined row.
///
/// `first` is the "A" side of [`CombinedSummary`]; its time window is the one
/// recorded for the file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlatformPair {
    pub first: Platform,
    pub second: Platform,
}

impl Default for PlatformPair {
    fn default() -> Self {
        Self {
            first: Platform::ios(),
            second: Platform::android(),
        }
    }
}

impl PlatformPair {
    /// Order in which markers are tested. Lines carrying both markers are
    /// attributed to the second platform.
    pub fn classification_order(&self) -> [Platform; 2] {
        [self.second.clone(), self.first.clone()]
    }
}

/// One parsed access-log line.
#[derive(Debug, Clone, PartialEq)]
pub struct UsageRecord {
    pub platform: String,
    pub address: String,
    pub timestamp: DateTime<FixedOffset>,
    pub method: String,
    pub version: Option<String>,
    pub protocol: String,
    pub status: i32,
    pub payload: i64,
}

/// A record as it is written to the store: the address has been hashed.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredUsageRecord {
    pub platform: String,
    pub hashed_address: String,
    pub timestamp: String,
    pub method: String,
    pub version: String,
    pub protocol: String,
    pub status: i32,
    pub payload: i64,
}

impl StoredUsageRecord {
    pub fn from_record(record: &UsageRecord, hashed_address: String) -> Self {
        Self {
            platform: record.platform.clone(),
            hashed_address,
            timestamp: record.timestamp.format(LOG_TIMESTAMP_FORMAT).to_string(),
            method: record.method.clone(),
            version: record.version.clone().unwrap_or_default(),
            protocol: record.protocol.clone(),
            status: record.status,
            payload: record.payload,
        }
    }
}

/// A distinct value and the number of times it occurred.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AddressCount {
    pub address: String,
    pub count: u64,
}

/// Date and clock span covered by one platform's records.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TimeWindow {
    pub date: NaiveDate,
    #[serde(rename = "startTime")]
    pub start_time: String,
    #[serde(rename = "endTime")]
    pub end_time: String,
    #[serde(skip)]
    pub duration: Duration,
}

impl TimeWindow {
    pub fn from_bounds(first: &DateTime<FixedOffset>, last: &DateTime<FixedOffset>) -> Self {
        Self {
            date: first.date_naive(),
            start_time: first.format(CLOCK_FORMAT).to_string(),
            end_time: last.format(CLOCK_FORMAT).to_string(),
            duration: last.signed_duration_since(*first),
        }
    }

    pub fn duration_text(&self) -> String {
        format_duration(self.duration)
    }
}

/// Outcome of the persistence fan-out for one platform.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PersistStats {
    pub attempted: usize,
    pub failed: usize,
}

impl PersistStats {
    pub fn succeeded(&self) -> usize {
        self.attempted - self.failed
    }
}

/// Aggregate statistics for one platform within one file.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlatformSummary {
    pub platform: String,
    pub window: Option<TimeWindow>,
    pub average: i64,
    pub length: usize,
    pub persisted: PersistStats,
}

impl PlatformSummary {
    pub fn empty(platform: impl Into<String>) -> Self {
        Self {
            platform: platform.into(),
            window: None,
            average: 0,
            length: 0,
            persisted: PersistStats::default(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.length == 0
    }
}

/// One summary row per file: both platforms of a [`PlatformPair`] side by side.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CombinedSummary {
    pub date: NaiveDate,
    #[serde(rename = "startTime")]
    pub start_time: String,
    #[serde(rename = "endTime")]
    pub end_time: String,
    #[serde(rename = "firstLength")]
    pub first_length: usize,
    #[serde(rename = "secondLength")]
    pub second_length: usize,
    pub duration: String,
    #[serde(rename = "firstAverage")]
    pub first_average: i64,
    #[serde(rename = "secondAverage")]
    pub second_average: i64,
}

impl CombinedSummary {
    /// Merge two platform summaries. The window comes from `first`, or from
    /// `second` when `first` saw no records; `None` when both are empty.
    pub fn merge(first: &PlatformSummary, second: &PlatformSummary) -> Option<Self> {
        let window = first.window.as_ref().or(second.window.as_ref())?;
        Some(Self {
            date: window.date,
            start_time: window.start_time.clone(),
            end_time: window.end_time.clone(),
            first_length: first.length,
            second_length: second.length,
            duration: window.duration_text(),
            first_average: first.average,
            second_average: second.average,
        })
    }
}

/// Render a span as `1h2m3s`, dropping leading zero units (`0s` when empty).
pub fn format_duration(duration: Duration) -> String {
    let total = duration.num_seconds();
    let sign = if total < 0 { "-" } else { "" };
    let total = total.unsigned_abs();
    let (hours, minutes, seconds) = (total / 3600, (total % 3600) / 60, total % 60);

    if hours > 0 {
        format!("{sign}{hours}h{minutes}m{seconds}s")
    } else if minutes > 0 {
        format!("{sign}{minutes}m{seconds}s")
    } else {
        format!("{sign}{seconds}s")
    }
}

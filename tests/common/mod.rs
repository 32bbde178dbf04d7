#![allow(dead_code)]

use access_usage::aggregator::{Aggregator, AggregatorOptions};
use access_usage::config::MIN_HASH_COST;
use access_usage::coordinator::FileCoordinator;
use access_usage::models::{CombinedSummary, PlatformPair, StoredUsageRecord};
use access_usage::store::UsageStore;
use anyhow::Result;
use async_trait::async_trait;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

pub const IOS_LINE: &str =
    r#"1.2.3.4 - - [01/Jan/2023:10:00:00 -0000] "GET /app/1.0/x HTTP/1.1" 200 150 "iOS""#;
pub const ANDROID_LINE: &str =
    r#"5.6.7.8 - - [01/Jan/2023:10:02:30 -0000] "POST /api/3.4.0/sync HTTP/1.1" 201 90 "android""#;

/// An access-log line for `platform` at `time` (HH:MM:SS) on 01/Jan/2023.
pub fn access_line(address: &str, time: &str, platform: &str, payload: i64) -> String {
    format!(
        r#"{address} - - [01/Jan/2023:{time} -0000] "GET /app/2.0/feed HTTP/1.1" 200 {payload} "Mozilla/5.0 ({platform})""#
    )
}

pub fn write_log(dir: &Path, filename: &str, lines: &[String]) -> Result<PathBuf> {
    let file_path = dir.join(filename);
    let mut content = lines.join("\n");
    content.push('\n');
    fs::write(&file_path, content)?;
    Ok(file_path)
}

pub fn options(summary_only: bool) -> AggregatorOptions {
    AggregatorOptions {
        summary_only,
        max_in_flight_writes: 8,
        hash_cost: MIN_HASH_COST,
    }
}

pub fn coordinator(store: Arc<dyn UsageStore>, summary_only: bool) -> FileCoordinator {
    FileCoordinator::new(
        Aggregator::new(store, options(summary_only)),
        PlatformPair::default(),
    )
}

/// Store whose row inserts fail for one platform; counts every finished call.
pub struct RejectingStore {
    pub rejected_platform: String,
    pub finished: AtomicUsize,
    pub summaries: AtomicUsize,
}

impl RejectingStore {
    pub fn new(rejected_platform: &str) -> Self {
        Self {
            rejected_platform: rejected_platform.to_string(),
            finished: AtomicUsize::new(0),
            summaries: AtomicUsize::new(0),
        }
    }

    pub fn finished(&self) -> usize {
        self.finished.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl UsageStore for RejectingStore {
    async fn create_schema(&self) -> Result<()> {
        Ok(())
    }

    async fn insert_usage_record(&self, record: &StoredUsageRecord) -> Result<()> {
        tokio::task::yield_now().await;
        self.finished.fetch_add(1, Ordering::SeqCst);
        if record.platform == self.rejected_platform {
            anyhow::bail!("insert rejected for {}", record.platform);
        }
        Ok(())
    }

    async fn insert_address_count(
        &self,
        platform: &str,
        _hashed_address: &str,
        _count: u64,
    ) -> Result<()> {
        tokio::task::yield_now().await;
        self.finished.fetch_add(1, Ordering::SeqCst);
        if platform == self.rejected_platform {
            anyhow::bail!("insert rejected for {}", platform);
        }
        Ok(())
    }

    async fn insert_summary(&self, _summary: &CombinedSummary) -> Result<()> {
        self.summaries.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

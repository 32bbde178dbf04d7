//! Platform Aggregation Engine
//!
//! This module turns the full set of [`UsageRecord`] values for one platform in
//! one file into a [`PlatformSummary`], and persists every record and every
//! per-address usage count on the way.
//!
//! ## Processing Pipeline
//!
//! 1. **Window**: date, start/end clock and span from the first and last record
//!    in input order (access logs are already chronological)
//! 2. **Average**: integer mean of the non-zero payload values
//! 3. **Counting**: distinct source addresses via [`count_occurrences`], on the
//!    raw address
//! 4. **Hashing**: each address goes through bcrypt before it is written
//! 5. **Persistence**: one independent write per record and per address count
//!
//! ## Fan-out / Fan-in
//!
//! Writes are driven as a `futures` stream with `buffer_unordered`. Every write
//! also takes a permit from a semaphore shared by all clones of one
//! [`Aggregator`], so at most `max_in_flight_writes` rows are in flight across
//! all files and platforms of a run while the rest wait.
//! [`Aggregator::aggregate`] only returns once every launched write finished.
//! A failed write is logged and counted in [`PersistStats`]; it never aborts
//! the aggregate and is never retried.
//!
//! An empty record set short-circuits: no window, average 0, nothing written.

use crate::config::ProcessingConfig;
use crate::counter::count_occurrences;
use crate::hashing::hash_address_blocking;
use crate::models::{
    AddressCount, PersistStats, PlatformSummary, StoredUsageRecord, TimeWindow, UsageRecord,
};
use crate::store::UsageStore;
use anyhow::{Context, Result};
use futures::future::{BoxFuture, FutureExt};
use futures::stream::{self, StreamExt};
use std::sync::Arc;
use tokio::sync::Semaphore;
use tracing::{debug, error};

#[derive(Debug, Clone)]
pub struct AggregatorOptions {
    /// Skip per-record and per-address writes
    pub summary_only: bool,
    pub max_in_flight_writes: usize,
    pub hash_cost: u32,
}

impl AggregatorOptions {
    pub fn from_config(config: &ProcessingConfig, summary_only: bool) -> Self {
        Self {
            summary_only,
            max_in_flight_writes: config.max_in_flight_writes.max(1),
            hash_cost: config.hash_cost,
        }
    }
}

enum PendingWrite<'a> {
    Record(&'a UsageRecord),
    Count(&'a AddressCount),
}

impl PendingWrite<'_> {
    fn kind(&self) -> &'static str {
        match self {
            PendingWrite::Record(_) => "usage_record",
            PendingWrite::Count(_) => "address_count",
        }
    }
}

#[derive(Clone)]
pub struct Aggregator {
    store: Arc<dyn UsageStore>,
    options: AggregatorOptions,
    write_permits: Arc<Semaphore>,
}

impl Aggregator {
    pub fn new(store: Arc<dyn UsageStore>, options: AggregatorOptions) -> Self {
        let write_permits = Arc::new(Semaphore::new(options.max_in_flight_writes.max(1)));
        Self {
            store,
            options,
            write_permits,
        }
    }

    pub fn store(&self) -> &Arc<dyn UsageStore> {
        &self.store
    }

    pub async fn aggregate(&self, platform: &str, records: &[UsageRecord]) -> PlatformSummary {
        let (Some(first), Some(last)) = (records.first(), records.last()) else {
            debug!(platform = platform, "No records to aggregate");
            return PlatformSummary::empty(platform);
        };

        let window = TimeWindow::from_bounds(&first.timestamp, &last.timestamp);
        let average = average_payload(records);

        let persisted = if self.options.summary_only {
            PersistStats::default()
        } else {
            let address_counts = count_occurrences(records.iter().map(|r| r.address.as_str()));
            self.persist(platform, records, &address_counts).await
        };

        debug!(
            platform = platform,
            records = records.len(),
            average = average,
            attempted = persisted.attempted,
            failed = persisted.failed,
            "Aggregated platform records"
        );

        PlatformSummary {
            platform: platform.to_string(),
            window: Some(window),
            average,
            length: records.len(),
            persisted,
        }
    }

    async fn persist(
        &self,
        platform: &str,
        records: &[UsageRecord],
        address_counts: &[AddressCount],
    ) -> PersistStats {
        // Futures are lazy: collecting them starts no write.
        let writes: Vec<BoxFuture<'_, Result<()>>> = records
            .iter()
            .map(PendingWrite::Record)
            .chain(address_counts.iter().map(PendingWrite::Count))
            .map(|write| self.write_row(platform, write).boxed())
            .collect();

        let results: Vec<Result<()>> = stream::iter(writes)
            .buffer_unordered(self.options.max_in_flight_writes.max(1))
            .collect()
            .await;

        PersistStats {
            attempted: results.len(),
            failed: results.iter().filter(|result| result.is_err()).count(),
        }
    }

    async fn write_row(&self, platform: &str, write: PendingWrite<'_>) -> Result<()> {
        let kind = write.kind();
        let cost = self.options.hash_cost;

        let result: Result<()> = async move {
            let _permit = self
                .write_permits
                .acquire()
                .await
                .context("Write permits closed")?;
            match write {
                PendingWrite::Record(record) => {
                    let hashed = hash_address_blocking(record.address.clone(), cost).await?;
                    let row = StoredUsageRecord::from_record(record, hashed);
                    self.store.insert_usage_record(&row).await
                }
                PendingWrite::Count(entry) => {
                    let hashed = hash_address_blocking(entry.address.clone(), cost).await?;
                    self.store
                        .insert_address_count(platform, &hashed, entry.count)
                        .await
                }
            }
        }
        .await;

        if let Err(e) = &result {
            error!(platform = platform, kind = kind, error = %e, "Failed to persist row");
        }
        result
    }
}

/// Mean of the non-zero payload values, integer division; 0 when there are none.
pub fn average_payload(records: &[UsageRecord]) -> i64 {
    let (sum, count) = records
        .iter()
        .filter(|record| record.payload != 0)
        .fold((0i64, 0i64), |(sum, count), record| {
            (sum.saturating_add(record.payload), count + 1)
        });

    if count == 0 {
        0
    } else {
        sum / count
    }
}

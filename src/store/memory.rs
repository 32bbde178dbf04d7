use super::UsageStore;
use crate::models::{CombinedSummary, StoredUsageRecord};
use anyhow::{anyhow, Result};
use async_trait::async_trait;
use std::collections::BTreeSet;
use std::sync::{Mutex, MutexGuard};

#[derive(Debug, Default)]
struct Tables {
    names: BTreeSet<&'static str>,
    usage_records: Vec<StoredUsageRecord>,
    address_counts: Vec<(String, String, u64)>,
    summaries: Vec<CombinedSummary>,
}

/// In-process store that keeps every written row in memory.
#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, Tables>> {
        self.tables
            .lock()
            .map_err(|_| anyhow!("Memory store lock poisoned"))
    }

    fn require_table(tables: &Tables, name: &str) -> Result<()> {
        if tables.names.contains(name) {
            Ok(())
        } else {
            Err(anyhow!("Table {} does not exist", name))
        }
    }

    pub fn table_names(&self) -> Vec<&'static str> {
        self.lock()
            .map(|tables| tables.names.iter().copied().collect())
            .unwrap_or_default()
    }

    pub fn usage_records(&self) -> Vec<StoredUsageRecord> {
        self.lock()
            .map(|tables| tables.usage_records.clone())
            .unwrap_or_default()
    }

    /// `(platform, hashed_address, count)` rows.
    pub fn address_counts(&self) -> Vec<(String, String, u64)> {
        self.lock()
            .map(|tables| tables.address_counts.clone())
            .unwrap_or_default()
    }

    pub fn summaries(&self) -> Vec<CombinedSummary> {
        self.lock()
            .map(|tables| tables.summaries.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl UsageStore for MemoryStore {
    async fn create_schema(&self) -> Result<()> {
        let mut tables = self.lock()?;
        tables.names.insert("usage_records");
        tables.names.insert("address_counts");
        tables.names.insert("platform_summaries");
        Ok(())
    }

    async fn insert_usage_record(&self, record: &StoredUsageRecord) -> Result<()> {
        let mut tables = self.lock()?;
        Self::require_table(&tables, "usage_records")?;
        tables.usage_records.push(record.clone());
        Ok(())
    }

    async fn insert_address_count(
        &self,
        platform: &str,
        hashed_address: &str,
        count: u64,
    ) -> Result<()> {
        let mut tables = self.lock()?;
        Self::require_table(&tables, "address_counts")?;
        tables
            .address_counts
            .push((platform.to_string(), hashed_address.to_string(), count));
        Ok(())
    }

    async fn insert_summary(&self, summary: &CombinedSummary) -> Result<()> {
        let mut tables = self.lock()?;
        Self::require_table(&tables, "platform_summaries")?;
        tables.summaries.push(summary.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_create_schema_is_idempotent() -> Result<()> {
        let store = MemoryStore::new();
        store.create_schema().await?;
        store.create_schema().await?;

        assert_eq!(
            store.table_names(),
            vec!["address_counts", "platform_summaries", "usage_records"]
        );
        Ok(())
    }

    #[tokio::test]
    async fn test_insert_requires_schema() {
        let store = MemoryStore::new();
        let result = store.insert_address_count("iOS", "hash", 2).await;
        assert!(result.is_err());
        assert!(store.address_counts().is_empty());
    }
}

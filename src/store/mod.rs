//! Persistence Gateway
//!
//! The pipeline writes through the [`UsageStore`] trait and never touches a
//! connection directly. A store value is built once at startup and shared as
//! `Arc<dyn UsageStore>`:
//!
//! - [`PostgresStore`] - production sink backed by an `sqlx` connection pool
//! - [`MemoryStore`] - in-process sink used by `--dry-run` and by tests
//!
//! Three tables are maintained: raw usage records, per-address usage counts and
//! one combined platform summary per processed file.

mod memory;
mod postgres;
pub mod schema;

pub use memory::MemoryStore;
pub use postgres::PostgresStore;

use crate::models::{CombinedSummary, StoredUsageRecord};
use anyhow::Result;
use async_trait::async_trait;

#[async_trait]
pub trait UsageStore: Send + Sync {
    /// Ensure the three usage tables exist. Safe to call repeatedly.
    async fn create_schema(&self) -> Result<()>;

    async fn insert_usage_record(&self, record: &StoredUsageRecord) -> Result<()>;

    async fn insert_address_count(
        &self,
        platform: &str,
        hashed_address: &str,
        count: u64,
    ) -> Result<()>;

    async fn insert_summary(&self, summary: &CombinedSummary) -> Result<()>;
}

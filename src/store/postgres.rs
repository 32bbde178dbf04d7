use super::{schema, UsageStore};
use crate::config::{DatabaseConfig, DatabaseCredentials};
use crate::models::{CombinedSummary, StoredUsageRecord};
use anyhow::{Context, Result};
use async_trait::async_trait;
use sqlx::postgres::{PgPool, PgPoolOptions};
use std::time::Duration;
use tracing::info;

#[derive(Clone)]
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    pub async fn connect(credentials: &DatabaseCredentials, config: &DatabaseConfig) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(Duration::from_secs(config.acquire_timeout_secs))
            .connect(&credentials.connection_url())
            .await
            .with_context(|| {
                format!(
                    "Failed to connect to database {} at {}",
                    credentials.dbname, credentials.url
                )
            })?;

        info!(
            host = %credentials.url,
            database = %credentials.dbname,
            max_connections = config.max_connections,
            "Connected to usage database"
        );

        Ok(Self { pool })
    }
}

#[async_trait]
impl UsageStore for PostgresStore {
    async fn create_schema(&self) -> Result<()> {
        for statement in schema::CREATE_TABLES {
            sqlx::query(statement)
                .execute(&self.pool)
                .await
                .context("Failed to create usage tables")?;
        }
        Ok(())
    }

    async fn insert_usage_record(&self, record: &StoredUsageRecord) -> Result<()> {
        sqlx::query(schema::INSERT_USAGE_RECORD)
            .bind(&record.platform)
            .bind(&record.hashed_address)
            .bind(&record.timestamp)
            .bind(&record.method)
            .bind(&record.version)
            .bind(&record.protocol)
            .bind(record.status)
            .bind(record.payload)
            .execute(&self.pool)
            .await
            .context("Failed to insert usage record")?;
        Ok(())
    }

    async fn insert_address_count(
        &self,
        platform: &str,
        hashed_address: &str,
        count: u64,
    ) -> Result<()> {
        let count = i64::try_from(count).context("Address count exceeds BIGINT range")?;
        sqlx::query(schema::INSERT_ADDRESS_COUNT)
            .bind(platform)
            .bind(hashed_address)
            .bind(count)
            .execute(&self.pool)
            .await
            .context("Failed to insert address count")?;
        Ok(())
    }

    async fn insert_summary(&self, summary: &CombinedSummary) -> Result<()> {
        sqlx::query(schema::INSERT_PLATFORM_SUMMARY)
            .bind(summary.date)
            .bind(&summary.start_time)
            .bind(&summary.end_time)
            .bind(summary.first_length as i64)
            .bind(summary.second_length as i64)
            .bind(&summary.duration)
            .bind(summary.first_average)
            .bind(summary.second_average)
            .execute(&self.pool)
            .await
            .context("Failed to insert platform summary")?;
        Ok(())
    }
}

//! Access Usage Library
//!
//! Ingests rotated web-server access logs, splits entries by client platform,
//! computes per-platform and per-address usage statistics and persists both the
//! privacy-hashed raw records and the summaries to PostgreSQL.
//!
//! ## Architecture Overview
//!
//! - [`classifier`] - splits a file's lines into platform groups by marker substring
//! - [`normalize`] - strips access-log delimiters so lines split on single spaces
//! - [`parser`] - turns a line into a typed [`UsageRecord`]
//! - [`counter`] - distinct-value counting in first-occurrence order
//! - [`aggregator`] - per-platform statistics and concurrent row persistence
//! - [`coordinator`] - runs one file (or many, concurrently) end to end
//! - [`store`] - the persistence gateway: PostgreSQL and in-memory sinks
//! - [`config`] - TOML configuration with environment overrides, credentials
//! - [`logging`] - structured logging with JSON and pretty-print formats
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use access_usage::aggregator::{Aggregator, AggregatorOptions};
//! use access_usage::config::Config;
//! use access_usage::coordinator::FileCoordinator;
//! use access_usage::store::{MemoryStore, UsageStore};
//! use std::sync::Arc;
//!
//! # async fn example() -> anyhow::Result<()> {
//! let config = Config::default();
//! let store = Arc::new(MemoryStore::new());
//! store.create_schema().await?;
//!
//! let options = AggregatorOptions::from_config(&config.processing, false);
//! let coordinator = FileCoordinator::new(Aggregator::new(store, options), config.platforms);
//! let _outcomes = coordinator
//!     .process_files(vec!["localhost_access_log.2023-01-01.txt".into()])
//!     .await;
//! # Ok(())
//! # }
//! ```

pub mod aggregator;
pub mod classifier;
pub mod config;
pub mod coordinator;
pub mod counter;
pub mod display;
pub mod file_discovery;
pub mod hashing;
pub mod logging;
pub mod models;
pub mod normalize;
pub mod parser;
pub mod store;
pub mod timestamp_parser;

pub use models::*;

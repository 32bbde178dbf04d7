//! File Coordinator
//!
//! Drives one access-log file through the whole pipeline:
//!
//! 1. open the file and classify its lines per platform (blocking pool)
//! 2. spawn one task per platform running the parser and the [`Aggregator`]
//! 3. wait for both platform summaries
//! 4. merge them into a [`CombinedSummary`] and write it
//!
//! [`FileCoordinator::process_files`] runs one task per file and waits for all
//! of them. A file that cannot be opened is reported as [`FileOutcome::Failed`]
//! and never affects its siblings.

use crate::aggregator::Aggregator;
use crate::classifier::{classify, ClassifiedLines};
use crate::models::{CombinedSummary, PlatformPair, PlatformSummary};
use crate::parser::parse_lines;
use anyhow::{Context, Result};
use futures::future::join_all;
use serde::Serialize;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use tokio::task::JoinHandle;
use tracing::{error, info, info_span, warn, Instrument};

/// Result of processing one platform pair for one file.
#[derive(Debug, Clone, Serialize)]
pub struct FileReport {
    pub path: PathBuf,
    pub first: PlatformSummary,
    pub second: PlatformSummary,
    pub combined: Option<CombinedSummary>,
    #[serde(rename = "summaryWritten")]
    pub summary_written: bool,
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum FileOutcome {
    Completed(FileReport),
    Failed { path: PathBuf, error: String },
}

impl FileOutcome {
    pub fn path(&self) -> &Path {
        match self {
            FileOutcome::Completed(report) => &report.path,
            FileOutcome::Failed { path, .. } => path,
        }
    }

    pub fn is_completed(&self) -> bool {
        matches!(self, FileOutcome::Completed(_))
    }
}

#[derive(Clone)]
pub struct FileCoordinator {
    aggregator: Aggregator,
    platforms: PlatformPair,
}

impl FileCoordinator {
    pub fn new(aggregator: Aggregator, platforms: PlatformPair) -> Self {
        Self {
            aggregator,
            platforms,
        }
    }

    /// Process every file concurrently; outcomes come back in input order.
    pub async fn process_files(&self, paths: Vec<PathBuf>) -> Vec<FileOutcome> {
        let handles: Vec<JoinHandle<FileOutcome>> = paths
            .iter()
            .cloned()
            .map(|path| {
                let coordinator = self.clone();
                tokio::spawn(async move { coordinator.process_file(&path).await }.in_current_span())
            })
            .collect();

        join_all(handles)
            .await
            .into_iter()
            .zip(paths)
            .map(|(joined, path)| {
                joined.unwrap_or_else(|e| {
                    error!(path = %path.display(), error = %e, "File task aborted");
                    FileOutcome::Failed {
                        path,
                        error: e.to_string(),
                    }
                })
            })
            .collect()
    }

    pub async fn process_file(&self, path: &Path) -> FileOutcome {
        let span = info_span!("file", path = %path.display());
        self.run_file(path).instrument(span).await
    }

    async fn run_file(&self, path: &Path) -> FileOutcome {
        let mut classified = match self.read_lines(path).await {
            Ok(classified) => classified,
            Err(e) => {
                error!(error = %format!("{e:#}"), "Could not read access log");
                return FileOutcome::Failed {
                    path: path.to_path_buf(),
                    error: format!("{e:#}"),
                };
            }
        };

        let classified_lines = classified.total();
        let first_tag = self.platforms.first.tag.clone();
        let second_tag = self.platforms.second.tag.clone();
        let first_lines = classified.take(&first_tag);
        let second_lines = classified.take(&second_tag);

        let first_task = self.spawn_platform(first_tag, first_lines);
        let second_task = self.spawn_platform(second_tag, second_lines);

        let (first, second) = match tokio::try_join!(first_task, second_task) {
            Ok(summaries) => summaries,
            Err(e) => {
                error!(error = %e, "Platform aggregation aborted");
                return FileOutcome::Failed {
                    path: path.to_path_buf(),
                    error: e.to_string(),
                };
            }
        };

        let combined = CombinedSummary::merge(&first, &second);
        let summary_written = match &combined {
            Some(summary) => match self.aggregator.store().insert_summary(summary).await {
                Ok(()) => true,
                Err(e) => {
                    error!(error = %format!("{e:#}"), "Failed to persist combined summary");
                    false
                }
            },
            None => {
                warn!("No platform lines found, skipping combined summary");
                false
            }
        };

        info!(
            classified_lines = classified_lines,
            first_length = first.length,
            second_length = second.length,
            failed_writes = first.persisted.failed + second.persisted.failed,
            "Finished analysing"
        );

        FileOutcome::Completed(FileReport {
            path: path.to_path_buf(),
            first,
            second,
            combined,
            summary_written,
        })
    }

    async fn read_lines(&self, path: &Path) -> Result<ClassifiedLines> {
        let order = self.platforms.classification_order();
        let owned = path.to_path_buf();

        tokio::task::spawn_blocking(move || {
            let file = File::open(&owned)
                .with_context(|| format!("{} could not be opened", owned.display()))?;
            classify(BufReader::new(file), &order)
                .with_context(|| format!("Failed to read {}", owned.display()))
        })
        .await
        .context("Line classification task failed")?
    }

    fn spawn_platform(&self, tag: String, lines: Vec<String>) -> JoinHandle<PlatformSummary> {
        let aggregator = self.aggregator.clone();

        tokio::spawn(
            async move {
                let records = parse_lines(&lines, &tag);
                aggregator.aggregate(&tag, &records).await
            }
            .in_current_span(),
        )
    }
}
